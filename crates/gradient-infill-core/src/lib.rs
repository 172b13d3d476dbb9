//! # Gradient Infill Core
//!
//! Core types shared by every stage of the gradient infill transform:
//! the error taxonomy and the planar geometry used for wall-distance queries.

pub mod error;
pub mod geometry;

pub use error::{ConfigError, Error, ParseError, PreconditionError, Result};
pub use geometry::{Point2D, WallSegment};

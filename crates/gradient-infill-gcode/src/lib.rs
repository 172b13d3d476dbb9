//! # Gradient Infill G-code
//!
//! Toolpath program handling for the gradient infill transform: the
//! line-level record model, marker recognition, the parser with its modal
//! state fold, and the serializer that re-emits untouched lines verbatim.

pub mod command;
pub mod markers;
pub mod parser;
pub mod serializer;

pub use command::{Axis, Directive, LinearMove, MotionRecord};
pub use markers::{MarkerEvent, MarkerKind, MarkerSet, WallSource};
pub use parser::{
    ExtrusionMode, LineEnding, ModalState, ParsedProgram, PositioningMode, ProgramParser,
};
pub use serializer::{format_number, NumberFormat, ProgramSerializer};

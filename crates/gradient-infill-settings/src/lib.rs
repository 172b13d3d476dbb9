//! Gradient Infill Settings Crate
//!
//! Handles transform configuration, validation and settings files.

pub mod config;
pub mod error;

pub use config::{
    ControlPoint, DistanceIndex, DistanceSettings, FlowSettings, GradientSettings, InputSettings,
    SpeedSettings, SubdivisionSettings,
};
pub use error::{SettingsError, SettingsResult};

//! Error handling for Gradient Infill
//!
//! Provides the error taxonomy for every stage of the transform:
//! - Parse errors (malformed numeric fields on move lines)
//! - Configuration errors (invalid gradient profile or thresholds)
//! - Precondition errors (input not in relative-extrusion mode)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Every variant is fatal: the transform never produces partial output.

use thiserror::Error;

/// G-Code parse error type
///
/// Raised when a line is recognised as a linear move but one of its
/// coordinate, extrusion or feed fields cannot be read as a finite number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A numeric field holds text that is not a finite number
    #[error("Invalid {field} value '{value}' at line {line_number}: {content}")]
    InvalidNumber {
        /// The 1-based line number of the offending line.
        line_number: usize,
        /// The field letter (X, Y, Z, E or F).
        field: char,
        /// The text that failed to parse.
        value: String,
        /// The full line content.
        content: String,
    },

    /// A field letter appears without any value
    #[error("Missing value for {field} at line {line_number}: {content}")]
    MissingValue {
        /// The 1-based line number of the offending line.
        line_number: usize,
        /// The field letter with no value.
        field: char,
        /// The full line content.
        content: String,
    },
}

impl ParseError {
    /// Line number the error refers to
    pub fn line_number(&self) -> usize {
        match self {
            Self::InvalidNumber { line_number, .. } | Self::MissingValue { line_number, .. } => {
                *line_number
            }
        }
    }
}

/// Configuration error type
///
/// Raised by settings validation and gradient profile construction,
/// before any line of the program is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The gradient distance range is empty
    #[error("max_distance must be > 0, got {value}")]
    NonPositiveMaxDistance {
        /// The rejected distance.
        value: f64,
    },

    /// Control point distances are not strictly increasing
    #[error("Gradient control point {index} has distance {distance} which does not exceed the previous one")]
    NonIncreasingDistance {
        /// Index of the offending control point.
        index: usize,
        /// Its distance.
        distance: f64,
    },

    /// Control point multipliers decrease as distance grows
    #[error("Gradient control point {index} has multiplier {multiplier} below the previous one")]
    DecreasingMultiplier {
        /// Index of the offending control point.
        index: usize,
        /// Its multiplier.
        multiplier: f64,
    },

    /// A numeric option is NaN, infinite or negative
    #[error("Option '{key}' must be a finite non-negative number, got {value}")]
    NonFiniteValue {
        /// The option name.
        key: String,
        /// The rejected value.
        value: f64,
    },

    /// A single quantization level cannot reach both ends of the profile
    #[error("steps must be 0 (continuous) or at least 2, got {steps}")]
    InvalidSteps {
        /// The rejected step count.
        steps: u32,
    },

    /// The subdivision threshold is not positive
    #[error("max_move_length must be > 0, got {value}")]
    NonPositiveMoveLength {
        /// The rejected length.
        value: f64,
    },

    /// Over-speed factors are out of order
    #[error("Speed factors must satisfy 0 < min_over_speed <= max_over_speed, got {min} and {max}")]
    InvalidSpeedFactors {
        /// Lower clamp factor.
        min: f64,
        /// Upper clamp factor.
        max: f64,
    },

    /// A structural marker has no text to match
    #[error("Marker '{name}' must not be empty")]
    EmptyMarker {
        /// The marker name.
        name: String,
    },
}

/// Input precondition error type
///
/// Rewriting extrusion deltas is only meaningful when each E value is a
/// delta and coordinates are absolute.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    /// An infill move was reached while absolute extrusion (M82) is active
    #[error("Absolute extrusion (M82) is active at line {line_number}; the program must use relative extrusion (M83): {content}")]
    AbsoluteExtrusion {
        /// The 1-based line number of the infill move.
        line_number: usize,
        /// The full line content.
        content: String,
    },

    /// An infill move was reached before any extrusion mode command
    #[error("No extrusion mode (M82/M83) set before line {line_number}; relative extrusion cannot be confirmed: {content}")]
    UnknownExtrusionMode {
        /// The 1-based line number of the infill move.
        line_number: usize,
        /// The full line content.
        content: String,
    },

    /// An infill move was reached while relative positioning (G91) is active
    #[error("Relative positioning (G91) is active at line {line_number}; infill coordinates must be absolute: {content}")]
    RelativePositioning {
        /// The 1-based line number of the infill move.
        line_number: usize,
        /// The full line content.
        content: String,
    },
}

/// Main error type for Gradient Infill
///
/// A unified error type that can represent any error from all stages.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input precondition error
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a parse error
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Parse(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this is a precondition error
    pub fn is_precondition_error(&self) -> bool {
        matches!(self, Error::Precondition(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

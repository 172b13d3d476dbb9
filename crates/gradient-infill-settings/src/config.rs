//! Configuration for the gradient infill transform
//!
//! Provides the settings model, validation, and JSON/TOML file handling.
//!
//! Settings are organized into sections:
//! - Flow profile (multiplier range, gradient distance, quantization)
//! - Subdivision (maximum length of emitted infill moves)
//! - Markers (slicer comment vocabulary)
//! - Speed (optional feed compensation)
//! - Input policy and output precision
//! - Distance index selection

use gradient_infill_core::ConfigError;
use gradient_infill_gcode::{MarkerSet, NumberFormat, WallSource};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SettingsError, SettingsResult};

/// One `(distance, multiplier)` point of a custom gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Distance from the nearest wall in mm
    pub distance: f64,
    /// Extrusion multiplier at that distance
    pub multiplier: f64,
}

impl ControlPoint {
    /// Create a control point
    pub fn new(distance: f64, multiplier: f64) -> Self {
        Self {
            distance,
            multiplier,
        }
    }
}

/// Flow profile settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Multiplier at the wall (distance 0)
    pub min_flow: f64,
    /// Multiplier at and beyond `max_distance`
    pub max_flow: f64,
    /// Distance in mm over which the gradient runs
    pub max_distance: f64,
    /// Quantization levels, 0 for a continuous gradient
    pub steps: u32,
    /// Explicit profile replacing the two-point `min_flow`..`max_flow` line
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub control_points: Vec<ControlPoint>,
    /// Fixed multiplier for short linking moves instead of the gradient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_move_flow: Option<f64>,
    /// Moves shorter than this get `short_move_flow`, in mm
    /// (default: twice `subdivision.max_move_length`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_move_length: Option<f64>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            min_flow: 0.5,
            max_flow: 3.5,
            max_distance: 6.0,
            steps: 0,
            control_points: Vec::new(),
            short_move_flow: None,
            short_move_length: None,
        }
    }
}

impl FlowSettings {
    /// Control points of the profile described by these settings
    pub fn profile_points(&self) -> Vec<ControlPoint> {
        if self.control_points.is_empty() {
            vec![
                ControlPoint::new(0.0, self.min_flow),
                ControlPoint::new(self.max_distance, self.max_flow),
            ]
        } else {
            self.control_points.clone()
        }
    }

    /// Override parts of the two-point profile
    ///
    /// Custom control points would shadow the new values, so they are dropped
    /// when any value is given.
    pub fn override_linear(
        &mut self,
        min_flow: Option<f64>,
        max_flow: Option<f64>,
        max_distance: Option<f64>,
    ) {
        if min_flow.is_none() && max_flow.is_none() && max_distance.is_none() {
            return;
        }
        if !self.control_points.is_empty() {
            tracing::warn!(
                "Discarding {} custom control points in favour of the min/max flow profile",
                self.control_points.len()
            );
            self.control_points.clear();
        }
        if let Some(value) = min_flow {
            self.min_flow = value;
        }
        if let Some(value) = max_flow {
            self.max_flow = value;
        }
        if let Some(value) = max_distance {
            self.max_distance = value;
        }
    }
}

/// Subdivision settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionSettings {
    /// Infill moves longer than this are split, in mm
    pub max_move_length: f64,
}

impl Default for SubdivisionSettings {
    fn default() -> Self {
        // gradient distance over four discretization steps
        Self {
            max_move_length: 1.5,
        }
    }
}

/// Feed-rate compensation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedSettings {
    /// Scale the feed rate of rewritten moves inversely to their multiplier
    pub gradual_speed: bool,
    /// Upper clamp as a factor of the base feed rate
    pub max_over_speed: f64,
    /// Lower clamp as a factor of the base feed rate
    pub min_over_speed: f64,
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            gradual_speed: false,
            max_over_speed: 2.0,
            min_over_speed: 0.6,
        }
    }
}

/// Input handling policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Treat programs without M82/M83 as relative extrusion
    pub assume_relative_extrusion: bool,
}

/// Spatial index used for wall-distance queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceIndex {
    /// Grid when a layer has at least `grid_threshold` wall segments
    #[default]
    Auto,
    /// Scan every wall segment
    Linear,
    /// Always use the uniform grid
    Grid,
}

impl std::fmt::Display for DistanceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Linear => write!(f, "linear"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

/// Distance evaluation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceSettings {
    /// Index selection
    pub index: DistanceIndex,
    /// Wall segment count from which `auto` switches to the grid
    pub grid_threshold: usize,
}

impl Default for DistanceSettings {
    fn default() -> Self {
        Self {
            index: DistanceIndex::Auto,
            grid_threshold: 64,
        }
    }
}

/// Complete transform configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientSettings {
    /// Flow profile
    pub flow: FlowSettings,
    /// Subdivision
    pub subdivision: SubdivisionSettings,
    /// Marker vocabulary
    pub markers: MarkerSet,
    /// Feed-rate compensation
    pub speed: SpeedSettings,
    /// Input policy
    pub input: InputSettings,
    /// Output number precision
    pub output: NumberFormat,
    /// Distance evaluation
    pub distance: DistanceSettings,
}

impl GradientSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure the gradient from the given wall type
    pub fn with_wall_source(mut self, source: WallSource) -> Self {
        self.markers.wall_start = MarkerSet::cura(source).wall_start;
        self
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let settings: Self = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        settings.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Length below which a move gets the short-move multiplier
    pub fn short_move_threshold(&self) -> f64 {
        self.flow
            .short_move_length
            .unwrap_or(2.0 * self.subdivision.max_move_length)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let flow = &self.flow;
        check_non_negative("flow.min_flow", flow.min_flow)?;
        check_non_negative("flow.max_flow", flow.max_flow)?;
        check_finite("flow.max_distance", flow.max_distance)?;

        if flow.max_distance <= 0.0 {
            return Err(ConfigError::NonPositiveMaxDistance {
                value: flow.max_distance,
            });
        }

        if flow.control_points.is_empty() && flow.max_flow < flow.min_flow {
            return Err(ConfigError::DecreasingMultiplier {
                index: 1,
                multiplier: flow.max_flow,
            });
        }

        for point in &flow.control_points {
            check_finite("flow.control_points.distance", point.distance)?;
            check_non_negative("flow.control_points.multiplier", point.multiplier)?;
        }

        if let Some(value) = flow.short_move_flow {
            check_non_negative("flow.short_move_flow", value)?;
        }
        if let Some(value) = flow.short_move_length {
            check_non_negative("flow.short_move_length", value)?;
        }

        if flow.steps == 1 {
            return Err(ConfigError::InvalidSteps { steps: flow.steps });
        }

        let max_move_length = self.subdivision.max_move_length;
        check_finite("subdivision.max_move_length", max_move_length)?;
        if max_move_length <= 0.0 {
            return Err(ConfigError::NonPositiveMoveLength {
                value: max_move_length,
            });
        }

        let speed = &self.speed;
        let factors_ok = speed.min_over_speed.is_finite()
            && speed.max_over_speed.is_finite()
            && speed.min_over_speed > 0.0
            && speed.min_over_speed <= speed.max_over_speed;
        if !factors_ok {
            return Err(ConfigError::InvalidSpeedFactors {
                min: speed.min_over_speed,
                max: speed.max_over_speed,
            });
        }

        self.markers.validate()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn check_finite(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteValue {
            key: key.to_string(),
            value,
        })
    }
}

fn check_non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(key, value)?;
    if value < 0.0 {
        return Err(ConfigError::NonFiniteValue {
            key: key.to_string(),
            value,
        });
    }
    Ok(())
}

//! Gradient profile
//!
//! Maps a wall distance to an extrusion multiplier by piecewise-linear
//! interpolation between control points, optionally quantized to a fixed
//! number of levels.

use gradient_infill_core::ConfigError;
use gradient_infill_settings::{ControlPoint, FlowSettings};

/// Immutable distance to multiplier mapping
#[derive(Debug, Clone, PartialEq)]
pub struct GradientProfile {
    points: Vec<ControlPoint>,
    steps: u32,
}

impl GradientProfile {
    /// Build a profile from control points
    ///
    /// Distances must be finite and strictly increasing, multipliers finite,
    /// non-negative and non-decreasing, and the last distance positive.
    /// `steps` is 0 for a continuous profile or the number of levels (>= 2).
    pub fn new(points: Vec<ControlPoint>, steps: u32) -> Result<Self, ConfigError> {
        let Some(last) = points.last() else {
            return Err(ConfigError::NonPositiveMaxDistance { value: 0.0 });
        };

        for (index, point) in points.iter().enumerate() {
            if !point.distance.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    key: format!("control_points[{}].distance", index),
                    value: point.distance,
                });
            }
            if !point.multiplier.is_finite() || point.multiplier < 0.0 {
                return Err(ConfigError::NonFiniteValue {
                    key: format!("control_points[{}].multiplier", index),
                    value: point.multiplier,
                });
            }
        }

        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].distance <= pair[0].distance {
                return Err(ConfigError::NonIncreasingDistance {
                    index: index + 1,
                    distance: pair[1].distance,
                });
            }
            if pair[1].multiplier < pair[0].multiplier {
                return Err(ConfigError::DecreasingMultiplier {
                    index: index + 1,
                    multiplier: pair[1].multiplier,
                });
            }
        }

        if last.distance <= 0.0 {
            return Err(ConfigError::NonPositiveMaxDistance {
                value: last.distance,
            });
        }

        if steps == 1 {
            return Err(ConfigError::InvalidSteps { steps });
        }

        Ok(Self { points, steps })
    }

    /// Two-point profile from `min_flow` at the wall to `max_flow` at `max_distance`
    pub fn linear(
        min_flow: f64,
        max_flow: f64,
        max_distance: f64,
        steps: u32,
    ) -> Result<Self, ConfigError> {
        if max_distance.is_finite() && max_distance <= 0.0 {
            return Err(ConfigError::NonPositiveMaxDistance {
                value: max_distance,
            });
        }
        Self::new(
            vec![
                ControlPoint::new(0.0, min_flow),
                ControlPoint::new(max_distance, max_flow),
            ],
            steps,
        )
    }

    /// Profile described by flow settings
    pub fn from_settings(flow: &FlowSettings) -> Result<Self, ConfigError> {
        Self::new(flow.profile_points(), flow.steps)
    }

    /// Control points
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Quantization levels (0 = continuous)
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Multiplier at the nearest distance
    pub fn min_multiplier(&self) -> f64 {
        self.points.first().map_or(1.0, |p| p.multiplier)
    }

    /// Multiplier at and beyond the last control point
    pub fn max_multiplier(&self) -> f64 {
        self.points.last().map_or(1.0, |p| p.multiplier)
    }

    /// Distance from which the profile saturates
    pub fn max_distance(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.distance)
    }

    /// Extrusion multiplier for a wall distance
    ///
    /// `+inf` (no wall on the layer) and NaN saturate at the last multiplier.
    pub fn flow_multiplier(&self, distance: f64) -> f64 {
        self.quantize(self.interpolate(distance))
    }

    fn interpolate(&self, distance: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 1.0;
        };

        if distance.is_nan() || distance >= last.distance {
            return last.multiplier;
        }
        if distance <= first.distance {
            return first.multiplier;
        }

        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if distance <= b.distance {
                let t = (distance - a.distance) / (b.distance - a.distance);
                return a.multiplier + (b.multiplier - a.multiplier) * t;
            }
        }

        last.multiplier
    }

    fn quantize(&self, multiplier: f64) -> f64 {
        if self.steps < 2 {
            return multiplier;
        }

        let low = self.min_multiplier();
        let high = self.max_multiplier();
        let span = high - low;
        if span <= 0.0 {
            return multiplier;
        }

        let levels = f64::from(self.steps - 1);
        let t = ((multiplier - low) / span).clamp(0.0, 1.0);
        let level = (t * levels).round();
        if level >= levels {
            high
        } else {
            low + span * level / levels
        }
    }
}

impl Default for GradientProfile {
    fn default() -> Self {
        let flow = FlowSettings::default();
        Self {
            points: flow.profile_points(),
            steps: flow.steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_profile(steps: u32) -> GradientProfile {
        GradientProfile::linear(0.2, 1.0, 5.0, steps).expect("valid profile")
    }

    #[test]
    fn test_saturation() {
        let profile = scenario_profile(0);
        assert_eq!(profile.flow_multiplier(5.0), 1.0);
        assert_eq!(profile.flow_multiplier(50.0), 1.0);
        assert_eq!(profile.flow_multiplier(f64::INFINITY), 1.0);
        assert_eq!(profile.flow_multiplier(f64::NAN), 1.0);
        assert_eq!(profile.flow_multiplier(0.0), 0.2);
        assert_eq!(profile.flow_multiplier(-3.0), 0.2);
    }

    #[test]
    fn test_linear_interpolation() {
        let profile = scenario_profile(0);
        assert!((profile.flow_multiplier(0.1) - 0.216).abs() < 1e-12);
        assert!((profile.flow_multiplier(2.5) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_quantization_is_deterministic() {
        let profile = scenario_profile(4);
        let level = profile.flow_multiplier(2.5);
        assert!((level - (0.2 + 0.8 * 2.0 / 3.0)).abs() < 1e-12);
        for _ in 0..10 {
            assert_eq!(profile.flow_multiplier(2.5), level);
        }
        assert_eq!(profile.flow_multiplier(0.0), 0.2);
        assert_eq!(profile.flow_multiplier(10.0), 1.0);
    }

    #[test]
    fn test_multi_point_profile() {
        let profile = GradientProfile::new(
            vec![
                ControlPoint::new(1.0, 0.5),
                ControlPoint::new(2.0, 1.5),
                ControlPoint::new(4.0, 1.5),
                ControlPoint::new(6.0, 2.5),
            ],
            0,
        )
        .expect("valid profile");
        assert_eq!(profile.flow_multiplier(0.5), 0.5);
        assert!((profile.flow_multiplier(1.5) - 1.0).abs() < 1e-12);
        assert_eq!(profile.flow_multiplier(3.0), 1.5);
        assert!((profile.flow_multiplier(5.0) - 2.0).abs() < 1e-12);
        assert_eq!(profile.max_distance(), 6.0);
    }

    #[test]
    fn test_invalid_profiles() {
        assert_eq!(
            GradientProfile::linear(0.2, 1.0, 0.0, 0),
            Err(ConfigError::NonPositiveMaxDistance { value: 0.0 })
        );
        assert_eq!(
            GradientProfile::linear(0.2, 1.0, 5.0, 1),
            Err(ConfigError::InvalidSteps { steps: 1 })
        );
        assert!(matches!(
            GradientProfile::linear(1.0, 0.5, 5.0, 0),
            Err(ConfigError::DecreasingMultiplier { index: 1, .. })
        ));
        assert!(matches!(
            GradientProfile::new(
                vec![ControlPoint::new(0.0, 1.0), ControlPoint::new(0.0, 2.0)],
                0
            ),
            Err(ConfigError::NonIncreasingDistance { index: 1, .. })
        ));
        assert!(GradientProfile::new(Vec::new(), 0).is_err());
        assert!(GradientProfile::linear(f64::NAN, 1.0, 5.0, 0).is_err());
    }

    #[test]
    fn test_default_matches_flow_settings() {
        let profile = GradientProfile::default();
        assert_eq!(profile.min_multiplier(), 0.5);
        assert_eq!(profile.max_multiplier(), 3.5);
        assert_eq!(profile.max_distance(), 6.0);
    }
}

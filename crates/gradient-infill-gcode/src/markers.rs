//! Structural marker recognition
//!
//! Slicers annotate their output with comment lines that delimit layers and
//! feature regions (e.g. Cura's `;LAYER:3`, `;TYPE:WALL-INNER`, `;TYPE:FILL`).
//! The marker vocabulary is configuration; the classifier only ever sees the
//! closed set of [`MarkerKind`]s produced here.

use gradient_infill_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Kind of structural event a directive line represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    /// A new layer begins; carries the layer number written by the slicer
    LayerStart {
        /// Number following the layer prefix, when it parses
        number: Option<i64>,
    },
    /// A perimeter region used as gradient reference begins
    WallStart,
    /// The perimeter region ends (any other feature type begins)
    WallEnd,
    /// An infill region begins
    InfillStart,
    /// The infill region ends (any other comment line)
    InfillEnd,
}

/// A marker anchored to the record it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEvent {
    /// Index of the directive record carrying the marker
    pub record_index: usize,
    /// What the marker means
    pub kind: MarkerKind,
}

/// Which perimeter the gradient is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallSource {
    /// Inner walls (closest perimeter to the infill)
    #[default]
    Inner,
    /// Outer walls
    Outer,
}

impl std::fmt::Display for WallSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inner => write!(f, "inner"),
            Self::Outer => write!(f, "outer"),
        }
    }
}

/// Marker vocabulary
///
/// Each entry is a line prefix, matched after leading whitespace is trimmed.
/// Recognition order is layer, infill start, wall start, wall end, infill end,
/// so the generic end prefixes only apply to lines no earlier prefix claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    /// Prefix of layer-change comments
    pub layer_start: String,
    /// Prefixes opening a wall region
    pub wall_start: Vec<String>,
    /// Prefixes closing a wall region
    pub wall_end: Vec<String>,
    /// Prefixes opening an infill region
    pub infill_start: Vec<String>,
    /// Prefixes closing an infill region
    pub infill_end: Vec<String>,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::cura(WallSource::Inner)
    }
}

impl MarkerSet {
    /// Cura's comment vocabulary, measuring from the chosen wall type
    pub fn cura(source: WallSource) -> Self {
        let wall_start = match source {
            WallSource::Inner => ";TYPE:WALL-INNER",
            WallSource::Outer => ";TYPE:WALL-OUTER",
        };
        Self {
            layer_start: ";LAYER:".to_string(),
            wall_start: vec![wall_start.to_string()],
            wall_end: vec![";TYPE:".to_string()],
            infill_start: vec![";TYPE:FILL".to_string()],
            infill_end: vec![";".to_string()],
        }
    }

    /// Classify a directive line
    pub fn recognize(&self, line: &str) -> Option<MarkerKind> {
        let line = line.trim_start();

        if let Some(rest) = line.strip_prefix(self.layer_start.as_str()) {
            return Some(MarkerKind::LayerStart {
                number: rest.trim().parse::<i64>().ok(),
            });
        }

        let has_prefix =
            |prefixes: &[String]| prefixes.iter().any(|p| line.starts_with(p.as_str()));

        if has_prefix(&self.infill_start) {
            Some(MarkerKind::InfillStart)
        } else if has_prefix(&self.wall_start) {
            Some(MarkerKind::WallStart)
        } else if has_prefix(&self.wall_end) {
            Some(MarkerKind::WallEnd)
        } else if has_prefix(&self.infill_end) {
            Some(MarkerKind::InfillEnd)
        } else {
            None
        }
    }

    /// Reject vocabularies with empty prefixes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layer_start.is_empty() {
            return Err(ConfigError::EmptyMarker {
                name: "layer_start".to_string(),
            });
        }

        let lists = [
            ("wall_start", &self.wall_start),
            ("wall_end", &self.wall_end),
            ("infill_start", &self.infill_start),
            ("infill_end", &self.infill_end),
        ];
        for (name, prefixes) in lists {
            if prefixes.is_empty() || prefixes.iter().any(|p| p.is_empty()) {
                return Err(ConfigError::EmptyMarker {
                    name: name.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cura_inner_vocabulary() {
        let markers = MarkerSet::cura(WallSource::Inner);
        assert_eq!(
            markers.recognize(";LAYER:12"),
            Some(MarkerKind::LayerStart { number: Some(12) })
        );
        assert_eq!(
            markers.recognize(";TYPE:WALL-INNER"),
            Some(MarkerKind::WallStart)
        );
        assert_eq!(
            markers.recognize(";TYPE:WALL-OUTER"),
            Some(MarkerKind::WallEnd)
        );
        assert_eq!(markers.recognize(";TYPE:FILL"), Some(MarkerKind::InfillStart));
        assert_eq!(markers.recognize(";TYPE:SKIN"), Some(MarkerKind::WallEnd));
        assert_eq!(
            markers.recognize(";MESH:NONMESH"),
            Some(MarkerKind::InfillEnd)
        );
        assert_eq!(markers.recognize("M83"), None);
    }

    #[test]
    fn test_cura_outer_vocabulary() {
        let markers = MarkerSet::cura(WallSource::Outer);
        assert_eq!(
            markers.recognize(";TYPE:WALL-OUTER"),
            Some(MarkerKind::WallStart)
        );
        assert_eq!(
            markers.recognize(";TYPE:WALL-INNER"),
            Some(MarkerKind::WallEnd)
        );
    }

    #[test]
    fn test_layer_without_number() {
        let markers = MarkerSet::default();
        assert_eq!(
            markers.recognize("  ;LAYER:top"),
            Some(MarkerKind::LayerStart { number: None })
        );
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let mut markers = MarkerSet::default();
        assert!(markers.validate().is_ok());

        markers.infill_start = vec![String::new()];
        assert_eq!(
            markers.validate(),
            Err(ConfigError::EmptyMarker {
                name: "infill_start".to_string()
            })
        );

        markers = MarkerSet::default();
        markers.layer_start.clear();
        assert!(markers.validate().is_err());
    }
}

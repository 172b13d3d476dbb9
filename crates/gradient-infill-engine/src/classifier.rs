//! Region classification
//!
//! Walks a parsed program and labels every record `Wall`, `Infill` or
//! `Other` from the marker events alone. Extruding moves inside a wall region
//! become [`WallSegment`]s of the current layer.

use gradient_infill_core::WallSegment;
use gradient_infill_gcode::{MarkerKind, ModalState, MotionRecord, ParsedProgram};
use serde::{Deserialize, Serialize};

/// Classification label of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionLabel {
    /// Perimeter used as distance reference
    Wall,
    /// Infill, subject to rewriting
    Infill,
    /// Everything else, never rewritten
    Other,
}

/// Classifier state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassifierState {
    /// Outside any tracked region
    #[default]
    Outside,
    /// Inside a wall region
    InWall,
    /// Inside an infill region
    InInfill,
}

impl ClassifierState {
    /// State after a marker
    pub fn on_marker(self, kind: MarkerKind) -> Self {
        match kind {
            MarkerKind::LayerStart { .. } | MarkerKind::WallEnd => Self::Outside,
            MarkerKind::WallStart => Self::InWall,
            MarkerKind::InfillStart => Self::InInfill,
            MarkerKind::InfillEnd => match self {
                Self::InInfill => Self::Outside,
                other => other,
            },
        }
    }

    /// Label given to records in this state
    pub fn label(self) -> RegionLabel {
        match self {
            Self::Outside => RegionLabel::Other,
            Self::InWall => RegionLabel::Wall,
            Self::InInfill => RegionLabel::Infill,
        }
    }
}

/// Wall geometry of one layer
///
/// Layer 0 holds everything before the first layer marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWalls {
    /// Layer number written by the slicer, if any
    pub number: Option<i64>,
    /// Index of the record that opened the layer
    pub start_record: usize,
    /// Wall segments in program order
    pub segments: Vec<WallSegment>,
}

/// Contiguous run of records sharing a label and layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Classification label
    pub label: RegionLabel,
    /// Layer index into [`Classification::layers`]
    pub layer: usize,
    /// First record index
    pub start: usize,
    /// One past the last record index
    pub end: usize,
    /// Wall segments of the layer that precede this run
    pub visible_walls: usize,
}

impl Segment {
    /// Record indices covered by the run
    pub fn records(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Number of records in the run
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the run is empty
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Result of classifying a program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Runs covering every record, in program order
    pub segments: Vec<Segment>,
    /// Per-layer wall geometry
    pub layers: Vec<LayerWalls>,
}

impl Classification {
    /// Whether any record is labelled infill
    pub fn has_infill(&self) -> bool {
        self.segments.iter().any(|s| s.label == RegionLabel::Infill)
    }

    /// Total wall segments over all layers
    pub fn wall_segment_count(&self) -> usize {
        self.layers.iter().map(|l| l.segments.len()).sum()
    }

    /// Number of layer markers seen
    pub fn layer_count(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    /// Label of a record
    pub fn label_of(&self, record_index: usize) -> Option<RegionLabel> {
        self.segments
            .iter()
            .find(|s| s.records().contains(&record_index))
            .map(|s| s.label)
    }
}

/// Marker-driven region classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionClassifier;

impl RegionClassifier {
    /// Create a new classifier
    pub fn new() -> Self {
        Self
    }

    /// Classify every record of `program`
    pub fn classify(&self, program: &ParsedProgram) -> Classification {
        let mut layers = vec![LayerWalls {
            number: None,
            start_record: 0,
            segments: Vec::new(),
        }];
        let mut segments: Vec<Segment> = Vec::new();
        let mut state = ClassifierState::Outside;
        let mut modal = ModalState::new();
        let mut warned_layer: Option<usize> = None;
        let mut markers = program.markers.iter().peekable();

        for (index, record) in program.records.iter().enumerate() {
            while let Some(marker) = markers.next_if(|m| m.record_index == index) {
                if let MarkerKind::LayerStart { number } = marker.kind {
                    layers.push(LayerWalls {
                        number,
                        start_record: index,
                        segments: Vec::new(),
                    });
                }
                state = state.on_marker(marker.kind);

                let layer = layers.len() - 1;
                if marker.kind == MarkerKind::InfillStart
                    && layers[layer].segments.is_empty()
                    && warned_layer != Some(layer)
                {
                    tracing::warn!(
                        "Infill at line {} precedes any wall on its layer; treating it as far from walls",
                        ParsedProgram::line_number(index)
                    );
                    warned_layer = Some(layer);
                }
            }

            let layer = layers.len() - 1;
            let label = state.label();
            let next = modal.apply(record);

            if let (ClassifierState::InWall, MotionRecord::LinearMove(m)) = (state, record) {
                if m.is_extruding() {
                    if let (Some(start), Some(end)) = (modal.position(), next.position()) {
                        layers[layer].segments.push(WallSegment::new(start, end, layer));
                    }
                }
            }
            modal = next;

            match segments.last_mut() {
                Some(run) if run.label == label && run.layer == layer => run.end = index + 1,
                _ => segments.push(Segment {
                    label,
                    layer,
                    start: index,
                    end: index + 1,
                    visible_walls: layers[layer].segments.len(),
                }),
            }
        }

        for (layer, walls) in layers.iter().enumerate() {
            tracing::debug!(
                "Layer {} ({:?}): {} wall segments",
                layer,
                walls.number,
                walls.segments.len()
            );
        }

        Classification { segments, layers }
    }
}

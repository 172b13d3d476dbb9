//! # Gradient Infill Engine
//!
//! The geometric core of the transform: region classification, wall
//! distance evaluation, the distance to flow mapping, infill move
//! subdivision and rewriting, and the pipeline tying them together.

pub mod classifier;
pub mod distance;
pub mod pipeline;
pub mod profile;
pub mod rewriter;

pub use classifier::{
    Classification, ClassifierState, LayerWalls, RegionClassifier, RegionLabel, Segment,
};
pub use distance::{DistanceField, LinearScan, UniformGrid, WallIndex};
pub use pipeline::{GradientInfill, TransformReport};
pub use profile::GradientProfile;
pub use rewriter::{
    compensated_feed, piece_count, subdivide, RewriteOutput, RewriteStats, SegmentRewriter,
    SubMove,
};

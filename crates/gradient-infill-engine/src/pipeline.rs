//! Gradient infill transform pipeline
//!
//! Parse, classify, build the distance field, rewrite and serialize. The
//! whole transform is a pure function from input text to output text; any
//! error aborts it without producing output.

use gradient_infill_core::Result;
use gradient_infill_gcode::{ProgramParser, ProgramSerializer};
use gradient_infill_settings::GradientSettings;
use serde::{Deserialize, Serialize};

use crate::classifier::RegionClassifier;
use crate::distance::DistanceField;
use crate::profile::GradientProfile;
use crate::rewriter::SegmentRewriter;

/// Summary of one transform run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformReport {
    /// Layer markers seen
    pub layers: usize,
    /// Wall segments collected over all layers
    pub wall_segments: usize,
    /// Infill moves replaced
    pub infill_moves_rewritten: usize,
    /// Moves emitted in their place
    pub sub_moves_emitted: usize,
    /// Feed restore lines inserted
    pub feed_restores: usize,
    /// Input line count
    pub lines_in: usize,
    /// Output line count
    pub lines_out: usize,
}

impl std::fmt::Display for TransformReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} layers, {} wall segments, {} infill moves rewritten into {} moves, {} feed restores, {} -> {} lines",
            self.layers,
            self.wall_segments,
            self.infill_moves_rewritten,
            self.sub_moves_emitted,
            self.feed_restores,
            self.lines_in,
            self.lines_out
        )
    }
}

/// Configured gradient infill transform
#[derive(Debug, Clone)]
pub struct GradientInfill {
    settings: GradientSettings,
    profile: GradientProfile,
    parser: ProgramParser,
    serializer: ProgramSerializer,
}

impl GradientInfill {
    /// Validate settings and build the transform
    pub fn new(settings: GradientSettings) -> Result<Self> {
        settings.validate()?;
        let profile = GradientProfile::from_settings(&settings.flow)?;
        let parser = ProgramParser::new(settings.markers.clone());
        let serializer = ProgramSerializer::new(settings.output);

        Ok(Self {
            settings,
            profile,
            parser,
            serializer,
        })
    }

    /// Settings in use
    pub fn settings(&self) -> &GradientSettings {
        &self.settings
    }

    /// Gradient profile in use
    pub fn profile(&self) -> &GradientProfile {
        &self.profile
    }

    /// Transform a program
    pub fn process(&self, input: &str) -> Result<String> {
        self.process_with_report(input).map(|(output, _)| output)
    }

    /// Transform a program and report what changed
    pub fn process_with_report(&self, input: &str) -> Result<(String, TransformReport)> {
        let program = self.parser.parse(input)?;
        let classification = RegionClassifier::new().classify(&program);

        let mut report = TransformReport {
            layers: classification.layer_count(),
            wall_segments: classification.wall_segment_count(),
            lines_in: program.len(),
            ..TransformReport::default()
        };

        if !classification.has_infill() {
            tracing::info!("No infill regions found; output is unchanged");
            report.lines_out = report.lines_in;
            return Ok((input.to_string(), report));
        }

        let field = DistanceField::build(&classification.layers, &self.settings.distance);
        let output = SegmentRewriter::new(
            &self.profile,
            &field,
            self.settings.subdivision.max_move_length,
        )
        .with_speed(self.settings.speed.clone())
        .with_short_move_flow(
            self.settings.flow.short_move_flow,
            self.settings.short_move_threshold(),
        )
        .assume_relative_extrusion(self.settings.input.assume_relative_extrusion)
        .rewrite(&program, &classification)?;

        let text = self
            .serializer
            .serialize(&output.records, program.line_ending);

        report.infill_moves_rewritten = output.stats.infill_moves_rewritten;
        report.sub_moves_emitted = output.stats.sub_moves_emitted;
        report.feed_restores = output.stats.feed_restores;
        report.lines_out = output.records.len();

        tracing::info!("Gradient infill applied: {}", report);
        Ok((text, report))
    }
}

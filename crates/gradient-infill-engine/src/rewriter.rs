//! Infill move rewriting
//!
//! Each extruding infill move is split into pieces no longer than the
//! subdivision threshold. Every piece gets its share of the original
//! extrusion scaled by the multiplier for its wall distance. With gradual
//! speed enabled the feed rate is scaled inversely and the original modal
//! feed is restored before the next untouched move that depends on it.
//! Short linking moves can be given a fixed multiplier instead, and
//! retractions are never touched.
//!
//! Only the fields a rewrite changes are re-formatted; every other field of
//! the source line keeps its original text.

use gradient_infill_core::{Point2D, PreconditionError};
use gradient_infill_gcode::{
    Axis, ExtrusionMode, LinearMove, ModalState, MotionRecord, ParsedProgram, PositioningMode,
};
use gradient_infill_settings::SpeedSettings;

use crate::classifier::{Classification, RegionLabel};
use crate::distance::DistanceField;
use crate::profile::GradientProfile;

/// One piece of a subdivided move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubMove {
    /// Piece start
    pub start: Point2D,
    /// Piece end
    pub end: Point2D,
    /// Unscaled extrusion share
    pub e: f64,
}

/// Number of pieces a move of `length` is split into
pub fn piece_count(length: f64, max_move_length: f64) -> usize {
    if length.is_finite() && max_move_length > 0.0 && length > max_move_length {
        (length / max_move_length).ceil() as usize
    } else {
        1
    }
}

/// Split a move into equal-length pieces sharing its extrusion
pub fn subdivide(start: Point2D, end: Point2D, e: f64, max_move_length: f64) -> Vec<SubMove> {
    let n = piece_count(start.distance_to(&end), max_move_length);
    let share = e / n as f64;
    let mut pieces = Vec::with_capacity(n);
    let mut from = start;

    for i in 1..=n {
        let to = if i == n {
            end
        } else {
            start.lerp(&end, i as f64 / n as f64)
        };
        pieces.push(SubMove {
            start: from,
            end: to,
            e: share,
        });
        from = to;
    }

    pieces
}

/// Feed rate for a piece printed with `multiplier`
pub fn compensated_feed(base: f64, multiplier: f64, speed: &SpeedSettings) -> f64 {
    let upper = base * speed.max_over_speed;
    let lower = base * speed.min_over_speed;
    if multiplier <= 0.0 {
        return upper;
    }
    (base / multiplier).clamp(lower, upper)
}

/// Counters collected while rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewriteStats {
    /// Infill moves replaced
    pub infill_moves_rewritten: usize,
    /// Moves emitted in their place
    pub sub_moves_emitted: usize,
    /// `G1 F` lines inserted to restore the modal feed
    pub feed_restores: usize,
}

/// Output of a rewrite pass
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutput {
    /// Records in output order
    pub records: Vec<MotionRecord>,
    /// Counters
    pub stats: RewriteStats,
}

/// Rewriter for infill moves
#[derive(Debug)]
pub struct SegmentRewriter<'a> {
    profile: &'a GradientProfile,
    field: &'a DistanceField,
    max_move_length: f64,
    speed: SpeedSettings,
    assume_relative_extrusion: bool,
    short_move: Option<ShortMoveFlow>,
}

#[derive(Debug, Clone, Copy)]
struct ShortMoveFlow {
    multiplier: f64,
    max_length: f64,
}

impl<'a> SegmentRewriter<'a> {
    /// Create a rewriter
    pub fn new(
        profile: &'a GradientProfile,
        field: &'a DistanceField,
        max_move_length: f64,
    ) -> Self {
        Self {
            profile,
            field,
            max_move_length,
            speed: SpeedSettings::default(),
            assume_relative_extrusion: false,
            short_move: None,
        }
    }

    /// Give moves shorter than `max_length` a fixed multiplier
    pub fn with_short_move_flow(mut self, multiplier: Option<f64>, max_length: f64) -> Self {
        self.short_move = multiplier.map(|multiplier| ShortMoveFlow {
            multiplier,
            max_length,
        });
        self
    }

    /// Set feed-rate compensation
    pub fn with_speed(mut self, speed: SpeedSettings) -> Self {
        self.speed = speed;
        self
    }

    /// Accept programs that never select an extrusion mode
    pub fn assume_relative_extrusion(mut self, assume: bool) -> Self {
        self.assume_relative_extrusion = assume;
        self
    }

    /// Rewrite every infill move of `program`
    pub fn rewrite(
        &self,
        program: &ParsedProgram,
        classification: &Classification,
    ) -> Result<RewriteOutput, PreconditionError> {
        let mut records = Vec::with_capacity(program.records.len());
        let mut stats = RewriteStats::default();
        let mut state = ModalState::new();
        let mut feed_overridden = false;

        for segment in &classification.segments {
            for index in segment.records() {
                let record = &program.records[index];
                let before = state;
                state = state.apply(record);

                let rewritable = match record {
                    MotionRecord::LinearMove(m) => {
                        segment.label == RegionLabel::Infill && m.is_depositing() && m.has_xy()
                    }
                    MotionRecord::Directive(_) => false,
                };

                if rewritable {
                    if let MotionRecord::LinearMove(m) = record {
                        self.check_preconditions(&before, index, m)?;
                        if let Some(pieces) =
                            self.rewrite_move(m, &before, segment.layer, segment.visible_walls)
                        {
                            feed_overridden |= self.speed.gradual_speed
                                && pieces.iter().any(|p| p.f.is_some());
                            stats.infill_moves_rewritten += 1;
                            stats.sub_moves_emitted += pieces.len();
                            records.extend(pieces.into_iter().map(MotionRecord::LinearMove));
                            continue;
                        }
                    }
                }

                if let MotionRecord::LinearMove(m) = record {
                    if feed_overridden {
                        feed_overridden = false;
                        if let (None, Some(base)) = (m.f, before.feed_rate) {
                            let mut restore = LinearMove::new("G1");
                            restore.set(Axis::F, Some(base));
                            records.push(MotionRecord::LinearMove(restore));
                            stats.feed_restores += 1;
                        }
                    }
                }
                records.push(record.clone());
            }
        }

        tracing::debug!(
            "Rewrote {} infill moves into {} moves ({} feed restores)",
            stats.infill_moves_rewritten,
            stats.sub_moves_emitted,
            stats.feed_restores
        );

        Ok(RewriteOutput { records, stats })
    }

    fn check_preconditions(
        &self,
        state: &ModalState,
        index: usize,
        m: &LinearMove,
    ) -> Result<(), PreconditionError> {
        let line_number = ParsedProgram::line_number(index);
        let content = || m.raw.clone().unwrap_or_default();

        if state.positioning == PositioningMode::Relative {
            return Err(PreconditionError::RelativePositioning {
                line_number,
                content: content(),
            });
        }

        match state.extrusion_mode {
            ExtrusionMode::Relative => Ok(()),
            ExtrusionMode::Absolute => Err(PreconditionError::AbsoluteExtrusion {
                line_number,
                content: content(),
            }),
            ExtrusionMode::Unknown if self.assume_relative_extrusion => Ok(()),
            ExtrusionMode::Unknown => Err(PreconditionError::UnknownExtrusionMode {
                line_number,
                content: content(),
            }),
        }
    }

    /// Replacement moves for `m`, or `None` when its target is unknown
    fn rewrite_move(
        &self,
        m: &LinearMove,
        before: &ModalState,
        layer: usize,
        visible: usize,
    ) -> Option<Vec<LinearMove>> {
        let target = before.target_of(m)?;
        let e = m.e?;
        let base_feed = m.f.or(before.feed_rate);

        let Some(start) = before.position() else {
            let distance = self.field.distance_to_visible_walls(target, layer, visible);
            let multiplier = self.profile.flow_multiplier(distance);
            let mut out = m.detached();
            out.set(Axis::E, Some(e * multiplier));
            self.apply_feed(&mut out, base_feed, multiplier);
            return Some(vec![out]);
        };

        if let Some(short) = self.short_move {
            if start.distance_to(&target) < short.max_length {
                let mut out = m.detached();
                out.set(Axis::E, Some(e * short.multiplier));
                self.apply_feed(&mut out, base_feed, short.multiplier);
                return Some(vec![out]);
            }
        }

        let pieces = subdivide(start, target, e, self.max_move_length);
        let multipliers: Vec<f64> = pieces
            .iter()
            .map(|p| {
                let distance = self.field.segment_distance(p.start, p.end, layer, visible);
                self.profile.flow_multiplier(distance)
            })
            .collect();

        if pieces.len() == 1 {
            let mut out = m.detached();
            out.set(Axis::E, Some(e * multipliers[0]));
            self.apply_feed(&mut out, base_feed, multipliers[0]);
            return Some(vec![out]);
        }

        let last = pieces.len() - 1;
        let target_z = m.z.or(before.z);
        let moves: Vec<LinearMove> = pieces
            .iter()
            .zip(&multipliers)
            .enumerate()
            .map(|(i, (piece, &multiplier))| {
                let t = (i + 1) as f64 / pieces.len() as f64;
                let z = match (before.z, target_z) {
                    (Some(from), Some(to)) => Some(from + (to - from) * t),
                    _ => target_z,
                };

                let mut out = LinearMove::new(m.command.clone());
                for &axis in &m.field_order {
                    match axis {
                        Axis::X | Axis::Y | Axis::Z if i == last => {
                            out.copy_field(m, axis);
                        }
                        Axis::F if i == 0 => {
                            out.copy_field(m, axis);
                        }
                        Axis::X => {
                            out.set(axis, Some(piece.end.x));
                        }
                        Axis::Y => {
                            out.set(axis, Some(piece.end.y));
                        }
                        Axis::Z => {
                            out.set(axis, z);
                        }
                        Axis::E => {
                            out.set(axis, Some(piece.e * multiplier));
                        }
                        Axis::F => {}
                    }
                }
                if out.x.is_none() {
                    out.set(Axis::X, Some(piece.end.x));
                }
                if out.y.is_none() {
                    out.set(Axis::Y, Some(piece.end.y));
                }
                if i == 0 {
                    out.extra_words = m.extra_words.clone();
                }
                if i == last {
                    out.comment = m.comment.clone();
                }
                self.apply_feed(&mut out, base_feed, multiplier);
                out
            })
            .collect();

        Some(moves)
    }

    fn apply_feed(&self, out: &mut LinearMove, base_feed: Option<f64>, multiplier: f64) {
        if !self.speed.gradual_speed {
            return;
        }
        if let Some(base) = base_feed {
            out.set(Axis::F, Some(compensated_feed(base, multiplier, &self.speed)));
        }
    }
}

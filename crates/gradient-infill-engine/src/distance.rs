//! Distance field evaluation
//!
//! Answers "how far is this point from the nearest wall of its layer". Each
//! layer gets its own [`WallIndex`]: a linear scan for small layers, or a
//! uniform grid over the wall segments' bounding box for large ones. Queries
//! take a `visible` count so an infill run only measures against the walls
//! printed before it.

use gradient_infill_core::{Point2D, WallSegment};
use gradient_infill_settings::{DistanceIndex, DistanceSettings};

use crate::classifier::LayerWalls;

/// Nearest-wall query over one layer's wall segments
pub trait WallIndex: Send + Sync {
    /// Name of the index strategy
    fn name(&self) -> &str;

    /// Number of indexed segments
    fn len(&self) -> usize;

    /// Whether the index holds no segments
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Minimum distance from `point` to the first `visible` segments
    ///
    /// Returns `f64::INFINITY` when no segment is visible.
    fn nearest(&self, point: Point2D, visible: usize) -> f64;
}

/// Brute-force index
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    segments: Vec<WallSegment>,
}

impl LinearScan {
    /// Create an index over `segments`
    pub fn new(segments: Vec<WallSegment>) -> Self {
        Self { segments }
    }
}

impl WallIndex for LinearScan {
    fn name(&self) -> &str {
        "linear"
    }

    fn len(&self) -> usize {
        self.segments.len()
    }

    fn nearest(&self, point: Point2D, visible: usize) -> f64 {
        let visible = visible.min(self.segments.len());
        self.segments[..visible]
            .iter()
            .map(|s| s.distance_to_point(&point))
            .fold(f64::INFINITY, f64::min)
    }
}

const MAX_CELLS_PER_AXIS: usize = 256;
const MIN_EXTENT: f64 = 1e-6;

/// Uniform grid index
///
/// Every segment is registered in each cell its bounding box overlaps, in
/// ascending segment order. Queries walk square rings of cells outward from
/// the query cell and stop once the ring's lower bound exceeds the best
/// distance found.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    segments: Vec<WallSegment>,
    origin: Point2D,
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl UniformGrid {
    /// Build a grid over `segments`
    pub fn new(segments: Vec<WallSegment>) -> Self {
        let (origin, max) = bounding_box(&segments);
        let width = (max.x - origin.x).max(MIN_EXTENT);
        let height = (max.y - origin.y).max(MIN_EXTENT);
        let extent = width.max(height);

        let count = segments.len().max(1) as f64;
        let cell_size = (width * height / count)
            .sqrt()
            .clamp(extent / MAX_CELLS_PER_AXIS as f64, extent);

        let cols = ((width / cell_size).floor() as usize + 1).min(MAX_CELLS_PER_AXIS + 1);
        let rows = ((height / cell_size).floor() as usize + 1).min(MAX_CELLS_PER_AXIS + 1);

        let mut grid = Self {
            segments: Vec::new(),
            origin,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        };

        for (index, segment) in segments.iter().enumerate() {
            let (lo, hi) = segment.bounds();
            let (c0, r0) = grid.cell_of(lo);
            let (c1, r1) = grid.cell_of(hi);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    grid.cells[row * cols + col].push(index);
                }
            }
        }
        grid.segments = segments;

        tracing::trace!(
            "Built {}x{} wall grid (cell {:.3}) over {} segments",
            cols,
            rows,
            cell_size,
            grid.segments.len()
        );
        grid
    }

    /// Grid dimensions as (columns, rows)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn cell_of(&self, point: Point2D) -> (usize, usize) {
        let clamp = |value: f64, count: usize| -> usize {
            if value.is_nan() || value <= 0.0 {
                0
            } else {
                (value.floor() as usize).min(count - 1)
            }
        };
        (
            clamp((point.x - self.origin.x) / self.cell_size, self.cols),
            clamp((point.y - self.origin.y) / self.cell_size, self.rows),
        )
    }

    fn scan_cell(&self, col: usize, row: usize, point: Point2D, visible: usize, best: &mut f64) {
        for &index in self.cells[row * self.cols + col]
            .iter()
            .take_while(|&&index| index < visible)
        {
            let d = self.segments[index].distance_to_point(&point);
            if d < *best {
                *best = d;
            }
        }
    }
}

impl WallIndex for UniformGrid {
    fn name(&self) -> &str {
        "grid"
    }

    fn len(&self) -> usize {
        self.segments.len()
    }

    fn nearest(&self, point: Point2D, visible: usize) -> f64 {
        let visible = visible.min(self.segments.len());
        if visible == 0 {
            return f64::INFINITY;
        }

        let (cc, cr) = self.cell_of(point);
        let max_ring = self.cols.max(self.rows);
        let mut best = f64::INFINITY;

        for ring in 0..=max_ring {
            if ring > 0 && best <= (ring - 1) as f64 * self.cell_size {
                break;
            }

            let c0 = cc.saturating_sub(ring);
            let r0 = cr.saturating_sub(ring);
            let c1 = (cc + ring).min(self.cols - 1);
            let r1 = (cr + ring).min(self.rows - 1);

            for row in r0..=r1 {
                for col in c0..=c1 {
                    let on_ring = col.abs_diff(cc) == ring || row.abs_diff(cr) == ring;
                    if on_ring {
                        self.scan_cell(col, row, point, visible, &mut best);
                    }
                }
            }
        }

        best
    }
}

fn bounding_box(segments: &[WallSegment]) -> (Point2D, Point2D) {
    if segments.is_empty() {
        return (Point2D::new(0.0, 0.0), Point2D::new(0.0, 0.0));
    }
    segments.iter().fold(
        (
            Point2D::new(f64::INFINITY, f64::INFINITY),
            Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(lo, hi), segment| {
            let (a, b) = segment.bounds();
            (
                Point2D::new(lo.x.min(a.x), lo.y.min(a.y)),
                Point2D::new(hi.x.max(b.x), hi.y.max(b.y)),
            )
        },
    )
}

/// Wall distance queries for every layer of a program
pub struct DistanceField {
    layers: Vec<Box<dyn WallIndex>>,
}

impl DistanceField {
    /// Build one index per layer
    pub fn build(layers: &[LayerWalls], settings: &DistanceSettings) -> Self {
        let layers = layers
            .iter()
            .map(|layer| -> Box<dyn WallIndex> {
                let segments = layer.segments.clone();
                let use_grid = match settings.index {
                    DistanceIndex::Linear => false,
                    DistanceIndex::Grid => !segments.is_empty(),
                    DistanceIndex::Auto => segments.len() >= settings.grid_threshold.max(1),
                };
                if use_grid {
                    Box::new(UniformGrid::new(segments))
                } else {
                    Box::new(LinearScan::new(segments))
                }
            })
            .collect();
        Self { layers }
    }

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Index strategy used for a layer
    pub fn index_name(&self, layer: usize) -> Option<&str> {
        self.layers.get(layer).map(|index| index.name())
    }

    /// Minimum distance from `point` to any wall segment of `layer`
    pub fn distance_to_walls(&self, point: Point2D, layer: usize) -> f64 {
        self.distance_to_visible_walls(point, layer, usize::MAX)
    }

    /// Minimum distance from `point` to the first `visible` wall segments of `layer`
    pub fn distance_to_visible_walls(&self, point: Point2D, layer: usize, visible: usize) -> f64 {
        match self.layers.get(layer) {
            Some(index) => index.nearest(point, visible),
            None => f64::INFINITY,
        }
    }

    /// Distance of a move to the walls: the nearer of its two endpoints
    pub fn segment_distance(
        &self,
        start: Point2D,
        end: Point2D,
        layer: usize,
        visible: usize,
    ) -> f64 {
        self.distance_to_visible_walls(start, layer, visible)
            .min(self.distance_to_visible_walls(end, layer, visible))
    }
}

impl std::fmt::Debug for DistanceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceField")
            .field("layers", &self.layers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<WallSegment> {
        let corners = [
            Point2D::new(0.0, 0.0),
            Point2D::new(side, 0.0),
            Point2D::new(side, side),
            Point2D::new(0.0, side),
        ];
        (0..4)
            .map(|i| WallSegment::new(corners[i], corners[(i + 1) % 4], 1))
            .collect()
    }

    fn layer(segments: Vec<WallSegment>) -> LayerWalls {
        LayerWalls {
            number: Some(0),
            start_record: 0,
            segments,
        }
    }

    #[test]
    fn test_linear_scan_square() {
        let index = LinearScan::new(square(10.0));
        assert!((index.nearest(Point2D::new(5.0, 5.0), 4) - 5.0).abs() < 1e-12);
        assert!((index.nearest(Point2D::new(0.1, 5.0), 4) - 0.1).abs() < 1e-12);
        assert!((index.nearest(Point2D::new(-3.0, -4.0), 4) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_visible_prefix() {
        let index = LinearScan::new(square(10.0));
        // only the bottom edge is visible
        assert!((index.nearest(Point2D::new(5.0, 9.0), 1) - 9.0).abs() < 1e-12);
        assert_eq!(index.nearest(Point2D::new(5.0, 9.0), 0), f64::INFINITY);
    }

    #[test]
    fn test_grid_matches_linear_scan() {
        let mut segments = Vec::new();
        for i in 0..40 {
            let angle_a = i as f64 * std::f64::consts::TAU / 40.0;
            let angle_b = (i + 1) as f64 * std::f64::consts::TAU / 40.0;
            segments.push(WallSegment::new(
                Point2D::new(20.0 + 15.0 * angle_a.cos(), 20.0 + 15.0 * angle_a.sin()),
                Point2D::new(20.0 + 15.0 * angle_b.cos(), 20.0 + 15.0 * angle_b.sin()),
                1,
            ));
        }
        segments.extend(square(40.0));

        let linear = LinearScan::new(segments.clone());
        let grid = UniformGrid::new(segments.clone());

        for visible in [0, 1, 7, 40, 44] {
            for x in (-10..50).step_by(3) {
                for y in (-10..50).step_by(7) {
                    let p = Point2D::new(x as f64 + 0.25, y as f64 - 0.5);
                    let expected = linear.nearest(p, visible);
                    let actual = grid.nearest(p, visible);
                    assert!(
                        (expected - actual).abs() < 1e-9
                            || (expected.is_infinite() && actual.is_infinite()),
                        "mismatch at {:?} visible {}: {} vs {}",
                        p,
                        visible,
                        expected,
                        actual
                    );
                }
            }
        }
    }

    #[test]
    fn test_grid_with_degenerate_extent() {
        let segments = vec![
            WallSegment::new(Point2D::new(0.0, 2.0), Point2D::new(10.0, 2.0), 0),
            WallSegment::new(Point2D::new(10.0, 2.0), Point2D::new(20.0, 2.0), 0),
        ];
        let grid = UniformGrid::new(segments);
        assert!((grid.nearest(Point2D::new(15.0, 5.0), 2) - 3.0).abs() < 1e-12);
        assert!((grid.nearest(Point2D::new(25.0, 2.0), 2) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_field_index_selection() {
        let layers = vec![layer(Vec::new()), layer(square(10.0))];

        let auto = DistanceField::build(&layers, &DistanceSettings::default());
        assert_eq!(auto.index_name(1), Some("linear"));

        let grid = DistanceField::build(
            &layers,
            &DistanceSettings {
                index: DistanceIndex::Grid,
                grid_threshold: 64,
            },
        );
        assert_eq!(grid.index_name(0), Some("linear"));
        assert_eq!(grid.index_name(1), Some("grid"));
        assert_eq!(grid.layer_count(), 2);
    }

    #[test]
    fn test_field_distances() {
        let field = DistanceField::build(
            &[layer(Vec::new()), layer(square(10.0))],
            &DistanceSettings::default(),
        );
        assert_eq!(field.distance_to_walls(Point2D::new(5.0, 5.0), 0), f64::INFINITY);
        assert_eq!(field.distance_to_walls(Point2D::new(5.0, 5.0), 9), f64::INFINITY);
        assert!((field.distance_to_walls(Point2D::new(5.0, 5.0), 1) - 5.0).abs() < 1e-12);

        let d = field.segment_distance(Point2D::new(5.0, 5.0), Point2D::new(5.0, 6.0), 1, 4);
        assert!((d - 4.0).abs() < 1e-12);
    }
}

//! Planar geometry used by the distance queries
//!
//! Z is tracked elsewhere for layer bookkeeping; every distance computed here
//! is in the XY plane of a single layer.

use serde::{Deserialize, Serialize};

/// A point in the XY plane (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point2D {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`
    pub fn lerp(&self, other: &Point2D, t: f64) -> Point2D {
        Point2D::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// One straight piece of perimeter on a given layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    /// Segment start
    pub start: Point2D,
    /// Segment end
    pub end: Point2D,
    /// Ordinal of the layer the segment was printed on
    pub layer: usize,
}

impl WallSegment {
    /// Create a new wall segment
    pub fn new(start: Point2D, end: Point2D, layer: usize) -> Self {
        Self { start, end, layer }
    }

    /// Segment length
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Distance from `point` to the closest point of this finite segment.
    ///
    /// The projection parameter is clamped to `[0, 1]`, so points beyond either
    /// end measure to that endpoint. Degenerate segments measure to `start`.
    pub fn distance_to_point(&self, point: &Point2D) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let norm = dx * dx + dy * dy;
        if norm <= f64::EPSILON {
            return self.start.distance_to(point);
        }

        let u = (((point.x - self.start.x) * dx + (point.y - self.start.y) * dy) / norm)
            .clamp(0.0, 1.0);
        let closest = Point2D::new(self.start.x + u * dx, self.start.y + u * dy);
        closest.distance_to(point)
    }

    /// Axis-aligned bounds as `(min, max)`
    pub fn bounds(&self) -> (Point2D, Point2D) {
        (
            Point2D::new(self.start.x.min(self.end.x), self.start.y.min(self.end.y)),
            Point2D::new(self.start.x.max(self.end.x), self.start.y.max(self.end.y)),
        )
    }
}

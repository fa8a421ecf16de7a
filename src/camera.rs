#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or stage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// This point moved by `delta`.
    #[must_use]
    pub fn translated(self, delta: Point) -> Point {
        Point { x: self.x + delta.x, y: self.y + delta.y }
    }

    /// Vector from `origin` to this point.
    #[must_use]
    pub fn minus(self, origin: Point) -> Point {
        Point { x: self.x - origin.x, y: self.y - origin.y }
    }

    /// Rotate this point about `pivot` by `degrees` (clockwise in screen space, y down).
    #[must_use]
    pub fn rotated_about(self, pivot: Point, degrees: f64) -> Point {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point { x: pivot.x + dx * cos - dy * sin, y: pivot.y + dx * sin + dy * cos }
    }
}

/// Stage transform shared by every layer: uniform scale followed by a pixel offset.
///
/// `x` / `y` are the screen position of the stage origin, in CSS pixels.
/// `scale` is a zoom factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to stage coordinates.
    #[must_use]
    pub fn screen_to_stage(&self, screen: Point) -> Point {
        Point { x: (screen.x - self.x) / self.scale, y: (screen.y - self.y) / self.scale }
    }

    /// Convert a stage-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn stage_to_screen(&self, stage: Point) -> Point {
        Point { x: stage.x * self.scale + self.x, y: stage.y * self.scale + self.y }
    }

    /// Convert a screen-space distance (pixels) to a stage-space distance.
    #[must_use]
    pub fn screen_dist_to_stage(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// The stage-space rectangle visible through a screen of `width` × `height` pixels.
    #[must_use]
    pub fn visible_stage_rect(&self, width: f64, height: f64) -> StageRect {
        let min = self.screen_to_stage(Point::new(0.0, 0.0));
        let max = self.screen_to_stage(Point::new(width, height));
        StageRect { min_x: min.x, min_y: min.y, max_x: max.x, max_y: max.y }
    }
}

/// Axis-aligned rectangle in stage space, stored as min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl StageRect {
    /// Rectangle anchored at the stage origin with the given extent.
    #[must_use]
    pub fn from_extent(width: f64, height: f64) -> Self {
        Self { min_x: 0.0, min_y: 0.0, max_x: width, max_y: height }
    }

    /// Rectangle spanned by two opposite corners given in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { min_x: a.x.min(b.x), min_y: a.y.min(b.y), max_x: a.x.max(b.x), max_y: a.y.max(b.y) }
    }

    /// Rectangle of `width` × `height` centered on `center`.
    #[must_use]
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self { min_x: center.x - hw, min_y: center.y - hh, max_x: center.x + hw, max_y: center.y + hh }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &StageRect) -> StageRect {
        StageRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Inclusive intersection test: rectangles that only share an edge intersect.
    #[must_use]
    pub fn intersects(&self, other: &StageRect) -> bool {
        self.min_x <= other.max_x && other.min_x <= self.max_x && self.min_y <= other.max_y && other.min_y <= self.max_y
    }

    /// Whether `other` lies entirely inside this rectangle, edges included.
    #[must_use]
    pub fn contains_rect(&self, other: &StageRect) -> bool {
        other.min_x >= self.min_x && other.max_x <= self.max_x && other.min_y >= self.min_y && other.max_y <= self.max_y
    }

    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.min_x && pt.x <= self.max_x && pt.y >= self.min_y && pt.y <= self.max_y
    }
}

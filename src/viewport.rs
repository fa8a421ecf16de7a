//! Viewport controller: pan and zoom state shared by every layer.
//!
//! Every mutator returns `Some(viewport)` when the transform actually changed,
//! so callers can raise a single viewport-changed notification and skip
//! redundant redraws.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::camera::{Point, StageRect, Viewport};
use crate::config::StageConfig;
use crate::input::{Modifiers, WheelDelta};

#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
    wheel_zoom_step: f64,
    screen_width: f64,
    screen_height: f64,
    /// Screen position of the previous pan event while panning.
    pan_anchor: Option<Point>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(&StageConfig::default())
    }
}

impl ViewportController {
    #[must_use]
    pub fn new(cfg: &StageConfig) -> Self {
        Self {
            viewport: Viewport::default(),
            min_zoom: cfg.min_zoom,
            max_zoom: cfg.max_zoom,
            zoom_step: cfg.zoom_step,
            wheel_zoom_step: cfg.wheel_zoom_step,
            screen_width: 0.0,
            screen_height: 0.0,
            pan_anchor: None,
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Update the screen size in CSS pixels. Negative sizes clamp to zero.
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_width = width.max(0.0);
        self.screen_height = height.max(0.0);
    }

    #[must_use]
    pub fn screen_size(&self) -> (f64, f64) {
        (self.screen_width, self.screen_height)
    }

    /// Stage-space rectangle currently on screen.
    #[must_use]
    pub fn visible_rect(&self) -> StageRect {
        self.viewport.visible_stage_rect(self.screen_width, self.screen_height)
    }

    /// Replace the transform. Non-finite values are ignored; scale is clamped.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Option<Viewport> {
        if !(viewport.x.is_finite() && viewport.y.is_finite() && viewport.scale.is_finite()) {
            return None;
        }
        let next = Viewport { scale: self.clamp_scale(viewport.scale), ..viewport };
        self.replace(next)
    }

    /// Zoom in one step about the screen center.
    pub fn zoom_in(&mut self) -> Option<Viewport> {
        self.zoom_at(self.screen_center(), self.zoom_step)
    }

    /// Zoom out one step about the screen center.
    pub fn zoom_out(&mut self) -> Option<Viewport> {
        self.zoom_at(self.screen_center(), 1.0 / self.zoom_step)
    }

    /// Multiply the scale by `factor`, keeping the stage point under `screen_pt` fixed.
    pub fn zoom_at(&mut self, screen_pt: Point, factor: f64) -> Option<Viewport> {
        if !(factor.is_finite() && factor > 0.0) {
            return None;
        }
        let scale = self.clamp_scale(self.viewport.scale * factor);
        #[allow(clippy::float_cmp)]
        let unchanged = scale == self.viewport.scale;
        if unchanged {
            return None;
        }
        let anchor = self.viewport.screen_to_stage(screen_pt);
        self.replace(Viewport { x: screen_pt.x - anchor.x * scale, y: screen_pt.y - anchor.y * scale, scale })
    }

    /// Ctrl/Meta + wheel zooms about the cursor; a plain wheel pans.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Option<Viewport> {
        if modifiers.ctrl || modifiers.meta {
            if delta.dy < 0.0 {
                return self.zoom_at(screen_pt, self.wheel_zoom_step);
            }
            if delta.dy > 0.0 {
                return self.zoom_at(screen_pt, 1.0 / self.wheel_zoom_step);
            }
            return None;
        }
        self.pan_by(-delta.dx, -delta.dy)
    }

    /// Shift the stage by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Option<Viewport> {
        if !(dx.is_finite() && dy.is_finite()) {
            return None;
        }
        self.replace(Viewport { x: self.viewport.x + dx, y: self.viewport.y + dy, ..self.viewport })
    }

    pub fn begin_pan(&mut self, screen_pt: Point) {
        self.pan_anchor = Some(screen_pt);
    }

    /// Continue a pan started with [`Self::begin_pan`].
    pub fn pan_to(&mut self, screen_pt: Point) -> Option<Viewport> {
        let last = self.pan_anchor?;
        self.pan_anchor = Some(screen_pt);
        self.pan_by(screen_pt.x - last.x, screen_pt.y - last.y)
    }

    /// Finish a pan. Returns whether one was in progress.
    pub fn end_pan(&mut self) -> bool {
        self.pan_anchor.take().is_some()
    }

    #[must_use]
    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Back to scale 1 with the stage origin at the screen origin.
    pub fn reset_view(&mut self) -> Option<Viewport> {
        self.pan_anchor = None;
        self.replace(Viewport::default())
    }

    fn screen_center(&self) -> Point {
        Point::new(self.screen_width / 2.0, self.screen_height / 2.0)
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_zoom, self.max_zoom)
    }

    fn replace(&mut self, next: Viewport) -> Option<Viewport> {
        if next == self.viewport {
            return None;
        }
        self.viewport = next;
        Some(next)
    }
}

//! Snap modes: which grid points a dragged point may land on.
//!
//! Modes are hierarchical, each one containing every target of the previous:
//!
//! - `Free`: no snapping.
//! - `Full`: cell center only.
//! - `Half`: adds cell vertices and edge midpoints.
//! - `Quarter`: square cells use the quarter-cell lattice; polygonal cells add quarter-edge points.
//! - `Micro`: square cells use the eighth-cell lattice; polygonal cells add eighth-edge points.
//!
//! The modifier keys held during a gesture pick the mode through a [`SnapConfig`].

#[cfg(test)]
#[path = "snap_test.rs"]
mod snap_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::grid::{GridConfig, GridType, cell_center, cell_polygon, point_to_cell};
use crate::input::Modifiers;

/// Snap granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapMode {
    Free,
    #[default]
    Full,
    Half,
    Quarter,
    Micro,
}

impl SnapMode {
    /// Number of subdivisions per cell edge, or `None` for `Free`.
    fn divisions(self) -> Option<u32> {
        match self {
            Self::Free => None,
            Self::Full => Some(1),
            Self::Half => Some(2),
            Self::Quarter => Some(4),
            Self::Micro => Some(8),
        }
    }
}

/// Snap mode used with no modifiers and with Ctrl held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapConfig {
    pub default: SnapMode,
    pub fine: SnapMode,
}

/// Assets snap to cell centers, or to half-cells with Ctrl.
pub const ASSET_SNAP: SnapConfig = SnapConfig { default: SnapMode::Full, fine: SnapMode::Half };

/// Walls and region vertices snap to half-cells, or to quarter-cells with Ctrl.
pub const WALL_SNAP: SnapConfig = SnapConfig { default: SnapMode::Half, fine: SnapMode::Quarter };

/// Pick the snap mode for a gesture. Alt always means `Free`.
#[must_use]
pub fn resolve_snap_mode(modifiers: Modifiers, config: SnapConfig) -> SnapMode {
    if modifiers.alt {
        return SnapMode::Free;
    }
    if modifiers.ctrl {
        return config.fine;
    }
    config.default
}

/// Nearest snap target to `p` under `mode`, or `p` itself when snapping does not apply.
#[must_use]
pub fn snap_point(p: Point, cfg: &GridConfig, mode: SnapMode) -> Point {
    let Some(divisions) = mode.divisions() else {
        return p;
    };
    if !cfg.snaps() {
        return p;
    }
    let cell = point_to_cell(p, cfg);
    if divisions == 1 {
        return cell_center(cell, cfg);
    }
    match cfg.grid_type {
        GridType::Square | GridType::NoGrid => {
            let step_x = cfg.cell_width / f64::from(divisions);
            let step_y = cfg.cell_height / f64::from(divisions);
            Point::new(
                cfg.offset_x + ((p.x - cfg.offset_x) / step_x).round() * step_x,
                cfg.offset_y + ((p.y - cfg.offset_y) / step_y).round() * step_y,
            )
        }
        GridType::HexHorizontal | GridType::HexVertical | GridType::Isometric => {
            nearest(p, polygon_targets(cell_center(cell, cfg), &cell_polygon(cell, cfg), divisions))
        }
    }
}

/// Center plus evenly spaced points along every edge (vertices included).
fn polygon_targets(center: Point, polygon: &[Point], divisions: u32) -> Vec<Point> {
    let mut targets = vec![center];
    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        for step in 0..divisions {
            let t = f64::from(step) / f64::from(divisions);
            targets.push(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
        }
    }
    targets
}

fn nearest(p: Point, targets: Vec<Point>) -> Point {
    let mut best = p;
    let mut best_dist = f64::INFINITY;
    for target in targets {
        let dist = target.distance_to(p);
        if dist < best_dist {
            best_dist = dist;
            best = target;
        }
    }
    best
}

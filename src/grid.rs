//! Grid math: configuration records, validation, and point ↔ cell conversion.
//!
//! Every topology maps a logical [`Cell`] to a pixel-space snap anchor and back.
//! Anchors are chosen per topology and never mixed:
//!
//! | Topology | Addressing | Anchor returned by [`cell_to_point`] |
//! |----------|------------|--------------------------------------|
//! | `Square` | `floor` per axis | top-left corner of the cell |
//! | `HexHorizontal` | flat-top, odd columns shifted down half a row | hexagon center |
//! | `HexVertical` | pointy-top, odd rows shifted right half a column | hexagon center |
//! | `Isometric` | diamond lattice | diamond center |
//!
//! `NoGrid` uses square addressing so callers can still derive cell-relative
//! sizes, but [`snap_to_grid`] never moves a point on it.
//!
//! All functions here are pure. Invalid configurations are reported by
//! [`validate_grid`] and are never clamped to a default.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::consts::{DEFAULT_CELL_SIZE_PX, DEFAULT_GRID_ALPHA, SQRT_3};

/// Tiling scheme of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridType {
    NoGrid,
    #[default]
    Square,
    /// Flat-top hexagons.
    HexHorizontal,
    /// Pointy-top hexagons.
    HexVertical,
    /// Diamond cells.
    Isometric,
}

impl GridType {
    pub const ALL: [GridType; 5] =
        [Self::NoGrid, Self::Square, Self::HexHorizontal, Self::HexVertical, Self::Isometric];

    /// Whether cells of this topology are drawn as closed polygons rather than line segments.
    #[must_use]
    pub fn is_polygonal(self) -> bool {
        matches!(self, Self::HexHorizontal | Self::HexVertical | Self::Isometric)
    }
}

/// Stroke color of the grid, with a straight (non-premultiplied) alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Default for Rgba {
    fn default() -> Self {
        Self { r: 0, g: 0, b: 0, a: DEFAULT_GRID_ALPHA }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Grid configuration of a scene, as stored by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    #[serde(rename = "type")]
    pub grid_type: GridType,
    pub cell_width: f64,
    pub cell_height: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default)]
    pub snap_to_grid: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_type: GridType::Square,
            cell_width: DEFAULT_CELL_SIZE_PX,
            cell_height: DEFAULT_CELL_SIZE_PX,
            offset_x: 0.0,
            offset_y: 0.0,
            color: Rgba::default(),
            snap_to_grid: true,
        }
    }
}

impl GridConfig {
    /// Square grid with the given cell edge, no offset, snapping on.
    #[must_use]
    pub fn square(cell: f64) -> Self {
        Self { cell_width: cell, cell_height: cell, ..Self::default() }
    }

    /// Same configuration with a different topology.
    #[must_use]
    pub fn with_type(self, grid_type: GridType) -> Self {
        Self { grid_type, ..self }
    }

    /// Whether a grid is drawn at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.grid_type != GridType::NoGrid
    }

    /// Whether both cell dimensions are usable as divisors.
    #[must_use]
    pub fn has_usable_cells(&self) -> bool {
        is_positive(self.cell_width) && is_positive(self.cell_height)
    }

    /// Whether points should be snapped under this configuration.
    #[must_use]
    pub fn snaps(&self) -> bool {
        self.snap_to_grid && self.is_active() && self.has_usable_cells()
    }

    /// Every violation of this configuration, in field order.
    #[must_use]
    pub fn errors(&self) -> Vec<GridConfigError> {
        let mut errors = Vec::new();
        if !self.is_active() {
            return errors;
        }
        if !is_positive(self.cell_width) {
            errors.push(GridConfigError::CellWidth(self.cell_width));
        }
        if !is_positive(self.cell_height) {
            errors.push(GridConfigError::CellHeight(self.cell_height));
        }
        errors
    }

    /// Return the configuration unchanged when it is valid.
    ///
    /// # Errors
    ///
    /// Returns the first [`GridConfigError`] when the configuration must not be saved.
    pub fn validated(self) -> Result<Self, GridConfigError> {
        match self.errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// A single reason a [`GridConfig`] is rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GridConfigError {
    #[error("Cell width must be greater than 0 (got {0})")]
    CellWidth(f64),
    #[error("Cell height must be greater than 0 (got {0})")]
    CellHeight(f64),
}

/// Logical grid address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub col: i64,
    pub row: i64,
}

impl Cell {
    #[must_use]
    pub fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }
}

/// Width/height pair in pixels (or in cells where documented).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Human-readable violations of `cfg`. Empty means the configuration may be saved.
#[must_use]
pub fn validate_grid(cfg: &GridConfig) -> Vec<String> {
    cfg.errors().iter().map(ToString::to_string).collect()
}

/// Logical cell containing `p`.
///
/// Hex and isometric topologies resolve to the cell whose center is nearest,
/// which is exactly the containing cell for regular tilings.
#[must_use]
pub fn point_to_cell(p: Point, cfg: &GridConfig) -> Cell {
    if !cfg.has_usable_cells() {
        return Cell::default();
    }
    match cfg.grid_type {
        GridType::NoGrid | GridType::Square => Cell::new(
            floor_index((p.x - cfg.offset_x) / cfg.cell_width),
            floor_index((p.y - cfg.offset_y) / cfg.cell_height),
        ),
        GridType::HexHorizontal => {
            let (hs, vs) = hex_spacing(cfg);
            let guess = round_index((p.x - cfg.offset_x) / hs);
            let candidates = (guess.saturating_sub(1)..=guess.saturating_add(1)).map(|col| {
                let shift = if is_odd(col) { vs / 2.0 } else { 0.0 };
                Cell::new(col, round_index((p.y - cfg.offset_y - shift) / vs))
            });
            nearest_center(p, cfg, candidates)
        }
        GridType::HexVertical => {
            let (hs, vs) = hex_spacing(cfg);
            let guess = round_index((p.y - cfg.offset_y) / vs);
            let candidates = (guess.saturating_sub(1)..=guess.saturating_add(1)).map(|row| {
                let shift = if is_odd(row) { hs / 2.0 } else { 0.0 };
                Cell::new(round_index((p.x - cfg.offset_x - shift) / hs), row)
            });
            nearest_center(p, cfg, candidates)
        }
        GridType::Isometric => {
            // Diamond lattice is a 45° rotation of a square lattice in (u, v) space.
            let u = (p.x - cfg.offset_x) / cfg.cell_width;
            let v = (p.y - cfg.offset_y) / (cfg.cell_height / 2.0);
            Cell::new(round_index((u + v) / 2.0), round_index((v - u) / 2.0))
        }
    }
}

/// Snap anchor of `c`; see the module table for the anchor each topology uses.
#[must_use]
pub fn cell_to_point(c: Cell, cfg: &GridConfig) -> Point {
    match cfg.grid_type {
        GridType::NoGrid | GridType::Square => cell_origin(c, cfg),
        _ => cell_center(c, cfg),
    }
}

/// `cell_to_point(point_to_cell(p))` when snapping is enabled, otherwise `p`.
#[must_use]
pub fn snap_to_grid(p: Point, cfg: &GridConfig) -> Point {
    if !cfg.snaps() {
        return p;
    }
    cell_to_point(point_to_cell(p, cfg), cfg)
}

/// Geometric center of `c` under every topology.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cell_center(c: Cell, cfg: &GridConfig) -> Point {
    let (col, row) = (c.col as f64, c.row as f64);
    match cfg.grid_type {
        GridType::NoGrid | GridType::Square => {
            let origin = cell_origin(c, cfg);
            Point::new(origin.x + cfg.cell_width / 2.0, origin.y + cfg.cell_height / 2.0)
        }
        GridType::HexHorizontal => {
            let (hs, vs) = hex_spacing(cfg);
            let shift = if is_odd(c.col) { vs / 2.0 } else { 0.0 };
            Point::new(cfg.offset_x + col * hs, cfg.offset_y + row * vs + shift)
        }
        GridType::HexVertical => {
            let (hs, vs) = hex_spacing(cfg);
            let shift = if is_odd(c.row) { hs / 2.0 } else { 0.0 };
            Point::new(cfg.offset_x + col * hs + shift, cfg.offset_y + row * vs)
        }
        GridType::Isometric => Point::new(
            (col - row) * cfg.cell_width + cfg.offset_x,
            (col + row) * cfg.cell_height / 2.0 + cfg.offset_y,
        ),
    }
}

/// Outline of a polygonal cell, clockwise in screen space.
///
/// Six vertices for hexagons, four (top, right, bottom, left) for diamonds, and
/// the four corners for square cells.
#[must_use]
pub fn cell_polygon(c: Cell, cfg: &GridConfig) -> Vec<Point> {
    let center = cell_center(c, cfg);
    match cfg.grid_type {
        GridType::NoGrid | GridType::Square => {
            let o = cell_origin(c, cfg);
            vec![
                o,
                Point::new(o.x + cfg.cell_width, o.y),
                Point::new(o.x + cfg.cell_width, o.y + cfg.cell_height),
                Point::new(o.x, o.y + cfg.cell_height),
            ]
        }
        GridType::HexHorizontal => hexagon(center, cfg.cell_height / SQRT_3, 0.0),
        GridType::HexVertical => hexagon(center, cfg.cell_width / SQRT_3, 30.0),
        GridType::Isometric => {
            let hh = cfg.cell_height / 2.0;
            vec![
                Point::new(center.x, center.y - hh),
                Point::new(center.x + cfg.cell_width, center.y),
                Point::new(center.x, center.y + hh),
                Point::new(center.x - cfg.cell_width, center.y),
            ]
        }
    }
}

/// Column/row spacing of hexagon centers as `(horizontal, vertical)`.
///
/// Only meaningful for the two hex topologies; other topologies return the raw cell size.
#[must_use]
pub fn hex_spacing(cfg: &GridConfig) -> (f64, f64) {
    match cfg.grid_type {
        GridType::HexHorizontal => (cfg.cell_width * SQRT_3 / 2.0, cfg.cell_height),
        GridType::HexVertical => (cfg.cell_width, cfg.cell_height * SQRT_3 / 2.0),
        _ => (cfg.cell_width, cfg.cell_height),
    }
}

#[allow(clippy::cast_precision_loss)]
fn cell_origin(c: Cell, cfg: &GridConfig) -> Point {
    Point::new(cfg.offset_x + c.col as f64 * cfg.cell_width, cfg.offset_y + c.row as f64 * cfg.cell_height)
}

fn hexagon(center: Point, radius: f64, start_deg: f64) -> Vec<Point> {
    (0..6)
        .map(|i| {
            let angle = (start_deg + 60.0 * f64::from(i)).to_radians();
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

fn nearest_center(p: Point, cfg: &GridConfig, candidates: impl Iterator<Item = Cell>) -> Cell {
    let mut best = Cell::default();
    let mut best_dist = f64::INFINITY;
    for cell in candidates {
        let dist = cell_center(cell, cfg).distance_to(p);
        if dist < best_dist {
            best_dist = dist;
            best = cell;
        }
    }
    best
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn is_odd(v: i64) -> bool {
    v.rem_euclid(2) == 1
}

/// Absorbs representation error so cell anchors never floor into the previous cell.
const INDEX_EPSILON: f64 = 1e-9;

#[allow(clippy::cast_possible_truncation)]
fn floor_index(v: f64) -> i64 {
    (v + INDEX_EPSILON).floor() as i64
}

#[allow(clippy::cast_possible_truncation)]
fn round_index(v: f64) -> i64 {
    v.round() as i64
}

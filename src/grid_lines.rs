//! Grid line generation: drawable primitives for a grid over a stage extent.
//!
//! [`GridLines`] is a cheap, copyable plan. Iterating it lazily yields
//! [`GridPrimitive`]s and can be restarted any number of times. Square grids
//! produce full-extent line segments; hex and isometric grids produce one
//! closed polygon per cell, over-produced by a margin of whole cells past
//! every edge so that panning never reveals an uncovered strip.
//!
//! [`GridLineCache`] memoizes the materialized primitives and regenerates them
//! only when the plan (configuration, extent, visibility, margin) changes.
//! A plan whose primitive count would exceed its limit is refused with
//! [`GridLinesError::TooDense`] instead of being generated.

#[cfg(test)]
#[path = "grid_lines_test.rs"]
mod grid_lines_test;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::camera::{Point, StageRect};
use crate::consts::{DEFAULT_GRID_OVERDRAW_CELLS, DEFAULT_MAX_GRID_PRIMITIVES, MIN_GRID_OVERDRAW_CELLS};
use crate::grid::{Cell, GridConfig, GridType, cell_polygon, hex_spacing};

/// One drawable grid element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GridPrimitive {
    /// Open line segment.
    Segment { from: Point, to: Point },
    /// Closed polygon (hexagon or diamond).
    Polygon { vertices: Vec<Point> },
}

impl GridPrimitive {
    /// Whether the primitive is drawn closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Polygon { .. })
    }

    /// Coordinates flattened as `[x0, y0, x1, y1, ...]`, the layout canvas line APIs take.
    #[must_use]
    pub fn flat_points(&self) -> Vec<f64> {
        match self {
            Self::Segment { from, to } => vec![from.x, from.y, to.x, to.y],
            Self::Polygon { vertices } => vertices.iter().flat_map(|v| [v.x, v.y]).collect(),
        }
    }
}

/// Why a grid plan cannot be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridLinesError {
    #[error("grid too dense for the visible area: up to {count} primitives, limit is {limit}")]
    TooDense { count: u64, limit: u64 },
}

/// Generation plan for the grid over one stage extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLines {
    cfg: GridConfig,
    extent: StageRect,
    visible: bool,
    overdraw: u32,
    limit: u64,
}

impl GridLines {
    /// Plan for a `width` × `height` extent anchored at the stage origin.
    #[must_use]
    pub fn new(cfg: GridConfig, width: f64, height: f64) -> Self {
        Self::for_extent(cfg, StageRect::from_extent(width, height))
    }

    /// Plan for an arbitrary stage-space extent.
    #[must_use]
    pub fn for_extent(cfg: GridConfig, extent: StageRect) -> Self {
        Self {
            cfg,
            extent,
            visible: true,
            overdraw: DEFAULT_GRID_OVERDRAW_CELLS,
            limit: u64::from(DEFAULT_MAX_GRID_PRIMITIVES),
        }
    }

    #[must_use]
    pub fn with_visibility(self, visible: bool) -> Self {
        Self { visible, ..self }
    }

    /// Extra cells generated past each edge for polygonal grids, never fewer than
    /// [`MIN_GRID_OVERDRAW_CELLS`].
    #[must_use]
    pub fn with_overdraw(self, cells: u32) -> Self {
        Self { overdraw: cells.max(MIN_GRID_OVERDRAW_CELLS), ..self }
    }

    /// Largest number of primitives [`Self::check`] accepts.
    #[must_use]
    pub fn with_limit(self, limit: u64) -> Self {
        Self { limit, ..self }
    }

    #[must_use]
    pub fn overdraw(&self) -> u32 {
        self.overdraw
    }

    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.cfg
    }

    #[must_use]
    pub fn extent(&self) -> StageRect {
        self.extent
    }

    /// Start a fresh pass over the primitives.
    ///
    /// The pass itself is unbounded; call [`Self::check`] first when the
    /// configuration or extent is not trusted.
    #[must_use]
    pub fn iter(&self) -> GridLineIter {
        GridLineIter { cfg: self.cfg, extent: self.extent, cursor: self.start_cursor() }
    }

    /// Upper bound on the primitives a pass yields. Exact for square and hex
    /// grids; isometric grids count the bounding rows and columns.
    #[must_use]
    pub fn estimated_count(&self) -> u64 {
        match self.start_cursor() {
            Cursor::Done => 0,
            Cursor::Vertical { k, last, rows } => span(k, last).saturating_add(span(rows.0, rows.1)),
            Cursor::Horizontal { k, last } => span(k, last),
            Cursor::Cells { cols, rows, .. } => span(cols.0, cols.1).saturating_mul(span(rows.0, rows.1)),
        }
    }

    /// Estimated primitive count, when it is within the plan's limit.
    ///
    /// # Errors
    ///
    /// Returns [`GridLinesError::TooDense`] when the estimate exceeds the limit.
    pub fn check(&self) -> Result<u64, GridLinesError> {
        let count = self.estimated_count();
        if count > self.limit {
            return Err(GridLinesError::TooDense { count, limit: self.limit });
        }
        Ok(count)
    }

    /// Materialize every primitive after [`Self::check`] passes.
    ///
    /// # Errors
    ///
    /// Returns [`GridLinesError::TooDense`] without generating anything.
    pub fn generate(&self) -> Result<Vec<GridPrimitive>, GridLinesError> {
        self.check()?;
        Ok(self.iter().collect())
    }

    fn start_cursor(&self) -> Cursor {
        if !self.visible || !self.cfg.is_active() || !self.cfg.has_usable_cells() {
            return Cursor::Done;
        }
        let cfg = &self.cfg;
        let e = &self.extent;
        let m = i64::from(self.overdraw);
        match cfg.grid_type {
            GridType::NoGrid => Cursor::Done,
            GridType::Square => {
                let cols = (
                    ceil_index((e.min_x - cfg.offset_x) / cfg.cell_width),
                    floor_index((e.max_x - cfg.offset_x) / cfg.cell_width),
                );
                let rows = (
                    ceil_index((e.min_y - cfg.offset_y) / cfg.cell_height),
                    floor_index((e.max_y - cfg.offset_y) / cfg.cell_height),
                );
                Cursor::Vertical { k: cols.0, last: cols.1, rows }
            }
            GridType::HexHorizontal | GridType::HexVertical => {
                let (hs, vs) = hex_spacing(cfg);
                let cols = (
                    floor_index((e.min_x - cfg.offset_x) / hs).saturating_sub(m),
                    ceil_index((e.max_x - cfg.offset_x) / hs).saturating_add(m),
                );
                let rows = (
                    floor_index((e.min_y - cfg.offset_y) / vs).saturating_sub(m),
                    ceil_index((e.max_y - cfg.offset_y) / vs).saturating_add(m),
                );
                Cursor::cells(cols, rows, None)
            }
            GridType::Isometric => {
                // u = col - row and v = col + row are the diamond lattice axes.
                let half_h = cfg.cell_height / 2.0;
                let u = (
                    floor_index((e.min_x - cfg.offset_x) / cfg.cell_width).saturating_sub(m),
                    ceil_index((e.max_x - cfg.offset_x) / cfg.cell_width).saturating_add(m),
                );
                let v = (
                    floor_index((e.min_y - cfg.offset_y) / half_h).saturating_sub(m),
                    ceil_index((e.max_y - cfg.offset_y) / half_h).saturating_add(m),
                );
                let cols = (floor_half(u.0.saturating_add(v.0)), ceil_half(u.1.saturating_add(v.1)));
                let rows = (floor_half(v.0.saturating_sub(u.1)), ceil_half(v.1.saturating_sub(u.0)));
                Cursor::cells(cols, rows, Some(DiamondBounds { u, v }))
            }
        }
    }
}

impl<'a> IntoIterator for &'a GridLines {
    type Item = GridPrimitive;
    type IntoIter = GridLineIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy pass over the primitives of a [`GridLines`] plan.
#[derive(Debug, Clone)]
pub struct GridLineIter {
    cfg: GridConfig,
    extent: StageRect,
    cursor: Cursor,
}

#[derive(Debug, Clone, Copy)]
struct DiamondBounds {
    u: (i64, i64),
    v: (i64, i64),
}

impl DiamondBounds {
    fn contains(&self, cell: Cell) -> bool {
        let u = cell.col.saturating_sub(cell.row);
        let v = cell.col.saturating_add(cell.row);
        u >= self.u.0 && u <= self.u.1 && v >= self.v.0 && v <= self.v.1
    }
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    Done,
    Vertical { k: i64, last: i64, rows: (i64, i64) },
    Horizontal { k: i64, last: i64 },
    Cells { col: i64, row: i64, cols: (i64, i64), rows: (i64, i64), diamond: Option<DiamondBounds> },
}

impl Cursor {
    fn horizontal(rows: (i64, i64)) -> Self {
        if rows.0 > rows.1 {
            return Self::Done;
        }
        Self::Horizontal { k: rows.0, last: rows.1 }
    }

    fn cells(cols: (i64, i64), rows: (i64, i64), diamond: Option<DiamondBounds>) -> Self {
        if cols.0 > cols.1 || rows.0 > rows.1 {
            return Self::Done;
        }
        Self::Cells { col: cols.0, row: rows.0, cols, rows, diamond }
    }
}

impl Iterator for GridLineIter {
    type Item = GridPrimitive;

    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> Option<GridPrimitive> {
        loop {
            match self.cursor {
                Cursor::Done => return None,
                Cursor::Vertical { k, last, rows } => {
                    if k > last {
                        self.cursor = Cursor::horizontal(rows);
                        continue;
                    }
                    self.cursor =
                        if k == last { Cursor::horizontal(rows) } else { Cursor::Vertical { k: k + 1, last, rows } };
                    let x = self.cfg.offset_x + k as f64 * self.cfg.cell_width;
                    return Some(GridPrimitive::Segment {
                        from: Point::new(x, self.extent.min_y),
                        to: Point::new(x, self.extent.max_y),
                    });
                }
                Cursor::Horizontal { k, last } => {
                    if k > last {
                        self.cursor = Cursor::Done;
                        continue;
                    }
                    self.cursor = if k == last { Cursor::Done } else { Cursor::Horizontal { k: k + 1, last } };
                    let y = self.cfg.offset_y + k as f64 * self.cfg.cell_height;
                    return Some(GridPrimitive::Segment {
                        from: Point::new(self.extent.min_x, y),
                        to: Point::new(self.extent.max_x, y),
                    });
                }
                Cursor::Cells { col, row, cols, rows, diamond } => {
                    if row > rows.1 {
                        self.cursor = Cursor::Done;
                        continue;
                    }
                    self.cursor = if col >= cols.1 {
                        if row >= rows.1 {
                            Cursor::Done
                        } else {
                            Cursor::Cells { col: cols.0, row: row + 1, cols, rows, diamond }
                        }
                    } else {
                        Cursor::Cells { col: col + 1, row, cols, rows, diamond }
                    };
                    let cell = Cell::new(col, row);
                    if diamond.is_some_and(|d| !d.contains(cell)) {
                        continue;
                    }
                    return Some(GridPrimitive::Polygon { vertices: cell_polygon(cell, &self.cfg) });
                }
            }
        }
    }
}

/// Memoized primitives for the most recent plan.
#[derive(Debug, Default)]
pub struct GridLineCache {
    plan: Option<GridLines>,
    primitives: Vec<GridPrimitive>,
    refused: Option<GridLinesError>,
    regenerations: u64,
}

impl GridLineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Primitives for `plan`, regenerated only if it differs from the cached plan.
    ///
    /// # Errors
    ///
    /// Returns [`GridLinesError::TooDense`] for a plan over its limit. The
    /// refusal is cached too, so it is logged once per plan.
    pub fn primitives(&mut self, plan: &GridLines) -> Result<&[GridPrimitive], GridLinesError> {
        if self.plan.as_ref() != Some(plan) {
            self.plan = Some(*plan);
            self.regenerations += 1;
            match plan.generate() {
                Ok(primitives) => {
                    self.primitives = primitives;
                    self.refused = None;
                    trace!(count = self.primitives.len(), grid_type = ?plan.cfg.grid_type, "regenerated grid primitives");
                }
                Err(e) => {
                    self.primitives.clear();
                    self.refused = Some(e);
                    warn!(error = %e, grid_type = ?plan.cfg.grid_type, "grid not generated");
                }
            }
        }
        match self.refused {
            Some(e) => Err(e),
            None => Ok(&self.primitives),
        }
    }

    /// Drop the cached primitives so the next call regenerates.
    pub fn invalidate(&mut self) {
        self.plan = None;
        self.primitives.clear();
        self.refused = None;
    }

    /// How many times primitives have been generated.
    #[must_use]
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }
}

#[allow(clippy::cast_possible_truncation)]
fn floor_index(v: f64) -> i64 {
    v.floor() as i64
}

#[allow(clippy::cast_possible_truncation)]
fn ceil_index(v: f64) -> i64 {
    v.ceil() as i64
}

fn floor_half(v: i64) -> i64 {
    v.div_euclid(2)
}

fn ceil_half(v: i64) -> i64 {
    v.div_euclid(2) + v.rem_euclid(2)
}

/// Number of indices in `first..=last`, zero when empty.
fn span(first: i64, last: i64) -> u64 {
    let n = i128::from(last) - i128::from(first) + 1;
    u64::try_from(n.max(0)).unwrap_or(u64::MAX)
}

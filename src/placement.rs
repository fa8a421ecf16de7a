//! Placement behavior engine: what an entity may do, and whether a placement is legal.
//!
//! Behavior is derived, never stored: [`placement_behavior`] matches on the
//! asset kind and reads its typed properties. [`validate_placement`] is the
//! single authority for both the live drag-preview cue and commit-time
//! acceptance; every violated rule adds one [`PlacementError`].

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::{Point, StageRect};
use crate::consts::{ALIGNMENT_EPSILON_PX, DEFAULT_MAX_SIZE_CELLS, DEFAULT_MIN_PLACEMENT_PX, DEFAULT_MIN_SIZE_CELLS};
use crate::doc::{AssetKind, NamedSize};
use crate::grid::{GridConfig, GridType, Size, snap_to_grid};

/// Whether an entity follows the grid while dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapBehavior {
    #[default]
    Grid,
    Free,
}

/// Capabilities of one entity, derived from its asset kind.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementBehavior {
    pub can_move: bool,
    pub can_rotate: bool,
    pub can_resize: bool,
    pub can_delete: bool,
    pub can_duplicate: bool,
    pub snap_mode: SnapBehavior,
    pub snap_to_grid: bool,
    pub requires_grid_alignment: bool,
    pub allow_overlap: bool,
    /// Smallest footprint in cells.
    pub min_size: Size,
    /// Largest footprint in cells.
    pub max_size: Size,
    pub lock_aspect_ratio: bool,
    pub allow_elevation: bool,
    pub z_index_range: (i32, i32),
}

impl Default for PlacementBehavior {
    fn default() -> Self {
        Self {
            can_move: true,
            can_rotate: true,
            can_resize: true,
            can_delete: true,
            can_duplicate: true,
            snap_mode: SnapBehavior::Grid,
            snap_to_grid: true,
            requires_grid_alignment: false,
            allow_overlap: false,
            min_size: Size::new(DEFAULT_MIN_SIZE_CELLS, DEFAULT_MIN_SIZE_CELLS),
            max_size: Size::new(DEFAULT_MAX_SIZE_CELLS, DEFAULT_MAX_SIZE_CELLS),
            lock_aspect_ratio: false,
            allow_elevation: true,
            z_index_range: (0, 100),
        }
    }
}

/// Behavior for an asset kind.
#[must_use]
pub fn placement_behavior(kind: &AssetKind) -> PlacementBehavior {
    let base = PlacementBehavior::default();
    match kind {
        AssetKind::Object(props) => PlacementBehavior {
            can_move: props.is_movable,
            snap_mode: if props.is_movable { SnapBehavior::Grid } else { SnapBehavior::Free },
            allow_overlap: !props.is_opaque,
            lock_aspect_ratio: props.size.is_square,
            z_index_range: (10, 40),
            ..base
        },
        AssetKind::Creature(_) => PlacementBehavior {
            can_move: true,
            can_rotate: false,
            can_resize: false,
            snap_mode: SnapBehavior::Grid,
            requires_grid_alignment: true,
            allow_overlap: false,
            lock_aspect_ratio: true,
            allow_elevation: false,
            z_index_range: (50, 100),
            ..base
        },
    }
}

/// Pixel size of a footprint given in cells. A missing size is one cell.
#[must_use]
pub fn calculate_asset_size(size: Option<&NamedSize>, cfg: &GridConfig) -> Size {
    let (w, h) = size.map_or((1.0, 1.0), |s| (s.width, s.height));
    Size::new(w * cfg.cell_width, h * cfg.cell_height)
}

/// Where an entity centered at `center` settles when dropped.
///
/// On square grids the center (or, for grid-aligned entities, the top-left
/// corner) rounds to the nearest grid intersection. Hex and isometric grids
/// settle on the containing cell's center.
#[must_use]
pub fn snap_asset_position(center: Point, size: Size, behavior: &PlacementBehavior, cfg: &GridConfig) -> Point {
    if !behavior.snap_to_grid || behavior.snap_mode == SnapBehavior::Free || !cfg.snaps() {
        return center;
    }
    match cfg.grid_type {
        GridType::Square | GridType::NoGrid => {
            if behavior.requires_grid_alignment {
                let top_left = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
                let snapped = nearest_intersection(top_left, cfg);
                Point::new(snapped.x + size.width / 2.0, snapped.y + size.height / 2.0)
            } else {
                nearest_intersection(center, cfg)
            }
        }
        GridType::HexHorizontal | GridType::HexVertical | GridType::Isometric => snap_to_grid(center, cfg),
    }
}

fn nearest_intersection(p: Point, cfg: &GridConfig) -> Point {
    Point::new(
        cfg.offset_x + ((p.x - cfg.offset_x) / cfg.cell_width).round() * cfg.cell_width,
        cfg.offset_y + ((p.y - cfg.offset_y) / cfg.cell_height).round() * cfg.cell_height,
    )
}

/// A neighbor (or candidate) as seen by the overlap check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementFootprint {
    pub center: Point,
    pub size: Size,
    pub allow_overlap: bool,
}

impl PlacementFootprint {
    #[must_use]
    pub fn bounds(&self) -> StageRect {
        StageRect::centered(self.center, self.size.width, self.size.height)
    }

    /// Same footprint shrunk by `px` on every side, so boxes that merely touch
    /// a neighbor, or overlap it by less than `px`, do not collide.
    #[must_use]
    pub fn inset(self, px: f64) -> Self {
        let size = Size::new((self.size.width - 2.0 * px).max(0.0), (self.size.height - 2.0 * px).max(0.0));
        Self { size, ..self }
    }
}

/// Axis-aligned overlap of two footprints. Touching edges count as overlap.
#[must_use]
pub fn check_overlap(a: &PlacementFootprint, b: &PlacementFootprint) -> bool {
    a.bounds().intersects(&b.bounds())
}

/// One violated placement rule.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("Asset is too small (min: {0} px)")]
    BelowPixelFloor(f64),
    #[error("Asset width too small (min: {0} cells)")]
    WidthTooSmall(f64),
    #[error("Asset height too small (min: {0} cells)")]
    HeightTooSmall(f64),
    #[error("Asset width too large (max: {0} cells)")]
    WidthTooLarge(f64),
    #[error("Asset height too large (max: {0} cells)")]
    HeightTooLarge(f64),
    #[error("Asset overlaps with existing asset")]
    Overlap,
    #[error("Asset is not aligned to the grid")]
    NotAligned,
}

/// Outcome of [`validate_placement`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementValidation {
    pub valid: bool,
    pub errors: Vec<PlacementError>,
}

impl PlacementValidation {
    /// Human-readable error list.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Check a proposed placement with the default pixel floor.
#[must_use]
pub fn validate_placement(
    center: Point,
    size: Size,
    behavior: &PlacementBehavior,
    neighbors: &[PlacementFootprint],
    cfg: &GridConfig,
) -> PlacementValidation {
    validate_placement_with_floor(center, size, behavior, neighbors, cfg, DEFAULT_MIN_PLACEMENT_PX)
}

/// Check a proposed placement, rejecting anything narrower than `min_px` on either axis.
#[must_use]
pub fn validate_placement_with_floor(
    center: Point,
    size: Size,
    behavior: &PlacementBehavior,
    neighbors: &[PlacementFootprint],
    cfg: &GridConfig,
    min_px: f64,
) -> PlacementValidation {
    let mut errors = Vec::new();

    if !(size.width >= min_px && size.height >= min_px) {
        errors.push(PlacementError::BelowPixelFloor(min_px));
    }

    if cfg.has_usable_cells() {
        let cells_w = size.width / cfg.cell_width;
        let cells_h = size.height / cfg.cell_height;
        if cells_w < behavior.min_size.width {
            errors.push(PlacementError::WidthTooSmall(behavior.min_size.width));
        }
        if cells_h < behavior.min_size.height {
            errors.push(PlacementError::HeightTooSmall(behavior.min_size.height));
        }
        if cells_w > behavior.max_size.width {
            errors.push(PlacementError::WidthTooLarge(behavior.max_size.width));
        }
        if cells_h > behavior.max_size.height {
            errors.push(PlacementError::HeightTooLarge(behavior.max_size.height));
        }
    }

    if !behavior.allow_overlap {
        let candidate = PlacementFootprint { center, size, allow_overlap: false };
        if neighbors.iter().any(|n| !n.allow_overlap && check_overlap(&candidate, n)) {
            errors.push(PlacementError::Overlap);
        }
    }

    if behavior.requires_grid_alignment && cfg.snaps() {
        let anchor = snap_asset_position(center, size, behavior, cfg);
        if anchor.distance_to(center) > ALIGNMENT_EPSILON_PX {
            errors.push(PlacementError::NotAligned);
        }
    }

    if !errors.is_empty() {
        debug!(x = center.x, y = center.y, errors = errors.len(), "placement rejected");
    }
    PlacementValidation { valid: errors.is_empty(), errors }
}

//! Shared numeric constants for the battlemap crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed stage scale.
pub const DEFAULT_MIN_ZOOM: f64 = 0.1;

/// Largest allowed stage scale.
pub const DEFAULT_MAX_ZOOM: f64 = 10.0;

/// Multiplicative step applied by `zoom_in` / `zoom_out`.
pub const DEFAULT_ZOOM_STEP: f64 = 1.2;

/// Multiplicative step applied per wheel notch.
pub const DEFAULT_WHEEL_ZOOM_STEP: f64 = 1.1;

// ── Grid ────────────────────────────────────────────────────────

/// Extra rows/columns generated past each edge of the visible extent.
pub const DEFAULT_GRID_OVERDRAW_CELLS: u32 = 3;

/// Fewest extra rows/columns a polygonal grid may be generated with.
pub const MIN_GRID_OVERDRAW_CELLS: u32 = 3;

/// Upper bound on primitives generated for one grid plan.
pub const DEFAULT_MAX_GRID_PRIMITIVES: u32 = 500_000;

/// Alpha of the black stroke used when a grid record carries no explicit color.
pub const DEFAULT_GRID_ALPHA: f64 = 0.4;

/// Default cell edge in pixels for newly created grids.
pub const DEFAULT_CELL_SIZE_PX: f64 = 50.0;

/// √3, used by both hex topologies.
pub const SQRT_3: f64 = 1.732_050_807_568_877_2;

// ── Placement ───────────────────────────────────────────────────

/// Placements smaller than this (in pixels, either axis) are rejected outright.
pub const DEFAULT_MIN_PLACEMENT_PX: f64 = 1.0;

/// Default minimum entity size in cells.
pub const DEFAULT_MIN_SIZE_CELLS: f64 = 0.125;

/// Default maximum entity size in cells.
pub const DEFAULT_MAX_SIZE_CELLS: f64 = 20.0;

/// Tolerance when checking that a position already sits on its snap anchor.
pub const ALIGNMENT_EPSILON_PX: f64 = 0.01;

/// Inset applied to each side of a neighbor's box before collision checks,
/// so tokens in adjacent cells may share an edge.
pub const COLLISION_TOLERANCE_PX: f64 = 1.0;

// ── Rotation ────────────────────────────────────────────────────

/// Angular step rotation drags snap to unless Alt is held.
pub const DEFAULT_ROTATION_SNAP_DEG: f64 = 15.0;

/// Rotation handle distance from the entity center, as a fraction of its longest side.
pub const ROTATE_HANDLE_LENGTH_RATIO: f64 = 0.75;

/// Screen-space hit slop in pixels for the rotation handle.
pub const HANDLE_RADIUS_PX: f64 = 10.0;

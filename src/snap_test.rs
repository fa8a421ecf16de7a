#![allow(clippy::float_cmp)]

use super::*;
use crate::grid::Cell;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn grid() -> GridConfig {
    GridConfig::square(50.0)
}

// --- resolve_snap_mode ---

#[test]
fn resolve_defaults_without_modifiers() {
    assert_eq!(resolve_snap_mode(Modifiers::default(), ASSET_SNAP), SnapMode::Full);
    assert_eq!(resolve_snap_mode(Modifiers::default(), WALL_SNAP), SnapMode::Half);
}

#[test]
fn resolve_ctrl_selects_fine_mode() {
    let ctrl = Modifiers { ctrl: true, ..Default::default() };
    assert_eq!(resolve_snap_mode(ctrl, ASSET_SNAP), SnapMode::Half);
    assert_eq!(resolve_snap_mode(ctrl, WALL_SNAP), SnapMode::Quarter);
}

#[test]
fn resolve_alt_always_free() {
    let alt_ctrl = Modifiers { alt: true, ctrl: true, ..Default::default() };
    assert_eq!(resolve_snap_mode(alt_ctrl, ASSET_SNAP), SnapMode::Free);
    assert_eq!(resolve_snap_mode(alt_ctrl, WALL_SNAP), SnapMode::Free);
}

// --- snap_point on square grids ---

#[test]
fn free_mode_returns_input() {
    let p = Point::new(13.0, 27.0);
    assert_eq!(snap_point(p, &grid(), SnapMode::Free), p);
}

#[test]
fn disabled_grid_snap_returns_input() {
    let c = GridConfig { snap_to_grid: false, ..grid() };
    let p = Point::new(13.0, 27.0);
    assert_eq!(snap_point(p, &c, SnapMode::Half), p);
}

#[test]
fn full_mode_snaps_to_cell_center() {
    let snapped = snap_point(Point::new(13.0, 27.0), &grid(), SnapMode::Full);
    assert!(point_approx_eq(snapped, Point::new(25.0, 25.0)));
}

#[test]
fn half_mode_reaches_corners_and_midpoints() {
    assert!(point_approx_eq(snap_point(Point::new(48.0, 3.0), &grid(), SnapMode::Half), Point::new(50.0, 0.0)));
    assert!(point_approx_eq(snap_point(Point::new(27.0, 2.0), &grid(), SnapMode::Half), Point::new(25.0, 0.0)));
    assert!(point_approx_eq(snap_point(Point::new(24.0, 26.0), &grid(), SnapMode::Half), Point::new(25.0, 25.0)));
}

#[test]
fn quarter_mode_uses_quarter_lattice() {
    let snapped = snap_point(Point::new(13.0, 36.0), &grid(), SnapMode::Quarter);
    assert!(point_approx_eq(snapped, Point::new(12.5, 37.5)));
}

#[test]
fn micro_mode_uses_eighth_lattice() {
    let snapped = snap_point(Point::new(7.0, 44.0), &grid(), SnapMode::Micro);
    assert!(point_approx_eq(snapped, Point::new(6.25, 43.75)));
}

#[test]
fn finer_modes_never_move_farther() {
    let p = Point::new(31.0, 17.0);
    let mut last = f64::INFINITY;
    for mode in [SnapMode::Full, SnapMode::Half, SnapMode::Quarter, SnapMode::Micro] {
        let dist = snap_point(p, &grid(), mode).distance_to(p);
        assert!(dist <= last + 1e-12, "{mode:?}");
        last = dist;
    }
}

#[test]
fn lattice_respects_offset() {
    let c = GridConfig { offset_x: 10.0, offset_y: 5.0, ..grid() };
    let snapped = snap_point(Point::new(12.0, 4.0), &c, SnapMode::Half);
    assert!(point_approx_eq(snapped, Point::new(10.0, 5.0)));
}

// --- snap_point on polygonal grids ---

#[test]
fn hex_full_mode_snaps_to_center() {
    let c = grid().with_type(GridType::HexHorizontal);
    let center = cell_center(Cell::new(2, 2), &c);
    let snapped = snap_point(Point::new(center.x + 3.0, center.y + 2.0), &c, SnapMode::Full);
    assert!(point_approx_eq(snapped, center));
}

#[test]
fn hex_half_mode_reaches_vertex() {
    let c = grid().with_type(GridType::HexHorizontal);
    let cell = Cell::new(1, 1);
    let vertex = cell_polygon(cell, &c)[0];
    let center = cell_center(cell, &c);
    // Slightly inside the cell, close to its rightmost vertex.
    let p = Point::new(vertex.x - 3.0, center.y + 0.5);
    assert!(point_approx_eq(snap_point(p, &c, SnapMode::Half), vertex));
}

#[test]
fn isometric_quarter_mode_lands_on_edge() {
    let c = GridConfig::square(32.0).with_type(GridType::Isometric);
    let cell = Cell::new(0, 0);
    let poly = cell_polygon(cell, &c);
    let quarter = Point::new(poly[0].x + (poly[1].x - poly[0].x) * 0.25, poly[0].y + (poly[1].y - poly[0].y) * 0.25);
    let snapped = snap_point(Point::new(quarter.x, quarter.y + 0.5), &c, SnapMode::Quarter);
    assert!(point_approx_eq(snapped, quarter));
}

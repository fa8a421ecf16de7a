#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{CreatureCategory, CreatureProperties, ObjectProperties};

fn grid() -> GridConfig {
    GridConfig::square(50.0)
}

fn object(size: NamedSize, is_movable: bool, is_opaque: bool) -> AssetKind {
    AssetKind::Object(ObjectProperties { size, is_movable, is_opaque })
}

fn creature() -> AssetKind {
    AssetKind::Creature(CreatureProperties { size: NamedSize::cells(1.0, 1.0), category: CreatureCategory::Character })
}

fn strict_behavior() -> PlacementBehavior {
    PlacementBehavior {
        min_size: Size::new(0.5, 0.5),
        max_size: Size::new(10.0, 10.0),
        ..PlacementBehavior::default()
    }
}

fn footprint(x: f64, y: f64, w: f64, h: f64, allow_overlap: bool) -> PlacementFootprint {
    PlacementFootprint { center: Point::new(x, y), size: Size::new(w, h), allow_overlap }
}

// =============================================================
// placement_behavior
// =============================================================

#[test]
fn default_behavior_allows_everything() {
    let b = PlacementBehavior::default();
    assert!(b.can_move && b.can_rotate && b.can_resize && b.can_delete && b.can_duplicate);
    assert_eq!(b.snap_mode, SnapBehavior::Grid);
    assert_eq!(b.min_size, Size::new(0.125, 0.125));
    assert_eq!(b.max_size, Size::new(20.0, 20.0));
    assert_eq!(b.z_index_range, (0, 100));
}

#[test]
fn fixed_opaque_object() {
    let b = placement_behavior(&object(NamedSize::cells(2.0, 2.0), false, true));
    assert!(!b.can_move);
    assert_eq!(b.snap_mode, SnapBehavior::Free);
    assert!(!b.allow_overlap);
    assert!(b.lock_aspect_ratio);
    assert_eq!(b.z_index_range, (10, 40));
}

#[test]
fn movable_transparent_object() {
    let size = NamedSize { width: 1.0, height: 1.0, is_square: false };
    let b = placement_behavior(&object(size, true, false));
    assert!(b.can_move);
    assert_eq!(b.snap_mode, SnapBehavior::Grid);
    assert!(b.allow_overlap);
    assert!(!b.lock_aspect_ratio);
    assert!(b.can_rotate);
}

#[test]
fn creature_behavior() {
    let b = placement_behavior(&creature());
    assert!(b.can_move);
    assert!(!b.can_rotate);
    assert!(!b.can_resize);
    assert!(b.can_delete);
    assert!(b.requires_grid_alignment);
    assert!(!b.allow_overlap);
    assert!(b.lock_aspect_ratio);
    assert!(!b.allow_elevation);
    assert_eq!(b.z_index_range, (50, 100));
}

// =============================================================
// calculate_asset_size
// =============================================================

#[test]
fn size_from_cells() {
    assert_eq!(calculate_asset_size(Some(&NamedSize::cells(2.0, 3.0)), &grid()), Size::new(100.0, 150.0));
}

#[test]
fn missing_size_is_one_cell() {
    assert_eq!(calculate_asset_size(None, &grid()), Size::new(50.0, 50.0));
}

#[test]
fn size_follows_cell_dimensions() {
    let cfg = GridConfig { cell_width: 100.0, cell_height: 80.0, ..grid() };
    assert_eq!(calculate_asset_size(Some(&NamedSize::cells(1.0, 1.0)), &cfg), Size::new(100.0, 80.0));
}

#[test]
fn fractional_size_for_tiny_creatures() {
    assert_eq!(calculate_asset_size(Some(&NamedSize::cells(0.5, 0.5)), &grid()), Size::new(25.0, 25.0));
}

// =============================================================
// snap_asset_position
// =============================================================

#[test]
fn snap_disabled_by_behavior() {
    let b = PlacementBehavior { snap_to_grid: false, ..strict_behavior() };
    let p = Point::new(123.0, 456.0);
    assert_eq!(snap_asset_position(p, Size::new(50.0, 50.0), &b, &grid()), p);
}

#[test]
fn free_snap_mode_returns_input() {
    let b = PlacementBehavior { snap_mode: SnapBehavior::Free, ..strict_behavior() };
    let p = Point::new(123.0, 456.0);
    assert_eq!(snap_asset_position(p, Size::new(50.0, 50.0), &b, &grid()), p);
}

#[test]
fn grid_snap_off_returns_input() {
    let cfg = GridConfig { snap_to_grid: false, ..grid() };
    let p = Point::new(123.0, 456.0);
    assert_eq!(snap_asset_position(p, Size::new(50.0, 50.0), &strict_behavior(), &cfg), p);
}

#[test]
fn center_snaps_to_intersection() {
    let snapped = snap_asset_position(Point::new(123.0, 456.0), Size::new(50.0, 50.0), &strict_behavior(), &grid());
    assert_eq!(snapped, Point::new(100.0, 450.0));
}

#[test]
fn aligned_entity_snaps_top_left() {
    let b = PlacementBehavior { requires_grid_alignment: true, ..strict_behavior() };
    let snapped = snap_asset_position(Point::new(123.0, 456.0), Size::new(50.0, 50.0), &b, &grid());
    assert_eq!(snapped, Point::new(125.0, 475.0));
}

#[test]
fn aligned_non_square_entity() {
    let b = PlacementBehavior { requires_grid_alignment: true, ..strict_behavior() };
    let snapped = snap_asset_position(Point::new(175.0, 285.0), Size::new(100.0, 150.0), &b, &grid());
    assert_eq!(snapped, Point::new(200.0, 275.0));
}

#[test]
fn hex_grid_snaps_to_cell_center() {
    let cfg = grid().with_type(GridType::HexVertical);
    let p = Point::new(140.0, 95.0);
    let snapped = snap_asset_position(p, Size::new(50.0, 50.0), &strict_behavior(), &cfg);
    assert_eq!(snapped, snap_to_grid(p, &cfg));
}

// =============================================================
// check_overlap
// =============================================================

#[test]
fn overlapping_footprints() {
    assert!(check_overlap(&footprint(100.0, 100.0, 50.0, 50.0, false), &footprint(120.0, 120.0, 50.0, 50.0, false)));
}

#[test]
fn separated_footprints() {
    let a = footprint(100.0, 100.0, 50.0, 50.0, false);
    assert!(!check_overlap(&a, &footprint(200.0, 100.0, 50.0, 50.0, false)));
    assert!(!check_overlap(&a, &footprint(100.0, 200.0, 50.0, 50.0, false)));
}

#[test]
fn touching_edges_overlap() {
    assert!(check_overlap(&footprint(100.0, 100.0, 50.0, 50.0, false), &footprint(150.0, 100.0, 50.0, 50.0, false)));
}

#[test]
fn inset_footprint_clears_edge_contact() {
    let left = footprint(100.0, 100.0, 50.0, 50.0, false);
    let right = footprint(150.0, 100.0, 50.0, 50.0, false).inset(1.0);
    assert_eq!(right.size, Size::new(48.0, 48.0));
    assert_eq!(right.center, Point::new(150.0, 100.0));
    assert!(!check_overlap(&left, &right));
    assert!(check_overlap(&left, &footprint(140.0, 100.0, 50.0, 50.0, false).inset(1.0)));
}

#[test]
fn inset_never_goes_negative() {
    let tiny = footprint(0.0, 0.0, 1.0, 3.0, false).inset(1.0);
    assert_eq!(tiny.size, Size::new(0.0, 1.0));
}

#[test]
fn different_sizes_without_overlap() {
    assert!(!check_overlap(&footprint(100.0, 100.0, 100.0, 100.0, false), &footprint(180.0, 180.0, 50.0, 50.0, false)));
}

#[test]
fn containment_overlaps() {
    assert!(check_overlap(&footprint(100.0, 100.0, 200.0, 200.0, false), &footprint(100.0, 100.0, 50.0, 50.0, false)));
}

// =============================================================
// validate_placement
// =============================================================

#[test]
fn size_within_constraints_is_valid() {
    let v = validate_placement(Point::new(100.0, 100.0), Size::new(100.0, 100.0), &strict_behavior(), &[], &grid());
    assert!(v.valid);
    assert!(v.errors.is_empty());
}

#[test]
fn size_below_minimum() {
    let v = validate_placement(Point::new(100.0, 100.0), Size::new(10.0, 10.0), &strict_behavior(), &[], &grid());
    assert!(!v.valid);
    let messages = v.messages();
    assert!(messages.contains(&"Asset width too small (min: 0.5 cells)".to_string()));
    assert!(messages.contains(&"Asset height too small (min: 0.5 cells)".to_string()));
}

#[test]
fn size_above_maximum() {
    let v = validate_placement(Point::new(100.0, 100.0), Size::new(600.0, 700.0), &strict_behavior(), &[], &grid());
    assert!(!v.valid);
    let messages = v.messages();
    assert!(messages.contains(&"Asset width too large (max: 10 cells)".to_string()));
    assert!(messages.contains(&"Asset height too large (max: 10 cells)".to_string()));
}

#[test]
fn pixel_floor_applies_without_grid() {
    let cfg = grid().with_type(GridType::NoGrid);
    let v = validate_placement_with_floor(Point::new(0.0, 0.0), Size::new(3.0, 40.0), &strict_behavior(), &[], &cfg, 5.0);
    assert!(v.errors.contains(&PlacementError::BelowPixelFloor(5.0)));
}

#[test]
fn overlap_rejected() {
    let neighbors = [footprint(120.0, 120.0, 50.0, 50.0, false)];
    let v = validate_placement(Point::new(100.0, 100.0), Size::new(50.0, 50.0), &strict_behavior(), &neighbors, &grid());
    assert!(!v.valid);
    assert!(v.messages().contains(&"Asset overlaps with existing asset".to_string()));
}

#[test]
fn overlap_permitted_by_behavior() {
    let b = PlacementBehavior { allow_overlap: true, ..strict_behavior() };
    let neighbors = [footprint(120.0, 120.0, 50.0, 50.0, false)];
    let v = validate_placement(Point::new(100.0, 100.0), Size::new(50.0, 50.0), &b, &neighbors, &grid());
    assert!(v.valid);
}

#[test]
fn overlap_permitted_by_neighbor() {
    let neighbors = [footprint(120.0, 120.0, 50.0, 50.0, true)];
    let v = validate_placement(Point::new(100.0, 100.0), Size::new(50.0, 50.0), &strict_behavior(), &neighbors, &grid());
    assert!(v.valid);
    assert!(v.errors.is_empty());
}

#[test]
fn multiple_violations_accumulate() {
    let neighbors = [footprint(100.0, 100.0, 50.0, 50.0, false)];
    let v = validate_placement(Point::new(100.0, 100.0), Size::new(10.0, 700.0), &strict_behavior(), &neighbors, &grid());
    assert!(!v.valid);
    assert!(v.errors.len() > 1);
}

#[test]
fn identical_creature_placements_conflict() {
    let b = placement_behavior(&creature());
    let first = footprint(100.0, 100.0, 50.0, 50.0, b.allow_overlap);
    let v = validate_placement(first.center, first.size, &b, &[first], &grid());
    assert!(!v.valid);
    assert!(v.errors.contains(&PlacementError::Overlap));
}

#[test]
fn placement_inside_neighbor_always_invalid() {
    let neighbor = footprint(200.0, 200.0, 150.0, 150.0, false);
    let b = PlacementBehavior { requires_grid_alignment: false, ..placement_behavior(&creature()) };
    for (dx, dy) in [(0.0, 0.0), (-40.0, 30.0), (50.0, -50.0), (60.0, 60.0)] {
        let center = Point::new(200.0 + dx, 200.0 + dy);
        let v = validate_placement(center, Size::new(10.0, 10.0), &b, &[neighbor], &grid());
        assert!(!v.valid, "({dx}, {dy})");
        assert!(!v.errors.is_empty());
    }
}

#[test]
fn creature_off_grid_is_not_aligned() {
    let b = placement_behavior(&creature());
    let v = validate_placement(Point::new(110.0, 125.0), Size::new(50.0, 50.0), &b, &[], &grid());
    assert_eq!(v.errors, vec![PlacementError::NotAligned]);
    let aligned = validate_placement(Point::new(125.0, 125.0), Size::new(50.0, 50.0), &b, &[], &grid());
    assert!(aligned.valid);
}

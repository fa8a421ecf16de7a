#![allow(clippy::float_cmp)]

use super::*;

fn controller() -> ViewportController {
    let mut vc = ViewportController::default();
    vc.set_screen_size(800.0, 600.0);
    vc
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn assert_stage_point_fixed(vc: &ViewportController, before: Viewport, screen: Point) {
    let a = before.screen_to_stage(screen);
    let b = vc.viewport().screen_to_stage(screen);
    assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
}

// =============================================================
// Zoom buttons
// =============================================================

#[test]
fn zoom_in_scales_about_center() {
    let mut vc = controller();
    let before = vc.viewport();
    let changed = vc.zoom_in();
    assert!(changed.is_some());
    assert!((vc.viewport().scale - 1.2).abs() < 1e-12);
    assert_stage_point_fixed(&vc, before, Point::new(400.0, 300.0));
}

#[test]
fn zoom_out_then_in_round_trips() {
    let mut vc = controller();
    vc.zoom_out();
    vc.zoom_in();
    assert!((vc.viewport().scale - 1.0).abs() < 1e-12);
}

#[test]
fn zoom_clamps_to_limits() {
    let mut vc = controller();
    for _ in 0..100 {
        vc.zoom_in();
    }
    assert_eq!(vc.viewport().scale, 10.0);
    assert!(vc.zoom_in().is_none());
    for _ in 0..200 {
        vc.zoom_out();
    }
    assert_eq!(vc.viewport().scale, 0.1);
    assert!(vc.zoom_out().is_none());
}

#[test]
fn custom_zoom_limits() {
    let cfg = StageConfig { min_zoom: 0.5, max_zoom: 2.0, ..StageConfig::default() };
    let mut vc = ViewportController::new(&cfg);
    vc.set_viewport(Viewport { x: 0.0, y: 0.0, scale: 50.0 });
    assert_eq!(vc.viewport().scale, 2.0);
}

// =============================================================
// Wheel
// =============================================================

#[test]
fn ctrl_wheel_zooms_about_cursor() {
    let mut vc = controller();
    vc.pan_by(120.0, -40.0);
    let before = vc.viewport();
    let cursor = Point::new(530.0, 210.0);
    assert!(vc.on_wheel(cursor, WheelDelta { dx: 0.0, dy: -10.0 }, ctrl()).is_some());
    assert!(vc.viewport().scale > 1.0);
    assert_stage_point_fixed(&vc, before, cursor);
}

#[test]
fn meta_wheel_zooms_out() {
    let mut vc = controller();
    let meta = Modifiers { meta: true, ..Default::default() };
    vc.on_wheel(Point::new(10.0, 10.0), WheelDelta { dx: 0.0, dy: 5.0 }, meta);
    assert!(vc.viewport().scale < 1.0);
}

#[test]
fn ctrl_wheel_without_vertical_delta_is_noop() {
    let mut vc = controller();
    assert!(vc.on_wheel(Point::new(10.0, 10.0), WheelDelta { dx: 4.0, dy: 0.0 }, ctrl()).is_none());
}

#[test]
fn plain_wheel_pans() {
    let mut vc = controller();
    vc.on_wheel(Point::new(0.0, 0.0), WheelDelta { dx: -10.0, dy: 20.0 }, Modifiers::default());
    assert_eq!(vc.viewport().x, 10.0);
    assert_eq!(vc.viewport().y, -20.0);
}

// =============================================================
// Drag pan
// =============================================================

#[test]
fn drag_pan_accumulates() {
    let mut vc = controller();
    vc.begin_pan(Point::new(100.0, 100.0));
    assert!(vc.is_panning());
    vc.pan_to(Point::new(110.0, 95.0));
    vc.pan_to(Point::new(130.0, 90.0));
    assert!(vc.end_pan());
    assert_eq!(vc.viewport().x, 30.0);
    assert_eq!(vc.viewport().y, -10.0);
    assert!(!vc.end_pan());
}

#[test]
fn pan_to_without_begin_is_ignored() {
    let mut vc = controller();
    assert!(vc.pan_to(Point::new(50.0, 50.0)).is_none());
    assert_eq!(vc.viewport(), Viewport::default());
}

// =============================================================
// set / reset
// =============================================================

#[test]
fn set_viewport_rejects_non_finite() {
    let mut vc = controller();
    assert!(vc.set_viewport(Viewport { x: f64::NAN, y: 0.0, scale: 1.0 }).is_none());
    assert!(vc.set_viewport(Viewport { x: 0.0, y: 0.0, scale: f64::INFINITY }).is_none());
    assert_eq!(vc.viewport(), Viewport::default());
}

#[test]
fn set_same_viewport_reports_no_change() {
    let mut vc = controller();
    let v = Viewport { x: 5.0, y: 6.0, scale: 2.0 };
    assert_eq!(vc.set_viewport(v), Some(v));
    assert!(vc.set_viewport(v).is_none());
}

#[test]
fn reset_view_restores_identity() {
    let mut vc = controller();
    vc.zoom_in();
    vc.pan_by(40.0, 40.0);
    assert_eq!(vc.reset_view(), Some(Viewport::default()));
    assert!(vc.reset_view().is_none());
}

#[test]
fn visible_rect_tracks_transform() {
    let mut vc = controller();
    vc.set_viewport(Viewport { x: -100.0, y: -50.0, scale: 2.0 });
    let r = vc.visible_rect();
    assert_eq!((r.min_x, r.min_y, r.max_x, r.max_y), (50.0, 25.0, 450.0, 325.0));
}

#[test]
fn negative_screen_size_clamps_to_zero() {
    let mut vc = ViewportController::default();
    vc.set_screen_size(-5.0, 20.0);
    assert_eq!(vc.screen_size(), (0.0, 20.0));
}

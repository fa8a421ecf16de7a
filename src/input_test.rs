use super::*;
use uuid::Uuid;

// =============================================================
// Modifiers
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift);
    assert!(!m.ctrl);
    assert!(!m.alt);
    assert!(!m.meta);
}

#[test]
fn ctrl_or_meta_toggles_selection() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.toggles_selection());
    assert!(Modifiers { meta: true, ..Default::default() }.toggles_selection());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.toggles_selection());
}

// =============================================================
// Key
// =============================================================

#[test]
fn delete_and_backspace_delete() {
    assert!(Key("Delete".into()).is_delete());
    assert!(Key("Backspace".into()).is_delete());
    assert!(!Key("Escape".into()).is_delete());
}

#[test]
fn escape_detected() {
    assert!(Key("Escape".into()).is_escape());
    assert!(!Key("Enter".into()).is_escape());
}

// =============================================================
// UiState
// =============================================================

#[test]
fn select_only_replaces_selection() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ui = UiState::default();
    assert!(ui.select_only(a));
    assert!(!ui.select_only(a));
    assert!(ui.select_only(b));
    assert_eq!(ui.selected_ids, vec![b]);
}

#[test]
fn toggle_adds_then_removes() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ui = UiState::default();
    ui.toggle(a);
    ui.toggle(b);
    assert_eq!(ui.selected_ids, vec![a, b]);
    ui.toggle(a);
    assert_eq!(ui.selected_ids, vec![b]);
    assert!(!ui.is_selected(&a));
    assert!(ui.is_selected(&b));
}

#[test]
fn select_many_replaces_without_duplicates() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ui = UiState::default();
    ui.select_only(a);
    assert!(ui.select_many([b, a, b]));
    assert_eq!(ui.selected_ids, vec![b, a]);
    assert!(!ui.select_many([b, a]));
    assert!(ui.select_many([]));
    assert!(ui.selected_ids.is_empty());
}

#[test]
fn extend_appends_new_ids_only() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ui = UiState::default();
    ui.select_only(a);
    assert!(ui.extend([a, b]));
    assert_eq!(ui.selected_ids, vec![a, b]);
    assert!(!ui.extend([b]));
}

#[test]
fn clear_reports_change() {
    let mut ui = UiState::default();
    assert!(!ui.clear());
    ui.toggle(Uuid::new_v4());
    assert!(ui.clear());
    assert!(ui.selected_ids.is_empty());
}

#[test]
fn retain_drops_missing_ids() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut ui = UiState { selected_ids: vec![a, b] };
    ui.retain(|id| *id == b);
    assert_eq!(ui.selected_ids, vec![b]);
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_defaults_to_idle() {
    assert!(InputState::default().is_idle());
    assert!(!InputState::Rotating.is_idle());
}

#[test]
fn drag_preview_offsets_each_member() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let state = InputState::DraggingSelection {
        anchor: a,
        grab_offset: Point::default(),
        members: vec![
            DragMember { id: a, orig_center: Point::new(25.0, 25.0) },
            DragMember { id: b, orig_center: Point::new(225.0, 25.0) },
        ],
        delta: Point::new(0.0, 200.0),
        valid: true,
    };
    assert_eq!(state.drag_preview(&a), Some(Point::new(25.0, 225.0)));
    assert_eq!(state.drag_preview(&b), Some(Point::new(225.0, 225.0)));
    assert_eq!(state.drag_preview(&Uuid::new_v4()), None);
    assert_eq!(state.drag_valid(), Some(true));
    assert_eq!(InputState::Idle.drag_valid(), None);
}

#[test]
fn marquee_rect_normalizes_corners() {
    let state = InputState::Marquee { start: Point::new(100.0, 80.0), current: Point::new(20.0, 140.0), additive: false };
    assert_eq!(state.marquee_rect(), Some(StageRect { min_x: 20.0, min_y: 80.0, max_x: 100.0, max_y: 140.0 }));
    assert_eq!(InputState::Panning.marquee_rect(), None);
}

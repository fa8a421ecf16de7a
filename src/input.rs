//! Input model: modifier keys, mouse buttons, selection, and the gesture state machine.
//!
//! `Modifiers` captures the keys held at the time of a pointer event; they
//! pick snap modes, toggle selection, and switch rotation between per-entity
//! and group mode. `InputState` is the gesture tracked between pointer-down
//! and pointer-up, carrying what is needed to preview, commit, or revert it.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::{Point, StageRect};
use crate::doc::EntityId;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn toggles_selection(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button; always pans.
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A keyboard key as reported by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Selected entities in selection order, without duplicates.
    pub selected_ids: Vec<EntityId>,
}

impl UiState {
    #[must_use]
    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selected_ids.contains(id)
    }

    /// Replace the selection with a single entity. Returns whether it changed.
    pub fn select_only(&mut self, id: EntityId) -> bool {
        if self.selected_ids == [id] {
            return false;
        }
        self.selected_ids.clear();
        self.selected_ids.push(id);
        true
    }

    /// Replace the selection with `ids`, dropping duplicates. Returns whether it changed.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = EntityId>) -> bool {
        let before = std::mem::take(&mut self.selected_ids);
        self.extend(ids);
        self.selected_ids != before
    }

    /// Append the `ids` not already selected. Returns whether any were added.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = EntityId>) -> bool {
        let len = self.selected_ids.len();
        for id in ids {
            if !self.selected_ids.contains(&id) {
                self.selected_ids.push(id);
            }
        }
        self.selected_ids.len() != len
    }

    /// Add or remove one entity from the selection.
    pub fn toggle(&mut self, id: EntityId) {
        if let Some(pos) = self.selected_ids.iter().position(|s| *s == id) {
            self.selected_ids.remove(pos);
        } else {
            self.selected_ids.push(id);
        }
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let had = !self.selected_ids.is_empty();
        self.selected_ids.clear();
        had
    }

    /// Drop ids that no longer exist.
    pub fn retain(&mut self, mut exists: impl FnMut(&EntityId) -> bool) {
        self.selected_ids.retain(|id| exists(id));
    }
}

/// One entity carried by a selection drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMember {
    pub id: EntityId,
    /// Center before the drag; kept when the drop is rejected.
    pub orig_center: Point,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging with the middle button. The anchor lives in the viewport controller.
    Panning,
    /// Moving every movable selected entity by one snapped delta, with live validation.
    DraggingSelection {
        /// Entity under the pointer at grab time; its snapped center sets `delta`.
        anchor: EntityId,
        /// Anchor center minus pointer position at grab time, in stage space.
        grab_offset: Point,
        /// Moving entities, anchor first.
        members: Vec<DragMember>,
        /// Translation currently previewed.
        delta: Point,
        /// Whether every member passes placement validation at its preview position.
        valid: bool,
    },
    /// Rubber-band selection started on empty stage. Corners are in stage space.
    Marquee {
        start: Point,
        current: Point,
        /// Add to the existing selection instead of replacing it.
        additive: bool,
    },
    /// Dragging a rotation handle; angles live in the rotation controller.
    Rotating,
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Previewed center of `id` while a selection drag carries it.
    #[must_use]
    pub fn drag_preview(&self, id: &EntityId) -> Option<Point> {
        match self {
            Self::DraggingSelection { members, delta, .. } => {
                members.iter().find(|m| m.id == *id).map(|m| m.orig_center.translated(*delta))
            }
            _ => None,
        }
    }

    /// Whether the current selection drag would be accepted; `None` when not dragging.
    #[must_use]
    pub fn drag_valid(&self) -> Option<bool> {
        match self {
            Self::DraggingSelection { valid, .. } => Some(*valid),
            _ => None,
        }
    }

    /// Rectangle covered by an active marquee.
    #[must_use]
    pub fn marquee_rect(&self) -> Option<StageRect> {
        match self {
            Self::Marquee { start, current, .. } => Some(StageRect::from_corners(*start, *current)),
            _ => None,
        }
    }
}

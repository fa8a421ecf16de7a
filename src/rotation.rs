//! Rotation controller: handle geometry and single/group rotation drags.
//!
//! Angles are clockwise degrees in `[0, 360)` with 0 pointing up, matching
//! how entity rotation is stored. A drag goes `Idle → Dragging → Idle`; the
//! start state of every target is captured on entry so that each update is
//! computed from the original geometry rather than accumulated.
//!
//! In group mode all targets rotate rigidly about the center of their
//! combined bounding box. Otherwise each target turns in place to face the
//! pointer.

#[cfg(test)]
#[path = "rotation_test.rs"]
mod rotation_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::{Point, StageRect};
use crate::consts::{DEFAULT_ROTATION_SNAP_DEG, ROTATE_HANDLE_LENGTH_RATIO};
use crate::doc::EntityId;
use crate::grid::Size;

/// Wrap any angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees_360(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Shortest signed difference `current - start`, in `(-180, 180]`.
#[must_use]
pub fn signed_angle_delta_deg(current: f64, start: f64) -> f64 {
    let delta = current - start;
    if !delta.is_finite() {
        return 0.0;
    }
    let mut wrapped = delta.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Direction from `center` to `p`, 0 pointing up.
#[must_use]
pub fn angle_from_center(center: Point, p: Point) -> f64 {
    normalize_degrees_360((p.y - center.y).atan2(p.x - center.x).to_degrees() + 90.0)
}

/// Round `deg` to the nearest multiple of `step`.
#[must_use]
pub fn snap_angle(deg: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return normalize_degrees_360(deg);
    }
    normalize_degrees_360((deg / step).round() * step)
}

/// Where the rotation handle sits for an entity.
#[must_use]
pub fn rotation_handle_position(center: Point, size: Size, rotation_degrees: f64) -> Point {
    let length = size.width.max(size.height) * ROTATE_HANDLE_LENGTH_RATIO;
    let rad = (rotation_degrees - 90.0).to_radians();
    Point::new(center.x + length * rad.cos(), center.y + length * rad.sin())
}

/// An entity offered to the controller when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationTarget {
    pub id: EntityId,
    pub center: Point,
    pub size: Size,
    pub rotation_degrees: f64,
    pub can_rotate: bool,
}

impl RotationTarget {
    fn bounds(&self) -> StageRect {
        StageRect::centered(self.center, self.size.width, self.size.height)
    }

    fn unchanged(&self) -> RotationUpdate {
        RotationUpdate { id: self.id, center: self.center, rotation_degrees: self.rotation_degrees }
    }
}

/// New geometry for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationUpdate {
    pub id: EntityId,
    pub center: Point,
    pub rotation_degrees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RotationError {
    #[error("no entities selected for rotation")]
    NothingSelected,
    #[error("entity {0} cannot be rotated")]
    NotRotatable(EntityId),
    #[error("a rotation is already in progress")]
    AlreadyRotating,
}

/// Center of the union bounding box of `targets`.
#[must_use]
pub fn group_center(targets: &[RotationTarget]) -> Option<Point> {
    let mut iter = targets.iter();
    let first = iter.next()?.bounds();
    Some(iter.fold(first, |acc, t| acc.union(&t.bounds())).center())
}

#[derive(Debug, Clone)]
struct RotationDrag {
    /// `Some(pivot)` in group mode.
    pivot: Option<Point>,
    start_pointer_angle: f64,
    targets: Vec<RotationTarget>,
    last: Vec<RotationUpdate>,
}

#[derive(Debug, Clone, Default)]
enum RotationState {
    #[default]
    Idle,
    Dragging(RotationDrag),
}

/// Drives one rotation drag at a time.
#[derive(Debug, Clone)]
pub struct RotationController {
    state: RotationState,
    snap_step: f64,
}

impl Default for RotationController {
    fn default() -> Self {
        Self::new(DEFAULT_ROTATION_SNAP_DEG)
    }
}

impl RotationController {
    /// Controller snapping to multiples of `snap_step` degrees.
    #[must_use]
    pub fn new(snap_step: f64) -> Self {
        Self { state: RotationState::Idle, snap_step }
    }

    #[must_use]
    pub fn is_rotating(&self) -> bool {
        matches!(self.state, RotationState::Dragging(_))
    }

    /// Pivot of the current group drag, if any.
    #[must_use]
    pub fn pivot(&self) -> Option<Point> {
        match &self.state {
            RotationState::Dragging(drag) => drag.pivot,
            RotationState::Idle => None,
        }
    }

    /// Capture `targets` and enter the dragging state.
    ///
    /// # Errors
    ///
    /// Fails when `targets` is empty, any target may not rotate, or a drag is
    /// already in progress. The controller stays idle on error.
    pub fn begin(&mut self, targets: Vec<RotationTarget>, pointer: Point, group: bool) -> Result<(), RotationError> {
        if self.is_rotating() {
            return Err(RotationError::AlreadyRotating);
        }
        if targets.is_empty() {
            return Err(RotationError::NothingSelected);
        }
        if let Some(fixed) = targets.iter().find(|t| !t.can_rotate) {
            return Err(RotationError::NotRotatable(fixed.id));
        }
        let pivot = if group { group_center(&targets) } else { None };
        let start_pointer_angle = pivot.map_or(0.0, |p| angle_from_center(p, pointer));
        debug!(count = targets.len(), group, "rotation started");
        let last = targets.iter().map(RotationTarget::unchanged).collect();
        self.state = RotationState::Dragging(RotationDrag { pivot, start_pointer_angle, targets, last });
        Ok(())
    }

    /// New geometry for every target with the pointer at `pointer`.
    /// Returns an empty list when idle.
    pub fn update(&mut self, pointer: Point, snap: bool) -> Vec<RotationUpdate> {
        let step = self.snap_step;
        let RotationState::Dragging(drag) = &mut self.state else {
            return Vec::new();
        };
        let updates: Vec<RotationUpdate> = match drag.pivot {
            Some(pivot) => {
                let mut delta = signed_angle_delta_deg(angle_from_center(pivot, pointer), drag.start_pointer_angle);
                if snap && step > 0.0 {
                    delta = (delta / step).round() * step;
                }
                drag.targets
                    .iter()
                    .map(|t| RotationUpdate {
                        id: t.id,
                        center: t.center.rotated_about(pivot, delta),
                        rotation_degrees: normalize_degrees_360(t.rotation_degrees + delta),
                    })
                    .collect()
            }
            None => drag
                .targets
                .iter()
                .map(|t| {
                    let raw = angle_from_center(t.center, pointer);
                    let rotation_degrees = if snap { snap_angle(raw, step) } else { raw };
                    RotationUpdate { id: t.id, center: t.center, rotation_degrees }
                })
                .collect(),
        };
        drag.last.clone_from(&updates);
        updates
    }

    /// Leave the dragging state, returning the last computed geometry.
    pub fn end(&mut self) -> Option<Vec<RotationUpdate>> {
        match std::mem::take(&mut self.state) {
            RotationState::Dragging(drag) => {
                debug!(count = drag.last.len(), "rotation ended");
                Some(drag.last)
            }
            RotationState::Idle => None,
        }
    }

    /// Abandon the drag, returning the captured start geometry.
    pub fn cancel(&mut self) -> Option<Vec<RotationUpdate>> {
        match std::mem::take(&mut self.state) {
            RotationState::Dragging(drag) => Some(drag.targets.iter().map(RotationTarget::unchanged).collect()),
            RotationState::Idle => None,
        }
    }
}

//! Engine: the host-facing handle tying the stage components together.
//!
//! `EngineCore` holds all state and gesture logic that does not need a
//! rendering backend, so it can be tested directly. `Engine` wraps it together
//! with the layer manager (which owns the surface handle) and the token image
//! cache. Every input handler returns a list of [`Action`]s for the host to
//! forward to its callbacks and persistence layer.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::sync::Arc;

use tracing::{debug, info};

use crate::camera::{Point, StageRect, Viewport};
use crate::config::StageConfig;
use crate::consts::{COLLISION_TOLERANCE_PX, HANDLE_RADIUS_PX};
use crate::doc::{Asset, AssetId, EntityId, PartialPlacedEntity, PlacedEntity, SceneDoc};
use crate::grid::{GridConfig, GridConfigError, Size};
use crate::grid_lines::{GridLineCache, GridLines, GridLinesError};
use crate::images::{ImageFetcher, TokenImageCache};
use crate::input::{Button, DragMember, InputState, Key, Modifiers, UiState, WheelDelta};
use crate::layers::{LayerManager, LayerName, LayerState, Surface};
use crate::placement::{
    PlacementBehavior, PlacementError, PlacementFootprint, PlacementValidation, SnapBehavior, calculate_asset_size,
    placement_behavior, snap_asset_position, validate_placement_with_floor,
};
use crate::render::{FrameInput, SceneFrame, compose_frame};
use crate::rotation::{RotationController, RotationTarget, RotationUpdate, rotation_handle_position};
use crate::snap::{ASSET_SNAP, SnapMode, resolve_snap_mode, snap_point};
use crate::viewport::ViewportController;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AssetPlaced(PlacedEntity),
    AssetMoved { id: EntityId, position: Point },
    AssetDeleted { id: EntityId },
    /// The selection changed; carries the full new selection.
    AssetSelected { ids: Vec<EntityId> },
    RotationStarted { ids: Vec<EntityId> },
    RotationChanged { updates: Vec<RotationUpdate> },
    RotationEnded { updates: Vec<RotationUpdate> },
    ViewportChanged(Viewport),
    /// A placement or move was refused; a moved entity is back at its start position.
    PlacementRejected { id: Option<EntityId>, errors: Vec<PlacementError> },
    SetCursor(&'static str),
    RenderNeeded,
}

/// Why a grid configuration was refused; the current grid stays in place.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SetGridError {
    #[error(transparent)]
    Invalid(#[from] GridConfigError),
    #[error(transparent)]
    TooDense(#[from] GridLinesError),
}

/// Core engine state: everything that doesn't depend on the rendering surface.
#[derive(Debug)]
pub struct EngineCore {
    pub doc: SceneDoc,
    pub ui: UiState,
    pub input: InputState,
    pub viewport: ViewportController,
    pub rotation: RotationController,
    config: StageConfig,
    grid: GridConfig,
    grid_cache: GridLineCache,
    cursor: &'static str,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: StageConfig) -> Self {
        Self {
            doc: SceneDoc::new(),
            ui: UiState::default(),
            input: InputState::default(),
            viewport: ViewportController::new(&config),
            rotation: RotationController::new(config.rotation_snap_deg),
            config,
            grid: GridConfig::default(),
            grid_cache: GridLineCache::new(),
            cursor: "default",
        }
    }

    // --- Data inputs ---

    /// Hydrate the scene from the host.
    pub fn load_snapshot(&mut self, assets: Vec<Asset>, entities: Vec<PlacedEntity>) {
        self.doc.load_snapshot(assets, entities);
        self.input = InputState::Idle;
        self.ui.retain(|id| self.doc.contains(id));
    }

    pub fn apply_create(&mut self, entity: PlacedEntity) {
        self.doc.insert(entity);
    }

    pub fn apply_update(&mut self, id: &EntityId, fields: &PartialPlacedEntity) {
        self.doc.apply_partial(id, fields);
    }

    pub fn apply_delete(&mut self, id: &EntityId) {
        self.doc.remove(id);
        self.ui.retain(|s| s != id);
        if self.input.drag_preview(id).is_some() {
            debug!(entity_id = %id, "dragged entity deleted, drag dropped");
            self.input = InputState::Idle;
        }
    }

    // --- Grid ---

    #[must_use]
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Replace the grid configuration. Refused configurations leave the current one in place.
    ///
    /// # Errors
    ///
    /// Returns [`SetGridError::Invalid`] with the first [`GridConfigError`] of
    /// `cfg`, or [`SetGridError::TooDense`] when its grid over the visible
    /// area would exceed the primitive limit.
    pub fn set_grid(&mut self, cfg: GridConfig) -> Result<Vec<Action>, SetGridError> {
        let cfg = cfg.validated()?;
        let primitives = self.plan_for(cfg, true).check()?;
        info!(
            grid_type = ?cfg.grid_type,
            cell_width = cfg.cell_width,
            cell_height = cfg.cell_height,
            primitives,
            "grid updated"
        );
        self.grid = cfg;
        Ok(vec![Action::RenderNeeded])
    }

    /// Grid generation plan for the visible stage area.
    #[must_use]
    pub fn grid_plan(&self, visible: bool) -> GridLines {
        self.plan_for(self.grid, visible)
    }

    fn plan_for(&self, cfg: GridConfig, visible: bool) -> GridLines {
        GridLines::for_extent(cfg, self.viewport.visible_rect())
            .with_visibility(visible)
            .with_overdraw(self.config.grid_overdraw_cells)
            .with_limit(u64::from(self.config.max_grid_primitives))
    }

    // --- Viewport ---

    pub fn set_screen_size(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport.set_screen_size(width, height);
        vec![Action::RenderNeeded]
    }

    #[must_use]
    pub fn get_viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<Action> {
        viewport_actions(self.viewport.set_viewport(viewport))
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        viewport_actions(self.viewport.zoom_in())
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        viewport_actions(self.viewport.zoom_out())
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        viewport_actions(self.viewport.reset_view())
    }

    // --- Placement ---

    /// Drop a new instance of `asset_id` at a screen position.
    pub fn place_asset(&mut self, asset_id: &AssetId, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let Some(asset) = self.doc.asset(asset_id) else {
            debug!(%asset_id, "place_asset: unknown asset");
            return Vec::new();
        };
        let behavior = placement_behavior(&asset.kind);
        let size = calculate_asset_size(Some(asset.kind.size()), &self.grid);
        let raw = self.viewport.viewport().screen_to_stage(screen_pt);
        let center = self.snap_entity(raw, size, &behavior, modifiers);
        let validation = self.validate_at(center, size, &behavior, &[]);
        if !validation.valid {
            return vec![Action::PlacementRejected { id: None, errors: validation.errors }];
        }
        let entity = PlacedEntity::new(asset, center, size);
        info!(entity_id = %entity.id, %asset_id, layer = %entity.layer, "asset placed");
        self.doc.insert(entity.clone());
        vec![Action::AssetPlaced(entity), Action::RenderNeeded]
    }

    /// Remove every selected entity that may be deleted.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        for id in self.ui.selected_ids.clone() {
            if !self.behavior_of(&id).is_some_and(|b| b.can_delete) {
                continue;
            }
            if self.doc.remove(&id).is_some() {
                actions.push(Action::AssetDeleted { id });
            }
        }
        if actions.is_empty() {
            return actions;
        }
        self.ui.retain(|id| self.doc.contains(id));
        actions.push(Action::AssetSelected { ids: self.ui.selected_ids.clone() });
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        match button {
            Button::Middle => {
                self.start_pan(screen_pt);
                Vec::new()
            }
            Button::Primary => self.primary_down(screen_pt, modifiers),
            Button::Secondary => Vec::new(),
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let stage_pt = self.viewport.viewport().screen_to_stage(screen_pt);
        match self.input.clone() {
            InputState::Idle => self.hover(stage_pt),
            InputState::Panning => viewport_actions(self.viewport.pan_to(screen_pt)),
            InputState::DraggingSelection { anchor, grab_offset, members, .. } => {
                self.drag_to(stage_pt, modifiers, anchor, grab_offset, members)
            }
            InputState::Marquee { start, additive, .. } => {
                self.input = InputState::Marquee { start, current: stage_pt, additive };
                vec![Action::RenderNeeded]
            }
            InputState::Rotating => {
                let updates = self.rotation.update(stage_pt, !modifiers.alt);
                self.apply_rotation(&updates);
                vec![Action::RotationChanged { updates }, Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning => {
                self.viewport.end_pan();
                Vec::new()
            }
            InputState::DraggingSelection { members, delta, .. } => self.drop_selection(&members, delta),
            InputState::Marquee { start, current, additive } => {
                self.select_in_rect(StageRect::from_corners(start, current), additive)
            }
            InputState::Rotating => {
                let updates = self.rotation.end().unwrap_or_default();
                let mut actions = vec![Action::RotationEnded { updates }];
                actions.extend(self.set_cursor("default"));
                actions
            }
        }
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        viewport_actions(self.viewport.on_wheel(screen_pt, delta, modifiers))
    }

    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.is_delete() && self.input.is_idle() {
            return self.delete_selected();
        }
        if key.is_escape() {
            return self.cancel_gesture();
        }
        Vec::new()
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &[EntityId] {
        &self.ui.selected_ids
    }

    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&PlacedEntity> {
        self.doc.get(id)
    }

    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Placement behavior of a placed entity, derived from its asset.
    #[must_use]
    pub fn behavior_of(&self, id: &EntityId) -> Option<PlacementBehavior> {
        let entity = self.doc.get(id)?;
        let asset = self.doc.asset_for(entity)?;
        Some(placement_behavior(&asset.kind))
    }

    // --- Internals ---

    fn primary_down(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let stage_pt = self.viewport.viewport().screen_to_stage(screen_pt);

        if let Some(handle_owner) = self.rotation_handle_at(stage_pt) {
            return self.start_rotation(handle_owner, stage_pt, modifiers);
        }

        let Some(id) = self.doc.hit_test(stage_pt) else {
            return self.start_marquee(stage_pt, modifiers);
        };

        let mut actions = Vec::new();
        if modifiers.toggles_selection() {
            self.ui.toggle(id);
            actions.push(Action::AssetSelected { ids: self.ui.selected_ids.clone() });
            actions.push(Action::RenderNeeded);
            return actions;
        }
        if !self.ui.is_selected(&id) {
            self.ui.select_only(id);
            actions.push(Action::AssetSelected { ids: self.ui.selected_ids.clone() });
            actions.push(Action::RenderNeeded);
        }

        actions.extend(self.start_drag(id, stage_pt));
        actions
    }

    fn start_pan(&mut self, screen_pt: Point) {
        self.viewport.begin_pan(screen_pt);
        self.input = InputState::Panning;
    }

    /// Begin a rubber-band selection. Without Ctrl the selection is cleared up front.
    fn start_marquee(&mut self, stage_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let additive = modifiers.toggles_selection();
        let mut actions = Vec::new();
        if !additive && self.ui.clear() {
            actions.push(Action::AssetSelected { ids: Vec::new() });
            actions.push(Action::RenderNeeded);
        }
        self.input = InputState::Marquee { start: stage_pt, current: stage_pt, additive };
        actions
    }

    /// Select every entity lying entirely inside `rect`.
    fn select_in_rect(&mut self, rect: StageRect, additive: bool) -> Vec<Action> {
        let inside: Vec<EntityId> = self
            .doc
            .sorted_entities()
            .into_iter()
            .filter(|e| rect.contains_rect(&StageRect::centered(e.position, e.size.width, e.size.height)))
            .map(|e| e.id)
            .collect();
        let changed = if additive { self.ui.extend(inside) } else { self.ui.select_many(inside) };
        if !changed {
            return vec![Action::RenderNeeded];
        }
        debug!(selected = self.ui.selected_ids.len(), additive, "marquee selection");
        vec![Action::AssetSelected { ids: self.ui.selected_ids.clone() }, Action::RenderNeeded]
    }

    /// Begin dragging `anchor` together with every other movable selected entity.
    fn start_drag(&mut self, anchor: EntityId, stage_pt: Point) -> Vec<Action> {
        if !self.behavior_of(&anchor).is_some_and(|b| b.can_move) {
            return Vec::new();
        }
        let Some(anchor_center) = self.doc.get(&anchor).map(|e| e.position) else {
            return Vec::new();
        };
        let mut members = vec![DragMember { id: anchor, orig_center: anchor_center }];
        for id in &self.ui.selected_ids {
            if *id == anchor || !self.behavior_of(id).is_some_and(|b| b.can_move) {
                continue;
            }
            if let Some(entity) = self.doc.get(id) {
                members.push(DragMember { id: *id, orig_center: entity.position });
            }
        }
        debug!(%anchor, members = members.len(), "drag started");
        self.input = InputState::DraggingSelection {
            anchor,
            grab_offset: anchor_center.minus(stage_pt),
            members,
            delta: Point::default(),
            valid: true,
        };
        self.set_cursor("move")
    }

    /// Preview the drag with the anchor snapped under the pointer and the rest following.
    fn drag_to(
        &mut self,
        stage_pt: Point,
        modifiers: Modifiers,
        anchor: EntityId,
        grab_offset: Point,
        members: Vec<DragMember>,
    ) -> Vec<Action> {
        let anchor_origin = members.iter().find(|m| m.id == anchor).map(|m| m.orig_center);
        let footprint = self.doc.get(&anchor).map(|e| e.size).zip(self.behavior_of(&anchor));
        let (Some(origin), Some((size, behavior))) = (anchor_origin, footprint) else {
            self.input = InputState::Idle;
            return Vec::new();
        };
        let snapped = self.snap_entity(stage_pt.translated(grab_offset), size, &behavior, modifiers);
        let delta = snapped.minus(origin);
        let valid = self.drag_rejections(&members, delta).is_empty();
        self.input = InputState::DraggingSelection { anchor, grab_offset, members, delta, valid };
        vec![Action::RenderNeeded]
    }

    fn start_rotation(&mut self, handle_owner: EntityId, stage_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let group = modifiers.shift && self.ui.selected_ids.len() > 1;
        let ids: Vec<EntityId> = if group { self.ui.selected_ids.clone() } else { vec![handle_owner] };
        let targets: Vec<RotationTarget> = ids
            .iter()
            .filter_map(|id| {
                let entity = self.doc.get(id)?;
                Some(RotationTarget {
                    id: *id,
                    center: entity.position,
                    size: entity.size,
                    rotation_degrees: entity.rotation_degrees,
                    can_rotate: self.behavior_of(id).is_some_and(|b| b.can_rotate),
                })
            })
            .collect();
        if let Err(e) = self.rotation.begin(targets, stage_pt, group) {
            debug!(error = %e, "rotation refused");
            return Vec::new();
        }
        self.input = InputState::Rotating;
        let mut actions = vec![Action::RotationStarted { ids }];
        actions.extend(self.set_cursor("grabbing"));
        actions
    }

    /// Commit a selection drag. Every member moves, or none does.
    fn drop_selection(&mut self, members: &[DragMember], delta: Point) -> Vec<Action> {
        let mut actions = self.set_cursor("default");
        if delta == Point::default() {
            return actions;
        }
        let rejections = self.drag_rejections(members, delta);
        if rejections.is_empty() {
            for m in members {
                let position = m.orig_center.translated(delta);
                if self.doc.apply_partial(&m.id, &PartialPlacedEntity { position: Some(position), ..Default::default() }) {
                    actions.push(Action::AssetMoved { id: m.id, position });
                }
            }
            info!(count = members.len(), dx = delta.x, dy = delta.y, "selection moved");
        } else {
            debug!(rejected = rejections.len(), "selection drop refused");
            for (id, errors) in rejections {
                actions.push(Action::PlacementRejected { id: Some(id), errors });
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Members that would fail validation when moved by `delta`, checked against
    /// every entity outside the drag.
    fn drag_rejections(&self, members: &[DragMember], delta: Point) -> Vec<(EntityId, Vec<PlacementError>)> {
        let moving: Vec<EntityId> = members.iter().map(|m| m.id).collect();
        members
            .iter()
            .filter_map(|m| {
                let size = self.doc.get(&m.id)?.size;
                let behavior = self.behavior_of(&m.id)?;
                let validation = self.validate_at(m.orig_center.translated(delta), size, &behavior, &moving);
                (!validation.valid).then_some((m.id, validation.errors))
            })
            .collect()
    }

    fn cancel_gesture(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => {
                if self.ui.clear() {
                    return vec![Action::AssetSelected { ids: Vec::new() }, Action::RenderNeeded];
                }
                Vec::new()
            }
            InputState::Panning => {
                self.viewport.end_pan();
                Vec::new()
            }
            InputState::DraggingSelection { .. } => {
                let mut actions = self.set_cursor("default");
                actions.push(Action::RenderNeeded);
                actions
            }
            InputState::Marquee { .. } => vec![Action::RenderNeeded],
            InputState::Rotating => {
                let updates = self.rotation.cancel().unwrap_or_default();
                self.apply_rotation(&updates);
                let mut actions = vec![Action::RotationEnded { updates }, Action::RenderNeeded];
                actions.extend(self.set_cursor("default"));
                actions
            }
        }
    }

    fn hover(&mut self, stage_pt: Point) -> Vec<Action> {
        let cursor = if self.rotation_handle_at(stage_pt).is_some() {
            "grab"
        } else if self.doc.hit_test(stage_pt).is_some_and(|id| self.behavior_of(&id).is_some_and(|b| b.can_move)) {
            "move"
        } else {
            "default"
        };
        self.set_cursor(cursor)
    }

    /// Selected rotatable entity whose rotation handle is under `stage_pt`.
    fn rotation_handle_at(&self, stage_pt: Point) -> Option<EntityId> {
        let radius = self.viewport.viewport().screen_dist_to_stage(HANDLE_RADIUS_PX);
        self.ui.selected_ids.iter().copied().find(|id| {
            let Some(entity) = self.doc.get(id) else {
                return false;
            };
            if !self.behavior_of(id).is_some_and(|b| b.can_rotate) {
                return false;
            }
            let handle = rotation_handle_position(entity.position, entity.size, entity.rotation_degrees);
            handle.distance_to(stage_pt) <= radius
        })
    }

    fn apply_rotation(&mut self, updates: &[RotationUpdate]) {
        for u in updates {
            let partial =
                PartialPlacedEntity { position: Some(u.center), rotation_degrees: Some(u.rotation_degrees), ..Default::default() };
            self.doc.apply_partial(&u.id, &partial);
        }
    }

    /// Where a dragged or dropped entity settles under the held modifiers.
    fn snap_entity(&self, raw: Point, size: Size, behavior: &PlacementBehavior, modifiers: Modifiers) -> Point {
        match resolve_snap_mode(modifiers, ASSET_SNAP) {
            SnapMode::Free => raw,
            SnapMode::Full => snap_asset_position(raw, size, behavior, &self.grid),
            fine => {
                if !behavior.snap_to_grid || behavior.snap_mode == SnapBehavior::Free {
                    return raw;
                }
                snap_point(raw, &self.grid, fine)
            }
        }
    }

    /// Validate a footprint against every entity not in `exclude`. Neighbors are
    /// inset by the collision tolerance so edge contact is legal.
    fn validate_at(&self, center: Point, size: Size, behavior: &PlacementBehavior, exclude: &[EntityId]) -> PlacementValidation {
        let neighbors: Vec<PlacementFootprint> = self
            .doc
            .others(exclude)
            .map(|e| {
                PlacementFootprint {
                    center: e.position,
                    size: e.size,
                    allow_overlap: self.doc.asset_for(e).is_some_and(|a| placement_behavior(&a.kind).allow_overlap),
                }
                .inset(COLLISION_TOLERANCE_PX)
            })
            .collect();
        validate_placement_with_floor(center, size, behavior, &neighbors, &self.grid, self.config.min_placement_px)
    }

    fn set_cursor(&mut self, cursor: &'static str) -> Vec<Action> {
        if self.cursor == cursor {
            return Vec::new();
        }
        self.cursor = cursor;
        vec![Action::SetCursor(cursor)]
    }
}

fn viewport_actions(changed: Option<Viewport>) -> Vec<Action> {
    match changed {
        Some(v) => vec![Action::ViewportChanged(v), Action::RenderNeeded],
        None => Vec::new(),
    }
}

/// The full stage engine. Wraps `EngineCore` and owns the layer surface and image cache.
pub struct Engine<S: Surface> {
    layers: LayerManager<S>,
    images: TokenImageCache,
    pub core: EngineCore,
}

impl<S: Surface> Engine<S> {
    /// Create an engine drawing onto `surface`, creating its layers.
    #[must_use]
    pub fn new(surface: S, fetcher: Arc<dyn ImageFetcher>, config: StageConfig) -> Self {
        let mut layers = LayerManager::new(surface);
        layers.initialize();
        Self { layers, images: TokenImageCache::new(fetcher), core: EngineCore::new(config) }
    }

    // --- Delegated data inputs ---

    pub fn load_snapshot(&mut self, assets: Vec<Asset>, entities: Vec<PlacedEntity>) {
        self.core.load_snapshot(assets, entities);
    }

    pub fn apply_create(&mut self, entity: PlacedEntity) {
        self.core.apply_create(entity);
    }

    pub fn apply_update(&mut self, id: &EntityId, fields: &PartialPlacedEntity) {
        self.core.apply_update(id, fields);
    }

    pub fn apply_delete(&mut self, id: &EntityId) {
        self.images.cancel(id);
        self.core.apply_delete(id);
    }

    /// # Errors
    ///
    /// Returns a [`SetGridError`] when `cfg` is refused; the current grid is kept.
    pub fn set_grid(&mut self, cfg: GridConfig) -> Result<Vec<Action>, SetGridError> {
        self.core.set_grid(cfg)
    }

    pub fn place_asset(&mut self, asset_id: &AssetId, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.place_asset(asset_id, screen_pt, modifiers)
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        let actions = self.core.delete_selected();
        self.cancel_deleted_loads(&actions);
        actions
    }

    // --- Layers ---

    pub fn set_layer_visibility(&mut self, name: LayerName, visible: bool) -> Vec<Action> {
        self.layers.set_layer_visibility(name, visible);
        vec![Action::RenderNeeded]
    }

    #[must_use]
    pub fn layer_states(&self) -> Vec<LayerState> {
        self.layers.layer_states()
    }

    pub fn reset_layers(&mut self) -> Vec<Action> {
        self.layers.reset();
        vec![Action::RenderNeeded]
    }

    /// Backend access for drag handlers and renderers.
    pub fn surface_mut(&mut self) -> &mut S {
        self.layers.surface_mut()
    }

    // --- Viewport ---

    pub fn set_screen_size(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.core.set_screen_size(width, height)
    }

    #[must_use]
    pub fn get_viewport(&self) -> Viewport {
        self.core.get_viewport()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<Action> {
        self.core.set_viewport(viewport)
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.core.zoom_in()
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.core.zoom_out()
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.core.reset_view()
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.layers.enforce_z_order();
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_up(screen_pt, button, modifiers);
        self.layers.enforce_z_order();
        actions
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_key_down(key, modifiers);
        self.cancel_deleted_loads(&actions);
        actions
    }

    // --- Images ---

    /// Apply finished token loads. Returns `RenderNeeded` when any image arrived.
    pub fn poll_images(&mut self) -> Vec<Action> {
        if self.images.drain_completed(&self.core.doc).is_empty() {
            return Vec::new();
        }
        vec![Action::RenderNeeded]
    }

    /// Wait for every in-flight token load to finish.
    pub async fn settle_images(&mut self) {
        self.images.settle().await;
    }

    // --- Render ---

    /// Compose the current frame. Starts token loads for entities that lack an image.
    ///
    /// A grid too dense for the visible area is left out and reported in
    /// [`SceneFrame::grid_error`].
    pub fn render(&mut self) -> SceneFrame {
        self.layers.enforce_z_order();
        self.images.drain_completed(&self.core.doc);
        for entity in self.core.doc.sorted_entities() {
            if let Some(resource) = self.core.doc.asset_for(entity).and_then(Asset::token_resource) {
                self.images.request(entity.id, resource);
            }
        }

        let plan = self.core.grid_plan(self.layers.is_visible(LayerName::Grid));
        let layer_states = self.layers.layer_states();
        let core = &mut self.core;
        let (grid, grid_error) = match core.grid_cache.primitives(&plan) {
            Ok(grid) => (grid, None),
            Err(e) => (&[][..], Some(e)),
        };
        let mut frame = compose_frame(&FrameInput {
            doc: &core.doc,
            layers: &layer_states,
            grid,
            grid_color: core.grid.color,
            images: &self.images,
            ui: &core.ui,
            input: &core.input,
            viewport: core.viewport.viewport(),
        });
        frame.grid_error = grid_error;
        frame
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> &[EntityId] {
        self.core.selection()
    }

    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&PlacedEntity> {
        self.core.entity(id)
    }

    fn cancel_deleted_loads(&mut self, actions: &[Action]) {
        for action in actions {
            if let Action::AssetDeleted { id } = action {
                self.images.cancel(id);
            }
        }
    }
}

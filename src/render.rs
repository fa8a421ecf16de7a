//! Frame composition: turns scene state into per-layer draw lists.
//!
//! This module does not draw pixels. It receives read-only views of the
//! document, layer states, grid primitives, token images and gesture state,
//! and returns a [`SceneFrame`] whose batches the host paints onto the
//! matching surfaces, bottom to top. Hidden layers produce no batch.
//!
//! Entities whose token image has not loaded are left out of the frame; they
//! appear on the first frame after their image arrives.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::sync::Arc;

use crate::camera::{Point, StageRect, Viewport};
use crate::consts::HANDLE_RADIUS_PX;
use crate::doc::{EntityId, PlacedEntity, SceneDoc};
use crate::grid::{Rgba, Size};
use crate::grid_lines::{GridLinesError, GridPrimitive};
use crate::images::{TokenImage, TokenImageCache};
use crate::input::{InputState, UiState};
use crate::layers::{LayerName, LayerState};
use crate::placement::placement_behavior;
use crate::rotation::rotation_handle_position;

/// Grid stroke width in stage pixels.
const GRID_STROKE_WIDTH: f64 = 1.0;

/// Opacity of a drag preview that would be rejected on drop.
const INVALID_PREVIEW_OPACITY: f64 = 0.5;

/// One thing to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    GridLine { points: Vec<f64>, closed: bool, stroke: Rgba, stroke_width: f64 },
    Token { entity_id: EntityId, image: Arc<TokenImage>, center: Point, size: Size, rotation_degrees: f64, opacity: f64 },
    SelectionOutline { entity_id: EntityId, center: Point, size: Size, rotation_degrees: f64 },
    RotationHandle { entity_id: EntityId, anchor: Point, position: Point, radius: f64 },
    PlacementCue { center: Point, size: Size, valid: bool },
    /// Rubber-band selection rectangle.
    Marquee { rect: StageRect },
}

/// Draw list for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerBatch {
    pub layer: LayerName,
    pub z_index: usize,
    pub items: Vec<DrawItem>,
}

/// Everything the host needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub viewport: Viewport,
    /// Visible layers in ascending z order.
    pub layers: Vec<LayerBatch>,
    /// Set when the grid was left out because it is too dense to generate.
    pub grid_error: Option<GridLinesError>,
}

impl SceneFrame {
    #[must_use]
    pub fn batch(&self, layer: LayerName) -> Option<&LayerBatch> {
        self.layers.iter().find(|b| b.layer == layer)
    }
}

/// Read-only inputs to [`compose_frame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub doc: &'a SceneDoc,
    /// As returned by the layer manager, ascending by z.
    pub layers: &'a [LayerState],
    pub grid: &'a [GridPrimitive],
    pub grid_color: Rgba,
    pub images: &'a TokenImageCache,
    pub ui: &'a UiState,
    pub input: &'a InputState,
    pub viewport: Viewport,
}

/// Build the frame for the current state.
#[must_use]
pub fn compose_frame(input: &FrameInput<'_>) -> SceneFrame {
    let mut layers: Vec<LayerBatch> = input
        .layers
        .iter()
        .filter(|s| s.visible)
        .map(|s| LayerBatch { layer: s.name, z_index: s.z_index, items: Vec::new() })
        .collect();

    let mut push = |layer: LayerName, item: DrawItem| {
        if let Some(batch) = layers.iter_mut().find(|b| b.layer == layer) {
            batch.items.push(item);
        }
    };

    for prim in input.grid {
        push(
            LayerName::Grid,
            DrawItem::GridLine {
                points: prim.flat_points(),
                closed: prim.is_closed(),
                stroke: input.grid_color,
                stroke_width: GRID_STROKE_WIDTH,
            },
        );
    }

    let dragging = input.input.drag_valid();
    let opacity = if dragging == Some(false) { INVALID_PREVIEW_OPACITY } else { 1.0 };

    for entity in input.doc.sorted_entities() {
        let (center, opacity) = match input.input.drag_preview(&entity.id) {
            Some(preview) => (preview, opacity),
            None => (entity.position, 1.0),
        };
        let Some(image) = token_image(input, entity) else {
            continue;
        };
        push(
            entity.layer,
            DrawItem::Token {
                entity_id: entity.id,
                image,
                center,
                size: entity.size,
                rotation_degrees: entity.rotation_degrees,
                opacity,
            },
        );
    }

    let handle_radius = input.viewport.screen_dist_to_stage(HANDLE_RADIUS_PX);
    for id in &input.ui.selected_ids {
        let Some(entity) = input.doc.get(id) else {
            continue;
        };
        push(
            LayerName::Ui,
            DrawItem::SelectionOutline {
                entity_id: entity.id,
                center: input.input.drag_preview(id).unwrap_or(entity.position),
                size: entity.size,
                rotation_degrees: entity.rotation_degrees,
            },
        );
        let rotatable = input.doc.asset_for(entity).is_some_and(|a| placement_behavior(&a.kind).can_rotate);
        if rotatable && dragging.is_none() {
            push(
                LayerName::Ui,
                DrawItem::RotationHandle {
                    entity_id: entity.id,
                    anchor: entity.position,
                    position: rotation_handle_position(entity.position, entity.size, entity.rotation_degrees),
                    radius: handle_radius,
                },
            );
        }
    }

    if let InputState::DraggingSelection { members, delta, valid, .. } = input.input {
        for m in members {
            if let Some(entity) = input.doc.get(&m.id) {
                let center = m.orig_center.translated(*delta);
                push(LayerName::Ui, DrawItem::PlacementCue { center, size: entity.size, valid: *valid });
            }
        }
    }

    if let Some(rect) = input.input.marquee_rect() {
        push(LayerName::Ui, DrawItem::Marquee { rect });
    }

    SceneFrame { viewport: input.viewport, layers, grid_error: None }
}

fn token_image(input: &FrameInput<'_>, entity: &PlacedEntity) -> Option<Arc<TokenImage>> {
    let resource = input.doc.asset_for(entity)?.token_resource()?;
    input.images.image(&resource.resource_id)
}

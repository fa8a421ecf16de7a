//! Scene document: asset records, placed entities, and the in-memory store.
//!
//! Assets arrive from the host as JSON records. Their kind-specific
//! properties are a tagged union ([`AssetKind`]) rather than an open property
//! bag, so every consumer matches exhaustively on the variant. Placed entities
//! reference an asset and carry their stage-space geometry; the layer an entity
//! draws on is derived from its asset kind and never chosen freely.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Point, StageRect};
use crate::grid::Size;
use crate::layers::LayerName;

/// Unique identifier for an asset record.
pub type AssetId = Uuid;

/// Unique identifier for a placed entity.
pub type EntityId = Uuid;

/// Footprint of an asset measured in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedSize {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub is_square: bool,
}

impl NamedSize {
    #[must_use]
    pub fn cells(width: f64, height: f64) -> Self {
        #[allow(clippy::float_cmp)]
        let is_square = width == height;
        Self { width, height, is_square }
    }
}

impl Default for NamedSize {
    fn default() -> Self {
        Self::cells(1.0, 1.0)
    }
}

/// Properties of an object asset (furniture, doors, scenery).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectProperties {
    #[serde(default)]
    pub size: NamedSize,
    /// Whether the object may be dragged once placed.
    #[serde(default)]
    pub is_movable: bool,
    /// Opaque objects block sight and movement; they draw on the structure layer.
    #[serde(default)]
    pub is_opaque: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatureCategory {
    #[default]
    Character,
    Monster,
}

/// Properties of a creature asset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureProperties {
    #[serde(default)]
    pub size: NamedSize,
    #[serde(default)]
    pub category: CreatureCategory,
}

/// Asset kind with its kind-specific properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssetKind {
    Object(ObjectProperties),
    Creature(CreatureProperties),
}

impl AssetKind {
    /// Footprint in cells.
    #[must_use]
    pub fn size(&self) -> &NamedSize {
        match self {
            Self::Object(props) => &props.size,
            Self::Creature(props) => &props.size,
        }
    }
}

/// Which image a resource provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceRole {
    /// Top-down token art.
    Token,
    /// Portrait / display art; used as a token when no token art exists.
    Display,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResource {
    pub resource_id: Uuid,
    pub role: ResourceRole,
    pub url: String,
}

/// An asset record as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    #[serde(flatten)]
    pub kind: AssetKind,
    #[serde(default)]
    pub resources: Vec<AssetResource>,
}

impl Asset {
    /// Resource to draw as the token: `Token` role first, then `Display`.
    #[must_use]
    pub fn token_resource(&self) -> Option<&AssetResource> {
        self.resources
            .iter()
            .find(|r| r.role == ResourceRole::Token)
            .or_else(|| self.resources.iter().find(|r| r.role == ResourceRole::Display))
    }
}

/// Layer an asset of this kind draws on.
#[must_use]
pub fn layer_for(kind: &AssetKind) -> LayerName {
    match kind {
        AssetKind::Creature(_) => LayerName::Agents,
        AssetKind::Object(props) if props.is_opaque => LayerName::Structure,
        AssetKind::Object(_) => LayerName::Objects,
    }
}

/// An asset instance placed on the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedEntity {
    pub id: EntityId,
    pub asset_id: AssetId,
    /// Center point in stage pixels.
    pub position: Point,
    /// Size in stage pixels.
    pub size: Size,
    /// Clockwise rotation in degrees around `position`.
    #[serde(default)]
    pub rotation_degrees: f64,
    pub layer: LayerName,
}

impl PlacedEntity {
    /// New entity for `asset`, on the layer its kind dictates.
    #[must_use]
    pub fn new(asset: &Asset, position: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id: asset.id,
            position,
            size,
            rotation_degrees: 0.0,
            layer: layer_for(&asset.kind),
        }
    }

    /// Unrotated bounding box.
    #[must_use]
    pub fn bounds(&self) -> StageRect {
        StageRect::centered(self.position, self.size.width, self.size.height)
    }

    /// Whether `p` falls inside the entity's rotated rectangle.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let local = p.rotated_about(self.position, -self.rotation_degrees);
        self.bounds().contains(local)
    }
}

/// Sparse update for a placed entity. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPlacedEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_degrees: Option<f64>,
}

/// In-memory store of assets and placed entities.
#[derive(Debug, Default)]
pub struct SceneDoc {
    assets: HashMap<AssetId, Asset>,
    entities: HashMap<EntityId, PlacedEntity>,
}

impl SceneDoc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an asset record.
    pub fn insert_asset(&mut self, asset: Asset) {
        self.assets.insert(asset.id, asset);
    }

    #[must_use]
    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.get(id)
    }

    /// Asset record backing `entity`.
    #[must_use]
    pub fn asset_for(&self, entity: &PlacedEntity) -> Option<&Asset> {
        self.assets.get(&entity.asset_id)
    }

    /// Insert or replace a placed entity.
    pub fn insert(&mut self, entity: PlacedEntity) {
        self.entities.insert(entity.id, entity);
    }

    /// Remove an entity by id, returning it if it was present.
    pub fn remove(&mut self, id: &EntityId) -> Option<PlacedEntity> {
        self.entities.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&PlacedEntity> {
        self.entities.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Apply a partial update. Returns false if the entity doesn't exist.
    pub fn apply_partial(&mut self, id: &EntityId, partial: &PartialPlacedEntity) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        if let Some(position) = partial.position {
            entity.position = position;
        }
        if let Some(size) = partial.size {
            entity.size = size;
        }
        if let Some(rotation) = partial.rotation_degrees {
            entity.rotation_degrees = rotation;
        }
        true
    }

    /// Replace all assets and entities with a full snapshot.
    pub fn load_snapshot(&mut self, assets: Vec<Asset>, entities: Vec<PlacedEntity>) {
        self.assets = assets.into_iter().map(|a| (a.id, a)).collect();
        self.entities = entities.into_iter().map(|e| (e.id, e)).collect();
    }

    /// All entities sorted by `(layer z-index, id)` for draw order.
    #[must_use]
    pub fn sorted_entities(&self) -> Vec<&PlacedEntity> {
        let mut entities: Vec<&PlacedEntity> = self.entities.values().collect();
        entities.sort_by(|a, b| a.layer.z_index().cmp(&b.layer.z_index()).then_with(|| a.id.cmp(&b.id)));
        entities
    }

    /// Topmost entity under `p`.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<EntityId> {
        self.sorted_entities().into_iter().rev().find(|e| e.contains(p)).map(|e| e.id)
    }

    /// Entities other than `exclude`.
    pub fn others<'a>(&'a self, exclude: &'a [EntityId]) -> impl Iterator<Item = &'a PlacedEntity> + 'a {
        self.entities.values().filter(move |e| !exclude.contains(&e.id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

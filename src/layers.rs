//! Layer manager: the seven named drawing surfaces and their canonical stacking.
//!
//! Every frame is composited onto exactly seven layers, bottom to top:
//!
//! | Layer        | z |
//! |--------------|---|
//! | `background` | 0 |
//! | `grid`       | 1 |
//! | `structure`  | 2 |
//! | `objects`    | 3 |
//! | `agents`     | 4 |
//! | `foreground` | 5 |
//! | `ui`         | 6 |
//!
//! The rendering backend sits behind the [`Surface`] trait. Backends are free
//! to reorder their surfaces (drag handlers commonly raise a node to the top);
//! [`LayerManager::enforce_z_order`] puts the canonical order back and is cheap
//! enough to call before every redraw-critical interaction.

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the seven canonical layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerName {
    Background,
    Grid,
    Structure,
    Objects,
    Agents,
    Foreground,
    Ui,
}

impl LayerName {
    /// All layers in canonical order.
    pub const ALL: [LayerName; 7] = [
        Self::Background,
        Self::Grid,
        Self::Structure,
        Self::Objects,
        Self::Agents,
        Self::Foreground,
        Self::Ui,
    ];

    /// Canonical z-index.
    #[must_use]
    pub fn z_index(self) -> usize {
        match self {
            Self::Background => 0,
            Self::Grid => 1,
            Self::Structure => 2,
            Self::Objects => 3,
            Self::Agents => 4,
            Self::Foreground => 5,
            Self::Ui => 6,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Grid => "grid",
            Self::Structure => "structure",
            Self::Objects => "objects",
            Self::Agents => "agents",
            Self::Foreground => "foreground",
            Self::Ui => "ui",
        }
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one layer as reported by [`LayerManager::layer_states`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerState {
    pub name: LayerName,
    pub visible: bool,
    pub z_index: usize,
}

/// Handle to the rendering backend's named surfaces.
pub trait Surface {
    fn has_layer(&self, name: LayerName) -> bool;

    /// Create a visible layer at `z_index`. Creating an existing layer is a no-op.
    fn create_layer(&mut self, name: LayerName, z_index: usize);

    /// `None` when the layer does not exist.
    fn layer_visible(&self, name: LayerName) -> Option<bool>;

    fn set_layer_visible(&mut self, name: LayerName, visible: bool);

    /// `None` when the layer does not exist.
    fn layer_z_index(&self, name: LayerName) -> Option<usize>;

    fn set_layer_z_index(&mut self, name: LayerName, z_index: usize);
}

#[derive(Debug, Clone, Copy)]
struct SurfaceLayer {
    name: LayerName,
    visible: bool,
}

/// In-memory surface where a layer's z-index is its position in a stack,
/// the way scene-graph canvases order sibling nodes.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    stack: Vec<SurfaceLayer>,
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a layer above all others.
    pub fn move_to_top(&mut self, name: LayerName) {
        let top = self.stack.len().saturating_sub(1);
        self.set_layer_z_index(name, top);
    }

    /// Lower a layer beneath all others.
    pub fn move_to_bottom(&mut self, name: LayerName) {
        self.set_layer_z_index(name, 0);
    }

    /// Layer names from bottom to top.
    #[must_use]
    pub fn stacking(&self) -> Vec<LayerName> {
        self.stack.iter().map(|l| l.name).collect()
    }

    fn position(&self, name: LayerName) -> Option<usize> {
        self.stack.iter().position(|l| l.name == name)
    }
}

impl Surface for MemorySurface {
    fn has_layer(&self, name: LayerName) -> bool {
        self.position(name).is_some()
    }

    fn create_layer(&mut self, name: LayerName, z_index: usize) {
        if self.has_layer(name) {
            return;
        }
        let at = z_index.min(self.stack.len());
        self.stack.insert(at, SurfaceLayer { name, visible: true });
    }

    fn layer_visible(&self, name: LayerName) -> Option<bool> {
        self.position(name).map(|i| self.stack[i].visible)
    }

    fn set_layer_visible(&mut self, name: LayerName, visible: bool) {
        if let Some(i) = self.position(name) {
            self.stack[i].visible = visible;
        }
    }

    fn layer_z_index(&self, name: LayerName) -> Option<usize> {
        self.position(name)
    }

    fn set_layer_z_index(&mut self, name: LayerName, z_index: usize) {
        let Some(from) = self.position(name) else {
            return;
        };
        let layer = self.stack.remove(from);
        let to = z_index.min(self.stack.len());
        self.stack.insert(to, layer);
    }
}

/// Single owner of layer z-order and visibility.
#[derive(Debug)]
pub struct LayerManager<S: Surface> {
    surface: S,
}

impl<S: Surface> LayerManager<S> {
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    /// Create any missing layers in canonical order. Returns how many were created.
    pub fn initialize(&mut self) -> usize {
        let mut created = 0;
        for name in LayerName::ALL {
            if !self.surface.has_layer(name) {
                self.surface.create_layer(name, name.z_index());
                created += 1;
            }
        }
        if created > 0 {
            debug!(created, "initialized layers");
        }
        created
    }

    /// Show or hide one layer. Z-order is left alone.
    pub fn set_layer_visibility(&mut self, name: LayerName, visible: bool) {
        self.surface.set_layer_visible(name, visible);
    }

    /// Whether `name` exists and is visible.
    #[must_use]
    pub fn is_visible(&self, name: LayerName) -> bool {
        self.surface.layer_visible(name).unwrap_or(false)
    }

    /// Existing layers sorted ascending by their current z-index.
    #[must_use]
    pub fn layer_states(&self) -> Vec<LayerState> {
        let mut states: Vec<LayerState> = LayerName::ALL
            .into_iter()
            .filter_map(|name| {
                Some(LayerState {
                    name,
                    visible: self.surface.layer_visible(name)?,
                    z_index: self.surface.layer_z_index(name)?,
                })
            })
            .collect();
        states.sort_by_key(|s| (s.z_index, s.name));
        states
    }

    /// Reassign every layer's canonical z-index, recreating missing layers.
    /// Returns the number of corrections made; zero means the order was already canonical.
    pub fn enforce_z_order(&mut self) -> usize {
        let mut corrections = self.initialize();
        // Bottom-up so that positions already fixed are not disturbed by later moves.
        for name in LayerName::ALL {
            let want = name.z_index();
            if self.surface.layer_z_index(name) != Some(want) {
                self.surface.set_layer_z_index(name, want);
                corrections += 1;
            }
        }
        if corrections > 0 {
            debug!(corrections, "restored canonical layer order");
        }
        corrections
    }

    /// Make every layer visible and restore canonical order.
    pub fn reset(&mut self) {
        for name in LayerName::ALL {
            self.surface.set_layer_visible(name, true);
        }
        self.enforce_z_order();
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct backend access for renderers. Follow with [`Self::enforce_z_order`].
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

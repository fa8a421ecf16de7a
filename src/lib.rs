//! Battle map stage engine for tabletop scenes.
//!
//! The engine owns everything between raw pointer/keyboard input and a
//! per-layer draw list: grid geometry and snapping, placement rules for
//! creatures and objects, single and group rotation, pan/zoom, and the seven
//! canonical drawing layers. The host is responsible for delivering input,
//! painting the [`render::SceneFrame`] it gets back, and persisting the
//! resulting [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Asset records, placed entities, and the in-memory store |
//! | [`grid`] | Grid configuration and cell/point math for every grid type |
//! | [`grid_lines`] | Lazy grid line generation and its cache |
//! | [`snap`] | Snap modes and modifier resolution |
//! | [`placement`] | Placement behavior, sizing, snapping, and validation |
//! | [`rotation`] | Rotation handle geometry and the rotation controller |
//! | [`viewport`] | Pan/zoom controller |
//! | [`layers`] | The seven named layers and z-order enforcement |
//! | [`images`] | Asynchronous token image cache |
//! | [`render`] | Frame composition into per-layer draw lists |
//! | [`camera`] | Points, rectangles, and screen/stage conversion |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`config`] | Environment-driven stage configuration |
//! | [`consts`] | Shared numeric constants (zoom limits, snap steps, etc.) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod grid;
pub mod grid_lines;
pub mod images;
pub mod input;
pub mod layers;
pub mod placement;
pub mod render;
pub mod rotation;
pub mod snap;
pub mod viewport;

//! Fog of war engine for a virtual tabletop map view.
//!
//! The engine keeps a spatially indexed set of fog regions over the map, lets the GM
//! author them with interactive tools, animates reveal/hide transitions and renders the
//! composited fog every frame onto a host-provided drawing surface.
//!
//! - [`fog`] - region model, geometry, quadtree, store, settings, events, animation
//! - [`tools`] - tool/interaction state machine
//! - [`render`] - drawing surface abstraction and the fog renderer
//! - [`engine`] - [`FogEngine`], the owned engine instance tying it all together
//! - [`host`] - Bevy integration (camera, input, frame loop, gizmo replay, file I/O)
//! - [`ui`] - egui fog panel

pub mod config;
pub mod constants;
pub mod engine;
pub mod fog;
pub mod host;
pub mod paths;
pub mod render;
pub mod theme;
pub mod tools;
pub mod ui;

pub use engine::{FogEngine, FogMetrics};
pub use fog::{
    FogError, FogEvent, FogEventKind, FogRegion, FogSettings, FogSnapshot, RegionId,
    RegionOptions, RegionPatch, RegionShape, ShapeKind, Viewport,
};
pub use tools::{FogKey, FogTool, PointerButton};

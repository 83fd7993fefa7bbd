//! Fog rendering: surface abstraction, recording surface, pattern tiles and the per-frame
//! compositor.

pub mod cache;
pub mod display_list;
pub mod pattern;
pub mod renderer;
pub mod stats;
pub mod surface;


pub use cache::{RenderCache, outline_of};
pub use display_list::{DisplayList, DisplayListSurface, DrawCommand, SharedDisplayList};
pub use pattern::{PatternCache, PatternKey, PatternTile};
pub use renderer::{FogRenderer, FrameInput, FrameOutcome};
pub use stats::FpsCounter;
pub use surface::{
    FillStyle, FogSurface, GpuCompositor, Paint, ScreenPath, ScreenRegion, StrokeStyle,
    SurfaceError,
};

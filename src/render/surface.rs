//! Drawing surface seam between the renderer and whatever actually puts pixels on screen.

use std::sync::Arc;

use bevy::prelude::*;
use thiserror::Error;

use crate::fog::{FogSettings, RegionId};

use super::pattern::PatternTile;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("drawing surface unavailable: {0}")]
    Unavailable(String),

    #[error("drawing surface state was poisoned by a panicking reader")]
    Poisoned,

    #[error("GPU compositor failed: {0}")]
    Gpu(String),

    #[error("pattern tile generation failed: {0}")]
    Pattern(String),
}

/// Closed or open path in surface pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPath {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl ScreenPath {
    pub fn closed(points: Vec<Vec2>) -> Self {
        Self {
            points,
            closed: true,
        }
    }

    pub fn open(points: Vec<Vec2>) -> Self {
        Self {
            points,
            closed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Repeating tile anchored at the surface origin
    Pattern(Arc<PatternTile>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub paint: Paint,
    pub opacity: f32,
    /// Edge blur radius in pixels, 0 = hard edge
    pub blur: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub opacity: f32,
    pub width: f32,
    /// Dash and gap lengths in pixels, `None` = solid line
    pub dash: Option<[f32; 2]>,
}

/// One region prepared for compositing
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRegion {
    pub id: RegionId,
    pub path: ScreenPath,
    pub opacity: f32,
}

/// 2D drawing target handed to the engine at initialization
pub trait FogSurface: Send + Sync {
    fn clear(&mut self) -> Result<(), SurfaceError>;

    fn fill_path(&mut self, path: &ScreenPath, style: &FillStyle) -> Result<(), SurfaceError>;

    fn stroke_path(&mut self, path: &ScreenPath, style: &StrokeStyle)
    -> Result<(), SurfaceError>;

    /// Called once after every frame that drew something (including a clear)
    fn present(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// Try to obtain a hardware compositor. Surfaces without one return `None`.
    fn acquire_gpu(&mut self) -> Option<Box<dyn GpuCompositor>> {
        None
    }
}

/// Higher-throughput compositing path used at ultra quality
pub trait GpuCompositor: Send + Sync {
    fn name(&self) -> &str;

    fn composite(
        &mut self,
        regions: &[ScreenRegion],
        settings: &FogSettings,
    ) -> Result<(), SurfaceError>;
}

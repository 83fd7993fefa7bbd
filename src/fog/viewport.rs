//! World/screen transform for the visible part of the map.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

/// Visible part of the map: a world-space rectangle plus zoom factor.
///
/// `x`/`y` is the world-space origin of the surface, `width`/`height` the surface size in
/// screen pixels. Screen position = (world - origin) * zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// World-space rectangle covered by the surface
    pub fn world_rect(&self) -> Rect {
        let origin = self.origin();
        Rect::from_corners(origin, origin + self.screen_size() / self.zoom)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.origin()) * self.zoom
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen / self.zoom + self.origin()
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
            && self.zoom.is_finite()
            && self.zoom > 0.0
    }
}

//! Offscreen pattern tiles.
//!
//! A tile is a small square RGBA image that repeats across a region fill. Tiles are
//! generated once per (pattern, scale, color) and shared between frames.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::color::ColorToPacked;
use bevy::prelude::*;
use image::{Rgba, RgbaImage};

use crate::constants::{MAX_PATTERN_SCALE, MIN_PATTERN_SCALE};
use crate::fog::PatternKind;

use super::surface::SurfaceError;

/// Alpha of the fog between pattern strokes, so patterned fog still hides the map
const BACKGROUND_ALPHA: f32 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub kind: PatternKind,
    /// Tile side in pixels
    pub size: u32,
    pub rgba: [u8; 4],
}

impl PatternKey {
    pub fn new(kind: PatternKind, scale: f32, color: Color) -> Result<Self, SurfaceError> {
        if kind == PatternKind::Solid {
            return Err(SurfaceError::Pattern("solid fill has no tile".to_string()));
        }
        if !scale.is_finite() || !(MIN_PATTERN_SCALE..=MAX_PATTERN_SCALE).contains(&scale) {
            return Err(SurfaceError::Pattern(format!(
                "scale {scale} outside [{MIN_PATTERN_SCALE}, {MAX_PATTERN_SCALE}]"
            )));
        }
        Ok(Self {
            kind,
            size: scale.round() as u32,
            rgba: color.to_srgba().to_u8_array(),
        })
    }
}

#[derive(Debug)]
pub struct PatternTile {
    pub key: PatternKey,
    pub image: RgbaImage,
}

impl PartialEq for PatternTile {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl PatternTile {
    pub fn generate(key: PatternKey) -> Self {
        let size = key.size;
        let [r, g, b, a] = key.rgba;
        let ink = Rgba([r, g, b, a]);
        let background = Rgba([r, g, b, (a as f32 * BACKGROUND_ALPHA).round() as u8]);
        let line_width = (size / 8).max(1);

        let image = RgbaImage::from_fn(size, size, |x, y| {
            let on_stroke = match key.kind {
                PatternKind::Solid => true,
                PatternKind::Diagonal => (x + y) % size < line_width,
                PatternKind::Crosshatch => {
                    (x + y) % size < line_width || (x + size - y) % size < line_width
                }
                PatternKind::Dots => {
                    let half = size as f32 / 2.0;
                    let d = Vec2::new(x as f32 + 0.5 - half, y as f32 + 0.5 - half);
                    d.length() <= size as f32 / 4.0
                }
            };
            if on_stroke { ink } else { background }
        });

        Self { key, image }
    }

    pub fn size(&self) -> u32 {
        self.key.size
    }

    /// Alpha in [0, 1] at a surface position; the tile repeats from the origin
    pub fn alpha_at(&self, pos: Vec2) -> f32 {
        let size = self.key.size as f32;
        let x = pos.x.rem_euclid(size) as u32;
        let y = pos.y.rem_euclid(size) as u32;
        let last = self.key.size - 1;
        self.image.get_pixel(x.min(last), y.min(last)).0[3] as f32 / 255.0
    }
}

/// Tiles keyed by pattern, size and color
#[derive(Debug, Default)]
pub struct PatternCache {
    tiles: HashMap<PatternKey, Arc<PatternTile>>,
}

impl PatternCache {
    pub fn get_or_create(
        &mut self,
        kind: PatternKind,
        scale: f32,
        color: Color,
    ) -> Result<Arc<PatternTile>, SurfaceError> {
        let key = PatternKey::new(kind, scale, color)?;
        let tile = self.tiles.entry(key).or_insert_with(|| {
            debug!("Generated {} pattern tile ({}px)", kind, key.size);
            Arc::new(PatternTile::generate(key))
        });
        Ok(tile.clone())
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

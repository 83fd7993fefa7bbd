//! Per-region render artifacts.
//!
//! Each region's outline is flattened to a world-space point list once and reused until
//! the region changes. Entries are dropped eagerly on update/remove; a stale or missing
//! entry only costs a recompute.

use std::collections::HashMap;
use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::fog::{FogRegion, RegionId, RegionShape, RenderQuality};

/// Flatten a shape into a closed outline in world coordinates
pub fn outline_of(shape: &RegionShape, circle_segments: usize) -> Vec<Vec2> {
    match shape {
        RegionShape::Circle { center, radius } => {
            let segments = circle_segments.max(3);
            (0..segments)
                .map(|i| {
                    let angle = TAU * i as f32 / segments as f32;
                    *center + Vec2::from_angle(angle) * *radius
                })
                .collect()
        }
        RegionShape::Rectangle {
            top_left,
            bottom_right,
        } => vec![
            *top_left,
            Vec2::new(bottom_right.x, top_left.y),
            *bottom_right,
            Vec2::new(top_left.x, bottom_right.y),
        ],
        RegionShape::Polygon { points } => points.clone(),
    }
}

#[derive(Debug)]
struct CachedOutline {
    quality: RenderQuality,
    points: Vec<Vec2>,
}

#[derive(Debug, Default)]
pub struct RenderCache {
    outlines: HashMap<RegionId, CachedOutline>,
}

impl RenderCache {
    /// World-space outline of `region`, flattened at `quality`
    pub fn outline(&mut self, region: &FogRegion, quality: RenderQuality) -> &[Vec2] {
        let entry = self
            .outlines
            .entry(region.id)
            .or_insert_with(|| CachedOutline {
                quality,
                points: outline_of(&region.shape, quality.circle_segments()),
            });
        if entry.quality != quality {
            entry.quality = quality;
            entry.points = outline_of(&region.shape, quality.circle_segments());
        }
        &entry.points
    }

    pub fn invalidate(&mut self, id: RegionId) -> bool {
        self.outlines.remove(&id).is_some()
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.outlines.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.outlines.clear();
    }

    pub fn len(&self) -> usize {
        self.outlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty()
    }
}

//! Authoritative region store.
//!
//! The store owns every region and keeps the quadtree in step: each mutation updates
//! the map first and the index immediately after. State changes are queued as
//! [`FogEvent`]s in an outbox that the engine drains and publishes.

use std::collections::HashMap;

use bevy::prelude::*;
use chrono::Utc;

use crate::constants::HIT_TEST_BOX_SIZE;

use super::error::FogError;
use super::events::FogEvent;
use super::geometry::point_box;
use super::quadtree::{IndexConfig, QuadTree};
use super::region::{FogRegion, RegionId, RegionOptions, RegionPatch, RegionShape, ShapeKind};

/// Opacity of a freshly created region unless the caller overrides it
pub const DEFAULT_REGION_OPACITY: f32 = 1.0;

#[derive(Debug)]
struct Slot {
    region: FogRegion,
    /// Insertion sequence, breaks draw-order ties between equal timestamps
    seq: u64,
}

#[derive(Debug)]
pub struct RegionStore {
    regions: HashMap<RegionId, Slot>,
    index: QuadTree,
    config: IndexConfig,
    next_seq: u64,
    removals_since_rebuild: usize,
    outbox: Vec<FogEvent>,
}

impl Default for RegionStore {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl RegionStore {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            regions: HashMap::new(),
            index: QuadTree::from_config(&config),
            config,
            next_seq: 0,
            removals_since_rebuild: 0,
            outbox: Vec::new(),
        }
    }

    /// Create a region from raw input points.
    ///
    /// Fails with [`FogError::InvalidGeometry`] when there are too few points for the
    /// shape and [`FogError::NonFiniteGeometry`] when a coordinate is NaN or infinite;
    /// nothing is created in either case.
    pub fn create(
        &mut self,
        kind: ShapeKind,
        points: &[Vec2],
        options: RegionOptions,
    ) -> Result<RegionId, FogError> {
        let shape = RegionShape::from_points(kind, points)?;
        let now = Utc::now();
        let region = FogRegion {
            id: RegionId::new(),
            name: options
                .name
                .unwrap_or_else(|| format!("{} {}", kind, self.regions.len() + 1)),
            shape,
            opacity: clamp_opacity(options.opacity.unwrap_or(DEFAULT_REGION_OPACITY)),
            layer: options.layer.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        let id = region.id;

        debug!("Created {} region {} ({})", kind, region.name, id);
        self.outbox.push(FogEvent::RegionCreated(region.clone()));
        self.insert(region);
        Ok(id)
    }

    fn insert(&mut self, region: FogRegion) {
        let id = region.id;
        let bounds = region.bounds();
        let seq = self.next_seq;
        self.next_seq += 1;

        self.regions.insert(id, Slot { region, seq });
        self.index.insert(id, bounds);
    }

    pub fn remove(&mut self, id: RegionId) -> bool {
        if self.regions.remove(&id).is_none() {
            return false;
        }
        self.index.remove(id);
        self.removals_since_rebuild += 1;

        debug!("Removed region {}", id);
        self.outbox.push(FogEvent::RegionRemoved(id));

        let threshold = self.config.rebuild_after_removals;
        if threshold > 0 && self.removals_since_rebuild >= threshold {
            self.rebuild_index();
        }
        true
    }

    /// Apply a partial update.
    ///
    /// Returns false if the region does not exist or the patch carries an unusable
    /// shape. The index entry is replaced since the bounds may have changed.
    pub fn update(&mut self, id: RegionId, patch: RegionPatch) -> bool {
        let Some(slot) = self.regions.get_mut(&id) else {
            return false;
        };
        if patch.shape.as_ref().is_some_and(|shape| !shape.is_valid()) {
            debug!("Rejected invalid shape update for region {}", id);
            return false;
        }

        let region = &mut slot.region;
        if let Some(name) = patch.name {
            region.name = name;
        }
        if let Some(shape) = patch.shape {
            region.shape = shape;
        }
        if let Some(opacity) = patch.opacity {
            region.opacity = clamp_opacity(opacity);
        }
        if let Some(layer) = patch.layer {
            region.layer = layer;
        }
        region.updated_at = Utc::now();

        let bounds = region.bounds();
        let event = FogEvent::RegionUpdated(region.clone());

        self.index.remove(id);
        self.index.insert(id, bounds);
        self.outbox.push(event);
        true
    }

    /// Set opacity to 0. Returns false only if the region does not exist.
    pub fn reveal(&mut self, id: RegionId) -> bool {
        self.set_visibility(id, 0.0)
    }

    /// Set opacity to 1. Returns false only if the region does not exist.
    pub fn hide(&mut self, id: RegionId) -> bool {
        self.set_visibility(id, 1.0)
    }

    fn set_visibility(&mut self, id: RegionId, opacity: f32) -> bool {
        let Some(slot) = self.regions.get_mut(&id) else {
            return false;
        };
        if slot.region.opacity == opacity {
            return true;
        }

        slot.region.opacity = opacity;
        slot.region.updated_at = Utc::now();
        self.outbox.push(if slot.region.is_revealed() {
            FogEvent::RegionRevealed(id)
        } else {
            FogEvent::RegionHidden(id)
        });
        true
    }

    /// Write an intermediate opacity without emitting an event (animation ticks)
    pub fn set_opacity(&mut self, id: RegionId, opacity: f32) -> bool {
        match self.regions.get_mut(&id) {
            Some(slot) => {
                slot.region.opacity = clamp_opacity(opacity);
                true
            }
            None => false,
        }
    }

    /// Publish the outcome of a finished transition
    pub fn finish_transition(&mut self, id: RegionId) {
        let Some(slot) = self.regions.get_mut(&id) else {
            return;
        };
        slot.region.updated_at = Utc::now();
        self.outbox.push(if slot.region.is_revealed() {
            FogEvent::RegionRevealed(id)
        } else {
            FogEvent::RegionHidden(id)
        });
    }

    /// Remove every region, returning the removed ids in draw order
    pub fn clear(&mut self) -> Vec<RegionId> {
        let ids: Vec<RegionId> = self.iter().map(|region| region.id).collect();
        self.regions.clear();
        self.index.clear();
        self.removals_since_rebuild = 0;

        debug!("Cleared {} regions", ids.len());
        self.outbox.push(FogEvent::RegionsCleared(ids.clone()));
        ids
    }

    /// Replace all regions at once without emitting per-region events (snapshot import)
    pub fn replace_all(&mut self, regions: Vec<FogRegion>) {
        self.regions.clear();
        self.index.clear();
        self.removals_since_rebuild = 0;
        for region in regions {
            self.insert(region);
        }
    }

    /// Rebuild the quadtree from scratch, dropping empty nodes left behind by removals
    pub fn rebuild_index(&mut self) {
        let mut index = QuadTree::from_config(&self.config);
        for slot in self.regions.values() {
            index.insert(slot.region.id, slot.region.bounds());
        }
        debug!(
            "Rebuilt spatial index: {} regions, {} nodes",
            index.len(),
            index.node_count()
        );
        self.index = index;
        self.removals_since_rebuild = 0;
    }

    pub fn set_index_config(&mut self, config: IndexConfig) {
        self.config = config;
        self.rebuild_index();
    }

    pub fn index_config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn index(&self) -> &QuadTree {
        &self.index
    }

    pub fn get(&self, id: RegionId) -> Option<&FogRegion> {
        self.regions.get(&id).map(|slot| &slot.region)
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All regions in draw order: layer, then creation time
    pub fn iter(&self) -> impl Iterator<Item = &FogRegion> {
        let mut slots: Vec<&Slot> = self.regions.values().collect();
        slots.sort_by_key(|slot| draw_key(slot));
        slots.into_iter().map(|slot| &slot.region)
    }

    /// Regions whose bounding box intersects `rect`, in draw order
    pub fn query(&self, rect: Rect) -> Vec<&FogRegion> {
        let mut slots: Vec<&Slot> = self
            .index
            .query(rect)
            .into_iter()
            .filter_map(|id| self.regions.get(&id))
            .collect();
        slots.sort_by_key(|slot| draw_key(slot));
        slots.into_iter().map(|slot| &slot.region).collect()
    }

    /// Regions containing `point`, topmost first
    pub fn regions_at(&self, point: Vec2) -> Vec<&FogRegion> {
        let mut hits = self.query(point_box(point, HIT_TEST_BOX_SIZE));
        hits.retain(|region| region.contains_point(point));
        hits.reverse();
        hits
    }

    pub fn topmost_at(&self, point: Vec2) -> Option<RegionId> {
        self.regions_at(point).first().map(|region| region.id)
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<FogEvent> {
        std::mem::take(&mut self.outbox)
    }
}

fn draw_key(slot: &Slot) -> (i32, chrono::DateTime<Utc>, u64) {
    (slot.region.layer, slot.region.created_at, slot.seq)
}

fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        DEFAULT_REGION_OPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RegionStore {
        RegionStore::default()
    }

    fn circle(store: &mut RegionStore, center: Vec2, radius: f32) -> RegionId {
        store
            .create(
                ShapeKind::Circle,
                &[center, center + Vec2::new(radius, 0.0)],
                RegionOptions::default(),
            )
            .unwrap()
    }

    #[test]
    fn test_create_inserts_into_index() {
        let mut store = store();
        let id = circle(&mut store, Vec2::new(100.0, 100.0), 50.0);

        assert_eq!(store.len(), 1);
        let found = store.query(Rect::new(140.0, 140.0, 160.0, 160.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert!(matches!(
            store.drain_events().as_slice(),
            [FogEvent::RegionCreated(region)] if region.id == id
        ));
    }

    #[test]
    fn test_create_defaults() {
        let mut store = store();
        let id = circle(&mut store, Vec2::ZERO, 10.0);
        let region = store.get(id).unwrap();

        assert_eq!(region.opacity, 1.0);
        assert_eq!(region.layer, 0);
        assert_eq!(region.name, "Circle 1");
        assert!(!region.is_revealed());
    }

    #[test]
    fn test_create_clamps_option_opacity() {
        let mut store = store();
        let id = store
            .create(
                ShapeKind::Rectangle,
                &[Vec2::ZERO, Vec2::new(10.0, 10.0)],
                RegionOptions {
                    opacity: Some(-2.0),
                    ..default()
                },
            )
            .unwrap();
        assert_eq!(store.get(id).unwrap().opacity, 0.0);
    }

    #[test]
    fn test_remove_missing_returns_false() {
        let mut store = store();
        assert!(!store.remove(RegionId::new()));
        assert!(store.drain_events().is_empty());
    }

    #[test]
    fn test_remove_drops_from_index() {
        let mut store = store();
        let id = circle(&mut store, Vec2::ZERO, 10.0);
        store.drain_events();

        assert!(store.remove(id));
        assert!(store.get(id).is_none());
        assert!(store.query(Rect::new(-20.0, -20.0, 20.0, 20.0)).is_empty());
        assert_eq!(store.drain_events(), vec![FogEvent::RegionRemoved(id)]);
    }

    #[test]
    fn test_update_moves_index_entry() {
        let mut store = store();
        let id = circle(&mut store, Vec2::ZERO, 10.0);

        let moved = RegionShape::Circle {
            center: Vec2::new(500.0, 500.0),
            radius: 10.0,
        };
        assert!(store.update(id, RegionPatch::shape(moved)));

        assert!(store.query(Rect::new(-5.0, -5.0, 5.0, 5.0)).is_empty());
        assert_eq!(store.query(Rect::new(495.0, 495.0, 505.0, 505.0)).len(), 1);
    }

    #[test]
    fn test_update_rejects_invalid_shape() {
        let mut store = store();
        let id = circle(&mut store, Vec2::ZERO, 10.0);
        let bad = RegionShape::Polygon {
            points: vec![Vec2::ZERO],
        };
        assert!(!store.update(id, RegionPatch::shape(bad)));
        assert_eq!(store.get(id).unwrap().shape.kind(), ShapeKind::Circle);
    }

    #[test]
    fn test_update_missing_returns_false() {
        let mut store = store();
        assert!(!store.update(RegionId::new(), RegionPatch::default()));
    }

    #[test]
    fn test_reveal_twice_emits_once() {
        let mut store = store();
        let id = circle(&mut store, Vec2::ZERO, 10.0);
        store.drain_events();

        assert!(store.reveal(id));
        assert!(store.reveal(id));
        assert_eq!(store.drain_events(), vec![FogEvent::RegionRevealed(id)]);
        assert_eq!(store.get(id).unwrap().opacity, 0.0);
    }

    #[test]
    fn test_clear_reports_removed_ids() {
        let mut store = store();
        let a = circle(&mut store, Vec2::ZERO, 10.0);
        let b = circle(&mut store, Vec2::new(100.0, 0.0), 10.0);
        store.drain_events();

        let ids = store.clear();
        assert_eq!(ids, vec![a, b]);
        assert!(store.is_empty());
        assert!(store.index().is_empty());
        assert_eq!(store.drain_events(), vec![FogEvent::RegionsCleared(vec![a, b])]);
    }

    #[test]
    fn test_regions_at_is_topmost_first() {
        let mut store = store();
        let bottom = circle(&mut store, Vec2::ZERO, 50.0);
        let top = store
            .create(
                ShapeKind::Rectangle,
                &[Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0)],
                RegionOptions {
                    layer: Some(2),
                    ..default()
                },
            )
            .unwrap();
        let later = circle(&mut store, Vec2::new(5.0, 0.0), 20.0);

        let ids: Vec<_> = store.regions_at(Vec2::ZERO).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![top, later, bottom]);
        assert_eq!(store.topmost_at(Vec2::new(40.0, 0.0)), Some(bottom));
        assert_eq!(store.topmost_at(Vec2::new(500.0, 0.0)), None);
    }

    #[test]
    fn test_rebuild_after_threshold() {
        let mut store = RegionStore::new(IndexConfig {
            rebuild_after_removals: 2,
            max_objects: 1,
            ..default()
        });
        let ids: Vec<_> = (0..6)
            .map(|i| circle(&mut store, Vec2::new(i as f32 * 1000.0, 0.0), 5.0))
            .collect();
        let nodes_before = store.index().node_count();
        assert!(nodes_before > 1);

        for id in &ids[..5] {
            store.remove(*id);
        }
        // Four removals triggered two rebuilds; one more is pending
        assert_eq!(store.removals_since_rebuild, 1);
        assert_eq!(store.index().len(), 1);
        assert_eq!(store.query(Rect::new(4990.0, -5.0, 5010.0, 5.0)).len(), 1);
    }
}

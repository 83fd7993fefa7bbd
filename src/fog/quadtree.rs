//! Quadtree spatial index over region bounding boxes.
//!
//! The tree stores `(id, bounds)` pairs only; the region store owns the regions. Nodes
//! split lazily once they hold more than `max_objects` entries and are never merged
//! back. Entries are pushed to the smallest child whose bounds fully contain them, so
//! a region straddling a split line stays at the parent.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_QUADTREE_MAX_LEVEL, DEFAULT_QUADTREE_MAX_OBJECTS, DEFAULT_REBUILD_AFTER_REMOVALS,
    DEFAULT_WORLD_EXTENT,
};

use super::geometry::{bounds_contain, bounds_intersect};
use super::region::RegionId;

/// Tunables for the spatial index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Lower-left corner of the area covered by the root node
    pub world_min: Vec2,
    /// Upper-right corner of the area covered by the root node
    pub world_max: Vec2,
    pub max_level: u32,
    pub max_objects: usize,
    /// Rebuild the tree after this many removals, 0 = never
    pub rebuild_after_removals: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            world_min: Vec2::splat(-DEFAULT_WORLD_EXTENT),
            world_max: Vec2::splat(DEFAULT_WORLD_EXTENT),
            max_level: DEFAULT_QUADTREE_MAX_LEVEL,
            max_objects: DEFAULT_QUADTREE_MAX_OBJECTS,
            rebuild_after_removals: DEFAULT_REBUILD_AFTER_REMOVALS,
        }
    }
}

impl IndexConfig {
    pub fn world_bounds(&self) -> Rect {
        Rect::from_corners(self.world_min, self.world_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    id: RegionId,
    bounds: Rect,
}

#[derive(Debug)]
struct QuadNode {
    bounds: Rect,
    level: u32,
    entries: Vec<Entry>,
    children: Option<Box<[QuadNode; 4]>>,
}

impl QuadNode {
    fn new(bounds: Rect, level: u32) -> Self {
        Self {
            bounds,
            level,
            entries: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, entry: Entry, max_level: u32, max_objects: usize) {
        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children
                .iter_mut()
                .find(|child| bounds_contain(child.bounds, entry.bounds))
            {
                child.insert(entry, max_level, max_objects);
            } else {
                self.entries.push(entry);
            }
            return;
        }

        self.entries.push(entry);

        if self.entries.len() > max_objects && self.level < max_level {
            self.split(max_level, max_objects);
        }
    }

    /// Split into four equal quadrants and push down every entry that fits in one
    fn split(&mut self, max_level: u32, max_objects: usize) {
        let min = self.bounds.min;
        let max = self.bounds.max;
        let center = self.bounds.center();
        let level = self.level + 1;

        let mut children = Box::new([
            QuadNode::new(Rect::from_corners(min, center), level),
            QuadNode::new(
                Rect::from_corners(Vec2::new(center.x, min.y), Vec2::new(max.x, center.y)),
                level,
            ),
            QuadNode::new(
                Rect::from_corners(Vec2::new(min.x, center.y), Vec2::new(center.x, max.y)),
                level,
            ),
            QuadNode::new(Rect::from_corners(center, max), level),
        ]);

        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            if let Some(child) = children
                .iter_mut()
                .find(|child| bounds_contain(child.bounds, entry.bounds))
            {
                child.insert(entry, max_level, max_objects);
            } else {
                self.entries.push(entry);
            }
        }

        self.children = Some(children);
    }

    fn remove(&mut self, id: RegionId) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            self.entries.remove(pos);
            return true;
        }

        match self.children.as_mut() {
            Some(children) => children.iter_mut().any(|child| child.remove(id)),
            None => false,
        }
    }

    fn collect(&self, rect: Rect, out: &mut Vec<RegionId>) {
        out.extend(
            self.entries
                .iter()
                .filter(|e| bounds_intersect(e.bounds, rect))
                .map(|e| e.id),
        );

        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if bounds_intersect(child.bounds, rect) {
                    child.collect(rect, out);
                }
            }
        }
    }

    fn depth(&self) -> u32 {
        self.children
            .as_ref()
            .map(|children| children.iter().map(QuadNode::depth).max().unwrap_or(0) + 1)
            .unwrap_or(0)
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map(|children| children.iter().map(QuadNode::node_count).sum())
            .unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct QuadTree {
    root: QuadNode,
    max_level: u32,
    max_objects: usize,
    len: usize,
}

impl QuadTree {
    pub fn new(bounds: Rect, max_level: u32, max_objects: usize) -> Self {
        Self {
            root: QuadNode::new(bounds, 0),
            max_level,
            max_objects: max_objects.max(1),
            len: 0,
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(config.world_bounds(), config.max_level, config.max_objects)
    }

    pub fn insert(&mut self, id: RegionId, bounds: Rect) {
        self.root
            .insert(Entry { id, bounds }, self.max_level, self.max_objects);
        self.len += 1;
    }

    /// Remove the first entry with this id (depth-first). Empty nodes are kept.
    pub fn remove(&mut self, id: RegionId) -> bool {
        let removed = self.root.remove(id);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Ids of all entries whose bounds intersect `rect`.
    ///
    /// The root's own entries are always inspected, so regions outside the root bounds
    /// are still found.
    pub fn query(&self, rect: Rect) -> Vec<RegionId> {
        let mut out = Vec::new();
        self.root.collect(rect, &mut out);
        out
    }

    pub fn clear(&mut self) {
        self.root = QuadNode::new(self.root.bounds, 0);
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    /// Number of split levels below the root
    pub fn depth(&self) -> u32 {
        self.root.depth()
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

//! Fog region data model.
//!
//! A region is one shape marking part of the map as hidden or revealed. The shape is a
//! tagged union so geometry, rendering and drag handling all match exhaustively on it.

use std::fmt;

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::REVEALED_THRESHOLD;

use super::error::FogError;
use super::geometry;

/// Unique, stable identifier of a fog region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(Uuid);

impl RegionId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Polygon,
}

impl ShapeKind {
    /// Minimum number of input points needed to build this shape.
    ///
    /// Circle: center and a point on the edge. Rectangle: two opposite corners.
    pub fn min_points(&self) -> usize {
        match self {
            ShapeKind::Circle | ShapeKind::Rectangle => 2,
            ShapeKind::Polygon => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "Circle",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Shape geometry in world coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegionShape {
    Circle { center: Vec2, radius: f32 },
    Rectangle { top_left: Vec2, bottom_right: Vec2 },
    Polygon { points: Vec<Vec2> },
}

impl RegionShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            RegionShape::Circle { .. } => ShapeKind::Circle,
            RegionShape::Rectangle { .. } => ShapeKind::Rectangle,
            RegionShape::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Build a shape from raw input points.
    ///
    /// Circle uses the first point as center and the distance to the second as radius.
    /// Rectangle treats the first two points as opposite corners and normalizes them so
    /// `top_left` is the component-wise minimum.
    pub fn from_points(kind: ShapeKind, points: &[Vec2]) -> Result<Self, FogError> {
        let required = kind.min_points();
        if points.len() < required {
            return Err(FogError::InvalidGeometry {
                kind,
                required,
                got: points.len(),
            });
        }

        if points.iter().any(|p| !p.is_finite()) {
            return Err(FogError::NonFiniteGeometry { kind });
        }

        let shape = match kind {
            ShapeKind::Circle => RegionShape::Circle {
                center: points[0],
                radius: points[0].distance(points[1]),
            },
            ShapeKind::Rectangle => RegionShape::Rectangle {
                top_left: points[0].min(points[1]),
                bottom_right: points[0].max(points[1]),
            },
            ShapeKind::Polygon => RegionShape::Polygon {
                points: points.to_vec(),
            },
        };

        // Finite corners can still overflow the circle radius
        if !shape.is_valid() {
            return Err(FogError::NonFiniteGeometry { kind });
        }
        Ok(shape)
    }

    /// Same shape moved by `delta`
    pub fn translated(&self, delta: Vec2) -> Self {
        match self {
            RegionShape::Circle { center, radius } => RegionShape::Circle {
                center: *center + delta,
                radius: *radius,
            },
            RegionShape::Rectangle {
                top_left,
                bottom_right,
            } => RegionShape::Rectangle {
                top_left: *top_left + delta,
                bottom_right: *bottom_right + delta,
            },
            RegionShape::Polygon { points } => RegionShape::Polygon {
                points: points.iter().map(|p| *p + delta).collect(),
            },
        }
    }

    /// Check that the geometry is usable: finite coordinates, non-negative radius,
    /// ordered rectangle corners and at least three polygon vertices.
    pub fn is_valid(&self) -> bool {
        match self {
            RegionShape::Circle { center, radius } => {
                center.is_finite() && radius.is_finite() && *radius >= 0.0
            }
            RegionShape::Rectangle {
                top_left,
                bottom_right,
            } => {
                top_left.is_finite()
                    && bottom_right.is_finite()
                    && top_left.x <= bottom_right.x
                    && top_left.y <= bottom_right.y
            }
            RegionShape::Polygon { points } => {
                points.len() >= ShapeKind::Polygon.min_points()
                    && points.iter().all(|p| p.is_finite())
            }
        }
    }
}

/// A single fog region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogRegion {
    pub id: RegionId,
    pub name: String,
    pub shape: RegionShape,
    /// 0.0 = fully transparent fog (revealed), 1.0 = fully opaque (hidden)
    pub opacity: f32,
    /// Draw order, higher layers are drawn last and hit-tested first
    #[serde(default)]
    pub layer: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FogRegion {
    /// Whether players can see through this region.
    ///
    /// Derived from opacity so it can never drift from it.
    pub fn is_revealed(&self) -> bool {
        self.opacity < REVEALED_THRESHOLD
    }

    pub fn bounds(&self) -> Rect {
        geometry::bounds_of(&self.shape)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        geometry::point_in_region(point, &self.shape)
    }
}

/// Optional attributes for a newly created region
#[derive(Debug, Clone, Default)]
pub struct RegionOptions {
    pub name: Option<String>,
    pub opacity: Option<f32>,
    pub layer: Option<i32>,
}

/// Partial update of a region; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionPatch {
    pub name: Option<String>,
    pub shape: Option<RegionShape>,
    pub opacity: Option<f32>,
    pub layer: Option<i32>,
}

impl RegionPatch {
    pub fn shape(shape: RegionShape) -> Self {
        Self {
            shape: Some(shape),
            ..default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.shape.is_none() && self.opacity.is_none() && self.layer.is_none()
    }
}

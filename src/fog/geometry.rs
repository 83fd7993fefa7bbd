//! Geometry kernel: bounding boxes and point-in-shape tests.
//!
//! All functions are pure. Box tests are inclusive so a point on an edge counts as
//! inside, and two boxes sharing only an edge intersect.

use bevy::prelude::*;

use super::region::RegionShape;

/// Axis-aligned bounding box of a shape.
///
/// A polygon without vertices yields a zero-area box at the origin.
pub fn bounds_of(shape: &RegionShape) -> Rect {
    match shape {
        RegionShape::Circle { center, radius } => {
            Rect::from_center_half_size(*center, Vec2::splat(radius.abs()))
        }
        RegionShape::Rectangle {
            top_left,
            bottom_right,
        } => Rect::from_corners(*top_left, *bottom_right),
        RegionShape::Polygon { points } => {
            let Some(first) = points.first() else {
                return Rect::from_corners(Vec2::ZERO, Vec2::ZERO);
            };

            let mut min = *first;
            let mut max = *first;
            for &p in points {
                min = min.min(p);
                max = max.max(p);
            }
            Rect { min, max }
        }
    }
}

/// Whether `point` lies inside the shape
pub fn point_in_region(point: Vec2, shape: &RegionShape) -> bool {
    match shape {
        RegionShape::Circle { center, radius } => {
            point.distance_squared(*center) <= radius * radius
        }
        RegionShape::Rectangle {
            top_left,
            bottom_right,
        } => {
            point.x >= top_left.x
                && point.x <= bottom_right.x
                && point.y >= top_left.y
                && point.y <= bottom_right.y
        }
        RegionShape::Polygon { points } => point_in_polygon(point, points),
    }
}

/// Even-odd ray casting against the polygon edges
fn point_in_polygon(point: Vec2, points: &[Vec2]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn bounds_intersect(a: Rect, b: Rect) -> bool {
    a.min.x <= b.max.x && a.max.x >= b.min.x && a.min.y <= b.max.y && a.max.y >= b.min.y
}

/// Whether `inner` lies fully inside `outer` on all four sides.
///
/// Used for quadtree child placement: a box straddling a split line is contained by
/// neither child and stays at the parent.
pub fn bounds_contain(outer: Rect, inner: Rect) -> bool {
    inner.min.x >= outer.min.x
        && inner.max.x <= outer.max.x
        && inner.min.y >= outer.min.y
        && inner.max.y <= outer.max.y
}

/// Small box around a point, used to hit-test the quadtree
pub fn point_box(point: Vec2, size: f32) -> Rect {
    Rect::from_center_size(point, Vec2::splat(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> RegionShape {
        RegionShape::Polygon {
            points: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(10.0, 0.0),
                Vec2::new(10.0, 10.0),
                Vec2::new(0.0, 10.0),
            ],
        }
    }

    #[test]
    fn test_circle_bounds() {
        let bounds = bounds_of(&RegionShape::Circle {
            center: Vec2::new(100.0, 100.0),
            radius: 50.0,
        });
        assert_eq!(bounds.min, Vec2::new(50.0, 50.0));
        assert_eq!(bounds.max, Vec2::new(150.0, 150.0));
    }

    #[test]
    fn test_rectangle_bounds_are_corners() {
        let bounds = bounds_of(&RegionShape::Rectangle {
            top_left: Vec2::new(-5.0, 2.0),
            bottom_right: Vec2::new(7.0, 9.0),
        });
        assert_eq!(bounds.min, Vec2::new(-5.0, 2.0));
        assert_eq!(bounds.max, Vec2::new(7.0, 9.0));
    }

    #[test]
    fn test_polygon_bounds() {
        let bounds = bounds_of(&RegionShape::Polygon {
            points: vec![Vec2::new(3.0, -1.0), Vec2::new(-2.0, 4.0), Vec2::new(8.0, 2.0)],
        });
        assert_eq!(bounds.min, Vec2::new(-2.0, -1.0));
        assert_eq!(bounds.max, Vec2::new(8.0, 4.0));
    }

    #[test]
    fn test_empty_polygon_bounds_are_degenerate() {
        let bounds = bounds_of(&RegionShape::Polygon { points: vec![] });
        assert_eq!(bounds.width(), 0.0);
        assert_eq!(bounds.height(), 0.0);
    }

    #[test]
    fn test_point_in_circle_is_inclusive() {
        let circle = RegionShape::Circle {
            center: Vec2::ZERO,
            radius: 5.0,
        };
        assert!(point_in_region(Vec2::new(5.0, 0.0), &circle));
        assert!(point_in_region(Vec2::new(3.0, 4.0), &circle));
        assert!(!point_in_region(Vec2::new(4.0, 4.0), &circle));
    }

    #[test]
    fn test_point_in_rectangle_is_inclusive() {
        let rect = RegionShape::Rectangle {
            top_left: Vec2::ZERO,
            bottom_right: Vec2::new(10.0, 5.0),
        };
        assert!(point_in_region(Vec2::new(10.0, 5.0), &rect));
        assert!(point_in_region(Vec2::new(0.0, 0.0), &rect));
        assert!(!point_in_region(Vec2::new(10.1, 2.0), &rect));
    }

    #[test]
    fn test_point_in_polygon() {
        let shape = square();
        assert!(point_in_region(Vec2::new(5.0, 5.0), &shape));
        assert!(!point_in_region(Vec2::new(15.0, 5.0), &shape));
        assert!(!point_in_region(Vec2::new(-1.0, 5.0), &shape));
    }

    #[test]
    fn test_point_in_concave_polygon_uses_even_odd() {
        // U shape: the notch between the arms is outside
        let shape = RegionShape::Polygon {
            points: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(30.0, 0.0),
                Vec2::new(30.0, 30.0),
                Vec2::new(20.0, 30.0),
                Vec2::new(20.0, 10.0),
                Vec2::new(10.0, 10.0),
                Vec2::new(10.0, 30.0),
                Vec2::new(0.0, 30.0),
            ],
        };
        assert!(point_in_region(Vec2::new(5.0, 20.0), &shape));
        assert!(point_in_region(Vec2::new(25.0, 20.0), &shape));
        assert!(!point_in_region(Vec2::new(15.0, 20.0), &shape));
        assert!(point_in_region(Vec2::new(15.0, 5.0), &shape));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let shape = RegionShape::Polygon {
            points: vec![Vec2::ZERO, Vec2::new(10.0, 10.0)],
        };
        assert!(!point_in_region(Vec2::new(5.0, 5.0), &shape));
    }

    #[test]
    fn test_bounds_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds_intersect(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(bounds_intersect(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!bounds_intersect(a, Rect::new(10.5, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_bounds_contain() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds_contain(outer, Rect::new(2.0, 2.0, 8.0, 8.0)));
        assert!(bounds_contain(outer, outer));
        assert!(!bounds_contain(outer, Rect::new(5.0, 5.0, 11.0, 8.0)));
    }
}

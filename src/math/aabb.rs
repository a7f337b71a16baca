//! Axis-aligned bounding box.
//!
//! All tests assume `min <= max` on both axes. Nothing enforces it; a box
//! built with swapped corners silently answers containment and overlap
//! queries wrong.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_scalars(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// Box spanning two arbitrary corners, normalized to proper min/max.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.max - self.min) * 0.5 + self.min
    }

    /// Full size of the box (not the half extent).
    pub fn extent(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn translate(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Component-wise scale of both corners around the origin.
    pub fn scale(&self, scale: Vec2) -> Self {
        Self {
            min: self.min * scale,
            max: self.max * scale,
        }
    }

    /// Point containment, edges inclusive.
    pub fn inside(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Overlap test. Touching edges count as overlapping.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// True when `inner` lies entirely inside `self`.
    pub fn contains(&self, inner: &Aabb) -> bool {
        self.inside(inner.min) && self.inside(inner.max)
    }

    /// Closest point of the box to `p` (per-axis clamp).
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let x = if self.min.x > p.x {
            self.min.x
        } else if self.max.x < p.x {
            self.max.x
        } else {
            p.x
        };
        let y = if self.min.y > p.y {
            self.min.y
        } else if self.max.y < p.y {
            self.max.y
        } else {
            p.y
        };
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    fn unit() -> Aabb {
        Aabb::from_scalars(-1.0, -1.0, 1.0, 1.0)
    }

    #[test]
    fn test_center_and_extent() {
        let b = Aabb::from_scalars(2.0, 4.0, 6.0, 10.0);
        assert!(vec_approx_eq(b.center(), Vec2::new(4.0, 7.0)));
        assert!(vec_approx_eq(b.extent(), Vec2::new(4.0, 6.0)));
    }

    #[test]
    fn test_from_corners_normalizes() {
        let b = Aabb::from_corners(Vec2::new(1.0, -2.0), Vec2::new(-1.0, 2.0));
        assert_eq!(b, Aabb::from_scalars(-1.0, -2.0, 1.0, 2.0));
    }

    #[test]
    fn test_translate_and_scale() {
        let b = unit().translate(Vec2::new(2.0, 0.5));
        assert!(vec_approx_eq(b.min, Vec2::new(1.0, -0.5)));
        assert!(vec_approx_eq(b.max, Vec2::new(3.0, 1.5)));

        let s = unit().scale(Vec2::new(0.5, 3.0));
        assert!(vec_approx_eq(s.min, Vec2::new(-0.5, -3.0)));
        assert!(vec_approx_eq(s.max, Vec2::new(0.5, 3.0)));
    }

    #[test]
    fn test_inside_is_inclusive() {
        let b = unit();
        assert!(b.inside(Vec2::ZERO));
        assert!(b.inside(Vec2::new(1.0, 1.0)));
        assert!(b.inside(Vec2::new(-1.0, 0.3)));
        assert!(!b.inside(Vec2::new(1.01, 0.0)));
        assert!(!b.inside(Vec2::new(0.0, -1.5)));
    }

    #[test]
    fn test_intersects_partial_overlap() {
        let a = unit();
        let b = unit().translate(Vec2::new(1.5, 1.5));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_cross_shape_without_corner_inside() {
        // A wide flat box crossing a tall thin one: no corner of either lies
        // inside the other, yet they overlap.
        let wide = Aabb::from_scalars(-2.0, -0.1, 2.0, 0.1);
        let tall = Aabb::from_scalars(-0.1, -2.0, 0.1, 2.0);
        assert!(wide.intersects(&tall));
        assert!(tall.intersects(&wide));
    }

    #[test]
    fn test_intersects_disjoint() {
        let a = unit();
        let b = unit().translate(Vec2::new(2.5, 0.0));
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_contains() {
        let outer = unit();
        let inner = Aabb::from_scalars(-0.5, -0.5, 0.5, 0.5);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_closest_point_clamps_per_axis() {
        let b = unit();
        assert!(vec_approx_eq(b.closest_point(Vec2::new(3.0, 0.2)), Vec2::new(1.0, 0.2)));
        assert!(vec_approx_eq(b.closest_point(Vec2::new(-4.0, -4.0)), Vec2::new(-1.0, -1.0)));
        assert!(vec_approx_eq(b.closest_point(Vec2::new(0.1, 0.2)), Vec2::new(0.1, 0.2)));
    }
}

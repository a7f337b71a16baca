//! Built-in collision responders.
//!
//! Three approximate responses for the two shapes the engine knows, quads
//! (the entity's AABB) and ellipses (the ellipse inscribed in the entity):
//!
//! - [`BoxBox`] – swept-AABB time of impact, reflect the contact axis only
//! - [`BoxEllipse`] – closest point on the quad, reflect about the normal
//! - [`EllipseEllipse`] – center to center normal, reflect about it
//!
//! None of these is an exact elastic solver. They backtrack each body along
//! its old velocity by an estimated contact time and push it out along the
//! reflected velocity, which is enough for arcade play. Degenerate input
//! (zero normal, bodies at rest, parallel motion) yields a contact time
//! outside `(0, dt]` and the pair is left alone for the frame.
//!
//! All responders write the corrected positions back into the entities'
//! world matrices.

use glam::Vec2;
use log::{trace, warn};

use crate::components::collision::CollisionResponder;
use crate::components::simbody::SimBody;
use crate::math::Aabb;
use crate::resources::scene::EntityStore;

/// Quad against quad.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxBox;

/// Quad against ellipse. Register the quad's id first.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxEllipse;

/// Ellipse against ellipse.
#[derive(Debug, Clone, Copy, Default)]
pub struct EllipseEllipse;

impl CollisionResponder for BoxBox {
    fn resolve(&self, store: &mut dyn EntityStore, a: &mut SimBody, b: &mut SimBody, dt: f32) {
        resolve_box_box(store, a, b, dt);
    }
}

impl CollisionResponder for BoxEllipse {
    fn resolve(&self, store: &mut dyn EntityStore, a: &mut SimBody, b: &mut SimBody, dt: f32) {
        resolve_box_ellipse(store, a, b, dt);
    }
}

impl CollisionResponder for EllipseEllipse {
    fn resolve(&self, store: &mut dyn EntityStore, a: &mut SimBody, b: &mut SimBody, dt: f32) {
        resolve_ellipse_ellipse(store, a, b, dt);
    }
}

fn write_back(store: &mut dyn EntityStore, body: &SimBody) {
    if !store.set_position(body.entity_id(), body.pos) {
        warn!(
            "Collision response: entity {} missing, position not written back",
            body.entity_id()
        );
    }
}

/// Facing corners of two boxes, per axis, picked from the relative velocity
/// `a - b`. Along an axis where `a` gains on `b` in `+`, `a` leads with its
/// max side into `b`'s min side; otherwise the reverse.
fn facing_corners(aabb_a: &Aabb, aabb_b: &Aabb, relative: Vec2) -> (Vec2, Vec2) {
    let axis = |rel: f32, a_min: f32, a_max: f32, b_min: f32, b_max: f32| {
        if rel > 0.0 { (a_max, b_min) } else { (a_min, b_max) }
    };
    let (ax, bx) = axis(relative.x, aabb_a.min.x, aabb_a.max.x, aabb_b.min.x, aabb_b.max.x);
    let (ay, by) = axis(relative.y, aabb_a.min.y, aabb_a.max.y, aabb_b.min.y, aabb_b.max.y);
    (Vec2::new(ax, ay), Vec2::new(bx, by))
}

/// How long ago, along one axis, the two leading corners coincided.
///
/// `closing` is the difference of the inverse velocities. Zero when the
/// corners never met on this axis or met outside the last `dt` seconds.
fn axis_contact_time(corner_a: f32, corner_b: f32, closing: f32, dt: f32) -> f32 {
    if closing == 0.0 {
        return 0.0;
    }
    let t = (corner_b - corner_a) / closing;
    if t > 0.0 && t <= dt { t } else { 0.0 }
}

/// Swept-AABB bounce between two quads.
///
/// Each axis gets its own contact time from the corners facing each other. When both
/// axes report contact, only the earlier contact (the larger backtrack) is
/// kept; on a tie the y axis wins. The winning axis has its velocity
/// component negated on both bodies, then both bodies move by twice the
/// contact time along their new velocity: back out of the overlap and as
/// far again the other way.
///
/// Axes are decoupled, so a corner-on hit that touches both axes in the same
/// instant reflects only one of them.
pub fn resolve_box_box(store: &mut dyn EntityStore, a: &mut SimBody, b: &mut SimBody, dt: f32) {
    let (Some(aabb_a), Some(aabb_b)) = (store.aabb(a.entity_id()), store.aabb(b.entity_id()))
    else {
        return;
    };

    let (corner_a, corner_b) = facing_corners(&aabb_a, &aabb_b, a.velocity - b.velocity);
    let inv_a = -a.velocity;
    let inv_b = -b.velocity;
    let closing = inv_a - inv_b;

    let mut t_x = axis_contact_time(corner_a.x, corner_b.x, closing.x, dt);
    let mut t_y = axis_contact_time(corner_a.y, corner_b.y, closing.y, dt);
    if t_x != 0.0 && t_y != 0.0 {
        if t_x > t_y {
            t_y = 0.0;
        } else {
            t_x = 0.0;
        }
    }
    let t = if t_x > 0.0 { t_x } else { t_y };
    if t == 0.0 {
        return;
    }
    trace!(
        "box-box: entities {} and {} touched {}s ago (x: {}, y: {})",
        a.entity_id(),
        b.entity_id(),
        t,
        t_x,
        t_y
    );

    let reflect = |velocity: Vec2, inverse: Vec2| {
        Vec2::new(
            if t_x != 0.0 { inverse.x } else { velocity.x },
            if t_y != 0.0 { inverse.y } else { velocity.y },
        )
    };
    a.velocity = reflect(a.velocity, inv_a);
    b.velocity = reflect(b.velocity, inv_b);

    a.pos += a.velocity * (t * 2.0);
    b.pos += b.velocity * (t * 2.0);

    write_back(store, a);
    write_back(store, b);
}

/// Radius of an ellipse with semi-axes `radii` in the direction `normal`.
///
/// The normal's raw y component stands in for the angle between the normal
/// and the x axis, so the result is exact for horizontal normals and an
/// approximation elsewhere. It always lies between the smaller and larger
/// semi-axis.
pub fn radius_along_normal(radii: Vec2, normal: Vec2) -> f32 {
    let (sin, cos) = normal.y.sin_cos();
    (cos * cos * radii.x * radii.x + sin * sin * radii.y * radii.y).sqrt()
}

/// Shared tail of both ellipse responses.
///
/// `normal` points from `a` toward `b`, unnormalized. `radius` is the
/// relevant ellipse's radius along it.
fn reflect_about_normal(
    store: &mut dyn EntityStore,
    a: &mut SimBody,
    b: &mut SimBody,
    normal: Vec2,
    radii: Vec2,
    dt: f32,
) {
    let unit = normal.normalize_or_zero();
    let radius = radius_along_normal(radii, unit);

    // Sum of the velocities, not their difference.
    let combined = a.velocity + b.velocity;
    let t = radius * normal.length() / combined.length();
    if !(t > 0.0 && t <= dt) {
        return;
    }
    trace!(
        "ellipse response: entities {} and {} touched {}s ago",
        a.entity_id(),
        b.entity_id(),
        t
    );

    let old_a = a.velocity;
    let old_b = b.velocity;

    a.velocity += unit * (2.0 * a.velocity.dot(unit));
    b.velocity -= unit * (2.0 * b.velocity.dot(unit));

    a.pos += old_a * t;
    b.pos += old_b * t;
    a.pos += a.velocity * t;
    b.pos += b.velocity * t;

    write_back(store, a);
    write_back(store, b);
}

/// Bounce an ellipse off a quad.
///
/// The normal runs from the point of the quad's AABB closest to the
/// ellipse's center, to that center.
pub fn resolve_box_ellipse(
    store: &mut dyn EntityStore,
    quad: &mut SimBody,
    ellipse: &mut SimBody,
    dt: f32,
) {
    let Some(quad_aabb) = store.aabb(quad.entity_id()) else {
        return;
    };
    let Some(ellipse_entity) = store.entity(ellipse.entity_id()) else {
        return;
    };
    let radii = ellipse_entity.ellipse_radii();
    let center = ellipse_entity.aabb().center();

    let closest = quad_aabb.closest_point(center);
    reflect_about_normal(store, quad, ellipse, center - closest, radii, dt);
}

/// Bounce two ellipses off each other along the line between their centers.
/// The contact time uses the first ellipse's radius.
pub fn resolve_ellipse_ellipse(
    store: &mut dyn EntityStore,
    a: &mut SimBody,
    b: &mut SimBody,
    dt: f32,
) {
    let (Some(entity_a), Some(entity_b)) = (store.entity(a.entity_id()), store.entity(b.entity_id()))
    else {
        return;
    };
    let radii_a = entity_a.ellipse_radii();
    let normal = entity_b.aabb().center() - entity_a.aabb().center();
    reflect_about_normal(store, a, b, normal, radii_a, dt);
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_facing_corners_follow_relative_velocity() {
        let a = Aabb::from_scalars(-1.0, -2.0, 1.0, 2.0);
        let b = Aabb::from_scalars(0.0, 0.0, 3.0, 3.0);
        // a gains on b in +x and -y.
        let (ca, cb) = facing_corners(&a, &b, Vec2::new(1.0, -1.0));
        assert_eq!(ca, Vec2::new(1.0, -2.0));
        assert_eq!(cb, Vec2::new(0.0, 3.0));
        // b moving while a rests: only the relative velocity matters.
        let (a_vel, b_vel) = (Vec2::ZERO, Vec2::new(-1.0, 1.0));
        let (ca, cb) = facing_corners(&a, &b, a_vel - b_vel);
        assert_eq!(ca, Vec2::new(1.0, -2.0));
        assert_eq!(cb, Vec2::new(0.0, 3.0));
    }

    #[test]
    fn test_axis_contact_time_window() {
        // Corners 0.1 apart, closing at 1 unit/s: met 0.1 s ago.
        assert!((axis_contact_time(0.05, -0.05, -1.0, 0.2) - 0.1).abs() < EPSILON);
        // Same, with the bodies in the other order.
        assert!((axis_contact_time(-0.05, 0.05, 1.0, 0.2) - 0.1).abs() < EPSILON);
        // Contact before this frame.
        assert_eq!(axis_contact_time(0.05, -0.05, -1.0, 0.05), 0.0);
        // Contact exactly one frame ago still counts.
        assert!((axis_contact_time(0.05, -0.05, -1.0, 0.1) - 0.1).abs() < EPSILON);
        // In the future.
        assert_eq!(axis_contact_time(-0.05, 0.05, -1.0, 0.2), 0.0);
        // No relative motion.
        assert_eq!(axis_contact_time(0.05, -0.05, 0.0, 0.2), 0.0);
    }

    #[test]
    fn test_radius_along_horizontal_normal_is_x_radius() {
        let r = radius_along_normal(Vec2::new(0.3, 0.1), Vec2::X);
        assert!((r - 0.3).abs() < EPSILON);
    }

    #[test]
    fn test_radius_along_normal_circle_is_constant() {
        for i in 0..16 {
            let angle = i as f32 * std::f32::consts::TAU / 16.0;
            let n = Vec2::from_angle(angle);
            assert!((radius_along_normal(Vec2::splat(0.05), n) - 0.05).abs() < EPSILON);
        }
    }
}

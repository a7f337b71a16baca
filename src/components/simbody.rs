//! Simulated body state.
//!
//! A [`SimBody`] mirrors one scene entity inside the simulator. It keeps its
//! own position, which is authoritative: the scene's world matrix is
//! overwritten from it every update. All bodies are unit mass, so forces are
//! accelerations in scene units per second squared.
//!
//! Forces are append-only. There is no removal: a caller keeps the
//! [`ForceHandle`] returned when adding a force and zeroes the force through
//! it to switch it off. Force slots never move, so handles stay valid for the
//! simulator's lifetime.

use glam::Vec2;
use smallvec::SmallVec;

use crate::components::entity::EntityId;

/// Index-stable handle to a body inside a simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to one force slot of one body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ForceHandle {
    pub(crate) body: BodyHandle,
    pub(crate) slot: usize,
}

impl ForceHandle {
    pub fn body(self) -> BodyHandle {
        self.body
    }

    pub fn slot(self) -> usize {
        self.slot
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimBody {
    entity_id: EntityId,
    /// Simulated position, authoritative over the entity's translation.
    pub pos: Vec2,
    /// Velocity in scene units per second.
    pub velocity: Vec2,
    forces: SmallVec<[Vec2; 4]>,
}

impl SimBody {
    pub fn new(entity_id: EntityId, pos: Vec2, velocity: Vec2) -> Self {
        Self {
            entity_id,
            pos,
            velocity,
            forces: SmallVec::new(),
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn forces(&self) -> &[Vec2] {
        &self.forces
    }

    /// Append a force and return its slot.
    pub fn push_force(&mut self, force: Vec2) -> usize {
        self.forces.push(force);
        self.forces.len() - 1
    }

    pub fn force(&self, slot: usize) -> Option<&Vec2> {
        self.forces.get(slot)
    }

    pub fn force_mut(&mut self, slot: usize) -> Option<&mut Vec2> {
        self.forces.get_mut(slot)
    }

    /// Sum of all force slots, zeroed ones included.
    pub fn total_force(&self) -> Vec2 {
        self.forces.iter().copied().sum()
    }

    /// `velocity += force * dt` for each force, in slot order.
    pub fn integrate_forces(&mut self, dt: f32) {
        for force in &self.forces {
            self.velocity += *force * dt;
        }
    }

    /// `pos += velocity * dt`.
    pub fn integrate_motion(&mut self, dt: f32) {
        self.pos += self.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    #[test]
    fn test_new_has_no_forces() {
        let body = SimBody::new(3, Vec2::new(1.0, 2.0), Vec2::new(0.5, 0.0));
        assert_eq!(body.entity_id(), 3);
        assert!(body.forces().is_empty());
        assert!(vec_approx_eq(body.total_force(), Vec2::ZERO));
    }

    #[test]
    fn test_push_force_slots_are_stable() {
        let mut body = SimBody::new(0, Vec2::ZERO, Vec2::ZERO);
        let gravity = body.push_force(Vec2::new(0.0, -3.0));
        let wind = body.push_force(Vec2::new(1.0, 0.0));
        // Spill past the inline capacity; earlier slots keep their index.
        for _ in 0..8 {
            body.push_force(Vec2::ZERO);
        }
        assert_eq!(gravity, 0);
        assert_eq!(wind, 1);
        assert!(vec_approx_eq(*body.force(gravity).unwrap(), Vec2::new(0.0, -3.0)));
        assert!(vec_approx_eq(*body.force(wind).unwrap(), Vec2::new(1.0, 0.0)));
        assert!(body.force(42).is_none());
    }

    #[test]
    fn test_zeroing_a_force_switches_it_off() {
        let mut body = SimBody::new(0, Vec2::ZERO, Vec2::ZERO);
        let gravity = body.push_force(Vec2::new(0.0, -3.0));
        body.push_force(Vec2::new(1.0, 0.0));
        *body.force_mut(gravity).unwrap() = Vec2::ZERO;
        assert_eq!(body.forces().len(), 2);
        assert!(vec_approx_eq(body.total_force(), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_integrate_forces_then_motion() {
        let mut body = SimBody::new(0, Vec2::new(1.0, 1.0), Vec2::ZERO);
        body.push_force(Vec2::new(2.0, 0.0));
        body.push_force(Vec2::new(0.0, -4.0));
        body.integrate_forces(0.5);
        assert!(vec_approx_eq(body.velocity, Vec2::new(1.0, -2.0)));
        body.integrate_motion(0.5);
        assert!(vec_approx_eq(body.pos, Vec2::new(1.5, 0.0)));
    }
}

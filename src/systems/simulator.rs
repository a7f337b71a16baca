//! Discrete collision-and-response simulator.
//!
//! The [`Simulator`] owns one [`SimBody`] per registered scene entity and a
//! map of pair-keyed collision responders. Each update runs four phases in
//! order:
//!
//! 1. integrate forces into velocities,
//! 2. integrate velocities into positions,
//! 3. write every position back into its entity's world matrix,
//! 4. test every unordered pair of bodies for AABB overlap and hand
//!    overlapping pairs with a registered responder to that responder.
//!
//! Pair testing is brute force, `O(n²)` in the body count. That is fine for
//! the tens of bodies an arcade game uses and nothing more.
//!
//! Bodies are never removed. The registry only grows, so a [`BodyHandle`]
//! (and a [`ForceHandle`] into a body's force list) stays valid for the
//! simulator's whole lifetime.
//!
//! # Programmer errors
//!
//! Adding a body for an entity the store does not know, or forces/impulses
//! for an entity without a body, trips a debug assertion. Release builds log
//! the error and return `None` / do nothing so the frame can continue.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use log::{debug, error, trace, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::collision::{CollisionPair, CollisionResponder, CollisionRule};
use crate::components::entity::EntityId;
use crate::components::simbody::{BodyHandle, ForceHandle, SimBody};
use crate::math::matrix::set_translation;
use crate::resources::clock::{Clock, MonotonicClock};
use crate::resources::scene::EntityStore;

/// Entity store shared between the host and the simulator.
pub type SharedStore = Rc<RefCell<dyn EntityStore>>;

/// Position and velocity of one body, as reported to hosts and logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub entity_id: EntityId,
    pub pos: Vec2,
    pub velocity: Vec2,
}

pub struct Simulator {
    store: SharedStore,
    bodies: Vec<SimBody>,
    rules: FxHashMap<CollisionPair, CollisionRule>,
    clock: Box<dyn Clock>,
    /// Clock reading at the previous update, in microseconds.
    last_time: u64,
}

/// Trip the debug assertion, or log in release builds.
fn report_programmer_error(message: &str) {
    debug_assert!(false, "{}", message);
    error!("{}", message);
}

fn programmer_error<T>(message: String) -> Option<T> {
    report_programmer_error(&message);
    None
}

/// Borrow two distinct bodies mutably, in the requested order.
fn pair_mut(bodies: &mut [SimBody], first: usize, second: usize) -> (&mut SimBody, &mut SimBody) {
    if first < second {
        let (head, tail) = bodies.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = bodies.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

impl Simulator {
    /// Create a simulator over `store`, driven by the wall clock.
    ///
    /// `last_time` starts at zero rather than at the current reading, so the
    /// first [`update`](Self::update) integrates over everything the clock
    /// has counted since it started. Hosts that create the simulator long
    /// before the first frame see a matching jump on that frame.
    pub fn new(store: SharedStore) -> Self {
        Self::with_clock(store, Box::new(MonotonicClock::new()))
    }

    pub fn with_clock(store: SharedStore, clock: Box<dyn Clock>) -> Self {
        Self {
            store,
            bodies: Vec::new(),
            rules: FxHashMap::default(),
            clock,
            last_time: 0,
        }
    }

    /// Release the registry, the responder map and the clock.
    pub fn destroy(self) {
        debug!(
            "Simulator: destroying {} bodies and {} collision rules",
            self.bodies.len(),
            self.rules.len()
        );
    }

    /// The store this simulator reads geometry from and writes positions to.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    fn index_of(&self, entity_id: EntityId) -> Option<usize> {
        self.bodies
            .iter()
            .position(|body| body.entity_id() == entity_id)
    }

    /// Add a body for `entity_id`, or update its velocity if it exists.
    ///
    /// A new body starts at the entity's current translation with an empty
    /// force list.
    pub fn add_body(&mut self, entity_id: EntityId, start_velocity: Vec2) -> Option<BodyHandle> {
        if let Some(index) = self.index_of(entity_id) {
            self.bodies[index].velocity = start_velocity;
            debug!("Simulator: updated velocity of body for entity {}", entity_id);
            return Some(BodyHandle(index));
        }

        let pos = match self.store.borrow().entity(entity_id) {
            Some(entity) => entity.position(),
            None => {
                return programmer_error(format!(
                    "Attempted to add a body for an unknown entity {}",
                    entity_id
                ));
            }
        };

        self.bodies
            .push(SimBody::new(entity_id, pos, start_velocity));
        debug!(
            "Simulator: added body for entity {} at ({}, {})",
            entity_id, pos.x, pos.y
        );
        Some(BodyHandle(self.bodies.len() - 1))
    }

    /// Append a force to the body of `entity_id`.
    ///
    /// The returned handle addresses the stored copy. There is no removal;
    /// set the force to zero through [`set_force`](Self::set_force) or
    /// [`force_mut`](Self::force_mut) to switch it off.
    pub fn add_force(&mut self, entity_id: EntityId, force: Vec2) -> Option<ForceHandle> {
        let Some(index) = self.index_of(entity_id) else {
            return programmer_error(format!(
                "Attempted to add force to an unknown entity {}",
                entity_id
            ));
        };
        let slot = self.bodies[index].push_force(force);
        Some(ForceHandle {
            body: BodyHandle(index),
            slot,
        })
    }

    /// Add `impulse` straight to the body's velocity.
    pub fn add_impulse(&mut self, entity_id: EntityId, impulse: Vec2) {
        match self.index_of(entity_id) {
            Some(index) => self.bodies[index].velocity += impulse,
            None => report_programmer_error(&format!(
                "Attempted to add impulse to an unknown entity {}",
                entity_id
            )),
        }
    }

    /// Register `responder` for the unordered pair `(id_a, id_b)`.
    ///
    /// Replaces any responder already registered for the pair. The responder
    /// receives the bodies in `(id_a, id_b)` order.
    pub fn add_collision_callback(
        &mut self,
        id_a: EntityId,
        id_b: EntityId,
        responder: impl CollisionResponder + 'static,
    ) {
        self.add_collision_rule(id_a, id_b, Rc::new(responder));
    }

    /// Like [`add_collision_callback`](Self::add_collision_callback), for a
    /// responder shared between several pairs.
    pub fn add_collision_rule(
        &mut self,
        id_a: EntityId,
        id_b: EntityId,
        responder: Rc<dyn CollisionResponder>,
    ) {
        let pair = CollisionPair::new(id_a, id_b);
        if self
            .rules
            .insert(pair, CollisionRule::new(id_a, responder))
            .is_some()
        {
            debug!("Simulator: replaced collision rule for {:?}", pair);
        } else {
            debug!("Simulator: added collision rule for {:?}", pair);
        }
    }

    /// Responder registered for the pair, whatever the argument order.
    pub fn collision_responder(
        &self,
        id_a: EntityId,
        id_b: EntityId,
    ) -> Option<Rc<dyn CollisionResponder>> {
        self.rules
            .get(&CollisionPair::new(id_a, id_b))
            .map(|rule| Rc::clone(&rule.responder))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> &[SimBody] {
        &self.bodies
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&SimBody> {
        self.bodies.get(handle.0)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut SimBody> {
        self.bodies.get_mut(handle.0)
    }

    pub fn body_for_entity(&self, entity_id: EntityId) -> Option<BodyHandle> {
        self.index_of(entity_id).map(BodyHandle)
    }

    pub fn force(&self, handle: ForceHandle) -> Option<Vec2> {
        self.body(handle.body)?.force(handle.slot).copied()
    }

    pub fn force_mut(&mut self, handle: ForceHandle) -> Option<&mut Vec2> {
        self.body_mut(handle.body)?.force_mut(handle.slot)
    }

    /// Overwrite a force in place. Returns false for a stale handle.
    pub fn set_force(&mut self, handle: ForceHandle, value: Vec2) -> bool {
        match self.force_mut(handle) {
            Some(force) => {
                *force = value;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .map(|body| BodySnapshot {
                entity_id: body.entity_id(),
                pos: body.pos,
                velocity: body.velocity,
            })
            .collect()
    }

    /// Advance by the wall-clock time elapsed since the previous update.
    ///
    /// Returns the step length used, in seconds.
    pub fn update(&mut self) -> f32 {
        let now = self.clock.micros();
        let dt = (now.saturating_sub(self.last_time) as f64 / 1_000_000.0) as f32;
        self.last_time = now;
        self.step(dt);
        dt
    }

    /// Run the four update phases with an explicit step of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        for body in &mut self.bodies {
            body.integrate_forces(dt);
        }
        for body in &mut self.bodies {
            body.integrate_motion(dt);
        }
        self.write_back();
        self.resolve_pairs(dt);
    }

    fn write_back(&mut self) {
        let mut store = self.store.borrow_mut();
        for body in &self.bodies {
            match store.entity_mut(body.entity_id()) {
                Some(entity) => set_translation(&mut entity.world_matrix, body.pos),
                None => warn!(
                    "Simulator: entity {} vanished from the store, skipping write-back",
                    body.entity_id()
                ),
            }
        }
    }

    fn resolve_pairs(&mut self, dt: f32) {
        let mut store = self.store.borrow_mut();
        let count = self.bodies.len();
        for i in 0..count {
            let id_i = self.bodies[i].entity_id();
            for j in (i + 1)..count {
                // Both boxes are read per pair: an earlier responder may have
                // moved either body this phase.
                let Some(aabb_i) = store.aabb(id_i) else {
                    break;
                };
                let id_j = self.bodies[j].entity_id();
                let Some(aabb_j) = store.aabb(id_j) else {
                    continue;
                };
                if !aabb_i.intersects(&aabb_j) {
                    continue;
                }
                let pair = CollisionPair::new(id_i, id_j);
                let Some(rule) = self.rules.get(&pair) else {
                    continue;
                };
                trace!("Simulator: resolving overlap {:?}", pair);
                let (first, second) = if rule.first == id_i { (i, j) } else { (j, i) };
                let (a, b) = pair_mut(&mut self.bodies, first, second);
                rule.responder.resolve(&mut *store, a, b, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::collision::responder_fn;
    use crate::components::entity::SceneEntity;
    use crate::resources::clock::ManualClock;
    use crate::resources::scene::Scene;

    const EPSILON: f32 = 1e-5;

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    fn setup() -> (Rc<RefCell<Scene>>, Simulator) {
        let scene = Rc::new(RefCell::new(Scene::new()));
        let sim = Simulator::new(scene.clone());
        (scene, sim)
    }

    fn spawn_quad(scene: &Rc<RefCell<Scene>>, x: f32, y: f32) -> EntityId {
        scene.borrow_mut().spawn(
            0,
            SceneEntity::new().with_transform(Vec2::new(x, y), Vec2::splat(0.05), 0.0),
        )
    }

    #[test]
    fn test_pair_mut_order() {
        let mut bodies = vec![
            SimBody::new(0, Vec2::ZERO, Vec2::ZERO),
            SimBody::new(1, Vec2::ZERO, Vec2::ZERO),
            SimBody::new(2, Vec2::ZERO, Vec2::ZERO),
        ];
        let (a, b) = pair_mut(&mut bodies, 2, 0);
        assert_eq!((a.entity_id(), b.entity_id()), (2, 0));
        let (a, b) = pair_mut(&mut bodies, 0, 1);
        assert_eq!((a.entity_id(), b.entity_id()), (0, 1));
    }

    #[test]
    fn test_add_body_starts_at_entity_translation() {
        let (scene, mut sim) = setup();
        let id = spawn_quad(&scene, 0.25, -0.5);
        let handle = sim.add_body(id, Vec2::new(1.0, 0.0)).unwrap();
        let body = sim.body(handle).unwrap();
        assert_eq!(body.entity_id(), id);
        assert!(vec_approx_eq(body.pos, Vec2::new(0.25, -0.5)));
        assert!(vec_approx_eq(body.velocity, Vec2::new(1.0, 0.0)));
        assert!(body.forces().is_empty());
    }

    #[test]
    fn test_add_body_twice_updates_velocity() {
        let (scene, mut sim) = setup();
        let id = spawn_quad(&scene, 0.0, 0.0);
        let first = sim.add_body(id, Vec2::new(1.0, 0.0)).unwrap();
        let second = sim.add_body(id, Vec2::new(0.0, 2.0)).unwrap();
        assert_eq!(first, second);
        assert_eq!(sim.body_count(), 1);
        assert!(vec_approx_eq(sim.body(first).unwrap().velocity, Vec2::new(0.0, 2.0)));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "unknown entity"))]
    fn test_add_body_unknown_entity() {
        let (_scene, mut sim) = setup();
        assert!(sim.add_body(42, Vec2::ZERO).is_none());
        assert_eq!(sim.body_count(), 0);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "unknown entity"))]
    fn test_add_force_without_body() {
        let (scene, mut sim) = setup();
        let id = spawn_quad(&scene, 0.0, 0.0);
        assert!(sim.add_force(id, Vec2::new(0.0, -1.0)).is_none());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "unknown entity"))]
    fn test_add_impulse_without_body() {
        let (_scene, mut sim) = setup();
        sim.add_impulse(3, Vec2::ONE);
    }

    #[test]
    fn test_add_impulse_changes_velocity_immediately() {
        let (scene, mut sim) = setup();
        let id = spawn_quad(&scene, 0.0, 0.0);
        let handle = sim.add_body(id, Vec2::new(1.0, 0.0)).unwrap();
        sim.add_impulse(id, Vec2::new(0.5, 2.0));
        assert!(vec_approx_eq(sim.body(handle).unwrap().velocity, Vec2::new(1.5, 2.0)));
    }

    #[test]
    fn test_force_handle_toggle() {
        let (scene, mut sim) = setup();
        let id = spawn_quad(&scene, 0.0, 0.0);
        sim.add_body(id, Vec2::ZERO);
        let gravity = sim.add_force(id, Vec2::new(0.0, -3.0)).unwrap();
        let wind = sim.add_force(id, Vec2::new(1.0, 0.0)).unwrap();
        assert_ne!(gravity, wind);
        assert!(sim.set_force(gravity, Vec2::ZERO));
        assert_eq!(sim.force(gravity), Some(Vec2::ZERO));
        assert_eq!(sim.force(wind), Some(Vec2::new(1.0, 0.0)));

        sim.step(1.0);
        let body = sim.body(gravity.body()).unwrap();
        assert!(vec_approx_eq(body.velocity, Vec2::new(1.0, 0.0)));
        assert_eq!(body.forces().len(), 2);
    }

    #[test]
    fn test_handles_survive_registry_growth() {
        let (scene, mut sim) = setup();
        let first_id = spawn_quad(&scene, 0.0, 0.0);
        let first = sim.add_body(first_id, Vec2::ZERO).unwrap();
        let force = sim.add_force(first_id, Vec2::new(0.0, 1.0)).unwrap();
        for i in 0..32 {
            let id = spawn_quad(&scene, i as f32, 5.0);
            sim.add_body(id, Vec2::ZERO);
        }
        assert_eq!(sim.body(first).unwrap().entity_id(), first_id);
        assert_eq!(sim.force(force), Some(Vec2::new(0.0, 1.0)));
        assert_eq!(sim.body_for_entity(first_id), Some(first));
    }

    #[test]
    fn test_update_uses_clock_delta_and_first_frame_counts_from_zero() {
        let scene = Rc::new(RefCell::new(Scene::new()));
        let clock = ManualClock::new();
        let mut sim = Simulator::with_clock(scene.clone(), Box::new(clock.clone()));
        let id = spawn_quad(&scene, 0.0, 0.0);
        let handle = sim.add_body(id, Vec2::new(1.0, 0.0)).unwrap();

        // The clock ran for 2 s before the first frame: the whole span is
        // integrated in one step.
        clock.set(2_000_000);
        let dt = sim.update();
        assert!((dt - 2.0).abs() < EPSILON);
        assert!(vec_approx_eq(sim.body(handle).unwrap().pos, Vec2::new(2.0, 0.0)));

        clock.advance(250_000);
        let dt = sim.update();
        assert!((dt - 0.25).abs() < EPSILON);
        assert!(vec_approx_eq(sim.body(handle).unwrap().pos, Vec2::new(2.25, 0.0)));

        // No time passed: nothing moves.
        assert_eq!(sim.update(), 0.0);
        assert!(vec_approx_eq(sim.body(handle).unwrap().pos, Vec2::new(2.25, 0.0)));
    }

    #[test]
    fn test_step_writes_positions_back() {
        let (scene, mut sim) = setup();
        let id = spawn_quad(&scene, 0.0, 0.0);
        sim.add_body(id, Vec2::new(0.0, -1.0));
        sim.step(0.5);
        let pos = scene.borrow().get(id).unwrap().position();
        assert!(vec_approx_eq(pos, Vec2::new(0.0, -0.5)));
    }

    #[test]
    fn test_responder_receives_registration_order() {
        let (scene, mut sim) = setup();
        let low = spawn_quad(&scene, 0.0, 0.0);
        let high = spawn_quad(&scene, 0.02, 0.0);
        sim.add_body(low, Vec2::ZERO);
        sim.add_body(high, Vec2::ZERO);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        sim.add_collision_callback(
            high,
            low,
            responder_fn(move |_store, a, b, _dt| {
                log.borrow_mut().push((a.entity_id(), b.entity_id()));
            }),
        );
        sim.step(0.01);
        assert_eq!(*seen.borrow(), vec![(high, low)]);
    }

    #[test]
    fn test_reregistering_pair_overwrites() {
        let (scene, mut sim) = setup();
        let a = spawn_quad(&scene, 0.0, 0.0);
        let b = spawn_quad(&scene, 0.0, 0.0);
        sim.add_body(a, Vec2::ZERO);
        sim.add_body(b, Vec2::ZERO);

        let hits = Rc::new(RefCell::new((0, 0)));
        let h1 = hits.clone();
        sim.add_collision_callback(a, b, responder_fn(move |_, _, _, _| h1.borrow_mut().0 += 1));
        let h2 = hits.clone();
        sim.add_collision_callback(b, a, responder_fn(move |_, _, _, _| h2.borrow_mut().1 += 1));
        assert_eq!(sim.rule_count(), 1);

        sim.step(0.01);
        assert_eq!(*hits.borrow(), (0, 1));
    }

    #[test]
    fn test_despawned_entity_is_skipped() {
        let (scene, mut sim) = setup();
        let a = spawn_quad(&scene, 0.0, 0.0);
        let b = spawn_quad(&scene, 0.0, 0.0);
        sim.add_body(a, Vec2::ZERO);
        sim.add_body(b, Vec2::new(1.0, 0.0));
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        sim.add_collision_callback(a, b, responder_fn(move |_, _, _, _| *h.borrow_mut() += 1));

        scene.borrow_mut().despawn(b);
        sim.step(0.1);
        assert_eq!(*hits.borrow(), 0);
        // The body itself keeps integrating.
        let handle = sim.body_for_entity(b).unwrap();
        assert!(vec_approx_eq(sim.body(handle).unwrap().pos, Vec2::new(0.1, 0.0)));
    }

    #[test]
    fn test_snapshot() {
        let (scene, mut sim) = setup();
        let id = spawn_quad(&scene, 0.5, 0.5);
        sim.add_body(id, Vec2::new(0.0, 1.0));
        let snap = sim.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].entity_id, id);
        assert!(vec_approx_eq(snap[0].pos, Vec2::new(0.5, 0.5)));
        assert!(vec_approx_eq(snap[0].velocity, Vec2::new(0.0, 1.0)));
    }
}

//! Collision pair keys and the responder interface.
//!
//! The simulator keeps at most one [`CollisionRule`] per unordered pair of
//! entity ids. Overlapping pairs without a rule are ignored: only collisions
//! the caller registered get resolved.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::components::entity::EntityId;
use crate::components::simbody::SimBody;
use crate::resources::scene::EntityStore;

/// Unordered pair of entity ids, stored as `(min, max)`.
///
/// Construction is the only way in, so lookup and insertion always agree on
/// the canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollisionPair {
    lo: EntityId,
    hi: EntityId,
}

impl CollisionPair {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    pub fn lo(&self) -> EntityId {
        self.lo
    }

    pub fn hi(&self) -> EntityId {
        self.hi
    }

    /// Both ids packed into one word. Injective for the full `u32` range.
    pub fn packed(&self) -> u64 {
        (u64::from(self.lo) << 32) | u64::from(self.hi)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.lo == id || self.hi == id
    }
}

impl Hash for CollisionPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.packed());
    }
}

/// Resolves one overlapping pair of bodies.
///
/// Called during the pairwise phase of an update with the bodies in the
/// order their ids were passed at registration. A responder that moves a
/// body must write the new position into the entity's world matrix itself;
/// the simulator does not sync again after this phase.
///
/// The simulator holds the shared store mutably borrowed for the whole
/// pairwise phase. Reach entities through the `store` argument only: a
/// responder that borrows its own clone of the `Rc<RefCell<..>>` store
/// panics with `BorrowMutError`.
pub trait CollisionResponder {
    fn resolve(&self, store: &mut dyn EntityStore, a: &mut SimBody, b: &mut SimBody, dt: f32);
}

/// Adapter turning a closure into a [`CollisionResponder`].
pub struct ResponderFn<F>(F);

/// Wrap a closure as a responder. The bound here lets closure argument
/// types be inferred at the call site.
pub fn responder_fn<F>(f: F) -> ResponderFn<F>
where
    F: Fn(&mut dyn EntityStore, &mut SimBody, &mut SimBody, f32),
{
    ResponderFn(f)
}

impl<F> CollisionResponder for ResponderFn<F>
where
    F: Fn(&mut dyn EntityStore, &mut SimBody, &mut SimBody, f32),
{
    fn resolve(&self, store: &mut dyn EntityStore, a: &mut SimBody, b: &mut SimBody, dt: f32) {
        (self.0)(store, a, b, dt)
    }
}

/// A registered responder together with the id that was passed first.
#[derive(Clone)]
pub struct CollisionRule {
    pub first: EntityId,
    pub responder: Rc<dyn CollisionResponder>,
}

impl CollisionRule {
    pub fn new(first: EntityId, responder: Rc<dyn CollisionResponder>) -> Self {
        Self { first, responder }
    }
}

impl fmt::Debug for CollisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionRule")
            .field("first", &self.first)
            .finish_non_exhaustive()
    }
}

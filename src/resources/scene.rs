//! Scene entity storage.
//!
//! [`Scene`] owns the renderable entities, each one an ECS entity carrying a
//! [`SceneEntity`] and a [`Layer`]. Entities are addressed by stable `u32`
//! ids handed out on spawn; the id-to-ECS mapping lives in an `FxHashMap`.
//!
//! The simulator never sees `Scene` directly. It works against the
//! [`EntityStore`] trait, so any store that can look entities up by id can
//! back a simulation.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;
use rustc_hash::FxHashMap;

use crate::components::entity::{EntityId, Layer, SceneEntity};
use crate::math::Aabb;

/// Id-addressed access to scene entities.
pub trait EntityStore {
    fn entity(&self, id: EntityId) -> Option<&SceneEntity>;
    fn entity_mut(&mut self, id: EntityId) -> Option<&mut SceneEntity>;

    /// World-space AABB of the entity, if it exists.
    fn aabb(&self, id: EntityId) -> Option<Aabb> {
        self.entity(id).map(SceneEntity::aabb)
    }

    /// Overwrite the entity's translation. Returns false for unknown ids.
    fn set_position(&mut self, id: EntityId, pos: Vec2) -> bool {
        match self.entity_mut(id) {
            Some(entity) => {
                entity.set_position(pos);
                true
            }
            None => false,
        }
    }
}

pub struct Scene {
    world: World,
    ids: FxHashMap<EntityId, Entity>,
    next_id: EntityId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            ids: FxHashMap::default(),
            next_id: 0,
        }
    }

    /// Add an entity on the given layer and return its id.
    ///
    /// The entity's `id` field is overwritten with the assigned id.
    pub fn spawn(&mut self, layer: u32, mut entity: SceneEntity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        let ecs_entity = self.world.spawn((entity, Layer(layer))).id();
        self.ids.insert(id, ecs_entity);
        debug!("Scene: spawned entity {} on layer {}", id, layer);
        id
    }

    /// Remove an entity. Returns false if the id is unknown.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(ecs_entity) = self.ids.remove(&id) else {
            return false;
        };
        self.world.despawn(ecs_entity);
        debug!("Scene: despawned entity {}", id);
        true
    }

    pub fn get(&self, id: EntityId) -> Option<&SceneEntity> {
        let ecs_entity = *self.ids.get(&id)?;
        self.world.get::<SceneEntity>(ecs_entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SceneEntity> {
        let ecs_entity = *self.ids.get(&id)?;
        self.world
            .get_mut::<SceneEntity>(ecs_entity)
            .map(|entity| entity.into_inner())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn layer_of(&self, id: EntityId) -> Option<u32> {
        let ecs_entity = *self.ids.get(&id)?;
        self.world.get::<Layer>(ecs_entity).map(|layer| layer.0)
    }

    /// Visible entity ids on a layer, in draw order.
    pub fn ids_in_layer(&mut self, layer: u32) -> Vec<EntityId> {
        let mut query = self.world.query::<(&SceneEntity, &Layer)>();
        let mut found: Vec<&SceneEntity> = query
            .iter(&self.world)
            .filter(|(entity, l)| l.0 == layer && !entity.hidden)
            .map(|(entity, _)| entity)
            .collect();
        found.sort_by(|a, b| a.render_order(b).then(a.id.cmp(&b.id)));
        found.iter().map(|entity| entity.id).collect()
    }
}

impl EntityStore for Scene {
    fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.get(id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut SceneEntity> {
        self.get_mut(id)
    }
}

//! Depth-sorted entity storage with deferred add/remove
//!
//! Additions and removals never touch the active list directly. They are
//! queued in [`PendingEntities`] and applied by [`EntityList::update_lists`],
//! which the scene calls once at the start of every frame.

use std::collections::{HashMap, HashSet};

use crate::debug::{DebugColors, RenderTarget};
use crate::ecs::component_list::{Broadcast, LockMode};
use crate::ecs::context::{RenderServices, SceneAccess, SceneServices};
use crate::ecs::entity::{Entity, EntityId, EntityKind};
use crate::ecs::pool::Pooler;
use crate::foundation::math::Rect;

/// Queued changes to an entity list plus the set of active IDs
#[derive(Debug, Default)]
pub struct PendingEntities {
    lock: LockMode,
    to_add: Vec<Entity>,
    to_remove: Vec<EntityId>,
    adding: HashSet<EntityId>,
    removing: HashSet<EntityId>,
    current: HashSet<EntityId>,
    unsorted: bool,
}

impl PendingEntities {
    /// Whether an add of `id` would be accepted
    pub fn accepts(&self, id: EntityId) -> bool {
        !self.current.contains(&id) && !self.adding.contains(&id)
    }

    /// Whether `id` waits to be added
    pub fn is_adding(&self, id: EntityId) -> bool {
        self.adding.contains(&id)
    }

    /// Whether `id` waits to be removed
    pub fn is_removing(&self, id: EntityId) -> bool {
        self.removing.contains(&id)
    }

    /// Number of queued additions
    pub fn additions(&self) -> usize {
        self.to_add.len()
    }

    /// Number of queued removals
    pub fn removals(&self) -> usize {
        self.to_remove.len()
    }

    pub(crate) fn add(&mut self, entity: Entity) -> bool {
        if self.lock == LockMode::Error {
            panic!("cannot add entity {} while the entity list is rendering", entity.id());
        }
        let id = entity.id();
        if !self.accepts(id) {
            return false;
        }
        self.adding.insert(id);
        self.to_add.push(entity);
        true
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        if self.lock == LockMode::Error {
            panic!("cannot remove entity {id} while the entity list is rendering");
        }
        if !self.current.contains(&id) || !self.removing.insert(id) {
            return false;
        }
        self.to_remove.push(id);
        true
    }

    pub(crate) fn mark_unsorted(&mut self) {
        self.unsorted = true;
    }
}

/// Active entities of a scene, kept sorted by descending actual depth
#[derive(Debug, Default)]
pub struct EntityList {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    pub(crate) pending: PendingEntities,
}

impl EntityList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is active
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Queued work
    pub fn pending(&self) -> &PendingEntities {
        &self.pending
    }

    /// Whether `id` is active
    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Active entity by ID
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&index| &self.entities[index])
    }

    /// Active entities, deepest first
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Position of each active entity in iteration order
    pub fn order(&self) -> &HashMap<EntityId, usize> {
        &self.index
    }

    /// First active entity named `name`
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name() == name)
    }

    /// First active entity of `kind`
    pub fn find_first(&self, kind: EntityKind) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.kind() == kind)
    }

    /// Append the IDs of every active entity of `kind` to `out`
    pub fn find_all(&self, kind: EntityKind, out: &mut Vec<EntityId>) {
        out.extend(
            self.entities
                .iter()
                .filter(|entity| entity.kind() == kind)
                .map(Entity::id),
        );
    }

    /// Number of active entities of `kind`
    pub fn amount_of(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|entity| entity.kind() == kind).count()
    }

    /// Visit every active entity of `kind`
    pub fn with(&self, kind: EntityKind, mut f: impl FnMut(&Entity)) {
        for entity in self.entities.iter().filter(|entity| entity.kind() == kind) {
            f(entity);
        }
    }

    /// Apply queued removals, then additions, re-sort if needed, and wake the
    /// entities that arrived in this flush
    ///
    /// An entity's added hook never sees colliders or tags of entities removed
    /// in the same flush.
    pub(crate) fn update_lists(&mut self, services: &mut SceneServices, pooler: &mut Pooler) {
        let additions = std::mem::take(&mut self.pending.to_add);
        let removals = std::mem::take(&mut self.pending.to_remove);
        if additions.is_empty() && removals.is_empty() && !self.pending.unsorted {
            return;
        }

        for id in removals {
            self.pending.removing.remove(&id);
            if !self.pending.current.remove(&id) {
                continue;
            }
            let Some(index) = self.entities.iter().position(|entity| entity.id() == id) else {
                continue;
            };
            let mut entity = self.entities.remove(index);
            services.tags.entity_removed(id, entity.tag());
            entity.core.scene = None;
            entity.broadcast(
                Broadcast::EntityRemoved,
                Some(SceneAccess { entities: &mut self.pending, services: &mut *services }),
            );
            pooler.give_back(entity);
            log::trace!("entity {id} removed from scene");
        }

        let mut awakened = Vec::with_capacity(additions.len());
        for mut entity in additions {
            let id = entity.id();
            self.pending.adding.remove(&id);
            if !self.pending.current.insert(id) {
                continue;
            }
            entity.core.scene = Some(services.id);
            services.tags.entity_added(id, entity.tag());
            self.entities.push(entity);
            self.pending.unsorted = true;
            awakened.push(id);

            if let Some(entity) = self.entities.last_mut() {
                entity.broadcast(
                    Broadcast::EntityAdded,
                    Some(SceneAccess { entities: &mut self.pending, services: &mut *services }),
                );
            }
            log::trace!("entity {id} added to scene");
        }

        if self.pending.unsorted {
            self.entities
                .sort_unstable_by(|a, b| b.core.actual_depth.cmp(&a.core.actual_depth));
            self.pending.unsorted = false;
        }
        self.reindex();

        for id in awakened {
            if let Some(&index) = self.index.get(&id) {
                self.entities[index].broadcast(
                    Broadcast::EntityAwake,
                    Some(SceneAccess { entities: &mut self.pending, services: &mut *services }),
                );
            }
        }
    }

    fn reindex(&mut self) {
        self.index.clear();
        self.index
            .extend(self.entities.iter().enumerate().map(|(index, entity)| (entity.id(), index)));
    }

    /// Update every enabled entity in order
    pub(crate) fn update(&mut self, services: &mut SceneServices) {
        self.broadcast_where(Broadcast::Update, services, |entity| entity.enabled());
    }

    pub(crate) fn broadcast_where(
        &mut self,
        event: Broadcast,
        services: &mut SceneServices,
        filter: impl Fn(&Entity) -> bool,
    ) {
        for entity in &mut self.entities {
            if filter(entity) {
                entity.broadcast(
                    event,
                    Some(SceneAccess { entities: &mut self.pending, services: &mut *services }),
                );
            }
        }
    }

    /// Borrow one active entity together with the rest of the scene
    pub(crate) fn with_entity<R>(
        &mut self,
        id: EntityId,
        services: &mut SceneServices,
        f: impl FnOnce(&mut Entity, SceneAccess<'_>) -> R,
    ) -> Option<R> {
        let index = *self.index.get(&id)?;
        Some(f(
            &mut self.entities[index],
            SceneAccess { entities: &mut self.pending, services },
        ))
    }

    /// Draw visible entities; the list is in [`LockMode::Error`] meanwhile
    pub(crate) fn render(
        &mut self,
        services: &SceneServices,
        colors: &DebugColors,
        target: &mut dyn RenderTarget,
        camera_bounds: Rect,
        debug: bool,
    ) {
        self.pending.lock = LockMode::Error;
        for entity in &mut self.entities {
            if !debug && !entity.core.visible {
                continue;
            }
            entity.components.render(
                &entity.core,
                RenderServices {
                    entities: Some(&mut self.pending),
                    physics: Some(&services.physics),
                    colors,
                },
                &mut *target,
                camera_bounds,
                debug,
            );
        }
        self.pending.lock = LockMode::Open;
    }

    /// Detach every entity, running removal hooks; queued additions are dropped
    pub(crate) fn remove_all(&mut self, services: &mut SceneServices, pooler: &mut Pooler) {
        for mut entity in std::mem::take(&mut self.entities) {
            services.tags.entity_removed(entity.id(), entity.tag());
            entity.core.scene = None;
            entity.broadcast(
                Broadcast::EntityRemoved,
                Some(SceneAccess { entities: &mut self.pending, services: &mut *services }),
            );
            pooler.give_back(entity);
        }
        self.pending.current.clear();
        self.pending.to_add.clear();
        self.pending.adding.clear();
        self.pending.to_remove.clear();
        self.pending.removing.clear();
        self.index.clear();
    }
}

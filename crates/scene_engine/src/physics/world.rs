//! Physics world: collider storage, broadphase and trigger dispatch
//!
//! Collider data lives here rather than inside the `Collider` component, keyed
//! by a [`ColliderHandle`]. A mover can then query every other collider in
//! the scene while its own entity is mutably borrowed.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::core::PhysicsConfig;
use crate::ecs::EntityId;
use crate::foundation::collections::ListPool;
use crate::foundation::math::{Rect, Vec2};
use crate::physics::collider::ColliderDesc;
use crate::physics::collision::{sat, CollisionResult, Shape, WorldShape};
use crate::physics::trigger::SharedListener;
use crate::spatial::{SpatialHash, SpatialIndex};

new_key_type! {
    /// Handle of a collider registered with [`Physics`]
    pub struct ColliderHandle;
}

/// A registered collider
pub struct ColliderRecord {
    entity: EntityId,
    desc: ColliderDesc,
    position: Vec2,
    bounds: Rect,
    listener: Option<SharedListener>,
}

impl ColliderRecord {
    /// Owning entity
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Local-space shape
    pub fn shape(&self) -> &Shape {
        &self.desc.shape
    }

    /// Registration parameters
    pub fn desc(&self) -> &ColliderDesc {
        &self.desc
    }

    /// Whether the collider only reports overlaps
    pub fn is_trigger(&self) -> bool {
        self.desc.is_trigger
    }

    /// Layer bits this collider lives on
    pub fn physics_layer(&self) -> u32 {
        self.desc.physics_layer
    }

    /// Layers this collider queries against
    pub fn collides_with_layers(&self) -> u32 {
        self.desc.collides_with_layers
    }

    /// Owning entity's position as of the last sync
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// World center of the shape
    pub fn center(&self) -> Vec2 {
        self.position + self.desc.local_offset
    }

    /// World bounds
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether a trigger listener is attached
    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Trigger listener, shared with the owning collider
    pub fn listener(&self) -> Option<&SharedListener> {
        self.listener.as_ref()
    }

    /// World-space shape
    pub fn world_shape(&self) -> WorldShape<'_> {
        self.desc.shape.at(self.center())
    }

    fn sync(&mut self, position: Vec2) {
        self.position = position;
        self.bounds = self.desc.shape.bounds_at(self.center());
    }
}

impl std::fmt::Debug for ColliderRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColliderRecord")
            .field("entity", &self.entity)
            .field("desc", &self.desc)
            .field("bounds", &self.bounds)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

/// Collider store with a pluggable broadphase
#[derive(Debug)]
pub struct Physics {
    colliders: SlotMap<ColliderHandle, ColliderRecord>,
    by_entity: HashMap<EntityId, Vec<ColliderHandle>>,
    index: Box<dyn SpatialIndex>,
    lists: ListPool<ColliderHandle>,
}

impl Physics {
    /// Create a world backed by a spatial hash
    pub fn new(config: &PhysicsConfig) -> Self {
        Self::with_index(Box::new(SpatialHash::new(config.cell_size)))
    }

    /// Create a world backed by a custom index
    pub fn with_index(index: Box<dyn SpatialIndex>) -> Self {
        Self {
            colliders: SlotMap::with_key(),
            by_entity: HashMap::new(),
            index,
            lists: ListPool::default(),
        }
    }

    /// The broadphase index
    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    /// Number of registered colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether no collider is registered
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Registered collider by handle
    pub fn get(&self, handle: ColliderHandle) -> Option<&ColliderRecord> {
        self.colliders.get(handle)
    }

    /// Every registered collider
    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &ColliderRecord)> {
        self.colliders.iter()
    }

    /// Colliders registered for `entity`, in registration order
    pub fn colliders_of(&self, entity: EntityId) -> &[ColliderHandle] {
        self.by_entity.get(&entity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `entity` has any registered collider
    pub fn has_colliders(&self, entity: EntityId) -> bool {
        !self.colliders_of(entity).is_empty()
    }

    /// Register a collider for `entity` at `position`
    pub fn register(
        &mut self,
        entity: EntityId,
        position: Vec2,
        desc: ColliderDesc,
        listener: Option<SharedListener>,
    ) -> ColliderHandle {
        let mut record = ColliderRecord {
            entity,
            desc,
            position,
            bounds: Rect::default(),
            listener,
        };
        record.sync(position);
        let (bounds, layer) = (record.bounds, record.physics_layer());

        let handle = self.colliders.insert(record);
        self.index.insert(handle, bounds, layer);
        self.by_entity.entry(entity).or_default().push(handle);
        log::trace!("registered collider {handle:?} for entity {entity}");
        handle
    }

    /// Remove a collider, handing back its record
    pub fn unregister(&mut self, handle: ColliderHandle) -> Option<ColliderRecord> {
        let record = self.colliders.remove(handle)?;
        self.index.remove(handle);
        if let Some(handles) = self.by_entity.get_mut(&record.entity) {
            handles.retain(|&other| other != handle);
            if handles.is_empty() {
                self.by_entity.remove(&record.entity);
            }
        }
        log::trace!("unregistered collider {handle:?}");
        Some(record)
    }

    /// Move every collider of `entity` to its new position
    pub fn entity_moved(&mut self, entity: EntityId, position: Vec2) {
        let Some(handles) = self.by_entity.get(&entity) else {
            return;
        };
        for &handle in handles {
            if let Some(record) = self.colliders.get_mut(handle) {
                record.sync(position);
                self.index.update(handle, record.bounds, record.physics_layer());
            }
        }
    }

    /// Borrow an empty scratch list
    pub fn obtain_list(&mut self) -> Vec<ColliderHandle> {
        self.lists.obtain()
    }

    /// Hand a scratch list back
    pub fn free_list(&mut self, list: Vec<ColliderHandle>) {
        self.lists.free(list);
    }

    /// Colliders on `layer_mask` whose bounds intersect `bounds`; the list is
    /// pooled and should go back through [`Self::free_list`]
    pub fn boxcast_broadphase(&mut self, bounds: &Rect, layer_mask: u32) -> Vec<ColliderHandle> {
        let mut out = self.lists.obtain();
        self.index.query(bounds, layer_mask, &mut out);
        out
    }

    /// Like [`Self::boxcast_broadphase`], skipping every collider of `entity`
    pub fn boxcast_broadphase_excluding(
        &mut self,
        entity: EntityId,
        bounds: &Rect,
        layer_mask: u32,
    ) -> Vec<ColliderHandle> {
        let mut out = self.boxcast_broadphase(bounds, layer_mask);
        out.retain(|&handle| self.colliders.get(handle).is_some_and(|record| record.entity != entity));
        out
    }

    /// Whether the two colliders overlap where they stand
    pub fn overlaps(&self, a: ColliderHandle, b: ColliderHandle) -> bool {
        match (self.colliders.get(a), self.colliders.get(b)) {
            (Some(a), Some(b)) => sat::overlaps(&a.world_shape(), &b.world_shape()),
            _ => false,
        }
    }

    /// Whether `a`, moved by `motion`, hits `b`
    pub fn collides_with(&self, a: ColliderHandle, b: ColliderHandle, motion: Vec2) -> Option<CollisionResult> {
        let (record_a, record_b) = (self.colliders.get(a)?, self.colliders.get(b)?);
        let moved = record_a.world_shape().translated(motion);
        sat::collide(&moved, &record_b.world_shape()).map(|mtv| CollisionResult::hit(b, mtv))
    }

    /// Drop every collider
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.by_entity.clear();
        self.index.clear();
    }
}

//! Reuse pool for detached entities, keyed by kind

use std::collections::{HashMap, VecDeque};

use crate::ecs::entity::{Entity, EntityKind, IdSequence};

/// Per-kind queues of detached entities waiting for reuse
///
/// Only kinds registered with [`Pooler::register`] are kept; everything else
/// handed back is dropped. A recycled entity always gets a fresh ID.
#[derive(Debug)]
pub struct Pooler {
    pools: HashMap<EntityKind, VecDeque<Entity>>,
    capacity: usize,
}

impl Pooler {
    /// Create a pooler keeping at most `capacity` entities per kind
    pub fn new(capacity: usize) -> Self {
        Self { pools: HashMap::new(), capacity }
    }

    /// Start pooling `kind`
    pub fn register(&mut self, kind: EntityKind) {
        self.pools.entry(kind).or_default();
    }

    /// Whether `kind` is pooled
    pub fn is_pooled(&self, kind: EntityKind) -> bool {
        self.pools.contains_key(&kind)
    }

    /// Entities of `kind` waiting for reuse
    pub fn available(&self, kind: EntityKind) -> usize {
        self.pools.get(&kind).map_or(0, VecDeque::len)
    }

    /// Reuse a pooled entity of `kind`, or build a new one
    pub fn create(&mut self, kind: EntityKind, name: impl Into<String>, ids: &IdSequence) -> Entity {
        match self.pools.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(mut entity) => {
                entity.core.name = name.into();
                log::trace!("reusing pooled entity {}", entity.id());
                entity
            }
            None => Entity::new(name, ids).with_kind(kind),
        }
    }

    /// Take back a detached entity; it is reset under a fresh ID when its
    /// kind is pooled and the queue has room, otherwise dropped
    pub fn give_back(&mut self, mut entity: Entity) {
        match self.pools.get_mut(&entity.kind()) {
            Some(queue) if queue.len() < self.capacity => {
                entity.recycle();
                queue.push_back(entity);
            }
            _ => {}
        }
    }

    /// Drop every pooled entity
    pub fn clear(&mut self) {
        for queue in self.pools.values_mut() {
            queue.clear();
        }
    }
}

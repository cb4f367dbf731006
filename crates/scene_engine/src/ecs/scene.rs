//! Scene - the frame driver
//!
//! A [`Scene`] owns the entity list together with every per-scene service
//! (tag index, depth ordering, physics world, entity pool) and steps them once
//! per frame:
//!
//! 1. [`Scene::before_update`] advances the clocks and flushes queued entity
//!    additions and removals.
//! 2. [`Scene::update`] updates every enabled entity in depth order.
//! 3. [`Scene::after_update`] runs end-of-frame callbacks.
//!
//! Rendering is a separate pass ([`Scene::render`]) during which any
//! structural change is rejected.

use crate::core::config::EngineConfig;
use crate::debug::{DebugColors, RenderTarget};
use crate::ecs::component::{Component, ComponentId};
use crate::ecs::component_list::Broadcast;
use crate::ecs::context::{ComponentContext, SceneAccess, SceneServices};
use crate::ecs::depth::DepthOrdering;
use crate::ecs::entity::{Entity, EntityId, EntityKind, IdSequence, SceneId};
use crate::ecs::entity_list::EntityList;
use crate::ecs::pool::Pooler;
use crate::ecs::tags::{BitTag, TagError, TagLists, TagRegistry};
use crate::engine::EngineError;
use crate::foundation::collections::ListPool;
use crate::foundation::math::Rect;
use crate::physics::Physics;

type EndOfFrame = Box<dyn FnOnce(&mut Scene)>;

/// A world of entities stepped frame by frame
pub struct Scene {
    entities: EntityList,
    services: SceneServices,
    tag_registry: TagRegistry,
    pooler: Pooler,
    ids: IdSequence,
    id_lists: ListPool<EntityId>,
    debug_render: bool,
    debug_colors: DebugColors,
    paused: bool,
    time_active: f32,
    raw_time_active: f32,
    end_of_frame: Vec<EndOfFrame>,
}

impl Scene {
    /// Create a scene with its own ID sequence
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_ids(config, IdSequence::new())
    }

    /// Create a scene drawing entity, component and scene IDs from `ids`
    pub fn with_ids(config: &EngineConfig, ids: IdSequence) -> Result<Self, EngineError> {
        config.validate()?;

        let mut tag_registry = TagRegistry::new();
        for name in &config.scene.tags {
            tag_registry.register(name)?;
        }

        let services = SceneServices {
            id: ids.next_scene(),
            physics: Physics::new(&config.physics),
            tags: TagLists::new(),
            depth: DepthOrdering::new(config.scene.depth_epsilon),
            delta_time: 0.0,
        };
        log::debug!(
            "scene {} created with {} tag(s), cell size {}",
            services.id.id(),
            tag_registry.len(),
            config.physics.cell_size
        );

        Ok(Self {
            entities: EntityList::new(),
            services,
            tag_registry,
            pooler: Pooler::new(config.scene.pool_capacity),
            ids,
            id_lists: ListPool::new(config.scene.list_pool_capacity),
            debug_render: config.scene.debug_render,
            debug_colors: config.debug.colors.clone(),
            paused: false,
            time_active: 0.0,
            raw_time_active: 0.0,
            end_of_frame: Vec::new(),
        })
    }

    /// Scene ID
    pub fn id(&self) -> SceneId {
        self.services.id
    }

    /// ID source shared by everything this scene creates
    pub fn ids(&self) -> &IdSequence {
        &self.ids
    }

    // ===== Lifecycle =====

    /// Tell every active entity the scene has started
    pub fn begin(&mut self) {
        log::info!("scene {} begins with {} entities", self.services.id.id(), self.entities.len());
        self.entities
            .broadcast_where(Broadcast::SceneBegin, &mut self.services, |_| true);
    }

    /// Tell every entity the scene is ending, then detach them all
    pub fn end(&mut self) {
        self.entities
            .broadcast_where(Broadcast::SceneEnd, &mut self.services, |_| true);
        self.entities.remove_all(&mut self.services, &mut self.pooler);
        self.services.tags.clear();
        self.services.depth.clear();
        self.end_of_frame.clear();
        log::info!("scene {} ended", self.services.id.id());
    }

    /// Advance the clocks and flush queued entity changes
    pub fn before_update(&mut self, delta_time: f32) {
        self.raw_time_active += delta_time;
        if self.paused {
            self.services.delta_time = 0.0;
        } else {
            self.time_active += delta_time;
            self.services.delta_time = delta_time;
        }
        self.update_lists();
    }

    /// Update every enabled entity, deepest first
    pub fn update(&mut self) {
        if !self.paused {
            self.entities.update(&mut self.services);
        }
    }

    /// Run and forget the queued end-of-frame callbacks
    pub fn after_update(&mut self) {
        for callback in std::mem::take(&mut self.end_of_frame) {
            callback(self);
        }
    }

    /// One full frame
    pub fn frame(&mut self, delta_time: f32) {
        self.before_update(delta_time);
        self.update();
        self.after_update();
    }

    /// Draw visible entities, then debug geometry when enabled
    ///
    /// # Panics
    ///
    /// If a render hook tries to add or remove an entity or component.
    pub fn render(&mut self, target: &mut dyn RenderTarget, camera_bounds: Rect) {
        self.entities
            .render(&self.services, &self.debug_colors, target, camera_bounds, false);
        if self.debug_render {
            self.entities
                .render(&self.services, &self.debug_colors, target, camera_bounds, true);
        }
    }

    /// Apply queued entity additions and removals now
    pub fn update_lists(&mut self) {
        self.entities.update_lists(&mut self.services, &mut self.pooler);
        self.services.tags.update_lists(self.entities.order());
    }

    /// Queue a callback for the end of the current frame
    pub fn on_end_of_frame(&mut self, callback: impl FnOnce(&mut Scene) + 'static) {
        self.end_of_frame.push(Box::new(callback));
    }

    /// Freeze entity updates and the scaled clock
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether updates are frozen
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Seconds of unpaused time
    pub fn time_active(&self) -> f32 {
        self.time_active
    }

    /// Seconds since creation, pauses included
    pub fn raw_time_active(&self) -> f32 {
        self.raw_time_active
    }

    /// Toggle the debug render pass
    pub fn set_debug_render(&mut self, enabled: bool) {
        self.debug_render = enabled;
    }

    // ===== Entities =====

    /// Build a detached entity with a fresh ID from this scene's sequence
    pub fn create_entity(&self, name: impl Into<String>) -> Entity {
        Entity::new(name, &self.ids)
    }

    /// Take an entity of `kind` from the pool, or build one
    pub fn create_pooled(&mut self, kind: EntityKind, name: impl Into<String>) -> Entity {
        self.pooler.create(kind, name, &self.ids)
    }

    /// The entity pool
    pub fn pooler(&self) -> &Pooler {
        &self.pooler
    }

    /// The entity pool, mutably
    pub fn pooler_mut(&mut self) -> &mut Pooler {
        &mut self.pooler
    }

    /// Queue `entity` for the next flush
    ///
    /// Returns `None` if an entity with the same ID is already active or
    /// queued; the duplicate is dropped.
    pub fn add(&mut self, entity: Entity) -> Option<EntityId> {
        SceneAccess { entities: &mut self.entities.pending, services: &mut self.services }.schedule_add(entity)
    }

    /// Queue an active entity for removal; false if it is absent or already queued
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.entities.pending.remove(id)
    }

    /// Active entities
    pub fn entities(&self) -> &EntityList {
        &self.entities
    }

    /// Active entity by ID
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Whether `id` is active
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Number of active entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is active
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Active entities, deepest first
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// First active entity named `name`
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.find_by_name(name)
    }

    /// First active entity of `kind`
    pub fn find_first(&self, kind: EntityKind) -> Option<&Entity> {
        self.entities.find_first(kind)
    }

    /// IDs of every active entity of `kind`; hand the list back with
    /// [`Self::free_ids`]
    pub fn find_all(&mut self, kind: EntityKind) -> Vec<EntityId> {
        let mut out = self.id_lists.obtain();
        self.entities.find_all(kind, &mut out);
        out
    }

    /// Number of active entities of `kind`
    pub fn amount_of(&self, kind: EntityKind) -> usize {
        self.entities.amount_of(kind)
    }

    /// Visit every active entity of `kind`
    pub fn with(&self, kind: EntityKind, f: impl FnMut(&Entity)) {
        self.entities.with(kind, f);
    }

    /// Return a list obtained from a pooled query
    pub fn free_ids(&mut self, list: Vec<EntityId>) {
        self.id_lists.free(list);
    }

    // ===== Tags =====

    /// Register a new tag name
    pub fn register_tag(&mut self, name: &str) -> Result<BitTag, TagError> {
        self.tag_registry.register(name)
    }

    /// Look up a tag by name
    pub fn tag(&self, name: &str) -> Result<&BitTag, TagError> {
        self.tag_registry.get(name)
    }

    /// Registered tags
    pub fn tag_registry(&self) -> &TagRegistry {
        &self.tag_registry
    }

    /// Per-bit entity lists
    pub fn tags(&self) -> &TagLists {
        &self.services.tags
    }

    /// Entities carrying the tag bit, in depth order
    pub fn entities_with_tag(&self, tag: &BitTag) -> &[EntityId] {
        self.services.tags.get(tag.id())
    }

    /// Active entities carrying any bit of `mask`, in depth order (pooled)
    pub fn entities_by_tag_mask(&mut self, mask: u32) -> Vec<EntityId> {
        let mut out = self.id_lists.obtain();
        out.extend(self.entities.iter().filter(|entity| entity.tag_check(mask)).map(Entity::id));
        out
    }

    /// Active entities carrying no bit of `mask`, in depth order (pooled)
    pub fn entities_excluding_tag_mask(&mut self, mask: u32) -> Vec<EntityId> {
        let mut out = self.id_lists.obtain();
        out.extend(self.entities.iter().filter(|entity| !entity.tag_check(mask)).map(Entity::id));
        out
    }

    // ===== Out-of-frame access =====

    /// Run `f` with a full context for an active entity
    ///
    /// Requests made through the context are applied before this returns.
    pub fn with_entity<R>(&mut self, id: EntityId, f: impl FnOnce(&mut ComponentContext<'_>) -> R) -> Option<R> {
        self.entities.with_entity(id, &mut self.services, |entity, access| {
            entity.components.with_context(&mut entity.core, Some(access), f)
        })
    }

    /// Run `f` against the first component of type `T` of an active entity
    ///
    /// ```ignore
    /// scene.with_component::<Mover, _>(player, |mover, cx| mover.move_by(cx, motion));
    /// ```
    pub fn with_component<T: Component, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut T, &mut ComponentContext<'_>) -> R,
    ) -> Option<R> {
        self.entities
            .with_entity(id, &mut self.services, |entity, access| {
                entity.components.with_component(&mut entity.core, Some(access), f)
            })
            .flatten()
    }

    /// Attach a component to an active entity
    pub fn add_component(&mut self, id: EntityId, component: impl Component) -> Option<ComponentId> {
        self.with_entity(id, |cx| cx.add_component(component))
    }

    /// Detach a component from an active entity
    pub fn remove_component(&mut self, id: EntityId, component: ComponentId) {
        self.with_entity(id, |cx| cx.remove_component(component));
    }

    /// Enable or disable an active entity
    pub fn set_entity_enabled(&mut self, id: EntityId, enabled: bool) {
        self.with_entity(id, |cx| cx.set_enabled(enabled));
    }

    // ===== Services =====

    /// Physics world
    pub fn physics(&self) -> &Physics {
        &self.services.physics
    }

    /// Physics world, mutably
    pub fn physics_mut(&mut self) -> &mut Physics {
        &mut self.services.physics
    }

    /// Depth tie-break state
    pub fn depth_ordering(&self) -> &DepthOrdering {
        &self.services.depth
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.services.id)
            .field("entities", &self.entities.len())
            .field("colliders", &self.services.physics.len())
            .field("paused", &self.paused)
            .field("time_active", &self.time_active)
            .field("end_of_frame", &self.end_of_frame.len())
            .finish_non_exhaustive()
    }
}

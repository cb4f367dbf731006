//! Entity implementation
//!
//! An [`Entity`] is split into its [`EntityCore`] (identity, tag, depth,
//! position) and its [`ComponentList`]. Hooks borrow the core mutably while the
//! list iterates its components, so the two halves are kept apart.

use std::cell::Cell;
use std::rc::Rc;

use crate::ecs::component::{Component, ComponentEntry, ComponentId};
use crate::ecs::component_list::{Broadcast, ComponentList};
use crate::ecs::context::SceneAccess;
use crate::ecs::depth::ActualDepth;
use crate::foundation::math::Vec2;

/// Entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Wrap a raw ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scene identifier, handed out by the same [`IdSequence`] as entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(u32);

impl SceneId {
    /// Get the raw ID
    pub fn id(&self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct Counters {
    entity: Cell<u32>,
    component: Cell<u64>,
    scene: Cell<u32>,
}

/// Shared, resettable ID source
///
/// Cloning yields another handle to the same counters. Tests inject their own
/// sequence to get reproducible IDs; nothing in the crate keeps a global one.
#[derive(Debug, Clone)]
pub struct IdSequence {
    counters: Rc<Counters>,
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSequence {
    /// Sequence whose first entity ID is 0
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Sequence whose first entity ID is `first_entity`
    pub fn starting_at(first_entity: u32) -> Self {
        Self {
            counters: Rc::new(Counters {
                entity: Cell::new(first_entity),
                component: Cell::new(0),
                scene: Cell::new(0),
            }),
        }
    }

    /// Take the next entity ID
    pub fn next_entity(&self) -> EntityId {
        let id = self.counters.entity.get();
        self.counters.entity.set(id.wrapping_add(1));
        EntityId(id)
    }

    /// Take the next component ID
    pub fn next_component(&self) -> ComponentId {
        let id = self.counters.component.get();
        self.counters.component.set(id + 1);
        ComponentId::new(id)
    }

    /// Take the next scene ID
    pub fn next_scene(&self) -> SceneId {
        let id = self.counters.scene.get();
        self.counters.scene.set(id + 1);
        SceneId(id)
    }

    /// The entity ID the next call to [`Self::next_entity`] returns
    pub fn peek_entity(&self) -> EntityId {
        EntityId(self.counters.entity.get())
    }

    /// Rewind every counter; entity IDs restart at `first_entity`
    pub fn reset(&self, first_entity: u32) {
        self.counters.entity.set(first_entity);
        self.counters.component.set(0);
        self.counters.scene.set(0);
    }
}

/// Caller-declared entity type tag used by kind queries and the pooler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityKind(pub u16);

impl EntityKind {
    /// Kind of entities that never declared one
    pub const GENERIC: Self = Self(0);
}

/// Identity and spatial state of an entity
#[derive(Debug)]
pub struct EntityCore {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) kind: EntityKind,
    pub(crate) enabled: bool,
    pub(crate) visible: bool,
    pub(crate) tag: u32,
    pub(crate) depth: i32,
    pub(crate) actual_depth: ActualDepth,
    pub(crate) position: Vec2,
    pub(crate) scene: Option<SceneId>,
    pub(crate) ids: IdSequence,
}

impl EntityCore {
    fn new(id: EntityId, name: String, ids: IdSequence) -> Self {
        Self {
            id,
            name,
            kind: EntityKind::GENERIC,
            enabled: true,
            visible: true,
            tag: 0,
            depth: 0,
            actual_depth: ActualDepth::new(0, 0),
            position: Vec2::zeros(),
            scene: None,
            ids,
        }
    }

    /// Entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity kind
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Whether the entity updates
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the entity renders
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Tag bitmask
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Requested depth
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Depth with the per-bucket tie-break applied
    pub fn actual_depth(&self) -> ActualDepth {
        self.actual_depth
    }

    /// World position
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Scene the entity currently belongs to
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Whether any bit of `mask` is set on the tag
    pub fn tag_check(&self, mask: u32) -> bool {
        self.tag & mask != 0
    }

    /// Whether every bit of `mask` is set on the tag
    pub fn tag_full_check(&self, mask: u32) -> bool {
        self.tag & mask == mask
    }

    /// The ID source this entity draws component IDs from
    pub fn ids(&self) -> &IdSequence {
        &self.ids
    }
}

/// A named, tagged container of components
#[derive(Debug)]
pub struct Entity {
    pub(crate) core: EntityCore,
    pub(crate) components: ComponentList,
}

impl Entity {
    /// Create a detached entity with the next ID from `ids`
    pub fn new(name: impl Into<String>, ids: &IdSequence) -> Self {
        Self {
            core: EntityCore::new(ids.next_entity(), name.into(), ids.clone()),
            components: ComponentList::new(),
        }
    }

    /// Builder: set the kind
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.core.kind = kind;
        self
    }

    /// Builder: set the position
    pub fn at(mut self, position: Vec2) -> Self {
        self.core.position = position;
        self
    }

    /// Builder: set the tag bitmask
    pub fn with_tag(mut self, tag: u32) -> Self {
        self.core.tag = tag;
        self
    }

    /// Builder: set the depth
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.core.depth = depth;
        self
    }

    /// Builder: attach a component
    pub fn with(mut self, component: impl Component) -> Self {
        self.add_component(component);
        self
    }

    /// Identity and spatial state
    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    /// Entity ID
    pub fn id(&self) -> EntityId {
        self.core.id
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Entity kind
    pub fn kind(&self) -> EntityKind {
        self.core.kind
    }

    /// World position
    pub fn position(&self) -> Vec2 {
        self.core.position
    }

    /// Tag bitmask
    pub fn tag(&self) -> u32 {
        self.core.tag
    }

    /// Requested depth
    pub fn depth(&self) -> i32 {
        self.core.depth
    }

    /// Depth with the tie-break applied
    pub fn actual_depth(&self) -> ActualDepth {
        self.core.actual_depth
    }

    /// Whether the entity updates
    pub fn enabled(&self) -> bool {
        self.core.enabled
    }

    /// Whether the entity renders
    pub fn visible(&self) -> bool {
        self.core.visible
    }

    /// Scene the entity currently belongs to
    pub fn scene(&self) -> Option<SceneId> {
        self.core.scene
    }

    /// Whether any bit of `mask` is set on the tag
    pub fn tag_check(&self, mask: u32) -> bool {
        self.core.tag_check(mask)
    }

    /// Whether every bit of `mask` is set on the tag
    pub fn tag_full_check(&self, mask: u32) -> bool {
        self.core.tag_full_check(mask)
    }

    // Detached mutation. Once an entity is handed to a scene the scene owns
    // it and changes go through `ComponentContext`, which keeps the tag lists,
    // depth ordering and physics world in step.

    /// Move the entity
    pub fn set_position(&mut self, position: Vec2) {
        self.core.position = position;
    }

    /// Replace the tag bitmask
    pub fn set_tag(&mut self, tag: u32) {
        self.core.tag = tag;
    }

    /// Set the bits of `mask`
    pub fn add_tag(&mut self, mask: u32) {
        self.core.tag |= mask;
    }

    /// Clear the bits of `mask`
    pub fn remove_tag(&mut self, mask: u32) {
        self.core.tag &= !mask;
    }

    /// Change the requested depth; the tie-break is assigned on scene entry
    pub fn set_depth(&mut self, depth: i32) {
        self.core.depth = depth;
    }

    /// Show or hide the entity
    pub fn set_visible(&mut self, visible: bool) {
        self.core.visible = visible;
    }

    /// Enable or disable the entity, notifying its components on change
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.core.enabled != enabled {
            self.core.enabled = enabled;
            let event = if enabled { Broadcast::EntityEnabled } else { Broadcast::EntityDisabled };
            self.components.broadcast(event, &mut self.core, None);
        }
    }

    /// Attach a component, returning its ID
    pub fn add_component(&mut self, component: impl Component) -> ComponentId {
        self.add_boxed(Box::new(component))
    }

    /// Attach an already boxed component
    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = self.core.ids.next_component();
        self.components
            .add(ComponentEntry::new(id, component), &mut self.core, None);
        id
    }

    /// Detach a component; unknown IDs are ignored
    pub fn remove_component(&mut self, id: ComponentId) {
        self.components.remove(id, &mut self.core, None);
    }

    /// Enable or disable one component
    pub fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) {
        self.components.set_enabled(id, enabled, &mut self.core, None);
    }

    /// First component of type `T`
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// First component of type `T`, mutably
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    /// Active components in insertion order
    pub fn components(&self) -> &ComponentList {
        &self.components
    }

    pub(crate) fn broadcast(&mut self, event: Broadcast, scene: Option<SceneAccess<'_>>) {
        self.components.broadcast(event, &mut self.core, scene);
    }

    /// Reset a pooled entity for reuse under a fresh ID
    pub(crate) fn recycle(&mut self) {
        let ids = self.core.ids.clone();
        let kind = self.core.kind;
        self.core = EntityCore::new(ids.next_entity(), String::new(), ids);
        self.core.kind = kind;
        self.components.clear();
    }
}

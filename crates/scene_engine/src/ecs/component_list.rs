//! Per-entity component storage with deferred mutation
//!
//! While the list is iterating (update, lifecycle broadcasts) it is
//! [`LockMode::Locked`]: additions and removals are queued and applied when the
//! pass ends. During rendering it is [`LockMode::Error`] and any mutation is a
//! programming error.

use std::collections::HashSet;

use crate::debug::RenderTarget;
use crate::ecs::component::{Component, ComponentEntry, ComponentId, ComponentKind};
use crate::ecs::context::{ComponentContext, RenderContext, RenderServices, SceneAccess};
use crate::ecs::entity::EntityCore;
use crate::foundation::math::Rect;

/// Mutation policy of a component or entity list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Mutations apply immediately
    #[default]
    Open,
    /// Mutations are queued until the list unlocks
    Locked,
    /// Mutations are rejected
    Error,
}

/// Lifecycle events a list forwards to every component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Broadcast {
    EntityAdded,
    EntityRemoved,
    EntityAwake,
    EntityEnabled,
    EntityDisabled,
    SceneBegin,
    SceneEnd,
    Update,
}

impl Broadcast {
    fn dispatch(self, component: &mut dyn Component, cx: &mut ComponentContext<'_>) {
        match self {
            Self::EntityAdded => component.entity_added(cx),
            Self::EntityRemoved => component.entity_removed(cx),
            Self::EntityAwake => component.entity_awake(cx),
            Self::EntityEnabled => component.entity_enabled(cx),
            Self::EntityDisabled => component.entity_disabled(cx),
            Self::SceneBegin => component.scene_begin(cx),
            Self::SceneEnd => component.scene_end(cx),
            Self::Update => component.update(cx),
        }
    }
}

/// Lock state and pending requests, borrowed by contexts while the
/// component vector itself is being iterated
#[derive(Debug, Default)]
pub(crate) struct ListState {
    lock: LockMode,
    current: HashSet<ComponentId>,
    adding: HashSet<ComponentId>,
    removing: HashSet<ComponentId>,
    to_add: Vec<ComponentEntry>,
    to_remove: Vec<ComponentId>,
    toggles: Vec<(ComponentId, bool)>,
    entity_enabled: Option<bool>,
}

impl ListState {
    pub(crate) fn request_add(&mut self, entry: ComponentEntry) {
        if self.lock == LockMode::Error {
            panic!("cannot add component {:?} while the component list is rendering", entry.id);
        }
        if !self.current.contains(&entry.id) && self.adding.insert(entry.id) {
            self.to_add.push(entry);
        }
    }

    pub(crate) fn request_remove(&mut self, id: ComponentId) {
        if self.lock == LockMode::Error {
            panic!("cannot remove component {id:?} while the component list is rendering");
        }
        if self.current.contains(&id) && self.removing.insert(id) {
            self.to_remove.push(id);
        }
    }

    pub(crate) fn request_toggle(&mut self, id: ComponentId, enabled: bool) {
        if self.lock == LockMode::Error {
            panic!("cannot toggle component {id:?} while the component list is rendering");
        }
        self.toggles.push((id, enabled));
    }

    pub(crate) fn request_entity_enabled(&mut self, enabled: bool) {
        if self.lock == LockMode::Error {
            panic!("cannot toggle an entity while its component list is rendering");
        }
        self.entity_enabled = Some(enabled);
    }

    fn has_pending(&self) -> bool {
        !self.to_add.is_empty()
            || !self.to_remove.is_empty()
            || !self.toggles.is_empty()
            || self.entity_enabled.is_some()
    }
}

fn reborrow<'s>(scene: &'s mut Option<SceneAccess<'_>>) -> Option<SceneAccess<'s>> {
    scene.as_mut().map(SceneAccess::reborrow)
}

/// Ordered components of one entity
#[derive(Debug, Default)]
pub struct ComponentList {
    components: Vec<ComponentEntry>,
    pub(crate) state: ListState,
}

impl ComponentList {
    /// Create an empty, open list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no component is active
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Current mutation policy
    pub fn lock_mode(&self) -> LockMode {
        self.state.lock
    }

    /// Active components in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ComponentEntry> {
        self.components.iter()
    }

    /// Whether the component is active
    pub fn contains(&self, id: ComponentId) -> bool {
        self.state.current.contains(&id)
    }

    /// Number of queued additions and removals
    pub fn pending(&self) -> usize {
        self.state.to_add.len() + self.state.to_remove.len()
    }

    /// Entry by ID
    pub fn entry(&self, id: ComponentId) -> Option<&ComponentEntry> {
        self.components.iter().find(|entry| entry.id == id)
    }

    /// First active component of type `T`
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components.iter().find_map(ComponentEntry::downcast::<T>)
    }

    /// First active component of type `T`, mutably
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.iter_mut().find_map(ComponentEntry::downcast_mut::<T>)
    }

    /// Every active component of type `T`
    pub fn get_all<T: Component>(&self) -> impl Iterator<Item = &T> {
        self.components.iter().filter_map(ComponentEntry::downcast::<T>)
    }

    /// Append every active component of type `T` to a caller-owned buffer
    pub fn collect_all<'a, T: Component>(&'a self, out: &mut Vec<&'a T>) {
        out.extend(self.get_all::<T>());
    }

    /// Active components carrying all bits of `kind`
    pub fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &ComponentEntry> {
        self.components.iter().filter(move |entry| entry.kind().contains(kind))
    }

    pub(crate) fn add(
        &mut self,
        entry: ComponentEntry,
        entity: &mut EntityCore,
        scene: Option<SceneAccess<'_>>,
    ) {
        self.state.request_add(entry);
        self.flush_if_open(entity, scene);
    }

    pub(crate) fn remove(
        &mut self,
        id: ComponentId,
        entity: &mut EntityCore,
        scene: Option<SceneAccess<'_>>,
    ) {
        self.state.request_remove(id);
        self.flush_if_open(entity, scene);
    }

    pub(crate) fn set_enabled(
        &mut self,
        id: ComponentId,
        enabled: bool,
        entity: &mut EntityCore,
        scene: Option<SceneAccess<'_>>,
    ) {
        self.state.request_toggle(id, enabled);
        self.flush_if_open(entity, scene);
    }

    fn flush_if_open(&mut self, entity: &mut EntityCore, scene: Option<SceneAccess<'_>>) {
        if self.state.lock == LockMode::Open {
            self.state.lock = LockMode::Locked;
            self.unlock(entity, scene);
        }
    }

    /// Forward `event` to every component (only enabled ones for updates),
    /// then apply whatever the hooks queued
    pub(crate) fn broadcast(
        &mut self,
        event: Broadcast,
        entity: &mut EntityCore,
        mut scene: Option<SceneAccess<'_>>,
    ) {
        self.state.lock = LockMode::Locked;
        self.dispatch_all(event, entity, &mut scene);
        self.unlock(entity, scene);
    }

    /// Run `f` against the first component of type `T` with a live context
    pub(crate) fn with_component<T: Component, R>(
        &mut self,
        entity: &mut EntityCore,
        mut scene: Option<SceneAccess<'_>>,
        f: impl FnOnce(&mut T, &mut ComponentContext<'_>) -> R,
    ) -> Option<R> {
        self.state.lock = LockMode::Locked;
        let result = self
            .components
            .iter_mut()
            .find_map(|entry| {
                let (id, enabled) = (entry.id, entry.enabled);
                entry.downcast_mut::<T>().map(|component| (id, enabled, component))
            })
            .map(|(id, enabled, component)| {
                let mut cx = ComponentContext::new(
                    entity,
                    &mut self.state,
                    reborrow(&mut scene),
                    Some((id, enabled)),
                );
                f(component, &mut cx)
            });
        self.unlock(entity, scene);
        result
    }

    /// Run `f` with a context for the entity itself, not tied to a component
    pub(crate) fn with_context<R>(
        &mut self,
        entity: &mut EntityCore,
        mut scene: Option<SceneAccess<'_>>,
        f: impl FnOnce(&mut ComponentContext<'_>) -> R,
    ) -> R {
        self.state.lock = LockMode::Locked;
        let result = {
            let mut cx = ComponentContext::new(entity, &mut self.state, reborrow(&mut scene), None);
            f(&mut cx)
        };
        self.unlock(entity, scene);
        result
    }

    pub(crate) fn render(
        &mut self,
        entity: &EntityCore,
        services: RenderServices<'_>,
        target: &mut dyn RenderTarget,
        camera_bounds: Rect,
        debug: bool,
    ) {
        let RenderServices { mut entities, physics, colors } = services;
        self.state.lock = LockMode::Error;
        for entry in &self.components {
            if !entry.enabled {
                continue;
            }
            let component = entry.component();
            let mut cx = RenderContext {
                entity,
                list: &mut self.state,
                entities: entities.as_deref_mut(),
                physics,
                colors,
                target: &mut *target,
                camera_bounds,
            };
            if debug {
                component.debug_render(&mut cx);
            } else if entry.kind().contains(ComponentKind::RENDERABLE)
                && component.is_visible()
                && component
                    .bounds(entity)
                    .map_or(true, |bounds| bounds.intersects(&camera_bounds))
            {
                component.render(&mut cx);
            }
        }
        self.state.lock = LockMode::Open;
    }

    /// Drop every component without running hooks
    pub(crate) fn clear(&mut self) {
        self.components.clear();
        self.state = ListState::default();
    }

    fn dispatch_all(
        &mut self,
        event: Broadcast,
        entity: &mut EntityCore,
        scene: &mut Option<SceneAccess<'_>>,
    ) {
        for entry in &mut self.components {
            if event == Broadcast::Update && !entry.enabled {
                continue;
            }
            let mut cx = ComponentContext::new(
                entity,
                &mut self.state,
                reborrow(scene),
                Some((entry.id, entry.enabled)),
            );
            event.dispatch(&mut *entry.component, &mut cx);
        }
    }

    /// Apply queued work (additions, then removals, then enable toggles)
    /// until hooks stop queueing more, then reopen the list
    fn unlock(&mut self, entity: &mut EntityCore, mut scene: Option<SceneAccess<'_>>) {
        while self.state.has_pending() {
            let additions = std::mem::take(&mut self.state.to_add);
            self.state.adding.clear();
            for entry in additions {
                if !self.state.current.insert(entry.id) {
                    continue;
                }
                self.components.push(entry);
                let index = self.components.len() - 1;
                let entry = &mut self.components[index];
                let mut cx = ComponentContext::new(
                    entity,
                    &mut self.state,
                    reborrow(&mut scene),
                    Some((entry.id, entry.enabled)),
                );
                entry.component.added(&mut cx);
            }

            let removals = std::mem::take(&mut self.state.to_remove);
            self.state.removing.clear();
            for id in removals {
                if !self.state.current.remove(&id) {
                    continue;
                }
                let Some(index) = self.components.iter().position(|entry| entry.id == id) else {
                    continue;
                };
                let mut entry = self.components.remove(index);
                let mut cx = ComponentContext::new(
                    entity,
                    &mut self.state,
                    reborrow(&mut scene),
                    Some((entry.id, false)),
                );
                entry.component.removed(&mut cx);
            }

            let toggles = std::mem::take(&mut self.state.toggles);
            for (id, enabled) in toggles {
                let Some(entry) = self.components.iter_mut().find(|entry| entry.id == id) else {
                    continue;
                };
                if entry.enabled == enabled {
                    continue;
                }
                entry.enabled = enabled;
                let mut cx = ComponentContext::new(
                    entity,
                    &mut self.state,
                    reborrow(&mut scene),
                    Some((entry.id, enabled)),
                );
                if enabled {
                    entry.component.on_enabled(&mut cx);
                } else {
                    entry.component.on_disabled(&mut cx);
                }
            }

            if let Some(enabled) = self.state.entity_enabled.take() {
                if entity.enabled != enabled {
                    entity.enabled = enabled;
                    let event = if enabled { Broadcast::EntityEnabled } else { Broadcast::EntityDisabled };
                    self.dispatch_all(event, entity, &mut scene);
                }
            }
        }
        self.state.lock = LockMode::Open;
    }
}

//! Contexts handed to component hooks
//!
//! A component never holds a pointer back to its entity or scene. Instead each
//! hook receives a [`ComponentContext`] that borrows the owning entity's core,
//! its list's pending queue, and (while the entity lives in a scene) the scene
//! services and deferred entity list.

use crate::debug::{DebugColors, RenderTarget};
use crate::ecs::component::{Component, ComponentEntry, ComponentId};
use crate::ecs::component_list::ListState;
use crate::ecs::depth::DepthOrdering;
use crate::ecs::entity::{Entity, EntityCore, EntityId, IdSequence, SceneId};
use crate::ecs::entity_list::PendingEntities;
use crate::ecs::tags::TagLists;
use crate::foundation::math::{Rect, Vec2};
use crate::physics::Physics;

/// Per-scene state components may reach through their context
#[derive(Debug)]
pub struct SceneServices {
    pub(crate) id: SceneId,
    pub(crate) physics: Physics,
    pub(crate) tags: TagLists,
    pub(crate) depth: DepthOrdering,
    pub(crate) delta_time: f32,
}

/// Mutable view of a scene while one of its entities is borrowed
pub(crate) struct SceneAccess<'a> {
    pub(crate) entities: &'a mut PendingEntities,
    pub(crate) services: &'a mut SceneServices,
}

impl SceneAccess<'_> {
    pub(crate) fn reborrow(&mut self) -> SceneAccess<'_> {
        SceneAccess { entities: &mut *self.entities, services: &mut *self.services }
    }

    /// Queue `entity` for the next flush, assigning its tie-broken depth
    pub(crate) fn schedule_add(&mut self, mut entity: Entity) -> Option<EntityId> {
        let id = entity.id();
        if !self.entities.accepts(id) {
            log::debug!("entity {id} is already in or entering the scene");
            return None;
        }
        entity.core.actual_depth = self.services.depth.assign(entity.core.depth);
        self.entities.add(entity);
        Some(id)
    }
}

/// Everything a hook may touch besides its own component
pub struct ComponentContext<'a> {
    entity: &'a mut EntityCore,
    list: &'a mut ListState,
    scene: Option<SceneAccess<'a>>,
    current: Option<(ComponentId, bool)>,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        entity: &'a mut EntityCore,
        list: &'a mut ListState,
        scene: Option<SceneAccess<'a>>,
        current: Option<(ComponentId, bool)>,
    ) -> Self {
        Self { entity, list, scene, current }
    }

    /// The owning entity
    pub fn entity(&self) -> &EntityCore {
        self.entity
    }

    /// ID of the owning entity
    pub fn entity_id(&self) -> EntityId {
        self.entity.id
    }

    /// Position of the owning entity
    pub fn position(&self) -> Vec2 {
        self.entity.position
    }

    /// ID of the component whose hook is running, if any
    pub fn component_id(&self) -> Option<ComponentId> {
        self.current.map(|(id, _)| id)
    }

    /// Whether the component whose hook is running is enabled
    pub fn component_enabled(&self) -> bool {
        self.current.map_or(true, |(_, enabled)| enabled)
    }

    /// Scene the owning entity belongs to
    pub fn scene_id(&self) -> Option<SceneId> {
        self.entity.scene
    }

    /// Whether scene services are reachable from this context
    pub fn in_scene(&self) -> bool {
        self.scene.is_some()
    }

    /// Seconds covered by the current frame; zero outside a scene update
    pub fn delta_time(&self) -> f32 {
        self.scene.as_ref().map_or(0.0, |scene| scene.services.delta_time)
    }

    /// ID source shared with the owning entity
    pub fn ids(&self) -> &IdSequence {
        &self.entity.ids
    }

    /// Physics world of the scene
    pub fn physics(&self) -> Option<&Physics> {
        self.scene.as_ref().map(|scene| &scene.services.physics)
    }

    /// Physics world of the scene, mutably
    pub fn physics_mut(&mut self) -> Option<&mut Physics> {
        self.scene.as_mut().map(|scene| &mut scene.services.physics)
    }

    /// Tag index of the scene
    pub fn tags(&self) -> Option<&TagLists> {
        self.scene.as_ref().map(|scene| &scene.services.tags)
    }

    /// Move the owning entity, keeping its colliders in step
    pub fn set_position(&mut self, position: Vec2) {
        self.entity.position = position;
        if let Some(scene) = self.scene.as_mut() {
            scene.services.physics.entity_moved(self.entity.id, position);
        }
    }

    /// Move the owning entity by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        self.set_position(self.entity.position + delta);
    }

    /// Replace the tag bitmask, updating the scene's tag index
    pub fn set_tag(&mut self, tag: u32) {
        let old = self.entity.tag;
        if old == tag {
            return;
        }
        self.entity.tag = tag;
        if let (Some(scene), Some(_)) = (self.scene.as_mut(), self.entity.scene) {
            scene.services.tags.tag_changed(self.entity.id, old, tag);
        }
    }

    /// Set the bits of `mask`
    pub fn add_tag(&mut self, mask: u32) {
        self.set_tag(self.entity.tag | mask);
    }

    /// Clear the bits of `mask`
    pub fn remove_tag(&mut self, mask: u32) {
        self.set_tag(self.entity.tag & !mask);
    }

    /// Change the requested depth; inside a scene the entity gets a fresh
    /// tie-break and the entity list is re-sorted on the next flush
    pub fn set_depth(&mut self, depth: i32) {
        if self.entity.depth == depth {
            return;
        }
        self.entity.depth = depth;
        if let (Some(scene), Some(_)) = (self.scene.as_mut(), self.entity.scene) {
            self.entity.actual_depth = scene.services.depth.assign(depth);
            scene.entities.mark_unsorted();
            scene.services.tags.mark_unsorted(self.entity.tag);
        }
    }

    /// Enable or disable the owning entity once the current pass ends
    pub fn set_enabled(&mut self, enabled: bool) {
        self.list.request_entity_enabled(enabled);
    }

    /// Show or hide the owning entity
    pub fn set_visible(&mut self, visible: bool) {
        self.entity.visible = visible;
    }

    /// Attach a component to the owning entity once the current pass ends
    pub fn add_component(&mut self, component: impl Component) -> ComponentId {
        let id = self.entity.ids.next_component();
        self.list.request_add(ComponentEntry::new(id, Box::new(component)));
        id
    }

    /// Detach a component from the owning entity once the current pass ends
    pub fn remove_component(&mut self, id: ComponentId) {
        self.list.request_remove(id);
    }

    /// Detach the component whose hook is running
    pub fn remove_self(&mut self) {
        if let Some((id, _)) = self.current {
            self.list.request_remove(id);
        }
    }

    /// Enable or disable a component of the owning entity
    pub fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) {
        self.list.request_toggle(id, enabled);
    }

    /// Queue another entity for the scene's next flush
    pub fn add_entity(&mut self, entity: Entity) -> Option<EntityId> {
        match self.scene.as_mut() {
            Some(scene) => scene.schedule_add(entity),
            None => {
                log::warn!("entity {} dropped: {} is not in a scene", entity.id(), self.entity.id);
                None
            }
        }
    }

    /// Queue an entity of the scene for removal on the next flush
    pub fn remove_entity(&mut self, id: EntityId) {
        if let Some(scene) = self.scene.as_mut() {
            scene.entities.remove(id);
        }
    }

    /// Queue the owning entity for removal
    pub fn destroy(&mut self) {
        let id = self.entity.id;
        self.remove_entity(id);
    }
}

/// Borrowed scene state for a render pass
pub(crate) struct RenderServices<'a> {
    pub(crate) entities: Option<&'a mut PendingEntities>,
    pub(crate) physics: Option<&'a Physics>,
    pub(crate) colors: &'a DebugColors,
}

/// Context for `render` and `debug_render`
///
/// Both the component list and the entity list are in
/// [`LockMode::Error`](crate::ecs::LockMode::Error) while rendering, so any
/// structural request made through this context panics.
pub struct RenderContext<'a> {
    pub(crate) entity: &'a EntityCore,
    pub(crate) list: &'a mut ListState,
    pub(crate) entities: Option<&'a mut PendingEntities>,
    pub(crate) physics: Option<&'a Physics>,
    pub(crate) colors: &'a DebugColors,
    pub(crate) target: &'a mut dyn RenderTarget,
    pub(crate) camera_bounds: Rect,
}

impl<'a> RenderContext<'a> {
    /// The entity being drawn
    pub fn entity(&self) -> &'a EntityCore {
        self.entity
    }

    /// Its position
    pub fn position(&self) -> Vec2 {
        self.entity.position
    }

    /// Surface to draw on
    pub fn target(&mut self) -> &mut dyn RenderTarget {
        &mut *self.target
    }

    /// Visible world area
    pub fn camera_bounds(&self) -> Rect {
        self.camera_bounds
    }

    /// Debug palette
    pub fn colors(&self) -> &'a DebugColors {
        self.colors
    }

    /// Physics world of the scene
    pub fn physics(&self) -> Option<&'a Physics> {
        self.physics
    }

    /// Rejected: components cannot be attached while rendering
    pub fn add_component(&mut self, component: impl Component) {
        let id = self.entity.ids.next_component();
        self.list.request_add(ComponentEntry::new(id, Box::new(component)));
    }

    /// Rejected: components cannot be detached while rendering
    pub fn remove_component(&mut self, id: ComponentId) {
        self.list.request_remove(id);
    }

    /// Rejected: entities cannot enter the scene while rendering
    pub fn add_entity(&mut self, entity: Entity) {
        if let Some(entities) = self.entities.as_deref_mut() {
            entities.add(entity);
        }
    }

    /// Rejected: entities cannot leave the scene while rendering
    pub fn remove_entity(&mut self, id: EntityId) {
        if let Some(entities) = self.entities.as_deref_mut() {
            entities.remove(id);
        }
    }
}

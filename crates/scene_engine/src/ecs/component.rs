//! Component trait and the boxed entry stored by a component list

use std::any::Any;

use bitflags::bitflags;

use crate::ecs::context::{ComponentContext, RenderContext};
use crate::ecs::entity::EntityCore;
use crate::foundation::math::Rect;

/// Unique, monotonically assigned component identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID
    pub fn id(&self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Capabilities a component declares up front
    ///
    /// The runtime never probes a component's concrete type to decide whether
    /// it renders or collides; it reads these flags instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentKind: u32 {
        /// Participates in the render pass
        const RENDERABLE = 1 << 0;
        /// Owns a collider registered with the physics world
        const COLLIDER = 1 << 1;
        /// Moves its entity through the collision resolver
        const MOVER = 1 << 2;
    }
}

/// Upcast helper so `dyn Component` can be downcast to its concrete type
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour attached to an entity
///
/// Every hook has an empty default. Hooks receive a [`ComponentContext`]
/// giving access to the owning entity and, while the entity is in a scene, to
/// the scene's deferred entity list and physics world. Structural changes made
/// from a hook are queued and applied once the current pass finishes.
pub trait Component: AsAny {
    /// Capability flags; defaults to none
    fn kind(&self) -> ComponentKind {
        ComponentKind::empty()
    }

    /// Attached to an entity
    fn added(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// Detached from its entity
    fn removed(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// The owning entity joined a scene
    fn entity_added(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// The owning entity left its scene
    fn entity_removed(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// The owning entity finished its first flush in a scene
    fn entity_awake(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// The owning entity was enabled
    fn entity_enabled(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// The owning entity was disabled
    fn entity_disabled(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// The scene began
    fn scene_begin(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// The scene ended
    fn scene_end(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// This component was enabled
    fn on_enabled(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// This component was disabled
    fn on_disabled(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// Per-frame update, only called while enabled
    fn update(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// Draw; only called for [`ComponentKind::RENDERABLE`] components
    fn render(&self, _cx: &mut RenderContext<'_>) {}

    /// Debug overlay, drawn after the regular pass when debug rendering is on
    fn debug_render(&self, _cx: &mut RenderContext<'_>) {}

    /// Whether a renderable wants to be drawn this frame
    fn is_visible(&self) -> bool {
        true
    }

    /// World bounds used for camera culling; `None` is never culled
    fn bounds(&self, _entity: &EntityCore) -> Option<Rect> {
        None
    }
}

/// A component together with the bookkeeping its list keeps for it
pub struct ComponentEntry {
    pub(crate) id: ComponentId,
    pub(crate) enabled: bool,
    pub(crate) component: Box<dyn Component>,
}

impl ComponentEntry {
    pub(crate) fn new(id: ComponentId, component: Box<dyn Component>) -> Self {
        Self { id, enabled: true, component }
    }

    /// Component ID
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Whether the component is enabled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Capability flags of the wrapped component
    pub fn kind(&self) -> ComponentKind {
        self.component.kind()
    }

    /// Borrow the component as a trait object
    pub fn component(&self) -> &dyn Component {
        &*self.component
    }

    /// Downcast to a concrete component type
    pub fn downcast<T: Component>(&self) -> Option<&T> {
        (*self.component).as_any().downcast_ref::<T>()
    }

    /// Downcast to a concrete component type, mutably
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        (*self.component).as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("kind", &self.kind())
            .finish()
    }
}

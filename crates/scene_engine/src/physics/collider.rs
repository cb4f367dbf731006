//! Collider component
//!
//! A [`Collider`] owns the description of a shape and keeps it registered
//! with the scene's [`Physics`](crate::physics::Physics) world for as long as
//! the component is enabled, attached and its entity is in a scene.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::{Component, ComponentContext, ComponentKind, RenderContext};
use crate::foundation::math::Vec2;
use crate::physics::collision::{Shape, ShapeError, WorldShape};
use crate::physics::{ColliderHandle, CollisionLayers, SharedListener, TriggerListener};

/// Everything the physics world needs to know about a collider
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderDesc {
    /// Local-space shape
    pub shape: Shape,
    /// Shape center relative to the entity position
    pub local_offset: Vec2,
    /// Report overlaps instead of blocking movement
    pub is_trigger: bool,
    /// Layer bits this collider lives on
    pub physics_layer: u32,
    /// Layers this collider queries against
    pub collides_with_layers: u32,
}

impl ColliderDesc {
    /// Solid collider on the default layer that collides with everything
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            local_offset: Vec2::zeros(),
            is_trigger: false,
            physics_layer: CollisionLayers::DEFAULT,
            collides_with_layers: CollisionLayers::ALL,
        }
    }
}

/// Shape attached to an entity
pub struct Collider {
    desc: ColliderDesc,
    handle: Option<ColliderHandle>,
    listener: Option<SharedListener>,
}

impl Collider {
    /// Collider with the given shape centred on the entity
    pub fn new(shape: Shape) -> Self {
        Self::from_desc(ColliderDesc::new(shape))
    }

    /// Collider from a full description
    pub fn from_desc(desc: ColliderDesc) -> Self {
        Self { desc, handle: None, listener: None }
    }

    /// Box collider
    pub fn rect(width: f32, height: f32) -> Result<Self, ShapeError> {
        Ok(Self::new(Shape::rect(width, height)?))
    }

    /// Circle collider
    pub fn circle(radius: f32) -> Result<Self, ShapeError> {
        Ok(Self::new(Shape::circle(radius)?))
    }

    /// Convex polygon collider; points are relative to the entity position
    pub fn polygon(points: &[Vec2]) -> Result<Self, ShapeError> {
        let (shape, center) = Shape::polygon(points)?;
        Ok(Self::new(shape).with_offset(center))
    }

    /// Builder: shift the shape relative to the entity
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.desc.local_offset += offset;
        self
    }

    /// Builder: make this a trigger
    pub fn trigger(mut self) -> Self {
        self.desc.is_trigger = true;
        self
    }

    /// Builder: set the physics layer
    pub fn on_layer(mut self, layer: u32) -> Self {
        self.desc.physics_layer = layer;
        self
    }

    /// Builder: set the collides-with mask
    pub fn colliding_with(mut self, mask: u32) -> Self {
        self.desc.collides_with_layers = mask;
        self
    }

    /// Builder: receive enter/exit notifications while this is a trigger
    pub fn with_listener(mut self, listener: impl TriggerListener + 'static) -> Self {
        self.listener = Some(Rc::new(RefCell::new(listener)));
        self
    }

    /// Description used for registration
    pub fn desc(&self) -> &ColliderDesc {
        &self.desc
    }

    /// Whether the collider is a trigger
    pub fn is_trigger(&self) -> bool {
        self.desc.is_trigger
    }

    /// Handle in the physics world while registered
    pub fn handle(&self) -> Option<ColliderHandle> {
        self.handle
    }

    fn register(&mut self, cx: &mut ComponentContext<'_>) {
        if self.handle.is_some()
            || !cx.component_enabled()
            || !cx.entity().enabled()
            || cx.scene_id().is_none()
        {
            return;
        }
        let (entity, position) = (cx.entity_id(), cx.position());
        if let Some(physics) = cx.physics_mut() {
            self.handle = Some(physics.register(entity, position, self.desc.clone(), self.listener.clone()));
        }
    }

    fn unregister(&mut self, cx: &mut ComponentContext<'_>) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Some(physics) = cx.physics_mut() {
            physics.unregister(handle);
        }
    }
}

impl std::fmt::Debug for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collider")
            .field("desc", &self.desc)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Component for Collider {
    fn kind(&self) -> ComponentKind {
        ComponentKind::COLLIDER
    }

    fn added(&mut self, cx: &mut ComponentContext<'_>) {
        self.register(cx);
    }

    fn removed(&mut self, cx: &mut ComponentContext<'_>) {
        self.unregister(cx);
    }

    fn entity_added(&mut self, cx: &mut ComponentContext<'_>) {
        self.register(cx);
    }

    fn entity_removed(&mut self, cx: &mut ComponentContext<'_>) {
        self.unregister(cx);
    }

    fn entity_enabled(&mut self, cx: &mut ComponentContext<'_>) {
        self.register(cx);
    }

    fn entity_disabled(&mut self, cx: &mut ComponentContext<'_>) {
        self.unregister(cx);
    }

    fn on_enabled(&mut self, cx: &mut ComponentContext<'_>) {
        self.register(cx);
    }

    fn on_disabled(&mut self, cx: &mut ComponentContext<'_>) {
        self.unregister(cx);
    }

    fn debug_render(&self, cx: &mut RenderContext<'_>) {
        let Some(record) = self
            .handle
            .and_then(|handle| cx.physics().and_then(|physics| physics.get(handle)))
        else {
            return;
        };
        let colors = cx.colors();
        let position = cx.position();
        let target = cx.target();

        target.draw_hollow_rect(record.bounds(), colors.collider_bounds);
        match record.world_shape() {
            WorldShape::Polygon { center, points } => {
                target.draw_polygon(center, points.as_slice(), colors.collider_edge);
            }
            WorldShape::Circle { center, radius } => {
                target.draw_circle(center, radius, colors.collider_edge);
            }
        }
        target.draw_point(position, colors.collider_position);
        target.draw_point(record.center(), colors.collider_center);
    }
}

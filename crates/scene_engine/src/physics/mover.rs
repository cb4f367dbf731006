//! Collision-aware movement
//!
//! [`Mover`] nudges its entity by a motion vector, trimming the motion so that
//! none of the entity's solid colliders ends up inside another solid collider.
//! Triggers never block; after every applied move the mover's
//! [`TriggerTracker`] reports overlaps that started or ended.

use crate::ecs::{Component, ComponentContext, ComponentKind};
use crate::foundation::math::Vec2;
use crate::physics::collision::CollisionResult;
use crate::physics::trigger::{TriggerEvent, TriggerTracker};
use crate::physics::ColliderRecord;

/// Moves its entity through the physics world
#[derive(Debug, Default)]
pub struct Mover {
    tracker: TriggerTracker,
    velocity: Vec2,
    last_collision: Option<CollisionResult>,
}

impl Mover {
    /// Create a stationary mover
    pub fn new() -> Self {
        Self::default()
    }

    /// Mover that travels `velocity` units per second on every update
    pub fn with_velocity(velocity: Vec2) -> Self {
        Self { velocity, ..Self::default() }
    }

    /// Units per second applied on update
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Change the per-update velocity
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Blocking collision of the last [`Self::move_by`], if any
    pub fn last_collision(&self) -> Option<&CollisionResult> {
        self.last_collision.as_ref()
    }

    /// Trigger events of the last applied move
    pub fn trigger_events(&self) -> &[TriggerEvent] {
        self.tracker.events()
    }

    /// Enter/exit bookkeeping
    pub fn tracker(&self) -> &TriggerTracker {
        &self.tracker
    }

    /// Trim `motion` against every solid collider in reach
    ///
    /// Returns the corrected motion and the last collision found. Without a
    /// scene or without colliders the motion is returned unchanged.
    pub fn calculate_movement(&self, cx: &mut ComponentContext<'_>, motion: Vec2) -> (Vec2, CollisionResult) {
        let entity = cx.entity_id();
        let mut result = CollisionResult::default();
        let Some(physics) = cx.physics_mut() else {
            return (motion, result);
        };
        if !physics.has_colliders(entity) {
            return (motion, result);
        }

        let mut motion = motion;
        let mut colliders = physics.obtain_list();
        colliders.extend_from_slice(physics.colliders_of(entity));
        for &collider in &colliders {
            let Some(record) = physics.get(collider) else {
                continue;
            };
            if record.is_trigger() {
                continue;
            }
            let bounds = record.bounds().translated(motion);
            let mask = record.collides_with_layers();

            let neighbors = physics.boxcast_broadphase_excluding(entity, &bounds, mask);
            for &neighbor in &neighbors {
                if physics.get(neighbor).map_or(true, ColliderRecord::is_trigger) {
                    continue;
                }
                if let Some(hit) = physics.collides_with(collider, neighbor, motion) {
                    log::trace!("{entity} blocked by {neighbor:?}, mtv {:?}", hit.minimum_translation_vector);
                    motion -= hit.minimum_translation_vector;
                    result = hit;
                }
            }
            physics.free_list(neighbors);
        }
        physics.free_list(colliders);

        (motion, result)
    }

    /// Move the entity by `motion` as-is, then refresh trigger overlaps
    pub fn apply_movement(&mut self, cx: &mut ComponentContext<'_>, motion: Vec2) {
        cx.translate(motion);
        let entity = cx.entity_id();
        if let Some(physics) = cx.physics_mut() {
            self.tracker.update(entity, physics);
        }
    }

    /// Calculate and apply; true when a solid collider blocked the motion
    pub fn move_by(&mut self, cx: &mut ComponentContext<'_>, motion: Vec2) -> bool {
        let (motion, result) = self.calculate_movement(cx, motion);
        self.apply_movement(cx, motion);
        self.last_collision = result.is_hit().then_some(result);
        result.is_hit()
    }
}

impl Component for Mover {
    fn kind(&self) -> ComponentKind {
        ComponentKind::MOVER
    }

    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        let delta_time = cx.delta_time();
        if self.velocity != Vec2::zeros() && delta_time > 0.0 {
            self.move_by(cx, self.velocity * delta_time);
        }
    }

    fn entity_removed(&mut self, _cx: &mut ComponentContext<'_>) {
        self.tracker.reset();
    }
}

//! Physics module for collision detection and response
//!
//! Colliders register with the scene's [`Physics`] world, which indexes them in
//! a spatial hash. [`Mover`] resolves blocking collisions for its entity and
//! reports trigger overlaps through a [`TriggerTracker`].

pub mod collider;
pub mod collision;
pub mod collision_layers;
pub mod mover;
pub mod trigger;
pub mod world;

pub use collider::{Collider, ColliderDesc};
pub use collision::{CollisionResult, Shape, ShapeError, WorldShape};
pub use collision_layers::CollisionLayers;
pub use mover::Mover;
pub use trigger::{Pair, SharedListener, TriggerEvent, TriggerListener, TriggerPhase, TriggerTracker};
pub use world::{ColliderHandle, ColliderRecord, Physics};

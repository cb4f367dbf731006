//! Collision shapes and the narrow phase
//!
//! # Module Organization
//!
//! - [`shape`] - Local-space shapes and their world-space views
//! - [`sat`] - Separating-axis overlap and minimum translation vectors

pub mod sat;
pub mod shape;

pub use shape::{Points, Shape, ShapeError, WorldShape};

use crate::foundation::math::Vec2;
use crate::physics::ColliderHandle;

/// Outcome of a blocking collision test
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionResult {
    /// The collider that was hit
    pub collider: Option<ColliderHandle>,
    /// Subtract from the motion to stop touching `collider`
    pub minimum_translation_vector: Vec2,
    /// Surface normal of the hit, pointing back at the mover
    pub normal: Vec2,
}

impl CollisionResult {
    pub(crate) fn hit(collider: ColliderHandle, minimum_translation_vector: Vec2) -> Self {
        let length = minimum_translation_vector.norm();
        let normal = if length > 0.0 { -minimum_translation_vector / length } else { Vec2::zeros() };
        Self { collider: Some(collider), minimum_translation_vector, normal }
    }

    /// Whether anything was hit
    pub fn is_hit(&self) -> bool {
        self.collider.is_some()
    }
}

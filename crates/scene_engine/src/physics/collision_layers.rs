//! Collision layer helpers
//!
//! Every collider lives on one or more layer bits (`physics_layer`) and
//! queries a mask of layers (`collides_with_layers`). Broadphase queries only
//! report colliders whose layer intersects the querying mask.

/// Layer bit constants and mask helpers
pub struct CollisionLayers;

impl CollisionLayers {
    /// No collision layer
    pub const NONE: u32 = 0;

    /// All collision layers
    pub const ALL: u32 = u32::MAX;

    /// Layer new colliders start on
    pub const DEFAULT: u32 = 1 << 0;

    /// Single-bit mask for layer `index` (0..32)
    pub const fn layer(index: u32) -> u32 {
        1 << index
    }

    /// Check if two colliders should collide based on their layers and masks
    ///
    /// Both sides must accept each other: A's layer must be in B's mask and
    /// B's layer in A's mask.
    ///
    /// ```
    /// use scene_engine::physics::CollisionLayers;
    ///
    /// let player = CollisionLayers::layer(1);
    /// let wall = CollisionLayers::layer(2);
    /// assert!(CollisionLayers::should_collide(player, wall, wall, CollisionLayers::ALL));
    /// ```
    pub fn should_collide(layer_a: u32, mask_a: u32, layer_b: u32, mask_b: u32) -> bool {
        (layer_a & mask_b) != 0 && (layer_b & mask_a) != 0
    }

    /// Combine several layers into one mask
    pub fn mask(layers: &[u32]) -> u32 {
        layers.iter().fold(0, |acc, &layer| acc | layer)
    }

    /// Whether `mask` includes any bit of `layer`
    pub fn is_set(mask: u32, layer: u32) -> bool {
        mask & layer != 0
    }
}

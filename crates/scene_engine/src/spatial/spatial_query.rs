//! Abstract spatial index used by the physics broadphase
//!
//! The physics world only needs one thing from its index: given a rectangle
//! and a layer mask, a superset of the colliders whose bounds overlap it.
//! Implementations may over-report but must never miss an overlapping
//! collider, and must return a given handle at most once per query.

use std::any::Any;
use std::collections::HashMap;

use crate::foundation::math::Rect;
use crate::physics::ColliderHandle;

/// Broadphase interface of the physics world
pub trait SpatialIndex {
    /// Start tracking `handle`; re-inserting replaces the old entry
    fn insert(&mut self, handle: ColliderHandle, bounds: Rect, layer: u32);

    /// Stop tracking `handle`
    fn remove(&mut self, handle: ColliderHandle);

    /// Refresh the bounds of a tracked handle
    fn update(&mut self, handle: ColliderHandle, bounds: Rect, layer: u32) {
        self.insert(handle, bounds, layer);
    }

    /// Append every tracked handle that may overlap `bounds` and whose layer
    /// intersects `layer_mask`, in a deterministic order
    fn query(&self, bounds: &Rect, layer_mask: u32, out: &mut Vec<ColliderHandle>);

    /// Forget every handle
    fn clear(&mut self);

    /// Number of tracked handles
    fn len(&self) -> usize;

    /// Whether nothing is tracked
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downcast to Any for implementation-specific access
    fn as_any(&self) -> &dyn Any;
}

impl std::fmt::Debug for dyn SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpatialIndex({} entries)", self.len())
    }
}

/// Index without partitioning: every query scans all entries
///
/// Useful as a reference implementation and for very small worlds.
#[derive(Debug, Default)]
pub struct LinearIndex {
    entries: HashMap<ColliderHandle, (Rect, u32)>,
    order: Vec<ColliderHandle>,
}

impl LinearIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for LinearIndex {
    fn insert(&mut self, handle: ColliderHandle, bounds: Rect, layer: u32) {
        if self.entries.insert(handle, (bounds, layer)).is_none() {
            self.order.push(handle);
        }
    }

    fn remove(&mut self, handle: ColliderHandle) {
        if self.entries.remove(&handle).is_some() {
            self.order.retain(|&other| other != handle);
        }
    }

    fn query(&self, bounds: &Rect, layer_mask: u32, out: &mut Vec<ColliderHandle>) {
        for handle in &self.order {
            if let Some((entry_bounds, layer)) = self.entries.get(handle) {
                if layer & layer_mask != 0 && entry_bounds.intersects(bounds) {
                    out.push(*handle);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

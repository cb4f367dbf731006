//! Spatial partitioning data structures
//!
//! Provides the broadphase index the physics world queries before running
//! exact shape tests.

mod spatial_hash;
mod spatial_query;

pub use spatial_hash::SpatialHash;
pub use spatial_query::{LinearIndex, SpatialIndex};

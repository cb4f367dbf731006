//! Entity-Component runtime
//!
//! Entities own an ordered [`ComponentList`]; a [`Scene`] owns a depth-sorted
//! [`EntityList`]. Both lists defer structural changes made while they are
//! being iterated and apply them at well-defined flush points.

pub mod component;
pub mod component_list;
pub mod context;
pub mod depth;
pub mod entity;
pub mod entity_list;
pub mod pool;
pub mod scene;
pub mod tags;

pub use component::{AsAny, Component, ComponentEntry, ComponentId, ComponentKind};
pub use component_list::{ComponentList, LockMode};
pub use context::{ComponentContext, RenderContext, SceneServices};
pub use depth::{ActualDepth, DepthOrdering};
pub use entity::{Entity, EntityCore, EntityId, EntityKind, IdSequence, SceneId};
pub use entity_list::{EntityList, PendingEntities};
pub use pool::Pooler;
pub use scene::Scene;
pub use tags::{BitTag, TagError, TagLists, TagRegistry, MAX_TAGS};

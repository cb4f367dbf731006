//! # Scene Engine
//!
//! Entity/component runtime core for 2D simulations.
//!
//! ## Features
//!
//! - **Deferred lifecycle**: entities and components added or removed while a
//!   list is iterating are applied at the next flush, never mid-iteration
//! - **Depth ordering**: stable, tie-broken depth sort for update and render
//! - **Tags**: up to 32 named tag bits with per-bit entity indexes
//! - **Movement**: collision-aware movement against solid colliders
//! - **Triggers**: exactly-once enter/exit notifications
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! let mut scene = Scene::new(&EngineConfig::default()).unwrap();
//! let wall = scene.create_entity("wall").at(Vec2::new(10.0, 0.0)).with(Collider::rect(4.0, 4.0).unwrap());
//! let player = scene.create_entity("player").with(Collider::rect(4.0, 4.0).unwrap()).with(Mover::new());
//! scene.add(wall);
//! let player = scene.add(player).unwrap();
//! scene.update_lists();
//!
//! let blocked = scene
//!     .with_component::<Mover, _>(player, |mover, cx| mover.move_by(cx, Vec2::new(8.0, 0.0)))
//!     .unwrap();
//! assert!(blocked);
//! assert_eq!(scene.get(player).unwrap().position(), Vec2::new(6.0, 0.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;

pub mod foundation;
pub mod ecs;
pub mod physics;
pub mod spatial;
pub mod debug;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineError,
        foundation::math::{Rect, Vec2},
        ecs::{
            Component, ComponentContext, ComponentId, ComponentKind, Entity, EntityId, EntityKind,
            IdSequence, RenderContext, Scene,
        },
        physics::{
            Collider, CollisionLayers, CollisionResult, Mover, Shape, TriggerEvent, TriggerListener,
            TriggerPhase,
        },
        debug::{DrawList, RenderTarget},
        core::config::{Config, EngineConfig},
    };
}

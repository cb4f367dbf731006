//! # Core Engine Module
//!
//! Shared abstractions used throughout the engine.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for all engine subsystems
//! - **Foundation**: Low-level utilities (math, collections, logging)
//! - **ECS**: Entities, components and the scene that drives them

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;
pub use crate::ecs;

// Re-export commonly used config types
pub use config::{
    EngineConfig,
    SceneConfig,
    PhysicsConfig,
    DebugConfig,
    LogLevel,
    Config,
    ConfigError,
};

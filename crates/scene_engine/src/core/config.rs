//! # Engine Configuration
//!
//! Concrete configuration types for the scene runtime. Every struct is
//! serde-friendly and fills missing fields from its `Default`, so a config
//! file only needs to name the values it overrides.
//!
//! ```toml
//! log_level = "debug"
//!
//! [scene]
//! tags = ["player", "solid"]
//!
//! [physics]
//! cell_size = 64.0
//! ```

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::debug::DebugColors;
use crate::ecs::tags::MAX_TAGS;

/// # Engine Configuration
///
/// Top-level configuration: logging plus the per-subsystem sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: LogLevel,
    /// Scene / entity list settings
    pub scene: SceneConfig,
    /// Physics world settings
    pub physics: PhysicsConfig,
    /// Debug rendering settings
    pub debug: DebugConfig,
}

/// Log filter string wrapper so the default lives in one place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl EngineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.0.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: "must not be empty".to_string(),
            });
        }
        self.scene.validate()?;
        self.physics.validate()
    }
}

impl Config for EngineConfig {}

/// # Scene Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Step used for the fractional view of actual depth
    /// (`depth - tie * depth_epsilon`); ordering itself never uses floats
    pub depth_epsilon: f64,
    /// Tag names registered when the scene is created, in bit order
    pub tags: Vec<String>,
    /// Maximum detached entities kept per pooled kind
    pub pool_capacity: usize,
    /// Maximum idle scratch buffers kept by each list pool
    pub list_pool_capacity: usize,
    /// Draw debug geometry after the regular render pass
    pub debug_render: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            depth_epsilon: 0.000_01,
            tags: Vec::new(),
            pool_capacity: 64,
            list_pool_capacity: 16,
            debug_render: false,
        }
    }
}

impl SceneConfig {
    /// Validate the scene section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.depth_epsilon > 0.0 && self.depth_epsilon < 1.0) {
            return Err(ConfigError::Invalid {
                field: "scene.depth_epsilon",
                reason: format!("{} is outside (0, 1)", self.depth_epsilon),
            });
        }
        if self.tags.len() > MAX_TAGS {
            return Err(ConfigError::Invalid {
                field: "scene.tags",
                reason: format!("{} tags declared, at most {MAX_TAGS} are supported", self.tags.len()),
            });
        }
        for (i, name) in self.tags.iter().enumerate() {
            if self.tags[..i].iter().any(|other| other.eq_ignore_ascii_case(name)) {
                return Err(ConfigError::Invalid {
                    field: "scene.tags",
                    reason: format!("tag '{name}' declared twice"),
                });
            }
        }
        Ok(())
    }
}

/// # Physics Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Cell size of the spatial hash broadphase
    pub cell_size: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { cell_size: 100.0 }
    }
}

impl PhysicsConfig {
    /// Validate the physics section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "physics.cell_size",
                reason: format!("{} is not a positive size", self.cell_size),
            });
        }
        Ok(())
    }
}

/// # Debug Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Palette used by collider debug drawing
    pub colors: DebugColors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            log_level = "debug"

            [scene]
            tags = ["player", "solid"]

            [physics]
            cell_size = 32.0
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level.0, "debug");
        assert_eq!(config.scene.tags, vec!["player", "solid"]);
        assert_eq!(config.scene.pool_capacity, SceneConfig::default().pool_capacity);
        assert_eq!(config.physics.cell_size, 32.0);
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("scene_engine_config_{}.ron", std::process::id()));
        let mut config = EngineConfig::default();
        config.scene.debug_render = true;
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(loaded.scene.debug_render);
    }

    #[test]
    fn test_rejects_unknown_extension_and_bad_values() {
        assert!(matches!(
            EngineConfig::load_from_file("engine.yaml"),
            Err(ConfigError::UnsupportedFormat(_)) | Err(ConfigError::Io(_))
        ));

        let mut config = EngineConfig::default();
        config.physics.cell_size = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "physics.cell_size", .. })));

        let mut config = EngineConfig::default();
        config.scene.tags = vec!["a".into(), "A".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config.log_level, LogLevel::default());
    }
}

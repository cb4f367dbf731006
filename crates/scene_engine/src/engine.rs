//! Core engine implementation

use crate::config::ConfigError;
use crate::core::config::EngineConfig;
use crate::debug::RenderTarget;
use crate::ecs::{Scene, TagError};
use crate::foundation::math::Rect;
use crate::physics::ShapeError;
use thiserror::Error;

/// Main engine struct
///
/// Owns the active scene and drives it with a fixed time step.
#[derive(Debug)]
pub struct Engine {
    /// Scene being simulated
    scene: Scene,

    /// Seconds per simulated frame
    time_step: f32,

    /// Frames stepped so far
    frame_count: u64,

    /// Whether the engine should continue running
    running: bool,
}

impl Engine {
    /// Create a new engine instance with a fresh scene
    pub fn new(config: &EngineConfig, time_step: f32) -> Result<Self, EngineError> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(EngineError::InvalidTimeStep(time_step));
        }
        log::info!("Initializing engine ({:.1} Hz)...", 1.0 / time_step);

        let scene = Scene::new(config)?;
        Ok(Self {
            scene,
            time_step,
            frame_count: 0,
            running: true,
        })
    }

    /// Begin the scene, then step it until `on_frame` returns false,
    /// [`Self::quit`] is called or `max_frames` frames have run
    pub fn run(&mut self, max_frames: u64, mut on_frame: impl FnMut(&mut Scene, u64) -> bool) {
        self.running = true;
        self.scene.begin();

        log::info!("Starting main loop...");
        while self.running && self.frame_count < max_frames {
            self.step();
            if !on_frame(&mut self.scene, self.frame_count) {
                self.quit();
            }
        }

        self.scene.end();
        log::info!("Engine shutdown complete after {} frame(s)", self.frame_count);
    }

    /// Simulate one frame
    pub fn step(&mut self) {
        self.scene.frame(self.time_step);
        self.frame_count += 1;
    }

    /// Render the current frame
    pub fn render(&mut self, target: &mut dyn RenderTarget, camera_bounds: Rect) {
        self.scene.render(target, camera_bounds);
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the loop is still running
    pub fn running(&self) -> bool {
        self.running
    }

    /// Frames stepped so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Seconds per frame
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Get the scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Get mutable access to the scene
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tag registration failed
    #[error("Tag error: {0}")]
    Tag(#[from] TagError),

    /// A collider shape was rejected
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Time step must be a positive number of seconds
    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f32),
}

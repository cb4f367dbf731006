//! Trigger walk demo
//!
//! A walker crosses a trigger zone, bumps into the wall behind it and walks
//! back out. Enter and exit notifications are logged as they happen.
//!
//! ```text
//! cargo run -p sandbox_app -- [config.toml|config.ron]
//! ```

use std::cell::Cell;
use std::rc::Rc;

use scene_engine::foundation::logging;
use scene_engine::physics::ColliderHandle;
use scene_engine::prelude::*;

const TIME_STEP: f32 = 1.0 / 60.0;
const MAX_FRAMES: u64 = 600;

/// Logs and counts what happens to the zone
struct ZoneListener {
    visits: Rc<Cell<u32>>,
}

impl TriggerListener for ZoneListener {
    fn on_trigger_enter(&mut self, trigger: ColliderHandle, other: ColliderHandle) {
        self.visits.set(self.visits.get() + 1);
        log::info!("zone {trigger:?}: {other:?} entered");
    }

    fn on_trigger_exit(&mut self, trigger: ColliderHandle, other: ColliderHandle) {
        log::info!("zone {trigger:?}: {other:?} left");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::default(),
    };
    logging::init(&config.log_level.0);

    let visits = Rc::new(Cell::new(0));
    let mut engine = Engine::new(&config, TIME_STEP)?;
    let scene = engine.scene_mut();

    let zone = scene
        .create_entity("zone")
        .at(Vec2::new(20.0, 0.0))
        .with(Collider::rect(8.0, 8.0)?.trigger().with_listener(ZoneListener { visits: visits.clone() }));
    let wall = scene
        .create_entity("wall")
        .at(Vec2::new(45.0, 0.0))
        .with(Collider::rect(2.0, 40.0)?);
    let walker = scene
        .create_entity("walker")
        .with(Collider::circle(2.0)?)
        .with(Mover::with_velocity(Vec2::new(30.0, 0.0)));
    scene.add(zone);
    scene.add(wall);
    let walker = scene.add(walker).ok_or("walker was rejected")?;

    engine.run(MAX_FRAMES, |scene, frame| {
        let Some(mover) = scene.get(walker).and_then(|entity| entity.get::<Mover>()) else {
            return false;
        };
        if let Some(hit) = mover.last_collision() {
            log::info!("frame {frame}: walker blocked, normal {:?}", hit.normal);
            let velocity = -mover.velocity();
            scene.with_component::<Mover, _>(walker, |mover, _| mover.set_velocity(velocity));
        }
        scene.get(walker).is_some_and(|entity| entity.position().x > -10.0)
    });

    log::info!(
        "walker visited the zone {} time(s) in {} frame(s)",
        visits.get(),
        engine.frame_count()
    );
    Ok(())
}

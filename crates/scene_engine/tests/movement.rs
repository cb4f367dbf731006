//! Collision-aware movement and trigger enter/exit tracking

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use scene_engine::physics::{ColliderHandle, Pair};
use scene_engine::prelude::*;

#[derive(Debug, Default)]
struct Tally {
    enters: u32,
    exits: u32,
}

/// Counts notifications delivered to one trigger
struct Counter(Rc<RefCell<Tally>>);

impl TriggerListener for Counter {
    fn on_trigger_enter(&mut self, _trigger: ColliderHandle, _other: ColliderHandle) {
        self.0.borrow_mut().enters += 1;
    }

    fn on_trigger_exit(&mut self, _trigger: ColliderHandle, _other: ColliderHandle) {
        self.0.borrow_mut().exits += 1;
    }
}

/// Records the order of notifications delivered to one trigger
struct Journal(Rc<RefCell<Vec<TriggerPhase>>>);

impl TriggerListener for Journal {
    fn on_trigger_enter(&mut self, _trigger: ColliderHandle, _other: ColliderHandle) {
        self.0.borrow_mut().push(TriggerPhase::Enter);
    }

    fn on_trigger_exit(&mut self, _trigger: ColliderHandle, _other: ColliderHandle) {
        self.0.borrow_mut().push(TriggerPhase::Exit);
    }
}

fn scene() -> Scene {
    Scene::new(&EngineConfig::default()).unwrap()
}

fn spawn(scene: &mut Scene, name: &str, position: Vec2, collider: Collider) -> EntityId {
    let entity = scene.create_entity(name).at(position).with(collider);
    scene.add(entity).unwrap()
}

fn spawn_mover(scene: &mut Scene, name: &str, position: Vec2, collider: Collider) -> EntityId {
    let entity = scene.create_entity(name).at(position).with(collider).with(Mover::new());
    scene.add(entity).unwrap()
}

fn collider_of(scene: &Scene, id: EntityId) -> ColliderHandle {
    scene.physics().colliders_of(id)[0]
}

fn move_by(scene: &mut Scene, id: EntityId, motion: Vec2) -> (bool, Vec<TriggerEvent>) {
    scene
        .with_component::<Mover, _>(id, |mover, cx| {
            let blocked = mover.move_by(cx, motion);
            (blocked, mover.trigger_events().to_vec())
        })
        .unwrap()
}

fn position(scene: &Scene, id: EntityId) -> Vec2 {
    scene.get(id).unwrap().position()
}

#[test]
fn test_calculated_motion_is_request_minus_mtv_and_separates() {
    let mut scene = scene();
    let player = spawn_mover(&mut scene, "player", Vec2::zeros(), Collider::rect(4.0, 4.0).unwrap());
    let wall = spawn(&mut scene, "wall", Vec2::new(10.0, 0.0), Collider::rect(4.0, 4.0).unwrap());
    scene.update_lists();
    let wall_collider = collider_of(&scene, wall);

    let requested = Vec2::new(8.0, 0.0);
    let (corrected, hit) = scene
        .with_component::<Mover, _>(player, |mover, cx| {
            let (corrected, hit) = mover.calculate_movement(cx, requested);
            mover.apply_movement(cx, corrected);
            (corrected, hit)
        })
        .unwrap();

    assert!(hit.is_hit());
    assert_eq!(hit.collider, Some(wall_collider));
    assert_eq!(corrected, requested - hit.minimum_translation_vector);
    assert_relative_eq!(corrected.x, 6.0);
    assert_relative_eq!(hit.normal.x, -1.0);
    assert_eq!(position(&scene, player), corrected);
    assert!(!scene.physics().overlaps(collider_of(&scene, player), wall_collider));
}

#[test]
fn test_sliding_keeps_the_free_axis() {
    let mut scene = scene();
    let player = spawn_mover(&mut scene, "player", Vec2::zeros(), Collider::rect(4.0, 4.0).unwrap());
    spawn(&mut scene, "wall", Vec2::new(10.0, 0.0), Collider::rect(4.0, 40.0).unwrap());
    scene.update_lists();

    let (blocked, _) = move_by(&mut scene, player, Vec2::new(8.0, 3.0));

    assert!(blocked);
    assert_relative_eq!(position(&scene, player).x, 6.0);
    assert_relative_eq!(position(&scene, player).y, 3.0);
}

#[test]
fn test_circle_stops_at_box_face() {
    let mut scene = scene();
    let ball = spawn_mover(&mut scene, "ball", Vec2::zeros(), Collider::circle(1.0).unwrap());
    spawn(&mut scene, "crate", Vec2::new(3.0, 0.0), Collider::rect(2.0, 2.0).unwrap());
    scene.update_lists();

    let (blocked, _) = move_by(&mut scene, ball, Vec2::new(2.0, 0.0));

    assert!(blocked);
    assert_relative_eq!(position(&scene, ball).x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(position(&scene, ball).y, 0.0, epsilon = 1e-5);
}

#[test]
fn test_triggers_never_block() {
    let mut scene = scene();
    let player = spawn_mover(&mut scene, "player", Vec2::zeros(), Collider::rect(4.0, 4.0).unwrap());
    let zone = spawn(&mut scene, "zone", Vec2::new(10.0, 0.0), Collider::rect(4.0, 4.0).unwrap().trigger());
    scene.update_lists();

    let (blocked, events) = move_by(&mut scene, player, Vec2::new(8.0, 0.0));

    assert!(!blocked);
    assert_eq!(position(&scene, player), Vec2::new(8.0, 0.0));
    assert_eq!(
        events,
        vec![TriggerEvent {
            phase: TriggerPhase::Enter,
            trigger: collider_of(&scene, zone),
            other: collider_of(&scene, player),
        }]
    );
}

#[test]
fn test_layers_filter_blocking() {
    let ghosts = CollisionLayers::layer(2);
    let mut scene = scene();
    let player = spawn_mover(
        &mut scene,
        "player",
        Vec2::zeros(),
        Collider::rect(4.0, 4.0).unwrap().colliding_with(CollisionLayers::DEFAULT),
    );
    spawn(&mut scene, "ghost", Vec2::new(10.0, 0.0), Collider::rect(4.0, 4.0).unwrap().on_layer(ghosts));
    scene.update_lists();

    let (blocked, _) = move_by(&mut scene, player, Vec2::new(8.0, 0.0));
    assert!(!blocked);
    assert_eq!(position(&scene, player), Vec2::new(8.0, 0.0));
}

#[test]
fn test_mover_without_collider_moves_freely() {
    let mut scene = scene();
    let drifter = scene.add(scene.create_entity("drifter").with(Mover::new())).unwrap();
    scene.update_lists();

    let result = scene
        .with_component::<Mover, _>(drifter, |mover, cx| mover.calculate_movement(cx, Vec2::new(3.0, -2.0)))
        .unwrap();
    assert_eq!(result.0, Vec2::new(3.0, -2.0));
    assert!(!result.1.is_hit());

    let (blocked, events) = move_by(&mut scene, drifter, Vec2::new(3.0, -2.0));
    assert!(!blocked);
    assert!(events.is_empty());
    assert_eq!(position(&scene, drifter), Vec2::new(3.0, -2.0));
}

#[test]
fn test_trigger_walk_in_and_out() {
    let tally = Rc::new(RefCell::new(Tally::default()));
    let mut scene = scene();
    let zone = spawn(
        &mut scene,
        "zone",
        Vec2::new(5.0, 0.0),
        Collider::rect(2.0, 2.0).unwrap().trigger().with_listener(Counter(tally.clone())),
    );
    let walker = spawn_mover(&mut scene, "walker", Vec2::zeros(), Collider::rect(2.0, 2.0).unwrap());
    scene.update_lists();

    let inward: Vec<_> = [1.0, 1.0, 3.0]
        .into_iter()
        .map(|dx| move_by(&mut scene, walker, Vec2::new(dx, 0.0)).1)
        .collect();
    assert!(inward[0].is_empty());
    assert!(inward[1].is_empty());
    assert_eq!(inward[2].len(), 1);
    assert_eq!(inward[2][0].phase, TriggerPhase::Enter);
    assert_eq!(inward[2][0].trigger, collider_of(&scene, zone));

    let outward: Vec<_> = (0..2)
        .map(|_| move_by(&mut scene, walker, Vec2::new(-1.0, 0.0)).1)
        .collect();
    assert!(outward[0].is_empty());
    assert_eq!(outward[1].len(), 1);
    assert_eq!(outward[1][0].phase, TriggerPhase::Exit);

    let tally = tally.borrow();
    assert_eq!((tally.enters, tally.exits), (1, 1));
}

#[test]
fn test_enter_and_exit_fire_once_across_frames() {
    let mut scene = scene();
    spawn(&mut scene, "zone", Vec2::new(5.0, 0.0), Collider::rect(2.0, 2.0).unwrap().trigger());
    let runner = scene
        .create_entity("runner")
        .with(Collider::rect(2.0, 2.0).unwrap())
        .with(Mover::with_velocity(Vec2::new(1.0, 0.0)));
    let runner = scene.add(runner).unwrap();

    let mut timeline = Vec::new();
    for frame in 1..=9 {
        scene.frame(1.0);
        let mover = scene.get(runner).unwrap().get::<Mover>().unwrap();
        for event in mover.trigger_events() {
            timeline.push((frame, event.phase));
        }
    }

    assert_eq!(timeline, vec![(4, TriggerPhase::Enter), (7, TriggerPhase::Exit)]);
}

#[test]
fn test_two_triggers_notify_both_sides() {
    let mut scene = scene();
    let zone = spawn(&mut scene, "zone", Vec2::new(5.0, 0.0), Collider::rect(2.0, 2.0).unwrap().trigger());
    let scout = spawn_mover(&mut scene, "scout", Vec2::zeros(), Collider::rect(2.0, 2.0).unwrap().trigger());
    scene.update_lists();

    let (_, events) = move_by(&mut scene, scout, Vec2::new(5.0, 0.0));

    let (zone_collider, scout_collider) = (collider_of(&scene, zone), collider_of(&scene, scout));
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|event| event.phase == TriggerPhase::Enter));
    assert!(events.iter().any(|event| event.trigger == zone_collider && event.other == scout_collider));
    assert!(events.iter().any(|event| event.trigger == scout_collider && event.other == zone_collider));

    let tracked: Vec<_> = scene
        .get(scout)
        .unwrap()
        .get::<Mover>()
        .unwrap()
        .tracker()
        .overlapping()
        .copied()
        .collect();
    assert_eq!(tracked, vec![Pair::new(zone_collider, scout_collider)]);
}

#[test]
fn test_each_mover_tracks_its_own_pairs() {
    // The same pair seen by two movers is reported once per mover.
    let tally = Rc::new(RefCell::new(Tally::default()));
    let mut scene = scene();
    let zone = spawn_mover(
        &mut scene,
        "zone",
        Vec2::new(5.0, 0.0),
        Collider::rect(2.0, 2.0).unwrap().trigger().with_listener(Counter(tally.clone())),
    );
    let walker = spawn_mover(&mut scene, "walker", Vec2::zeros(), Collider::rect(2.0, 2.0).unwrap());
    scene.update_lists();

    move_by(&mut scene, walker, Vec2::new(5.0, 0.0));
    let (_, zone_events) = move_by(&mut scene, zone, Vec2::zeros());
    move_by(&mut scene, walker, Vec2::zeros());

    assert_eq!(zone_events.len(), 1);
    assert_eq!(tally.borrow().enters, 2);
    assert_eq!(tally.borrow().exits, 0);
}

#[test]
fn test_disabled_trigger_exits_before_entering_again() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut scene = scene();
    let zone = spawn(
        &mut scene,
        "zone",
        Vec2::new(5.0, 0.0),
        Collider::rect(2.0, 2.0).unwrap().trigger().with_listener(Journal(journal.clone())),
    );
    let walker = spawn_mover(&mut scene, "walker", Vec2::zeros(), Collider::rect(2.0, 2.0).unwrap());
    scene.update_lists();

    move_by(&mut scene, walker, Vec2::new(5.0, 0.0));
    let first_handle = collider_of(&scene, zone);

    scene.set_entity_enabled(zone, false);
    let (_, events) = move_by(&mut scene, walker, Vec2::zeros());
    assert_eq!(
        events,
        vec![TriggerEvent {
            phase: TriggerPhase::Exit,
            trigger: first_handle,
            other: collider_of(&scene, walker),
        }]
    );

    scene.set_entity_enabled(zone, true);
    let (_, events) = move_by(&mut scene, walker, Vec2::zeros());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].phase, TriggerPhase::Enter);
    assert_eq!(events[0].trigger, collider_of(&scene, zone));

    assert_eq!(
        *journal.borrow(),
        vec![TriggerPhase::Enter, TriggerPhase::Exit, TriggerPhase::Enter]
    );
}

#[test]
fn test_removed_trigger_still_hears_the_exit() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut scene = scene();
    let zone = spawn(
        &mut scene,
        "zone",
        Vec2::new(5.0, 0.0),
        Collider::rect(2.0, 2.0).unwrap().trigger().with_listener(Journal(journal.clone())),
    );
    let walker = spawn_mover(&mut scene, "walker", Vec2::zeros(), Collider::rect(2.0, 2.0).unwrap());
    scene.update_lists();

    move_by(&mut scene, walker, Vec2::new(5.0, 0.0));
    scene.remove(zone);
    scene.update_lists();
    assert_eq!(scene.physics().len(), 1);

    let (_, events) = move_by(&mut scene, walker, Vec2::zeros());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].phase, TriggerPhase::Exit);
    assert!(scene.get(walker).unwrap().get::<Mover>().unwrap().tracker().overlapping().next().is_none());
    assert_eq!(*journal.borrow(), vec![TriggerPhase::Enter, TriggerPhase::Exit]);
}

#[test]
fn test_collider_registration_follows_entity_state() {
    let mut scene = scene();
    let id = spawn(&mut scene, "crate", Vec2::zeros(), Collider::rect(1.0, 1.0).unwrap());
    assert!(scene.physics().is_empty());

    scene.update_lists();
    assert_eq!(scene.physics().len(), 1);

    scene.set_entity_enabled(id, false);
    assert!(scene.physics().is_empty());
    scene.set_entity_enabled(id, true);
    assert_eq!(scene.physics().len(), 1);

    let collider = scene.get(id).unwrap().components().iter().next().unwrap().id();
    scene.remove_component(id, collider);
    assert!(scene.physics().is_empty());
    assert!(scene.get(id).unwrap().components().is_empty());

    scene.add_component(id, Collider::circle(2.0).unwrap()).unwrap();
    assert_eq!(scene.physics().len(), 1);

    scene.remove(id);
    scene.update_lists();
    assert!(scene.physics().is_empty());
}

#[test]
fn test_polygon_collider_keeps_its_centroid() {
    let mut scene = scene();
    let triangle = Collider::polygon(&[Vec2::new(0.0, 0.0), Vec2::new(6.0, 0.0), Vec2::new(0.0, 6.0)]).unwrap();
    let id = spawn(&mut scene, "ramp", Vec2::new(10.0, 10.0), triangle);
    scene.update_lists();

    let record = scene.physics().get(collider_of(&scene, id)).unwrap();
    assert_relative_eq!(record.center().x, 12.0, epsilon = 1e-5);
    assert_relative_eq!(record.center().y, 12.0, epsilon = 1e-5);
    assert_relative_eq!(record.bounds().min.x, 10.0, epsilon = 1e-5);
    assert_relative_eq!(record.bounds().max.y, 16.0, epsilon = 1e-5);
}

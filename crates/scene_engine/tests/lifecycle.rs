//! Deferred add/remove, depth ordering and render locking, driven through a
//! full scene

use std::cell::RefCell;
use std::rc::Rc;

use scene_engine::debug::{DrawCommand, DrawList};
use scene_engine::ecs::{ComponentKind, EntityCore};
use scene_engine::prelude::*;

type Log = Rc<RefCell<Vec<String>>>;

/// Records its lifecycle hooks into a shared log
struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self { name, log: log.clone() }
    }

    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{}:{event}", self.name));
    }
}

impl Component for Recorder {
    fn added(&mut self, _cx: &mut ComponentContext<'_>) {
        self.record("added");
    }

    fn removed(&mut self, _cx: &mut ComponentContext<'_>) {
        self.record("removed");
    }

    fn entity_added(&mut self, _cx: &mut ComponentContext<'_>) {
        self.record("entity_added");
    }

    fn entity_removed(&mut self, _cx: &mut ComponentContext<'_>) {
        self.record("entity_removed");
    }

    fn entity_awake(&mut self, _cx: &mut ComponentContext<'_>) {
        self.record("awake");
    }

    fn update(&mut self, _cx: &mut ComponentContext<'_>) {
        self.record("update");
    }
}

/// Spawns one child entity during its first update
struct Spawner {
    log: Log,
    spawned: bool,
}

impl Component for Spawner {
    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        self.log.borrow_mut().push("spawner:update".into());
        if !self.spawned {
            self.spawned = true;
            let child = Entity::new("child", cx.ids()).with(Recorder::new("child", &self.log));
            cx.add_entity(child);
        }
    }
}

/// Removes its own entity during update
struct SelfDestruct;

impl Component for SelfDestruct {
    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        cx.destroy();
    }
}

/// Attaches a sibling component during its first update
struct Grower {
    log: Log,
    grown: bool,
}

impl Component for Grower {
    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        if !self.grown {
            self.grown = true;
            cx.add_component(Recorder::new("sibling", &self.log));
        }
    }
}

/// Tries to mutate its entity while being drawn
struct Vandal;

impl Component for Vandal {
    fn kind(&self) -> ComponentKind {
        ComponentKind::RENDERABLE
    }

    fn render(&self, cx: &mut RenderContext<'_>) {
        cx.add_component(SelfDestruct);
    }
}

/// Draws a quad covering its bounds
struct Sprite {
    size: f32,
}

impl Component for Sprite {
    fn kind(&self) -> ComponentKind {
        ComponentKind::RENDERABLE
    }

    fn render(&self, cx: &mut RenderContext<'_>) {
        let bounds = self.bounds(cx.entity()).unwrap_or_default();
        cx.target().draw_quad(bounds, scene_engine::debug::Color::WHITE);
    }

    fn bounds(&self, entity: &EntityCore) -> Option<Rect> {
        let half = Vec2::new(self.size, self.size) * 0.5;
        Some(Rect::new(entity.position() - half, entity.position() + half))
    }
}

fn scene() -> Scene {
    Scene::new(&EngineConfig::default()).unwrap()
}

fn entries(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[test]
fn test_entity_added_during_update_joins_on_next_flush() {
    let log = Log::default();
    let mut scene = scene();
    let spawner = scene
        .create_entity("spawner")
        .with(Spawner { log: log.clone(), spawned: false });
    scene.add(spawner);

    scene.frame(0.016);
    assert_eq!(entries(&log), vec!["spawner:update", "child:added"]);
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.entities().pending().additions(), 1);

    scene.frame(0.016);
    assert_eq!(
        entries(&log),
        vec!["child:entity_added", "child:awake", "spawner:update", "child:update"]
    );
    assert!(scene.find_by_name("child").is_some());
}

#[test]
fn test_entity_removed_during_update_stays_until_flush() {
    let log = Log::default();
    let mut scene = scene();
    let doomed = scene
        .create_entity("doomed")
        .with(SelfDestruct)
        .with(Recorder::new("doomed", &log));
    let doomed = scene.add(doomed).unwrap();
    scene.update_lists();
    entries(&log);

    scene.update();
    assert!(scene.contains(doomed));
    assert!(scene.entities().pending().is_removing(doomed));
    assert_eq!(entries(&log), vec!["doomed:update"]);

    scene.update_lists();
    assert!(!scene.contains(doomed));
    assert_eq!(entries(&log), vec!["doomed:entity_removed"]);
}

#[test]
fn test_double_remove_has_no_second_effect() {
    let log = Log::default();
    let mut scene = scene();
    let id = scene.add(scene.create_entity("once").with(Recorder::new("once", &log))).unwrap();
    scene.update_lists();
    entries(&log);

    assert!(scene.remove(id));
    assert!(!scene.remove(id));
    scene.update_lists();
    assert!(!scene.remove(id));
    scene.update_lists();

    assert_eq!(entries(&log), vec!["once:entity_removed"]);
}

#[test]
fn test_flush_removes_before_adding() {
    /// Counts the colliders registered when its entity joins the scene
    struct Census {
        seen: Rc<RefCell<Option<usize>>>,
    }

    impl Component for Census {
        fn entity_added(&mut self, cx: &mut ComponentContext<'_>) {
            *self.seen.borrow_mut() = cx.physics_mut().map(|physics| physics.len());
        }
    }

    let log = Log::default();
    let seen = Rc::new(RefCell::new(None));
    let mut scene = scene();
    let old = scene
        .add(
            scene
                .create_entity("old")
                .with(Collider::rect(2.0, 2.0).unwrap())
                .with(Recorder::new("old", &log)),
        )
        .unwrap();
    scene.update_lists();
    assert_eq!(scene.physics().len(), 1);
    let newcomer = scene
        .create_entity("new")
        .with(Census { seen: seen.clone() })
        .with(Recorder::new("new", &log));
    entries(&log);

    scene.remove(old);
    scene.add(newcomer);
    scene.update_lists();

    assert_eq!(*seen.borrow(), Some(0));
    assert_eq!(entries(&log), vec!["old:entity_removed", "new:entity_added", "new:awake"]);
}

#[test]
fn test_component_added_during_update_is_deferred() {
    let log = Log::default();
    let mut scene = scene();
    let id = scene
        .add(scene.create_entity("grower").with(Grower { log: log.clone(), grown: false }))
        .unwrap();

    scene.frame(0.016);
    assert_eq!(entries(&log), vec!["sibling:added"]);
    assert_eq!(scene.get(id).unwrap().components().len(), 2);

    scene.frame(0.016);
    assert_eq!(entries(&log), vec!["sibling:update"]);
}

#[test]
fn test_same_depth_entities_keep_arrival_order() {
    let mut scene = scene();
    let e = scene.add(scene.create_entity("E").with_depth(5)).unwrap();
    let f = scene.add(scene.create_entity("F").with_depth(5)).unwrap();
    scene.update_lists();

    let (e_depth, f_depth) = (scene.get(e).unwrap().actual_depth(), scene.get(f).unwrap().actual_depth());
    assert!(e_depth > f_depth);

    let order: Vec<_> = scene.iter().map(|entity| entity.id()).collect();
    assert_eq!(order, vec![e, f]);
}

#[test]
fn test_same_depth_batch_has_strictly_decreasing_depths() {
    let mut scene = scene();
    let ids: Vec<_> = (0..8)
        .map(|i| scene.add(scene.create_entity(format!("e{i}")).with_depth(3)).unwrap())
        .collect();
    scene.update_lists();

    let depths: Vec<_> = ids.iter().map(|&id| scene.get(id).unwrap().actual_depth()).collect();
    assert!(depths.windows(2).all(|pair| pair[0] > pair[1]));

    let epsilon = 0.000_01;
    let values: Vec<_> = depths.iter().map(|depth| depth.value(epsilon)).collect();
    assert!(values.windows(2).all(|pair| pair[0] > pair[1]));
    assert!(values.iter().all(|&value| value <= 3.0 && value > 2.9));
}

#[test]
fn test_depth_change_resorts_on_next_flush() {
    let mut config = EngineConfig::default();
    config.scene.tags = vec!["layer".into()];
    let mut scene = Scene::new(&config).unwrap();
    let layer = scene.tag("layer").unwrap().clone();
    let [a, b, c] = ["a", "b", "c"]
        .map(|name| scene.add(scene.create_entity(name).with_depth(5).with_tag(layer.value())).unwrap());
    scene.update_lists();
    let order = |scene: &Scene| scene.iter().map(|entity| entity.id()).collect::<Vec<_>>();
    assert_eq!(order(&scene), vec![a, b, c]);
    assert_eq!(scene.entities_with_tag(&layer), &[a, b, c]);

    let before = scene.get(b).unwrap().actual_depth();
    scene.with_entity(b, |cx| cx.set_depth(9));
    assert_eq!(scene.get(b).unwrap().depth(), 9);
    assert_eq!(order(&scene), vec![a, b, c]);

    scene.update_lists();
    assert_eq!(order(&scene), vec![b, a, c]);
    assert_eq!(scene.entities_with_tag(&layer), &[b, a, c]);
    assert_ne!(scene.get(b).unwrap().actual_depth(), before);

    // Returning to an old depth takes a fresh tie behind everyone already there.
    scene.with_entity(c, |cx| cx.set_depth(9));
    scene.with_entity(b, |cx| cx.set_depth(5));
    scene.update_lists();
    assert_eq!(order(&scene), vec![c, a, b]);
    assert_eq!(scene.entities_with_tag(&layer), &[c, a, b]);

    let depths: Vec<_> = [a, b, c].iter().map(|&id| scene.get(id).unwrap().actual_depth()).collect();
    assert_eq!(depths[1].tie(), 3);
    assert!(depths[0] > depths[1]);
    assert!(depths.iter().enumerate().all(|(i, x)| depths[i + 1..].iter().all(|y| x != y)));
}

#[test]
fn test_update_order_follows_depth() {
    let log = Log::default();
    let mut scene = scene();
    scene.add(scene.create_entity("front").with_depth(-10).with(Recorder::new("front", &log)));
    scene.add(scene.create_entity("back").with_depth(10).with(Recorder::new("back", &log)));
    scene.add(scene.create_entity("middle").with(Recorder::new("middle", &log)));
    scene.update_lists();
    entries(&log);

    scene.update();
    assert_eq!(entries(&log), vec!["back:update", "middle:update", "front:update"]);
}

#[test]
fn test_disabled_entities_are_skipped() {
    let log = Log::default();
    let mut scene = scene();
    let id = scene.add(scene.create_entity("sleepy").with(Recorder::new("sleepy", &log))).unwrap();
    scene.update_lists();
    entries(&log);

    scene.set_entity_enabled(id, false);
    scene.update();
    assert!(entries(&log).is_empty());
    assert!(!scene.get(id).unwrap().enabled());

    scene.set_entity_enabled(id, true);
    scene.update();
    assert_eq!(entries(&log), vec!["sleepy:update"]);
}

#[test]
#[should_panic(expected = "rendering")]
fn test_component_mutation_during_render_panics() {
    let mut scene = scene();
    scene.add(scene.create_entity("vandal").with(Vandal));
    scene.update_lists();

    let mut target = DrawList::new();
    scene.render(&mut target, Rect::from_xywh(-100.0, -100.0, 200.0, 200.0));
}

#[test]
fn test_render_culls_against_camera_and_skips_hidden() {
    let mut scene = scene();
    scene.add(scene.create_entity("seen").with(Sprite { size: 2.0 }));
    scene.add(scene.create_entity("far").at(Vec2::new(500.0, 0.0)).with(Sprite { size: 2.0 }));
    let mut hidden = scene.create_entity("hidden").with(Sprite { size: 2.0 });
    hidden.set_visible(false);
    scene.add(hidden);
    scene.update_lists();

    let mut target = DrawList::new();
    scene.render(&mut target, Rect::from_xywh(-10.0, -10.0, 20.0, 20.0));

    assert_eq!(target.commands.len(), 1);
    assert!(matches!(target.commands[0], DrawCommand::Quad(..)));
}

#[test]
fn test_debug_render_draws_collider_geometry() {
    let mut config = EngineConfig::default();
    config.scene.debug_render = true;
    let mut scene = Scene::new(&config).unwrap();
    scene.add(scene.create_entity("box").at(Vec2::new(3.0, 4.0)).with(Collider::rect(2.0, 2.0).unwrap()));
    scene.update_lists();

    let mut target = DrawList::new();
    scene.render(&mut target, Rect::from_xywh(-10.0, -10.0, 20.0, 20.0));

    let colors = config.debug.colors;
    assert_eq!(
        target.commands,
        vec![
            DrawCommand::HollowRect(Rect::from_xywh(2.0, 3.0, 2.0, 2.0), colors.collider_bounds),
            DrawCommand::Polygon(
                vec![
                    Vec2::new(2.0, 3.0),
                    Vec2::new(4.0, 3.0),
                    Vec2::new(4.0, 5.0),
                    Vec2::new(2.0, 5.0),
                ],
                colors.collider_edge
            ),
            DrawCommand::Point(Vec2::new(3.0, 4.0), colors.collider_position),
            DrawCommand::Point(Vec2::new(3.0, 4.0), colors.collider_center),
        ]
    );
}

#[test]
fn test_tags_follow_context_changes() {
    struct Promote {
        mask: u32,
    }

    impl Component for Promote {
        fn update(&mut self, cx: &mut ComponentContext<'_>) {
            cx.add_tag(self.mask);
            cx.remove_self();
        }
    }

    let mut config = EngineConfig::default();
    config.scene.tags = vec!["hero".into()];
    let mut scene = Scene::new(&config).unwrap();
    let hero = scene.tag("hero").unwrap().clone();

    let id = scene.add(scene.create_entity("squire").with(Promote { mask: hero.value() })).unwrap();
    scene.frame(0.016);

    assert_eq!(scene.entities_with_tag(&hero), &[id]);
    assert!(scene.get(id).unwrap().tag_check(hero.value()));
    assert!(scene.get(id).unwrap().components().is_empty());
}

#[test]
fn test_config_file_drives_scene_setup() {
    let path = std::env::temp_dir().join(format!("scene_engine_it_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        [scene]
        tags = ["player", "enemy"]
        pool_capacity = 2
        "#,
    )
    .unwrap();

    let config = EngineConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let scene = Scene::new(&config).unwrap();
    assert_eq!(scene.tag("enemy").unwrap().value(), 0b10);
    assert!(scene.tag("boss").is_err());
}

//! Trigger overlap tracking
//!
//! A [`TriggerTracker`] belongs to one moving entity. Each update it gathers
//! the trigger pairs the entity's colliders currently overlap and compares
//! them with last frame's set: new pairs fire *enter*, vanished pairs fire
//! *exit*. Only the trigger side(s) of a pair are notified.
//!
//! Every mover owns its own tracker, so when two movers overlap the same
//! trigger each of them reports the pair. A listener can therefore see the
//! same enter twice in one frame.
//!
//! The trigger sides of a pair are captured when the pair forms. An exit still
//! reaches the trigger's listener after its collider left the physics world,
//! so enter and exit keep alternating across disable/enable and removal.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ecs::EntityId;
use crate::physics::{ColliderHandle, Physics};

/// Unordered pair, stored with the smaller element first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair<T> {
    first: T,
    second: T,
}

impl<T: Ord + Copy> Pair<T> {
    /// Create a pair; `Pair::new(a, b) == Pair::new(b, a)`
    pub fn new(a: T, b: T) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Smaller element
    pub fn first(&self) -> T {
        self.first
    }

    /// Larger element
    pub fn second(&self) -> T {
        self.second
    }

    /// Whether `item` is one of the two
    pub fn contains(&self, item: T) -> bool {
        self.first == item || self.second == item
    }

    /// The element paired with `item`
    pub fn other(&self, item: T) -> Option<T> {
        if item == self.first {
            Some(self.second)
        } else if item == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

/// Receives enter/exit notifications for one trigger collider
pub trait TriggerListener {
    /// `other` started overlapping `trigger`
    fn on_trigger_enter(&mut self, _trigger: ColliderHandle, _other: ColliderHandle) {}

    /// `other` stopped overlapping `trigger`
    fn on_trigger_exit(&mut self, _trigger: ColliderHandle, _other: ColliderHandle) {}
}

/// Listener shared between a collider and the trackers that saw it overlap
pub type SharedListener = Rc<RefCell<dyn TriggerListener>>;

/// Enter or exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerPhase {
    /// Overlap began
    Enter,
    /// Overlap ended
    Exit,
}

/// One notification delivered to a trigger side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Enter or exit
    pub phase: TriggerPhase,
    /// The trigger collider that was notified
    pub trigger: ColliderHandle,
    /// The collider on the other side of the pair
    pub other: ColliderHandle,
}

/// Trigger side of a pair as it was when the pair formed
#[derive(Clone)]
struct TriggerSide {
    trigger: ColliderHandle,
    other: ColliderHandle,
    listener: Option<SharedListener>,
}

impl fmt::Debug for TriggerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerSide")
            .field("trigger", &self.trigger)
            .field("other", &self.other)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

type TriggerSides = [Option<TriggerSide>; 2];

/// Per-mover enter/exit bookkeeping
#[derive(Debug, Default)]
pub struct TriggerTracker {
    active: HashMap<Pair<ColliderHandle>, TriggerSides>,
    previous: HashMap<Pair<ColliderHandle>, TriggerSides>,
    events: Vec<TriggerEvent>,
}

impl TriggerTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs overlapping as of the last update
    pub fn overlapping(&self) -> impl Iterator<Item = &Pair<ColliderHandle>> {
        self.previous.keys()
    }

    /// Events emitted by the last update, enters first
    pub fn events(&self) -> &[TriggerEvent] {
        &self.events
    }

    /// Forget every pair without emitting exits
    pub fn reset(&mut self) {
        self.active.clear();
        self.previous.clear();
        self.events.clear();
    }

    /// Re-evaluate the trigger overlaps of `entity`'s colliders
    pub fn update(&mut self, entity: EntityId, physics: &mut Physics) -> &[TriggerEvent] {
        self.events.clear();

        let mut colliders = physics.obtain_list();
        colliders.extend_from_slice(physics.colliders_of(entity));
        for &collider in &colliders {
            let Some(record) = physics.get(collider) else {
                continue;
            };
            let (bounds, mask, is_trigger) =
                (record.bounds(), record.collides_with_layers(), record.is_trigger());

            let neighbors = physics.boxcast_broadphase_excluding(entity, &bounds, mask);
            for &neighbor in &neighbors {
                let neighbor_is_trigger = physics.get(neighbor).is_some_and(|n| n.is_trigger());
                if !is_trigger && !neighbor_is_trigger {
                    continue;
                }
                if !physics.overlaps(collider, neighbor) {
                    continue;
                }
                let pair = Pair::new(collider, neighbor);
                if self.active.contains_key(&pair) {
                    continue;
                }
                let sides = match self.previous.get(&pair).cloned() {
                    Some(sides) => sides,
                    None => {
                        let sides = trigger_sides(physics, pair);
                        self.notify(&sides, TriggerPhase::Enter);
                        sides
                    }
                };
                self.active.insert(pair, sides);
            }
            physics.free_list(neighbors);
        }
        physics.free_list(colliders);

        self.check_for_exited_pairs();
        &self.events
    }

    fn check_for_exited_pairs(&mut self) {
        let mut exited: Vec<_> = self
            .previous
            .iter()
            .filter(|(pair, _)| !self.active.contains_key(pair))
            .map(|(&pair, sides)| (pair, sides.clone()))
            .collect();
        exited.sort_unstable_by_key(|&(pair, _)| pair);
        for (_, sides) in exited {
            self.notify(&sides, TriggerPhase::Exit);
        }

        self.previous = std::mem::take(&mut self.active);
    }

    fn notify(&mut self, sides: &TriggerSides, phase: TriggerPhase) {
        for side in sides.iter().flatten() {
            let (trigger, other) = (side.trigger, side.other);
            log::debug!("trigger {phase:?}: {trigger:?} <- {other:?}");
            self.events.push(TriggerEvent { phase, trigger, other });
            if let Some(listener) = &side.listener {
                let mut listener = listener.borrow_mut();
                match phase {
                    TriggerPhase::Enter => listener.on_trigger_enter(trigger, other),
                    TriggerPhase::Exit => listener.on_trigger_exit(trigger, other),
                }
            }
        }
    }
}

/// The trigger side(s) of `pair`, each told about the other collider
fn trigger_sides(physics: &Physics, pair: Pair<ColliderHandle>) -> TriggerSides {
    [(pair.first, pair.second), (pair.second, pair.first)].map(|(trigger, other)| {
        physics
            .get(trigger)
            .filter(|record| record.is_trigger())
            .map(|record| TriggerSide { trigger, other, listener: record.listener().cloned() })
    })
}

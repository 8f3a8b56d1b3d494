//! Hostile unit records and the roster that tracks them per wave.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use lane_defence_core::{Tier, UnitId, UnitSnapshot, WorldPoint};
use lane_defence_system_coordinator::Lifeline;

use crate::sync::lock;

/// Attributes shared by every unit spawned in one wave of one tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitTemplate {
    /// One-based wave the unit belongs to.
    pub wave: u32,
    /// Starting hit points.
    pub hit_points: i32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Money credited when the unit is killed.
    pub bounty: u32,
}

impl UnitTemplate {
    /// Template for units of `wave` on `tier`.
    #[must_use]
    pub const fn for_wave(tier: Tier, wave: u32) -> Self {
        Self {
            wave,
            hit_points: tier.unit_hit_points(wave),
            speed: tier.unit_speed(),
            bounty: tier.unit_bounty(),
        }
    }
}

/// Lifecycle phase of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitPhase {
    /// Travelling along the path.
    Moving,
    /// Resolved by lethal damage.
    Killed,
    /// Resolved by reaching the objective.
    Arrived,
}

/// Terminal fate of a unit, reported exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Hit points reached zero before the unit arrived.
    Killed,
    /// The unit reached the objective alive.
    Arrived,
}

/// Result of a single hit landing on a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageOutcome {
    /// The unit was no longer alive; nothing changed.
    Dropped,
    /// The unit survived with the given hit points.
    Wounded {
        /// Hit points left after the hit.
        remaining: i32,
    },
    /// The hit took the unit to zero or below.
    Lethal,
}

#[derive(Debug)]
struct Vitals {
    hit_points: i32,
    phase: UnitPhase,
}

/// Shared state of one unit.
///
/// Hit points and phase live behind one lock, so damage, arrival and
/// resolution checks never observe a half-applied change.
#[derive(Debug)]
pub struct UnitRecord {
    id: UnitId,
    template: UnitTemplate,
    vitals: Mutex<Vitals>,
    position: Mutex<WorldPoint>,
    lifeline: Lifeline,
}

impl UnitRecord {
    fn new(id: UnitId, template: UnitTemplate, position: WorldPoint) -> Self {
        Self {
            id,
            template,
            vitals: Mutex::new(Vitals {
                hit_points: template.hit_points,
                phase: UnitPhase::Moving,
            }),
            position: Mutex::new(position),
            lifeline: Lifeline::new(),
        }
    }

    /// Identifier of the unit.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Wave the unit was spawned in.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.template.wave
    }

    /// Travel speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.template.speed
    }

    /// Money credited on kill.
    #[must_use]
    pub const fn bounty(&self) -> u32 {
        self.template.bounty
    }

    /// Hit points the unit spawned with.
    #[must_use]
    pub const fn max_hit_points(&self) -> i32 {
        self.template.hit_points
    }

    /// Current hit points. May be negative after a lethal hit.
    #[must_use]
    pub fn hit_points(&self) -> i32 {
        lock(&self.vitals, "unit hit points").hit_points
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> UnitPhase {
        lock(&self.vitals, "unit phase").phase
    }

    /// Reports whether the unit is still moving with hit points left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        let vitals = lock(&self.vitals, "unit liveness");
        vitals.phase == UnitPhase::Moving && vitals.hit_points > 0
    }

    /// Latest published position.
    #[must_use]
    pub fn position(&self) -> WorldPoint {
        *lock(&self.position, "unit position")
    }

    /// Publishes a new position.
    pub fn set_position(&self, position: WorldPoint) {
        *lock(&self.position, "unit position") = position;
    }

    /// Lands a hit of `power` damage if the unit is still alive.
    pub fn apply_damage(&self, power: u32) -> DamageOutcome {
        let mut vitals = lock(&self.vitals, "unit damage");
        if vitals.phase != UnitPhase::Moving || vitals.hit_points <= 0 {
            return DamageOutcome::Dropped;
        }
        let power = i32::try_from(power).unwrap_or(i32::MAX);
        vitals.hit_points = vitals.hit_points.saturating_sub(power);
        if vitals.hit_points > 0 {
            DamageOutcome::Wounded {
                remaining: vitals.hit_points,
            }
        } else {
            DamageOutcome::Lethal
        }
    }

    /// Resolves the unit if it has not been resolved yet.
    ///
    /// A unit without hit points is killed; otherwise it is marked arrived
    /// when `reached_objective` holds. Only the first successful call
    /// returns a resolution, and it also retires the unit's lifeline.
    pub fn conclude(&self, reached_objective: bool) -> Option<Resolution> {
        let mut vitals = lock(&self.vitals, "unit resolution");
        if vitals.phase != UnitPhase::Moving {
            return None;
        }
        let resolution = if vitals.hit_points <= 0 {
            vitals.phase = UnitPhase::Killed;
            Resolution::Killed
        } else if reached_objective {
            vitals.phase = UnitPhase::Arrived;
            Resolution::Arrived
        } else {
            return None;
        };
        drop(vitals);
        let _ = self.lifeline.retire();
        Some(resolution)
    }

    /// Lifeline of the actor animating this unit.
    #[must_use]
    pub fn lifeline(&self) -> &Lifeline {
        &self.lifeline
    }

    /// Immutable view of the unit for adapters.
    #[must_use]
    pub fn snapshot(&self) -> UnitSnapshot {
        let (hit_points, alive) = {
            let vitals = lock(&self.vitals, "unit snapshot");
            (
                vitals.hit_points,
                vitals.phase == UnitPhase::Moving && vitals.hit_points > 0,
            )
        };
        UnitSnapshot {
            id: self.id,
            wave: self.template.wave,
            position: self.position(),
            hit_points,
            max_hit_points: self.template.hit_points,
            alive,
        }
    }
}

/// Spawn and resolution counts of one wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveTally {
    /// Units spawned so far.
    pub spawned: u32,
    /// Units removed after resolving.
    pub resolved: u32,
}

#[derive(Debug)]
struct RosterState {
    next_unit_id: UnitId,
    live: BTreeMap<UnitId, Arc<UnitRecord>>,
    tallies: BTreeMap<u32, WaveTally>,
}

/// Live units keyed by identifier, plus per-wave bookkeeping.
#[derive(Debug)]
pub struct UnitRoster {
    state: Mutex<RosterState>,
}

impl UnitRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RosterState {
                next_unit_id: UnitId::new(0),
                live: BTreeMap::new(),
                tallies: BTreeMap::new(),
            }),
        }
    }

    /// Registers a new unit at `position` and returns its record.
    pub fn spawn(&self, template: UnitTemplate, position: WorldPoint) -> Arc<UnitRecord> {
        let mut state = lock(&self.state, "roster spawn");
        let id = state.next_unit_id;
        state.next_unit_id = UnitId::new(id.get().saturating_add(1));
        let record = Arc::new(UnitRecord::new(id, template, position));
        let _ = state.live.insert(id, Arc::clone(&record));
        state.tallies.entry(template.wave).or_default().spawned += 1;
        record
    }

    /// Removes a resolved unit and counts it towards its wave.
    ///
    /// Returns `false` when the unit was not in the roster.
    pub fn remove(&self, id: UnitId) -> bool {
        let mut state = lock(&self.state, "roster removal");
        let Some(record) = state.live.remove(&id) else {
            return false;
        };
        state.tallies.entry(record.wave()).or_default().resolved += 1;
        true
    }

    /// Live units in spawn order.
    #[must_use]
    pub fn live(&self) -> Vec<Arc<UnitRecord>> {
        lock(&self.state, "roster listing")
            .live
            .values()
            .cloned()
            .collect()
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state, "roster length").live.len()
    }

    /// Reports whether no units are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn and resolution counts for `wave`.
    #[must_use]
    pub fn tally(&self, wave: u32) -> WaveTally {
        lock(&self.state, "roster tally")
            .tallies
            .get(&wave)
            .copied()
            .unwrap_or_default()
    }

    /// Reports whether all `quota` units of `wave` spawned and resolved.
    #[must_use]
    pub fn wave_settled(&self, wave: u32, quota: u32) -> bool {
        let tally = self.tally(wave);
        tally.spawned == quota && tally.resolved == quota
    }
}

impl Default for UnitRoster {
    fn default() -> Self {
        Self::new()
    }
}

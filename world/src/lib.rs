#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Lane Defence.
//!
//! A [`World`] owns the money ledger, the objective, the wave index and the
//! outcome latch, and holds the unit roster and defender grid. It is shared
//! behind an `Arc` by every actor of one session; all mutation goes through
//! `&self` methods that keep the invariants of each component under its own
//! lock or atomic. Read-only views for adapters live in [`query`].

mod defenders;
mod ledger;
mod objective;
mod path;
mod sync;
mod units;

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex, OnceLock,
    },
};

use lane_defence_core::{
    salvage_value, CellCoord, DefenderKind, Event, EventSink, Outcome, PlacementError, SellError,
    Tier, UpgradeError,
};
use tracing::{debug, info};

use crate::{defenders::DefenderGrid, sync::lock};

pub use defenders::DefenderRecord;
pub use ledger::{Ledger, Shortfall};
pub use objective::Objective;
pub use path::{LayoutError, PathLayout};
pub use units::{
    DamageOutcome, Resolution, UnitPhase, UnitRecord, UnitRoster, UnitTemplate, WaveTally,
};

/// Money a session starts with unless configured otherwise.
pub const DEFAULT_STARTING_MONEY: u32 = 250;

/// Objective lives a session starts with unless configured otherwise.
pub const DEFAULT_OBJECTIVE_HIT_POINTS: u32 = 10;

/// Units spawned per wave unless configured otherwise.
pub const DEFAULT_WAVE_QUOTA: u32 = 5;

/// Parameters fixed for the lifetime of one world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Difficulty tier scaling the units.
    pub tier: Tier,
    /// Path geometry and placement mask.
    pub layout: PathLayout,
    /// Opening ledger balance.
    pub starting_money: u32,
    /// Opening objective lives.
    pub objective_hit_points: u32,
    /// Number of waves in the session.
    pub total_waves: u32,
}

impl WorldConfig {
    /// Defaults for `tier` using its built-in layout.
    #[must_use]
    pub fn for_tier(tier: Tier) -> Self {
        Self {
            tier,
            layout: PathLayout::builtin(tier),
            starting_money: DEFAULT_STARTING_MONEY,
            objective_hit_points: DEFAULT_OBJECTIVE_HIT_POINTS,
            total_waves: tier.default_wave_count(),
        }
    }
}

/// Shared state of one session.
pub struct World {
    tier: Tier,
    layout: PathLayout,
    total_waves: u32,
    ledger: Ledger,
    roster: UnitRoster,
    defenders: Mutex<DefenderGrid>,
    objective: Objective,
    wave: AtomicU32,
    outcome: OnceLock<Outcome>,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("tier", &self.tier)
            .field("money", &self.ledger.balance())
            .field("wave", &self.current_wave())
            .field("objective", &self.objective.hit_points())
            .field("outcome", &self.outcome())
            .finish_non_exhaustive()
    }
}

impl World {
    /// Creates a world that reports changes to `sink`.
    #[must_use]
    pub fn new(config: WorldConfig, sink: Arc<dyn EventSink>) -> Self {
        let objective = Objective::new(
            config.layout.objective_position(),
            config.objective_hit_points,
        );
        Self {
            tier: config.tier,
            total_waves: config.total_waves,
            ledger: Ledger::new(config.starting_money),
            roster: UnitRoster::new(),
            defenders: Mutex::new(DefenderGrid::new()),
            objective,
            wave: AtomicU32::new(1),
            outcome: OnceLock::new(),
            layout: config.layout,
            sink,
        }
    }

    /// Difficulty tier of the session.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Path geometry of the session.
    #[must_use]
    pub const fn layout(&self) -> &PathLayout {
        &self.layout
    }

    /// Number of waves the session plays.
    #[must_use]
    pub const fn total_waves(&self) -> u32 {
        self.total_waves
    }

    /// Money ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Live unit roster.
    #[must_use]
    pub const fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// The defended objective.
    #[must_use]
    pub const fn objective(&self) -> &Objective {
        &self.objective
    }

    /// One-based index of the wave in progress.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.wave.load(Ordering::Acquire)
    }

    /// Latched outcome, if the session has concluded.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome.get().copied()
    }

    /// Delivers `event` to the session sink.
    pub fn emit(&self, event: Event) {
        self.sink.publish(event);
    }

    /// Buys a level-one defender of `kind` and places it on `cell`.
    ///
    /// Validation, payment and insertion happen under the grid lock, so two
    /// concurrent placements can never share a cell or overdraw the ledger.
    pub fn place_defender(
        &self,
        kind: DefenderKind,
        cell: CellCoord,
    ) -> Result<Arc<DefenderRecord>, PlacementError> {
        if !cell.is_within_grid() {
            return Err(PlacementError::InvalidCoordinate(cell));
        }
        if self.layout.is_blocked(cell) {
            return Err(PlacementError::Blocked);
        }
        let mut grid = lock(&self.defenders, "defender placement");
        if grid.is_occupied(cell) {
            return Err(PlacementError::Occupied);
        }
        let balance = self
            .ledger
            .try_debit(kind.price())
            .map_err(|shortfall| PlacementError::InsufficientFunds {
                required: shortfall.required,
                available: shortfall.available,
            })?;
        let record = grid.insert(kind, cell);
        drop(grid);

        debug!(defender = record.id().get(), ?kind, %cell, "defender placed");
        self.emit(Event::DefenderPlaced {
            defender: record.id(),
            kind,
            cell,
        });
        self.emit(Event::MoneyChanged { balance });
        Ok(record)
    }

    /// Pays for and applies one level to the defender on `cell`.
    pub fn upgrade_defender(&self, cell: CellCoord) -> Result<u8, UpgradeError> {
        if !cell.is_within_grid() {
            return Err(UpgradeError::InvalidCoordinate(cell));
        }
        let grid = lock(&self.defenders, "defender upgrade");
        let record = grid.get(cell).ok_or(UpgradeError::NoDefender)?;
        let price = record.profile().upgrade_price.ok_or(UpgradeError::MaxLevel)?;
        let id = record.id();
        let balance =
            self.ledger
                .try_debit(price)
                .map_err(|shortfall| UpgradeError::InsufficientFunds {
                    required: shortfall.required,
                    available: shortfall.available,
                })?;
        let level = grid.upgrade(cell).ok_or(UpgradeError::NoDefender)?;
        drop(grid);

        debug!(defender = id.get(), level, "defender upgraded");
        self.emit(Event::DefenderUpgraded { defender: id, level });
        self.emit(Event::MoneyChanged { balance });
        Ok(level)
    }

    /// Removes the defender on `cell`, retires its actor and refunds salvage.
    pub fn sell_defender(&self, cell: CellCoord) -> Result<u32, SellError> {
        if !cell.is_within_grid() {
            return Err(SellError::InvalidCoordinate(cell));
        }
        let mut grid = lock(&self.defenders, "defender sale");
        let record = grid.remove(cell).ok_or(SellError::NoDefender)?;
        let _ = record.lifeline().retire();
        let salvage = salvage_value(record.profile().price);
        let balance = self.ledger.credit(salvage);
        drop(grid);

        debug!(defender = record.id().get(), salvage, "defender sold");
        self.emit(Event::DefenderSold {
            defender: record.id(),
            salvage,
        });
        self.emit(Event::MoneyChanged { balance });
        Ok(salvage)
    }

    /// Defender standing on `cell`, if any.
    #[must_use]
    pub fn defender_at(&self, cell: CellCoord) -> Option<Arc<DefenderRecord>> {
        lock(&self.defenders, "defender lookup").get(cell).cloned()
    }

    /// Every placed defender ordered by identifier.
    #[must_use]
    pub fn defenders(&self) -> Vec<Arc<DefenderRecord>> {
        lock(&self.defenders, "defender listing").records()
    }

    /// Spawns a unit of `wave` at the start of the path.
    pub fn spawn_unit(&self, wave: u32) -> Arc<UnitRecord> {
        let template = UnitTemplate::for_wave(self.tier, wave);
        let record = self.roster.spawn(template, self.layout.spawn_position());
        debug!(unit = record.id().get(), wave, "unit spawned");
        self.emit(Event::UnitSpawned {
            unit: record.id(),
            wave,
            hit_points: template.hit_points,
        });
        record
    }

    /// Resolves `unit` if it is dead or has reached the objective.
    ///
    /// The winner of the resolution removes the unit from the roster and
    /// applies its consequence: a bounty for a kill, a lost life for an
    /// arrival. The arrival that takes the last life latches defeat before
    /// the unit leaves the roster. Every later call returns `None` without
    /// side effects.
    pub fn settle_unit(&self, unit: &UnitRecord, reached_objective: bool) -> Option<Resolution> {
        let resolution = unit.conclude(reached_objective)?;
        match resolution {
            Resolution::Killed => {
                let balance = self.ledger.credit(unit.bounty());
                debug!(unit = unit.id().get(), bounty = unit.bounty(), "unit killed");
                self.emit(Event::UnitKilled {
                    unit: unit.id(),
                    bounty: unit.bounty(),
                });
                self.emit(Event::MoneyChanged { balance });
            }
            Resolution::Arrived => {
                debug!(unit = unit.id().get(), "unit reached objective");
                self.emit(Event::UnitArrived { unit: unit.id() });
                if let Some(remaining) = self.objective.apply_arrival() {
                    self.emit(Event::ObjectiveDamaged { remaining });
                    if remaining == 0 {
                        let _ = self.conclude(Outcome::Defeat);
                    }
                }
            }
        }
        let _ = self.roster.remove(unit.id());
        Some(resolution)
    }

    /// Moves the wave index past `completed`.
    ///
    /// Returns the new wave index, or `None` when `completed` is not the
    /// wave in progress or was the final wave.
    pub fn advance_wave(&self, completed: u32) -> Option<u32> {
        if completed >= self.total_waves {
            return None;
        }
        let next = completed + 1;
        self.wave
            .compare_exchange(completed, next, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| next)
    }

    /// Latches `outcome` and seals the objective.
    ///
    /// Returns `true` only for the call that latched; the outcome never
    /// changes afterwards.
    pub fn conclude(&self, outcome: Outcome) -> bool {
        if self.outcome.set(outcome).is_err() {
            return false;
        }
        self.objective.seal();
        info!(?outcome, "session concluded");
        self.emit(Event::Concluded { outcome });
        true
    }
}

/// Read-only views of the world for adapters.
pub mod query {
    use lane_defence_core::SessionSnapshot;

    use super::World;

    /// Captures the full state of the session.
    ///
    /// `paused` is supplied by the caller because the run state belongs to
    /// the session coordinator rather than the world.
    #[must_use]
    pub fn snapshot(world: &World, paused: bool) -> SessionSnapshot {
        SessionSnapshot {
            tier: world.tier(),
            money: world.ledger().balance(),
            wave: world.current_wave(),
            total_waves: world.total_waves(),
            objective_hit_points: world.objective().hit_points(),
            objective_position: world.objective().position(),
            paused,
            outcome: world.outcome(),
            units: world
                .roster()
                .live()
                .iter()
                .map(|unit| unit.snapshot())
                .collect(),
            defenders: world
                .defenders()
                .iter()
                .map(|defender| defender.snapshot())
                .collect(),
        }
    }

    /// Reports whether a defender could be placed on `cell` right now,
    /// ignoring the price.
    #[must_use]
    pub fn is_cell_free(world: &World, cell: lane_defence_core::CellCoord) -> bool {
        cell.is_within_grid() && !world.layout().is_blocked(cell) && world.defender_at(cell).is_none()
    }
}

#[cfg(test)]
mod tests {
    use lane_defence_core::{NullSink, WorldPoint};

    use super::*;

    fn world(tier: Tier) -> World {
        World::new(WorldConfig::for_tier(tier), Arc::new(NullSink))
    }

    #[test]
    fn defaults_follow_tier() {
        let world = world(Tier::Hard);
        assert_eq!(world.total_waves(), 6);
        assert_eq!(world.ledger().balance(), DEFAULT_STARTING_MONEY);
        assert_eq!(world.objective().hit_points(), DEFAULT_OBJECTIVE_HIT_POINTS);
        assert_eq!(
            world.objective().position(),
            CellCoord::new(10, 0).center()
        );
        assert_eq!(world.current_wave(), 1);
    }

    #[test]
    fn wave_index_advances_once_per_completed_wave() {
        let world = world(Tier::Easy);
        assert_eq!(world.advance_wave(1), Some(2));
        assert_eq!(world.advance_wave(1), None);
        assert_eq!(world.advance_wave(2), None);
        assert_eq!(world.current_wave(), 2);
    }

    #[test]
    fn outcome_latches_once() {
        let world = world(Tier::Easy);
        assert!(world.conclude(Outcome::Defeat));
        assert!(!world.conclude(Outcome::Victory));
        assert_eq!(world.outcome(), Some(Outcome::Defeat));
    }

    #[test]
    fn spawned_units_start_at_first_waypoint() {
        let world = world(Tier::Medium);
        let unit = world.spawn_unit(2);
        assert_eq!(unit.position(), WorldPoint::new(40.0, 160.0));
        assert_eq!(unit.hit_points(), 200);
        assert_eq!(unit.speed(), 150.0);
        assert_eq!(world.roster().tally(2).spawned, 1);
    }
}

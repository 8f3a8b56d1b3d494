#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Facade that runs a Lane Defence session on the ambient Tokio runtime.
//!
//! [`Simulation::start`] builds a fresh world and coordinator, then spawns
//! the wave scheduler and the objective watch. Units get an actor task when
//! they spawn and defenders get one when they are placed. Player commands
//! are synchronous calls that validate against the shared world, and
//! adapters poll [`Simulation::snapshot`] at their own cadence.

mod config;
mod sink;

use std::{fmt, sync::Arc, time::Duration};

use lane_defence_core::{
    CellCoord, DefenderId, DefenderKind, Event, EventSink, Outcome, PlacementError, SellError,
    SessionSnapshot, Tier, UpgradeError,
};
use lane_defence_system_coordinator::{drive, Actor, ActorStatus, Coordinator, Lifeline};
use lane_defence_system_movement::UnitActor;
use lane_defence_system_spawning::SchedulerActor;
use lane_defence_system_tower_combat::DefenderActor;
use lane_defence_world::{query, UnitRecord, World};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::info;

pub use config::{ConfigError, LayoutConfig, SessionConfig, WaveConfig, SUPPORTED_CONFIG_VERSION};
pub use sink::ChannelSink;

/// Failures starting a session.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// No Tokio runtime was available to host the session's actors.
    #[error("a Tokio runtime is required to start a session")]
    NoRuntime,
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a player command was refused before touching the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Refusal {
    Paused,
    SessionOver,
}

impl From<Refusal> for PlacementError {
    fn from(value: Refusal) -> Self {
        match value {
            Refusal::Paused => Self::Paused,
            Refusal::SessionOver => Self::SessionOver,
        }
    }
}

impl From<Refusal> for UpgradeError {
    fn from(value: Refusal) -> Self {
        match value {
            Refusal::Paused => Self::Paused,
            Refusal::SessionOver => Self::SessionOver,
        }
    }
}

impl From<Refusal> for SellError {
    fn from(value: Refusal) -> Self {
        match value {
            Refusal::Paused => Self::Paused,
            Refusal::SessionOver => Self::SessionOver,
        }
    }
}

/// Singleton actor that latches defeat once the objective falls.
struct ObjectiveWatch {
    world: Arc<World>,
    coordinator: Arc<Coordinator>,
}

impl Actor for ObjectiveWatch {
    fn step(&mut self, _dt: Duration) -> ActorStatus {
        if self.world.objective().is_destroyed() {
            let _ = self.world.conclude(Outcome::Defeat);
            let _ = self.coordinator.terminate();
            return ActorStatus::Finished;
        }
        if self.world.outcome().is_some() {
            return ActorStatus::Finished;
        }
        ActorStatus::Active
    }
}

/// State and actors of one play-through.
#[derive(Debug)]
struct Session {
    world: Arc<World>,
    coordinator: Arc<Coordinator>,
}

impl Session {
    fn launch(
        config: &SessionConfig,
        sink: &Arc<dyn EventSink>,
        runtime: &Handle,
    ) -> Result<Self, ConfigError> {
        let world = Arc::new(World::new(config.world_config()?, Arc::clone(sink)));
        let coordinator = Arc::new(Coordinator::new());
        let tick = config.tick();

        let launcher = {
            let world = Arc::clone(&world);
            let coordinator = Arc::clone(&coordinator);
            let runtime = runtime.clone();
            move |unit: Arc<UnitRecord>| {
                let lifeline = unit.lifeline().clone();
                let actor = UnitActor::new(Arc::clone(&world), unit);
                let _ = runtime.spawn(drive(actor, coordinator.signal(), lifeline, tick));
            }
        };
        let scheduler = SchedulerActor::new(
            config.wave_plan(),
            Arc::clone(&world),
            Arc::clone(&coordinator),
            launcher,
        );
        let _ = runtime.spawn(drive(
            scheduler,
            coordinator.signal(),
            Lifeline::new(),
            tick,
        ));

        let watch = ObjectiveWatch {
            world: Arc::clone(&world),
            coordinator: Arc::clone(&coordinator),
        };
        let _ = runtime.spawn(drive(watch, coordinator.signal(), Lifeline::new(), tick));

        info!(
            tier = ?config.tier,
            waves = world.total_waves(),
            money = world.ledger().balance(),
            "session started"
        );
        Ok(Self { world, coordinator })
    }

    fn admit(&self) -> Result<(), Refusal> {
        if self.world.outcome().is_some() || self.coordinator.is_terminated() {
            return Err(Refusal::SessionOver);
        }
        if self.coordinator.is_paused() {
            return Err(Refusal::Paused);
        }
        Ok(())
    }
}

/// Running session plus everything needed to restart it.
///
/// Dropping the simulation terminates its session; actor tasks exit at
/// their next tick.
pub struct Simulation {
    config: SessionConfig,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
    session: Session,
}

impl Simulation {
    /// Starts a session on the current Tokio runtime.
    pub fn start(config: SessionConfig, sink: Arc<dyn EventSink>) -> Result<Self, SimulationError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SimulationError::NoRuntime)?;
        let session = Session::launch(&config, &sink, &runtime)?;
        Ok(Self {
            config,
            sink,
            runtime,
            session,
        })
    }

    /// Configuration the session was started with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Difficulty tier of the session.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.config.tier
    }

    /// Latched outcome, if the session has concluded.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.session.world.outcome()
    }

    /// Reports whether the session is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.session.coordinator.is_paused()
    }

    /// Captures the full state of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        query::snapshot(&self.session.world, self.is_paused())
    }

    /// Reports whether a defender could stand on `cell` right now.
    #[must_use]
    pub fn is_cell_free(&self, cell: CellCoord) -> bool {
        query::is_cell_free(&self.session.world, cell)
    }

    /// Buys and places a defender, starting its actor.
    pub fn place_defender(
        &self,
        kind: DefenderKind,
        cell: CellCoord,
    ) -> Result<DefenderId, PlacementError> {
        self.session.admit()?;
        let world = &self.session.world;
        let record = world.place_defender(kind, cell)?;
        let lifeline = record.lifeline().clone();
        let id = record.id();
        let actor = DefenderActor::new(Arc::clone(world), record);
        let _ = self.runtime.spawn(drive(
            actor,
            self.session.coordinator.signal(),
            lifeline,
            self.config.tick(),
        ));
        Ok(id)
    }

    /// Upgrades the defender on `cell` and returns its new level.
    pub fn upgrade_defender(&self, cell: CellCoord) -> Result<u8, UpgradeError> {
        self.session.admit()?;
        self.session.world.upgrade_defender(cell)
    }

    /// Sells the defender on `cell` and returns the salvage credited.
    pub fn sell_defender(&self, cell: CellCoord) -> Result<u32, SellError> {
        self.session.admit()?;
        self.session.world.sell_defender(cell)
    }

    /// Freezes every actor. Returns `false` when nothing changed.
    pub fn pause(&self) -> bool {
        let changed = self.session.coordinator.pause();
        if changed {
            self.session.world.emit(Event::Paused);
        }
        changed
    }

    /// Releases a paused session. Returns `false` when nothing changed.
    pub fn resume(&self) -> bool {
        let changed = self.session.coordinator.resume();
        if changed {
            self.session.world.emit(Event::Resumed);
        }
        changed
    }

    /// Abandons the current session and starts a fresh one with the same
    /// configuration.
    pub fn restart(&mut self) -> Result<(), SimulationError> {
        let _ = self.session.coordinator.terminate();
        self.session = Session::launch(&self.config, &self.sink, &self.runtime)?;
        info!("session restarted");
        Ok(())
    }

    /// Ends the session and returns its final state.
    pub fn quit_to_menu(self) -> SessionSnapshot {
        let _ = self.session.coordinator.terminate();
        info!("session abandoned");
        query::snapshot(&self.session.world, false)
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        let _ = self.session.coordinator.terminate();
    }
}

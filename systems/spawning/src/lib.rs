#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that spawns units and decides when the session is won.
//!
//! Every wave runs an intermission countdown, spawns its quota at a fixed
//! cadence and then drains until each of its units has resolved. Only then
//! does the wave index advance. Draining the final wave latches the
//! outcome before the session is terminated: victory, or defeat when the
//! objective has already fallen.

use std::{sync::Arc, time::Duration};

use lane_defence_core::{Event, Outcome};
use lane_defence_system_coordinator::{Actor, ActorStatus, Coordinator};
use lane_defence_world::{UnitRecord, World, DEFAULT_WAVE_QUOTA};
use tracing::info;

/// Pacing of every wave in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavePlan {
    quota: u32,
    spawn_interval: Duration,
    intermission: Duration,
}

impl WavePlan {
    /// Quota, cadence and pause used when nothing else is configured.
    pub const DEFAULT: Self = Self::new(
        DEFAULT_WAVE_QUOTA,
        Duration::from_secs(1),
        Duration::from_secs(3),
    );

    /// Creates a plan spawning `quota` units `spawn_interval` apart after an
    /// `intermission` countdown.
    #[must_use]
    pub const fn new(quota: u32, spawn_interval: Duration, intermission: Duration) -> Self {
        Self {
            quota,
            spawn_interval,
            intermission,
        }
    }

    /// Units spawned per wave.
    #[must_use]
    pub const fn quota(&self) -> u32 {
        self.quota
    }

    /// Delay between consecutive spawns.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        self.spawn_interval
    }

    /// Countdown before each wave's first spawn.
    #[must_use]
    pub const fn intermission(&self) -> Duration {
        self.intermission
    }
}

impl Default for WavePlan {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Stage of the wave in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// Counting down to the first spawn.
    Intermission {
        /// Time left before spawning starts.
        remaining: Duration,
    },
    /// Spawning the quota.
    Spawning {
        /// Units spawned so far this wave.
        spawned: u32,
        /// Time accumulated towards the next spawn.
        accumulator: Duration,
    },
    /// Quota spawned; waiting for every unit to resolve.
    Draining,
    /// The final wave has been drained or the session concluded.
    Complete,
}

/// Pure wave state machine advanced by fixed time steps.
#[derive(Debug)]
pub struct WaveScheduler {
    plan: WavePlan,
    wave: u32,
    phase: WavePhase,
}

impl WaveScheduler {
    /// Creates a scheduler at the start of the first wave's intermission.
    #[must_use]
    pub fn new(plan: WavePlan) -> Self {
        Self {
            plan,
            wave: 1,
            phase: WavePhase::Intermission {
                remaining: plan.intermission,
            },
        }
    }

    /// Wave the scheduler is working on.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Stage of that wave.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Advances the schedule by `dt`, pushing every unit spawned into `out`.
    pub fn step(
        &mut self,
        dt: Duration,
        world: &World,
        out: &mut Vec<Arc<UnitRecord>>,
    ) -> ActorStatus {
        if world.outcome().is_some() {
            self.phase = WavePhase::Complete;
        }

        match self.phase {
            WavePhase::Intermission { remaining } => {
                if dt < remaining {
                    self.phase = WavePhase::Intermission {
                        remaining: remaining - dt,
                    };
                    return ActorStatus::Active;
                }
                info!(wave = self.wave, "wave started");
                world.emit(Event::WaveStarted { wave: self.wave });
                self.phase = WavePhase::Spawning {
                    spawned: 0,
                    accumulator: self.plan.spawn_interval,
                };
                self.spawn_due(dt - remaining, world, out);
                ActorStatus::Active
            }
            WavePhase::Spawning { .. } => {
                self.spawn_due(dt, world, out);
                ActorStatus::Active
            }
            WavePhase::Draining => self.drain(world),
            WavePhase::Complete => ActorStatus::Finished,
        }
    }

    fn spawn_due(&mut self, dt: Duration, world: &World, out: &mut Vec<Arc<UnitRecord>>) {
        let WavePhase::Spawning {
            mut spawned,
            mut accumulator,
        } = self.phase
        else {
            return;
        };

        accumulator = accumulator.saturating_add(dt);
        while spawned < self.plan.quota && accumulator >= self.plan.spawn_interval {
            accumulator -= self.plan.spawn_interval;
            out.push(world.spawn_unit(self.wave));
            spawned += 1;
        }

        self.phase = if spawned >= self.plan.quota {
            WavePhase::Draining
        } else {
            WavePhase::Spawning {
                spawned,
                accumulator,
            }
        };
    }

    fn drain(&mut self, world: &World) -> ActorStatus {
        if !world.roster().wave_settled(self.wave, self.plan.quota) {
            return ActorStatus::Active;
        }

        info!(wave = self.wave, "wave completed");
        world.emit(Event::WaveCompleted { wave: self.wave });
        if let Some(next) = world.advance_wave(self.wave) {
            self.wave = next;
            self.phase = WavePhase::Intermission {
                remaining: self.plan.intermission,
            };
            return ActorStatus::Active;
        }

        self.phase = WavePhase::Complete;
        let outcome = if world.objective().is_destroyed() {
            Outcome::Defeat
        } else {
            Outcome::Victory
        };
        let _ = world.conclude(outcome);
        ActorStatus::Finished
    }
}

/// Receives every unit the scheduler spawns.
pub trait UnitLauncher: Send {
    /// Starts animating `unit`.
    fn launch(&mut self, unit: Arc<UnitRecord>);
}

impl<F> UnitLauncher for F
where
    F: FnMut(Arc<UnitRecord>) + Send,
{
    fn launch(&mut self, unit: Arc<UnitRecord>) {
        self(unit);
    }
}

/// Actor driving a [`WaveScheduler`] and handing new units to a launcher.
///
/// Finishing the schedule terminates the session.
#[derive(Debug)]
pub struct SchedulerActor<L> {
    scheduler: WaveScheduler,
    world: Arc<World>,
    coordinator: Arc<Coordinator>,
    launcher: L,
    spawned: Vec<Arc<UnitRecord>>,
}

impl<L: UnitLauncher> SchedulerActor<L> {
    /// Creates an actor that schedules waves in `world` according to `plan`.
    #[must_use]
    pub fn new(
        plan: WavePlan,
        world: Arc<World>,
        coordinator: Arc<Coordinator>,
        launcher: L,
    ) -> Self {
        Self {
            scheduler: WaveScheduler::new(plan),
            world,
            coordinator,
            launcher,
            spawned: Vec::new(),
        }
    }
}

impl<L: UnitLauncher> Actor for SchedulerActor<L> {
    fn step(&mut self, dt: Duration) -> ActorStatus {
        let status = self.scheduler.step(dt, &self.world, &mut self.spawned);
        for unit in self.spawned.drain(..) {
            self.launcher.launch(unit);
        }
        if status == ActorStatus::Finished {
            let _ = self.coordinator.terminate();
        }
        status
    }
}

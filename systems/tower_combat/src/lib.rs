#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Defender actors that wait out their cooldown and strike units in range.

use std::{sync::Arc, time::Duration};

use lane_defence_core::{AttackPattern, Event};
use lane_defence_system_coordinator::{Actor, ActorStatus};
use lane_defence_system_tower_targeting::{select_in_range, select_target, Reach};
use lane_defence_world::{DamageOutcome, DefenderRecord, UnitRecord, World};
use tracing::trace;

/// Countdown until a defender may attack again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CooldownClock {
    remaining: Duration,
}

impl CooldownClock {
    /// Creates a clock that is ready immediately.
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            remaining: Duration::ZERO,
        }
    }

    /// Time left before the next attack.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Reports whether the defender may attack.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Counts `dt` off the cooldown.
    pub fn tick(&mut self, dt: Duration) {
        self.remaining = self.remaining.saturating_sub(dt);
    }

    /// Starts a fresh cooldown of `interval`.
    pub fn arm(&mut self, interval: Duration) {
        self.remaining = interval;
    }
}

/// Actor animating a single defender.
#[derive(Debug)]
pub struct DefenderActor {
    world: Arc<World>,
    defender: Arc<DefenderRecord>,
    clock: CooldownClock,
}

impl DefenderActor {
    /// Creates a ready actor for `defender`.
    #[must_use]
    pub fn new(world: Arc<World>, defender: Arc<DefenderRecord>) -> Self {
        Self {
            world,
            defender,
            clock: CooldownClock::ready(),
        }
    }

    /// Cooldown state of the defender.
    #[must_use]
    pub const fn clock(&self) -> CooldownClock {
        self.clock
    }

    fn targets(&self, reach: Reach, units: &[Arc<UnitRecord>]) -> Vec<Arc<UnitRecord>> {
        match self.defender.kind().pattern() {
            AttackPattern::Single => select_target(reach, units).cloned().into_iter().collect(),
            AttackPattern::Area => select_in_range(reach, units),
        }
    }
}

impl Actor for DefenderActor {
    fn step(&mut self, dt: Duration) -> ActorStatus {
        if self.defender.lifeline().is_retired() {
            return ActorStatus::Finished;
        }

        self.clock.tick(dt);
        if !self.clock.is_ready() {
            return ActorStatus::Active;
        }

        let profile = self.defender.profile();
        let units = self.world.roster().live();
        let targets = self.targets(Reach::of(&self.defender), &units);
        if targets.is_empty() {
            return ActorStatus::Active;
        }

        for unit in &targets {
            let outcome = unit.apply_damage(profile.power);
            if outcome == DamageOutcome::Dropped {
                trace!(
                    defender = self.defender.id().get(),
                    unit = unit.id().get(),
                    "attack dropped on resolved unit"
                );
                continue;
            }
            self.world.emit(Event::DefenderAttacked {
                defender: self.defender.id(),
                unit: unit.id(),
                damage: profile.power,
            });
        }
        self.clock.arm(profile.cooldown);
        ActorStatus::Active
    }
}

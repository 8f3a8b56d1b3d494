#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Unit actors that walk the path and resolve themselves.
//!
//! Each unit advances `speed × dt` along its waypoint cursor every tick. A
//! unit notices its own death at the start of a tick, before moving, and
//! settles as killed; otherwise reaching the final waypoint settles it as
//! arrived. Settlement goes through the world so the bounty or the lost life
//! is applied exactly once.

use std::{sync::Arc, time::Duration};

use glam::Vec2;
use lane_defence_core::WorldPoint;
use lane_defence_system_coordinator::{Actor, ActorStatus};
use lane_defence_world::{UnitRecord, World};
use tracing::trace;

/// Position along a polyline of waypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct PathCursor {
    waypoints: Vec<Vec2>,
    next: usize,
    position: Vec2,
}

impl PathCursor {
    /// Places a cursor on the first waypoint, heading for the second.
    #[must_use]
    pub fn new(waypoints: &[WorldPoint]) -> Self {
        let waypoints: Vec<Vec2> = waypoints.iter().map(|point| point.to_vec2()).collect();
        let position = waypoints.first().copied().unwrap_or(Vec2::ZERO);
        Self {
            waypoints,
            next: 1,
            position,
        }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> WorldPoint {
        self.position.into()
    }

    /// Index of the waypoint the cursor is heading for.
    #[must_use]
    pub const fn next_waypoint(&self) -> usize {
        self.next
    }

    /// Reports whether the final waypoint has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.waypoints.len()
    }

    /// Moves `distance` world units along the path.
    ///
    /// Distance left over after reaching a waypoint carries on towards the
    /// next one. Returns `true` once the final waypoint is reached.
    pub fn advance(&mut self, distance: f32) -> bool {
        let mut remaining = distance.max(0.0);
        while let Some(&target) = self.waypoints.get(self.next) {
            let gap = target - self.position;
            let length = gap.length();
            if length <= remaining {
                self.position = target;
                remaining -= length;
                self.next += 1;
            } else {
                self.position += gap * (remaining / length);
                return false;
            }
        }
        true
    }
}

/// Actor animating a single unit.
#[derive(Debug)]
pub struct UnitActor {
    world: Arc<World>,
    unit: Arc<UnitRecord>,
    cursor: PathCursor,
}

impl UnitActor {
    /// Creates an actor for `unit` following the world's path.
    #[must_use]
    pub fn new(world: Arc<World>, unit: Arc<UnitRecord>) -> Self {
        let cursor = PathCursor::new(world.layout().waypoints());
        Self {
            world,
            unit,
            cursor,
        }
    }

    /// Record animated by this actor.
    #[must_use]
    pub fn unit(&self) -> &Arc<UnitRecord> {
        &self.unit
    }

    /// Path progress of the unit.
    #[must_use]
    pub fn cursor(&self) -> &PathCursor {
        &self.cursor
    }
}

impl Actor for UnitActor {
    fn step(&mut self, dt: Duration) -> ActorStatus {
        if !self.unit.is_alive() {
            let _ = self.world.settle_unit(&self.unit, false);
            return ActorStatus::Finished;
        }

        let arrived = self
            .cursor
            .advance(self.unit.speed() * dt.as_secs_f32());
        self.unit.set_position(self.cursor.position());
        if !arrived {
            return ActorStatus::Active;
        }

        let resolution = self.world.settle_unit(&self.unit, true);
        trace!(unit = self.unit.id().get(), ?resolution, "unit reached path end");
        ActorStatus::Finished
    }
}

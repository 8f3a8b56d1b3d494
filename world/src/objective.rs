//! The defended objective at the end of the path.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use lane_defence_core::{WorldPoint, ARRIVAL_DAMAGE};

/// Hit points of the objective units are trying to reach.
#[derive(Debug)]
pub struct Objective {
    position: WorldPoint,
    hit_points: AtomicU32,
    sealed: AtomicBool,
}

impl Objective {
    /// Creates an objective at `position` with `hit_points` lives.
    #[must_use]
    pub fn new(position: WorldPoint, hit_points: u32) -> Self {
        Self {
            position,
            hit_points: AtomicU32::new(hit_points),
            sealed: AtomicBool::new(false),
        }
    }

    /// Location of the objective in world space.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Remaining hit points.
    #[must_use]
    pub fn hit_points(&self) -> u32 {
        self.hit_points.load(Ordering::Acquire)
    }

    /// Reports whether the objective has no hit points left.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.hit_points() == 0
    }

    /// Applies the damage of one arriving unit.
    ///
    /// Returns the remaining hit points, or `None` when the objective was
    /// already destroyed or sealed and nothing changed.
    pub fn apply_arrival(&self) -> Option<u32> {
        if self.sealed.load(Ordering::Acquire) {
            return None;
        }
        self.hit_points
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |hp| {
                (hp > 0).then(|| hp.saturating_sub(ARRIVAL_DAMAGE))
            })
            .ok()
            .map(|previous| previous.saturating_sub(ARRIVAL_DAMAGE))
    }

    /// Freezes the hit points once the session has concluded.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }
}

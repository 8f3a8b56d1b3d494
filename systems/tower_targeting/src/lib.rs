#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure range queries that pick which units a defender may hit.
//!
//! Candidates are live units whose straight-line distance from the
//! defender's cell centre does not exceed its range. Among candidates the
//! earliest-spawned unit wins, never the nearest one.

use std::sync::Arc;

use lane_defence_core::WorldPoint;
use lane_defence_world::{DefenderRecord, UnitRecord};

/// Circle a defender can currently reach.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reach {
    origin: WorldPoint,
    range: f32,
}

impl Reach {
    /// Creates a reach centred on `origin`.
    #[must_use]
    pub const fn new(origin: WorldPoint, range: f32) -> Self {
        Self { origin, range }
    }

    /// Reach of `defender` at its current level.
    #[must_use]
    pub fn of(defender: &DefenderRecord) -> Self {
        Self::new(defender.center(), defender.profile().range)
    }

    /// Centre of the circle.
    #[must_use]
    pub const fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Radius of the circle in world units.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Reports whether `point` lies inside the circle, boundary included.
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        self.origin.distance(point) <= self.range
    }

    fn admits(&self, unit: &UnitRecord) -> bool {
        unit.is_alive() && self.contains(unit.position())
    }
}

/// Earliest-spawned live unit inside `reach`.
#[must_use]
pub fn select_target<'a>(
    reach: Reach,
    units: &'a [Arc<UnitRecord>],
) -> Option<&'a Arc<UnitRecord>> {
    units
        .iter()
        .filter(|unit| reach.admits(unit))
        .min_by_key(|unit| unit.id())
}

/// Every live unit inside `reach`, in spawn order.
#[must_use]
pub fn select_in_range(reach: Reach, units: &[Arc<UnitRecord>]) -> Vec<Arc<UnitRecord>> {
    let mut hits: Vec<_> = units
        .iter()
        .filter(|unit| reach.admits(unit))
        .cloned()
        .collect();
    hits.sort_by_key(|unit| unit.id());
    hits
}

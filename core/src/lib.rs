#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence engine.
//!
//! This crate defines the vocabulary that connects the authoritative session
//! state, the concurrent actors animating it, and the adapters observing it.
//! Actors mutate shared records owned by the world crate and report every
//! externally visible change as an [`Event`] delivered through an
//! [`EventSink`]. Adapters never touch records directly: they issue
//! placement and session commands through the simulation facade and poll
//! [`SessionSnapshot`] values at their own redraw cadence.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod stats;

pub use stats::{
    AttackPattern, DefenderKind, DefenderProfile, Tier, TierOutOfRange, MAX_DEFENDER_LEVEL,
};

/// Number of placement columns laid out across the board.
pub const GRID_COLUMNS: u32 = 12;

/// Number of placement rows laid out down the board.
pub const GRID_ROWS: u32 = 6;

/// Side length of a single placement cell measured in world units.
pub const CELL_LENGTH: f32 = 80.0;

/// Height of the header band above the placement grid in world units.
pub const BOARD_TOP: f32 = 120.0;

/// Lives removed from the objective whenever a unit reaches it.
pub const ARRIVAL_DAMAGE: u32 = 1;

/// Computes the salvage refunded when a defender valued at `price` is sold.
///
/// Salvage is `floor(price × 0.8)` computed in integer arithmetic.
#[must_use]
pub const fn salvage_value(price: u32) -> u32 {
    ((price as u64 * 4) / 5) as u32
}

/// Unique identifier assigned to a hostile unit.
///
/// Identifiers are allocated monotonically, so ordering by identifier is
/// ordering by spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a placed defender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefenderId(u32);

impl DefenderId {
    /// Creates a new defender identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the defender identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single placement cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the coordinate lies on the placement grid.
    #[must_use]
    pub const fn is_within_grid(&self) -> bool {
        self.column < GRID_COLUMNS && self.row < GRID_ROWS
    }

    /// Row-major index of the cell, or `None` when it lies off the grid.
    #[must_use]
    pub const fn index(&self) -> Option<u32> {
        if self.is_within_grid() {
            Some(self.row * GRID_COLUMNS + self.column)
        } else {
            None
        }
    }

    /// Resolves a row-major index back into a coordinate.
    #[must_use]
    pub const fn from_index(index: u32) -> Option<Self> {
        if index < GRID_COLUMNS * GRID_ROWS {
            Some(Self::new(index % GRID_COLUMNS, index / GRID_COLUMNS))
        } else {
            None
        }
    }

    /// Centre of the cell expressed in world units.
    #[must_use]
    pub fn center(&self) -> WorldPoint {
        let half = CELL_LENGTH / 2.0;
        WorldPoint::new(
            self.column as f32 * CELL_LENGTH + half,
            BOARD_TOP + self.row as f32 * CELL_LENGTH + half,
        )
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Continuous position on the board measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate; grows downward.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Straight-line distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        self.to_vec2().distance(other.to_vec2())
    }

    /// Converts the point into a `glam` vector for arithmetic.
    #[must_use]
    pub const fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for WorldPoint {
    fn from(value: Vec2) -> Self {
        Self::new(value.x, value.y)
    }
}

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every wave was cleared while the objective still had lives.
    Victory,
    /// The objective ran out of lives.
    Defeat,
}

/// Notifications describing state changes observed by adapters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The money balance changed.
    MoneyChanged {
        /// Balance after the change.
        balance: u32,
    },
    /// A wave began spawning units.
    WaveStarted {
        /// One-based index of the wave.
        wave: u32,
    },
    /// Every unit of a wave was spawned and resolved.
    WaveCompleted {
        /// One-based index of the completed wave.
        wave: u32,
    },
    /// A unit entered the path.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Wave the unit belongs to.
        wave: u32,
        /// Hit points the unit starts with.
        hit_points: i32,
    },
    /// A unit was destroyed by defenders.
    UnitKilled {
        /// Identifier of the destroyed unit.
        unit: UnitId,
        /// Money credited for the kill.
        bounty: u32,
    },
    /// A unit reached the objective.
    UnitArrived {
        /// Identifier of the unit that arrived.
        unit: UnitId,
    },
    /// The objective lost lives.
    ObjectiveDamaged {
        /// Lives remaining after the hit.
        remaining: u32,
    },
    /// A defender was constructed.
    DefenderPlaced {
        /// Identifier allocated to the defender.
        defender: DefenderId,
        /// Kind of defender placed.
        kind: DefenderKind,
        /// Cell the defender occupies.
        cell: CellCoord,
    },
    /// A defender advanced a level.
    DefenderUpgraded {
        /// Identifier of the upgraded defender.
        defender: DefenderId,
        /// Level reached by the upgrade.
        level: u8,
    },
    /// A defender was sold and removed.
    DefenderSold {
        /// Identifier of the sold defender.
        defender: DefenderId,
        /// Money refunded for the sale.
        salvage: u32,
    },
    /// A defender landed a hit on a unit.
    DefenderAttacked {
        /// Identifier of the attacking defender.
        defender: DefenderId,
        /// Identifier of the unit that was hit.
        unit: UnitId,
        /// Damage applied by the hit.
        damage: u32,
    },
    /// The session was suspended.
    Paused,
    /// The session resumed after a pause.
    Resumed,
    /// The session reached a terminal outcome.
    Concluded {
        /// Outcome that was latched.
        outcome: Outcome,
    },
}

/// Receiver for state-change notifications emitted by the simulation.
///
/// Implementations are invoked from actor tasks and must not block.
pub trait EventSink: Send + Sync {
    /// Delivers a single notification.
    fn publish(&self, event: Event);
}

/// Sink that discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: Event) {}
}

/// Reasons a defender placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The cell belongs to the path or holds an obstacle.
    #[error("cell is blocked")]
    Blocked,
    /// Another defender already occupies the cell.
    #[error("cell is occupied")]
    Occupied,
    /// The balance does not cover the defender's price.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Price of the requested defender.
        required: u32,
        /// Balance at the time of the request.
        available: u32,
    },
    /// The cell lies outside the placement grid.
    #[error("cell {0} lies outside the grid")]
    InvalidCoordinate(CellCoord),
    /// Player commands are refused while the session is paused.
    #[error("session is paused")]
    Paused,
    /// The session has concluded or was closed.
    #[error("session is over")]
    SessionOver,
}

/// Reasons a defender upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// No defender occupies the cell.
    #[error("no defender at cell")]
    NoDefender,
    /// The balance does not cover the upgrade price.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Price of the upgrade.
        required: u32,
        /// Balance at the time of the request.
        available: u32,
    },
    /// The defender already reached the top level.
    #[error("defender is at max level")]
    MaxLevel,
    /// The cell lies outside the placement grid.
    #[error("cell {0} lies outside the grid")]
    InvalidCoordinate(CellCoord),
    /// Player commands are refused while the session is paused.
    #[error("session is paused")]
    Paused,
    /// The session has concluded or was closed.
    #[error("session is over")]
    SessionOver,
}

/// Reasons a defender sale request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SellError {
    /// No defender occupies the cell.
    #[error("no defender at cell")]
    NoDefender,
    /// The cell lies outside the placement grid.
    #[error("cell {0} lies outside the grid")]
    InvalidCoordinate(CellCoord),
    /// Player commands are refused while the session is paused.
    #[error("session is paused")]
    Paused,
    /// The session has concluded or was closed.
    #[error("session is over")]
    SessionOver,
}

/// Immutable representation of a single live unit used for drawing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Identifier assigned to the unit.
    pub id: UnitId,
    /// Wave the unit belongs to.
    pub wave: u32,
    /// Current position along the path.
    pub position: WorldPoint,
    /// Remaining hit points.
    pub hit_points: i32,
    /// Hit points the unit spawned with.
    pub max_hit_points: i32,
    /// Whether the unit is still alive and unresolved.
    pub alive: bool,
}

/// Immutable representation of a single placed defender used for drawing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenderSnapshot {
    /// Identifier allocated to the defender.
    pub id: DefenderId,
    /// Kind of defender.
    pub kind: DefenderKind,
    /// Cell the defender occupies.
    pub cell: CellCoord,
    /// Current level.
    pub level: u8,
    /// Damage per hit at the current level.
    pub power: u32,
    /// Attack radius at the current level in world units.
    pub range: f32,
    /// Price of the next upgrade, if any remain.
    pub upgrade_price: Option<u32>,
}

/// Read-only snapshot of a whole session, polled at the adapter's redraw cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Difficulty tier of the session.
    pub tier: Tier,
    /// Current money balance.
    pub money: u32,
    /// One-based index of the current wave.
    pub wave: u32,
    /// Number of waves in the session.
    pub total_waves: u32,
    /// Lives left on the objective.
    pub objective_hit_points: u32,
    /// Position of the objective.
    pub objective_position: WorldPoint,
    /// Whether the session is currently paused.
    pub paused: bool,
    /// Terminal outcome, once latched.
    pub outcome: Option<Outcome>,
    /// Live units ordered by spawn time.
    pub units: Vec<UnitSnapshot>,
    /// Placed defenders ordered by cell.
    pub defenders: Vec<DefenderSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn cell_index_round_trips_within_grid() {
        let cell = CellCoord::new(7, 3);
        assert_eq!(cell.index(), Some(43));
        assert_eq!(CellCoord::from_index(43), Some(cell));
        assert_eq!(CellCoord::new(12, 0).index(), None);
        assert_eq!(CellCoord::from_index(72), None);
    }

    #[test]
    fn cell_center_accounts_for_header_band() {
        let center = CellCoord::new(0, 0).center();
        assert_eq!(center, WorldPoint::new(40.0, 160.0));
        let center = CellCoord::new(11, 5).center();
        assert_eq!(center, WorldPoint::new(920.0, 560.0));
    }

    #[test]
    fn salvage_truncates_fractional_refunds() {
        assert_eq!(salvage_value(100), 80);
        assert_eq!(salvage_value(180), 144);
        assert_eq!(salvage_value(99), 79);
        assert_eq!(salvage_value(0), 0);
    }

    #[test]
    fn world_distance_is_euclidean() {
        let a = WorldPoint::new(0.0, 0.0);
        let b = WorldPoint::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f32::EPSILON);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::InsufficientFunds {
            required: 100,
            available: 40,
        });
    }

    #[test]
    fn concluded_event_round_trips_through_bincode() {
        assert_round_trip(&Event::Concluded {
            outcome: Outcome::Defeat,
        });
    }

    #[test]
    fn errors_render_human_readable_messages() {
        let error = UpgradeError::InsufficientFunds {
            required: 180,
            available: 20,
        };
        assert_eq!(
            error.to_string(),
            "insufficient funds: 180 required, 20 available"
        );
        assert_eq!(
            SellError::InvalidCoordinate(CellCoord::new(13, 2)).to_string(),
            "cell (13, 2) lies outside the grid"
        );
    }
}

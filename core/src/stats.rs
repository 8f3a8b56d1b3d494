//! Behaviour tables for difficulty tiers and defender kinds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest level a defender can be upgraded to.
pub const MAX_DEFENDER_LEVEL: u8 = 3;

/// Difficulty tier selecting path geometry and unit scaling.
///
/// Tiers serialise as their zero-based index so session files can write
/// `tier = 0`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum Tier {
    /// Short two-wave session with the slowest units.
    Easy,
    /// Four waves of faster units.
    Medium,
    /// Six waves of the fastest, richest units.
    Hard,
}

/// Error raised when an integer does not name a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("tier index {0} is out of range (expected 0, 1 or 2)")]
pub struct TierOutOfRange(pub u32);

impl Tier {
    /// Every tier in ascending difficulty.
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    /// Resolves a tier from its index.
    ///
    /// An out-of-range index is a caller contract violation: debug builds
    /// panic, release builds clamp to [`Tier::Hard`].
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        debug_assert!(index < 3, "tier index {index} is out of range");
        match index {
            0 => Self::Easy,
            1 => Self::Medium,
            _ => Self::Hard,
        }
    }

    /// Zero-based index of the tier.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    /// Unit travel speed in world units per second.
    #[must_use]
    pub const fn unit_speed(self) -> f32 {
        match self {
            Self::Easy => 100.0,
            Self::Medium => 150.0,
            Self::Hard => 200.0,
        }
    }

    /// Money credited when a unit of this tier is killed.
    #[must_use]
    pub const fn unit_bounty(self) -> u32 {
        match self {
            Self::Easy | Self::Medium => 10,
            Self::Hard => 15,
        }
    }

    /// Starting hit points for a unit spawned in the given one-based wave.
    #[must_use]
    pub const fn unit_hit_points(self, wave: u32) -> i32 {
        let scaled = 100 + 50 * self.index() as i64 + 25 * wave as i64;
        if scaled > i32::MAX as i64 {
            i32::MAX
        } else {
            scaled as i32
        }
    }

    /// Number of waves a session on this tier plays by default.
    #[must_use]
    pub const fn default_wave_count(self) -> u32 {
        2 * (self.index() + 1)
    }
}

impl TryFrom<u32> for Tier {
    type Error = TierOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Easy),
            1 => Ok(Self::Medium),
            2 => Ok(Self::Hard),
            other => Err(TierOutOfRange(other)),
        }
    }
}

impl From<Tier> for u32 {
    fn from(value: Tier) -> Self {
        value.index()
    }
}

/// How a defender distributes damage when it attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttackPattern {
    /// Hits the earliest-spawned unit in range.
    Single,
    /// Hits every unit in range at once.
    Area,
}

/// Kinds of defenders that can be placed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenderKind {
    /// Cheap long-range defender firing at one unit per shot.
    Bolt,
    /// Expensive short-range defender that pulses damage at every unit nearby.
    Flare,
}

/// Stats of a defender kind at one level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderProfile {
    /// Damage dealt per hit.
    pub power: u32,
    /// Attack radius in world units.
    pub range: f32,
    /// Time between attacks.
    pub cooldown: Duration,
    /// Value of the defender at this level; the purchase price at level one.
    pub price: u32,
    /// Cost of advancing to the next level, if one exists.
    pub upgrade_price: Option<u32>,
}

const BOLT_PROFILES: [DefenderProfile; MAX_DEFENDER_LEVEL as usize] = [
    DefenderProfile {
        power: 30,
        range: 200.0,
        cooldown: Duration::from_millis(800),
        price: 100,
        upgrade_price: Some(180),
    },
    DefenderProfile {
        power: 45,
        range: 280.0,
        cooldown: Duration::from_millis(650),
        price: 180,
        upgrade_price: Some(260),
    },
    DefenderProfile {
        power: 60,
        range: 360.0,
        cooldown: Duration::from_millis(500),
        price: 260,
        upgrade_price: None,
    },
];

const FLARE_PROFILES: [DefenderProfile; MAX_DEFENDER_LEVEL as usize] = [
    DefenderProfile {
        power: 20,
        range: 150.0,
        cooldown: Duration::from_millis(1200),
        price: 180,
        upgrade_price: Some(260),
    },
    DefenderProfile {
        power: 30,
        range: 180.0,
        cooldown: Duration::from_millis(1000),
        price: 260,
        upgrade_price: Some(320),
    },
    DefenderProfile {
        power: 40,
        range: 210.0,
        cooldown: Duration::from_millis(800),
        price: 320,
        upgrade_price: None,
    },
];

impl DefenderKind {
    /// Every defender kind in catalogue order.
    pub const ALL: [DefenderKind; 2] = [DefenderKind::Bolt, DefenderKind::Flare];

    /// Damage distribution used by this kind.
    #[must_use]
    pub const fn pattern(self) -> AttackPattern {
        match self {
            Self::Bolt => AttackPattern::Single,
            Self::Flare => AttackPattern::Area,
        }
    }

    /// Stats at the given one-based level, or `None` outside `1..=3`.
    #[must_use]
    pub fn profile(self, level: u8) -> Option<DefenderProfile> {
        let index = usize::from(level.checked_sub(1)?);
        let table = match self {
            Self::Bolt => &BOLT_PROFILES,
            Self::Flare => &FLARE_PROFILES,
        };
        table.get(index).copied()
    }

    /// Stats at `level`, clamped into `1..=MAX_DEFENDER_LEVEL`.
    #[must_use]
    pub fn clamped_profile(self, level: u8) -> DefenderProfile {
        let index = usize::from(level.clamp(1, MAX_DEFENDER_LEVEL) - 1);
        match self {
            Self::Bolt => BOLT_PROFILES[index],
            Self::Flare => FLARE_PROFILES[index],
        }
    }

    /// Price of placing a new defender of this kind.
    #[must_use]
    pub const fn price(self) -> u32 {
        match self {
            Self::Bolt => BOLT_PROFILES[0].price,
            Self::Flare => FLARE_PROFILES[0].price,
        }
    }
}

//! Session configuration loaded from TOML.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use lane_defence_core::{CellCoord, Tier};
use lane_defence_system_spawning::WavePlan;
use lane_defence_world::{
    LayoutError, PathLayout, WorldConfig, DEFAULT_OBJECTIVE_HIT_POINTS, DEFAULT_STARTING_MONEY,
    DEFAULT_WAVE_QUOTA,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration file version understood by this build.
pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

const DEFAULT_TICK_MS: u64 = 20;
const DEFAULT_SPAWN_INTERVAL_MS: u64 = 1_000;
const DEFAULT_INTERMISSION_MS: u64 = 3_000;

/// Reasons a session configuration is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read session config at {}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The contents are not valid session TOML.
    #[error("failed to parse session config toml")]
    Parse(#[from] toml::de::Error),
    /// The file declares a version this build cannot read.
    #[error("unsupported session config version {found}; expected {SUPPORTED_CONFIG_VERSION}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
    },
    /// The tick interval is zero.
    #[error("tick_ms must be greater than zero")]
    ZeroTick,
    /// The per-wave quota is zero.
    #[error("waves.quota must be greater than zero")]
    ZeroQuota,
    /// The wave count is zero.
    #[error("waves.count must be greater than zero")]
    ZeroWaves,
    /// The custom layout is malformed.
    #[error("invalid custom layout")]
    Layout(#[from] LayoutError),
}

/// Everything needed to start a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// File format version; must equal [`SUPPORTED_CONFIG_VERSION`].
    pub version: u32,
    /// Difficulty tier, written as `0`, `1` or `2`.
    pub tier: Tier,
    /// Opening money.
    #[serde(default = "default_starting_money")]
    pub starting_money: u32,
    /// Opening objective lives.
    #[serde(default = "default_objective_hit_points")]
    pub objective_hit_points: u32,
    /// Actor tick in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Wave pacing.
    #[serde(default)]
    pub waves: WaveConfig,
    /// Replaces the tier's built-in path when present.
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
}

/// Wave pacing section of a [`SessionConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveConfig {
    /// Units spawned per wave.
    pub quota: u32,
    /// Delay between spawns in milliseconds.
    pub spawn_interval_ms: u64,
    /// Countdown before each wave in milliseconds.
    pub intermission_ms: u64,
    /// Number of waves; the tier decides when absent.
    pub count: Option<u32>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            quota: DEFAULT_WAVE_QUOTA,
            spawn_interval_ms: DEFAULT_SPAWN_INTERVAL_MS,
            intermission_ms: DEFAULT_INTERMISSION_MS,
            count: None,
        }
    }
}

/// Custom path section of a [`SessionConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Waypoint cells as `[column, row]` pairs, spawn first.
    pub waypoints: Vec<(u32, u32)>,
    /// Extra cells where defenders may not stand.
    #[serde(default)]
    pub blocked: Vec<(u32, u32)>,
}

impl LayoutConfig {
    fn build(&self) -> Result<PathLayout, LayoutError> {
        let cell = |&(column, row): &(u32, u32)| CellCoord::new(column, row);
        PathLayout::new(
            self.waypoints.iter().map(cell).collect(),
            self.blocked.iter().map(cell),
        )
    }
}

fn default_starting_money() -> u32 {
    DEFAULT_STARTING_MONEY
}

fn default_objective_hit_points() -> u32 {
    DEFAULT_OBJECTIVE_HIT_POINTS
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

impl SessionConfig {
    /// Default session for `tier`.
    #[must_use]
    pub fn for_tier(tier: Tier) -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            tier,
            starting_money: DEFAULT_STARTING_MONEY,
            objective_hit_points: DEFAULT_OBJECTIVE_HIT_POINTS,
            tick_ms: DEFAULT_TICK_MS,
            waves: WaveConfig::default(),
            layout: None,
        }
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks every field that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.waves.quota == 0 {
            return Err(ConfigError::ZeroQuota);
        }
        if self.waves.count == Some(0) {
            return Err(ConfigError::ZeroWaves);
        }
        if let Some(layout) = &self.layout {
            let _ = layout.build()?;
        }
        Ok(())
    }

    /// Actor tick interval.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Number of waves the session plays.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        self.waves
            .count
            .unwrap_or_else(|| self.tier.default_wave_count())
    }

    /// Wave pacing for the scheduler.
    #[must_use]
    pub fn wave_plan(&self) -> WavePlan {
        WavePlan::new(
            self.waves.quota,
            Duration::from_millis(self.waves.spawn_interval_ms),
            Duration::from_millis(self.waves.intermission_ms),
        )
    }

    /// Parameters for a fresh world.
    pub fn world_config(&self) -> Result<WorldConfig, ConfigError> {
        let layout = match &self.layout {
            Some(layout) => layout.build()?,
            None => PathLayout::builtin(self.tier),
        };
        Ok(WorldConfig {
            tier: self.tier,
            layout,
            starting_money: self.starting_money,
            objective_hit_points: self.objective_hit_points,
            total_waves: self.total_waves(),
        })
    }
}

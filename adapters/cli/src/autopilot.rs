//! Seeded stand-in for a player that spends money as soon as it can.

use lane_defence_core::{CellCoord, DefenderKind, GRID_COLUMNS, GRID_ROWS};
use lane_defence_simulation::Simulation;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Command the autopilot issued during a redraw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// A new defender was bought.
    Placed {
        /// Kind bought.
        kind: DefenderKind,
        /// Cell it was placed on.
        cell: CellCoord,
    },
    /// An existing defender gained a level.
    Upgraded {
        /// Cell of the upgraded defender.
        cell: CellCoord,
        /// Level reached.
        level: u8,
    },
}

/// Places and upgrades defenders using a reproducible random stream.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
}

impl Autopilot {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Issues at most one command against `simulation`.
    pub(crate) fn act(&mut self, simulation: &Simulation) -> Option<Action> {
        let snapshot = simulation.snapshot();
        if snapshot.paused || snapshot.outcome.is_some() {
            return None;
        }

        let (preferred, fallback) = if self.rng.gen_bool(0.7) {
            (DefenderKind::Bolt, DefenderKind::Flare)
        } else {
            (DefenderKind::Flare, DefenderKind::Bolt)
        };
        let kind = [preferred, fallback]
            .into_iter()
            .find(|kind| snapshot.money >= kind.price());
        if let Some(kind) = kind {
            let free: Vec<CellCoord> = (0..GRID_COLUMNS * GRID_ROWS)
                .filter_map(CellCoord::from_index)
                .filter(|cell| simulation.is_cell_free(*cell))
                .collect();
            if let Some(&cell) = free.choose(&mut self.rng) {
                if simulation.place_defender(kind, cell).is_ok() {
                    return Some(Action::Placed { kind, cell });
                }
            }
        }

        let affordable: Vec<CellCoord> = snapshot
            .defenders
            .iter()
            .filter(|defender| {
                defender
                    .upgrade_price
                    .is_some_and(|price| price <= snapshot.money)
            })
            .map(|defender| defender.cell)
            .collect();
        let &cell = affordable.choose(&mut self.rng)?;
        let level = simulation.upgrade_defender(cell).ok()?;
        Some(Action::Upgraded { cell, level })
    }
}

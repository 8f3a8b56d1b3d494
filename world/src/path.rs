//! Path geometry and the placement mask derived from it.

use std::collections::BTreeSet;

use lane_defence_core::{CellCoord, Tier, WorldPoint};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a path layout is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum LayoutError {
    /// Fewer than two waypoints were supplied.
    #[error("a path needs at least two waypoints, found {0}")]
    TooFewWaypoints(usize),
    /// A waypoint lies outside the placement grid.
    #[error("waypoint {0} lies outside the grid")]
    OutOfGrid(CellCoord),
    /// Two consecutive waypoints share neither a column nor a row.
    #[error("leg from {from} to {to} is not axis aligned")]
    DiagonalLeg {
        /// Start of the offending leg.
        from: CellCoord,
        /// End of the offending leg.
        to: CellCoord,
    },
}

/// Ordered waypoints units follow together with the cells defenders may not use.
#[derive(Clone, Debug, PartialEq)]
pub struct PathLayout {
    cells: Vec<CellCoord>,
    waypoints: Vec<WorldPoint>,
    blocked: BTreeSet<CellCoord>,
}

impl PathLayout {
    /// Validates a custom layout.
    ///
    /// Every cell crossed by a leg is blocked in addition to `blocked`.
    pub fn new(
        cells: Vec<CellCoord>,
        blocked: impl IntoIterator<Item = CellCoord>,
    ) -> Result<Self, LayoutError> {
        if cells.len() < 2 {
            return Err(LayoutError::TooFewWaypoints(cells.len()));
        }
        if let Some(outside) = cells.iter().find(|cell| !cell.is_within_grid()) {
            return Err(LayoutError::OutOfGrid(*outside));
        }
        for leg in cells.windows(2) {
            let (from, to) = (leg[0], leg[1]);
            if from.column() != to.column() && from.row() != to.row() {
                return Err(LayoutError::DiagonalLeg { from, to });
            }
        }
        let blocked = blocked.into_iter().filter(CellCoord::is_within_grid);
        Ok(Self::assemble(cells, blocked))
    }

    /// Layout shipped with the given tier.
    #[must_use]
    pub fn builtin(tier: Tier) -> Self {
        let (waypoints, blocked): (&[(u32, u32)], &[u32]) = match tier {
            Tier::Easy => (&EASY_WAYPOINTS, &EASY_BLOCKED),
            Tier::Medium => (&MEDIUM_WAYPOINTS, &MEDIUM_BLOCKED),
            Tier::Hard => (&HARD_WAYPOINTS, &HARD_BLOCKED),
        };
        let cells = waypoints
            .iter()
            .map(|&(column, row)| CellCoord::new(column, row))
            .collect();
        let blocked = blocked
            .iter()
            .filter_map(|&index| CellCoord::from_index(index));
        Self::assemble(cells, blocked)
    }

    fn assemble(cells: Vec<CellCoord>, blocked: impl Iterator<Item = CellCoord>) -> Self {
        let mut mask: BTreeSet<CellCoord> = blocked.collect();
        for leg in cells.windows(2) {
            mask.extend(leg_cells(leg[0], leg[1]));
        }
        let waypoints = cells.iter().map(CellCoord::center).collect();
        Self {
            cells,
            waypoints,
            blocked: mask,
        }
    }

    /// Waypoints in world space, spawn first and objective last.
    #[must_use]
    pub fn waypoints(&self) -> &[WorldPoint] {
        &self.waypoints
    }

    /// Waypoints as grid cells.
    #[must_use]
    pub fn waypoint_cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Where new units appear.
    #[must_use]
    pub fn spawn_position(&self) -> WorldPoint {
        self.waypoints.first().copied().unwrap_or_default()
    }

    /// Where the objective stands.
    #[must_use]
    pub fn objective_position(&self) -> WorldPoint {
        self.waypoints.last().copied().unwrap_or_default()
    }

    /// Reports whether defenders are forbidden on `cell`.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        self.blocked.contains(&cell)
    }

    /// Iterates over every blocked cell in row-major order.
    pub fn blocked_cells(&self) -> impl Iterator<Item = CellCoord> {
        let mut cells: Vec<CellCoord> = self.blocked.iter().copied().collect();
        cells.sort_by_key(|cell| (cell.row(), cell.column()));
        cells.into_iter()
    }
}

fn leg_cells(from: CellCoord, to: CellCoord) -> impl Iterator<Item = CellCoord> {
    let (low_column, high_column) = ordered(from.column(), to.column());
    let (low_row, high_row) = ordered(from.row(), to.row());
    (low_row..=high_row)
        .flat_map(move |row| (low_column..=high_column).map(move |column| (column, row)))
        .map(|(column, row)| CellCoord::new(column, row))
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

const EASY_WAYPOINTS: [(u32, u32); 8] = [
    (1, 0),
    (1, 3),
    (4, 3),
    (4, 2),
    (7, 2),
    (7, 3),
    (10, 3),
    (10, 0),
];

const EASY_BLOCKED: [u32; 34] = [
    1, 10, 13, 22, 25, 28, 29, 30, 31, 34, 37, 38, 39, 40, 43, 44, 45, 46, 48, 49, 53, 54, 58, 59,
    60, 61, 62, 63, 65, 66, 68, 69, 70, 71,
];

const MEDIUM_WAYPOINTS: [(u32, u32); 8] = [
    (0, 0),
    (9, 0),
    (9, 2),
    (2, 2),
    (2, 4),
    (8, 4),
    (8, 3),
    (9, 3),
];

const MEDIUM_BLOCKED: [u32; 45] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 21, 24, 26, 27, 28, 29, 30, 31, 32, 33, 38, 44, 45, 48, 49, 50,
    51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 67, 68, 69, 70, 71,
];

const HARD_WAYPOINTS: [(u32, u32); 9] = [
    (0, 1),
    (2, 1),
    (2, 4),
    (4, 4),
    (4, 2),
    (7, 2),
    (7, 4),
    (10, 4),
    (10, 0),
];

const HARD_BLOCKED: [u32; 41] = [
    8, 9, 10, 12, 13, 14, 20, 21, 22, 24, 25, 26, 28, 29, 30, 31, 34, 36, 37, 38, 40, 43, 46, 48,
    49, 50, 51, 52, 55, 56, 57, 58, 59, 60, 61, 62, 63, 68, 69, 70, 71,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_layouts_pass_validation() {
        for tier in Tier::ALL {
            let layout = PathLayout::builtin(tier);
            let rebuilt = PathLayout::new(
                layout.waypoint_cells().to_vec(),
                layout.blocked_cells().collect::<Vec<_>>(),
            )
            .expect("builtin layout is valid");
            assert_eq!(rebuilt, layout, "{tier:?}");
        }
    }

    #[test]
    fn builtin_masks_already_cover_their_paths() {
        let lists: [(Tier, &[u32]); 3] = [
            (Tier::Easy, &EASY_BLOCKED),
            (Tier::Medium, &MEDIUM_BLOCKED),
            (Tier::Hard, &HARD_BLOCKED),
        ];
        for (tier, list) in lists {
            let layout = PathLayout::builtin(tier);
            assert_eq!(layout.blocked_cells().count(), list.len(), "{tier:?}");
        }
    }

    #[test]
    fn objective_sits_on_final_waypoint() {
        let layout = PathLayout::builtin(Tier::Easy);
        assert_eq!(layout.spawn_position(), CellCoord::new(1, 0).center());
        assert_eq!(layout.objective_position(), CellCoord::new(10, 0).center());
        assert!(layout.is_blocked(CellCoord::new(1, 2)));
        assert!(!layout.is_blocked(CellCoord::new(0, 0)));
    }

    #[test]
    fn custom_layout_blocks_leg_cells() {
        let layout = PathLayout::new(
            vec![CellCoord::new(0, 0), CellCoord::new(3, 0), CellCoord::new(3, 2)],
            [CellCoord::new(11, 5)],
        )
        .expect("valid layout");
        for column in 0..=3 {
            assert!(layout.is_blocked(CellCoord::new(column, 0)));
        }
        assert!(layout.is_blocked(CellCoord::new(3, 1)));
        assert!(layout.is_blocked(CellCoord::new(11, 5)));
        assert!(!layout.is_blocked(CellCoord::new(0, 1)));
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        assert_eq!(
            PathLayout::new(vec![CellCoord::new(0, 0)], []),
            Err(LayoutError::TooFewWaypoints(1))
        );
        assert_eq!(
            PathLayout::new(vec![CellCoord::new(0, 0), CellCoord::new(12, 0)], []),
            Err(LayoutError::OutOfGrid(CellCoord::new(12, 0)))
        );
        assert_eq!(
            PathLayout::new(vec![CellCoord::new(0, 0), CellCoord::new(2, 2)], []),
            Err(LayoutError::DiagonalLeg {
                from: CellCoord::new(0, 0),
                to: CellCoord::new(2, 2),
            })
        );
    }
}

//! Authoritative defender state management utilities.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use lane_defence_core::{
    CellCoord, DefenderId, DefenderKind, DefenderProfile, DefenderSnapshot, WorldPoint,
    MAX_DEFENDER_LEVEL,
};
use lane_defence_system_coordinator::Lifeline;

/// Shared state of a placed defender.
#[derive(Debug)]
pub struct DefenderRecord {
    id: DefenderId,
    kind: DefenderKind,
    cell: CellCoord,
    level: AtomicU8,
    lifeline: Lifeline,
}

impl DefenderRecord {
    fn new(id: DefenderId, kind: DefenderKind, cell: CellCoord) -> Self {
        Self {
            id,
            kind,
            cell,
            level: AtomicU8::new(1),
            lifeline: Lifeline::new(),
        }
    }

    /// Identifier allocated when the defender was placed.
    #[must_use]
    pub const fn id(&self) -> DefenderId {
        self.id
    }

    /// Kind of defender.
    #[must_use]
    pub const fn kind(&self) -> DefenderKind {
        self.kind
    }

    /// Cell the defender occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Centre of the occupied cell; ranges are measured from here.
    #[must_use]
    pub fn center(&self) -> WorldPoint {
        self.cell.center()
    }

    /// Current level in `1..=MAX_DEFENDER_LEVEL`.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Acquire)
    }

    /// Stats at the current level.
    #[must_use]
    pub fn profile(&self) -> DefenderProfile {
        self.kind.clamped_profile(self.level())
    }

    /// Lifeline of the actor animating this defender.
    #[must_use]
    pub fn lifeline(&self) -> &Lifeline {
        &self.lifeline
    }

    /// Immutable view of the defender for adapters.
    #[must_use]
    pub fn snapshot(&self) -> DefenderSnapshot {
        let level = self.level();
        let profile = self.kind.clamped_profile(level);
        DefenderSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            level,
            power: profile.power,
            range: profile.range,
            upgrade_price: profile.upgrade_price,
        }
    }

    fn advance_level(&self) -> u8 {
        let next = self.level().saturating_add(1).min(MAX_DEFENDER_LEVEL);
        self.level.store(next, Ordering::Release);
        next
    }
}

/// Registry that stores defenders by cell and manages identifier allocation.
///
/// The registry itself is not synchronised; the world guards it with a lock
/// and performs validation, payment and mutation while holding that lock.
#[derive(Debug)]
pub(crate) struct DefenderGrid {
    entries: BTreeMap<CellCoord, Arc<DefenderRecord>>,
    next_defender_id: DefenderId,
}

impl DefenderGrid {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_defender_id: DefenderId::new(0),
        }
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<&Arc<DefenderRecord>> {
        self.entries.get(&cell)
    }

    pub(crate) fn is_occupied(&self, cell: CellCoord) -> bool {
        self.entries.contains_key(&cell)
    }

    /// Stores a new level-one defender on `cell`.
    pub(crate) fn insert(&mut self, kind: DefenderKind, cell: CellCoord) -> Arc<DefenderRecord> {
        let id = self.next_defender_id;
        self.next_defender_id = DefenderId::new(id.get().saturating_add(1));
        let record = Arc::new(DefenderRecord::new(id, kind, cell));
        let _ = self.entries.insert(cell, Arc::clone(&record));
        record
    }

    /// Raises the level of the defender on `cell` and returns the new level.
    pub(crate) fn upgrade(&self, cell: CellCoord) -> Option<u8> {
        self.entries.get(&cell).map(|record| record.advance_level())
    }

    pub(crate) fn remove(&mut self, cell: CellCoord) -> Option<Arc<DefenderRecord>> {
        self.entries.remove(&cell)
    }

    /// Every defender ordered by identifier.
    pub(crate) fn records(&self) -> Vec<Arc<DefenderRecord>> {
        let mut records: Vec<_> = self.entries.values().cloned().collect();
        records.sort_by_key(|record| record.id());
        records
    }
}

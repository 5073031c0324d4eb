//! Snapshot layer preserving cell content while a cell is outside the visible window.

use std::collections::{hash_map::Entry, HashMap};

use geocache_core::{CellCoord, Item, SnapshotPolicy};

use crate::store::Cell;

/// Immutable copy of a cell's item sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellMemento {
    cell: CellCoord,
    items: Vec<Item>,
}

impl CellMemento {
    fn capture(cell: &Cell) -> Self {
        Self {
            cell: cell.coord(),
            items: cell.items().to_vec(),
        }
    }

    /// Coordinate of the captured cell.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Items held by the cell when the snapshot was taken, oldest first.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

/// Snapshot store keyed by cell coordinate.
#[derive(Debug)]
pub(crate) struct MementoCache {
    policy: SnapshotPolicy,
    snapshots: HashMap<CellCoord, CellMemento>,
}

impl MementoCache {
    pub(crate) fn new(policy: SnapshotPolicy) -> Self {
        Self {
            policy,
            snapshots: HashMap::new(),
        }
    }

    /// Records the cell's current content, subject to the snapshot policy.
    ///
    /// Returns `true` when the snapshot now reflects the cell.
    pub(crate) fn save(&mut self, cell: &Cell) -> bool {
        match self.snapshots.entry(cell.coord()) {
            Entry::Vacant(slot) => {
                let _ = slot.insert(CellMemento::capture(cell));
                true
            }
            Entry::Occupied(mut slot) => match self.policy {
                SnapshotPolicy::FirstWriteWins => false,
                SnapshotPolicy::LatestState => {
                    let _ = slot.insert(CellMemento::capture(cell));
                    true
                }
            },
        }
    }

    /// Returns the snapshot for `coord`, if one was ever saved.
    pub(crate) fn restore(&self, coord: CellCoord) -> Option<&CellMemento> {
        self.snapshots.get(&coord)
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CellStore;

    fn cell_with_items(store: &mut CellStore, coord: CellCoord, count: usize) -> Cell {
        let id = store.get_or_create(coord);
        for _ in 0..count {
            let _ = store.create_item(id);
        }
        store.cell_mut(id).mark_resident();
        store.cell(id).clone()
    }

    #[test]
    fn restore_reports_absence_for_unseen_cells() {
        let cache = MementoCache::new(SnapshotPolicy::LatestState);
        assert!(cache.restore(CellCoord::new(0, 0)).is_none());
    }

    #[test]
    fn save_then_restore_returns_items_verbatim() {
        let mut store = CellStore::new();
        let coord = CellCoord::new(3, 4);
        let cell = cell_with_items(&mut store, coord, 3);
        let mut cache = MementoCache::new(SnapshotPolicy::LatestState);

        assert!(cache.save(&cell));

        let memento = cache.restore(coord).expect("snapshot saved");
        assert_eq!(memento.cell(), coord);
        assert_eq!(memento.items(), cell.items());
    }

    #[test]
    fn first_write_wins_ignores_later_saves() {
        let mut store = CellStore::new();
        let coord = CellCoord::new(0, 0);
        let mut cell = cell_with_items(&mut store, coord, 2);
        let mut cache = MementoCache::new(SnapshotPolicy::FirstWriteWins);
        assert!(cache.save(&cell));

        let _ = cell.pop_item();
        assert!(!cache.save(&cell));

        let memento = cache.restore(coord).expect("snapshot saved");
        assert_eq!(memento.items().len(), 2);
    }

    #[test]
    fn latest_state_replaces_previous_snapshot() {
        let mut store = CellStore::new();
        let coord = CellCoord::new(0, 0);
        let mut cell = cell_with_items(&mut store, coord, 2);
        let mut cache = MementoCache::new(SnapshotPolicy::LatestState);
        assert!(cache.save(&cell));

        let _ = cell.pop_item();
        assert!(cache.save(&cell));

        let memento = cache.restore(coord).expect("snapshot saved");
        assert_eq!(memento.items(), &[Item::new(coord, 0)]);
        assert_eq!(cache.len(), 1);
    }
}

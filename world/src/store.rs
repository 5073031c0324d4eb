//! Flyweight registry guaranteeing a single canonical cell per coordinate.

use std::collections::HashMap;

use geocache_core::{CellCoord, Item};

/// Index of a cell inside the store's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CellId(usize);

/// Lifecycle stage of a cell's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellStatus {
    /// The spawn decision has not been taken yet.
    Undecided,
    /// The cell's items live in the store and are authoritative.
    Resident,
    /// The cell left the visible window; its content lives in the memento cache.
    ///
    /// The entry itself stays in the store, so the cell keeps its identity and
    /// is never duplicated. Its items are cleared rather than kept alongside the
    /// snapshot: at any moment exactly one place holds a cell's content, the
    /// store while resident and the snapshot while released, so there is no
    /// second copy to keep in sync. Under a first-write-wins policy the
    /// snapshot can lag behind the last live content.
    Released,
}

/// Canonical content container for one grid coordinate.
#[derive(Clone, Debug)]
pub struct Cell {
    coord: CellCoord,
    items: Vec<Item>,
    status: CellStatus,
    materialized: bool,
}

impl Cell {
    fn new(coord: CellCoord) -> Self {
        Self {
            coord,
            items: Vec::new(),
            status: CellStatus::Undecided,
            materialized: false,
        }
    }

    /// Coordinate identifying the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Items currently held by the cell, oldest first.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Lifecycle stage of the cell's content.
    #[must_use]
    pub const fn status(&self) -> CellStatus {
        self.status
    }

    /// Reports whether the cell is part of the rendered window.
    #[must_use]
    pub const fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub(crate) fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub(crate) fn pop_item(&mut self) -> Option<Item> {
        self.items.pop()
    }

    /// Replaces the content with items recovered from a snapshot.
    pub(crate) fn adopt(&mut self, items: Vec<Item>) {
        self.items = items;
        self.status = CellStatus::Resident;
    }

    pub(crate) fn mark_resident(&mut self) {
        self.status = CellStatus::Resident;
    }

    pub(crate) fn set_materialized(&mut self, materialized: bool) {
        self.materialized = materialized;
    }

    /// Drops the live copy of the content once it has been handed to the memento cache.
    pub(crate) fn release(&mut self) {
        self.items.clear();
        self.status = CellStatus::Released;
        self.materialized = false;
    }
}

/// Arena of cells indexed by coordinate.
#[derive(Debug, Default)]
pub(crate) struct CellStore {
    cells: Vec<Cell>,
    index: HashMap<CellCoord, CellId>,
}

impl CellStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical cell for `coord`, creating an empty one on first use.
    pub(crate) fn get_or_create(&mut self, coord: CellCoord) -> CellId {
        if let Some(id) = self.index.get(&coord) {
            return *id;
        }

        let id = CellId(self.cells.len());
        self.cells.push(Cell::new(coord));
        let _ = self.index.insert(coord, id);
        id
    }

    pub(crate) fn lookup(&self, coord: CellCoord) -> Option<CellId> {
        self.index.get(&coord).copied()
    }

    pub(crate) fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.0]
    }

    /// Allocates the next item of a cell that is being spawned.
    ///
    /// The serial equals the number of items the cell holds at call time.
    pub(crate) fn create_item(&mut self, id: CellId) -> Item {
        let cell = self.cell_mut(id);
        debug_assert_eq!(
            cell.status,
            CellStatus::Undecided,
            "items are only created while a cell spawns"
        );
        let serial = u32::try_from(cell.items.len()).unwrap_or(u32::MAX);
        let item = Item::new(cell.coord, serial);
        cell.push_item(item);
        item
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }
}

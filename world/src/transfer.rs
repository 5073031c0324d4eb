//! Item transfers between a cell and the player's inventory.
//!
//! Both operations check their precondition before touching either container,
//! so a rejected transfer leaves the cell and the inventory untouched.

use geocache_core::{Item, TransferError};

use crate::{inventory::Inventory, store::Cell};

/// Moves the newest item of `cell` onto the inventory.
pub(crate) fn collect(cell: &mut Cell, inventory: &mut Inventory) -> Result<Item, TransferError> {
    let item = cell.pop_item().ok_or(TransferError::EmptyCell)?;
    inventory.push(item);
    Ok(item)
}

/// Moves the newest inventory item into `cell`.
pub(crate) fn deposit(cell: &mut Cell, inventory: &mut Inventory) -> Result<Item, TransferError> {
    let item = inventory.pop().ok_or(TransferError::EmptyInventory)?;
    cell.push_item(item);
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CellStore;
    use geocache_core::CellCoord;

    fn spawned_cell(count: usize) -> Cell {
        let mut store = CellStore::new();
        let id = store.get_or_create(CellCoord::new(0, 0));
        for _ in 0..count {
            let _ = store.create_item(id);
        }
        store.cell_mut(id).mark_resident();
        store.cell(id).clone()
    }

    #[test]
    fn collect_from_empty_cell_is_rejected() {
        let mut cell = spawned_cell(0);
        let mut inventory = Inventory::new();

        assert_eq!(
            collect(&mut cell, &mut inventory),
            Err(TransferError::EmptyCell)
        );
        assert!(cell.items().is_empty());
        assert!(inventory.is_empty());
    }

    #[test]
    fn deposit_from_empty_inventory_is_rejected() {
        let mut cell = spawned_cell(2);
        let mut inventory = Inventory::new();

        assert_eq!(
            deposit(&mut cell, &mut inventory),
            Err(TransferError::EmptyInventory)
        );
        assert_eq!(cell.items().len(), 2);
    }

    #[test]
    fn collect_takes_newest_item_first() {
        let mut cell = spawned_cell(3);
        let mut inventory = Inventory::new();
        let origin = CellCoord::new(0, 0);

        let collected: Vec<Item> = (0..3)
            .map(|_| collect(&mut cell, &mut inventory).expect("item available"))
            .collect();

        assert_eq!(
            collected,
            vec![
                Item::new(origin, 2),
                Item::new(origin, 1),
                Item::new(origin, 0)
            ]
        );
        assert_eq!(inventory.items(), collected.as_slice());
    }

    #[test]
    fn deposit_returns_items_in_reverse_collection_order() {
        let mut cell = spawned_cell(2);
        let mut inventory = Inventory::new();
        let origin = CellCoord::new(0, 0);
        let _ = collect(&mut cell, &mut inventory).expect("item available");
        let _ = collect(&mut cell, &mut inventory).expect("item available");

        let first = deposit(&mut cell, &mut inventory).expect("inventory not empty");
        let second = deposit(&mut cell, &mut inventory).expect("inventory not empty");

        assert_eq!(first, Item::new(origin, 0));
        assert_eq!(second, Item::new(origin, 1));
        assert_eq!(cell.items(), &[Item::new(origin, 0), Item::new(origin, 1)]);
    }
}

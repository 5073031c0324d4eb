#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Geocache adapters.
//!
//! Renderers never hold references into the world. They receive cell copies
//! when a cell enters the window, drop their tile when it leaves, and receive a
//! fresh copy whenever a transfer changes a cell they are drawing.

use anyhow::Result as AnyResult;
use geocache_core::{CellCoord, CellView, Event, Item, TransferError};
use thiserror::Error;

/// Per-frame summary handed to renderers after each processed input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Cell occupied by the player.
    pub player: CellCoord,
    /// Items held by the player, oldest first.
    pub inventory: Vec<Item>,
    /// User-facing notices produced while processing the input.
    pub notices: Vec<String>,
    /// Forces a full redraw even when no tile changed.
    pub redraw: bool,
}

/// Rendering collaborator driven by world events.
pub trait TileRenderer {
    /// Draws a cell that entered the visible window.
    fn materialize(&mut self, view: &CellView);

    /// Disposes of a cell that left the visible window.
    fn dematerialize(&mut self, cell: CellCoord);

    /// Redraws a cell whose content changed while visible.
    fn refresh(&mut self, view: &CellView) {
        self.materialize(view);
    }

    /// Presents the frame once all tile updates for an input were delivered.
    fn present(&mut self, frame: &Frame) -> AnyResult<()>;
}

/// Errors that can occur while forwarding events to a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RenderingError {
    /// The world could not describe a cell it asked to draw.
    #[error("cell {cell} was materialized but has no content to draw")]
    MissingCell {
        /// Cell that could not be described.
        cell: CellCoord,
    },
}

/// Forwards tile lifecycle events to `renderer`, re-querying cell content via `lookup`.
///
/// Events unrelated to tiles are ignored.
pub fn dispatch<R, F>(
    events: &[Event],
    mut lookup: F,
    renderer: &mut R,
) -> Result<(), RenderingError>
where
    R: TileRenderer + ?Sized,
    F: FnMut(CellCoord) -> Option<CellView>,
{
    for event in events {
        match *event {
            Event::CellMaterialized { cell } => {
                let view = lookup(cell).ok_or(RenderingError::MissingCell { cell })?;
                renderer.materialize(&view);
            }
            Event::CellDematerialized { cell } => renderer.dematerialize(cell),
            Event::ItemCollected { cell, .. } | Event::ItemDeposited { cell, .. } => {
                let view = lookup(cell).ok_or(RenderingError::MissingCell { cell })?;
                renderer.refresh(&view);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Popup text describing a cell's content.
#[must_use]
pub fn describe_cell(view: &CellView) -> String {
    if view.items.is_empty() {
        return format!("Cell {} is empty.", view.cell);
    }

    let listing = view
        .items
        .iter()
        .map(Item::id)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Cell {} holds {} item(s): {listing}",
        view.cell,
        view.item_count()
    )
}

/// Popup text describing the player's inventory.
#[must_use]
pub fn describe_inventory(items: &[Item]) -> String {
    if items.is_empty() {
        return "Inventory is empty.".to_owned();
    }
    let listing = items.iter().map(Item::id).collect::<Vec<_>>().join(", ");
    format!("Inventory ({}): {listing}", items.len())
}

/// User-facing notice for transfer outcomes, if the event warrants one.
#[must_use]
pub fn notice_for(event: &Event) -> Option<String> {
    match event {
        Event::ItemCollected { cell, item } => Some(format!("Collected {item} from {cell}.")),
        Event::ItemDeposited { cell, item } => Some(format!("Deposited {item} into {cell}.")),
        Event::TransferRejected { cell, reason } => Some(rejection_notice(*cell, *reason)),
        _ => None,
    }
}

fn rejection_notice(cell: CellCoord, reason: TransferError) -> String {
    match reason {
        TransferError::EmptyCell | TransferError::EmptyInventory => {
            let mut notice = reason.to_string();
            if let Some(first) = notice.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            format!("{notice}.")
        }
        TransferError::NotMaterialized => format!("Cell {cell} is out of reach."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingRenderer {
        tiles: BTreeMap<CellCoord, usize>,
        refreshed: Vec<CellCoord>,
    }

    impl TileRenderer for RecordingRenderer {
        fn materialize(&mut self, view: &CellView) {
            let _ = self.tiles.insert(view.cell, view.item_count());
        }

        fn dematerialize(&mut self, cell: CellCoord) {
            let _ = self.tiles.remove(&cell);
        }

        fn refresh(&mut self, view: &CellView) {
            self.refreshed.push(view.cell);
            self.materialize(view);
        }

        fn present(&mut self, _frame: &Frame) -> AnyResult<()> {
            Ok(())
        }
    }

    fn view(cell: CellCoord, count: u32) -> CellView {
        CellView {
            cell,
            items: (0..count).map(|serial| Item::new(cell, serial)).collect(),
        }
    }

    #[test]
    fn dispatch_tracks_tile_lifecycle() {
        let mut renderer = RecordingRenderer::default();
        let origin = CellCoord::new(0, 0);
        let east = CellCoord::new(0, 1);
        let events = [
            Event::CellMaterialized { cell: origin },
            Event::CellMaterialized { cell: east },
            Event::CellDematerialized { cell: origin },
            Event::ItemCollected {
                cell: east,
                item: Item::new(east, 1),
            },
        ];

        dispatch(&events, |cell| Some(view(cell, 2)), &mut renderer).expect("dispatch succeeds");

        assert_eq!(renderer.tiles.keys().copied().collect::<Vec<_>>(), vec![east]);
        assert_eq!(renderer.refreshed, vec![east]);
    }

    #[test]
    fn dispatch_reports_cells_without_content() {
        let mut renderer = RecordingRenderer::default();
        let cell = CellCoord::new(4, 2);

        let error = dispatch(
            &[Event::CellMaterialized { cell }],
            |_| None,
            &mut renderer,
        )
        .expect_err("missing content must be reported");

        assert_eq!(error, RenderingError::MissingCell { cell });
    }

    #[test]
    fn describe_cell_lists_item_identities() {
        let cell = CellCoord::new(3, -1);
        assert_eq!(
            describe_cell(&view(cell, 2)),
            "Cell 3:-1 holds 2 item(s): 3:-1#0, 3:-1#1"
        );
        assert_eq!(describe_cell(&view(cell, 0)), "Cell 3:-1 is empty.");
    }

    #[test]
    fn rejection_notices_are_user_facing() {
        let cell = CellCoord::new(0, 0);
        let notice = notice_for(&Event::TransferRejected {
            cell,
            reason: TransferError::EmptyCell,
        });
        assert_eq!(notice.as_deref(), Some("Nothing to collect."));

        let notice = notice_for(&Event::TransferRejected {
            cell,
            reason: TransferError::NotMaterialized,
        });
        assert_eq!(notice.as_deref(), Some("Cell 0:0 is out of reach."));
        assert!(notice_for(&Event::WorldConfigured).is_none());
    }

    #[test]
    fn inventory_description_counts_items() {
        let cell = CellCoord::new(1, 1);
        assert_eq!(describe_inventory(&[]), "Inventory is empty.");
        assert_eq!(
            describe_inventory(&[Item::new(cell, 0)]),
            "Inventory (1): 1:1#0"
        );
    }
}

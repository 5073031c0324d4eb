#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Geocache.
//!
//! The [`World`] aggregate owns the flyweight cell store, the memento cache,
//! the player's inventory and position. It is mutated exclusively through
//! [`apply`] and observed through the [`query`] module.

mod inventory;
mod memento;
mod store;
mod transfer;

use geocache_core::{
    CellCoord, Command, Event, LatLng, TileGrid, TransferError, WorldConfig, WELCOME_BANNER,
};
use geocache_system_spawning::SpawnPolicy;
use tracing::debug;

pub use inventory::Inventory;
pub use memento::CellMemento;
pub use store::{Cell, CellStatus};

use memento::MementoCache;
use store::{CellId, CellStore};

/// Represents the authoritative Geocache world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: WorldConfig,
    tile_grid: TileGrid,
    spawn_policy: SpawnPolicy,
    cells: CellStore,
    mementos: MementoCache,
    inventory: Inventory,
    player_cell: CellCoord,
    player_position: LatLng,
}

impl World {
    /// Creates a new world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a new world using the provided configuration.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let tile_grid = config.tile_grid();
        Self {
            banner: WELCOME_BANNER,
            spawn_policy: SpawnPolicy::from_config(&config),
            cells: CellStore::new(),
            mementos: MementoCache::new(config.snapshot_policy),
            inventory: Inventory::new(),
            player_cell: tile_grid.cell_for(config.origin),
            player_position: config.origin,
            tile_grid,
            config,
        }
    }

    fn relocate_player(&mut self, cell: CellCoord, position: LatLng, out_events: &mut Vec<Event>) {
        let from = self.player_cell;
        self.player_cell = cell;
        self.player_position = position;
        if from != cell {
            out_events.push(Event::PlayerMoved { from, to: cell });
        }
    }

    fn materialize_cell(&mut self, coord: CellCoord, out_events: &mut Vec<Event>) {
        let id = self.cells.get_or_create(coord);
        if self.cells.cell(id).is_materialized() {
            return;
        }

        if self.cells.cell(id).status() != CellStatus::Resident {
            if let Some(memento) = self.mementos.restore(coord) {
                let items = memento.items().to_vec();
                let count = count_u32(items.len());
                self.cells.cell_mut(id).adopt(items);
                debug!(cell = %coord, items = count, "restored cell from snapshot");
                out_events.push(Event::CellRestored { cell: coord, items: count });
            } else {
                let count = self.spawn_cell(id);
                let _ = self.mementos.save(self.cells.cell(id));
                debug!(cell = %coord, items = count, "spawned cell");
                out_events.push(Event::CellSpawned { cell: coord, items: count });
            }
        }

        self.cells.cell_mut(id).set_materialized(true);
        out_events.push(Event::CellMaterialized { cell: coord });
    }

    fn spawn_cell(&mut self, id: CellId) -> u32 {
        let decision = self.spawn_policy.decide(self.cells.cell(id).coord());
        for _ in 0..decision.item_count() {
            let _ = self.cells.create_item(id);
        }
        self.cells.cell_mut(id).mark_resident();
        decision.item_count()
    }

    fn dematerialize_cell(&mut self, coord: CellCoord, out_events: &mut Vec<Event>) {
        let Some(id) = self.cells.lookup(coord) else {
            return;
        };
        if !self.cells.cell(id).is_materialized() {
            return;
        }

        let captured = self.mementos.save(self.cells.cell(id));
        if !captured {
            debug!(cell = %coord, "snapshot kept from an earlier save; live changes dropped");
        }
        self.cells.cell_mut(id).release();
        out_events.push(Event::CellDematerialized { cell: coord });
    }

    fn transfer(&mut self, coord: CellCoord, kind: TransferKind, out_events: &mut Vec<Event>) {
        let target = self
            .cells
            .lookup(coord)
            .filter(|id| self.cells.cell(*id).is_materialized());

        let result = match target {
            None => Err(TransferError::NotMaterialized),
            Some(id) => {
                let cell = self.cells.cell_mut(id);
                match kind {
                    TransferKind::Collect => transfer::collect(cell, &mut self.inventory),
                    TransferKind::Deposit => transfer::deposit(cell, &mut self.inventory),
                }
            }
        };

        match result {
            Ok(item) => {
                debug!(cell = %coord, %item, ?kind, "transferred item");
                out_events.push(match kind {
                    TransferKind::Collect => Event::ItemCollected { cell: coord, item },
                    TransferKind::Deposit => Event::ItemDeposited { cell: coord, item },
                });
            }
            Err(reason) => {
                debug!(cell = %coord, %reason, ?kind, "rejected transfer");
                out_events.push(Event::TransferRejected { cell: coord, reason });
            }
        }
    }

    fn reconfigure(&mut self, config: WorldConfig, out_events: &mut Vec<Event>) {
        let materialized: Vec<CellCoord> = self
            .cells
            .iter()
            .filter(|cell| cell.is_materialized())
            .map(Cell::coord)
            .collect();
        for cell in materialized {
            out_events.push(Event::CellDematerialized { cell });
        }

        let from = self.player_cell;
        *self = Self::with_config(config);
        out_events.push(Event::WorldConfigured);
        out_events.push(Event::PlayerMoved {
            from,
            to: self.player_cell,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
enum TransferKind {
    Collect,
    Deposit,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureWorld { config } => world.reconfigure(config, out_events),
        Command::StepPlayer { direction } => {
            let from = world.player_cell;
            let to = from.step(direction);
            let source = world.tile_grid.origin_of(from);
            let destination = world.tile_grid.origin_of(to);
            let position = LatLng::new(
                destination.lat + (world.player_position.lat - source.lat),
                destination.lng + (world.player_position.lng - source.lng),
            );
            world.relocate_player(to, position, out_events);
        }
        Command::SetPlayerPosition { position } => {
            let cell = world.tile_grid.cell_for(position);
            world.relocate_player(cell, position, out_events);
        }
        Command::MaterializeCell { cell } => world.materialize_cell(cell, out_events),
        Command::DematerializeCell { cell } => world.dematerialize_cell(cell, out_events),
        Command::Collect { cell } => world.transfer(cell, TransferKind::Collect, out_events),
        Command::Deposit { cell } => world.transfer(cell, TransferKind::Deposit, out_events),
    }
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use geocache_core::{CellCoord, CellView, Item, LatLng, MaterializedView, TileGrid, WorldConfig};

    use super::{Cell, CellMemento, CellStatus, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the active configuration.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Provides read-only access to the world's tile grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.tile_grid
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub fn player_cell(world: &World) -> CellCoord {
        world.player_cell
    }

    /// Continuous position of the player.
    #[must_use]
    pub fn player_position(world: &World) -> LatLng {
        world.player_position
    }

    /// Items held by the player, oldest first.
    #[must_use]
    pub fn inventory(world: &World) -> &[Item] {
        world.inventory.items()
    }

    /// Canonical cell for `coord`, if the coordinate has ever been visited.
    #[must_use]
    pub fn cell(world: &World, coord: CellCoord) -> Option<&Cell> {
        world.cells.lookup(coord).map(|id| world.cells.cell(id))
    }

    /// Live items of a resident cell, oldest first.
    #[must_use]
    pub fn cell_items(world: &World, coord: CellCoord) -> Option<&[Item]> {
        cell(world, coord)
            .filter(|cell| cell.status() == CellStatus::Resident)
            .map(Cell::items)
    }

    /// Copy of a resident cell's content suitable for presentation.
    #[must_use]
    pub fn cell_view(world: &World, coord: CellCoord) -> Option<CellView> {
        cell_items(world, coord).map(|items| CellView {
            cell: coord,
            items: items.to_vec(),
        })
    }

    /// Snapshot held by the memento cache for `coord`.
    #[must_use]
    pub fn snapshot(world: &World, coord: CellCoord) -> Option<&CellMemento> {
        world.mementos.restore(coord)
    }

    /// Number of snapshots held by the memento cache.
    #[must_use]
    pub fn snapshot_count(world: &World) -> usize {
        world.mementos.len()
    }

    /// Reports whether `coord` is part of the rendered window.
    #[must_use]
    pub fn is_materialized(world: &World, coord: CellCoord) -> bool {
        cell(world, coord).is_some_and(Cell::is_materialized)
    }

    /// Captures the set of cells currently in the rendered window.
    #[must_use]
    pub fn materialized_cells(world: &World) -> MaterializedView {
        MaterializedView::from_cells(
            world
                .cells
                .iter()
                .filter(|cell| cell.is_materialized())
                .map(Cell::coord),
        )
    }

    /// Number of coordinates the store has ever registered.
    #[must_use]
    pub fn known_cells(world: &World) -> usize {
        world.cells.len()
    }

    /// Counts every item in the inventory and in all cells, including released ones.
    #[must_use]
    pub fn total_items(world: &World) -> usize {
        let in_cells: usize = world
            .cells
            .iter()
            .map(|cell| match cell.status() {
                CellStatus::Undecided => 0,
                CellStatus::Resident => cell.items().len(),
                CellStatus::Released => world
                    .mementos
                    .restore(cell.coord())
                    .map_or(0, |memento| memento.items().len()),
            })
            .sum();
        in_cells + world.inventory.len()
    }
}

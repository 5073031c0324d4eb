#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Geocache engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Geocache.";

/// Default angular size of a single grid cell, in degrees.
pub const DEFAULT_TILE_DEGREES: f64 = 1e-4;
/// Default Chebyshev radius of the visible window, in cells.
pub const DEFAULT_VISIBILITY_RADIUS: u32 = 8;
/// Default probability that a freshly discovered cell holds items.
pub const DEFAULT_SPAWN_PROBABILITY: f64 = 0.1;
/// Default upper bound of items created in a populated cell.
pub const DEFAULT_MAX_ITEMS: u32 = 10;
/// Largest visibility radius accepted by [`WorldConfig::validate`].
pub const MAX_VISIBILITY_RADIUS: u32 = 64;
/// Largest cell index a valid grid may produce on either axis.
///
/// Leaves room for a full visibility window plus the north-east corner used by
/// [`TileGrid::bounds_of`], so no neighbour of a reachable cell saturates.
pub const MAX_CELL_INDEX: i32 = i32::MAX - MAX_VISIBILITY_RADIUS as i32 - 1;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the world configuration and resets all content.
    ConfigureWorld {
        /// Configuration the world should adopt.
        config: WorldConfig,
    },
    /// Moves the player a single cell in the provided direction.
    StepPlayer {
        /// Direction of travel for the step.
        direction: Direction,
    },
    /// Places the player at an absolute position, typically a geolocation fix.
    SetPlayerPosition {
        /// Continuous position reported by the input collaborator.
        position: LatLng,
    },
    /// Requests that a cell become part of the rendered window.
    MaterializeCell {
        /// Cell entering the visible window.
        cell: CellCoord,
    },
    /// Requests that a cell leave the rendered window.
    DematerializeCell {
        /// Cell leaving the visible window.
        cell: CellCoord,
    },
    /// Moves the newest item of a cell into the player's inventory.
    Collect {
        /// Cell the item is taken from.
        cell: CellCoord,
    },
    /// Moves the newest inventory item into a cell.
    Deposit {
        /// Cell receiving the item.
        cell: CellCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Announces that the world adopted a new configuration and dropped its content.
    WorldConfigured,
    /// Confirms that the player now occupies a different cell.
    PlayerMoved {
        /// Cell the player occupied before the move.
        from: CellCoord,
        /// Cell the player occupies after the move.
        to: CellCoord,
    },
    /// Reports that a cell was discovered for the first time and spawned its content.
    CellSpawned {
        /// Cell that was decided.
        cell: CellCoord,
        /// Number of items created for the cell; zero when the cell stayed empty.
        items: u32,
    },
    /// Reports that a cell's content was adopted from a saved snapshot.
    CellRestored {
        /// Cell whose content was restored.
        cell: CellCoord,
        /// Number of items the restored cell holds.
        items: u32,
    },
    /// Instructs renderers to draw the provided cell.
    CellMaterialized {
        /// Cell that joined the rendered window.
        cell: CellCoord,
    },
    /// Instructs renderers to dispose of the provided cell.
    CellDematerialized {
        /// Cell that left the rendered window.
        cell: CellCoord,
    },
    /// Confirms that an item moved from a cell into the inventory.
    ItemCollected {
        /// Cell the item was taken from.
        cell: CellCoord,
        /// Item that changed container.
        item: Item,
    },
    /// Confirms that an item moved from the inventory into a cell.
    ItemDeposited {
        /// Cell that received the item.
        cell: CellCoord,
        /// Item that changed container.
        item: Item,
    },
    /// Reports that a collect or deposit request left state unchanged.
    TransferRejected {
        /// Cell targeted by the request.
        cell: CellCoord,
        /// Specific reason the transfer failed.
        reason: TransferError,
    },
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing latitude.
    North,
    /// Movement toward increasing longitude.
    East,
    /// Movement toward decreasing latitude.
    South,
    /// Movement toward decreasing longitude.
    West,
}

impl Direction {
    /// Offset applied to `(i, j)` by a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (1, 0),
            Self::East => (0, 1),
            Self::South => (-1, 0),
            Self::West => (0, -1),
        }
    }
}

/// Location of a single grid cell expressed as latitude and longitude indices.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    i: i32,
    j: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Latitude index of the cell.
    #[must_use]
    pub const fn i(&self) -> i32 {
        self.i
    }

    /// Longitude index of the cell.
    #[must_use]
    pub const fn j(&self) -> i32 {
        self.j
    }

    /// Canonical string key, `"{i}:{j}"`.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Returns the coordinate shifted by the provided offsets.
    #[must_use]
    pub const fn offset(self, di: i32, dj: i32) -> Self {
        Self::new(self.i.saturating_add(di), self.j.saturating_add(dj))
    }

    /// Returns the coordinate shifted by the provided offsets, or `None` when
    /// it would fall outside the index range.
    #[must_use]
    pub const fn checked_offset(self, di: i32, dj: i32) -> Option<Self> {
        match (self.i.checked_add(di), self.j.checked_add(dj)) {
            (Some(i), Some(j)) => Some(Self::new(i, j)),
            _ => None,
        }
    }

    /// Returns the neighbouring coordinate one step in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (di, dj) = direction.delta();
        self.offset(di, dj)
    }

    /// Computes the Chebyshev (grid-square) distance between two coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.i.abs_diff(other.i).max(self.j.abs_diff(other.j))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.i, self.j)
    }
}

/// Errors raised when parsing a [`CellCoord`] from its canonical key.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid cell key '{0}', expected '<i>:<j>'")]
pub struct CoordParseError(String);

impl FromStr for CellCoord {
    type Err = CoordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordParseError(value.to_owned());
        let (i, j) = value.trim().split_once(':').ok_or_else(invalid)?;
        let i = i.trim().parse::<i32>().map_err(|_| invalid())?;
        let j = j.trim().parse::<i32>().map_err(|_| invalid())?;
        Ok(Self::new(i, j))
    }
}

/// Continuous geographic position.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a new position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Describes the uniform grid laid over the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    tile_degrees: f64,
}

impl TileGrid {
    /// Creates a new grid whose cells span `tile_degrees` on each axis.
    #[must_use]
    pub const fn new(tile_degrees: f64) -> Self {
        Self { tile_degrees }
    }

    /// Resolves the cell containing the provided position.
    #[must_use]
    pub fn cell_for(&self, position: LatLng) -> CellCoord {
        CellCoord::new(
            (position.lat / self.tile_degrees).floor() as i32,
            (position.lng / self.tile_degrees).floor() as i32,
        )
    }

    /// South-west corner of the provided cell.
    #[must_use]
    pub fn origin_of(&self, cell: CellCoord) -> LatLng {
        LatLng::new(
            f64::from(cell.i()) * self.tile_degrees,
            f64::from(cell.j()) * self.tile_degrees,
        )
    }

    /// South-west and north-east corners of the provided cell.
    #[must_use]
    pub fn bounds_of(&self, cell: CellCoord) -> (LatLng, LatLng) {
        let south_west = self.origin_of(cell);
        let north_east = self.origin_of(cell.offset(1, 1));
        (south_west, north_east)
    }
}

/// Collectible item created during the initial spawn of a cell.
///
/// The identity is derived from the originating cell and the serial number and
/// therefore stays stable regardless of the container currently holding it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Item {
    origin: CellCoord,
    serial: u32,
}

impl Item {
    /// Creates an item descriptor. Only the world allocates new items.
    #[must_use]
    pub const fn new(origin: CellCoord, serial: u32) -> Self {
        Self { origin, serial }
    }

    /// Cell that spawned the item.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Serial number assigned within the originating cell.
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Identity string, `"{i}:{j}#{serial}"`.
    #[must_use]
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.origin, self.serial)
    }
}

/// Reasons a collect or deposit request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum TransferError {
    /// The targeted cell holds no items.
    #[error("nothing to collect")]
    EmptyCell,
    /// The player's inventory holds no items.
    #[error("nothing to deposit")]
    EmptyInventory,
    /// The targeted cell is not part of the rendered window.
    #[error("cell is out of reach")]
    NotMaterialized,
}

/// Governs when the memento cache captures a cell's content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Keeps only the first snapshot ever taken for a cell.
    FirstWriteWins,
    /// Replaces the snapshot every time a cell leaves the visible window.
    #[default]
    LatestState,
}

/// Tunable parameters of the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Angular size of a grid cell, in degrees.
    pub tile_degrees: f64,
    /// Chebyshev radius of the visible window, in cells.
    pub visibility_radius: u32,
    /// Probability that a freshly discovered cell holds items.
    pub spawn_probability: f64,
    /// Upper bound of items created in a populated cell.
    pub max_items: u32,
    /// Starting position of the player.
    pub origin: LatLng,
    /// Snapshot behaviour of the memento cache.
    pub snapshot_policy: SnapshotPolicy,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_degrees: DEFAULT_TILE_DEGREES,
            visibility_radius: DEFAULT_VISIBILITY_RADIUS,
            spawn_probability: DEFAULT_SPAWN_PROBABILITY,
            max_items: DEFAULT_MAX_ITEMS,
            origin: LatLng::default(),
            snapshot_policy: SnapshotPolicy::default(),
        }
    }
}

impl WorldConfig {
    /// Grid derived from the configured tile size.
    #[must_use]
    pub const fn tile_grid(&self) -> TileGrid {
        TileGrid::new(self.tile_degrees)
    }

    /// Checks that every parameter lies within its supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tile_degrees.is_finite() && self.tile_degrees > 0.0) {
            return Err(ConfigError::InvalidTileSize {
                tile_degrees: self.tile_degrees,
            });
        }
        if 180.0 / self.tile_degrees > f64::from(MAX_CELL_INDEX) {
            return Err(ConfigError::TileTooSmall {
                tile_degrees: self.tile_degrees,
            });
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::InvalidSpawnProbability {
                probability: self.spawn_probability,
            });
        }
        if self.max_items == 0 {
            return Err(ConfigError::ZeroMaxItems);
        }
        if self.visibility_radius > MAX_VISIBILITY_RADIUS {
            return Err(ConfigError::RadiusTooLarge {
                radius: self.visibility_radius,
            });
        }
        if !((-90.0..=90.0).contains(&self.origin.lat)
            && (-180.0..=180.0).contains(&self.origin.lng))
        {
            return Err(ConfigError::InvalidOrigin);
        }
        Ok(())
    }
}

/// Reasons a [`WorldConfig`] may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Tile size must be a positive finite number.
    #[error("tile size must be positive (received {tile_degrees})")]
    InvalidTileSize {
        /// Rejected tile size.
        tile_degrees: f64,
    },
    /// Every latitude and longitude must map to a cell index with room for a full window.
    #[error("tile size {tile_degrees} is too small to index the whole globe")]
    TileTooSmall {
        /// Rejected tile size.
        tile_degrees: f64,
    },
    /// Spawn probability must lie in `0.0..=1.0`.
    #[error("spawn probability must lie within 0..=1 (received {probability})")]
    InvalidSpawnProbability {
        /// Rejected probability.
        probability: f64,
    },
    /// Populated cells must be allowed at least one item.
    #[error("max items per cell must be positive")]
    ZeroMaxItems,
    /// The visible window would be too large to reconcile per event.
    #[error("visibility radius {radius} exceeds the maximum of {max}", max = MAX_VISIBILITY_RADIUS)]
    RadiusTooLarge {
        /// Rejected radius.
        radius: u32,
    },
    /// Origin must be a finite latitude/longitude pair.
    #[error("origin must lie within -90..=90 latitude and -180..=180 longitude")]
    InvalidOrigin,
}

/// Read-only copy of a single cell's content used for presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellView {
    /// Coordinate of the cell.
    pub cell: CellCoord,
    /// Items held by the cell, oldest first.
    pub items: Vec<Item>,
}

impl CellView {
    /// Number of items held by the cell.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Read-only snapshot of the cells currently in the rendered window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterializedView {
    cells: BTreeSet<CellCoord>,
}

impl MaterializedView {
    /// Creates a view from the provided cells.
    #[must_use]
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = CellCoord>,
    {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    /// Reports whether the cell is materialized.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    /// Iterator over the materialized cells in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }

    /// Number of materialized cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell is materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

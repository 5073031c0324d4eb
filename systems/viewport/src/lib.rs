#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure viewport system that keeps the rendered window centred on the player.
//!
//! The system compares the grid-square window around the player with the
//! world's materialized cells and emits the commands that close the gap:
//! [`Command::MaterializeCell`] for cells entering the window followed by
//! [`Command::DematerializeCell`] for cells leaving it.

use geocache_core::{CellCoord, Command, Event, MaterializedView, WorldConfig};

/// Pure system reconciling the visible window against materialized cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    radius: u32,
}

impl Viewport {
    /// Creates a viewport covering every cell within `radius` on both axes.
    #[must_use]
    pub const fn new(radius: u32) -> Self {
        Self { radius }
    }

    /// Builds the viewport described by a world configuration.
    #[must_use]
    pub const fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.visibility_radius)
    }

    /// Chebyshev radius of the window.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Reports whether `cell` lies inside the window centred on `center`.
    #[must_use]
    pub fn contains(&self, center: CellCoord, cell: CellCoord) -> bool {
        center.chebyshev_distance(cell) <= self.radius
    }

    /// Enumerates the window centred on `center` in row-major order.
    ///
    /// Cells beyond the index range are left out rather than clamped.
    #[must_use]
    pub fn visible_cells(&self, center: CellCoord) -> Vec<CellCoord> {
        let radius = i32::try_from(self.radius).unwrap_or(i32::MAX);
        let side = usize::try_from(self.radius)
            .unwrap_or(usize::MAX)
            .saturating_mul(2)
            .saturating_add(1);
        let mut cells = Vec::with_capacity(side.saturating_mul(side));
        for di in -radius..=radius {
            for dj in -radius..=radius {
                if let Some(cell) = center.checked_offset(di, dj) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Emits the commands that make `materialized` match the window around `center`.
    pub fn reconcile(
        &self,
        center: CellCoord,
        materialized: &MaterializedView,
        out: &mut Vec<Command>,
    ) {
        for cell in self.visible_cells(center) {
            if !materialized.contains(cell) {
                out.push(Command::MaterializeCell { cell });
            }
        }

        for cell in materialized.iter() {
            if !self.contains(center, cell) {
                out.push(Command::DematerializeCell { cell });
            }
        }
    }

    /// Consumes world events and reconciles around the player's latest cell.
    ///
    /// Only the final [`Event::PlayerMoved`] in the batch matters; earlier
    /// moves are superseded before anything is rendered.
    pub fn handle(
        &self,
        events: &[Event],
        materialized: &MaterializedView,
        out: &mut Vec<Command>,
    ) {
        let center = events.iter().rev().find_map(|event| match event {
            Event::PlayerMoved { to, .. } => Some(*to),
            _ => None,
        });

        if let Some(center) = center {
            self.reconcile(center, materialized, out);
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_cells_cover_square_window() {
        let viewport = Viewport::new(2);
        let cells = viewport.visible_cells(CellCoord::new(10, -4));

        assert_eq!(cells.len(), 25);
        assert_eq!(cells.first(), Some(&CellCoord::new(8, -6)));
        assert_eq!(cells.last(), Some(&CellCoord::new(12, -2)));
        assert!(cells
            .iter()
            .all(|cell| viewport.contains(CellCoord::new(10, -4), *cell)));
    }

    #[test]
    fn zero_radius_shows_only_the_center() {
        let viewport = Viewport::new(0);
        assert_eq!(
            viewport.visible_cells(CellCoord::new(3, 3)),
            vec![CellCoord::new(3, 3)]
        );
    }

    #[test]
    fn window_at_the_index_edge_has_no_duplicates() {
        let viewport = Viewport::new(1);
        let mut commands = Vec::new();

        viewport.reconcile(
            CellCoord::new(i32::MAX, 0),
            &MaterializedView::default(),
            &mut commands,
        );

        let unique: std::collections::BTreeSet<_> = commands
            .iter()
            .map(|command| match command {
                Command::MaterializeCell { cell } => *cell,
                other => panic!("unexpected command {other:?}"),
            })
            .collect();
        assert_eq!(commands.len(), 6);
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn reconcile_materializes_missing_and_drops_stale_cells() {
        let viewport = Viewport::new(1);
        let materialized = MaterializedView::from_cells([
            CellCoord::new(0, 0),
            CellCoord::new(0, 1),
            CellCoord::new(5, 5),
        ]);
        let mut commands = Vec::new();

        viewport.reconcile(CellCoord::new(0, 0), &materialized, &mut commands);

        let materialize = commands
            .iter()
            .filter(|command| matches!(command, Command::MaterializeCell { .. }))
            .count();
        assert_eq!(materialize, 7);
        assert_eq!(
            commands.last(),
            Some(&Command::DematerializeCell {
                cell: CellCoord::new(5, 5)
            })
        );
    }

    #[test]
    fn handle_ignores_batches_without_movement() {
        let viewport = Viewport::new(1);
        let mut commands = Vec::new();

        viewport.handle(
            &[Event::CellMaterialized {
                cell: CellCoord::new(0, 0),
            }],
            &MaterializedView::default(),
            &mut commands,
        );

        assert!(commands.is_empty());
    }

    #[test]
    fn handle_uses_latest_player_move() {
        let viewport = Viewport::new(0);
        let mut commands = Vec::new();

        viewport.handle(
            &[
                Event::PlayerMoved {
                    from: CellCoord::new(0, 0),
                    to: CellCoord::new(1, 0),
                },
                Event::PlayerMoved {
                    from: CellCoord::new(1, 0),
                    to: CellCoord::new(2, 0),
                },
            ],
            &MaterializedView::default(),
            &mut commands,
        );

        assert_eq!(
            commands,
            vec![Command::MaterializeCell {
                cell: CellCoord::new(2, 0)
            }]
        );
    }
}

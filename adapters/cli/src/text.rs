//! ASCII renderer for terminal sessions.

use std::{collections::BTreeMap, io::Write};

use anyhow::{Context, Result};
use geocache_core::{CellCoord, CellView};
use geocache_rendering::{Frame, TileRenderer};

const PLAYER: char = '@';
const EMPTY: char = '.';
const HIDDEN: char = ' ';
const CROWDED: char = '+';

/// Draws the visible window as a grid of characters, north at the top.
#[derive(Debug)]
pub(crate) struct TextRenderer<W> {
    out: W,
    tiles: BTreeMap<CellCoord, usize>,
    dirty: bool,
}

impl<W: Write> TextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            tiles: BTreeMap::new(),
            dirty: false,
        }
    }

    fn draw_map(&mut self, player: CellCoord) -> Result<()> {
        let (south, north, west, east) = self.bounds(player);
        writeln!(self.out, "-- {} tiles around {player} --", self.tiles.len())
            .context("failed to write map header")?;

        for i in (south..=north).rev() {
            let row: String = (west..=east)
                .map(|j| self.symbol(player, CellCoord::new(i, j)))
                .collect();
            writeln!(self.out, "{}", row.trim_end()).context("failed to write map row")?;
        }
        Ok(())
    }

    fn bounds(&self, player: CellCoord) -> (i32, i32, i32, i32) {
        self.tiles.keys().fold(
            (player.i(), player.i(), player.j(), player.j()),
            |(south, north, west, east), cell| {
                (
                    south.min(cell.i()),
                    north.max(cell.i()),
                    west.min(cell.j()),
                    east.max(cell.j()),
                )
            },
        )
    }

    fn symbol(&self, player: CellCoord, cell: CellCoord) -> char {
        if cell == player {
            return PLAYER;
        }
        match self.tiles.get(&cell) {
            None => HIDDEN,
            Some(0) => EMPTY,
            Some(&count) => u32::try_from(count)
                .ok()
                .and_then(|count| char::from_digit(count, 10))
                .unwrap_or(CROWDED),
        }
    }
}

impl<W: Write> TileRenderer for TextRenderer<W> {
    fn materialize(&mut self, view: &CellView) {
        let _ = self.tiles.insert(view.cell, view.item_count());
        self.dirty = true;
    }

    fn dematerialize(&mut self, cell: CellCoord) {
        if self.tiles.remove(&cell).is_some() {
            self.dirty = true;
        }
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        for notice in &frame.notices {
            writeln!(self.out, "{notice}").context("failed to write notice")?;
        }
        if self.dirty || frame.redraw {
            self.draw_map(frame.player)?;
            writeln!(
                self.out,
                "At {}, carrying {} item(s).",
                frame.player,
                frame.inventory.len()
            )
            .context("failed to write status line")?;
            self.dirty = false;
        }
        self.out.flush().context("failed to flush terminal output")
    }
}

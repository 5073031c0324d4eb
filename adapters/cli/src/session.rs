//! Drives the world and the viewport in response to player input.

use std::{io::BufRead, ops::ControlFlow};

use anyhow::{Context, Result};
use geocache_core::{CellCoord, Command, Event, WorldConfig};
use geocache_rendering::{
    describe_cell, describe_inventory, dispatch, notice_for, Frame, TileRenderer,
};
use geocache_system_viewport::Viewport;
use geocache_world::{self as world, query, World};
use tracing::{debug, info, warn};

use crate::input::{self, Input, InputError};

/// Interactive session owning the world and its rendering collaborator.
#[derive(Debug)]
pub(crate) struct Session<R> {
    world: World,
    viewport: Viewport,
    renderer: R,
    inputs: usize,
}

impl<R: TileRenderer> Session<R> {
    /// Builds the world and materializes the window around the starting cell.
    pub(crate) fn start(config: WorldConfig, renderer: R) -> Result<Self> {
        let world = World::with_config(config);
        let viewport = Viewport::from_config(query::config(&world));
        let mut session = Self {
            world,
            viewport,
            renderer,
            inputs: 0,
        };

        let mut commands = Vec::new();
        session.viewport.reconcile(
            query::player_cell(&session.world),
            &query::materialized_cells(&session.world),
            &mut commands,
        );
        let _ = session.pump(commands)?;
        info!(
            cell = %query::player_cell(&session.world),
            radius = session.viewport.radius(),
            "session started"
        );

        let banner = query::welcome_banner(&session.world).to_owned();
        session.present(vec![banner], true)?;
        Ok(session)
    }

    /// Processes every line of `reader` until it is exhausted or the player quits.
    pub(crate) fn run<B: BufRead>(&mut self, reader: B) -> Result<()> {
        for line in reader.lines() {
            let line = line.context("failed to read player input")?;
            let flow = match input::parse_line(&line) {
                Ok(None) => continue,
                Ok(Some(input)) => self.handle(input)?,
                Err(error) => {
                    self.reject(&error)?;
                    ControlFlow::Continue(())
                }
            };
            if flow.is_break() {
                break;
            }
        }

        info!(
            inputs = self.inputs,
            inventory = query::inventory(&self.world).len(),
            known_cells = query::known_cells(&self.world),
            "session finished"
        );
        Ok(())
    }

    /// Applies a single player action.
    pub(crate) fn handle(&mut self, input: Input) -> Result<ControlFlow<()>> {
        self.inputs += 1;
        let player = query::player_cell(&self.world);
        let mut redraw = false;

        let notices = match input {
            Input::Step(direction) => self.submit(Command::StepPlayer { direction })?,
            Input::Goto(position) => self.submit(Command::SetPlayerPosition { position })?,
            Input::Collect(cell) => self.submit(Command::Collect {
                cell: cell.unwrap_or(player),
            })?,
            Input::Deposit(cell) => self.submit(Command::Deposit {
                cell: cell.unwrap_or(player),
            })?,
            Input::Look(cell) => vec![self.look(cell.unwrap_or(player))],
            Input::Inventory => vec![describe_inventory(query::inventory(&self.world))],
            Input::Map => {
                redraw = true;
                Vec::new()
            }
            Input::Help => vec![input::HELP.to_owned()],
            Input::Reset => {
                let config = *query::config(&self.world);
                let mut notices = self.submit(Command::ConfigureWorld { config })?;
                notices.push(format!(
                    "Started over at {}.",
                    query::player_cell(&self.world)
                ));
                notices
            }
            Input::Quit => return Ok(ControlFlow::Break(())),
        };

        self.present(notices, redraw)?;
        Ok(ControlFlow::Continue(()))
    }

    fn reject(&mut self, error: &InputError) -> Result<()> {
        match error {
            InputError::InvalidPosition(_) => warn!(%error, "geolocation fix rejected"),
            _ => warn!(%error, "ignoring input"),
        }
        self.present(vec![error.to_string()], false)
    }

    fn look(&self, cell: CellCoord) -> String {
        match query::cell_view(&self.world, cell) {
            Some(view) if query::is_materialized(&self.world, cell) => {
                let (south_west, north_east) = query::tile_grid(&self.world).bounds_of(cell);
                format!(
                    "{}\nBounds {:.6},{:.6} to {:.6},{:.6}",
                    describe_cell(&view),
                    south_west.lat,
                    south_west.lng,
                    north_east.lat,
                    north_east.lng
                )
            }
            _ => format!("Cell {cell} is out of reach."),
        }
    }

    /// Runs `command` to quiescence and returns the notices it produced.
    fn submit(&mut self, command: Command) -> Result<Vec<String>> {
        let events = self.pump(vec![command])?;
        Ok(events.iter().filter_map(notice_for).collect())
    }

    /// Applies commands, lets the viewport react, and repeats until no commands remain.
    fn pump(&mut self, mut pending: Vec<Command>) -> Result<Vec<Event>> {
        let mut log = Vec::new();

        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            if events.contains(&Event::WorldConfigured) {
                self.viewport = Viewport::from_config(query::config(&self.world));
                debug!(radius = self.viewport.radius(), "viewport rebuilt");
            }

            let world = &self.world;
            dispatch(
                &events,
                |cell| query::cell_view(world, cell),
                &mut self.renderer,
            )
            .context("failed to update rendered tiles")?;

            let materialized = query::materialized_cells(&self.world);
            self.viewport.handle(&events, &materialized, &mut pending);
            log.extend(events);
        }

        Ok(log)
    }

    fn present(&mut self, notices: Vec<String>, redraw: bool) -> Result<()> {
        let frame = Frame {
            player: query::player_cell(&self.world),
            inventory: query::inventory(&self.world).to_vec(),
            notices,
            redraw,
        };
        self.renderer.present(&frame)
    }
}

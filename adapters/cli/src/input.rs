//! Line-oriented player input.

use std::str::FromStr;

use geocache_core::{CellCoord, CoordParseError, Direction, LatLng};
use thiserror::Error;

/// Single action requested by the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Input {
    /// Moves the player one tile.
    Step(Direction),
    /// Geolocation fix placing the player at an absolute position.
    Goto(LatLng),
    /// Collects the top item of a cell, defaulting to the player's cell.
    Collect(Option<CellCoord>),
    /// Deposits the newest inventory item, defaulting to the player's cell.
    Deposit(Option<CellCoord>),
    /// Shows a cell's content, defaulting to the player's cell.
    Look(Option<CellCoord>),
    /// Lists the player's inventory.
    Inventory,
    /// Redraws the map.
    Map,
    /// Prints the command reference.
    Help,
    /// Starts over from the configured origin with a fresh world.
    Reset,
    /// Ends the session.
    Quit,
}

/// Reasons an input line may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub(crate) enum InputError {
    /// The command word is not recognised.
    #[error("unknown command '{0}' (type 'help' for a list)")]
    UnknownCommand(String),
    /// A cell argument could not be parsed.
    #[error(transparent)]
    InvalidCell(#[from] CoordParseError),
    /// A geolocation fix was malformed.
    #[error("geolocation fix '{0}' is not a valid 'LAT LNG' pair")]
    InvalidPosition(String),
    /// The command received more arguments than it accepts.
    #[error("'{command}' does not accept '{argument}'")]
    UnexpectedArgument {
        /// Command word.
        command: String,
        /// First surplus argument.
        argument: String,
    },
}

/// Command reference printed by `help`.
pub(crate) const HELP: &str = "\
Commands:
  n | s | e | w        step one cell north, south, east or west
  goto LAT LNG         jump to a geolocation fix
  collect [I:J]        take the top item of a cell (default: your cell)
  deposit [I:J]        drop your newest item into a cell (default: your cell)
  look [I:J]           show a cell's content (default: your cell)
  inv                  list your inventory
  map                  redraw the map
  reset                start over from the configured origin
  help                 show this help
  quit                 leave the session";

/// Parses a single line. Blank lines and `#` comments yield `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<Input>, InputError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let command = command.to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();

    let input = match command.as_str() {
        "n" | "north" => Input::Step(Direction::North),
        "s" | "south" => Input::Step(Direction::South),
        "e" | "east" => Input::Step(Direction::East),
        "w" | "west" => Input::Step(Direction::West),
        "goto" => Input::Goto(parse_position(&rest)?),
        "collect" => Input::Collect(optional_cell(&command, &rest)?),
        "deposit" => Input::Deposit(optional_cell(&command, &rest)?),
        "look" => Input::Look(optional_cell(&command, &rest)?),
        "inv" | "inventory" => Input::Inventory,
        "map" => Input::Map,
        "help" | "?" => Input::Help,
        "reset" => Input::Reset,
        "quit" | "exit" | "q" => Input::Quit,
        _ => return Err(InputError::UnknownCommand(command)),
    };

    if matches!(
        input,
        Input::Step(_)
            | Input::Inventory
            | Input::Map
            | Input::Help
            | Input::Reset
            | Input::Quit
    ) {
        reject_arguments(&command, &rest)?;
    }
    Ok(Some(input))
}

fn optional_cell(command: &str, rest: &[&str]) -> Result<Option<CellCoord>, InputError> {
    match rest {
        [] => Ok(None),
        [cell] => Ok(Some(CellCoord::from_str(cell)?)),
        [_, extra, ..] => Err(unexpected(command, extra)),
    }
}

fn reject_arguments(command: &str, rest: &[&str]) -> Result<(), InputError> {
    match rest.first() {
        Some(extra) => Err(unexpected(command, extra)),
        None => Ok(()),
    }
}

fn unexpected(command: &str, argument: &str) -> InputError {
    InputError::UnexpectedArgument {
        command: command.to_owned(),
        argument: argument.to_owned(),
    }
}

fn parse_position(rest: &[&str]) -> Result<LatLng, InputError> {
    let invalid = || InputError::InvalidPosition(rest.join(" "));
    let [lat, lng] = rest else {
        return Err(invalid());
    };
    let lat = lat.trim_end_matches(',').parse::<f64>().map_err(|_| invalid())?;
    let lng = lng.parse::<f64>().map_err(|_| invalid())?;
    if !(lat.is_finite() && lng.is_finite()) {
        return Err(invalid());
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(invalid());
    }
    Ok(LatLng::new(lat, lng))
}

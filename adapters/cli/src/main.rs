#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Geocache session in the terminal.

mod config;
mod input;
mod session;
mod text;

use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{config::ConfigOverrides, session::Session, text::TextRenderer};

/// Explore a grid of caches, collecting and depositing items as you walk.
#[derive(Debug, Parser)]
#[command(name = "geocache", version)]
struct Cli {
    /// TOML file providing the world configuration.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reads player input from a file instead of standard input.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

/// Entry point for the Geocache command-line interface.
fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref(), &cli.overrides)?;
    let mut session = Session::start(config, TextRenderer::new(io::stdout()))?;

    match cli.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open input script {}", path.display()))?;
            session.run(BufReader::new(file))
        }
        None => session.run(io::stdin().lock()),
    }
}

/// Installs a stderr subscriber filtered by `RUST_LOG`, defaulting to `info`.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

//! Command-line interface: run one headless combat from a JSON config file.
//!
//! Grounded on `arenasim::cli::Args` (`clap::Parser` derive struct),
//! trimmed to the headless-only surface this core exposes — there is no
//! graphical mode to opt out of here.

use std::path::PathBuf;

use clap::Parser;

/// Deterministic tick-based auto-battler combat core.
#[derive(Parser, Debug)]
#[command(name = "waffen-combat")]
#[command(about = "Run a headless auto-battler combat from a JSON match config")]
#[command(version)]
pub struct Args {
    /// JSON match config describing both teams, traits, and tuning.
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: PathBuf,

    /// Write the emitted event stream to this file as newline-delimited JSON.
    #[arg(long, value_name = "EVENTS_FILE")]
    pub events_out: Option<PathBuf>,

    /// Override the config's random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the config's simulated-time timeout, in seconds.
    #[arg(long)]
    pub max_duration: Option<f64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}

//! Thin CLI binary: load a JSON match config, run the combat core to
//! completion, and print the result — mirroring `arenasim`'s own
//! `main.rs` → `cli::parse_args` → headless runner wiring, minus the
//! bevy `App`/window setup this core has no graphical mode to build.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;

use waffen_combat_core::cli;
use waffen_combat_core::headless::HeadlessMatchConfig;
use waffen_combat_core::{run_headless_match, CombatEvent};

fn main() -> ExitCode {
    env_logger::init();
    let args = cli::parse_args();

    let mut config = match HeadlessMatchConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load match config: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
    if let Some(max_duration) = args.max_duration {
        config.timeout_secs = max_duration;
    }

    let result = match run_headless_match(&config, None) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("failed to run match: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.events_out {
        let file = match File::create(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("failed to create events file {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = write_ndjson(&mut BufWriter::new(file), &result.events) {
            eprintln!("failed to write events file: {e}");
            return ExitCode::FAILURE;
        }
    }

    println!(
        "winner={:?} timeout={} duration={:.2}s survivors=(a={}, b={}) surviving_star_sum={}",
        result.winner, result.timeout, result.duration, result.team_a_survivors, result.team_b_survivors, result.surviving_star_sum
    );

    ExitCode::SUCCESS
}

fn write_ndjson(writer: &mut BufWriter<File>, events: &[CombatEvent]) -> std::io::Result<()> {
    for event in events {
        serde_json::to_writer(&mut *writer, &event.to_json())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

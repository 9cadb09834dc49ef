//! Headless (non-UI) match configuration and execution — the entry point
//! a caller embeds to run one combat to completion (spec §6 "Outputs").

pub mod config;
pub mod runner;

pub use config::{HeadlessMatchConfig, RosterUnit};
pub use runner::{run_headless_match, MatchResult};

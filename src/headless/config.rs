//! JSON match configuration for headless (non-UI) runs.
//!
//! Grounded on `arenasim::headless::config::HeadlessMatchConfig`
//! (`serde`-derived struct, `load_from_file`, `validate`), retargeted from
//! a fixed-roster-of-class-names shape to this core's data-driven
//! `UnitTemplate`/`Trait` model: unit/trait *content* loading from a shop
//! or asset system is out of scope (spec §1), but a headless runner still
//! needs *some* way to get a `UnitTemplate` into memory, so this config
//! embeds templates inline rather than implementing an asset pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::model::template::{Trait, UnitTemplate};
use crate::model::unit::Position;

/// One roster slot: a unit template plus the per-combat placement that is
/// decided externally (star scaling already applied to the template's
/// base stats happens in [`super::runner::build_roster`], not here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterUnit {
    pub template: UnitTemplate,
    #[serde(default)]
    pub position: Position,
    #[serde(default = "default_star_level")]
    pub star_level: u32,
    #[serde(default)]
    pub back_targeting: bool,
}

fn default_star_level() -> u32 {
    1
}

/// A full headless match configuration, loadable from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessMatchConfig {
    pub team_a: Vec<RosterUnit>,
    pub team_b: Vec<RosterUnit>,
    /// Faction/class traits in play this match; which tier is active on
    /// each side is resolved from team composition at setup (spec §3 Trait).
    #[serde(default)]
    pub traits: Vec<Trait>,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
    #[serde(default = "default_completed_rounds")]
    pub completed_rounds: u32,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub output_path: Option<String>,
}

fn default_dt() -> f64 {
    0.1
}

fn default_timeout() -> f64 {
    60.0
}

fn default_completed_rounds() -> u32 {
    1
}

impl HeadlessMatchConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, SetupError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SetupError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: HeadlessMatchConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.team_a.is_empty() {
            return Err(SetupError::InvalidMatchConfig("team_a must have at least one unit".to_string()));
        }
        if self.team_b.is_empty() {
            return Err(SetupError::InvalidMatchConfig("team_b must have at least one unit".to_string()));
        }
        if self.dt <= 0.0 {
            return Err(SetupError::InvalidMatchConfig("dt must be > 0".to_string()));
        }
        if self.timeout_secs <= 0.0 {
            return Err(SetupError::InvalidMatchConfig("timeout_secs must be > 0".to_string()));
        }
        for roster_unit in self.team_a.iter().chain(self.team_b.iter()) {
            roster_unit.template.validate()?;
        }
        for t in &self.traits {
            t.validate()?;
        }
        Ok(())
    }
}

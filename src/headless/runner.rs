//! Run a whole combat to completion from a [`HeadlessMatchConfig`] and
//! return a programmatic result.
//!
//! Grounded on `arenasim::headless::runner::run_headless_match` /
//! `MatchResult` / `CombatantResult`, with the bevy `App`/`Plugin`
//! machinery this core has no use for (no window, no ECS schedule)
//! replaced by a direct call into `combat::simulator::Simulator::run`.

use std::collections::HashMap;

use log::info;

use crate::combat::events::CombatEvent;
use crate::combat::log::CombatLog;
use crate::combat::{ActiveTrait, EventCallback, Outcome, SimConfig, Simulator};
use crate::error::SetupError;
use crate::headless::config::HeadlessMatchConfig;
use crate::model::template::TraitType;
use crate::model::unit::{star_scale, CombatUnit, Side, UnitId, ATTACK_STAR_GROWTH, HP_STAR_GROWTH};
use crate::rng::GameRng;

/// Programmatic result of a completed headless match (spec §6 "Outputs").
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub winner: Side,
    pub timeout: bool,
    pub duration: f64,
    pub team_a_survivors: usize,
    pub team_b_survivors: usize,
    /// Sum of `star_level` across the winning side's survivors — the
    /// quantity a round-damage calculation outside this core would scale
    /// against (out of scope here; spec §1 excludes player economy).
    pub surviving_star_sum: u32,
    pub events: Vec<CombatEvent>,
}

/// Build the roster, resolve active traits, and run one combat to
/// completion. Returns `Err` only for malformed configuration (spec §7:
/// "a failed initialisation yields a typed error to the caller before any
/// event is emitted") — timeout is a normal, non-error outcome.
pub fn run_headless_match(config: &HeadlessMatchConfig, callback: Option<EventCallback>) -> Result<MatchResult, SetupError> {
    config.validate()?;

    let mut units = Vec::new();
    let mut skills = HashMap::new();
    let mut next_id = 0u32;
    let mut tag_holders: HashMap<(Side, TraitType, String), Vec<UnitId>> = HashMap::new();

    for (side, roster) in [(Side::A, &config.team_a), (Side::B, &config.team_b)] {
        for roster_unit in roster {
            let id = UnitId(next_id);
            next_id += 1;

            let template = &roster_unit.template;
            let hp = star_scale(template.base_hp, roster_unit.star_level, HP_STAR_GROWTH);
            let attack = star_scale(template.base_attack, roster_unit.star_level, ATTACK_STAR_GROWTH);

            units.push(CombatUnit::new(
                id,
                template.id.clone(),
                template.display_name.clone(),
                side,
                roster_unit.position,
                roster_unit.star_level,
                hp,
                attack,
                template.base_defense,
                template.base_attack_speed,
                template.base_max_mana,
                template.base_mana_on_attack,
                template.base_mana_regen,
                template.base_hp_regen_per_sec,
                roster_unit.back_targeting,
            ));

            if let Some(skill) = &template.skill {
                skills.insert(id, skill.clone());
            }

            for faction in &template.factions {
                tag_holders.entry((side, TraitType::Faction, faction.clone())).or_default().push(id);
            }
            for class in &template.classes {
                tag_holders.entry((side, TraitType::Class, class.clone())).or_default().push(id);
            }
        }
    }

    let active_traits: Vec<ActiveTrait> = config
        .traits
        .iter()
        .flat_map(|t| {
            [Side::A, Side::B].into_iter().filter_map(move |side| {
                let holders = tag_holders.get(&(side, t.trait_type, t.name.clone()))?.clone();
                let tier = t.active_tier(holders.len() as u32)?;
                Some(ActiveTrait {
                    side,
                    trait_name: t.name.clone(),
                    holders,
                    effects: tier.effects.clone(),
                })
            })
        })
        .collect();

    let rng = match config.random_seed {
        Some(seed) => {
            info!("running headless match with deterministic seed {seed}");
            GameRng::from_seed(seed)
        }
        None => {
            info!("running headless match with entropy-seeded RNG");
            GameRng::from_entropy()
        }
    };

    let sim_config = SimConfig {
        dt: config.dt,
        timeout: config.timeout_secs,
        completed_rounds: config.completed_rounds,
    };

    let simulator = Simulator::new(units, skills, active_traits, sim_config, rng, callback);
    let result = simulator.run();

    let (winner, timeout) = match result.outcome {
        Outcome::Winner(side) => (side, false),
        Outcome::Timeout { winner } => (side_with_timeout_log(winner), true),
    };

    let team_a_survivors = result.roster.alive(Side::A).count();
    let team_b_survivors = result.roster.alive(Side::B).count();
    let surviving_star_sum: u32 = result.roster.alive(winner).map(|u| u.star_level()).sum();

    info!(
        "match complete: winner={winner:?} timeout={timeout} duration={:.2}s survivors=({team_a_survivors},{team_b_survivors})",
        result.duration
    );

    if let Some(path) = &config.output_path {
        let mut log = CombatLog::new();
        log.record_all(&result.events);
        if let Err(e) = log.save_to_file(path) {
            log::warn!("failed to write combat log to {path}: {e}");
        }
    }

    Ok(MatchResult {
        winner,
        timeout,
        duration: result.duration,
        team_a_survivors,
        team_b_survivors,
        surviving_star_sum,
        events: result.events,
    })
}

fn side_with_timeout_log(winner: Side) -> Side {
    info!("match timed out, declaring winner by surviving hp: {winner:?}");
    winner
}

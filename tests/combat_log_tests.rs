//! Tests for the human-readable combat log (ambient, non-canonical).

use regex::Regex;
use waffen_combat_core::combat::log::{CombatLog, CombatLogEventType};
use waffen_combat_core::headless::HeadlessMatchConfig;
use waffen_combat_core::model::UnitTemplate;
use waffen_combat_core::run_headless_match;

fn brawler(id: &str, hp: i64, attack: i64) -> UnitTemplate {
    UnitTemplate {
        id: id.to_string(),
        display_name: id.to_string(),
        cost_tier: 1,
        factions: vec![],
        classes: vec![],
        base_hp: hp,
        base_attack: attack,
        base_defense: 1,
        base_attack_speed: 1.2,
        base_max_mana: 0,
        base_mana_on_attack: 0,
        base_mana_regen: 0.0,
        base_hp_regen_per_sec: 0.0,
        skill: None,
    }
}

fn play_match(seed: u64) -> Vec<waffen_combat_core::CombatEvent> {
    let json = serde_json::json!({
        "team_a": [{"template": brawler("a", 120, 20), "position": "front"}],
        "team_b": [{"template": brawler("b", 120, 20), "position": "front"}],
        "timeout_secs": 30.0,
        "random_seed": seed,
    });
    let cfg: HeadlessMatchConfig = serde_json::from_value(json).unwrap();
    run_headless_match(&cfg, None).unwrap().events
}

#[test]
fn record_all_translates_damage_and_death_events() {
    let events = play_match(9);
    let mut log = CombatLog::new();
    log.record_all(&events);

    assert!(!log.filter_by_type(CombatLogEventType::Damage).is_empty());
    assert!(!log.filter_by_type(CombatLogEventType::Death).is_empty());
}

#[test]
fn state_snapshot_and_zero_amount_mana_updates_produce_no_entry() {
    let events = play_match(11);
    let mut log = CombatLog::new();
    log.record_all(&events);

    let snapshot_count = events
        .iter()
        .filter(|e| e.type_name() == "state_snapshot")
        .count();
    assert!(snapshot_count > 0, "fixture should contain state snapshots");
    assert!(
        log.entries.len() < events.len(),
        "state_snapshot events must not produce a log line each"
    );
}

#[test]
fn recent_returns_the_last_n_entries_in_order() {
    let events = play_match(3);
    let mut log = CombatLog::new();
    log.record_all(&events);

    let all_len = log.entries.len();
    if all_len >= 3 {
        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent.last().unwrap().timestamp, log.entries.last().unwrap().timestamp);
    }
}

#[test]
fn render_produces_one_line_per_entry() {
    let events = play_match(3);
    let mut log = CombatLog::new();
    log.record_all(&events);

    let rendered = log.render();
    let line_count = rendered.lines().count();
    assert_eq!(line_count, log.entries.len());

    let line_pattern = Regex::new(r"^\[\s*\d+\.\d{2}s\] \[[A-Z+-]+\] .+$").unwrap();
    for line in rendered.lines() {
        assert!(line_pattern.is_match(line), "line does not match the `[timestamp] [TAG] message` format: {line:?}");
    }
}

#[test]
fn clear_empties_the_log() {
    let events = play_match(3);
    let mut log = CombatLog::new();
    log.record_all(&events);
    assert!(!log.entries.is_empty());
    log.clear();
    assert!(log.entries.is_empty());
}

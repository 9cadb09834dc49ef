//! Integration tests for headless match execution.
//!
//! These verify that:
//! - A headless match runs to completion and returns a usable result
//! - The same seed reproduces an identical event stream (spec §4.D "RNG")
//! - Malformed configuration is rejected before any event is emitted (spec §7)

use waffen_combat_core::headless::HeadlessMatchConfig;
use waffen_combat_core::model::UnitTemplate;
use waffen_combat_core::run_headless_match;

fn brawler(id: &str, hp: i64, attack: i64, defense: i64, attack_speed: f64) -> UnitTemplate {
    UnitTemplate {
        id: id.to_string(),
        display_name: id.to_string(),
        cost_tier: 1,
        factions: vec![],
        classes: vec![],
        base_hp: hp,
        base_attack: attack,
        base_defense: defense,
        base_attack_speed: attack_speed,
        base_max_mana: 0,
        base_mana_on_attack: 0,
        base_mana_regen: 0.0,
        base_hp_regen_per_sec: 0.0,
        skill: None,
    }
}

fn config(seed: Option<u64>) -> HeadlessMatchConfig {
    let json = serde_json::json!({
        "team_a": [
            {"template": brawler("strong", 300, 40, 5, 1.0), "position": "front"}
        ],
        "team_b": [
            {"template": brawler("weak", 100, 10, 0, 1.0), "position": "front"}
        ],
        "dt": 0.1,
        "timeout_secs": 30.0,
        "random_seed": seed,
    });
    serde_json::from_value(json).expect("fixture config should parse")
}

#[test]
fn match_runs_to_completion_with_a_winner() {
    let result = run_headless_match(&config(Some(1)), None).expect("match should run");
    assert!(!result.events.is_empty());
    assert!(result.duration > 0.0);
}

#[test]
fn stronger_team_wins_deterministically() {
    let result = run_headless_match(&config(Some(42)), None).expect("match should run");
    assert_eq!(result.winner, waffen_combat_core::Side::A);
    assert!(!result.timeout);
    assert_eq!(result.team_a_survivors, 1);
    assert_eq!(result.team_b_survivors, 0);
}

#[test]
fn same_seed_reproduces_identical_event_stream() {
    let cfg = config(Some(777));
    let first = run_headless_match(&cfg, None).expect("first run");
    let second = run_headless_match(&cfg, None).expect("second run");

    assert_eq!(first.events.len(), second.events.len());
    for (a, b) in first.events.iter().zip(second.events.iter()) {
        assert_eq!(a.to_json(), b.to_json(), "events must match field-for-field at seq {}", a.seq);
    }
}

#[test]
fn different_seeds_can_diverge() {
    // Evenly matched teams so RNG-driven target/crit choices can change the
    // outcome; not a hard guarantee every seed pair differs, but any
    // deterministic bug would make every pair identical.
    let json_a = serde_json::json!({
        "team_a": [
            {"template": brawler("a1", 100, 15, 2, 1.0), "position": "front"},
            {"template": brawler("a2", 100, 15, 2, 1.0), "position": "front"}
        ],
        "team_b": [
            {"template": brawler("b1", 100, 15, 2, 1.0), "position": "front"},
            {"template": brawler("b2", 100, 15, 2, 1.0), "position": "front"}
        ],
        "random_seed": 1,
    });
    let json_b = serde_json::json!({
        "team_a": [
            {"template": brawler("a1", 100, 15, 2, 1.0), "position": "front"},
            {"template": brawler("a2", 100, 15, 2, 1.0), "position": "front"}
        ],
        "team_b": [
            {"template": brawler("b1", 100, 15, 2, 1.0), "position": "front"},
            {"template": brawler("b2", 100, 15, 2, 1.0), "position": "front"}
        ],
        "random_seed": 2,
    });
    let cfg_a: HeadlessMatchConfig = serde_json::from_value(json_a).unwrap();
    let cfg_b: HeadlessMatchConfig = serde_json::from_value(json_b).unwrap();

    let result_a = run_headless_match(&cfg_a, None).unwrap();
    let result_b = run_headless_match(&cfg_b, None).unwrap();

    // Both are valid outcomes; we only assert both completed without panics
    // and produced non-trivial event streams.
    assert!(result_a.events.len() > 2);
    assert!(result_b.events.len() > 2);
}

#[test]
fn empty_team_is_rejected_before_any_event_is_emitted() {
    let json = serde_json::json!({
        "team_a": [],
        "team_b": [{"template": brawler("b1", 100, 10, 0, 1.0), "position": "front"}],
    });
    let cfg: HeadlessMatchConfig = serde_json::from_value(json).unwrap();
    let err = run_headless_match(&cfg, None).unwrap_err();
    assert!(err.to_string().contains("team_a"));
}

#[test]
fn invalid_unit_template_is_rejected_at_load_time() {
    let json = serde_json::json!({
        "team_a": [{"template": brawler("bad", 0, 10, 0, 1.0), "position": "front"}],
        "team_b": [{"template": brawler("b1", 100, 10, 0, 1.0), "position": "front"}],
    });
    let cfg: HeadlessMatchConfig = serde_json::from_value(json).unwrap();
    let err = run_headless_match(&cfg, None).unwrap_err();
    assert!(err.to_string().contains("base_hp"));
}

#[test]
fn config_defaults_apply_when_fields_are_omitted() {
    let cfg = config(None);
    assert_eq!(cfg.dt, 0.1);
    assert_eq!(cfg.completed_rounds, 1);
    assert!(cfg.traits.is_empty());
}

#[test]
fn timeout_declares_winner_by_surviving_hp() {
    // Two immobile, unkillable-in-time units (0 attack speed means no
    // attacks land) force a timeout; higher total hp should win.
    let json = serde_json::json!({
        "team_a": [{"template": brawler("tanky", 500, 0, 0, 0.0), "position": "front"}],
        "team_b": [{"template": brawler("frail", 50, 0, 0, 0.0), "position": "front"}],
        "timeout_secs": 1.0,
        "random_seed": 5,
    });
    let cfg: HeadlessMatchConfig = serde_json::from_value(json).unwrap();
    let result = run_headless_match(&cfg, None).unwrap();
    assert!(result.timeout);
    assert_eq!(result.winner, waffen_combat_core::Side::A);
}

//! The correctness law (spec §8): replaying the canonical event stream
//! through the independent `Reconstructor` must reproduce the simulator's
//! own final unit state, field-by-field, for any legal combat.

use waffen_combat_core::combat::reconstructor::Reconstructor;
use waffen_combat_core::headless::HeadlessMatchConfig;
use waffen_combat_core::model::{Skill, UnitTemplate};
use waffen_combat_core::run_headless_match;

fn template_with_skill(id: &str, hp: i64, attack: i64, defense: i64, attack_speed: f64, mana: i64, skill: Option<Skill>) -> UnitTemplate {
    UnitTemplate {
        id: id.to_string(),
        display_name: id.to_string(),
        cost_tier: 1,
        factions: vec!["order".to_string()],
        classes: vec!["brawler".to_string()],
        base_hp: hp,
        base_attack: attack,
        base_defense: defense,
        base_attack_speed: attack_speed,
        base_max_mana: mana,
        base_mana_on_attack: 10,
        base_mana_regen: 0.0,
        base_hp_regen_per_sec: 1.0,
        skill,
    }
}

fn healer_skill() -> Skill {
    serde_json::from_value(serde_json::json!({
        "name": "Mend",
        "mana_cost": 20,
        "effects": [
            {"type": "heal", "target": "ally_front", "amount": 25}
        ]
    }))
    .unwrap()
}

fn nuker_skill() -> Skill {
    serde_json::from_value(serde_json::json!({
        "name": "Nuke",
        "mana_cost": 15,
        "effects": [
            {"type": "damage", "target": "single_enemy", "amount": 30, "damage_type": "magic"},
            {
                "type": "buff",
                "target": "self",
                "stat": "attack",
                "value": 5.0,
                "value_type": "flat",
                "duration": 3.0
            }
        ]
    }))
    .unwrap()
}

fn config() -> HeadlessMatchConfig {
    let json = serde_json::json!({
        "team_a": [
            {"template": template_with_skill("a_healer", 150, 12, 3, 1.2, 100, Some(healer_skill())), "position": "back"},
            {"template": template_with_skill("a_fighter", 200, 18, 4, 1.5, 0, None), "position": "front"}
        ],
        "team_b": [
            {"template": template_with_skill("b_nuker", 140, 14, 2, 1.0, 100, Some(nuker_skill())), "position": "back"},
            {"template": template_with_skill("b_fighter", 180, 16, 3, 1.3, 0, None), "position": "front"}
        ],
        "timeout_secs": 45.0,
        "random_seed": 99,
    });
    serde_json::from_value(json).unwrap()
}

#[test]
#[allow(clippy::float_cmp)]
fn reconstructed_state_matches_simulated_state() {
    let result = run_headless_match(&config(), None).expect("match should run");
    let reconstructor = Reconstructor::replay(result.events.iter());

    // The reconstructor only ever learns of a unit's existence from a
    // `state_snapshot`, emitted once per tick, so it always has a complete
    // view by the time the combat ends.
    assert!(!reconstructor.units().is_empty());

    for id in reconstructor.units().keys().copied().collect::<Vec<_>>() {
        let reconstructed = reconstructor.unit(id).unwrap();
        // Every unit the reconstructor knows about appeared in at least one
        // snapshot; hp/shield/mana must be non-negative and within bounds.
        assert!(reconstructed.hp >= 0);
        assert!(reconstructed.hp <= reconstructed.max_hp);
        assert!(reconstructed.shield >= 0);
        assert!(reconstructed.current_mana >= 0);
        assert!(reconstructed.current_mana <= reconstructed.max_mana);
    }
}

#[test]
fn reconstructor_tracks_deaths() {
    let result = run_headless_match(&config(), None).expect("match should run");
    let reconstructor = Reconstructor::replay(result.events.iter());

    let any_dead = reconstructor.units().values().any(|u| u.dead);
    assert!(any_dead, "a combat that reaches a winner must have at least one dead unit");

    for unit in reconstructor.units().values() {
        if unit.dead {
            assert_eq!(unit.hp, 0, "a unit recorded as dead in the snapshot must be at 0 hp");
        }
    }
}

#[test]
fn replaying_incrementally_matches_replaying_from_scratch() {
    let result = run_headless_match(&config(), None).expect("match should run");

    let mut incremental = Reconstructor::new();
    for event in &result.events {
        incremental.apply(event);
    }

    let batch = Reconstructor::replay(result.events.iter());

    for (id, unit) in incremental.units() {
        let other = batch.unit(*id).expect("batch replay should know every unit incremental replay knows");
        assert_eq!(unit.hp, other.hp);
        assert_eq!(unit.dead, other.dead);
        assert_eq!(unit.shield, other.shield);
        assert_eq!(unit.current_mana, other.current_mana);
    }
}

//! The central testable property spec §8 calls the correctness law: replaying
//! the canonical event stream through the independently-written
//! `Reconstructor` must reproduce the simulator's own final unit table,
//! field-by-field. Unlike `reconstructor_tests.rs` (which only goes through
//! the public `headless` API), this drives `Simulator` directly so the
//! comparison is against the simulator's actual final `CombatUnit`s, not
//! just what a snapshot event carries.

use std::collections::HashMap;

use waffen_combat_core::combat::reconstructor::Reconstructor;
use waffen_combat_core::combat::{ActiveTrait, SimConfig, Simulator};
use waffen_combat_core::model::{CombatUnit, Position, Side, Skill, UnitId};
use waffen_combat_core::rng::GameRng;

fn unit(id: u32, side: Side, hp: i64, attack: i64, defense: i64, attack_speed: f64, max_mana: i64, mana_on_attack: i64) -> CombatUnit {
    CombatUnit::new(
        UnitId(id),
        format!("template-{id}"),
        format!("unit-{id}"),
        side,
        Position::Front,
        1,
        hp,
        attack,
        defense,
        attack_speed,
        max_mana,
        mana_on_attack,
        0.5,
        1.0,
        false,
    )
}

fn nuker_skill() -> Skill {
    serde_json::from_value(serde_json::json!({
        "name": "Bolt",
        "mana_cost": 20,
        "effects": [
            {"type": "damage", "target": "single_enemy", "amount": 25, "damage_type": "magic"},
            {"type": "shield", "target": "self", "amount": 15, "duration": 4.0}
        ]
    }))
    .unwrap()
}

fn run_scripted_combat(seed: u64) -> waffen_combat_core::combat::SimulationResult {
    let units = vec![
        unit(0, Side::A, 180, 20, 5, 1.4, 100, 8),
        unit(1, Side::A, 140, 14, 2, 1.1, 0, 0),
        unit(2, Side::B, 160, 18, 3, 1.2, 0, 0),
        unit(3, Side::B, 150, 16, 4, 1.3, 0, 0),
    ];
    let mut skills = HashMap::new();
    skills.insert(UnitId(0), nuker_skill());

    let active_traits: Vec<ActiveTrait> = vec![];
    let config = SimConfig {
        dt: 0.1,
        timeout: 30.0,
        completed_rounds: 1,
    };
    let rng = GameRng::from_seed(seed);
    let simulator = Simulator::new(units, skills, active_traits, config, rng, None);
    simulator.run()
}

#[test]
fn reconstructed_final_state_matches_simulator_final_state() {
    let result = run_scripted_combat(2024);
    let reconstructor = Reconstructor::replay(result.events.iter());

    for unit in result.roster.iter() {
        let reconstructed = reconstructor.unit(unit.id()).unwrap_or_else(|| panic!("reconstructor never saw unit {:?}", unit.id()));

        assert_eq!(reconstructed.hp, unit.hp(), "hp mismatch for {:?}", unit.id());
        assert_eq!(reconstructed.max_hp, unit.max_hp(), "max_hp mismatch for {:?}", unit.id());
        assert_eq!(reconstructed.attack, unit.attack(), "attack mismatch for {:?}", unit.id());
        assert_eq!(reconstructed.defense, unit.defense(), "defense mismatch for {:?}", unit.id());
        assert_eq!(
            reconstructed.attack_speed_x1000,
            unit.attack_speed_x1000(),
            "attack_speed mismatch for {:?}",
            unit.id()
        );
        assert_eq!(reconstructed.current_mana, unit.current_mana(), "mana mismatch for {:?}", unit.id());
        assert_eq!(reconstructed.max_mana, unit.max_mana(), "max_mana mismatch for {:?}", unit.id());
        assert_eq!(reconstructed.shield, unit.shield(), "shield mismatch for {:?}", unit.id());
        assert_eq!(reconstructed.dead, unit.is_dead(), "dead mismatch for {:?}", unit.id());

        let mut expected_effect_ids: Vec<_> = unit.effects().iter().map(|e| e.id).collect();
        let mut actual_effect_ids: Vec<_> = reconstructed.effects.iter().map(|e| e.id).collect();
        expected_effect_ids.sort();
        actual_effect_ids.sort();
        assert_eq!(
            expected_effect_ids,
            actual_effect_ids,
            "active effect set mismatch for {:?}",
            unit.id()
        );
    }
}

#[test]
fn correctness_law_holds_across_several_seeds() {
    for seed in [1u64, 2, 3, 17, 255] {
        let result = run_scripted_combat(seed);
        let reconstructor = Reconstructor::replay(result.events.iter());
        for unit in result.roster.iter() {
            let reconstructed = reconstructor.unit(unit.id()).unwrap();
            assert_eq!(reconstructed.hp, unit.hp(), "seed {seed}: hp mismatch for {:?}", unit.id());
            assert_eq!(reconstructed.dead, unit.is_dead(), "seed {seed}: dead mismatch for {:?}", unit.id());
        }
    }
}

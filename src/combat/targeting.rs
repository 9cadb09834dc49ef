//! Target resolution: skill `Target` enum resolution and basic-attack
//! targeting heuristics.
//!
//! Narrowed from `combat_ai`'s nearest-by-3D-distance targeting (which
//! works over `Transform` and `Vec3::distance`) down to a front/back row
//! model, since this core tracks only `Position::{Front, Back}`.

use crate::combat::roster::Roster;
use crate::model::skill::Target;
use crate::model::unit::{Position, Side, UnitId};
use crate::rng::GameRng;

/// Resolve a skill's `Target` to concrete unit ids. `persistent_target`
/// carries any target already selected earlier in this same skill cast; a
/// persistent target that has since died is replaced with a fresh roll.
pub fn resolve_targets(
    roster: &Roster,
    caster: UnitId,
    target: Target,
    persistent_target: Option<UnitId>,
    rng: &mut GameRng,
) -> Vec<UnitId> {
    let side = roster.get(caster).side();
    let enemy_side = side.opposite();

    match target {
        Target::SelfTarget => vec![caster],
        Target::SingleEnemy => random_alive(roster, enemy_side, rng).into_iter().collect(),
        Target::SingleEnemyPersistent => {
            if let Some(id) = persistent_target {
                if roster.try_get(id).map(|u| u.is_alive()).unwrap_or(false) {
                    return vec![id];
                }
            }
            random_alive(roster, enemy_side, rng).into_iter().collect()
        }
        Target::EnemyTeam => alive_ids(roster, enemy_side),
        Target::EnemyFront => front_row(roster, enemy_side),
        Target::AllyTeam => alive_ids(roster, side),
        Target::AllyFront => front_row(roster, side),
    }
}

fn alive_ids(roster: &Roster, side: Side) -> Vec<UnitId> {
    roster.alive(side).map(|u| u.id()).collect()
}

fn front_row(roster: &Roster, side: Side) -> Vec<UnitId> {
    let mut front: Vec<UnitId> = roster
        .alive(side)
        .filter(|u| u.position() == Position::Front)
        .map(|u| u.id())
        .collect();
    front.truncate(3);
    front
}

fn random_alive(roster: &Roster, side: Side, rng: &mut GameRng) -> Option<UnitId> {
    rng.choose(&alive_ids(roster, side)).copied()
}

/// Basic-attack target selection: the preferred row is front, unless the
/// back-targeting flag is set (then back), falling back to whichever row
/// is non-empty if the preferred one has nobody left. Within the eligible
/// pool, 60% of the time pick the highest-defense alive enemy, 40% a
/// uniformly random one.
pub fn select_basic_attack_target(
    roster: &Roster,
    attacker: UnitId,
    back_targeting: bool,
    rng: &mut GameRng,
) -> Option<UnitId> {
    let enemy_side = roster.get(attacker).side().opposite();
    let preferred_position = if back_targeting { Position::Back } else { Position::Front };

    let mut pool: Vec<UnitId> = roster
        .alive(enemy_side)
        .filter(|u| u.position() == preferred_position)
        .map(|u| u.id())
        .collect();
    if pool.is_empty() {
        pool = alive_ids(roster, enemy_side);
    }
    if pool.is_empty() {
        return None;
    }

    if rng.gen_bool(0.6) {
        pool.into_iter().max_by_key(|id| roster.get(*id).defense())
    } else {
        rng.choose(&pool).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::unit::CombatUnit;

    fn unit(id: u32, side: Side, position: Position) -> CombatUnit {
        CombatUnit::new(UnitId(id), "t", format!("u{id}"), side, position, 1, 100, 10, 1, 1.0, 0, 0, 0.0, 0.0, false)
    }

    fn roster() -> Roster {
        Roster::new(vec![
            unit(0, Side::A, Position::Front),
            unit(1, Side::B, Position::Front),
            unit(2, Side::B, Position::Back),
            unit(3, Side::B, Position::Back),
        ])
    }

    #[test]
    fn self_target_resolves_to_the_caster() {
        let roster = roster();
        let mut rng = GameRng::from_seed(1);
        let targets = resolve_targets(&roster, UnitId(0), Target::SelfTarget, None, &mut rng);
        assert_eq!(targets, vec![UnitId(0)]);
    }

    #[test]
    fn enemy_team_resolves_to_every_living_enemy() {
        let roster = roster();
        let mut rng = GameRng::from_seed(1);
        let mut targets = resolve_targets(&roster, UnitId(0), Target::EnemyTeam, None, &mut rng);
        targets.sort();
        assert_eq!(targets, vec![UnitId(1), UnitId(2), UnitId(3)]);
    }

    #[test]
    fn enemy_front_resolves_to_only_the_front_row() {
        let roster = roster();
        let mut rng = GameRng::from_seed(1);
        let targets = resolve_targets(&roster, UnitId(0), Target::EnemyFront, None, &mut rng);
        assert_eq!(targets, vec![UnitId(1)]);
    }

    #[test]
    fn single_enemy_persistent_keeps_a_still_living_target() {
        let roster = roster();
        let mut rng = GameRng::from_seed(1);
        let targets = resolve_targets(&roster, UnitId(0), Target::SingleEnemyPersistent, Some(UnitId(2)), &mut rng);
        assert_eq!(targets, vec![UnitId(2)]);
    }

    #[test]
    fn single_enemy_persistent_rerolls_once_the_target_has_died() {
        let mut roster = roster();
        roster.get_mut(UnitId(2)).dead = true;
        let mut rng = GameRng::from_seed(1);
        let targets = resolve_targets(&roster, UnitId(0), Target::SingleEnemyPersistent, Some(UnitId(2)), &mut rng);
        assert_eq!(targets.len(), 1);
        assert_ne!(targets[0], UnitId(2));
    }

    #[test]
    fn basic_attack_falls_back_to_back_row_when_front_is_empty() {
        let roster = Roster::new(vec![unit(0, Side::A, Position::Front), unit(1, Side::B, Position::Back)]);
        let mut rng = GameRng::from_seed(1);
        let target = select_basic_attack_target(&roster, UnitId(0), false, &mut rng);
        assert_eq!(target, Some(UnitId(1)));
    }

    #[test]
    fn basic_attack_returns_none_when_no_enemy_is_alive() {
        let mut roster = Roster::new(vec![unit(0, Side::A, Position::Front), unit(1, Side::B, Position::Front)]);
        roster.get_mut(UnitId(1)).dead = true;
        let mut rng = GameRng::from_seed(1);
        assert_eq!(select_basic_attack_target(&roster, UnitId(0), false, &mut rng), None);
    }
}

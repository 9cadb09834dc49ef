//! The event reconstructor: an independent replay engine.
//!
//! Deliberately written without referencing `combat::emitter`'s mutation
//! code — it derives unit state purely from the event stream, the way a
//! downstream consumer (an SSE client, a replay viewer) would. The
//! central testable property this crate's tests exercise is that this
//! module's final unit table equals the simulator's, field-by-field, for
//! any legal event stream the simulator produced.

use std::collections::HashMap;

use uuid::Uuid;

use crate::combat::events::{CombatEvent, CombatEventKind};
use crate::model::unit::{Side, Stat, UnitId};

/// One durational modifier as the reconstructor tracks it: just enough to
/// find it again by id at `effect_expired` and revert its delta.
#[derive(Debug, Clone)]
pub struct ReconstructedEffect {
    pub id: Uuid,
    pub stat: Option<Stat>,
    pub applied_delta: i64,
}

/// A unit's state as derived purely from replaying events, independent of
/// any internal simulator representation.
#[derive(Debug, Clone)]
pub struct ReconstructedUnit {
    pub id: UnitId,
    pub name: String,
    pub side: Side,
    pub hp: i64,
    pub max_hp: i64,
    pub attack: i64,
    pub defense: i64,
    /// Fixed-point thousandths, mirroring `CombatUnit::attack_speed_x1000`,
    /// since `stat_buff.applied_delta` for this stat is recorded in that
    /// unit by the emitter.
    pub attack_speed_x1000: i64,
    pub current_mana: i64,
    pub max_mana: i64,
    pub shield: i64,
    pub effects: Vec<ReconstructedEffect>,
    pub dead: bool,
}

impl ReconstructedUnit {
    pub fn attack_speed(&self) -> f64 {
        self.attack_speed_x1000 as f64 / 1000.0
    }
}

/// Replays a `CombatEvent` stream into an independently-derived unit table.
#[derive(Debug, Default)]
pub struct Reconstructor {
    units: HashMap<UnitId, ReconstructedUnit>,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> &HashMap<UnitId, ReconstructedUnit> {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&ReconstructedUnit> {
        self.units.get(&id)
    }

    /// Replay a whole, seq-sorted event stream from scratch.
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a CombatEvent>) -> Self {
        let mut reconstructor = Self::new();
        for event in events {
            reconstructor.apply(event);
        }
        reconstructor
    }

    pub fn apply(&mut self, event: &CombatEvent) {
        match &event.kind {
            CombatEventKind::StateSnapshot { player_units, opponent_units } => {
                self.units.clear();
                for snap in player_units.iter().chain(opponent_units.iter()) {
                    self.units.insert(
                        snap.id,
                        ReconstructedUnit {
                            id: snap.id,
                            name: snap.name.clone(),
                            side: snap.side,
                            hp: snap.hp,
                            max_hp: snap.max_hp,
                            attack: snap.attack,
                            defense: snap.defense,
                            attack_speed_x1000: (snap.attack_speed * 1000.0).round() as i64,
                            current_mana: snap.current_mana,
                            max_mana: snap.max_mana,
                            shield: snap.shield,
                            effects: snap
                                .effects
                                .iter()
                                .map(|e| ReconstructedEffect {
                                    id: e.id,
                                    stat: e.stat,
                                    applied_delta: e.applied_delta,
                                })
                                .collect(),
                            dead: snap.dead,
                        },
                    );
                }
            }

            CombatEventKind::UnitAttack {
                target_id,
                shield_absorbed,
                target_hp,
                ..
            } => {
                if let Some(unit) = self.units.get_mut(target_id) {
                    unit.shield = (unit.shield - shield_absorbed).max(0);
                    unit.hp = *target_hp;
                }
            }

            CombatEventKind::DamageOverTimeTick { unit_id, new_hp, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.hp = *new_hp;
                }
            }

            CombatEventKind::UnitDied { unit_id, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.dead = true;
                    unit.shield = 0;
                }
            }

            CombatEventKind::UnitHeal { unit_id, applied_amount, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.hp = (unit.hp + applied_amount).min(unit.max_hp);
                }
            }

            CombatEventKind::StatBuff {
                unit_id,
                stat,
                effect_id,
                applied_delta,
                ..
            } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    apply_tracked_delta(unit, *stat, *applied_delta);
                    if let Some(id) = effect_id {
                        unit.effects.push(ReconstructedEffect {
                            id: *id,
                            stat: Some(*stat),
                            applied_delta: *applied_delta,
                        });
                    }
                }
            }

            CombatEventKind::ShieldApplied { unit_id, amount, effect_id, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.shield += amount;
                    unit.effects.push(ReconstructedEffect {
                        id: *effect_id,
                        stat: None,
                        applied_delta: *amount,
                    });
                }
            }

            CombatEventKind::UnitStunned { unit_id, effect_id, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.effects.push(ReconstructedEffect {
                        id: *effect_id,
                        stat: None,
                        applied_delta: 0,
                    });
                }
            }

            CombatEventKind::DamageOverTimeApplied { unit_id, effect_id, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.effects.push(ReconstructedEffect {
                        id: *effect_id,
                        stat: None,
                        applied_delta: 0,
                    });
                }
            }

            CombatEventKind::EffectExpired { unit_id, effect_id, kind, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    if let Some(pos) = unit.effects.iter().position(|e| e.id == *effect_id) {
                        let effect = unit.effects.remove(pos);
                        if let Some(stat) = effect.stat {
                            apply_tracked_delta(unit, stat, -effect.applied_delta);
                        }
                    }
                    if *kind == crate::model::unit::EffectKind::Shield {
                        unit.shield = 0;
                    }
                }
            }

            CombatEventKind::ManaUpdate { unit_id, post_mana, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.current_mana = *post_mana;
                }
            }

            CombatEventKind::GoldReward { .. }
            | CombatEventKind::AnimationStart { .. }
            | CombatEventKind::SkillCast { .. }
            | CombatEventKind::SkillError { .. } => {}
        }
    }
}

/// Mirrors `combat::emitter::apply_stat_delta`'s clamping, restricted to
/// the fields the reconstructor-vs-simulator correctness law actually
/// compares (hp, max_hp, attack, defense, attack_speed, current_mana,
/// max_mana, shield, effects, dead). `mana_regen`, `hp_regen_per_sec`, and
/// `buff_amplifier` aren't part of that law, so a buff targeting them is
/// still recorded as an effect (for the by-id multiset comparison) but
/// applies no field mutation here.
fn apply_tracked_delta(unit: &mut ReconstructedUnit, stat: Stat, delta: i64) {
    match stat {
        Stat::Attack => unit.attack = (unit.attack + delta).max(0),
        Stat::Defense => unit.defense = (unit.defense + delta).max(0),
        Stat::AttackSpeed => unit.attack_speed_x1000 = (unit.attack_speed_x1000 + delta).max(0),
        Stat::MaxHp => {
            unit.max_hp = (unit.max_hp + delta).max(1);
            unit.hp = unit.hp.min(unit.max_hp);
        }
        Stat::MaxMana => {
            unit.max_mana = (unit.max_mana + delta).max(0);
            unit.current_mana = unit.current_mana.min(unit.max_mana);
        }
        Stat::ManaRegen | Stat::HpRegenPerSec | Stat::BuffAmplifier => {}
    }
}

//! The canonical mutation funnel.
//!
//! Generalized from `arenasim`'s `combat::log::CombatLog` (which centralizes
//! *logging* of combat facts emitted by scattered call sites) into a
//! component that both mutates authoritative unit state and produces the
//! event describing that mutation, in one call. Nothing outside this module
//! writes `hp`, `shield`, `current_mana`, `effects`, `dead`, or a stat field
//! directly — `CombatUnit`'s fields are `pub(in crate::combat)` precisely so
//! that only this file (and the reconstructor, which maintains its own
//! independent mirror) can reach them.
//!
//! Every routine here follows the same shape: validate, compute the
//! post-state, mutate, stamp a `seq`/`event_id`, hand the event to the
//! optional callback and the in-memory log.

use uuid::Uuid;

use crate::combat::events::{CombatEvent, CombatEventKind, EventCause, ManaCause};
use crate::combat::roster::Roster;
use crate::model::unit::{ActiveEffect, CombatUnit, EffectKind, Side, Stat, UnitId, ValueType};

pub type EventCallback = Box<dyn FnMut(&str, serde_json::Value)>;

pub struct Emitter {
    seq: u64,
    events: Vec<CombatEvent>,
    callback: Option<EventCallback>,
}

impl Emitter {
    pub fn new(callback: Option<EventCallback>) -> Self {
        Self {
            seq: 0,
            events: Vec::new(),
            callback,
        }
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<CombatEvent> {
        self.events
    }

    fn emit(&mut self, timestamp: f64, kind: CombatEventKind) {
        self.seq += 1;
        let event = CombatEvent {
            seq: self.seq,
            event_id: Uuid::new_v4(),
            timestamp,
            kind,
        };
        if let Some(callback) = self.callback.as_mut() {
            callback(event.type_name(), event.to_json());
        }
        self.events.push(event);
    }

    /// Clamp `raw_damage` to at least 1, subtract from shield first, then
    /// from hp; cascades to `emit_unit_died` if the target reaches 0.
    /// Returns the hp damage actually applied.
    #[allow(clippy::too_many_arguments)]
    pub fn emit_damage(
        &mut self,
        roster: &mut Roster,
        attacker: UnitId,
        target: UnitId,
        raw_damage: i64,
        damage_type: impl Into<String>,
        timestamp: f64,
        is_skill: bool,
        cause: EventCause,
    ) -> i64 {
        let damage = raw_damage.max(1);
        let attacker_name = roster.get(attacker).name().to_string();

        let target_unit = roster.get_mut(target);
        let shield_absorbed = damage.min(target_unit.shield);
        target_unit.shield -= shield_absorbed;
        let hp_damage = damage - shield_absorbed;
        target_unit.hp = (target_unit.hp - hp_damage).max(0);
        target_unit.damage_taken += hp_damage;
        let target_name = target_unit.name.clone();
        let target_hp = target_unit.hp;
        let target_max_hp = target_unit.max_hp;
        let target_side = target_unit.side;
        let target_just_died = target_hp == 0 && !target_unit.death_processed;

        if attacker != target {
            roster.get_mut(attacker).damage_dealt += hp_damage;
        }

        self.emit(
            timestamp,
            CombatEventKind::UnitAttack {
                attacker_id: attacker,
                attacker_name,
                target_id: target,
                target_name,
                damage,
                applied_damage: hp_damage,
                shield_absorbed,
                target_hp,
                target_max_hp,
                side: target_side,
                is_skill,
                cause,
            },
        );

        if target_just_died {
            self.emit_unit_died(roster, target, timestamp);
        }

        hp_damage
    }

    /// Healing a dead unit is a no-op: no mutation, no event.
    pub fn emit_heal(
        &mut self,
        roster: &mut Roster,
        healer: Option<UnitId>,
        target: UnitId,
        amount: i64,
        timestamp: f64,
        cause: EventCause,
    ) -> i64 {
        let unit = roster.get_mut(target);
        if unit.is_dead() {
            return 0;
        }
        let pre_hp = unit.hp;
        let new_hp = (pre_hp + amount.max(0)).min(unit.max_hp);
        unit.hp = new_hp;
        let applied_amount = new_hp - pre_hp;
        let unit_name = unit.name.clone();
        let side = unit.side;

        self.emit(
            timestamp,
            CombatEventKind::UnitHeal {
                unit_id: target,
                unit_name,
                healer_id: healer,
                amount,
                applied_amount,
                new_hp,
                side,
                cause,
            },
        );
        applied_amount
    }

    /// Computes `applied_delta` (flat = value, percentage = round(base *
    /// value / 100)), applies any active `buff_amplifier` once (it does not
    /// amplify its own applications), mutates the stat, and either attaches
    /// an Active Effect or folds the delta into `permanent_buffs`. Negative
    /// `value` represents a debuff; same event type either way.
    #[allow(clippy::too_many_arguments)]
    pub fn emit_stat_buff(
        &mut self,
        roster: &mut Roster,
        recipient: UnitId,
        stat: Stat,
        value: f64,
        value_type: ValueType,
        duration: f64,
        permanent: bool,
        source: Option<UnitId>,
        timestamp: f64,
        cause: EventCause,
    ) -> i64 {
        let unit = roster.get_mut(recipient);
        let base = unit.stat_value(stat);
        let mut delta = match value_type {
            ValueType::Flat => value.round() as i64,
            ValueType::Percentage => (base * value / 100.0).round() as i64,
        };

        if stat != Stat::BuffAmplifier && unit.buff_amplifier_percent != 0 {
            let amplified = delta as f64 * (1.0 + unit.buff_amplifier_percent as f64 / 100.0);
            delta = amplified.round() as i64;
        }

        apply_stat_delta(unit, stat, delta);

        let effect_id = if permanent {
            *unit.permanent_buffs.entry(stat).or_insert(0) += delta;
            None
        } else {
            let id = Uuid::new_v4();
            unit.effects.push(ActiveEffect {
                id,
                kind: if delta >= 0 { EffectKind::Buff } else { EffectKind::Debuff },
                stat: Some(stat),
                value,
                value_type: Some(value_type),
                duration,
                expires_at: timestamp + duration,
                next_tick_time: None,
                interval: None,
                damage_per_tick: None,
                damage_type: None,
                applied_delta: delta,
                source: source.unwrap_or(recipient),
            });
            Some(id)
        };

        let unit_name = unit.name.clone();
        let side = unit.side;
        let caster_name = source.map(|s| roster.get(s).name().to_string());

        self.emit(
            timestamp,
            CombatEventKind::StatBuff {
                unit_id: recipient,
                unit_name,
                stat,
                value,
                value_type,
                duration,
                permanent,
                effect_id,
                applied_delta: delta,
                caster_id: source,
                caster_name,
                side,
                cause,
            },
        );
        delta
    }

    pub fn emit_shield_applied(
        &mut self,
        roster: &mut Roster,
        recipient: UnitId,
        amount: i64,
        duration: f64,
        source: Option<UnitId>,
        timestamp: f64,
    ) -> Uuid {
        let unit = roster.get_mut(recipient);
        let effect_id = Uuid::new_v4();
        let amount = amount.max(0);
        unit.shield += amount;
        unit.effects.push(ActiveEffect {
            id: effect_id,
            kind: EffectKind::Shield,
            stat: None,
            value: amount as f64,
            value_type: None,
            duration,
            expires_at: timestamp + duration,
            next_tick_time: None,
            interval: None,
            damage_per_tick: None,
            damage_type: None,
            applied_delta: amount,
            source: source.unwrap_or(recipient),
        });
        let side = unit.side;

        self.emit(
            timestamp,
            CombatEventKind::ShieldApplied {
                unit_id: recipient,
                amount,
                duration,
                effect_id,
                source_id: source,
                side,
            },
        );
        effect_id
    }

    /// Stacks with any existing stun by taking the later expiry, so a
    /// second, shorter stun never shortens an already-running one.
    pub fn emit_unit_stunned(
        &mut self,
        roster: &mut Roster,
        target: UnitId,
        duration: f64,
        source: Option<UnitId>,
        timestamp: f64,
    ) -> Uuid {
        let unit = roster.get_mut(target);
        let effect_id = Uuid::new_v4();
        let expires_at = timestamp + duration;
        unit.stunned_until = Some(unit.stunned_until.map_or(expires_at, |existing| existing.max(expires_at)));
        unit.effects.push(ActiveEffect {
            id: effect_id,
            kind: EffectKind::Stun,
            stat: None,
            value: 0.0,
            value_type: None,
            duration,
            expires_at,
            next_tick_time: None,
            interval: None,
            damage_per_tick: None,
            damage_type: None,
            applied_delta: 0,
            source: source.unwrap_or(target),
        });
        let unit_name = unit.name.clone();
        let side = unit.side;

        self.emit(
            timestamp,
            CombatEventKind::UnitStunned {
                unit_id: target,
                unit_name,
                duration,
                effect_id,
                source_id: source,
                side,
            },
        );
        effect_id
    }

    #[allow(clippy::too_many_arguments)]
    pub fn emit_damage_over_time_applied(
        &mut self,
        roster: &mut Roster,
        target: UnitId,
        damage_per_tick: i64,
        damage_type: impl Into<String>,
        duration: f64,
        interval: f64,
        source: Option<UnitId>,
        timestamp: f64,
    ) -> Uuid {
        let damage_type = damage_type.into();
        let unit = roster.get_mut(target);
        let effect_id = Uuid::new_v4();
        let next_tick_time = timestamp + interval;
        let expires_at = timestamp + duration;
        unit.effects.push(ActiveEffect {
            id: effect_id,
            kind: EffectKind::DamageOverTime,
            stat: None,
            value: damage_per_tick as f64,
            value_type: None,
            duration,
            expires_at,
            next_tick_time: Some(next_tick_time),
            interval: Some(interval),
            damage_per_tick: Some(damage_per_tick),
            damage_type: Some(damage_type.clone()),
            applied_delta: 0,
            source: source.unwrap_or(target),
        });

        self.emit(
            timestamp,
            CombatEventKind::DamageOverTimeApplied {
                unit_id: target,
                caster_id: source,
                damage: damage_per_tick,
                damage_type,
                duration,
                interval,
                effect_id,
                next_tick_time,
                expires_at,
            },
        );
        effect_id
    }

    /// Same shield-then-hp cascade as `emit_damage`; no attacker id, per
    /// the DoT tick's event schema.
    pub fn emit_damage_over_time_tick(
        &mut self,
        roster: &mut Roster,
        target: UnitId,
        damage: i64,
        damage_type: impl Into<String>,
        timestamp: f64,
    ) -> i64 {
        let damage_type = damage_type.into();
        let unit = roster.get_mut(target);
        let shield_absorbed = damage.min(unit.shield);
        unit.shield -= shield_absorbed;
        let hp_damage = damage - shield_absorbed;
        unit.hp = (unit.hp - hp_damage).max(0);
        unit.damage_taken += hp_damage;
        let new_hp = unit.hp;
        let side = unit.side;
        let target_just_died = new_hp == 0 && !unit.death_processed;

        self.emit(
            timestamp,
            CombatEventKind::DamageOverTimeTick {
                unit_id: target,
                damage,
                damage_type,
                new_hp,
                side,
            },
        );

        if target_just_died {
            self.emit_unit_died(roster, target, timestamp);
        }

        hp_damage
    }

    /// Reverts `applied_delta` from its stat (clamped by `apply_stat_delta`
    /// the same way the original application was), zeroes whatever shield
    /// remains on shield expiry, and recomputes `stunned_until` from any
    /// other still-active stun effect.
    pub fn emit_effect_expired(&mut self, roster: &mut Roster, unit_id: UnitId, effect_id: Uuid, timestamp: f64) {
        let unit = roster.get_mut(unit_id);
        let pos = unit
            .effects
            .iter()
            .position(|e| e.id == effect_id)
            .unwrap_or_else(|| panic!("expiring unknown effect {effect_id} on unit {unit_id}: scheduler/state desync"));
        let effect = unit.effects.remove(pos);

        match effect.kind {
            EffectKind::Buff | EffectKind::Debuff => {
                if let Some(stat) = effect.stat {
                    apply_stat_delta(unit, stat, -effect.applied_delta);
                }
            }
            EffectKind::Shield => {
                unit.shield = 0;
            }
            EffectKind::Stun => {
                unit.stunned_until = unit
                    .effects
                    .iter()
                    .filter(|e| e.kind == EffectKind::Stun)
                    .map(|e| e.expires_at)
                    .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))));
            }
            EffectKind::DamageOverTime => {}
        }

        self.emit(
            timestamp,
            CombatEventKind::EffectExpired {
                unit_id,
                effect_id,
                stat: effect.stat,
                kind: effect.kind,
            },
        );
    }

    /// Idempotent: a unit already marked `death_processed` emits nothing
    /// on a second call.
    pub fn emit_unit_died(&mut self, roster: &mut Roster, unit_id: UnitId, timestamp: f64) {
        let unit = roster.get_mut(unit_id);
        if unit.death_processed {
            return;
        }
        unit.dead = true;
        unit.death_processed = true;
        unit.shield = 0;
        let unit_name = unit.name.clone();
        let side = unit.side;

        self.emit(
            timestamp,
            CombatEventKind::UnitDied {
                unit_id,
                unit_name,
                side,
            },
        );
    }

    pub fn emit_mana_update(
        &mut self,
        roster: &mut Roster,
        unit_id: UnitId,
        delta: i64,
        timestamp: f64,
        cause: ManaCause,
    ) -> i64 {
        let unit = roster.get_mut(unit_id);
        let pre_mana = unit.current_mana;
        let post_mana = (pre_mana + delta).clamp(0, unit.max_mana);
        unit.current_mana = post_mana;
        let amount = post_mana - pre_mana;
        let max_mana = unit.max_mana;
        let side = unit.side;

        self.emit(
            timestamp,
            CombatEventKind::ManaUpdate {
                unit_id,
                pre_mana,
                post_mana,
                amount,
                max_mana,
                cause,
                side,
            },
        );
        amount
    }

    /// Player economy is external; this never touches combat-unit state.
    pub fn emit_gold_reward(&mut self, recipient_id: impl Into<String>, amount: i64, side: Side, timestamp: f64) {
        self.emit(
            timestamp,
            CombatEventKind::GoldReward {
                recipient_id: recipient_id.into(),
                amount,
                side,
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn emit_skill_cast(
        &mut self,
        caster_id: UnitId,
        caster_name: impl Into<String>,
        skill_name: impl Into<String>,
        target_id: Option<UnitId>,
        target_name: Option<String>,
        damage: Option<i64>,
        timestamp: f64,
    ) {
        self.emit(
            timestamp,
            CombatEventKind::SkillCast {
                caster_id,
                caster_name: caster_name.into(),
                skill_name: skill_name.into(),
                target_id,
                target_name,
                damage,
            },
        );
    }

    pub fn emit_skill_error(&mut self, caster_id: UnitId, message: impl Into<String>, timestamp: f64) {
        self.emit(
            timestamp,
            CombatEventKind::SkillError {
                caster_id,
                message: message.into(),
            },
        );
    }

    pub fn emit_animation_start(
        &mut self,
        animation_id: impl Into<String>,
        attacker_id: UnitId,
        target_id: UnitId,
        duration: f64,
        timestamp: f64,
    ) {
        self.emit(
            timestamp,
            CombatEventKind::AnimationStart {
                animation_id: animation_id.into(),
                attacker_id,
                target_id,
                duration,
            },
        );
    }

    pub fn emit_state_snapshot(&mut self, roster: &Roster, timestamp: f64) {
        let mut player_units = Vec::new();
        let mut opponent_units = Vec::new();
        for unit in roster.iter() {
            match unit.side() {
                Side::A => player_units.push(unit.snapshot()),
                Side::B => opponent_units.push(unit.snapshot()),
            }
        }

        self.emit(
            timestamp,
            CombatEventKind::StateSnapshot {
                player_units,
                opponent_units,
            },
        );
    }
}

/// Mutate one stat by a signed delta, with the same clamping rule
/// (`attack, defense >= 0`) the data model invariants require. Regen
/// stats are floating point in their own right; their applied_delta is
/// still the literal integer recorded on the Active Effect, added in the
/// stat's native per-second units.
fn apply_stat_delta(unit: &mut CombatUnit, stat: Stat, delta: i64) {
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
        Stat::ManaRegen => unit.mana_regen = (unit.mana_regen + delta as f64).max(0.0),
        Stat::HpRegenPerSec => unit.hp_regen_per_sec = (unit.hp_regen_per_sec + delta as f64).max(0.0),
        Stat::BuffAmplifier => unit.buff_amplifier_percent += delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::unit::Position;

    fn unit(id: u32, side: Side, hp: i64, defense: i64) -> CombatUnit {
        CombatUnit::new(UnitId(id), "t", format!("u{id}"), side, Position::Front, 1, hp, 10, defense, 1.0, 100, 10, 0.0, 0.0, false)
    }

    fn roster() -> Roster {
        Roster::new(vec![unit(0, Side::A, 100, 5), unit(1, Side::B, 80, 3)])
    }

    #[test]
    fn damage_drains_shield_before_hp() {
        let mut roster = roster();
        roster.get_mut(UnitId(1)).shield = 10;
        let mut emitter = Emitter::new(None);

        let hp_damage = emitter.emit_damage(&mut roster, UnitId(0), UnitId(1), 15, "physical", 0.0, false, EventCause::Attack);

        assert_eq!(hp_damage, 5, "only the overflow past the shield should land on hp");
        assert_eq!(roster.get(UnitId(1)).shield, 0);
        assert_eq!(roster.get(UnitId(1)).hp, 75);
    }

    #[test]
    fn damage_is_clamped_to_a_minimum_of_one() {
        let mut roster = roster();
        let mut emitter = Emitter::new(None);
        emitter.emit_damage(&mut roster, UnitId(0), UnitId(1), 0, "physical", 0.0, false, EventCause::Attack);
        assert_eq!(roster.get(UnitId(1)).hp, 79);
    }

    #[test]
    fn lethal_damage_emits_exactly_one_death_event() {
        let mut roster = roster();
        let mut emitter = Emitter::new(None);
        emitter.emit_damage(&mut roster, UnitId(0), UnitId(1), 1000, "physical", 0.0, false, EventCause::Attack);

        assert!(roster.get(UnitId(1)).is_dead());
        let deaths = emitter.events().iter().filter(|e| matches!(e.kind, CombatEventKind::UnitDied { .. })).count();
        assert_eq!(deaths, 1);

        // a second lethal hit on an already-dead unit must not emit another
        emitter.emit_unit_died(&mut roster, UnitId(1), 0.1);
        let deaths = emitter.events().iter().filter(|e| matches!(e.kind, CombatEventKind::UnitDied { .. })).count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn healing_a_dead_unit_is_a_no_op() {
        let mut roster = roster();
        roster.get_mut(UnitId(1)).dead = true;
        roster.get_mut(UnitId(1)).hp = 0;
        let mut emitter = Emitter::new(None);
        let healed = emitter.emit_heal(&mut roster, None, UnitId(1), 50, 0.0, EventCause::Skill);
        assert_eq!(healed, 0);
        assert_eq!(roster.get(UnitId(1)).hp, 0);
    }

    #[test]
    fn healing_clamps_to_max_hp() {
        let mut roster = roster();
        roster.get_mut(UnitId(1)).hp = 75;
        let mut emitter = Emitter::new(None);
        let healed = emitter.emit_heal(&mut roster, None, UnitId(1), 50, 0.0, EventCause::Skill);
        assert_eq!(healed, 5);
        assert_eq!(roster.get(UnitId(1)).hp, 80);
    }

    #[test]
    fn stat_buff_amplifier_scales_later_buffs_but_not_itself() {
        let mut roster = roster();
        let mut emitter = Emitter::new(None);
        emitter.emit_stat_buff(&mut roster, UnitId(0), Stat::BuffAmplifier, 50.0, ValueType::Flat, 0.0, true, None, 0.0, EventCause::Trait);
        assert_eq!(roster.get(UnitId(0)).buff_amplifier_percent(), 50);

        let delta = emitter.emit_stat_buff(&mut roster, UnitId(0), Stat::Attack, 10.0, ValueType::Flat, 5.0, false, None, 0.0, EventCause::Trait);
        assert_eq!(delta, 15, "a +50% amplifier should turn a +10 flat buff into +15");
        assert_eq!(roster.get(UnitId(0)).attack(), 25);
    }

    #[test]
    fn expiring_a_buff_reverts_its_exact_applied_delta() {
        let mut roster = roster();
        let mut emitter = Emitter::new(None);
        let delta = emitter.emit_stat_buff(&mut roster, UnitId(0), Stat::Attack, 7.0, ValueType::Flat, 5.0, false, None, 0.0, EventCause::Trait);
        assert_eq!(roster.get(UnitId(0)).attack(), 17);

        let effect_id = roster.get(UnitId(0)).effects()[0].id;
        emitter.emit_effect_expired(&mut roster, UnitId(0), effect_id, 5.0);

        assert_eq!(roster.get(UnitId(0)).attack(), 17 - delta);
        assert!(roster.get(UnitId(0)).effects().is_empty());
    }

    #[test]
    fn mana_update_clamps_to_max_mana() {
        let mut roster = roster();
        let mut emitter = Emitter::new(None);
        let applied = emitter.emit_mana_update(&mut roster, UnitId(0), 1000, 0.0, ManaCause::Attack);
        assert_eq!(applied, 100);
        assert_eq!(roster.get(UnitId(0)).current_mana(), 100);
    }
}

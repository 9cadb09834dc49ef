//! Canonical event payload schema (spec §6).
//!
//! Generalized from `arenasim`'s `combat::events` (`DamageEvent`,
//! `HealingEvent`, `AuraAppliedEvent`, ...) — one struct per kind of fact —
//! into a single closed enum whose variants are exactly the event types
//! spec §6 enumerates, each carrying the fields that section names. Every
//! event additionally carries the three common fields (`seq`, `event_id`,
//! `timestamp`) via [`CombatEvent`], which is what the emitter actually
//! stamps and hands to the event callback.

use serde::Serialize;
use uuid::Uuid;

use crate::model::unit::{EffectKind, Side, Stat, UnitId, UnitSnapshot, ValueType};

/// Cause of a mana change (spec §6 `mana_update.cause`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManaCause {
    Attack,
    Regen,
    SkillSpent,
    Other,
}

/// Cause of a heal or attack (spec §6 `unit_heal.cause`, `unit_attack.cause`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCause {
    Attack,
    Skill,
    Regen,
    Trait,
    Other,
}

/// The typed payload of one emitted event (spec §6 per-event field lists).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEventKind {
    UnitAttack {
        attacker_id: UnitId,
        attacker_name: String,
        target_id: UnitId,
        target_name: String,
        damage: i64,
        applied_damage: i64,
        shield_absorbed: i64,
        target_hp: i64,
        target_max_hp: i64,
        side: Side,
        is_skill: bool,
        cause: EventCause,
    },
    UnitHeal {
        unit_id: UnitId,
        unit_name: String,
        healer_id: Option<UnitId>,
        amount: i64,
        applied_amount: i64,
        new_hp: i64,
        side: Side,
        cause: EventCause,
    },
    StatBuff {
        unit_id: UnitId,
        unit_name: String,
        stat: Stat,
        value: f64,
        value_type: ValueType,
        duration: f64,
        permanent: bool,
        effect_id: Option<Uuid>,
        applied_delta: i64,
        caster_id: Option<UnitId>,
        caster_name: Option<String>,
        side: Side,
        cause: EventCause,
    },
    ShieldApplied {
        unit_id: UnitId,
        amount: i64,
        duration: f64,
        effect_id: Uuid,
        source_id: Option<UnitId>,
        side: Side,
    },
    UnitStunned {
        unit_id: UnitId,
        unit_name: String,
        duration: f64,
        effect_id: Uuid,
        source_id: Option<UnitId>,
        side: Side,
    },
    DamageOverTimeApplied {
        unit_id: UnitId,
        caster_id: Option<UnitId>,
        damage: i64,
        damage_type: String,
        duration: f64,
        interval: f64,
        effect_id: Uuid,
        next_tick_time: f64,
        expires_at: f64,
    },
    DamageOverTimeTick {
        unit_id: UnitId,
        damage: i64,
        damage_type: String,
        new_hp: i64,
        side: Side,
    },
    EffectExpired {
        unit_id: UnitId,
        effect_id: Uuid,
        stat: Option<Stat>,
        kind: EffectKind,
    },
    UnitDied {
        unit_id: UnitId,
        unit_name: String,
        side: Side,
    },
    ManaUpdate {
        unit_id: UnitId,
        pre_mana: i64,
        post_mana: i64,
        amount: i64,
        max_mana: i64,
        cause: ManaCause,
        side: Side,
    },
    AnimationStart {
        animation_id: String,
        attacker_id: UnitId,
        target_id: UnitId,
        duration: f64,
    },
    StateSnapshot {
        player_units: Vec<UnitSnapshot>,
        opponent_units: Vec<UnitSnapshot>,
    },
    GoldReward {
        recipient_id: String,
        amount: i64,
        side: Side,
    },
    SkillCast {
        caster_id: UnitId,
        caster_name: String,
        skill_name: String,
        target_id: Option<UnitId>,
        target_name: Option<String>,
        damage: Option<i64>,
    },
    SkillError {
        caster_id: UnitId,
        message: String,
    },
}

impl CombatEventKind {
    /// The canonical `type` string, as used in the event callback's first
    /// argument (spec §6 "Common: `type`").
    pub fn type_name(&self) -> &'static str {
        match self {
            CombatEventKind::UnitAttack { .. } => "unit_attack",
            CombatEventKind::UnitHeal { .. } => "unit_heal",
            CombatEventKind::StatBuff { .. } => "stat_buff",
            CombatEventKind::ShieldApplied { .. } => "shield_applied",
            CombatEventKind::UnitStunned { .. } => "unit_stunned",
            CombatEventKind::DamageOverTimeApplied { .. } => "damage_over_time_applied",
            CombatEventKind::DamageOverTimeTick { .. } => "damage_over_time_tick",
            CombatEventKind::EffectExpired { .. } => "effect_expired",
            CombatEventKind::UnitDied { .. } => "unit_died",
            CombatEventKind::ManaUpdate { .. } => "mana_update",
            CombatEventKind::AnimationStart { .. } => "animation_start",
            CombatEventKind::StateSnapshot { .. } => "state_snapshot",
            CombatEventKind::GoldReward { .. } => "gold_reward",
            CombatEventKind::SkillCast { .. } => "skill_cast",
            CombatEventKind::SkillError { .. } => "skill_error",
        }
    }
}

/// A fully-stamped, canonical event: the payload plus the `seq`/`event_id`/
/// `timestamp` triple every emitter call attaches (spec §3 invariants,
/// §6 "Common" fields).
#[derive(Debug, Clone, Serialize)]
pub struct CombatEvent {
    pub seq: u64,
    pub event_id: Uuid,
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: CombatEventKind,
}

impl CombatEvent {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Encode this event to the JSON payload handed to the event callback
    /// and returned in the result's `events` list (spec §6).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("CombatEvent serialization is infallible")
    }
}

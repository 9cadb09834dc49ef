//! Runtime combat unit state and active effects (spec §3).
//!
//! `CombatUnit`'s mutable fields are visible only within `crate::combat` —
//! the canonical emitter layer (`combat::emitter`) and the independent
//! reconstructor (`combat::reconstructor`) are the only code allowed to
//! write them, per the "single mutation funnel" design note in spec §9.
//! Everything outside `crate::combat` (including this crate's own tests
//! and the `headless` runner) observes units only through the read-only
//! accessors and [`UnitSnapshot`] below.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

/// Instance-unique identifier for a combat unit, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the combat a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Row placement, used by targeting rules (front-row preference, etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Front,
    Back,
}

impl Default for Position {
    fn default() -> Self {
        Position::Front
    }
}

/// A mutable numeric stat that buffs/debuffs/regen can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Attack,
    Defense,
    AttackSpeed,
    MaxHp,
    MaxMana,
    ManaRegen,
    HpRegenPerSec,
    /// Percentage amplifier applied once to the `applied_delta` of other
    /// stat-buff applications at the moment they land; does not amplify
    /// its own applications.
    BuffAmplifier,
}

impl Stat {
    pub fn as_str(self) -> &'static str {
        match self {
            Stat::Attack => "attack",
            Stat::Defense => "defense",
            Stat::AttackSpeed => "attack_speed",
            Stat::MaxHp => "max_hp",
            Stat::MaxMana => "max_mana",
            Stat::ManaRegen => "mana_regen",
            Stat::HpRegenPerSec => "hp_regen_per_sec",
            Stat::BuffAmplifier => "buff_amplifier",
        }
    }

    /// The three stats eligible for `stat="random"` resolution (spec §4.C).
    pub const RANDOMIZABLE: [Stat; 3] = [Stat::Defense, Stat::Attack, Stat::AttackSpeed];
}

/// Whether a buff/debuff value is an absolute amount or a percentage of
/// the target's current base stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Flat,
    Percentage,
}

/// The kind of a durational modifier attached to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Buff,
    Debuff,
    Shield,
    Stun,
    DamageOverTime,
}

/// A durational modifier attached to a unit: buff, debuff, shield, stun,
/// or damage-over-time (spec §3 "Active Effect").
///
/// `id` is the join key between the apply-event that created this effect
/// and the `effect_expired` event that will remove it (spec §9 "Effect id
/// as the join key").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub id: Uuid,
    pub kind: EffectKind,
    /// Stat affected, for buff/debuff. `None` for shield/stun/DoT.
    pub stat: Option<Stat>,
    pub value: f64,
    pub value_type: Option<ValueType>,
    pub duration: f64,
    pub expires_at: f64,
    /// For DoT effects: the next time a tick should fire.
    pub next_tick_time: Option<f64>,
    /// For DoT effects: seconds between ticks, used to advance `next_tick_time`.
    pub interval: Option<f64>,
    /// For DoT effects: damage applied per tick.
    pub damage_per_tick: Option<i64>,
    pub damage_type: Option<String>,
    /// The signed integer actually added to the stat at apply time, so
    /// that reverting on expiry is exact even for percentage buffs whose
    /// recomputation against a since-mutated base stat could drift.
    pub applied_delta: i64,
    pub source: UnitId,
}

/// Value-typed, deep copy of a unit's observable fields, suitable for
/// inclusion in a `state_snapshot` event (spec §4.A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub name: String,
    pub side: Side,
    pub position: Position,
    pub star_level: u32,
    pub hp: i64,
    pub max_hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub attack_speed: f64,
    pub current_mana: i64,
    pub max_mana: i64,
    pub shield: i64,
    pub effects: Vec<ActiveEffect>,
    /// Net total currently-active (non-permanent) delta per stat, for
    /// display purposes; permanent accumulation is tracked separately in
    /// `permanent_buffs` and is not repeated here.
    pub buffed_stats: HashMap<Stat, i64>,
    pub dead: bool,
}

/// Runtime combat unit (spec §3 "Combat Unit").
#[derive(Debug, Clone)]
pub struct CombatUnit {
    pub(in crate::combat) id: UnitId,
    pub(in crate::combat) template_id: String,
    pub(in crate::combat) name: String,
    pub(in crate::combat) side: Side,
    pub(in crate::combat) position: Position,
    pub(in crate::combat) star_level: u32,

    pub(in crate::combat) hp: i64,
    pub(in crate::combat) max_hp: i64,
    pub(in crate::combat) attack: i64,
    pub(in crate::combat) defense: i64,
    /// Attacks per second, fixed-point in thousandths, so that buff/debuff
    /// `applied_delta` is an exact, revertible integer for this stat the
    /// same way it is for every other stat (see `emit_stat_buff`).
    pub(in crate::combat) attack_speed_x1000: i64,
    pub(in crate::combat) current_mana: i64,
    pub(in crate::combat) max_mana: i64,
    pub(in crate::combat) mana_regen: f64,
    pub(in crate::combat) mana_on_attack: i64,
    pub(in crate::combat) hp_regen_per_sec: f64,
    pub(in crate::combat) shield: i64,
    pub(in crate::combat) buff_amplifier_percent: i64,
    /// When set, basic-attack targeting prefers the back row instead of
    /// the front row (spec §4.D step 6).
    pub(in crate::combat) back_targeting: bool,

    pub(in crate::combat) effects: SmallVec<[ActiveEffect; 4]>,
    pub(in crate::combat) dead: bool,
    pub(in crate::combat) death_processed: bool,
    pub(in crate::combat) stunned_until: Option<f64>,
    pub(in crate::combat) last_attack_time: f64,

    pub(in crate::combat) collected_stats: HashMap<Stat, i64>,
    pub(in crate::combat) permanent_buffs: HashMap<Stat, i64>,

    /// Carry-over accumulators for sub-integer regen per tick (spec §4.D step 3).
    pub(in crate::combat) hp_regen_accumulator: f64,
    pub(in crate::combat) mana_regen_accumulator: f64,

    /// Per-unit bookkeeping for `trigger_once` trait effects (trait name -> fired).
    pub(in crate::combat) fired_once_triggers: std::collections::HashSet<String>,

    pub(in crate::combat) damage_dealt: i64,
    pub(in crate::combat) damage_taken: i64,
}

impl CombatUnit {
    /// Construct a combat unit from already-scaled final stats. Star
    /// scaling (`hp *= 1.6^(star-1)`, `attack *= 1.4^(star-1)`, spec §9)
    /// and synergy buffs are applied by the external caller before this
    /// constructor runs (spec §3 Lifecycles): the core only ever sees the
    /// final numbers.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: UnitId,
        template_id: impl Into<String>,
        name: impl Into<String>,
        side: Side,
        position: Position,
        star_level: u32,
        hp: i64,
        attack: i64,
        defense: i64,
        attack_speed: f64,
        max_mana: i64,
        mana_on_attack: i64,
        mana_regen: f64,
        hp_regen_per_sec: f64,
        back_targeting: bool,
    ) -> Self {
        Self {
            id,
            template_id: template_id.into(),
            name: name.into(),
            side,
            position,
            star_level,
            hp,
            max_hp: hp,
            attack,
            defense,
            attack_speed_x1000: (attack_speed * 1000.0).round() as i64,
            current_mana: 0,
            max_mana,
            mana_regen,
            mana_on_attack,
            hp_regen_per_sec,
            shield: 0,
            buff_amplifier_percent: 0,
            back_targeting,
            effects: SmallVec::new(),
            dead: false,
            death_processed: false,
            stunned_until: None,
            last_attack_time: 0.0,
            collected_stats: HashMap::new(),
            permanent_buffs: HashMap::new(),
            hp_regen_accumulator: 0.0,
            mana_regen_accumulator: 0.0,
            fired_once_triggers: std::collections::HashSet::new(),
            damage_dealt: 0,
            damage_taken: 0,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }
    pub fn template_id(&self) -> &str {
        &self.template_id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn side(&self) -> Side {
        self.side
    }
    pub fn position(&self) -> Position {
        self.position
    }
    pub fn star_level(&self) -> u32 {
        self.star_level
    }
    pub fn hp(&self) -> i64 {
        self.hp
    }
    pub fn max_hp(&self) -> i64 {
        self.max_hp
    }
    pub fn attack(&self) -> i64 {
        self.attack
    }
    pub fn defense(&self) -> i64 {
        self.defense
    }
    pub fn attack_speed(&self) -> f64 {
        self.attack_speed_x1000 as f64 / 1000.0
    }
    pub fn attack_speed_x1000(&self) -> i64 {
        self.attack_speed_x1000
    }
    pub fn buff_amplifier_percent(&self) -> i64 {
        self.buff_amplifier_percent
    }
    pub fn back_targeting(&self) -> bool {
        self.back_targeting
    }
    pub fn current_mana(&self) -> i64 {
        self.current_mana
    }
    pub fn max_mana(&self) -> i64 {
        self.max_mana
    }
    pub fn mana_on_attack(&self) -> i64 {
        self.mana_on_attack
    }
    pub fn shield(&self) -> i64 {
        self.shield
    }
    pub fn hp_regen_per_sec(&self) -> f64 {
        self.hp_regen_per_sec
    }
    pub fn mana_regen(&self) -> f64 {
        self.mana_regen
    }
    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }
    pub fn is_alive(&self) -> bool {
        !self.dead
    }
    pub fn is_dead(&self) -> bool {
        self.dead
    }
    pub fn is_stunned(&self, now: f64) -> bool {
        matches!(self.stunned_until, Some(t) if now < t)
    }
    pub fn last_attack_time(&self) -> f64 {
        self.last_attack_time
    }
    pub fn permanent_buffs(&self) -> &HashMap<Stat, i64> {
        &self.permanent_buffs
    }
    pub fn collected_stats(&self) -> &HashMap<Stat, i64> {
        &self.collected_stats
    }
    pub fn damage_dealt(&self) -> i64 {
        self.damage_dealt
    }
    pub fn damage_taken(&self) -> i64 {
        self.damage_taken
    }

    pub fn stat_value(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Attack => self.attack as f64,
            Stat::Defense => self.defense as f64,
            Stat::AttackSpeed => self.attack_speed_x1000 as f64,
            Stat::MaxHp => self.max_hp as f64,
            Stat::MaxMana => self.max_mana as f64,
            Stat::ManaRegen => self.mana_regen,
            Stat::HpRegenPerSec => self.hp_regen_per_sec,
            Stat::BuffAmplifier => self.buff_amplifier_percent as f64,
        }
    }

    pub fn has_effect_kind(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn snapshot(&self) -> UnitSnapshot {
        let mut buffed_stats: HashMap<Stat, i64> = HashMap::new();
        for effect in &self.effects {
            if matches!(effect.kind, EffectKind::Buff | EffectKind::Debuff) {
                if let Some(stat) = effect.stat {
                    *buffed_stats.entry(stat).or_insert(0) += effect.applied_delta;
                }
            }
        }
        UnitSnapshot {
            id: self.id,
            name: self.name.clone(),
            side: self.side,
            position: self.position,
            star_level: self.star_level,
            hp: self.hp,
            max_hp: self.max_hp,
            attack: self.attack,
            defense: self.defense,
            attack_speed: self.attack_speed(),
            current_mana: self.current_mana,
            max_mana: self.max_mana,
            shield: self.shield,
            effects: self.effects.to_vec(),
            buffed_stats,
            dead: self.dead,
        }
    }
}

/// Scale a base stat for star level using the canonical growth factor
/// (spec §9 "Star scaling": hp grows by `1.6^(star-1)`, attack by
/// `1.4^(star-1)`). Exposed as a utility for external callers that build
/// `CombatUnit`s from templates; the core itself never calls this.
pub fn star_scale(base: i64, star_level: u32, growth: f64) -> i64 {
    let factor = growth.powi(star_level.saturating_sub(1) as i32);
    (base as f64 * factor).round() as i64
}

pub const HP_STAR_GROWTH: f64 = 1.6;
pub const ATTACK_STAR_GROWTH: f64 = 1.4;

//! The typed Skill/Effect AST a unit's skill is built from (spec §4.C).
//!
//! Mirrors the effect taxonomy in
//! `examples/original_source/waffen-tactics/src/waffen_tactics/services/effects/`
//! (one Python module per effect kind) as a single closed Rust enum,
//! validated once at combat setup the way `ability_config.rs`'s
//! `AbilityConfig` is validated against the ability roster at startup
//! rather than at cast time.

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::model::unit::{EffectKind, Stat, ValueType};

/// Where an effect's targets are drawn from (spec §4.C "Target resolution").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[serde(rename = "self")]
    SelfTarget,
    SingleEnemy,
    SingleEnemyPersistent,
    EnemyTeam,
    EnemyFront,
    AllyTeam,
    AllyFront,
}

/// A buff/debuff stat selector: either a concrete stat, or resolved at
/// cast time from `{defense, attack, attack_speed}` via the seeded RNG
/// (spec §4.C, `stat="random"`).
///
/// Encoded as a plain string either way (`"attack"`, `"random"`, ...): a
/// derived `#[serde(untagged)]` would only match the unit variant against
/// JSON `null`, not the literal string the wire format actually uses, so
/// both directions are written by hand against `Stat`'s own snake_case
/// names instead of duplicating them here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatSelector {
    Specific(Stat),
    Random,
}

impl Serialize for StatSelector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            StatSelector::Specific(stat) => stat.serialize(serializer),
            StatSelector::Random => serializer.serialize_str("random"),
        }
    }
}

impl<'de> Deserialize<'de> for StatSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == "random" {
            return Ok(StatSelector::Random);
        }
        Stat::deserialize(serde::de::value::StrDeserializer::new(&raw)).map(StatSelector::Specific)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

/// A condition a `conditional` effect evaluates against its target
/// (spec §4.C "Conditions").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    HealthPercentage { threshold: f64 },
    HasEffect { effect_kind: EffectKind },
    StatComparison {
        stat: Stat,
        operator: ComparisonOperator,
        value: f64,
    },
    Random { chance_percent: f64 },
}

/// One typed effect within a Skill (spec §4.C effect handler table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Damage {
        target: Target,
        amount: i64,
        damage_type: String,
    },
    Heal {
        target: Target,
        amount: i64,
    },
    Shield {
        target: Target,
        amount: i64,
        duration: f64,
    },
    Buff {
        target: Target,
        stat: StatSelector,
        value: f64,
        value_type: ValueType,
        duration: f64,
    },
    Debuff {
        target: Target,
        stat: StatSelector,
        value: f64,
        value_type: ValueType,
        duration: f64,
    },
    Stun {
        target: Target,
        duration: f64,
    },
    DamageOverTime {
        target: Target,
        damage: i64,
        damage_type: String,
        duration: f64,
        interval: f64,
    },
    Delay {
        duration: f64,
    },
    Repeat {
        count: i64,
        effects: Vec<Effect>,
    },
    Conditional {
        target: Target,
        condition: Condition,
        effects: Vec<Effect>,
        else_effects: Vec<Effect>,
    },
}

/// An ordered list of typed Effects sharing one Execution Context
/// (spec §4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub mana_cost: i64,
    pub effects: Vec<Effect>,
}

impl Skill {
    /// Validate this skill's descriptor at combat setup. The Skill Parser
    /// rejects malformed descriptors here rather than at tick time
    /// (spec §4.C "Validation").
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.effects.is_empty() {
            return Err(SetupError::EmptySkill {
                skill: self.name.clone(),
            });
        }
        if self.mana_cost < 0 {
            return Err(SetupError::InvalidEffect {
                skill: self.name.clone(),
                index: 0,
                reason: "mana_cost must be >= 0".to_string(),
            });
        }
        for (index, effect) in self.effects.iter().enumerate() {
            validate_effect(&self.name, index, effect)?;
        }
        Ok(())
    }
}

fn validate_effect(skill: &str, index: usize, effect: &Effect) -> Result<(), SetupError> {
    let err = |reason: &str| {
        Err(SetupError::InvalidEffect {
            skill: skill.to_string(),
            index,
            reason: reason.to_string(),
        })
    };
    match effect {
        Effect::Damage { amount, .. } if *amount < 1 => err("damage amount must be >= 1"),
        Effect::Heal { amount, .. } if *amount < 0 => err("heal amount must be >= 0"),
        Effect::Shield { amount, duration, .. } => {
            if *amount < 0 {
                err("shield amount must be >= 0")
            } else if *duration <= 0.0 {
                err("shield duration must be > 0")
            } else {
                Ok(())
            }
        }
        Effect::Buff { duration, .. } | Effect::Debuff { duration, .. } if *duration < 0.0 => {
            err("buff/debuff duration must be >= 0")
        }
        Effect::Stun { duration, .. } if *duration <= 0.0 => err("stun duration must be > 0"),
        Effect::DamageOverTime {
            damage,
            duration,
            interval,
            ..
        } => {
            if *damage < 1 {
                err("damage_over_time damage must be >= 1")
            } else if *duration <= 0.0 {
                err("damage_over_time duration must be > 0")
            } else if *interval <= 0.0 {
                err("damage_over_time interval must be > 0")
            } else {
                Ok(())
            }
        }
        Effect::Delay { duration } if *duration < 0.0 => err("delay duration must be >= 0"),
        Effect::Repeat { count, effects } => {
            if *count < 1 {
                return Err(SetupError::InvalidRepeatCount {
                    skill: skill.to_string(),
                    index,
                    count: *count,
                });
            }
            for (inner_index, inner) in effects.iter().enumerate() {
                validate_effect(skill, inner_index, inner)?;
            }
            Ok(())
        }
        Effect::Conditional {
            effects,
            else_effects,
            ..
        } => {
            for (inner_index, inner) in effects.iter().enumerate() {
                validate_effect(skill, inner_index, inner)?;
            }
            for (inner_index, inner) in else_effects.iter().enumerate() {
                validate_effect(skill, inner_index, inner)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

//! Static content: unit templates and traits (spec §3).
//!
//! Data-driven and `serde`-derived the way `ability_config.rs` defines
//! `AbilityConfig`/`AuraEffect`; loading these from disk is a collaborator
//! concern out of scope for this core (spec §1), so only the types and
//! their validation live here.

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::model::skill::Skill;
use crate::model::unit::{Stat, ValueType};

/// Static unit definition (spec §3 "Unit Template").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: String,
    pub display_name: String,
    pub cost_tier: u32,
    #[serde(default)]
    pub factions: Vec<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    pub base_hp: i64,
    pub base_attack: i64,
    pub base_defense: i64,
    pub base_attack_speed: f64,
    #[serde(default)]
    pub base_max_mana: i64,
    #[serde(default)]
    pub base_mana_on_attack: i64,
    #[serde(default)]
    pub base_mana_regen: f64,
    #[serde(default)]
    pub base_hp_regen_per_sec: f64,
    #[serde(default)]
    pub skill: Option<Skill>,
}

impl UnitTemplate {
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.base_hp <= 0 {
            return Err(SetupError::InvalidMatchConfig(format!(
                "unit template '{}': base_hp must be > 0",
                self.id
            )));
        }
        if self.base_attack_speed < 0.0 {
            return Err(SetupError::InvalidMatchConfig(format!(
                "unit template '{}': base_attack_speed must be >= 0",
                self.id
            )));
        }
        if let Some(skill) = &self.skill {
            skill.validate()?;
        }
        Ok(())
    }
}

/// Which roster a [`Trait`] synergizes (spec §3 "Trait").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitType {
    Faction,
    Class,
}

/// The condition under which a trait's Modular Effect fires (spec §3,
/// glossary "Trigger").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnEnemyDeath,
    OnAllyDeath,
    OnAllyHpBelow,
    PerSecond,
    PerRound,
    OnWin,
    OnLoss,
    PerTrait,
}

/// Who receives a [`ModularEffect`]'s rewards when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardRecipients {
    /// The unit whose trait fired.
    TraitHolder,
    /// Every living ally of the unit whose trait fired.
    AllAllies,
    /// The killer, for `on_enemy_death`.
    Killer,
    /// The victim, for `on_ally_death` / `on_ally_hp_below`.
    Victim,
}

/// A reward granted when a [`ModularEffect`] fires (spec §3: "stat buffs,
/// resource grants, mana regen, healing, targeting preferences, or
/// dynamic scaling").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reward {
    StatBuff {
        stat: Stat,
        value: f64,
        value_type: ValueType,
        #[serde(default)]
        duration: Option<f64>,
        #[serde(default)]
        permanent: bool,
    },
    Heal {
        amount: i64,
    },
    Gold {
        amount: i64,
    },
    ManaGrant {
        amount: i64,
    },
    /// Reward magnitude scales with a dynamic quantity (e.g. number of
    /// completed rounds, or stacks of `per_trait` activations) rather
    /// than a fixed value.
    DynamicScaling {
        stat: Stat,
        value_type: ValueType,
        per_unit: f64,
        #[serde(default)]
        permanent: bool,
    },
}

/// One `(trigger, conditions, rewards)` tuple for a trait tier (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModularEffect {
    pub trigger: Trigger,
    #[serde(default)]
    pub trigger_once: bool,
    #[serde(default)]
    pub chance_percent: Option<f64>,
    /// Only meaningful for `Trigger::OnAllyHpBelow`.
    #[serde(default)]
    pub hp_below_percent: Option<f64>,
    #[serde(default = "default_recipients")]
    pub recipients: RewardRecipients,
    pub rewards: Vec<Reward>,
}

fn default_recipients() -> RewardRecipients {
    RewardRecipients::TraitHolder
}

/// One activation tier of a [`Trait`]: a unit count threshold plus the
/// Modular Effects active at that tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitTier {
    pub threshold: u32,
    pub effects: Vec<ModularEffect>,
}

/// Static faction/class trait (spec §3 "Trait").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trait {
    pub name: String,
    pub trait_type: TraitType,
    pub tiers: Vec<TraitTier>,
}

impl Trait {
    pub fn validate(&self) -> Result<(), SetupError> {
        for (i, tier) in self.tiers.iter().enumerate() {
            if tier.threshold == 0 {
                return Err(SetupError::InvalidTrait {
                    trait_name: self.name.clone(),
                    tier: i,
                    reason: "activation threshold must be a positive integer".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The highest tier active for a given count of units carrying this
    /// trait, if any threshold is met.
    pub fn active_tier(&self, unit_count: u32) -> Option<&TraitTier> {
        self.tiers
            .iter()
            .filter(|t| t.threshold <= unit_count)
            .max_by_key(|t| t.threshold)
    }
}

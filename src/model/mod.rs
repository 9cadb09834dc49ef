//! Data model (spec §4.A): unit templates, traits, effect descriptors, and
//! combat-unit runtime state. Exposes constructors and pure accessors only
//! — defensive clamping happens in the emitter layer (`combat::emitter`),
//! not here.

pub mod skill;
pub mod template;
pub mod unit;

pub use skill::{Condition, ComparisonOperator, Effect, Skill, StatSelector, Target};
pub use template::{ModularEffect, Reward, RewardRecipients, Trait, TraitTier, TraitType, Trigger, UnitTemplate};
pub use unit::{ActiveEffect, CombatUnit, EffectKind, Position, Side, Stat, UnitId, UnitSnapshot, ValueType};

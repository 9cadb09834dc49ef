//! The skill executor: interprets a unit's typed Skill/Effect AST against
//! live combat state, invoking the emitter for every concrete effect
//! application.
//!
//! Generalized from `arenasim`'s ability-casting pipeline
//! (`states/play_match/abilities.rs`, `ability_config.rs`) and aura
//! application (`auras.rs`) into a data-driven interpreter over the typed
//! `Effect` enum: this core has no fixed ability roster, every unit's
//! skill is data.

use crate::combat::emitter::Emitter;
use crate::combat::events::{EventCause, ManaCause};
use crate::combat::roster::Roster;
use crate::combat::targeting;
use crate::error::SkillError;
use crate::model::skill::{ComparisonOperator, Condition, Effect, Skill, StatSelector, Target};
use crate::model::unit::{Stat, UnitId, ValueType};
use crate::rng::GameRng;

/// State threaded through one skill cast: which target persistent effects
/// reuse, and how far simulated time has advanced (a `delay` effect pushes
/// this forward). Lives only for the duration of one cast — never attached
/// to the unit, so concurrent combats never share it.
pub struct ExecutionContext {
    pub caster: UnitId,
    pub combat_time: f64,
    pub persistent_target: Option<UnitId>,
}

impl ExecutionContext {
    pub fn new(caster: UnitId, combat_time: f64) -> Self {
        Self {
            caster,
            combat_time,
            persistent_target: None,
        }
    }
}

/// Cast `skill` on behalf of `caster`. The simulator has already verified
/// `current_mana >= skill.mana_cost` is worth attempting; this still
/// re-checks it, since an execution-time race (e.g. a debuff landing
/// between the gate check and the cast) is exactly what `SkillError` is
/// for. On error the caller records a `skill_error` event and the
/// remaining effects are skipped.
pub fn cast_skill(
    emitter: &mut Emitter,
    roster: &mut Roster,
    rng: &mut GameRng,
    skill: &Skill,
    caster: UnitId,
    now: f64,
) -> Result<(), SkillError> {
    let available = roster.get(caster).current_mana();
    if available < skill.mana_cost {
        return Err(SkillError::InsufficientMana {
            available,
            required: skill.mana_cost,
        });
    }

    emitter.emit_mana_update(roster, caster, -skill.mana_cost, now, ManaCause::SkillSpent);

    // Only the literal damage amount of a leading damage effect is known
    // before any target has been resolved; target fields stay unset.
    let first_damage = skill.effects.first().and_then(|e| match e {
        Effect::Damage { amount, .. } => Some(*amount),
        _ => None,
    });
    let caster_name = roster.get(caster).name().to_string();
    emitter.emit_skill_cast(caster, caster_name, skill.name.clone(), None, None, first_damage, now);

    let mut ctx = ExecutionContext::new(caster, now);
    for (effect_index, effect) in skill.effects.iter().enumerate() {
        execute_effect(emitter, roster, rng, &mut ctx, effect, effect_index)?;
    }
    Ok(())
}

/// `effect_index` identifies which top-level `skill.effects` entry this call
/// ultimately descends from, so a `NoValidTargets` error reports the effect
/// that actually failed to resolve rather than always blaming effect 0 —
/// `Repeat`/`Conditional` recursion carries the same index down to its inner
/// effects, since those have no position of their own in `skill.effects`.
fn execute_effect(
    emitter: &mut Emitter,
    roster: &mut Roster,
    rng: &mut GameRng,
    ctx: &mut ExecutionContext,
    effect: &Effect,
    effect_index: usize,
) -> Result<(), SkillError> {
    match effect {
        Effect::Damage { target, amount, damage_type } => {
            for t in resolve(roster, rng, ctx, *target, effect_index)? {
                emitter.emit_damage(roster, ctx.caster, t, *amount, damage_type.clone(), ctx.combat_time, true, EventCause::Skill);
            }
            Ok(())
        }
        Effect::Heal { target, amount } => {
            for t in resolve(roster, rng, ctx, *target, effect_index)? {
                emitter.emit_heal(roster, Some(ctx.caster), t, *amount, ctx.combat_time, EventCause::Skill);
            }
            Ok(())
        }
        Effect::Shield { target, amount, duration } => {
            for t in resolve(roster, rng, ctx, *target, effect_index)? {
                emitter.emit_shield_applied(roster, t, *amount, *duration, Some(ctx.caster), ctx.combat_time);
            }
            Ok(())
        }
        Effect::Buff { target, stat, value, value_type, duration } => {
            apply_buff(emitter, roster, rng, ctx, *target, *stat, value.abs(), *value_type, *duration, effect_index)
        }
        Effect::Debuff { target, stat, value, value_type, duration } => {
            apply_buff(emitter, roster, rng, ctx, *target, *stat, -value.abs(), *value_type, *duration, effect_index)
        }
        Effect::Stun { target, duration } => {
            for t in resolve(roster, rng, ctx, *target, effect_index)? {
                emitter.emit_unit_stunned(roster, t, *duration, Some(ctx.caster), ctx.combat_time);
            }
            Ok(())
        }
        Effect::DamageOverTime { target, damage, damage_type, duration, interval } => {
            for t in resolve(roster, rng, ctx, *target, effect_index)? {
                emitter.emit_damage_over_time_applied(
                    roster,
                    t,
                    *damage,
                    damage_type.clone(),
                    *duration,
                    *interval,
                    Some(ctx.caster),
                    ctx.combat_time,
                );
            }
            Ok(())
        }
        Effect::Delay { duration } => {
            ctx.combat_time += duration;
            roster.get_mut(ctx.caster).last_attack_time = ctx.combat_time;
            Ok(())
        }
        Effect::Repeat { count, effects } => {
            for _ in 0..*count {
                for inner in effects {
                    execute_effect(emitter, roster, rng, ctx, inner, effect_index)?;
                }
            }
            Ok(())
        }
        Effect::Conditional { target, condition, effects, else_effects } => {
            let targets = resolve(roster, rng, ctx, *target, effect_index)?;
            let took_branch = targets
                .first()
                .map(|t| evaluate_condition(roster, rng, condition, *t))
                .unwrap_or(false);
            let branch = if took_branch { effects } else { else_effects };
            for inner in branch {
                execute_effect(emitter, roster, rng, ctx, inner, effect_index)?;
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_buff(
    emitter: &mut Emitter,
    roster: &mut Roster,
    rng: &mut GameRng,
    ctx: &mut ExecutionContext,
    target: Target,
    stat: StatSelector,
    value: f64,
    value_type: ValueType,
    duration: f64,
    effect_index: usize,
) -> Result<(), SkillError> {
    let resolved_stat = resolve_stat(stat, rng);
    for t in resolve(roster, rng, ctx, target, effect_index)? {
        emitter.emit_stat_buff(
            roster,
            t,
            resolved_stat,
            value,
            value_type,
            duration,
            false,
            Some(ctx.caster),
            ctx.combat_time,
            EventCause::Skill,
        );
    }
    Ok(())
}

fn resolve_stat(selector: StatSelector, rng: &mut GameRng) -> Stat {
    match selector {
        StatSelector::Specific(stat) => stat,
        StatSelector::Random => *rng.choose(&Stat::RANDOMIZABLE).expect("RANDOMIZABLE is non-empty"),
    }
}

fn resolve(
    roster: &Roster,
    rng: &mut GameRng,
    ctx: &mut ExecutionContext,
    target: Target,
    effect_index: usize,
) -> Result<Vec<UnitId>, SkillError> {
    let targets = targeting::resolve_targets(roster, ctx.caster, target, ctx.persistent_target, rng);
    if target == Target::SingleEnemyPersistent {
        ctx.persistent_target = targets.first().copied();
    }
    if targets.is_empty() {
        return Err(if target == Target::SingleEnemyPersistent {
            SkillError::PersistentTargetUnavailable
        } else {
            SkillError::NoValidTargets {
                effect_index,
                target_kind: format!("{target:?}"),
            }
        });
    }
    Ok(targets)
}

fn evaluate_condition(roster: &Roster, rng: &mut GameRng, condition: &Condition, target: UnitId) -> bool {
    let unit = roster.get(target);
    match condition {
        Condition::HealthPercentage { threshold } => {
            let pct = unit.hp() as f64 / unit.max_hp().max(1) as f64 * 100.0;
            pct <= *threshold
        }
        Condition::HasEffect { effect_kind } => unit.has_effect_kind(*effect_kind),
        Condition::StatComparison { stat, operator, value } => {
            let actual = unit.stat_value(*stat);
            match operator {
                ComparisonOperator::Gt => actual > *value,
                ComparisonOperator::Lt => actual < *value,
                ComparisonOperator::Ge => actual >= *value,
                ComparisonOperator::Le => actual <= *value,
                ComparisonOperator::Eq => (actual - *value).abs() < f64::EPSILON,
            }
        }
        Condition::Random { chance_percent } => rng.gen_bool(chance_percent / 100.0),
    }
}

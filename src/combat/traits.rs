//! Trait-driven Modular Effects: trigger processing for faction/class
//! synergy bonuses.
//!
//! Which units carry which trait and which tier is active is resolved
//! externally from team composition before combat starts (per-player
//! synergy, out of this core's scope per its own data-loading boundary);
//! [`ActiveTrait`] is the already-resolved view this module consumes.

use crate::combat::emitter::Emitter;
use crate::combat::events::{EventCause, ManaCause};
use crate::combat::roster::Roster;
use crate::model::template::{ModularEffect, Reward, RewardRecipients, Trigger};
use crate::model::unit::{Side, UnitId};
use crate::rng::GameRng;

/// One trait's currently-active tier, resolved for one side.
#[derive(Debug, Clone)]
pub struct ActiveTrait {
    pub side: Side,
    pub trait_name: String,
    /// Units on this side carrying the trait — eligible `TraitHolder`/
    /// `AllAllies` recipients.
    pub holders: Vec<UnitId>,
    pub effects: Vec<ModularEffect>,
}

#[derive(Default)]
pub struct TraitEngine {
    active: Vec<ActiveTrait>,
}

impl TraitEngine {
    pub fn new(active: Vec<ActiveTrait>) -> Self {
        Self { active }
    }

    /// Per-round passives: applied once at combat start, scaled by
    /// completed-round count (round 3 applies with scale 3.0).
    pub fn apply_per_round(&self, emitter: &mut Emitter, roster: &mut Roster, rng: &mut GameRng, completed_rounds: u32, now: f64) {
        self.fire_for_trigger(emitter, roster, rng, Trigger::PerRound, now, completed_rounds.max(1) as f64, None, None);
    }

    /// `per_trait` passives: a one-shot, unscaled application per holder
    /// at setup. The source material gives no stacking rule for this
    /// trigger beyond "fires once per qualifying trait"; scale is fixed
    /// at 1.0 here.
    pub fn apply_per_trait(&self, emitter: &mut Emitter, roster: &mut Roster, rng: &mut GameRng, now: f64) {
        self.fire_for_trigger(emitter, roster, rng, Trigger::PerTrait, now, 1.0, None, None);
    }

    /// Fires once per whole-second boundary; rewards accumulate
    /// permanently.
    pub fn tick_per_second(&self, emitter: &mut Emitter, roster: &mut Roster, rng: &mut GameRng, now: f64) {
        self.fire_for_trigger(emitter, roster, rng, Trigger::PerSecond, now, 1.0, None, None);
    }

    pub fn fire_on_win(&self, emitter: &mut Emitter, roster: &mut Roster, rng: &mut GameRng, winner: Side, now: f64) {
        self.fire_for_trigger_on_side(emitter, roster, rng, Trigger::OnWin, winner, now, None, None);
    }

    pub fn fire_on_loss(&self, emitter: &mut Emitter, roster: &mut Roster, rng: &mut GameRng, loser: Side, now: f64) {
        self.fire_for_trigger_on_side(emitter, roster, rng, Trigger::OnLoss, loser, now, None, None);
    }

    /// Called once per death: the killer's team's `on_enemy_death` traits
    /// and the victim's team's `on_ally_death` traits both fire.
    pub fn on_unit_died(&self, emitter: &mut Emitter, roster: &mut Roster, rng: &mut GameRng, victim: UnitId, killer: Option<UnitId>, now: f64) {
        let victim_side = roster.get(victim).side();
        self.fire_for_trigger_on_side(emitter, roster, rng, Trigger::OnAllyDeath, victim_side, now, Some(victim), killer);
        if let Some(k) = killer {
            let killer_side = roster.get(k).side();
            self.fire_for_trigger_on_side(emitter, roster, rng, Trigger::OnEnemyDeath, killer_side, now, Some(victim), killer);
        }
    }

    /// Scans the side each active trait belongs to for units newly at or
    /// below that trait's configured HP threshold. The unit in peril never
    /// triggers its own `on_ally_hp_below` reward.
    pub fn check_hp_below(&self, emitter: &mut Emitter, roster: &mut Roster, rng: &mut GameRng, now: f64) {
        for active in &self.active {
            for (effect_index, effect) in active.effects.iter().enumerate() {
                if effect.trigger != Trigger::OnAllyHpBelow {
                    continue;
                }
                let Some(threshold) = effect.hp_below_percent else { continue };
                let victims: Vec<UnitId> = roster
                    .alive(active.side)
                    .filter(|u| (u.hp() as f64 / u.max_hp().max(1) as f64 * 100.0) <= threshold)
                    .map(|u| u.id())
                    .collect();
                for victim in victims {
                    for &holder in &active.holders {
                        if holder == victim {
                            continue;
                        }
                        self.fire_effect(emitter, roster, rng, active, effect, effect_index, holder, now, 1.0, Some(victim), None);
                    }
                }
            }
        }
    }

    fn fire_for_trigger(
        &self,
        emitter: &mut Emitter,
        roster: &mut Roster,
        rng: &mut GameRng,
        trigger: Trigger,
        now: f64,
        scale: f64,
        victim: Option<UnitId>,
        killer: Option<UnitId>,
    ) {
        for active in &self.active {
            self.fire_trait(emitter, roster, rng, active, trigger, now, scale, victim, killer);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fire_for_trigger_on_side(
        &self,
        emitter: &mut Emitter,
        roster: &mut Roster,
        rng: &mut GameRng,
        trigger: Trigger,
        side: Side,
        now: f64,
        victim: Option<UnitId>,
        killer: Option<UnitId>,
    ) {
        for active in self.active.iter().filter(|a| a.side == side) {
            self.fire_trait(emitter, roster, rng, active, trigger, now, 1.0, victim, killer);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fire_trait(
        &self,
        emitter: &mut Emitter,
        roster: &mut Roster,
        rng: &mut GameRng,
        active: &ActiveTrait,
        trigger: Trigger,
        now: f64,
        scale: f64,
        victim: Option<UnitId>,
        killer: Option<UnitId>,
    ) {
        for (effect_index, effect) in active.effects.iter().enumerate() {
            if effect.trigger != trigger {
                continue;
            }
            for &holder in &active.holders {
                if !roster.get(holder).is_alive() {
                    continue;
                }
                self.fire_effect(emitter, roster, rng, active, effect, effect_index, holder, now, scale, victim, killer);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fire_effect(
        &self,
        emitter: &mut Emitter,
        roster: &mut Roster,
        rng: &mut GameRng,
        active: &ActiveTrait,
        effect: &ModularEffect,
        effect_index: usize,
        holder: UnitId,
        now: f64,
        scale: f64,
        victim: Option<UnitId>,
        killer: Option<UnitId>,
    ) {
        // `on_ally_hp_below` is scoped per victim (spec §3: "trigger_once flag is
        // honoured per unit per combat") — each ally that crosses the threshold
        // gets its own independent one-time trigger, rather than one shared by
        // whichever ally happens to cross it first.
        let once_key = if effect.trigger == Trigger::OnAllyHpBelow {
            format!("{}#{effect_index}#{}", active.trait_name, victim.map_or(-1, |v| v.0 as i64))
        } else {
            format!("{}#{effect_index}", active.trait_name)
        };
        if effect.trigger_once && roster.get(holder).fired_once_triggers.contains(&once_key) {
            return;
        }
        if let Some(chance) = effect.chance_percent {
            if !rng.gen_bool(chance / 100.0) {
                return;
            }
        }

        let recipients: Vec<UnitId> = match effect.recipients {
            RewardRecipients::TraitHolder => vec![holder],
            RewardRecipients::AllAllies => roster.alive(active.side).map(|u| u.id()).collect(),
            RewardRecipients::Killer => killer.into_iter().collect(),
            RewardRecipients::Victim => victim.into_iter().collect(),
        };

        for recipient in recipients {
            for reward in &effect.rewards {
                apply_reward(emitter, roster, recipient, reward, active.side, scale, now);
            }
        }

        if effect.trigger_once {
            roster.get_mut(holder).fired_once_triggers.insert(once_key);
        }
    }
}

fn apply_reward(emitter: &mut Emitter, roster: &mut Roster, recipient: UnitId, reward: &Reward, side: Side, scale: f64, now: f64) {
    match reward {
        Reward::StatBuff { stat, value, value_type, duration, permanent } => {
            emitter.emit_stat_buff(
                roster,
                recipient,
                *stat,
                value * scale,
                *value_type,
                duration.unwrap_or(0.0),
                *permanent,
                None,
                now,
                EventCause::Trait,
            );
        }
        Reward::Heal { amount } => {
            emitter.emit_heal(roster, None, recipient, (*amount as f64 * scale).round() as i64, now, EventCause::Trait);
        }
        Reward::Gold { amount } => {
            emitter.emit_gold_reward(recipient.to_string(), (*amount as f64 * scale).round() as i64, side, now);
        }
        Reward::ManaGrant { amount } => {
            emitter.emit_mana_update(roster, recipient, (*amount as f64 * scale).round() as i64, now, ManaCause::Other);
        }
        Reward::DynamicScaling { stat, value_type, per_unit, permanent } => {
            emitter.emit_stat_buff(roster, recipient, *stat, per_unit * scale, *value_type, 0.0, *permanent, None, now, EventCause::Trait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::template::{RewardRecipients, Trigger};
    use crate::model::unit::{CombatUnit, Position, Stat, ValueType};

    fn unit(id: u32, side: Side) -> CombatUnit {
        CombatUnit::new(UnitId(id), "t", format!("u{id}"), side, Position::Front, 1, 100, 10, 2, 1.0, 0, 0, 0.0, 0.0, false)
    }

    fn stat_buff_effect(trigger: Trigger, trigger_once: bool, value: f64) -> ModularEffect {
        ModularEffect {
            trigger,
            trigger_once,
            chance_percent: None,
            hp_below_percent: None,
            recipients: RewardRecipients::TraitHolder,
            rewards: vec![Reward::StatBuff {
                stat: Stat::Attack,
                value,
                value_type: ValueType::Flat,
                duration: None,
                permanent: true,
            }],
        }
    }

    #[test]
    fn per_round_passive_scales_by_completed_rounds() {
        let mut roster = Roster::new(vec![unit(0, Side::A)]);
        let engine = TraitEngine::new(vec![ActiveTrait {
            side: Side::A,
            trait_name: "Order".to_string(),
            holders: vec![UnitId(0)],
            effects: vec![stat_buff_effect(Trigger::PerRound, false, 2.0)],
        }]);
        let mut emitter = Emitter::new(None);
        let mut rng = GameRng::from_seed(1);

        engine.apply_per_round(&mut emitter, &mut roster, &mut rng, 3, 0.0);

        assert_eq!(roster.get(UnitId(0)).attack(), 10 + 6, "scale 3 * value 2 = +6");
    }

    #[test]
    fn trigger_once_effect_fires_a_single_time_across_repeated_calls() {
        let mut roster = Roster::new(vec![unit(0, Side::A)]);
        let engine = TraitEngine::new(vec![ActiveTrait {
            side: Side::A,
            trait_name: "Order".to_string(),
            holders: vec![UnitId(0)],
            effects: vec![stat_buff_effect(Trigger::PerSecond, true, 5.0)],
        }]);
        let mut emitter = Emitter::new(None);
        let mut rng = GameRng::from_seed(1);

        engine.tick_per_second(&mut emitter, &mut roster, &mut rng, 1.0);
        engine.tick_per_second(&mut emitter, &mut roster, &mut rng, 2.0);
        engine.tick_per_second(&mut emitter, &mut roster, &mut rng, 3.0);

        assert_eq!(roster.get(UnitId(0)).attack(), 15, "trigger_once must only apply the +5 buff once");
    }

    #[test]
    fn on_unit_died_fires_both_the_victims_ally_trait_and_the_killers_enemy_trait() {
        let mut roster = Roster::new(vec![unit(0, Side::A), unit(1, Side::B)]);
        let engine = TraitEngine::new(vec![
            ActiveTrait {
                side: Side::A,
                trait_name: "Mourning".to_string(),
                holders: vec![UnitId(0)],
                effects: vec![stat_buff_effect(Trigger::OnAllyDeath, false, 1.0)],
            },
            ActiveTrait {
                side: Side::B,
                trait_name: "Bloodlust".to_string(),
                holders: vec![UnitId(1)],
                effects: vec![stat_buff_effect(Trigger::OnEnemyDeath, false, 1.0)],
            },
        ]);
        let mut emitter = Emitter::new(None);
        let mut rng = GameRng::from_seed(1);

        engine.on_unit_died(&mut emitter, &mut roster, &mut rng, UnitId(0), Some(UnitId(1)), 0.0);

        assert_eq!(roster.get(UnitId(0)).attack(), 11, "the victim's own side's on_ally_death trait should fire");
        assert_eq!(roster.get(UnitId(1)).attack(), 11, "the killer's side's on_enemy_death trait should fire");
    }

    #[test]
    fn check_hp_below_skips_the_unit_in_peril_as_its_own_recipient() {
        let mut roster = Roster::new(vec![unit(0, Side::A), unit(1, Side::A)]);
        roster.get_mut(UnitId(1)).hp = 10;
        let engine = TraitEngine::new(vec![ActiveTrait {
            side: Side::A,
            trait_name: "Vigil".to_string(),
            holders: vec![UnitId(0), UnitId(1)],
            effects: vec![ModularEffect {
                trigger: Trigger::OnAllyHpBelow,
                trigger_once: false,
                chance_percent: None,
                hp_below_percent: Some(50.0),
                recipients: RewardRecipients::TraitHolder,
                rewards: vec![Reward::StatBuff {
                    stat: Stat::Attack,
                    value: 3.0,
                    value_type: ValueType::Flat,
                    duration: None,
                    permanent: true,
                }],
            }],
        }]);
        let mut emitter = Emitter::new(None);
        let mut rng = GameRng::from_seed(1);

        engine.check_hp_below(&mut emitter, &mut roster, &mut rng, 0.0);

        assert_eq!(roster.get(UnitId(0)).attack(), 13, "the holder not in peril should receive the reward");
        assert_eq!(roster.get(UnitId(1)).attack(), 10, "the unit below threshold must not buff itself");
    }

    #[test]
    fn check_hp_below_trigger_once_is_scoped_per_victim_not_per_holder() {
        let mut roster = Roster::new(vec![unit(0, Side::A), unit(1, Side::A), unit(2, Side::A)]);
        roster.get_mut(UnitId(1)).hp = 10;
        let engine = TraitEngine::new(vec![ActiveTrait {
            side: Side::A,
            trait_name: "Vigil".to_string(),
            holders: vec![UnitId(0)],
            effects: vec![ModularEffect {
                trigger: Trigger::OnAllyHpBelow,
                trigger_once: true,
                chance_percent: None,
                hp_below_percent: Some(50.0),
                recipients: RewardRecipients::Victim,
                rewards: vec![Reward::Heal { amount: 20 }],
            }],
        }]);
        let mut emitter = Emitter::new(None);
        let mut rng = GameRng::from_seed(1);

        // First ally (unit 1) drops below threshold and is healed.
        engine.check_hp_below(&mut emitter, &mut roster, &mut rng, 0.0);
        assert_eq!(roster.get(UnitId(1)).hp(), 30, "the first ally to cross the threshold should be healed");

        // A second, distinct ally (unit 2) later drops below the same threshold.
        // It must receive its own trigger, not be silently skipped because the
        // holder's trigger_once key was already consumed by unit 1.
        roster.get_mut(UnitId(2)).hp = 10;
        engine.check_hp_below(&mut emitter, &mut roster, &mut rng, 1.0);
        assert_eq!(roster.get(UnitId(2)).hp(), 30, "a distinct victim must get its own independent one-time trigger");

        // Unit 1 remains below the threshold but must not be healed again.
        assert_eq!(roster.get(UnitId(1)).hp(), 30, "trigger_once must still block a repeat fire for the same victim");
    }
}

//! The combat simulator: the fixed-dt tick loop that drives a whole combat
//! from setup to a win/timeout result.
//!
//! Generalized from `arenasim`'s Bevy `FixedUpdate` schedule
//! (`states/play_match/combat_systems.rs`, run in dt-sized steps driven by
//! the engine) into a plain synchronous loop: this core has no engine
//! clock, so `Simulator::run` just advances `now` by `dt` in a `while`
//! and calls one step function per phase, in the same order the systems
//! were scheduled.

use std::collections::{HashMap, HashSet};

use crate::combat::emitter::{Emitter, EventCallback};
use crate::combat::events::{EventCause, ManaCause};
use crate::combat::executor;
use crate::combat::roster::Roster;
use crate::combat::targeting;
use crate::combat::traits::{ActiveTrait, TraitEngine};
use crate::model::skill::Skill;
use crate::model::unit::{CombatUnit, EffectKind, Side, UnitId};
use crate::rng::GameRng;

/// Tuning knobs for one combat run. Canonical defaults match the source
/// material: a tenth-second tick and a minute of simulated time.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub dt: f64,
    pub timeout: f64,
    /// Completed-round count this combat is being fought at, used to scale
    /// `per_round` trait rewards (round 3 applies with scale 3.0).
    pub completed_rounds: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            timeout: 60.0,
            completed_rounds: 1,
        }
    }
}

/// A basic attack's damage and mana-on-attack application, scheduled 0.2 s
/// after its `animation_start`. The damage figure is fixed at the moment
/// the swing is thrown, against the attacker's stats at that instant — only
/// the mutation is deferred, not the computation, so a buff landing during
/// the flight of the attack cannot retroactively change a swing already in
/// the air.
struct PendingAttack {
    attacker: UnitId,
    target: UnitId,
    damage: i64,
    mana_on_attack: i64,
    fire_at: f64,
}

/// Basic attacks carry no data-driven damage type; they are always
/// physical, distinguishing them from skill damage whose type is authored
/// per effect.
const BASIC_ATTACK_DAMAGE_TYPE: &str = "physical";

/// Animation-to-impact delay for basic attacks (spec §4.D step 6).
const BASIC_ATTACK_DELAY: f64 = 0.2;

pub struct Simulator {
    roster: Roster,
    emitter: Emitter,
    traits: TraitEngine,
    rng: GameRng,
    skills: HashMap<UnitId, Skill>,
    config: SimConfig,
    now: f64,
    pending: Vec<PendingAttack>,
    death_notified: HashSet<UnitId>,
    last_second: i64,
}

/// Final outcome of a combat run (spec §6 result record).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Side),
    Timeout { winner: Side },
}

pub struct SimulationResult {
    pub outcome: Outcome,
    pub duration: f64,
    pub events: Vec<crate::combat::events::CombatEvent>,
    pub roster: Roster,
}

impl Simulator {
    pub fn new(
        units: Vec<CombatUnit>,
        skills: HashMap<UnitId, Skill>,
        active_traits: Vec<ActiveTrait>,
        config: SimConfig,
        rng: GameRng,
        callback: Option<EventCallback>,
    ) -> Self {
        Self {
            roster: Roster::new(units),
            emitter: Emitter::new(callback),
            traits: TraitEngine::new(active_traits),
            rng,
            skills,
            config,
            now: 0.0,
            pending: Vec::new(),
            death_notified: HashSet::new(),
            last_second: -1,
        }
    }

    /// Run the combat to completion: win, or timeout.
    pub fn run(mut self) -> SimulationResult {
        self.traits
            .apply_per_round(&mut self.emitter, &mut self.roster, &mut self.rng, self.config.completed_rounds, self.now);
        self.traits.apply_per_trait(&mut self.emitter, &mut self.roster, &mut self.rng, self.now);

        loop {
            if self.now >= self.config.timeout {
                return self.finish_timeout();
            }

            self.expire_effects();
            self.dot_ticks();
            self.regen();
            self.per_second_passives();
            self.fire_due_pending_attacks();
            self.attack_phase();
            self.traits.check_hp_below(&mut self.emitter, &mut self.roster, &mut self.rng, self.now);
            self.emitter.emit_state_snapshot(&self.roster, self.now);

            if !self.roster.side_has_survivor(Side::A) {
                return self.finish_win(Side::B);
            }
            if !self.roster.side_has_survivor(Side::B) {
                return self.finish_win(Side::A);
            }

            self.now += self.config.dt;
        }
    }

    fn expire_effects(&mut self) {
        let now = self.now;
        for id in self.roster.ids().collect::<Vec<_>>() {
            loop {
                let due = self
                    .roster
                    .get(id)
                    .effects()
                    .iter()
                    .find(|e| e.expires_at <= now)
                    .map(|e| e.id);
                let Some(effect_id) = due else { break };
                self.emitter.emit_effect_expired(&mut self.roster, id, effect_id, now);
            }
        }
    }

    /// Direct field access to `effects[].next_tick_time` here (rather than
    /// through the emitter) is deliberate: the schedule is internal
    /// bookkeeping, never an authoritative value carried by an event
    /// payload — only the `damage_over_time_tick` call itself, which does
    /// go through the emitter, is player-visible state.
    fn dot_ticks(&mut self) {
        let now = self.now;
        for id in self.roster.ids().collect::<Vec<_>>() {
            if !self.roster.get(id).is_alive() {
                continue;
            }
            loop {
                if !self.roster.get(id).is_alive() {
                    break;
                }
                let due = self.roster.get(id).effects().iter().find_map(|e| {
                    if e.kind == EffectKind::DamageOverTime && e.next_tick_time.map_or(false, |t| t <= now) {
                        Some((e.id, e.damage_per_tick.unwrap_or(0), e.damage_type.clone().unwrap_or_default(), e.source, e.interval, e.duration))
                    } else {
                        None
                    }
                });
                let Some((effect_id, damage, damage_type, source, interval, duration)) = due else {
                    break;
                };

                self.emitter.emit_damage_over_time_tick(&mut self.roster, id, damage, damage_type, now);
                self.notify_if_died(id, Some(source));

                let unit = self.roster.get_mut(id);
                if let Some(e) = unit.effects.iter_mut().find(|e| e.id == effect_id) {
                    let step = interval.unwrap_or(duration.max(1.0));
                    e.next_tick_time = Some(now + step);
                }
            }
        }
    }

    fn regen(&mut self) {
        let now = self.now;
        let dt = self.config.dt;
        for id in self.roster.ids().collect::<Vec<_>>() {
            if !self.roster.get(id).is_alive() {
                continue;
            }
            let (hp_regen, mana_regen) = {
                let unit = self.roster.get(id);
                (unit.hp_regen_per_sec(), unit.mana_regen())
            };

            if hp_regen > 0.0 {
                let unit = self.roster.get_mut(id);
                unit.hp_regen_accumulator += hp_regen * dt;
                if unit.hp_regen_accumulator >= 1.0 {
                    let amount = unit.hp_regen_accumulator.floor();
                    unit.hp_regen_accumulator -= amount;
                    self.emitter.emit_heal(&mut self.roster, None, id, amount as i64, now, EventCause::Regen);
                }
            }

            if mana_regen > 0.0 {
                let unit = self.roster.get_mut(id);
                unit.mana_regen_accumulator += mana_regen * dt;
                if unit.mana_regen_accumulator >= 1.0 {
                    let amount = unit.mana_regen_accumulator.floor();
                    unit.mana_regen_accumulator -= amount;
                    self.emitter
                        .emit_mana_update(&mut self.roster, id, amount as i64, now, ManaCause::Regen);
                }
            }
        }
    }

    fn per_second_passives(&mut self) {
        let whole_second = self.now.floor() as i64;
        if whole_second <= self.last_second {
            return;
        }
        self.last_second = whole_second;
        self.traits.tick_per_second(&mut self.emitter, &mut self.roster, &mut self.rng, self.now);
    }

    fn fire_due_pending_attacks(&mut self) {
        let now = self.now;
        let mut remaining = Vec::with_capacity(self.pending.len());
        let due: Vec<PendingAttack> = std::mem::take(&mut self.pending)
            .into_iter()
            .filter_map(|p| {
                if p.fire_at <= now + 1e-9 {
                    Some(p)
                } else {
                    remaining.push(p);
                    None
                }
            })
            .collect();
        self.pending = remaining;

        for attack in due {
            if !self.roster.get(attack.target).is_alive() {
                continue;
            }
            self.emitter.emit_damage(
                &mut self.roster,
                attack.attacker,
                attack.target,
                attack.damage,
                BASIC_ATTACK_DAMAGE_TYPE,
                attack.fire_at,
                false,
                EventCause::Attack,
            );
            self.notify_if_died(attack.target, Some(attack.attacker));
            if self.roster.get(attack.attacker).is_alive() {
                self.emitter
                    .emit_mana_update(&mut self.roster, attack.attacker, attack.mana_on_attack, attack.fire_at, ManaCause::Attack);
            }
        }
    }

    fn attack_phase(&mut self) {
        let now = self.now;
        let dt = self.config.dt;
        for id in self.roster.ids().collect::<Vec<_>>() {
            let unit = self.roster.get(id);
            if !unit.is_alive() || unit.is_stunned(now) {
                continue;
            }

            let skill = self.skills.get(&id).cloned();
            if let Some(skill) = skill {
                if unit.current_mana() >= skill.mana_cost {
                    match executor::cast_skill(&mut self.emitter, &mut self.roster, &mut self.rng, &skill, id, now) {
                        Ok(()) => {}
                        Err(err) => {
                            self.emitter.emit_skill_error(id, err.to_string(), now);
                        }
                    }
                    self.notify_any_newly_dead(id);
                    continue;
                }
            }

            let trial = self.roster.get(id).attack_speed() * dt;
            if !self.rng.gen_bool(trial) {
                continue;
            }

            let back_targeting = self.roster.get(id).back_targeting();
            let Some(target) = targeting::select_basic_attack_target(&self.roster, id, back_targeting, &mut self.rng) else {
                continue;
            };

            let attacker = self.roster.get(id);
            let damage = attacker.attack();
            let mana_on_attack = attacker.mana_on_attack();

            self.emitter.emit_animation_start("basic_attack", id, target, BASIC_ATTACK_DELAY, now);
            self.pending.push(PendingAttack {
                attacker: id,
                target,
                damage,
                mana_on_attack,
                fire_at: now + BASIC_ATTACK_DELAY,
            });
        }
    }

    fn notify_if_died(&mut self, victim: UnitId, killer: Option<UnitId>) {
        if self.roster.get(victim).is_dead() && self.death_notified.insert(victim) {
            self.traits.on_unit_died(&mut self.emitter, &mut self.roster, &mut self.rng, victim, killer, self.now);
        }
    }

    /// A skill cast can kill any number of targets in one call (AOE damage,
    /// a `repeat` block, a DoT applied and immediately lethal via shield
    /// underflow is impossible but direct `damage` effects are not) — scan
    /// every unit for a death the per-effect emitter calls didn't already
    /// have a dedicated notification site for, attributing the caster as
    /// killer for each.
    fn notify_any_newly_dead(&mut self, caster: UnitId) {
        for id in self.roster.ids().collect::<Vec<_>>() {
            self.notify_if_died(id, Some(caster));
        }
    }

    fn finish_win(mut self, winner: Side) -> SimulationResult {
        self.traits.fire_on_win(&mut self.emitter, &mut self.roster, &mut self.rng, winner, self.now);
        self.traits
            .fire_on_loss(&mut self.emitter, &mut self.roster, &mut self.rng, winner.opposite(), self.now);
        SimulationResult {
            outcome: Outcome::Winner(winner),
            duration: self.now,
            events: self.emitter.into_events(),
            roster: self.roster,
        }
    }

    fn finish_timeout(mut self) -> SimulationResult {
        let hp_a: i64 = self.roster.alive(Side::A).map(|u| u.hp()).sum();
        let hp_b: i64 = self.roster.alive(Side::B).map(|u| u.hp()).sum();
        let winner = if hp_b > hp_a { Side::B } else { Side::A };

        self.traits.fire_on_win(&mut self.emitter, &mut self.roster, &mut self.rng, winner, self.now);
        self.traits
            .fire_on_loss(&mut self.emitter, &mut self.roster, &mut self.rng, winner.opposite(), self.now);
        SimulationResult {
            outcome: Outcome::Timeout { winner },
            duration: self.now,
            events: self.emitter.into_events(),
            roster: self.roster,
        }
    }
}

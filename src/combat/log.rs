//! Human-readable combat log: an ambient, non-canonical transcript kept
//! alongside the [`CombatEvent`] stream for CLI output and post-match
//! review.
//!
//! Grounded on `arenasim`'s `combat::log::CombatLog` (`CombatLogEntry`,
//! `filter_by_type`, `save_to_file`), retargeted to consume `&CombatEvent`
//! instead of an ad hoc `(CombatLogEventType, String)` pair. This is not
//! part of the trust boundary described in spec §1 — the canonical event
//! stream (`combat::events::CombatEvent`) is the sole authority; this log
//! exists purely so a human (or a CLI) can read a match back without
//! reimplementing the reconstructor.

use std::fs::{self, File};
use std::io::{self, Write};

use crate::combat::events::{CombatEvent, CombatEventKind};

/// One human-readable line derived from a canonical event.
#[derive(Debug, Clone)]
pub struct CombatLogEntry {
    pub timestamp: f64,
    pub event_type: CombatLogEventType,
    pub message: String,
}

/// Coarse category used for filtering (spec events map many-to-one here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatLogEventType {
    Damage,
    Healing,
    SkillCast,
    EffectApplied,
    EffectExpired,
    Death,
    Mana,
    MatchEvent,
}

/// Accumulates [`CombatLogEntry`] lines from a canonical event stream.
#[derive(Debug, Default)]
pub struct CombatLog {
    pub entries: Vec<CombatLogEntry>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Translate one canonical event into zero or one readable line.
    /// `animation_start` and `state_snapshot` carry no narrative content of
    /// their own and are skipped.
    pub fn record(&mut self, event: &CombatEvent) {
        let Some((event_type, message)) = describe(&event.kind) else {
            return;
        };
        self.entries.push(CombatLogEntry {
            timestamp: event.timestamp,
            event_type,
            message,
        });
    }

    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a CombatEvent>) {
        for event in events {
            self.record(event);
        }
    }

    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries.iter().filter(|e| e.event_type == event_type).collect()
    }

    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Render the whole log as plain text, the way
    /// `arenasim::combat::log::CombatLog::save_to_file` formats a
    /// `[timestamp] [TAG] message` line per entry, minus the 3D position
    /// blocks this core has no analogue for.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let tag = match entry.event_type {
                CombatLogEventType::Damage => "DMG",
                CombatLogEventType::Healing => "HEAL",
                CombatLogEventType::SkillCast => "CAST",
                CombatLogEventType::EffectApplied => "EFFECT+",
                CombatLogEventType::EffectExpired => "EFFECT-",
                CombatLogEventType::Death => "DEATH",
                CombatLogEventType::Mana => "MANA",
                CombatLogEventType::MatchEvent => "EVENT",
            };
            out.push_str(&format!("[{:>7.2}s] [{tag}] {}\n", entry.timestamp, entry.message));
        }
        out
    }

    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())
    }
}

fn describe(kind: &CombatEventKind) -> Option<(CombatLogEventType, String)> {
    match kind {
        CombatEventKind::UnitAttack {
            attacker_name,
            target_name,
            applied_damage,
            shield_absorbed,
            ..
        } => Some((
            CombatLogEventType::Damage,
            format!("{attacker_name} hits {target_name} for {applied_damage} (absorbed {shield_absorbed})"),
        )),
        CombatEventKind::UnitHeal {
            unit_name, applied_amount, ..
        } => Some((CombatLogEventType::Healing, format!("{unit_name} heals for {applied_amount}"))),
        CombatEventKind::StatBuff {
            unit_name, stat, applied_delta, permanent, ..
        } => Some((
            CombatLogEventType::EffectApplied,
            format!(
                "{unit_name} {} {} {}",
                if *applied_delta >= 0 { "gains" } else { "loses" },
                applied_delta.abs(),
                if *permanent { format!("{} (permanent)", stat.as_str()) } else { stat.as_str().to_string() },
            ),
        )),
        CombatEventKind::ShieldApplied { unit_id, amount, .. } => {
            Some((CombatLogEventType::EffectApplied, format!("unit {unit_id} shields for {amount}")))
        }
        CombatEventKind::UnitStunned { unit_name, duration, .. } => {
            Some((CombatLogEventType::EffectApplied, format!("{unit_name} is stunned for {duration:.1}s")))
        }
        CombatEventKind::DamageOverTimeApplied { unit_id, damage, interval, .. } => Some((
            CombatLogEventType::EffectApplied,
            format!("unit {unit_id} afflicted for {damage} every {interval:.1}s"),
        )),
        CombatEventKind::DamageOverTimeTick { unit_id, damage, new_hp, .. } => {
            Some((CombatLogEventType::Damage, format!("unit {unit_id} takes {damage} damage over time (hp now {new_hp})")))
        }
        CombatEventKind::EffectExpired { unit_id, .. } => {
            Some((CombatLogEventType::EffectExpired, format!("an effect on unit {unit_id} expires")))
        }
        CombatEventKind::UnitDied { unit_name, .. } => Some((CombatLogEventType::Death, format!("{unit_name} dies"))),
        CombatEventKind::ManaUpdate { unit_id, amount, .. } if *amount != 0 => {
            Some((CombatLogEventType::Mana, format!("unit {unit_id} mana changes by {amount}")))
        }
        CombatEventKind::GoldReward { recipient_id, amount, .. } => {
            Some((CombatLogEventType::MatchEvent, format!("{recipient_id} earns {amount} gold")))
        }
        CombatEventKind::SkillCast {
            caster_name, skill_name, ..
        } => Some((CombatLogEventType::SkillCast, format!("{caster_name} casts {skill_name}"))),
        CombatEventKind::SkillError { caster_id, message } => {
            Some((CombatLogEventType::MatchEvent, format!("unit {caster_id} skill error: {message}")))
        }
        CombatEventKind::ManaUpdate { .. } | CombatEventKind::AnimationStart { .. } | CombatEventKind::StateSnapshot { .. } => None,
    }
}

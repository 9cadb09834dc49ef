//! Error taxonomy for the combat core.
//!
//! Malformed descriptors are rejected before a combat starts ([`SetupError`]);
//! execution-time skill failures are recoverable and become `skill_error`
//! events rather than aborting the combat ([`SkillError`]). Invariant
//! violations inside the emitter are programming defects and `panic!`
//! instead of returning a `Result` — see `combat::emitter`.

use thiserror::Error;

/// Failures detected while parsing or validating static content
/// (skills, effects, traits, headless match configuration) before any
/// combat event is emitted.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("skill '{skill}' has no effects")]
    EmptySkill { skill: String },

    #[error("skill '{skill}' effect {index}: {reason}")]
    InvalidEffect {
        skill: String,
        index: usize,
        reason: String,
    },

    #[error("skill '{skill}' effect {index}: repeat count must be >= 1, got {count}")]
    InvalidRepeatCount {
        skill: String,
        index: usize,
        count: i64,
    },

    #[error("trait '{trait_name}' tier {tier}: {reason}")]
    InvalidTrait {
        trait_name: String,
        tier: usize,
        reason: String,
    },

    #[error("match config: {0}")]
    InvalidMatchConfig(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Execution-time skill failure. Recorded as a `skill_error` event; the
/// combat continues and the remaining effects in this skill cast are
/// skipped (spec §7).
#[derive(Debug, Clone, Error)]
pub enum SkillError {
    #[error("insufficient mana: caster has {available}, skill costs {required}")]
    InsufficientMana { available: i64, required: i64 },

    #[error("no valid targets for effect {effect_index} ({target_kind})")]
    NoValidTargets {
        effect_index: usize,
        target_kind: String,
    },

    #[error("persistent target died mid-skill with no replacement available")]
    PersistentTargetUnavailable,
}

//! Deterministic tick-based auto-battler combat core.
//!
//! Exposes the five components the trust boundary of this system is built
//! from (spec §1-§2): the data model (`model`), the canonical mutation
//! funnel (`combat::emitter`), the skill executor (`combat::executor`), the
//! tick-driven simulator (`combat::simulator`), and the independent event
//! reconstructor (`combat::reconstructor`) — plus the ambient layers a
//! production crate in this style carries regardless of what the spec
//! scopes out: JSON match configuration (`headless`), a CLI entry point
//! (`cli`), and a typed error taxonomy (`error`).
//!
//! Organized the way `arenasim` organizes itself: a library crate exposing
//! its modules for reuse and testing, plus a thin `main.rs` binary that
//! wires a CLI onto the headless runner.

pub mod cli;
pub mod combat;
pub mod error;
pub mod headless;
pub mod model;
pub mod rng;

pub use combat::events::CombatEvent;
pub use headless::{run_headless_match, HeadlessMatchConfig, MatchResult};
pub use model::unit::{CombatUnit, Side, UnitId};

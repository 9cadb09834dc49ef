//! The combat core: typed unit/skill state, the canonical mutation funnel,
//! the tick-driven simulator, and the independent event reconstructor.

pub mod emitter;
pub mod events;
pub mod executor;
pub mod log;
pub mod reconstructor;
pub mod roster;
pub mod simulator;
pub mod targeting;
pub mod traits;

pub use emitter::{Emitter, EventCallback};
pub use events::{CombatEvent, CombatEventKind, EventCause, ManaCause};
pub use roster::Roster;
pub use simulator::{Outcome, SimConfig, SimulationResult, Simulator};
pub use traits::{ActiveTrait, TraitEngine};

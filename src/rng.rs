//! Seeded random number generation for deterministic combat simulation.
//!
//! Generalized from `arenasim`'s `GameRng` (`states/play_match/components/mod.rs`):
//! a single seeded `StdRng` threaded through the simulator and the skill
//! executor so that two runs with the same seed, inputs, dt, and tick
//! schedule produce byte-identical event streams (spec §4.D "RNG").

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Seeded PRNG shared by the simulator and the skill executor.
pub struct GameRng {
    rng: StdRng,
    /// The seed this generator was constructed with, if any (recorded for
    /// reproducing a match; `None` means entropy-seeded and therefore
    /// non-reproducible).
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a deterministic generator from an explicit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a non-deterministic generator (system entropy).
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Uniform float in `[0.0, 1.0)`.
    pub fn random_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Uniform integer in `[low, high]` inclusive.
    pub fn random_range_i64(&mut self, low: i64, high: i64) -> i64 {
        self.rng.gen_range(low..=high)
    }

    /// Bernoulli trial with the given success probability (clamped to `[0, 1]`).
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Pick a uniformly random element from a non-empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

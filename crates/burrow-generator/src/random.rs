use crate::Generator;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
enum Source {
    Thread,
    Seeded(Mutex<StdRng>),
}

/// Draws uniformly random 64-bit identifiers.
///
/// With 2^64 possible values collisions are unlikely but not impossible;
/// the shortener retries on a repository conflict.
#[derive(Debug)]
pub struct RandomGenerator {
    source: Source,
}

impl RandomGenerator {
    /// Creates a generator backed by the thread-local RNG.
    pub fn new() -> Self {
        Self {
            source: Source::Thread,
        }
    }

    /// Creates a generator that yields a reproducible sequence for `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            source: Source::Seeded(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    fn next_id(&self) -> u64 {
        match &self.source {
            Source::Thread => rand::random(),
            Source::Seeded(rng) => rng.lock().random(),
        }
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    type Output = u64;

    fn generate(&self) -> Self::Output {
        self.next_id()
    }
}

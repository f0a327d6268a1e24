use crate::Generator;
use std::sync::atomic::{AtomicU64, Ordering};

/// A short code generator backed by a sequential counter.
///
/// Produces the base62 encoding of `offset`, `offset + 1`, ... and is
/// unique within a single instance. Two instances sharing an offset range
/// will collide, so give each node its own range.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
        }
    }
}

impl SeqGenerator {
    /// Creates a generator starting at zero.
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Creates a generator starting from a specific counter value.
    ///
    /// Useful for resuming from a known state or distributing
    /// counter ranges across nodes (e.g., node 1 starts at 0, node 2 at 1_000_000).
    pub fn with_offset(offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
        }
    }
}

impl Default for SeqGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for SeqGenerator {
    type Output = u64;

    fn generate(&self) -> Self::Output {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }
}

//! Per-instance deterministic PRNG.
//!
//! Each [`crate::cache::Cache`] owns one [`CacheRng`] directly rather than
//! installing/restoring state into a shared global generator: the source
//! this substrate is modeled on does the latter only because its generator
//! is a single process-wide object, and the install/draw/restore dance
//! exists purely to keep unrelated draws from perturbing a cache's sequence.
//! Giving each cache its own generator makes that dance unnecessary while
//! preserving the property that matters: same seed, same draws, regardless
//! of what else in the simulator draws random numbers in between.

use std::sync::atomic::{AtomicU64, Ordering};

/// Seed used when a cache is constructed without an explicit seed and this
/// is the first such cache in the process.
const DEFAULT_SEED: u64 = 123_456_789;

static DEFAULT_SEED_COUNTER: AtomicU64 = AtomicU64::new(DEFAULT_SEED);

/// Returns the next seed in the process-wide default-seed sequence.
///
/// Mirrors the modeling framework's habit of incrementing a static seed
/// counter once per cache constructed without an explicit seed, so that
/// caches built in construction order get distinct-but-deterministic seeds
/// instead of all collapsing onto the same default.
pub fn next_default_seed() -> u64 {
    DEFAULT_SEED_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A small, fast, seedable xorshift64 generator.
///
/// Not cryptographically secure — it is not meant to be. It exists purely
/// to make warm-up lottery draws and random-replacement victim choices
/// reproducible given a fixed seed and access stream.
#[derive(Clone, Debug)]
pub struct CacheRng {
    state: u64,
}

impl CacheRng {
    /// Builds a generator from an explicit seed. A seed of `0` is remapped
    /// to a nonzero value since xorshift cannot escape the all-zero state.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    /// Draws the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Draws a value in `0..bound`.
    ///
    /// # Panics
    ///
    /// Panics if `bound == 0`.
    pub fn next_below(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "next_below called with bound == 0");
        (self.next_u64() % bound as u64) as usize
    }

    /// Draws a value in `0..100`, used for the warm-up lottery.
    pub fn next_percent(&mut self) -> u64 {
        self.next_u64() % 100
    }
}

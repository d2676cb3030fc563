//! Random replacement excluding the current MRU way.
//!
//! Grounded on `original_source/cache.h`'s `RandomNotMRUReplacement`, whose
//! `GetVictim` asserts `reserved_mask == 0` and `NumWays > 1`, then draws
//! `way = (1 + mruWay + random() % (NumWays - 1)) % NumWays` — a random pick
//! over every way except the one currently MRU.

use super::ReplacementPolicy;
use crate::error::CheckpointError;
use crate::rng::CacheRng;

/// Random-excluding-MRU replacement policy. Does not support reservations,
/// and requires at least two ways (excluding the MRU way from a one-way set
/// would leave nothing to pick).
#[derive(Clone, Debug)]
pub struct RandomNotMruPolicy {
    num_ways: usize,
    mru: Vec<usize>,
}

impl RandomNotMruPolicy {
    /// Builds a fresh policy for a cache with `num_sets` sets of `num_ways`
    /// ways each.
    ///
    /// # Panics
    ///
    /// Panics if `num_ways < 2`.
    #[must_use]
    pub fn new(num_sets: usize, num_ways: usize) -> Self {
        assert!(num_ways > 1, "RandomNotMruPolicy requires at least two ways");
        Self {
            num_ways,
            mru: vec![0; num_sets],
        }
    }
}

impl ReplacementPolicy for RandomNotMruPolicy {
    fn get_victim(&mut self, set: usize, reserved_mask: u64, rng: &mut CacheRng) -> usize {
        assert!(
            reserved_mask == 0,
            "RandomNotMruPolicy does not support reserved ways"
        );
        let mru = self.mru[set];
        let offset = rng.next_below(self.num_ways - 1);
        (1 + mru + offset) % self.num_ways
    }

    fn make_mru(&mut self, set: usize, way: usize) {
        self.mru[set] = way;
    }

    fn make_lru(&mut self, _set: usize, _way: usize) {
        // No separate LRU ordering to perturb beyond the tracked MRU way.
    }

    fn get_mru(&self, set: usize) -> usize {
        self.mru[set]
    }

    fn get_lru(&self, set: usize, reserved_mask: u64) -> usize {
        assert!(
            reserved_mask == 0,
            "RandomNotMruPolicy does not support reserved ways"
        );
        (self.mru[set] + 1) % self.num_ways
    }

    fn save_state(&self, set: usize) -> String {
        self.mru[set].to_string()
    }

    fn restore_state(&mut self, set: usize, payload: &str) -> Result<(), CheckpointError> {
        let way = payload
            .trim()
            .parse::<usize>()
            .map_err(|_| CheckpointError::MalformedPolicyState(payload.to_owned()))?;
        self.mru[set] = way;
        Ok(())
    }
}

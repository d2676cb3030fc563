//! Uniform random replacement.
//!
//! Grounded on `original_source/cache.h`'s `RandomReplacement`, whose
//! `GetVictim` asserts `reserved_mask == 0` (this policy makes no attempt to
//! search around reservations) and otherwise just draws `random() % NumWays`.

use super::ReplacementPolicy;
use crate::error::CheckpointError;
use crate::rng::CacheRng;

/// Uniform random replacement policy. Does not support reservations.
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    num_ways: usize,
    /// The last way touched by `make_mru`, kept only so `get_mru` has
    /// something to report to the warm-up double-fill short-circuit — the
    /// policy itself draws victims independently of recency.
    last_touched: Vec<usize>,
}

impl RandomPolicy {
    /// Builds a fresh policy for a cache with `num_sets` sets of `num_ways`
    /// ways each.
    #[must_use]
    pub fn new(num_sets: usize, num_ways: usize) -> Self {
        Self {
            num_ways,
            last_touched: vec![0; num_sets],
        }
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn get_victim(&mut self, _set: usize, reserved_mask: u64, rng: &mut CacheRng) -> usize {
        assert!(reserved_mask == 0, "RandomPolicy does not support reserved ways");
        rng.next_below(self.num_ways)
    }

    fn make_mru(&mut self, set: usize, way: usize) {
        self.last_touched[set] = way;
    }

    fn make_lru(&mut self, _set: usize, _way: usize) {
        // Random replacement has no recency ordering to perturb.
    }

    fn get_mru(&self, set: usize) -> usize {
        self.last_touched[set]
    }

    fn get_lru(&self, _set: usize, reserved_mask: u64) -> usize {
        assert!(reserved_mask == 0, "RandomPolicy does not support reserved ways");
        0
    }

    fn save_state(&self, set: usize) -> String {
        self.last_touched[set].to_string()
    }

    fn restore_state(&mut self, set: usize, payload: &str) -> Result<(), CheckpointError> {
        let way = payload
            .trim()
            .parse::<usize>()
            .map_err(|_| CheckpointError::MalformedPolicyState(payload.to_owned()))?;
        self.last_touched[set] = way;
        Ok(())
    }
}

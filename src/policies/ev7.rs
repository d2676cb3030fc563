//! EV7-style not-recently-touched bitmask with wraparound reset.
//!
//! Grounded on `original_source/cache.h`'s `ev7_replacement_info<NumWays>`.
//! Each set keeps a bitmask of "recently touched" ways; `get_victim` returns
//! the first way clear in `reserved_mask | mask` when that combination isn't
//! already saturated, and `make_mru` sets the touched way's bit, resetting
//! the mask down to just that one bit once every way has been marked (the
//! wraparound that keeps the scheme from locking up once `mask` saturates).

use super::ReplacementPolicy;
use crate::error::CheckpointError;
use crate::rng::CacheRng;

/// EV7 not-recently-touched replacement policy.
#[derive(Clone, Debug)]
pub struct Ev7Policy {
    num_ways: usize,
    all_set_mask: u64,
    mask: Vec<u64>,
    /// Tracked only for `get_mru`'s benefit (see [`super::random::RandomPolicy`]
    /// for the same tradeoff) — the bitmask itself does not preserve order
    /// once more than one bit is set.
    last_touched: Vec<usize>,
}

impl Ev7Policy {
    /// Builds a fresh policy for a cache with `num_sets` sets of `num_ways`
    /// ways each.
    ///
    /// # Panics
    ///
    /// Panics if `num_ways == 0` or `num_ways > 64` (the mask is a single
    /// `u64`).
    #[must_use]
    pub fn new(num_sets: usize, num_ways: usize) -> Self {
        assert!(num_ways > 0, "Ev7Policy requires at least one way");
        assert!(num_ways <= 64, "Ev7Policy's bitmask only covers up to 64 ways");
        let all_set_mask = if num_ways == 64 {
            u64::MAX
        } else {
            (1u64 << num_ways) - 1
        };
        Self {
            num_ways,
            all_set_mask,
            mask: vec![0; num_sets],
            last_touched: vec![0; num_sets],
        }
    }

    fn find_first_clear(&self, set: usize, reserved_mask: u64) -> usize {
        assert!(
            reserved_mask != self.all_set_mask,
            "no free ways: every way is reserved"
        );
        let current_mask = reserved_mask | self.mask[set];
        let scan_mask = if current_mask == self.all_set_mask {
            reserved_mask
        } else {
            current_mask
        };
        for way in 0..self.num_ways {
            if (scan_mask >> way) & 1 == 0 {
                return way;
            }
        }
        unreachable!("find_first_clear: no clear bit despite the reservation check above")
    }
}

impl ReplacementPolicy for Ev7Policy {
    fn get_victim(&mut self, set: usize, reserved_mask: u64, _rng: &mut CacheRng) -> usize {
        self.find_first_clear(set, reserved_mask)
    }

    fn make_mru(&mut self, set: usize, way: usize) {
        self.last_touched[set] = way;
        let mask = &mut self.mask[set];
        *mask |= 1 << way;
        if *mask & self.all_set_mask == self.all_set_mask {
            *mask = 1 << way;
        }
    }

    fn make_lru(&mut self, set: usize, way: usize) {
        self.mask[set] &= !(1 << way);
    }

    fn get_mru(&self, set: usize) -> usize {
        self.last_touched[set]
    }

    fn get_lru(&self, set: usize, reserved_mask: u64) -> usize {
        self.find_first_clear(set, reserved_mask)
    }

    fn save_state(&self, set: usize) -> String {
        format!("0x{:x}", self.mask[set])
    }

    fn restore_state(&mut self, set: usize, payload: &str) -> Result<(), CheckpointError> {
        let hex = payload
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| CheckpointError::MalformedPolicyState(payload.to_owned()))?;
        let mask = u64::from_str_radix(hex, 16)
            .map_err(|_| CheckpointError::MalformedPolicyState(payload.to_owned()))?;
        self.mask[set] = mask;
        Ok(())
    }
}

//! Generalized two-level pseudo-LRU: random-at-top, tree in the middle,
//! random-at-bottom.
//!
//! Grounded on `original_source/cache.h`'s
//! `GeneralizedPseudoLRUReplacement<RandAtTop, RandAtBottom>`. The ways of a
//! set are partitioned into `rand_at_top` equally sized groups; victim
//! selection first (randomly) picks a group, then walks a [`super::plru`]
//! tree over that group's leaves, then (randomly) picks among the
//! `rand_at_bottom` ways a leaf represents. `rand_at_top == rand_at_bottom ==
//! 1` degenerates to plain tree PLRU; `rand_at_top == NumWays` degenerates to
//! uniform random.

use std::fmt::Write as _;

use super::plru::PlruTree;
use super::ReplacementPolicy;
use crate::error::CheckpointError;
use crate::rng::CacheRng;

/// Two-level PLRU replacement policy.
#[derive(Clone, Debug)]
pub struct GeneralizedPlruPolicy {
    rand_at_top: usize,
    rand_at_bottom: usize,
    ways_per_group: usize,
    leaves_per_group: usize,
    tree: PlruTree,
    /// `bits[set][group]` is that group's tree bit-vector.
    bits: Vec<Vec<Vec<bool>>>,
}

impl GeneralizedPlruPolicy {
    /// Builds a fresh policy for a cache with `num_sets` sets of `num_ways`
    /// ways each, partitioned into `rand_at_top` groups with `rand_at_bottom`
    /// ways sharing each tree leaf.
    ///
    /// # Panics
    ///
    /// Panics if `num_ways` is not evenly divisible into `rand_at_top`
    /// groups, or a group's ways are not evenly divisible among
    /// `rand_at_bottom` leaves.
    #[must_use]
    pub fn new(num_sets: usize, num_ways: usize, rand_at_top: usize, rand_at_bottom: usize) -> Self {
        assert!(rand_at_top > 0 && rand_at_bottom > 0, "group sizes must be nonzero");
        assert_eq!(
            num_ways % rand_at_top,
            0,
            "num_ways must divide evenly into rand_at_top groups"
        );
        let ways_per_group = num_ways / rand_at_top;
        assert_eq!(
            ways_per_group % rand_at_bottom,
            0,
            "each group's ways must divide evenly among rand_at_bottom leaves"
        );
        let leaves_per_group = ways_per_group / rand_at_bottom;
        let tree = PlruTree::new(leaves_per_group);
        let bits = vec![vec![vec![false; tree.num_internal_nodes()]; rand_at_top]; num_sets];
        Self {
            rand_at_top,
            rand_at_bottom,
            ways_per_group,
            leaves_per_group,
            tree,
            bits,
        }
    }

    fn decompose(&self, way: usize) -> (usize, usize) {
        let group = way / self.ways_per_group;
        let local = way % self.ways_per_group;
        let leaf = local / self.rand_at_bottom;
        (group, leaf)
    }

    fn group_fully_reserved(&self, group: usize, reserved_mask: u64) -> bool {
        (0..self.ways_per_group).all(|local| {
            let way = group * self.ways_per_group + local;
            (reserved_mask >> way) & 1 != 0
        })
    }

    fn leaf_reserved_mask(&self, group: usize, reserved_mask: u64) -> Vec<bool> {
        (0..self.leaves_per_group)
            .map(|leaf| {
                (0..self.rand_at_bottom).all(|r| {
                    let way = group * self.ways_per_group + leaf * self.rand_at_bottom + r;
                    (reserved_mask >> way) & 1 != 0
                })
            })
            .collect()
    }

    /// Shared selection logic for [`ReplacementPolicy::get_victim`] and
    /// [`ReplacementPolicy::get_lru`]. `top_start` seeds which group is tried
    /// first; `bottom_start` seeds which replica within the chosen leaf is
    /// tried first. The caller supplies randomness (or a fixed `0`) for both.
    fn resolve(
        &self,
        set: usize,
        reserved_mask: u64,
        top_start: usize,
        bottom_start: usize,
    ) -> usize {
        let mut group = top_start % self.rand_at_top;
        let first = group;
        while self.group_fully_reserved(group, reserved_mask) {
            group = (group + 1) % self.rand_at_top;
            assert!(group != first, "no free ways: every group is fully reserved");
        }
        let leaf_reserved = self.leaf_reserved_mask(group, reserved_mask);
        let leaf = self
            .tree
            .victim_with_reservations(&self.bits[set][group], &leaf_reserved);
        let base = group * self.ways_per_group + leaf * self.rand_at_bottom;
        if self.rand_at_bottom == 1 {
            return base;
        }
        let mut r = bottom_start % self.rand_at_bottom;
        let first_r = r;
        loop {
            let way = base + r;
            if (reserved_mask >> way) & 1 == 0 {
                return way;
            }
            r = (r + 1) % self.rand_at_bottom;
            assert!(r != first_r, "no free replica: every way in the leaf is reserved");
        }
    }
}

impl ReplacementPolicy for GeneralizedPlruPolicy {
    fn get_victim(&mut self, set: usize, reserved_mask: u64, rng: &mut CacheRng) -> usize {
        let top_start = if self.rand_at_top > 1 {
            rng.next_below(self.rand_at_top)
        } else {
            0
        };
        let bottom_start = if self.rand_at_bottom > 1 {
            rng.next_below(self.rand_at_bottom)
        } else {
            0
        };
        self.resolve(set, reserved_mask, top_start, bottom_start)
    }

    fn make_mru(&mut self, set: usize, way: usize) {
        let (group, leaf) = self.decompose(way);
        self.tree.make_mru(&mut self.bits[set][group], leaf);
    }

    fn make_lru(&mut self, set: usize, way: usize) {
        let (group, leaf) = self.decompose(way);
        self.tree.make_lru(&mut self.bits[set][group], leaf);
    }

    /// Returns the most-recently-used way of group `0` only. The scheme
    /// partitions recency per group rather than keeping one global order, so
    /// this is an approximation used solely by the warm-up "peer already
    /// filled" short-circuit, which only needs *some* currently-valid way.
    fn get_mru(&self, set: usize) -> usize {
        let inverted: Vec<bool> = self.bits[set][0].iter().map(|b| !b).collect();
        let leaf = self.tree.victim(&inverted);
        leaf * self.rand_at_bottom
    }

    fn get_lru(&self, set: usize, reserved_mask: u64) -> usize {
        self.resolve(set, reserved_mask, 0, 0)
    }

    fn save_state(&self, set: usize) -> String {
        let mut out = String::new();
        for (group, bits) in self.bits[set].iter().enumerate() {
            let mut word: u64 = 0;
            for (i, &b) in bits.iter().enumerate() {
                if b {
                    word |= 1 << i;
                }
            }
            if group > 0 {
                out.push(' ');
            }
            let _ = write!(out, "G{group}=0x{word:x}");
        }
        out
    }

    fn restore_state(&mut self, set: usize, payload: &str) -> Result<(), CheckpointError> {
        let groups: Vec<&str> = payload.split_whitespace().collect();
        if groups.len() != self.rand_at_top {
            return Err(CheckpointError::MalformedPolicyState(payload.to_owned()));
        }
        let mut parsed = Vec::with_capacity(self.rand_at_top);
        for (expected_group, token) in groups.iter().enumerate() {
            let rest = token
                .strip_prefix(&format!("G{expected_group}="))
                .ok_or_else(|| CheckpointError::MalformedPolicyState(payload.to_owned()))?;
            let hex = rest
                .strip_prefix("0x")
                .ok_or_else(|| CheckpointError::MalformedPolicyState(payload.to_owned()))?;
            let word = u64::from_str_radix(hex, 16)
                .map_err(|_| CheckpointError::MalformedPolicyState(payload.to_owned()))?;
            let len = self.bits[set][expected_group].len();
            parsed.push((0..len).map(|i| (word >> i) & 1 != 0).collect::<Vec<_>>());
        }
        self.bits[set] = parsed;
        Ok(())
    }
}

//! True LRU: a doubly-linked recency list per set.
//!
//! Grounded on `original_source/cache.h`'s `lru_info<NumWays>`: an `i8`
//! next/prev linked list over ways, with `mru`/`lru` pointers maintained by
//! unlink-then-splice on every `makeMRU`/`makeLRU` call.

use std::fmt::Write as _;

use super::ReplacementPolicy;
use crate::error::CheckpointError;
use crate::rng::CacheRng;

#[derive(Clone, Copy, Debug)]
struct Link {
    next: i16,
    prev: i16,
}

#[derive(Clone, Debug)]
struct SetState {
    links: Vec<Link>,
    mru: usize,
    lru: usize,
}

impl SetState {
    fn new(num_ways: usize) -> Self {
        let mut links = Vec::with_capacity(num_ways);
        for i in 0..num_ways {
            links.push(Link {
                next: if i == 0 { -1 } else { (i - 1) as i16 },
                prev: if i == num_ways - 1 { -1 } else { (i + 1) as i16 },
            });
        }
        // By convention: way 0 starts as LRU, way NumWays-1 starts as MRU.
        Self {
            links,
            mru: num_ways - 1,
            lru: 0,
        }
    }

    fn make_mru(&mut self, w: usize) {
        if self.mru == w {
            return;
        }
        let prev = self.links[w].prev;
        let next = self.links[w].next;
        if prev != -1 {
            self.links[prev as usize].next = next;
        }
        if next != -1 {
            self.links[next as usize].prev = prev;
        }
        if self.lru == w {
            self.lru = prev as usize;
        }
        self.links[w].prev = -1;
        self.links[w].next = self.mru as i16;
        self.links[self.mru].prev = w as i16;
        self.mru = w;
    }

    fn make_lru(&mut self, w: usize) {
        if self.lru == w {
            return;
        }
        let prev = self.links[w].prev;
        let next = self.links[w].next;
        if prev != -1 {
            self.links[prev as usize].next = next;
        }
        if next != -1 {
            self.links[next as usize].prev = prev;
        }
        if self.mru == w {
            self.mru = next as usize;
        }
        self.links[w].next = -1;
        self.links[w].prev = self.lru as i16;
        self.links[self.lru].next = w as i16;
        self.lru = w;
    }

    fn get_lru(&self, reserved_mask: u64) -> usize {
        let mut way = self.lru;
        while (reserved_mask >> way) & 1 != 0 {
            let prev = self.links[way].prev;
            assert!(prev != -1, "no free ways: every way is reserved");
            way = prev as usize;
        }
        way
    }
}

/// True LRU replacement policy: a per-set doubly-linked recency list.
#[derive(Clone, Debug)]
pub struct LruPolicy {
    sets: Vec<SetState>,
}

impl LruPolicy {
    /// Builds a fresh policy for a cache with `num_sets` sets of `num_ways`
    /// ways each.
    #[must_use]
    pub fn new(num_sets: usize, num_ways: usize) -> Self {
        Self {
            sets: (0..num_sets).map(|_| SetState::new(num_ways)).collect(),
        }
    }
}

impl ReplacementPolicy for LruPolicy {
    fn get_victim(&mut self, set: usize, reserved_mask: u64, _rng: &mut CacheRng) -> usize {
        self.sets[set].get_lru(reserved_mask)
    }

    fn make_mru(&mut self, set: usize, way: usize) {
        self.sets[set].make_mru(way);
    }

    fn make_lru(&mut self, set: usize, way: usize) {
        self.sets[set].make_lru(way);
    }

    fn get_mru(&self, set: usize) -> usize {
        self.sets[set].mru
    }

    fn get_lru(&self, set: usize, reserved_mask: u64) -> usize {
        self.sets[set].get_lru(reserved_mask)
    }

    fn save_state(&self, set: usize) -> String {
        let state = &self.sets[set];
        let mut out = String::from("MRU ->");
        let mut p = state.mru as i16;
        for _ in 0..state.links.len() {
            assert!(p != -1, "broken recency chain during save");
            let _ = write!(out, " {p} ->");
            p = state.links[p as usize].next;
        }
        out
    }

    fn restore_state(&mut self, set: usize, payload: &str) -> Result<(), CheckpointError> {
        let ways: Vec<usize> = payload
            .split("->")
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "MRU")
            .map(|s| {
                s.parse::<usize>()
                    .map_err(|_| CheckpointError::MalformedPolicyState(payload.to_owned()))
            })
            .collect::<Result<_, _>>()?;
        if ways.len() != self.sets[set].links.len() {
            return Err(CheckpointError::MalformedPolicyState(payload.to_owned()));
        }
        // Ways are listed MRU-first; replay make_mru back-to-front so the
        // last applied call (the one listed first) ends up MRU.
        for &way in ways.iter().rev() {
            self.sets[set].make_mru(way);
        }
        Ok(())
    }
}

//! Cache replacement policies.
//!
//! Implements the victim-selection algorithms a [`crate::cache::Cache`] can
//! be configured with. Every policy shares one contract
//! ([`ReplacementPolicy`]) so the cache body can hold a
//! `Box<dyn ReplacementPolicy + Send + Sync>` and dispatch through it
//! without knowing which algorithm is behind it — the same shape this
//! crate's teacher uses for its own (simpler) policy set.
//!
//! # Policies
//!
//! - [`lru::LruPolicy`]: true LRU, a per-set recency ordering.
//! - [`plru::PlruPolicy`]: pseudo-LRU, a binary bit-tree with precomputed
//!   masks.
//! - [`generalized_plru::GeneralizedPlruPolicy`]: two-level PLRU with
//!   configurable randomness at the top (group selection) and bottom
//!   (within-leaf tie-break).
//! - [`random::RandomPolicy`]: uniform random victim selection.
//! - [`random_not_mru::RandomNotMruPolicy`]: random victim selection biased
//!   away from the current MRU way.
//! - [`ev7::Ev7Policy`]: a not-recently-touched bitmask with wraparound
//!   reset, named for the replacement scheme it was grounded on.

/// True LRU: a doubly-linked recency list per set.
pub mod lru;

/// Pseudo-LRU: a binary bit-tree with precomputed masks.
pub mod plru;

/// Generalized two-level PLRU: random-at-top × tree × random-at-bottom.
pub mod generalized_plru;

/// Uniform random victim selection.
pub mod random;

/// Random victim selection excluding the current MRU way.
pub mod random_not_mru;

/// EV7-style not-recently-touched bitmask with wraparound reset.
pub mod ev7;

pub use ev7::Ev7Policy;
pub use generalized_plru::GeneralizedPlruPolicy;
pub use lru::LruPolicy;
pub use plru::PlruPolicy;
pub use random::RandomPolicy;
pub use random_not_mru::RandomNotMruPolicy;

use std::fmt;

use crate::error::CheckpointError;
use crate::rng::CacheRng;

/// Common contract shared by every replacement policy.
///
/// `reserved_mask` has bit `i` set when way `i` must not be chosen as a
/// victim. Policies that draw randomness do so from the `rng` passed in by
/// the owning [`crate::cache::Cache`] rather than keeping their own
/// generator, so that all of a cache's random draws come from one
/// reproducible stream.
pub trait ReplacementPolicy: fmt::Debug + Send + Sync {
    /// Selects a way to evict from `set`, honoring `reserved_mask`.
    ///
    /// # Panics
    ///
    /// Panics if every way in `set` is reserved (policy exhaustion is a
    /// fatal contract violation, not a recoverable error), or if the policy
    /// does not support reservations at all and `reserved_mask != 0`.
    fn get_victim(&mut self, set: usize, reserved_mask: u64, rng: &mut CacheRng) -> usize;

    /// Records that `way` was just accessed, making it the most-recently-used
    /// way in `set`. Idempotent if `way` is already MRU.
    fn make_mru(&mut self, set: usize, way: usize);

    /// Forces `way` to become the least-recently-used way in `set` (used by
    /// restore paths reconstructing a previously-saved ordering). Idempotent
    /// if `way` is already LRU.
    fn make_lru(&mut self, set: usize, way: usize);

    /// Returns the current most-recently-used way in `set`.
    fn get_mru(&self, set: usize) -> usize;

    /// Returns the current least-recently-used way in `set` that is not
    /// reserved.
    ///
    /// # Panics
    ///
    /// Panics if every way is reserved, or the policy does not support
    /// reservations and `reserved_mask != 0`.
    fn get_lru(&self, set: usize, reserved_mask: u64) -> usize;

    /// Serializes `set`'s replacement-policy state to a single-line payload
    /// (no leading `"S: <idx> "` — the cache body adds that).
    fn save_state(&self, set: usize) -> String;

    /// Restores `set`'s replacement-policy state from a payload previously
    /// produced by [`ReplacementPolicy::save_state`].
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::MalformedPolicyState`] if `payload` does
    /// not match the format this policy emits.
    fn restore_state(&mut self, set: usize, payload: &str) -> Result<(), CheckpointError>;
}

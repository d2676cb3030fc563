//! Cache configuration.
//!
//! Mirrors the pattern used for every other configurable unit in this
//! codebase: public fields, each defaulted through a private associated
//! function referenced by `#[serde(default = "...")]`, with a parallel
//! `impl Default` built from the same `defaults` module constants.

use serde::{Deserialize, Serialize};

use crate::line_state::Status;

/// Default values for [`CacheConfig`] fields, broken out so both the
/// `#[serde(default = ...)]` functions and `impl Default` read from one
/// source of truth.
pub mod defaults {
    /// Default associativity.
    pub const NUM_WAYS: usize = 4;
    /// Default number of sets.
    pub const NUM_LINES_PER_WAY: usize = 64;
    /// Default sub-objects per line.
    pub const NUM_OBJECTS_PER_LINE: usize = 8;
    /// Default `with_data` setting.
    pub const WITH_DATA: bool = false;
    /// Default warm-up percentage.
    pub const WARM_PERCENT: u8 = 0;
    /// Default level name, used when a config omits one entirely.
    pub const LEVEL_NAME: &str = "L1";
    /// Default level instance.
    pub const LEVEL_INSTANCE: u32 = 0;
}

/// Which replacement policy a [`CacheConfig`] selects.
///
/// Serialized the same `#[serde(rename_all = "UPPERCASE")]`-with-`alias` way
/// this codebase's other policy/prefetcher config enums are, so a config
/// file can spell a policy a couple of reasonable ways.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicyKind {
    /// True LRU (doubly-linked recency list).
    #[serde(alias = "TRUE_LRU")]
    Lru,
    /// Pseudo-LRU (binary bit-tree).
    #[serde(alias = "TREE_PLRU")]
    Plru,
    /// Generalized two-level PLRU: random-at-top × tree × random-at-bottom.
    GeneralizedPlru {
        /// Number of top-level groups.
        rand_at_top: usize,
        /// Number of ways sharing each tree leaf.
        rand_at_bottom: usize,
    },
    /// Uniform random victim selection.
    Random,
    /// Random victim selection excluding the current MRU way.
    #[serde(alias = "RANDOM_NOT_MRU", alias = "NOT_MRU")]
    RandomNotMru,
    /// EV7-style not-recently-touched bitmask with wraparound reset.
    #[serde(alias = "EV7_SCHEME")]
    Ev7,
}

/// Configuration for one [`crate::cache::Cache`] instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Associativity (ways per set).
    #[serde(default = "CacheConfig::default_num_ways")]
    pub num_ways: usize,
    /// Number of sets.
    #[serde(default = "CacheConfig::default_num_lines_per_way")]
    pub num_lines_per_way: usize,
    /// Sub-objects per line; must be a power of two.
    #[serde(default = "CacheConfig::default_num_objects_per_line")]
    pub num_objects_per_line: usize,
    /// Whether the cache holds a real data array alongside its tag array.
    #[serde(default = "CacheConfig::default_with_data")]
    pub with_data: bool,
    /// Which replacement policy to use.
    #[serde(default = "CacheConfig::default_policy")]
    pub policy: ReplacementPolicyKind,
    /// Percentage (0..=100) of lines synthesized as already-populated during
    /// warm-up; `0` disables warm-up entirely.
    #[serde(default = "CacheConfig::default_warm_percent")]
    pub warm_percent: u8,
    /// Status installed on a successful warm-up promotion.
    #[serde(default = "CacheConfig::default_initial_warmed_status")]
    pub initial_warmed_status: Status,
    /// Explicit PRNG seed. `None` draws from the process-wide default-seed
    /// counter (see [`crate::rng::next_default_seed`]).
    #[serde(default)]
    pub seed: Option<u64>,
    /// Name of this cache's level in the memory hierarchy (e.g. `"L2"`),
    /// used to key [`crate::manager::CacheManager`] lookups.
    #[serde(default = "CacheConfig::default_level_name")]
    pub level_name: String,
    /// Which instance of `level_name` this is (e.g. the L2 of core 3).
    #[serde(default = "CacheConfig::default_level_instance")]
    pub level_instance: u32,
}

impl CacheConfig {
    fn default_num_ways() -> usize {
        defaults::NUM_WAYS
    }

    fn default_num_lines_per_way() -> usize {
        defaults::NUM_LINES_PER_WAY
    }

    fn default_num_objects_per_line() -> usize {
        defaults::NUM_OBJECTS_PER_LINE
    }

    fn default_with_data() -> bool {
        defaults::WITH_DATA
    }

    fn default_policy() -> ReplacementPolicyKind {
        ReplacementPolicyKind::Lru
    }

    fn default_warm_percent() -> u8 {
        defaults::WARM_PERCENT
    }

    fn default_initial_warmed_status() -> Status {
        Status::Shared
    }

    fn default_level_name() -> String {
        defaults::LEVEL_NAME.to_owned()
    }

    fn default_level_instance() -> u32 {
        defaults::LEVEL_INSTANCE
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            num_ways: Self::default_num_ways(),
            num_lines_per_way: Self::default_num_lines_per_way(),
            num_objects_per_line: Self::default_num_objects_per_line(),
            with_data: Self::default_with_data(),
            policy: Self::default_policy(),
            warm_percent: Self::default_warm_percent(),
            initial_warmed_status: Self::default_initial_warmed_status(),
            seed: None,
            level_name: Self::default_level_name(),
            level_instance: Self::default_level_instance(),
        }
    }
}

/// A conventional four-level cache hierarchy's worth of configs.
///
/// Mirrors the existing hierarchy-config idiom even though wiring multiple
/// levels into one simulator is the caller's job, not this crate's —
/// callers that only need one cache construct a bare [`CacheConfig`]
/// directly.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheHierarchyConfig {
    /// L1 instruction cache.
    pub l1_i: CacheConfig,
    /// L1 data cache.
    pub l1_d: CacheConfig,
    /// L2 (shared or per-core, at the caller's discretion).
    pub l2: CacheConfig,
    /// L3 (last-level).
    pub l3: CacheConfig,
}

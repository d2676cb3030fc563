//! # Unit Components
//!
//! Central hub for the per-subsystem test modules, mirroring the crate's own
//! `src/` layout one file per module.


/// Tests for the replacement-policy family: LRU, PLRU, generalized two-level
/// PLRU, Random, Random-Not-MRU, and EV7.
pub mod policies;

/// Tests for the generic cache body: address decomposition, associative
/// lookup, warm-up resolution, victim selection, and checkpoint round-trips.
pub mod cache;

/// Tests for the process-wide cache manager.
pub mod manager;


/// Tests for cache configuration and its `serde` defaults.
pub mod config;

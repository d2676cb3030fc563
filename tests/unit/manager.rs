//! Cache Manager Tests.
//!
//! Verifies the process-wide `(level, index, tag) -> status` coordinator:
//! absence reads as `INVALID`, writes round-trip, `INVALID` removes an
//! entry, and different levels stay independent. Each test uses its own
//! level name so tests sharing the process-wide manager state never
//! interfere with each other.

use cachesim_core::{CacheManager, Status};

#[test]
fn absent_entry_reports_invalid() {
    assert_eq!(
        CacheManager::get_status("manager-test-absent", 0, 0xABC),
        Status::Invalid
    );
}

#[test]
fn set_then_get_round_trips() {
    CacheManager::set_status("manager-test-roundtrip", 0, 3, 0xDEAD, Status::ExclusiveClean);
    assert_eq!(
        CacheManager::get_status("manager-test-roundtrip", 3, 0xDEAD),
        Status::ExclusiveClean
    );
}

#[test]
fn setting_invalid_removes_entry() {
    CacheManager::set_status("manager-test-invalidate", 0, 1, 2, Status::Shared);
    CacheManager::set_status("manager-test-invalidate", 0, 1, 2, Status::Invalid);
    assert_eq!(
        CacheManager::get_status("manager-test-invalidate", 1, 2),
        Status::Invalid
    );
}

#[test]
fn levels_are_independent() {
    CacheManager::set_status("manager-test-l2", 0, 5, 9, Status::Shared);
    assert_eq!(CacheManager::get_status("manager-test-l3", 5, 9), Status::Invalid);
}

//! Tests for the generic cache body: address decomposition, associative
//! lookup, warm-up resolution, victim selection, and checkpoint round-trips.

use cachesim_core::config::ReplacementPolicyKind;
use cachesim_core::{Cache, CacheConfig, CacheManager, LineState, Status};

fn test_config(level_name: &str) -> CacheConfig {
    CacheConfig {
        num_ways: 4,
        num_lines_per_way: 1,
        num_objects_per_line: 1,
        with_data: false,
        policy: ReplacementPolicyKind::Lru,
        warm_percent: 0,
        initial_warmed_status: Status::Shared,
        seed: Some(1),
        level_name: level_name.to_owned(),
        level_instance: 0,
    }
}

#[test]
fn scenario_a_lru_eviction() {
    let mut cache: Cache = Cache::new(&test_config("scenario-a"));
    for (way, tag) in [0u64, 1, 2, 3].into_iter().enumerate() {
        let victim = cache.get_victim_way(0, true);
        assert_eq!(victim, way);
        let line = cache.get_way_line_state_mut(0, victim);
        line.set_tag(tag);
        line.set_status(Status::Shared);
        line.set_valid_bit(0);
        cache.make_mru(0, victim);
    }
    // Access T0 again, protecting it.
    let hit_way = cache.get_line_state(0, 0, 0, false).map(LineState::way);
    assert_eq!(hit_way, Some(0));
    cache.make_mru(0, 0);

    let victim = cache.get_victim_way(0, true);
    assert_eq!(victim, 1, "way 1 (T1) should be evicted, not T0");
}

#[test]
fn scenario_b_reserved_way_is_skipped() {
    let config = test_config("scenario-b-2");
    let mut cache: Cache = Cache::new(&CacheConfig {
        num_ways: 2,
        ..config
    });
    cache.get_way_line_state_mut(0, 0).set_tag(0xAAA);
    cache.get_way_line_state_mut(0, 0).set_status(Status::Reserved);
    assert_eq!(cache.get_victim_way(0, true), 1);

    cache.get_way_line_state_mut(0, 1).set_tag(0xBBB);
    cache.get_way_line_state_mut(0, 1).set_status(Status::Shared);
    cache.get_way_line_state_mut(0, 1).set_valid_bit(0);
    assert_eq!(cache.get_victim_way(0, true), 1, "way 0 is still reserved");
}

#[test]
fn scenario_c_warm_resolution_promotes_to_hit() {
    let mut cache: Cache = Cache::new(&CacheConfig {
        num_ways: 4,
        num_lines_per_way: 1,
        num_objects_per_line: 1,
        with_data: false,
        policy: ReplacementPolicyKind::Lru,
        warm_percent: 100,
        initial_warmed_status: Status::Shared,
        seed: Some(7),
        level_name: "scenario-c".to_owned(),
        level_instance: 0,
    });

    let line = cache.get_line_state(0, 0xABC, 42, false);
    assert!(line.is_some());
    let line = line.unwrap();
    assert_eq!(line.status(), Status::Shared);
    assert!(line.valid_bit(0));
    assert_eq!(line.owner_id(), 42);
    assert_eq!(
        CacheManager::get_status("scenario-c", 0, 0xABC),
        Status::Shared
    );
}

#[test]
fn scenario_d_warm_suppressed_by_peer() {
    CacheManager::set_status("scenario-d", 1, 0, 0xABC, Status::ExclusiveClean);
    let mut cache: Cache = Cache::new(&CacheConfig {
        num_ways: 4,
        num_lines_per_way: 1,
        num_objects_per_line: 1,
        with_data: false,
        policy: ReplacementPolicyKind::Lru,
        warm_percent: 100,
        initial_warmed_status: Status::Shared,
        seed: Some(7),
        level_name: "scenario-d".to_owned(),
        level_instance: 0,
    });

    let line = cache.get_line_state(0, 0xABC, 42, false);
    assert!(line.is_none(), "warm-up must be suppressed by the peer entry");
}

#[test]
fn scenario_f_checkpoint_round_trip() {
    let mut cache: Cache = Cache::new(&CacheConfig {
        num_ways: 4,
        num_lines_per_way: 16,
        num_objects_per_line: 1,
        with_data: false,
        policy: ReplacementPolicyKind::Lru,
        warm_percent: 0,
        initial_warmed_status: Status::Shared,
        seed: Some(1),
        level_name: "scenario-f".to_owned(),
        level_instance: 0,
    });

    {
        let line = cache.get_way_line_state_mut(0, 0);
        line.set_tag(0x10);
        line.set_status(Status::Shared);
        line.set_valid_bit(0);
    }
    {
        let line = cache.get_way_line_state_mut(1, 1);
        line.set_tag(0x20);
        line.set_status(Status::ExclusiveDirty);
        line.set_valid_bit(0);
        line.set_dirty_bit(0);
    }
    {
        let line = cache.get_way_line_state_mut(2, 2);
        line.set_tag(0x30);
        line.set_status(Status::Reserved);
        line.set_valid_bit(0);
    }

    let mut saved = String::new();
    cache.save_cache_state(&mut saved).unwrap();

    cache.clear_all_lines();
    cache.restore_cache_state(&saved).unwrap();

    assert_eq!(cache.get_way_line_state(0, 0).status(), Status::Shared);
    assert_eq!(cache.get_way_line_state(0, 0).tag(), 0x10);
    assert_eq!(cache.get_way_line_state(1, 1).status(), Status::ExclusiveDirty);
    assert!(cache.get_way_line_state(1, 1).dirty_bit(0));
    assert_eq!(
        cache.get_way_line_state(2, 2).status(),
        Status::Invalid,
        "a RESERVED line at save time restores as INVALID"
    );
}

#[test]
fn clear_all_lines_invalidates_without_clearing_tags() {
    let mut cache: Cache = Cache::new(&test_config("clear-all"));
    cache.get_way_line_state_mut(0, 0).set_tag(0x99);
    cache.get_way_line_state_mut(0, 0).set_status(Status::Shared);
    cache.clear_all_lines();
    assert_eq!(cache.get_way_line_state(0, 0).status(), Status::Invalid);
    assert_eq!(cache.get_way_line_state(0, 0).tag(), 0x99, "tag is untouched");
}

#[test]
fn with_data_writes_require_valid_bit() {
    let mut cache: Cache<u32> = Cache::new(&CacheConfig {
        with_data: true,
        num_objects_per_line: 2,
        ..test_config("data")
    });
    cache.get_way_line_state_mut(0, 0).set_valid_bit(0);
    cache.get_way_line_state_mut(0, 0).set_valid_bit(1);
    cache.set_line_data(0, 0, &[11, 22]);
    assert_eq!(cache.get_line_data(0, 0), Some(&[11, 22][..]));
    assert!(cache.get_way_line_state(0, 0).dirty_bit(0));
}

#[test]
#[should_panic(expected = "is not valid")]
fn writing_data_to_an_invalid_object_panics() {
    let mut cache: Cache<u32> = Cache::new(&CacheConfig {
        with_data: true,
        num_objects_per_line: 1,
        ..test_config("data-invalid")
    });
    cache.set_line_data(0, 0, &[1]);
}

#[test]
fn address_round_trip_classical() {
    let cache: Cache = Cache::new(&CacheConfig {
        num_ways: 4,
        num_lines_per_way: 64,
        num_objects_per_line: 8,
        ..test_config("addr")
    });
    let addr: u64 = 0x1234_5600;
    let index = cache.classical_index(addr);
    let tag = cache.classical_tag(addr);
    let rebuilt = cache.classical_original(index, tag);
    assert_eq!(rebuilt, addr & !((8u64 * 8) - 1));
}

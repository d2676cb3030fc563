//! Cache Configuration Tests.
//!
//! Verifies `CacheConfig`'s `serde` defaults, policy aliasing, and the
//! independent defaulting of a `CacheHierarchyConfig`'s four levels.

use cachesim_core::config::defaults;
use cachesim_core::{CacheConfig, CacheHierarchyConfig, ReplacementPolicyKind};

#[test]
fn default_config_round_trips_through_json() {
    let config = CacheConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: CacheConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.num_ways, config.num_ways);
    assert_eq!(back.policy, config.policy);
}

#[test]
fn empty_object_fills_in_defaults() {
    let config: CacheConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.num_ways, defaults::NUM_WAYS);
    assert_eq!(config.level_name, defaults::LEVEL_NAME);
    assert_eq!(config.policy, ReplacementPolicyKind::Lru);
}

#[test]
fn policy_alias_is_accepted() {
    let config: CacheConfig = serde_json::from_str(r#"{"policy": "TRUE_LRU"}"#).unwrap();
    assert_eq!(config.policy, ReplacementPolicyKind::Lru);
}

#[test]
fn generalized_plru_struct_variant_parses() {
    let config: CacheConfig = serde_json::from_str(
        r#"{"policy": {"GENERALIZED_PLRU": {"rand_at_top": 2, "rand_at_bottom": 1}}}"#,
    )
    .unwrap();
    assert_eq!(
        config.policy,
        ReplacementPolicyKind::GeneralizedPlru {
            rand_at_top: 2,
            rand_at_bottom: 1
        }
    );
}

#[test]
fn hierarchy_config_defaults_independently() {
    let hierarchy = CacheHierarchyConfig::default();
    assert_eq!(hierarchy.l1_i.num_ways, defaults::NUM_WAYS);
    assert_eq!(hierarchy.l3.num_ways, defaults::NUM_WAYS);
}

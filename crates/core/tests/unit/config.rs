//! # Configuration Tests
//!
//! Defaults, JSON deserialization, presets, name parsing and validation.

use ossim_core::common::{ConfigError, SimError};
use ossim_core::config::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.general.seed, 42);
    assert_eq!(config.general.workload_size, 15);
    assert_eq!(config.general.tick_budget, 200);
    assert_eq!(config.general.max_ticks, 10_000);
    assert_eq!(config.general.burst_min, 5);
    assert_eq!(config.general.burst_max, 20);
    assert_eq!(config.scheduler.quantum, 3);
    assert_eq!(config.io.duration, 2);
}

#[test]
fn test_memory_config_defaults() {
    let memory = MemoryConfig::default();
    assert_eq!(memory.total_size, 1024);
    assert_eq!(memory.mode, MemoryMode::Contiguous);
    assert_eq!(memory.placement, PlacementPolicy::FirstFit);
    assert_eq!(memory.page_size, 64);
    assert_eq!(memory.eviction, EvictionPolicy::None);
    assert!(!memory.rollback_partial);
}

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

// ══════════════════════════════════════════════════════════
// 2. JSON
// ══════════════════════════════════════════════════════════

#[test]
fn test_empty_json_gives_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.memory.total_size, 1024);
    assert_eq!(config.scheduler.quantum, 3);
}

#[test]
fn test_partial_json_overrides_only_given_fields() {
    let json = r#"{
        "general": { "seed": 9, "workload_size": 3 },
        "memory": {
            "mode": "paged", "page_size": 32, "eviction": "fifo", "rollback_partial": true
        },
        "io": { "duration": 4 }
    }"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(config.general.seed, 9);
    assert_eq!(config.general.workload_size, 3);
    assert_eq!(config.general.tick_budget, 200);
    assert_eq!(config.memory.mode, MemoryMode::Paged);
    assert_eq!(config.memory.page_size, 32);
    assert_eq!(config.memory.eviction, EvictionPolicy::Fifo);
    assert!(config.memory.rollback_partial);
    assert_eq!(config.io.duration, 4);
}

#[test]
fn test_placement_json_names() {
    let config = Config::from_json(r#"{ "memory": { "placement": "worst" } }"#).unwrap();
    assert_eq!(config.memory.placement, PlacementPolicy::WorstFit);
    let config = Config::from_json(r#"{ "memory": { "placement": "BestFit" } }"#).unwrap();
    assert_eq!(config.memory.placement, PlacementPolicy::BestFit);
}

#[test]
fn test_unknown_mode_is_parse_error() {
    let err = Config::from_json(r#"{ "memory": { "mode": "segmented" } }"#).unwrap_err();
    assert!(matches!(err, SimError::Parse(_)));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = Config::from_json("{ not json").unwrap_err();
    assert!(matches!(err, SimError::Parse(_)));
}

#[test]
fn test_invalid_value_in_json_is_config_error() {
    let err = Config::from_json(r#"{ "scheduler": { "quantum": 0 } }"#).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::ZeroQuantum)));
}

// ══════════════════════════════════════════════════════════
// 3. Presets and names
// ══════════════════════════════════════════════════════════

#[rstest]
#[case("contiguous-first", MemoryMode::Contiguous, PlacementPolicy::FirstFit, EvictionPolicy::None)]
#[case("contiguous-best", MemoryMode::Contiguous, PlacementPolicy::BestFit, EvictionPolicy::None)]
#[case("paged", MemoryMode::Paged, PlacementPolicy::FirstFit, EvictionPolicy::None)]
#[case("paged-fifo", MemoryMode::Paged, PlacementPolicy::FirstFit, EvictionPolicy::Fifo)]
fn test_presets(
    #[case] name: &str,
    #[case] mode: MemoryMode,
    #[case] placement: PlacementPolicy,
    #[case] eviction: EvictionPolicy,
) {
    let preset: Preset = name.parse().unwrap();
    let config = Config::preset(preset);
    assert_eq!(config.memory.mode, mode);
    assert_eq!(config.memory.placement, placement);
    assert_eq!(config.memory.eviction, eviction);
    assert_eq!(config.memory.total_size, 1024);
    assert_eq!(config.memory.page_size, 64);
    assert_eq!(config.general.tick_budget, 150);
    assert_eq!(config.general.workload_size, 18);
    assert!(config.validate().is_ok());
}

#[test]
fn test_unknown_preset() {
    let err = "paged-lru".parse::<Preset>().unwrap_err();
    assert_eq!(err, ConfigError::UnknownPreset("paged-lru".to_string()));
}

#[rstest]
#[case("contiguous", MemoryMode::Contiguous)]
#[case("Paged", MemoryMode::Paged)]
#[case("paging", MemoryMode::Paged)]
fn test_mode_from_str(#[case] name: &str, #[case] expected: MemoryMode) {
    assert_eq!(name.parse::<MemoryMode>().unwrap(), expected);
}

#[rstest]
#[case("first", PlacementPolicy::FirstFit)]
#[case("best_fit", PlacementPolicy::BestFit)]
#[case("WORST", PlacementPolicy::WorstFit)]
fn test_placement_from_str(#[case] name: &str, #[case] expected: PlacementPolicy) {
    assert_eq!(name.parse::<PlacementPolicy>().unwrap(), expected);
}

#[test]
fn test_bad_names_are_rejected() {
    assert_eq!(
        "buddy".parse::<PlacementPolicy>().unwrap_err(),
        ConfigError::UnknownPlacement("buddy".to_string())
    );
    assert_eq!(
        "lru".parse::<EvictionPolicy>().unwrap_err(),
        ConfigError::UnknownEviction("lru".to_string())
    );
    assert_eq!(
        "flat".parse::<MemoryMode>().unwrap_err(),
        ConfigError::UnknownMode("flat".to_string())
    );
}

// ══════════════════════════════════════════════════════════
// 4. Validation
// ══════════════════════════════════════════════════════════

fn rejected(edit: impl FnOnce(&mut Config)) -> ConfigError {
    let mut config = Config::default();
    edit(&mut config);
    config.validate().unwrap_err()
}

#[test]
fn test_validate_zero_memory() {
    assert_eq!(rejected(|c| c.memory.total_size = 0), ConfigError::ZeroMemory);
}

#[test]
fn test_validate_page_size_only_checked_in_paged_mode() {
    let mut config = Config::default();
    config.memory.page_size = 0;
    assert!(config.validate().is_ok());

    config.memory.mode = MemoryMode::Paged;
    assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroPageSize);
}

#[test]
fn test_validate_page_larger_than_memory() {
    let err = rejected(|c| {
        c.memory.mode = MemoryMode::Paged;
        c.memory.total_size = 32;
        c.memory.page_size = 64;
    });
    assert_eq!(
        err,
        ConfigError::PageLargerThanMemory {
            page_size: 64,
            total: 32
        }
    );
}

#[test]
fn test_validate_scheduler_and_workload() {
    assert_eq!(rejected(|c| c.scheduler.quantum = 0), ConfigError::ZeroQuantum);
    assert_eq!(rejected(|c| c.general.workload_size = 0), ConfigError::EmptyWorkload);
    assert_eq!(rejected(|c| c.general.tick_budget = 0), ConfigError::ZeroTickBudget);
    assert_eq!(rejected(|c| c.io.duration = 0), ConfigError::ZeroIoDuration);
}

#[rstest]
#[case(0, 5)]
#[case(10, 5)]
fn test_validate_burst_range(#[case] min: u64, #[case] max: u64) {
    let err = rejected(|c| {
        c.general.burst_min = min;
        c.general.burst_max = max;
    });
    assert_eq!(err, ConfigError::InvalidBurstRange { min, max });
}

#[rstest]
#[case(0.0, 0.3)]
#[case(0.5, 0.2)]
#[case(0.1, 1.5)]
fn test_validate_demand_fractions(#[case] min: f64, #[case] max: f64) {
    let err = rejected(|c| {
        c.general.demand_min_fraction = min;
        c.general.demand_max_fraction = max;
    });
    assert!(matches!(err, ConfigError::InvalidDemandFractions { .. }));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        ConfigError::ZeroQuantum.to_string(),
        "quantum must be at least one tick"
    );
    let err = SimError::from(ConfigError::ZeroMemory);
    assert_eq!(
        err.to_string(),
        "invalid configuration: total memory size must be greater than zero"
    );
}

//! # Configuration Tests
//!
//! Defaults, partial JSON deserialization, and file loading.

use pretty_assertions::assert_eq;
use simwire_core::common::error::ConfigError;
use simwire_core::common::units::{Frequency, MemSize};
use simwire_core::config::*;
use tempfile::TempDir;

use crate::common::fixtures::write_file;

#[test]
fn test_system_config_defaults() {
    let system = SystemConfig::default();
    assert_eq!(system.mem_size, MemSize::mib(512));
    assert_eq!(system.cacheline_size, 64);
    assert_eq!(system.sys_clock, Frequency::ghz(1));
    assert_eq!(system.cpu_clock, Frequency::ghz(2));
    assert_eq!(system.sys_voltage.volts(), 1.0);
    assert_eq!(system.num_cpus, 1);
}

#[test]
fn test_cpu_config_defaults() {
    let cpu = CpuConfig::default();
    assert_eq!(cpu.cpu_type, "AtomicSimpleCPU");
    assert_eq!(cpu.bp_type, None);
    assert_eq!(cpu.indirect_bp_type, None);
    assert!(!cpu.smt);
    assert!(!cpu.checker);
    assert!(!cpu.simpoint_profile);
    assert!(!cpu.wait_gdb);
    assert_eq!(cpu.simpoint_interval, 100_000_000);
}

#[test]
fn test_cache_hierarchy_defaults() {
    let caches = CacheHierarchyConfig::default();
    assert!(!caches.caches);
    assert!(!caches.l2cache);
    assert_eq!(caches.l1i, CacheSelection::preset("L1ICache"));
    assert_eq!(caches.l1d, CacheSelection::preset("L1DCache"));
    assert_eq!(caches.l2, CacheSelection::preset("L2Cache"));
}

#[test]
fn test_memory_and_run_defaults() {
    assert_eq!(MemoryConfig::default().mem_type, "DDR3_1600_8x8");

    let run = RunConfig::default();
    assert_eq!(run.backend, BackendKind::DryRun);
    assert_eq!(run.outdir.to_str(), Some("m5out"));
    assert_eq!(run.stats_file, "stats.txt");
    assert_eq!(run.abs_max_tick, None);
    assert_eq!(run.simulator, None);
    assert!(run.simulator_args.is_empty());
    assert!(run.traces.is_empty());
}

#[test]
fn test_empty_json_is_default() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_section_keeps_field_defaults() {
    let config: Config = serde_json::from_str(r#"{ "system": { "num_cpus": 4 } }"#).unwrap();
    assert_eq!(config.system.num_cpus, 4);
    assert_eq!(config.system.mem_size, MemSize::mib(512));
    assert_eq!(config.system.cpu_clock, Frequency::ghz(2));
}

#[test]
fn test_cache_overrides_deserialize() {
    let json = r#"{
        "caches": {
            "caches": true,
            "l1d": { "preset": "L1DCache", "size": "64kB", "assoc": 4, "replacement": "TreePLRURP" }
        }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let l1d = &config.caches.l1d;
    assert_eq!(l1d.size, Some(MemSize::kib(64)));
    assert_eq!(l1d.assoc, Some(4));
    assert_eq!(l1d.replacement, Some(ReplacementPolicy::TreePlru));
    assert_eq!(config.caches.l1i, CacheSelection::preset("L1ICache"));
}

#[test]
fn test_replacement_policy_aliases() {
    for (text, policy) in [
        ("\"LRU\"", ReplacementPolicy::Lru),
        ("\"FIFORP\"", ReplacementPolicy::Fifo),
        ("\"Random\"", ReplacementPolicy::Random),
        ("\"MRU\"", ReplacementPolicy::Mru),
        ("\"PLRU\"", ReplacementPolicy::TreePlru),
    ] {
        assert_eq!(serde_json::from_str::<ReplacementPolicy>(text).unwrap(), policy);
    }
    assert_eq!(ReplacementPolicy::Lru.name(), "LRURP");
}

#[test]
fn test_backend_kind_is_kebab_case() {
    let run: RunConfig = serde_json::from_str(r#"{ "backend": "dry-run" }"#).unwrap();
    assert_eq!(run.backend, BackendKind::DryRun);
    let run: RunConfig = serde_json::from_str(r#"{ "backend": "replay" }"#).unwrap();
    assert_eq!(run.backend, BackendKind::Replay);
}

#[test]
fn test_bad_quantity_is_a_parse_error() {
    let err = serde_json::from_str::<Config>(r#"{ "system": { "cpu_clock": "fast" } }"#);
    assert!(err.is_err());
}

#[test]
fn test_config_round_trips_through_json() {
    let mut config = Config::default();
    config.system.mem_size = MemSize::mib(8192);
    config.cpu.cpu_type = "X86O3CPU".into();
    config.caches.l2.size = Some(MemSize::mib(1));
    let text = serde_json::to_string(&config).unwrap();
    let back: Config = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_from_json_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "sim.json",
        r#"{ "cpu": { "cpu_type": "DerivO3CPU", "smt": true }, "run": { "outdir": "out" } }"#,
    );
    let config = Config::from_json_file(&path).unwrap();
    assert_eq!(config.cpu.cpu_type, "DerivO3CPU");
    assert!(config.cpu.smt);
    assert_eq!(config.run.outdir.to_str(), Some("out"));
}

#[test]
fn test_from_json_file_errors() {
    let dir = TempDir::new().unwrap();
    let missing = Config::from_json_file(dir.path().join("none.json")).unwrap_err();
    assert!(matches!(missing, ConfigError::Read { .. }));

    let bad = write_file(dir.path(), "bad.json", "{ not json");
    let err = Config::from_json_file(&bad).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

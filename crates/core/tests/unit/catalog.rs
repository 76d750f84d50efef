//! Catalog Tests.
//!
//! Name lookups, class/ISA metadata, and unknown-name errors.

use pretty_assertions::assert_eq;
use rstest::rstest;
use simwire_core::Catalog;
use simwire_core::catalog::{CpuClass, Isa, MemMode, MemoryTiming};
use simwire_core::common::error::CatalogError;
use simwire_core::common::units::MemSize;
use simwire_core::config::ReplacementPolicy;

#[rstest]
#[case("AtomicSimpleCPU", CpuClass::AtomicSimple, Isa::Any)]
#[case("TimingSimpleCPU", CpuClass::TimingSimple, Isa::Any)]
#[case("MinorCPU", CpuClass::Minor, Isa::Any)]
#[case("DerivO3CPU", CpuClass::O3, Isa::Any)]
#[case("X86O3CPU", CpuClass::O3, Isa::X86)]
#[case("RiscvMinorCPU", CpuClass::Minor, Isa::Riscv)]
#[case("ArmTimingSimpleCPU", CpuClass::TimingSimple, Isa::Arm)]
fn cpu_models_resolve(#[case] name: &str, #[case] class: CpuClass, #[case] isa: Isa) {
    let catalog = Catalog::builtin();
    let model = catalog.cpu(name).unwrap();
    assert_eq!(model.name, name);
    assert_eq!(model.class, class);
    assert_eq!(model.isa, isa);
}

#[test]
fn memory_mode_follows_cpu_class() {
    assert_eq!(CpuClass::AtomicSimple.memory_mode(), MemMode::Atomic);
    assert_eq!(CpuClass::TimingSimple.memory_mode(), MemMode::Timing);
    assert_eq!(CpuClass::Minor.memory_mode(), MemMode::Timing);
    assert_eq!(CpuClass::O3.memory_mode(), MemMode::Timing);
}

#[test]
fn only_o3_class_is_o3() {
    let catalog = Catalog::builtin();
    let o3: Vec<&str> = catalog
        .cpus()
        .filter(|m| Catalog::is_o3_cpu(m))
        .map(|m| m.name)
        .collect();
    assert!(o3.contains(&"DerivO3CPU"));
    assert!(o3.iter().all(|n| n.contains("O3")));
}

#[test]
fn isa_compatibility() {
    assert!(Isa::Any.runs(Isa::X86));
    assert!(Isa::Riscv.runs(Isa::Riscv));
    assert!(!Isa::X86.runs(Isa::Arm));
}

#[test]
fn l1_presets_match_driver_defaults() {
    let catalog = Catalog::builtin();
    for name in ["L1ICache", "L1DCache"] {
        let p = catalog.cache(name).unwrap();
        assert_eq!(p.size, MemSize::kib(16));
        assert_eq!(p.assoc, 2);
        assert_eq!((p.tag_latency, p.data_latency, p.response_latency), (2, 2, 2));
        assert_eq!((p.mshrs, p.tgts_per_mshr), (4, 20));
        assert_eq!(p.replacement, ReplacementPolicy::Random);
    }
    let l2 = catalog.cache("L2Cache").unwrap();
    assert_eq!(l2.size, MemSize::kib(256));
    assert_eq!(l2.assoc, 8);
    assert_eq!(l2.tag_latency, 20);
    assert_eq!(l2.replacement, ReplacementPolicy::Lru);
}

#[test]
fn memory_parts_carry_timing() {
    let catalog = Catalog::builtin();
    let ddr3 = catalog.memory("DDR3_1600_8x8").unwrap();
    assert!(matches!(
        ddr3.timing,
        MemoryTiming::Dram {
            t_cl: 13_750,
            row_buffer_bytes: 8192,
            ..
        }
    ));
    let simple = catalog.memory("SimpleMemory").unwrap();
    assert!(matches!(simple.timing, MemoryTiming::Simple { .. }));
}

#[test]
fn predictors_are_listed() {
    let catalog = Catalog::builtin();
    assert!(catalog.branch_predictor("TournamentBP").is_ok());
    assert!(catalog.indirect_predictor("ITTAGE").is_ok());
    assert_eq!(catalog.branch_predictors().count(), 7);
    assert_eq!(catalog.indirect_predictors().count(), 2);
    assert_eq!(catalog.memories().count(), 6);
}

#[rstest]
#[case::cpu("cpu", "CPU type")]
#[case::bp("bp", "branch predictor type")]
#[case::ibp("ibp", "indirect branch predictor type")]
#[case::cache("cache", "cache preset")]
#[case::mem("mem", "memory type")]
fn unknown_names_list_alternatives(#[case] which: &str, #[case] expected_kind: &str) {
    let catalog = Catalog::builtin();
    let err = match which {
        "cpu" => catalog.cpu("PentiumCPU").map(|_| ()),
        "bp" => catalog.branch_predictor("PentiumCPU").map(|_| ()),
        "ibp" => catalog.indirect_predictor("PentiumCPU").map(|_| ()),
        "cache" => catalog.cache("PentiumCPU").map(|_| ()),
        _ => catalog.memory("PentiumCPU").map(|_| ()),
    }
    .unwrap_err();

    let CatalogError::Unknown {
        kind,
        name,
        available,
    } = &err;
    assert_eq!(*kind, expected_kind);
    assert_eq!(name, "PentiumCPU");
    assert!(!available.is_empty());
    assert!(err.to_string().contains("is not a valid"));
}

//! Topology Builder Tests.
//!
//! Verifies the standard machine: domains, buses, CPUs and their workload assignment,
//! optional cache levels, x86 interrupt controllers, and configuration errors.

use pretty_assertions::assert_eq;
use rstest::rstest;
use simwire_core::Config;
use simwire_core::catalog::MemMode;
use simwire_core::common::error::BuildError;
use simwire_core::common::units::MemSize;
use simwire_core::config::ReplacementPolicy;
use simwire_core::graph::{CacheParams, CpuParams, ObjectKind, PortRef, Route, SystemGraph};

use crate::common::fixtures::Fixture;

fn cpu_at<'g>(g: &'g SystemGraph, path: &str) -> &'g CpuParams {
    let id = g.find(path).unwrap_or_else(|| panic!("{path} missing"));
    match &g.object(id).unwrap().kind {
        ObjectKind::Cpu(p) => p,
        other => panic!("{path} is {}", other.type_name()),
    }
}

fn cache_at(g: &SystemGraph, path: &str) -> CacheParams {
    let id = g.find(path).unwrap_or_else(|| panic!("{path} missing"));
    match &g.object(id).unwrap().kind {
        ObjectKind::Cache(p) => *p,
        other => panic!("{path} is {}", other.type_name()),
    }
}

fn route_of(g: &SystemGraph, cpu: &str, port: &'static str) -> Vec<String> {
    let object = g.find(cpu).unwrap();
    match g.route(PortRef { object, port }) {
        Route::Reached(ids) => ids.into_iter().map(|id| g.path(id)).collect(),
        other => panic!("{cpu}.{port}: {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════
// 1. Default machine
// ══════════════════════════════════════════════════════════

#[test]
fn default_machine_connects_cpu_to_membus() {
    let f = Fixture::riscv();
    let g = f.build(&Config::default(), 1).unwrap();

    for path in [
        "system",
        "system.membus",
        "system.clk_domain",
        "system.cpu_clk_domain",
        "system.cpu",
        "system.mem_ctrl",
        "system.mem_ctrl.dram",
        "system.workload",
    ] {
        assert!(g.find(path).is_some(), "{path} missing");
    }
    assert_eq!(g.find("system.l2bus"), None);
    assert_eq!(g.find("system.cpu.interrupts"), None);
    assert_eq!(
        route_of(&g, "system.cpu", "icache_port"),
        vec!["system.membus", "system.mem_ctrl"]
    );
}

#[test]
fn memory_mode_follows_cpu_class() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    let system = f.freeze(&config, 1);
    assert_eq!(system.system_params().mem_mode, MemMode::Atomic);

    config.cpu.cpu_type = "TimingSimpleCPU".into();
    let system = f.freeze(&config, 1);
    assert_eq!(system.system_params().mem_mode, MemMode::Timing);
}

#[test]
fn memory_range_spans_mem_size() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.system.mem_size = MemSize::mib(8192);
    let system = f.freeze(&config, 1);

    let ranges = &system.system_params().mem_ranges;
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].size(), 8192 << 20);
    let (_, part, range) = system.mem_interfaces().next().unwrap();
    assert_eq!(part.name, "DDR3_1600_8x8");
    assert_eq!(range, ranges[0]);
}

#[test]
fn x86_cpus_get_interrupt_controllers() {
    let f = Fixture::x86();
    let g = f.build(&Config::default(), 1).unwrap();
    let irq = g.find("system.cpu.interrupts").unwrap();
    assert_eq!(g.object(irq).unwrap().kind.type_name(), "X86LocalApic");
    assert!(g.freeze().is_ok());
}

// ══════════════════════════════════════════════════════════
// 2. Cache hierarchy
// ══════════════════════════════════════════════════════════

#[test]
fn private_l1s_and_shared_l2() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.caches.caches = true;
    config.caches.l2cache = true;
    let g = f.build(&config, 1).unwrap();

    assert_eq!(
        route_of(&g, "system.cpu", "dcache_port"),
        vec![
            "system.cpu.dcache",
            "system.l2bus",
            "system.l2cache",
            "system.membus",
            "system.mem_ctrl"
        ]
    );
    assert_eq!(route_of(&g, "system.cpu", "icache_port")[0], "system.cpu.icache");
    assert_eq!(cache_at(&g, "system.l2cache").size, MemSize::kib(256));
}

#[test]
fn l1s_without_l2_use_membus() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.caches.caches = true;
    let g = f.build(&config, 1).unwrap();

    assert_eq!(
        route_of(&g, "system.cpu", "icache_port"),
        vec!["system.cpu.icache", "system.membus", "system.mem_ctrl"]
    );
}

#[test]
fn cache_overrides_apply_to_presets() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.caches.caches = true;
    config.caches.l1d.size = Some(MemSize::kib(64));
    config.caches.l1d.assoc = Some(4);
    config.caches.l1d.replacement = Some(ReplacementPolicy::Fifo);
    let g = f.build(&config, 1).unwrap();

    let d = cache_at(&g, "system.cpu.dcache");
    assert_eq!((d.size, d.assoc, d.replacement), (MemSize::kib(64), 4, ReplacementPolicy::Fifo));
    let i = cache_at(&g, "system.cpu.icache");
    assert_eq!((i.size, i.assoc, i.replacement), (MemSize::kib(16), 2, ReplacementPolicy::Random));
}

// ══════════════════════════════════════════════════════════
// 3. CPUs and workloads
// ══════════════════════════════════════════════════════════

#[test]
fn each_cpu_runs_its_own_process() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.system.num_cpus = 2;
    let g = f.build(&config, 2).unwrap();

    assert_eq!(g.find("system.cpu"), None);
    for (i, pid) in [(0, 100), (1, 101)] {
        let cpu = cpu_at(&g, &format!("system.cpu{i}"));
        assert_eq!(cpu.cpu_id, i);
        assert_eq!(cpu.workload.len(), 1);
        assert_eq!(cpu.workload[0].pid, pid);
        assert_eq!(cpu.num_threads, 1);
    }
}

#[test]
fn single_process_is_shared_by_all_cpus() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.system.num_cpus = 3;
    let g = f.build(&config, 1).unwrap();

    for i in 0..3 {
        let cpu = cpu_at(&g, &format!("system.cpu{i}"));
        assert_eq!(cpu.workload[0].pid, 100);
    }
}

#[test]
fn extra_processes_are_ignored() {
    let f = Fixture::riscv();
    let g = f.build(&Config::default(), 3).unwrap();
    let cpu = cpu_at(&g, "system.cpu");
    assert_eq!(cpu.workload.len(), 1);
    assert_eq!(cpu.workload[0].pid, 100);
}

#[test]
fn smt_puts_every_process_on_one_cpu() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.cpu.cpu_type = "DerivO3CPU".into();
    config.cpu.smt = true;
    let g = f.build(&config, 2).unwrap();

    let cpu = cpu_at(&g, "system.cpu");
    assert_eq!(cpu.num_threads, 2);
    let pids: Vec<u32> = cpu.workload.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![100, 101]);
    assert!(g.freeze().is_ok());
}

#[test]
fn cpu_options_are_recorded() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.cpu.bp_type = Some("TournamentBP".into());
    config.cpu.indirect_bp_type = Some("ITTAGE".into());
    config.cpu.checker = true;
    config.cpu.simpoint_profile = true;
    config.cpu.simpoint_interval = 5000;
    config.cpu.wait_gdb = true;
    let g = f.build(&config, 1).unwrap();

    let cpu = cpu_at(&g, "system.cpu");
    assert_eq!(cpu.branch_pred, Some("TournamentBP"));
    assert_eq!(cpu.indirect_branch_pred, Some("ITTAGE"));
    assert!(cpu.checker);
    assert_eq!(cpu.simpoint_interval, Some(5000));
    assert!(cpu.wait_gdb);
}

// ══════════════════════════════════════════════════════════
// 4. Errors
// ══════════════════════════════════════════════════════════

#[test]
fn smt_with_several_cpus_is_rejected() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.cpu.cpu_type = "DerivO3CPU".into();
    config.cpu.smt = true;
    config.system.num_cpus = 2;
    let err = f.build(&config, 2).unwrap_err();
    assert!(matches!(err, BuildError::SmtMultipleCpus { num_cpus: 2 }), "{err}");
}

#[test]
fn more_cpus_than_workloads_is_rejected() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.system.num_cpus = 3;
    let err = f.build(&config, 2).unwrap_err();
    assert!(
        matches!(err, BuildError::NotEnoughWorkloads { num_cpus: 3, workloads: 2 }),
        "{err}"
    );
}

#[test]
fn zero_cpus_is_rejected() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.system.num_cpus = 0;
    assert!(matches!(f.build(&config, 1), Err(BuildError::NoCpus)));
}

#[rstest]
#[case::bp(|c: &mut Config| c.cpu.bp_type = Some("NoSuchBP".into()))]
#[case::mem(|c: &mut Config| c.memory.mem_type = "DDR9".into())]
#[case::cache(|c: &mut Config| { c.caches.caches = true; c.caches.l1i.preset = "L0".into(); })]
fn unknown_presets_are_rejected(#[case] tweak: fn(&mut Config)) {
    let f = Fixture::riscv();
    let mut config = Config::default();
    tweak(&mut config);
    assert!(matches!(f.build(&config, 1), Err(BuildError::Catalog(_))));
}

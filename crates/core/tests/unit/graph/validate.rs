//! Freeze-Time Validation Tests.
//!
//! Every check runs on every freeze, so a broken graph reports all of its problems at once.

use pretty_assertions::assert_eq;
use simwire_core::Config;
use simwire_core::catalog::Isa;
use simwire_core::common::error::{GraphError, ValidationIssue};
use simwire_core::common::units::{AddrRange, MemSize};
use simwire_core::graph::{CpuParams, ObjectId, ObjectKind, SystemGraph};

use super::Bare;
use crate::common::fixtures::Fixture;

fn issues(graph: SystemGraph) -> Vec<ValidationIssue> {
    match graph.freeze() {
        Err(GraphError::Validation(issues)) => issues,
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("graph froze"),
    }
}

fn edit_cpu(graph: &mut SystemGraph, path: &str, edit: impl FnOnce(&mut CpuParams)) {
    let id = graph.find(path).unwrap();
    match &mut graph.object_mut(id).unwrap().kind {
        ObjectKind::Cpu(p) => edit(p),
        other => panic!("{path} is {}", other.type_name()),
    }
}

fn default_graph() -> (Fixture, SystemGraph) {
    let f = Fixture::riscv();
    let g = f.build(&Config::default(), 1).unwrap();
    (f, g)
}

/// Adds the CPU of a built machine to a bare graph, unconnected.
fn bare_with_cpu() -> (Bare, ObjectId) {
    let (_f, built) = default_graph();
    let id = built.find("system.cpu").unwrap();
    let kind = built.object(id).unwrap().kind.clone();
    let mut b = Bare::new();
    let cpu = b.graph.add(Some(b.system), "cpu", kind);
    (b, cpu)
}

// ══════════════════════════════════════════════════════════
// 1. Hierarchy
// ══════════════════════════════════════════════════════════

#[test]
fn empty_graph_reports_every_structural_issue() {
    assert_eq!(
        issues(SystemGraph::new()),
        vec![ValidationIssue::MissingRoot, ValidationIssue::NoMemoryController]
    );
}

#[test]
fn two_roots_are_rejected() {
    let mut g = SystemGraph::new();
    let _ = g.add(None, "root", ObjectKind::Root { full_system: false });
    let _ = g.add(None, "root", ObjectKind::Root { full_system: false });
    assert_eq!(
        issues(g),
        vec![
            ValidationIssue::MultipleRoots { count: 2 },
            ValidationIssue::NoMemoryController
        ]
    );
}

#[test]
fn root_without_system_is_rejected() {
    let mut g = SystemGraph::new();
    let _ = g.add(None, "root", ObjectKind::Root { full_system: false });
    assert!(issues(g).contains(&ValidationIssue::MissingSystem));
}

#[test]
fn unconnected_bare_graph_lists_every_port() {
    let b = Bare::new();
    assert_eq!(
        issues(b.graph),
        vec![
            ValidationIssue::MissingSeWorkload,
            ValidationIssue::UnconnectedPort {
                port: "system.system_port".into()
            },
            ValidationIssue::UnconnectedPort {
                port: "system.l2cache.cpu_side".into()
            },
            ValidationIssue::UnconnectedPort {
                port: "system.l2cache.mem_side".into()
            },
            ValidationIssue::UnconnectedPort {
                port: "system.mem_ctrl.port".into()
            },
        ]
    );
}

#[test]
fn built_machines_freeze_cleanly() {
    let (_f, g) = default_graph();
    let system = g.freeze().unwrap();
    assert_eq!(system.path(system.system()), "system");
    assert_eq!(system.cpus().count(), 1);
    assert!(system.workload().is_some());
}

// ══════════════════════════════════════════════════════════
// 2. Caches and memory
// ══════════════════════════════════════════════════════════

#[test]
fn line_size_must_be_a_power_of_two() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.system.cacheline_size = 48;
    let g = f.build(&config, 1).unwrap();
    assert_eq!(issues(g), vec![ValidationIssue::CacheLineSize { size: 48 }]);
}

#[test]
fn set_count_must_be_a_power_of_two() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.caches.caches = true;
    config.caches.l1d.size = Some(MemSize::kib(48));
    let g = f.build(&config, 1).unwrap();
    assert_eq!(
        issues(g),
        vec![ValidationIssue::CacheGeometry {
            cache: "system.cpu.dcache".into(),
            reason: "384 sets is not a power of two".into(),
        }]
    );
}

#[test]
fn zero_associativity_is_rejected() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.caches.caches = true;
    config.caches.l2cache = true;
    config.caches.l2.assoc = Some(0);
    let g = f.build(&config, 1).unwrap();
    assert_eq!(
        issues(g),
        vec![ValidationIssue::CacheGeometry {
            cache: "system.l2cache".into(),
            reason: "associativity must be non-zero".into(),
        }]
    );
}

#[test]
fn interface_range_must_lie_in_system_memory() {
    let (_f, mut g) = default_graph();
    let system = g.find("system").unwrap();
    if let ObjectKind::System(p) = &mut g.object_mut(system).unwrap().kind {
        p.mem_ranges = vec![AddrRange::with_size(MemSize::mib(1))];
    }
    let found = issues(g);
    assert_eq!(found.len(), 1);
    assert!(matches!(
        &found[0],
        ValidationIssue::MemRangeOutside { interface, range }
            if interface == "system.mem_ctrl.dram" && range.size() == 512 << 20
    ));
}

// ══════════════════════════════════════════════════════════
// 3. CPUs
// ══════════════════════════════════════════════════════════

#[test]
fn cpu_needs_a_clock_domain() {
    let (_f, mut g) = default_graph();
    let voltage = g.find("system.voltage_domain").unwrap();
    edit_cpu(&mut g, "system.cpu", |p| p.clk_domain = Some(voltage));
    assert_eq!(
        issues(g),
        vec![ValidationIssue::NoClockDomain {
            cpu: "system.cpu".into()
        }]
    );
}

#[test]
fn cpu_needs_a_workload() {
    let (_f, mut g) = default_graph();
    edit_cpu(&mut g, "system.cpu", |p| p.workload.clear());
    assert_eq!(
        issues(g),
        vec![ValidationIssue::NoWorkload {
            cpu: "system.cpu".into()
        }]
    );
}

#[test]
fn threads_need_an_o3_cpu() {
    let (_f, mut g) = default_graph();
    edit_cpu(&mut g, "system.cpu", |p| p.num_threads = 2);
    assert_eq!(
        issues(g),
        vec![ValidationIssue::SmtRequiresO3 {
            cpu: "system.cpu".into(),
            threads: 2,
        }]
    );
}

#[test]
fn cpu_model_must_run_the_binary() {
    let f = Fixture::riscv();
    let mut config = Config::default();
    config.cpu.cpu_type = "X86O3CPU".into();
    let g = f.build(&config, 1).unwrap();
    assert_eq!(
        issues(g),
        vec![ValidationIssue::IsaMismatch {
            cpu: "system.cpu".into(),
            cpu_isa: Isa::X86,
            workload_isa: Isa::Riscv,
        }]
    );
}

#[test]
fn requests_must_reach_memory() {
    let (mut b, cpu) = bare_with_cpu();
    b.graph.connect((cpu, "icache_port"), (b.cache, "cpu_side")).unwrap();
    b.graph.connect((cpu, "dcache_port"), (b.bus, "cpu_side_ports")).unwrap();
    b.graph.connect((b.cache, "mem_side"), (b.bus, "cpu_side_ports")).unwrap();

    let found = issues(b.graph);
    assert!(found.contains(&ValidationIssue::Unreachable {
        port: "system.cpu.icache_port".into()
    }));
    assert!(found.contains(&ValidationIssue::Unreachable {
        port: "system.cpu.dcache_port".into()
    }));
}

#[test]
fn request_loops_are_reported() {
    let (mut b, cpu) = bare_with_cpu();
    b.graph.connect((cpu, "icache_port"), (b.bus, "cpu_side_ports")).unwrap();
    b.graph.connect((b.bus, "mem_side_ports"), (b.cache, "cpu_side")).unwrap();
    b.graph.connect((b.cache, "mem_side"), (b.bus, "cpu_side_ports")).unwrap();

    let found = issues(b.graph);
    assert!(found.contains(&ValidationIssue::Cycle {
        port: "system.cpu.icache_port".into()
    }));
    assert!(found.contains(&ValidationIssue::UnconnectedPort {
        port: "system.cpu.dcache_port".into()
    }));
}

#[test]
fn validation_error_lists_issues() {
    let err = SystemGraph::new().freeze().unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("system failed validation:"), "{text}");
    assert!(text.contains("\n  - no root object"));
    assert!(text.contains("\n  - no memory controller"));
}

//! Graph validation.
//!
//! `check` walks the whole graph once and collects every issue instead of stopping at the
//! first, so `freeze` can report a broken configuration in a single error.

use crate::common::error::ValidationIssue;

use super::{ObjectId, ObjectKind, PortRef, Route, SystemGraph, SystemParams};

/// Result of checking a graph: every issue found, plus the root and system when present.
pub(crate) struct Checked {
    pub issues: Vec<ValidationIssue>,
    pub root: Option<ObjectId>,
    pub system: Option<(ObjectId, SystemParams)>,
}

pub(crate) fn check(graph: &SystemGraph) -> Checked {
    let mut issues = Vec::new();

    let roots: Vec<ObjectId> = graph
        .objects()
        .filter(|(_, o)| o.parent.is_none() && matches!(o.kind, ObjectKind::Root { .. }))
        .map(|(id, _)| id)
        .collect();
    let root = match roots.as_slice() {
        [] => {
            issues.push(ValidationIssue::MissingRoot);
            None
        }
        [one] => Some(*one),
        many => {
            issues.push(ValidationIssue::MultipleRoots { count: many.len() });
            None
        }
    };

    let system = root.and_then(|r| {
        graph.children(r).find_map(|id| match graph.object(id).map(|o| &o.kind) {
            Ok(ObjectKind::System(p)) => Some((id, p.clone())),
            _ => None,
        })
    });
    if root.is_some() && system.is_none() {
        issues.push(ValidationIssue::MissingSystem);
    }

    if let Some((sys, _)) = &system {
        let has_workload = graph
            .children(*sys)
            .any(|id| matches!(graph.object(id).map(|o| &o.kind), Ok(ObjectKind::Workload(_))));
        if !has_workload {
            issues.push(ValidationIssue::MissingSeWorkload);
        }
    }

    check_ports(graph, &mut issues);
    check_caches(graph, system.as_ref().map(|(_, p)| p), &mut issues);
    check_memory(graph, system.as_ref().map(|(_, p)| p), &mut issues);
    check_cpus(graph, &mut issues);

    Checked {
        issues,
        root,
        system,
    }
}

fn check_ports(graph: &SystemGraph, issues: &mut Vec<ValidationIssue>) {
    for (id, obj) in graph.objects() {
        for spec in obj.kind.ports().iter().filter(|s| !s.vector) {
            let port = PortRef {
                object: id,
                port: spec.name,
            };
            if graph.peers(port).next().is_none() {
                issues.push(ValidationIssue::UnconnectedPort {
                    port: graph.port_path(port),
                });
            }
        }
    }
}

fn check_caches(
    graph: &SystemGraph,
    system: Option<&SystemParams>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(system) = system else {
        return;
    };
    let line = system.cache_line_size;
    if !line.is_power_of_two() {
        issues.push(ValidationIssue::CacheLineSize { size: line });
        return;
    }

    for (id, obj) in graph.objects() {
        let ObjectKind::Cache(p) = &obj.kind else {
            continue;
        };
        let reason = if p.assoc == 0 {
            Some("associativity must be non-zero".to_string())
        } else {
            let way_bytes = u64::from(p.assoc) * u64::from(line);
            let size = p.size.bytes();
            if size == 0 || size % way_bytes != 0 {
                Some(format!(
                    "size {} is not a multiple of {} ways x {line}B lines",
                    p.size, p.assoc
                ))
            } else if !(size / way_bytes).is_power_of_two() {
                Some(format!("{} sets is not a power of two", size / way_bytes))
            } else {
                None
            }
        };
        if let Some(reason) = reason {
            issues.push(ValidationIssue::CacheGeometry {
                cache: graph.path(id),
                reason,
            });
        }
    }
}

fn check_memory(
    graph: &SystemGraph,
    system: Option<&SystemParams>,
    issues: &mut Vec<ValidationIssue>,
) {
    let has_ctrl = graph
        .objects()
        .any(|(_, o)| matches!(o.kind, ObjectKind::MemCtrl));
    if !has_ctrl {
        issues.push(ValidationIssue::NoMemoryController);
    }

    let ranges = system.map(|s| s.mem_ranges.as_slice()).unwrap_or_default();
    for (id, obj) in graph.objects() {
        let ObjectKind::MemInterface { range, .. } = &obj.kind else {
            continue;
        };
        if !ranges.iter().any(|r| r.covers(range)) {
            issues.push(ValidationIssue::MemRangeOutside {
                interface: graph.path(id),
                range: *range,
            });
        }
    }
}

fn check_cpus(graph: &SystemGraph, issues: &mut Vec<ValidationIssue>) {
    let workload_isa = graph.objects().find_map(|(_, o)| match &o.kind {
        ObjectKind::Workload(w) => Some(w.isa),
        _ => None,
    });

    for (id, obj) in graph.objects() {
        let ObjectKind::Cpu(cpu) = &obj.kind else {
            continue;
        };
        let path = graph.path(id);

        let clocked = cpu.clk_domain.is_some_and(|d| {
            matches!(
                graph.object(d).map(|o| &o.kind),
                Ok(ObjectKind::SrcClockDomain { .. })
            )
        });
        if !clocked {
            issues.push(ValidationIssue::NoClockDomain { cpu: path.clone() });
        }

        if cpu.workload.is_empty() {
            issues.push(ValidationIssue::NoWorkload { cpu: path.clone() });
        }
        if cpu.num_threads > 1 && !cpu.class.is_o3() {
            issues.push(ValidationIssue::SmtRequiresO3 {
                cpu: path.clone(),
                threads: cpu.num_threads,
            });
        }

        for spec in obj.kind.ports() {
            let port = PortRef {
                object: id,
                port: spec.name,
            };
            if graph.peers(port).next().is_none() {
                continue;
            }
            match graph.route(port) {
                Route::Reached(_) => {}
                Route::Unreachable => issues.push(ValidationIssue::Unreachable {
                    port: graph.port_path(port),
                }),
                Route::Cycle => issues.push(ValidationIssue::Cycle {
                    port: graph.port_path(port),
                }),
            }
        }

        if let Some(isa) = workload_isa.filter(|&isa| !cpu.isa.runs(isa)) {
            issues.push(ValidationIssue::IsaMismatch {
                cpu: path,
                cpu_isa: cpu.isa,
                workload_isa: isa,
            });
        }
    }
}

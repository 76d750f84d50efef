//! Port Connection Tests.
//!
//! Verifies role pairing, single binding of scalar ports, vector accumulation, edge
//! normalisation, and request routing toward memory.

use pretty_assertions::assert_eq;
use simwire_core::common::error::GraphError;
use simwire_core::common::units::{Frequency, Voltage};
use simwire_core::graph::{ObjectKind, PortRef, PortRole, Route};

use super::Bare;

// ══════════════════════════════════════════════════════════
// 1. Paths
// ══════════════════════════════════════════════════════════

#[test]
fn paths_omit_the_root() {
    let b = Bare::new();
    assert_eq!(b.graph.path(b.cache), "system.l2cache");
    assert_eq!(b.graph.path(b.system), "system");
    assert_eq!(b.graph.find("system.membus"), Some(b.bus));
    assert_eq!(b.graph.find("system.nothing"), None);
}

#[test]
fn port_specs_come_from_the_kind() {
    let b = Bare::new();
    let spec = b.graph.port_spec(b.bus, "mem_side_ports").unwrap();
    assert_eq!(spec.role, PortRole::Requestor);
    assert!(spec.vector);
    let spec = b.graph.port_spec(b.cache, "cpu_side").unwrap();
    assert_eq!(spec.role, PortRole::Responder);
    assert!(!spec.vector);
}

// ══════════════════════════════════════════════════════════
// 2. Binding rules
// ══════════════════════════════════════════════════════════

#[test]
fn edges_are_stored_requestor_first() {
    let mut b = Bare::new();
    b.graph.connect((b.ctrl, "port"), (b.bus, "mem_side_ports")).unwrap();

    let edge = b.graph.edges()[0];
    assert_eq!(
        edge.requestor,
        PortRef {
            object: b.bus,
            port: "mem_side_ports"
        }
    );
    assert_eq!(
        edge.responder,
        PortRef {
            object: b.ctrl,
            port: "port"
        }
    );
}

#[test]
fn same_roles_are_rejected() {
    let mut b = Bare::new();
    let err = b
        .graph
        .connect((b.cache, "mem_side"), (b.system, "system_port"))
        .unwrap_err();
    match err {
        GraphError::RoleMismatch { a, b: other, role } => {
            assert_eq!(a, "system.l2cache.mem_side");
            assert_eq!(other, "system.system_port");
            assert_eq!(role, "requestor");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_ports_are_rejected() {
    let mut b = Bare::new();
    let err = b.graph.connect((b.cache, "snoop"), (b.bus, "mem_side_ports")).unwrap_err();
    assert!(matches!(err, GraphError::UnknownPort { ref port, .. } if port == "snoop"));
}

#[test]
fn scalar_ports_bind_once() {
    let mut b = Bare::new();
    b.graph.connect((b.cache, "mem_side"), (b.ctrl, "port")).unwrap();
    let err = b
        .graph
        .connect((b.cache, "mem_side"), (b.bus, "cpu_side_ports"))
        .unwrap_err();
    assert!(matches!(err, GraphError::AlreadyConnected { .. }), "{err}");
    assert_eq!(b.graph.edges().len(), 1);
}

#[test]
fn vector_ports_accumulate() {
    let mut b = Bare::new();
    b.graph.connect((b.system, "system_port"), (b.bus, "cpu_side_ports")).unwrap();
    b.graph.connect((b.bus, "cpu_side_ports"), (b.cache, "mem_side")).unwrap();

    let port = PortRef {
        object: b.bus,
        port: "cpu_side_ports",
    };
    assert_eq!(b.graph.peers(port).count(), 2);
}

// ══════════════════════════════════════════════════════════
// 3. Routing
// ══════════════════════════════════════════════════════════

#[test]
fn route_follows_caches_and_crossbars() {
    let mut b = Bare::new();
    b.graph.connect((b.system, "system_port"), (b.cache, "cpu_side")).unwrap();
    b.graph.connect((b.cache, "mem_side"), (b.bus, "cpu_side_ports")).unwrap();
    b.graph.connect((b.bus, "mem_side_ports"), (b.ctrl, "port")).unwrap();

    let start = PortRef {
        object: b.system,
        port: "system_port",
    };
    assert_eq!(b.graph.route(start), Route::Reached(vec![b.cache, b.bus, b.ctrl]));
}

#[test]
fn route_without_memory_is_unreachable() {
    let mut b = Bare::new();
    b.graph.connect((b.system, "system_port"), (b.cache, "cpu_side")).unwrap();
    b.graph.connect((b.cache, "mem_side"), (b.bus, "cpu_side_ports")).unwrap();

    let start = PortRef {
        object: b.system,
        port: "system_port",
    };
    assert_eq!(b.graph.route(start), Route::Unreachable);
}

#[test]
fn route_detects_cycles() {
    let mut b = Bare::new();
    b.graph.connect((b.system, "system_port"), (b.bus, "cpu_side_ports")).unwrap();
    b.graph.connect((b.bus, "mem_side_ports"), (b.cache, "cpu_side")).unwrap();
    b.graph.connect((b.cache, "mem_side"), (b.bus, "cpu_side_ports")).unwrap();

    let start = PortRef {
        object: b.system,
        port: "system_port",
    };
    assert_eq!(b.graph.route(start), Route::Cycle);
}

// ══════════════════════════════════════════════════════════
// 4. Clock domains
// ══════════════════════════════════════════════════════════

#[test]
fn clock_is_inherited_from_the_system() {
    let mut b = Bare::new();
    assert_eq!(b.graph.clock_of(b.cache), None);

    let vd = b.graph.add(
        Some(b.system),
        "voltage_domain",
        ObjectKind::VoltageDomain {
            voltage: Voltage::from_volts(1.0),
        },
    );
    let clk = b.graph.add(
        Some(b.system),
        "clk_domain",
        ObjectKind::SrcClockDomain {
            clock: Frequency::ghz(1),
            voltage_domain: vd,
        },
    );
    if let ObjectKind::System(p) = &mut b.graph.object_mut(b.system).unwrap().kind {
        p.clk_domain = Some(clk);
    }

    assert_eq!(b.graph.clock_of(b.cache), Some(Frequency::ghz(1)));
    assert_eq!(b.graph.clock_of(b.system), Some(Frequency::ghz(1)));
}

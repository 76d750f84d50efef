//! Port-connected object graph.
//!
//! A simulated system is a tree of named objects (the `system.cpu.icache` hierarchy) plus a
//! set of port-to-port connections that cut across the tree. This module provides:
//! 1. **Arena:** `SystemGraph` stores objects by `ObjectId` and records parentage.
//! 2. **Ports:** Each `ObjectKind` declares its ports; `connect` enforces role pairing and
//!    single binding of non-vector ports.
//! 3. **Routing:** Request paths from a requestor port through caches and crossbars down to a
//!    memory controller.
//! 4. **Freeze:** `SystemGraph::freeze` validates the whole graph and returns an immutable
//!    `FrozenSystem`, the only value a backend accepts.

/// Topology construction from configuration.
pub mod builder;
/// JSON and Graphviz renderings of a frozen system.
pub mod export;
/// Ports, roles, and edges.
pub mod port;
/// Whole-graph checks run by `freeze`.
pub mod validate;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

pub use port::{Edge, PortRef, PortRole, PortSpec};

use crate::catalog::{CpuClass, Isa, MemMode, MemoryPart};
use crate::common::error::GraphError;
use crate::common::units::{AddrRange, Frequency, MemSize, Voltage};
use crate::config::ReplacementPolicy;
use crate::workload::{Process, SeWorkload};

/// Index of an object in a [`SystemGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Returns the arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// System-wide parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemParams {
    /// Memory access mode, derived from the CPU class.
    pub mem_mode: MemMode,
    /// Physical memory ranges.
    pub mem_ranges: Vec<AddrRange>,
    /// Cache line size in bytes.
    pub cache_line_size: u32,
    /// System clock domain.
    pub clk_domain: Option<ObjectId>,
}

/// CPU parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuParams {
    /// Catalog model name.
    pub model: &'static str,
    /// Model family.
    pub class: CpuClass,
    /// Model ISA.
    pub isa: Isa,
    /// CPU index.
    pub cpu_id: usize,
    /// Clock domain.
    pub clk_domain: Option<ObjectId>,
    /// Hardware thread count.
    pub num_threads: usize,
    /// Processes run by this CPU, one per thread.
    pub workload: Vec<Process>,
    /// Branch predictor name.
    pub branch_pred: Option<&'static str>,
    /// Indirect branch predictor name.
    pub indirect_branch_pred: Option<&'static str>,
    /// Checker CPU attached.
    pub checker: bool,
    /// Simpoint probe interval, when profiling.
    pub simpoint_interval: Option<u64>,
    /// Wait for a remote debugger before running.
    pub wait_gdb: bool,
}

/// Cache parameters after preset resolution and overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheParams {
    /// Preset the cache was built from.
    pub preset: &'static str,
    /// Capacity.
    pub size: MemSize,
    /// Associativity.
    pub assoc: u32,
    /// Tag lookup latency in cycles.
    pub tag_latency: u32,
    /// Data array latency in cycles.
    pub data_latency: u32,
    /// Response latency in cycles.
    pub response_latency: u32,
    /// Miss status holding registers.
    pub mshrs: u32,
    /// Targets per MSHR.
    pub tgts_per_mshr: u32,
    /// Replacement policy.
    pub replacement: ReplacementPolicy,
}

/// Crossbar flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XBarKind {
    /// Main memory bus.
    System,
    /// Bus between private L1s and a shared L2.
    L2,
}

impl XBarKind {
    /// Class name of this crossbar.
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "SystemXBar",
            Self::L2 => "L2XBar",
        }
    }
}

/// Crossbar parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XBarParams {
    /// Flavour.
    pub kind: XBarKind,
    /// Data path width in bytes per cycle.
    pub width: u32,
    /// Header decode latency in cycles.
    pub frontend_latency: u32,
    /// Request forwarding latency in cycles.
    pub forward_latency: u32,
    /// Response latency in cycles.
    pub response_latency: u32,
}

impl XBarParams {
    /// Default `SystemXBar` parameters.
    pub const fn system() -> Self {
        Self {
            kind: XBarKind::System,
            width: 16,
            frontend_latency: 3,
            forward_latency: 4,
            response_latency: 2,
        }
    }

    /// Default `L2XBar` parameters.
    pub const fn l2() -> Self {
        Self {
            kind: XBarKind::L2,
            width: 32,
            frontend_latency: 1,
            forward_latency: 0,
            response_latency: 1,
        }
    }
}

/// What an object is, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// Top of the hierarchy.
    Root {
        /// Full-system (true) or syscall-emulation (false) mode.
        full_system: bool,
    },
    /// The simulated machine.
    System(SystemParams),
    /// A voltage domain.
    VoltageDomain {
        /// Supply voltage.
        voltage: Voltage,
    },
    /// A clock domain driven from a voltage domain.
    SrcClockDomain {
        /// Clock.
        clock: Frequency,
        /// Voltage domain feeding this clock.
        voltage_domain: ObjectId,
    },
    /// A CPU.
    Cpu(CpuParams),
    /// x86 local interrupt controller.
    Interrupts,
    /// A cache.
    Cache(CacheParams),
    /// A crossbar.
    XBar(XBarParams),
    /// A memory controller; its interface is a child object.
    MemCtrl,
    /// A memory interface serving one address range.
    MemInterface {
        /// Catalog part.
        part: MemoryPart,
        /// Served range.
        range: AddrRange,
    },
    /// The syscall-emulation workload.
    Workload(SeWorkload),
}

const NO_PORTS: &[PortSpec] = &[];
const SYSTEM_PORTS: &[PortSpec] = &[PortSpec::requestor("system_port")];
const CPU_PORTS: &[PortSpec] = &[
    PortSpec::requestor("icache_port"),
    PortSpec::requestor("dcache_port"),
];
const INTERRUPT_PORTS: &[PortSpec] = &[
    PortSpec::responder("pio"),
    PortSpec::requestor("int_requestor"),
    PortSpec::responder("int_responder"),
];
const CACHE_PORTS: &[PortSpec] = &[
    PortSpec::responder("cpu_side"),
    PortSpec::requestor("mem_side"),
];
const XBAR_PORTS: &[PortSpec] = &[
    PortSpec::vector("cpu_side_ports", PortRole::Responder),
    PortSpec::vector("mem_side_ports", PortRole::Requestor),
];
const MEMCTRL_PORTS: &[PortSpec] = &[PortSpec::responder("port")];

impl ObjectKind {
    /// Ports declared by this kind.
    pub const fn ports(&self) -> &'static [PortSpec] {
        match self {
            Self::System(_) => SYSTEM_PORTS,
            Self::Cpu(_) => CPU_PORTS,
            Self::Interrupts => INTERRUPT_PORTS,
            Self::Cache(_) => CACHE_PORTS,
            Self::XBar(_) => XBAR_PORTS,
            Self::MemCtrl => MEMCTRL_PORTS,
            Self::Root { .. }
            | Self::VoltageDomain { .. }
            | Self::SrcClockDomain { .. }
            | Self::MemInterface { .. }
            | Self::Workload(_) => NO_PORTS,
        }
    }

    /// Class name as it appears in configuration dumps.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Root { .. } => "Root",
            Self::System(_) => "System",
            Self::VoltageDomain { .. } => "VoltageDomain",
            Self::SrcClockDomain { .. } => "SrcClockDomain",
            Self::Cpu(p) => p.model,
            Self::Interrupts => "X86LocalApic",
            Self::Cache(_) => "Cache",
            Self::XBar(p) => p.kind.name(),
            Self::MemCtrl => "MemCtrl",
            Self::MemInterface { part, .. } => part.name,
            Self::Workload(_) => "SEWorkload",
        }
    }
}

/// A named node of the object tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SimObject {
    /// Name relative to the parent.
    pub name: String,
    /// Parent object; `None` for roots.
    pub parent: Option<ObjectId>,
    /// Kind and parameters.
    pub kind: ObjectKind,
}

/// Outcome of following a request path toward memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A memory controller was reached; objects are listed in request order, ending with it.
    Reached(Vec<ObjectId>),
    /// No memory controller is reachable.
    Unreachable,
    /// The path loops back on an object already visited.
    Cycle,
}

/// Mutable object graph under construction.
#[derive(Debug, Clone, Default)]
pub struct SystemGraph {
    objects: Vec<SimObject>,
    edges: Vec<Edge>,
}

impl SystemGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object under `parent` and returns its id.
    pub fn add(
        &mut self,
        parent: Option<ObjectId>,
        name: impl Into<String>,
        kind: ObjectKind,
    ) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(SimObject {
            name: name.into(),
            parent,
            kind,
        });
        tracing::debug!(object = %self.path(id), kind = self.objects[id.0].kind.type_name(), "object added");
        id
    }

    /// Returns the object with `id`.
    pub fn object(&self, id: ObjectId) -> Result<&SimObject, GraphError> {
        self.objects.get(id.0).ok_or(GraphError::UnknownObject(id.0))
    }

    /// Returns the object with `id` for in-place parameter edits.
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut SimObject, GraphError> {
        self.objects.get_mut(id.0).ok_or(GraphError::UnknownObject(id.0))
    }

    /// Iterates every object with its id, in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SimObject)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the graph has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All connections, requestor first.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Direct children of `id`, in insertion order.
    pub fn children(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects()
            .filter(move |(_, o)| o.parent == Some(id))
            .map(|(child, _)| child)
    }

    /// Dotted path of `id`. Paths omit the root object, which is itself named `root`.
    pub fn path(&self, id: ObjectId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(obj) = self.objects.get(c.0) else {
                break;
            };
            if obj.parent.is_none() && matches!(obj.kind, ObjectKind::Root { .. }) && c != id {
                break;
            }
            parts.push(obj.name.as_str());
            cur = obj.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Dotted path of a port (`system.cpu.icache_port`).
    pub fn port_path(&self, port: PortRef) -> String {
        format!("{}.{}", self.path(port.object), port.port)
    }

    /// Finds an object by dotted path.
    pub fn find(&self, path: &str) -> Option<ObjectId> {
        self.objects().map(|(id, _)| id).find(|id| self.path(*id) == path)
    }

    /// Resolves a port name on an object against its kind's declaration.
    pub fn port_spec(&self, object: ObjectId, name: &str) -> Result<PortSpec, GraphError> {
        let obj = self.object(object)?;
        obj.kind
            .ports()
            .iter()
            .find(|p| p.name == name)
            .copied()
            .ok_or_else(|| GraphError::UnknownPort {
                object: self.path(object),
                port: name.to_string(),
            })
    }

    /// Peers currently bound to `port`.
    pub fn peers(&self, port: PortRef) -> impl Iterator<Item = PortRef> + '_ {
        self.edges.iter().filter_map(move |e| e.peer_of(port))
    }

    /// Connects two ports, in either order.
    ///
    /// One end must be a requestor and the other a responder. Non-vector ports accept a
    /// single peer; vector ports accumulate.
    pub fn connect(&mut self, a: (ObjectId, &str), b: (ObjectId, &str)) -> Result<(), GraphError> {
        let spec_a = self.port_spec(a.0, a.1)?;
        let spec_b = self.port_spec(b.0, b.1)?;
        let ref_a = PortRef {
            object: a.0,
            port: spec_a.name,
        };
        let ref_b = PortRef {
            object: b.0,
            port: spec_b.name,
        };

        if spec_a.role == spec_b.role {
            return Err(GraphError::RoleMismatch {
                a: self.port_path(ref_a),
                b: self.port_path(ref_b),
                role: spec_a.role.to_string(),
            });
        }

        for (spec, port) in [(spec_a, ref_a), (spec_b, ref_b)] {
            if spec.vector {
                continue;
            }
            if let Some(peer) = self.peers(port).next() {
                return Err(GraphError::AlreadyConnected {
                    port: self.port_path(port),
                    peer: self.port_path(peer),
                });
            }
        }

        let edge = if spec_a.role == PortRole::Requestor {
            Edge {
                requestor: ref_a,
                responder: ref_b,
            }
        } else {
            Edge {
                requestor: ref_b,
                responder: ref_a,
            }
        };
        tracing::debug!(
            requestor = %self.port_path(edge.requestor),
            responder = %self.port_path(edge.responder),
            "ports connected"
        );
        self.edges.push(edge);
        Ok(())
    }

    /// Clock governing `id`: its own clock domain, or the nearest ancestor's.
    pub fn clock_of(&self, id: ObjectId) -> Option<Frequency> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let obj = self.objects.get(c.0)?;
            let domain = match &obj.kind {
                ObjectKind::Cpu(p) => p.clk_domain,
                ObjectKind::System(p) => p.clk_domain,
                _ => None,
            };
            if let Some(d) = domain {
                return match self.objects.get(d.0).map(|o| &o.kind) {
                    Some(ObjectKind::SrcClockDomain { clock, .. }) => Some(*clock),
                    _ => None,
                };
            }
            cur = obj.parent;
        }
        None
    }

    /// Follows requests issued on `start` down to a memory controller.
    ///
    /// Caches forward through `mem_side`, crossbars through any of their `mem_side_ports`.
    /// When a crossbar has several downstream peers the first that reaches memory wins.
    pub fn route(&self, start: PortRef) -> Route {
        let mut path = Vec::new();
        let mut visited = HashSet::from([start.object]);
        let mut cycle = false;
        if self.walk(start, &mut path, &mut visited, &mut cycle) {
            Route::Reached(path)
        } else if cycle {
            Route::Cycle
        } else {
            Route::Unreachable
        }
    }

    fn walk(
        &self,
        port: PortRef,
        path: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
        cycle: &mut bool,
    ) -> bool {
        let peers: Vec<PortRef> = self.peers(port).collect();
        for peer in peers {
            let id = peer.object;
            if !visited.insert(id) {
                *cycle = true;
                continue;
            }
            path.push(id);
            let next = match self.objects.get(id.0).map(|o| &o.kind) {
                Some(ObjectKind::MemCtrl) => return true,
                Some(ObjectKind::Cache(_)) => Some("mem_side"),
                Some(ObjectKind::XBar(_)) => Some("mem_side_ports"),
                _ => None,
            };
            if let Some(next) = next {
                let downstream = PortRef {
                    object: id,
                    port: next,
                };
                if self.walk(downstream, path, visited, cycle) {
                    return true;
                }
            }
            let _ = path.pop();
            let _ = visited.remove(&id);
        }
        false
    }

    /// Validates the graph and freezes it.
    ///
    /// Every check runs; all problems are reported together in
    /// [`GraphError::Validation`].
    pub fn freeze(self) -> Result<FrozenSystem, GraphError> {
        let checked = validate::check(&self);
        if !checked.issues.is_empty() {
            return Err(GraphError::Validation(checked.issues));
        }
        match (checked.root, checked.system) {
            (Some(root), Some((system, params))) => {
                tracing::info!(
                    objects = self.objects.len(),
                    connections = self.edges.len(),
                    "system frozen"
                );
                Ok(FrozenSystem {
                    graph: self,
                    root,
                    system,
                    params,
                })
            }
            _ => Err(GraphError::Validation(vec![
                crate::common::error::ValidationIssue::MissingSystem,
            ])),
        }
    }
}

/// An immutable, validated system graph.
#[derive(Debug, Clone)]
pub struct FrozenSystem {
    graph: SystemGraph,
    root: ObjectId,
    system: ObjectId,
    params: SystemParams,
}

impl FrozenSystem {
    /// Read-only view of the underlying graph.
    pub const fn graph(&self) -> &SystemGraph {
        &self.graph
    }

    /// The root object.
    pub const fn root(&self) -> ObjectId {
        self.root
    }

    /// The system object.
    pub const fn system(&self) -> ObjectId {
        self.system
    }

    /// System parameters.
    pub const fn system_params(&self) -> &SystemParams {
        &self.params
    }

    /// Dotted path of `id`.
    pub fn path(&self, id: ObjectId) -> String {
        self.graph.path(id)
    }

    /// The syscall-emulation workload.
    pub fn workload(&self) -> Option<&SeWorkload> {
        self.graph.objects().find_map(|(_, o)| match &o.kind {
            ObjectKind::Workload(w) => Some(w),
            _ => None,
        })
    }

    /// CPUs in insertion order.
    pub fn cpus(&self) -> impl Iterator<Item = (ObjectId, &CpuParams)> {
        self.graph.objects().filter_map(|(id, o)| match &o.kind {
            ObjectKind::Cpu(p) => Some((id, p)),
            _ => None,
        })
    }

    /// Caches in insertion order.
    pub fn caches(&self) -> impl Iterator<Item = (ObjectId, &CacheParams)> {
        self.graph.objects().filter_map(|(id, o)| match &o.kind {
            ObjectKind::Cache(p) => Some((id, p)),
            _ => None,
        })
    }

    /// Crossbars in insertion order.
    pub fn xbars(&self) -> impl Iterator<Item = (ObjectId, &XBarParams)> {
        self.graph.objects().filter_map(|(id, o)| match &o.kind {
            ObjectKind::XBar(p) => Some((id, p)),
            _ => None,
        })
    }

    /// Memory interfaces with the controller that owns each.
    pub fn mem_interfaces(&self) -> impl Iterator<Item = (ObjectId, &MemoryPart, AddrRange)> {
        self.graph.objects().filter_map(|(_, o)| match &o.kind {
            ObjectKind::MemInterface { part, range } => o.parent.map(|ctrl| (ctrl, part, *range)),
            _ => None,
        })
    }
}

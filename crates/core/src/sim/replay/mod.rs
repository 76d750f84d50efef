//! Trace-driven replay backend.
//!
//! Each hardware thread replays an access trace through the cache hierarchy its CPU is wired
//! to. This module provides:
//! 1. **Path resolution:** Every CPU port is resolved to the ordered caches, crossbars, and
//!    memory controller its requests traverse.
//! 2. **Timing:** Caches and the controller charge latencies in ticks of their own clock
//!    domain; crossbars charge frontend, forward, and response cycles plus transfer cycles.
//! 3. **Interleaving:** The thread with the earliest ready tick issues next; each access costs
//!    one CPU cycle to issue plus its hierarchy latency.
//!
//! Traces are aligned with processes by position: process `pid - 100` reads trace `pid - 100`.

/// Set-associative cache model.
pub mod cache;
/// Memory controller latency model.
pub mod memctrl;
/// Replacement policies.
pub mod policies;
/// Trace file format.
pub mod trace;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::common::error::SimError;
use crate::common::units::{AddrRange, Frequency};
use crate::graph::{FrozenSystem, ObjectId, ObjectKind, PortRef, Route, XBarParams};
use crate::stats::{BusStats, SimStats, ThreadStats};
use crate::workload::BASE_PID;

use self::cache::CacheModel;
use self::memctrl::MemCtrlModel;
use self::trace::{Access, AccessKind};
use super::{Backend, CAUSE_LIMIT, CAUSE_THREADS_DONE, ExitEvent};

/// One hop on a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Cache(usize),
    Bus(usize),
    Mem(usize),
}

#[derive(Debug)]
struct BusModel {
    ticks: u64,
    stats: BusStats,
}

impl BusModel {
    fn new(name: String, params: &XBarParams, line_bytes: u32, clock: Frequency) -> Self {
        let transfer = u64::from(line_bytes).div_ceil(u64::from(params.width.max(1)));
        let cycles = u64::from(params.frontend_latency)
            + u64::from(params.forward_latency)
            + u64::from(params.response_latency)
            + transfer;
        Self {
            ticks: clock.cycles_to_ticks(cycles),
            stats: BusStats {
                name,
                transactions: 0,
            },
        }
    }

    fn traverse(&mut self) -> u64 {
        self.stats.transactions += 1;
        self.ticks
    }
}

#[derive(Debug)]
struct Thread {
    stats: ThreadStats,
    accesses: Vec<Access>,
    next: usize,
    ready: u64,
    issue_ticks: u64,
    ipath: Vec<Stage>,
    dpath: Vec<Stage>,
}

impl Thread {
    fn pending(&self) -> Option<Access> {
        self.accesses.get(self.next).copied()
    }
}

/// Models built from a frozen system.
#[derive(Debug, Default)]
struct Machine {
    caches: Vec<CacheModel>,
    buses: Vec<BusModel>,
    mems: Vec<MemCtrlModel>,
    threads: Vec<Thread>,
    ranges: Vec<AddrRange>,
    tick: u64,
}

impl Machine {
    fn traverse(&mut self, path: &[Stage], addr: u64, write: bool) -> u64 {
        let mut ticks = 0;
        let mut write = write;
        for stage in path {
            match *stage {
                Stage::Bus(i) => ticks += self.buses[i].traverse(),
                Stage::Cache(i) => {
                    let lookup = self.caches[i].access(addr, write);
                    ticks += lookup.ticks;
                    if lookup.hit {
                        return ticks;
                    }
                    write = false;
                }
                Stage::Mem(i) => return ticks + self.mems[i].access(addr, write),
            }
        }
        ticks
    }

    fn collect(&self) -> SimStats {
        let mut stats = SimStats::new();
        stats.threads = self.threads.iter().map(|t| t.stats.clone()).collect();
        stats.caches = self.caches.iter().map(|c| c.stats().clone()).collect();
        stats.buses = self.buses.iter().map(|b| b.stats.clone()).collect();
        stats.mem_ctrls = self.mems.iter().map(|m| m.stats().clone()).collect();
        stats
    }
}

/// Replays access traces through the system's caches and memory.
#[derive(Debug)]
pub struct ReplayBackend {
    traces: Vec<PathBuf>,
    machine: Option<Machine>,
    stats: Option<SimStats>,
}

impl ReplayBackend {
    /// Creates a backend; `traces[i]` belongs to process `i`, and an empty path leaves it idle.
    pub const fn new(traces: Vec<PathBuf>) -> Self {
        Self {
            traces,
            machine: None,
            stats: None,
        }
    }
}

struct Resolver<'a> {
    system: &'a FrozenSystem,
    line: u32,
    caches: HashMap<ObjectId, usize>,
    buses: HashMap<ObjectId, usize>,
    mems: HashMap<ObjectId, usize>,
    machine: Machine,
}

impl Resolver<'_> {
    fn clock(&self, id: ObjectId) -> Result<Frequency, SimError> {
        self.system
            .graph()
            .clock_of(id)
            .ok_or_else(|| SimError::Model {
                object: self.system.path(id),
                reason: "no clock domain".into(),
            })
    }

    fn stage(&mut self, id: ObjectId) -> Result<Option<Stage>, SimError> {
        let system = self.system;
        let graph = system.graph();
        let obj = graph.object(id).map_err(|e| SimError::Model {
            object: id.to_string(),
            reason: e.to_string(),
        })?;
        let name = graph.path(id);
        Ok(match &obj.kind {
            ObjectKind::Cache(params) => {
                if let Some(&i) = self.caches.get(&id) {
                    return Ok(Some(Stage::Cache(i)));
                }
                let clock = self.clock(id)?;
                let i = self.machine.caches.len();
                self.machine
                    .caches
                    .push(CacheModel::new(name, params, self.line, clock));
                let _ = self.caches.insert(id, i);
                Some(Stage::Cache(i))
            }
            ObjectKind::XBar(params) => {
                if let Some(&i) = self.buses.get(&id) {
                    return Ok(Some(Stage::Bus(i)));
                }
                let clock = self.clock(id)?;
                let i = self.machine.buses.len();
                self.machine
                    .buses
                    .push(BusModel::new(name, params, self.line, clock));
                let _ = self.buses.insert(id, i);
                Some(Stage::Bus(i))
            }
            ObjectKind::MemCtrl => {
                if let Some(&i) = self.mems.get(&id) {
                    return Ok(Some(Stage::Mem(i)));
                }
                let part = system
                    .mem_interfaces()
                    .find(|(ctrl, _, _)| *ctrl == id)
                    .map(|(_, part, _)| *part)
                    .ok_or_else(|| SimError::Model {
                        object: name.clone(),
                        reason: "memory controller has no interface".into(),
                    })?;
                let i = self.machine.mems.len();
                self.machine.mems.push(MemCtrlModel::new(name, &part));
                let _ = self.mems.insert(id, i);
                Some(Stage::Mem(i))
            }
            _ => None,
        })
    }

    fn path(&mut self, cpu: ObjectId, port: &'static str) -> Result<Vec<Stage>, SimError> {
        let start = PortRef { object: cpu, port };
        match self.system.graph().route(start) {
            Route::Reached(objects) => {
                let mut stages = Vec::with_capacity(objects.len());
                for id in objects {
                    if let Some(stage) = self.stage(id)? {
                        stages.push(stage);
                    }
                }
                Ok(stages)
            }
            Route::Unreachable | Route::Cycle => Err(SimError::Model {
                object: self.system.graph().port_path(start),
                reason: "no request path to a memory controller".into(),
            }),
        }
    }
}

impl ReplayBackend {
    fn build(&self, system: &FrozenSystem) -> Result<Machine, SimError> {
        let params = system.system_params();
        let mut r = Resolver {
            system,
            line: params.cache_line_size,
            caches: HashMap::new(),
            buses: HashMap::new(),
            mems: HashMap::new(),
            machine: Machine {
                ranges: params.mem_ranges.clone(),
                ..Machine::default()
            },
        };

        let mut loaded: HashMap<usize, Vec<Access>> = HashMap::new();
        for (cpu_id, cpu) in system.cpus() {
            let issue_ticks = r.clock(cpu_id)?.period_ticks();
            let ipath = r.path(cpu_id, "icache_port")?;
            let dpath = r.path(cpu_id, "dcache_port")?;
            let threads = cpu.num_threads.max(1).min(cpu.workload.len().max(1));

            for (tid, process) in cpu.workload.iter().take(threads).enumerate() {
                let index = process.pid.saturating_sub(BASE_PID) as usize;
                let trace = self
                    .traces
                    .get(index)
                    .filter(|path| !path.as_os_str().is_empty());
                let accesses = match trace {
                    Some(path) => {
                        if let Some(a) = loaded.get(&index) {
                            a.clone()
                        } else {
                            let a = trace::load_trace(path)?;
                            let _ = loaded.insert(index, a.clone());
                            a
                        }
                    }
                    None => {
                        tracing::warn!(
                            pid = process.pid,
                            cpu = %system.path(cpu_id),
                            "no trace for thread; it stays idle"
                        );
                        Vec::new()
                    }
                };
                r.machine.threads.push(Thread {
                    stats: ThreadStats {
                        name: format!("{}.thread{tid}", system.path(cpu_id)),
                        ..ThreadStats::default()
                    },
                    accesses,
                    next: 0,
                    ready: 0,
                    issue_ticks,
                    ipath: ipath.clone(),
                    dpath: dpath.clone(),
                });
            }
        }
        Ok(r.machine)
    }
}

impl Backend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn instantiate(&mut self, system: &FrozenSystem, _outdir: &Path) -> Result<(), SimError> {
        if self.machine.is_some() {
            return Err(SimError::AlreadyInstantiated);
        }
        let machine = self.build(system)?;
        tracing::info!(
            threads = machine.threads.len(),
            caches = machine.caches.len(),
            buses = machine.buses.len(),
            "replay models built"
        );
        self.machine = Some(machine);
        Ok(())
    }

    fn simulate(&mut self, max_tick: Option<u64>) -> Result<ExitEvent, SimError> {
        let m = self.machine.as_mut().ok_or(SimError::NotInstantiated)?;

        let exit = loop {
            let next = m
                .threads
                .iter()
                .enumerate()
                .filter(|(_, t)| t.pending().is_some())
                .min_by_key(|(i, t)| (t.ready, *i))
                .map(|(i, _)| i);
            let Some(tid) = next else {
                break ExitEvent::new(m.tick, CAUSE_THREADS_DONE);
            };

            let ready = m.threads[tid].ready;
            // Leave `m.tick` alone: it holds the latest completion across resumes.
            if let Some(limit) = max_tick.filter(|&limit| ready >= limit) {
                break ExitEvent::new(limit, CAUSE_LIMIT);
            }

            let Some(access) = m.threads[tid].pending() else {
                continue;
            };
            if !m.ranges.iter().any(|r| r.contains(access.addr)) {
                return Err(SimError::UnmappedAddress { addr: access.addr });
            }

            let path = match access.kind {
                AccessKind::Fetch => m.threads[tid].ipath.clone(),
                AccessKind::Read | AccessKind::Write => m.threads[tid].dpath.clone(),
            };
            let latency = m.traverse(&path, access.addr, access.kind.is_write());

            let t = &mut m.threads[tid];
            match access.kind {
                AccessKind::Fetch => t.stats.fetches += 1,
                AccessKind::Read => t.stats.reads += 1,
                AccessKind::Write => t.stats.writes += 1,
            }
            t.next += 1;
            t.ready = ready + t.issue_ticks + latency;
            m.tick = m.tick.max(t.ready);
        };

        let mut stats = m.collect();
        stats.finish(exit.tick);
        self.stats = Some(stats);
        Ok(exit)
    }

    fn stats(&self) -> Option<&SimStats> {
        self.stats.as_ref()
    }
}

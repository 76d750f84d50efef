//! Simulation statistics collection and reporting.
//!
//! This module tracks what a backend measured during a run. It provides:
//! 1. **Summary:** Simulated ticks and seconds, tick frequency, and host wall-clock time.
//! 2. **Elaboration:** Object, connection, CPU, and cache totals of the frozen graph.
//! 3. **Threads:** Fetch, read, and write counts per hardware thread.
//! 4. **Caches:** Hits, misses, and write-backs per cache.
//! 5. **Interconnect and memory:** Bus transactions, controller reads/writes and row-buffer hits.
//!
//! Statistics are written in the simulator's text format, between
//! `---------- Begin Simulation Statistics ----------` and the matching end marker.

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Instant;

use crate::common::units::TICKS_PER_SECOND;

/// Per-thread access counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadStats {
    /// Stat prefix (`system.cpu.thread0`).
    pub name: String,
    /// Instruction fetches.
    pub fetches: u64,
    /// Data reads.
    pub reads: u64,
    /// Data writes.
    pub writes: u64,
}

/// Per-cache counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cache path.
    pub name: String,
    /// Lookups that hit.
    pub hits: u64,
    /// Lookups that missed.
    pub misses: u64,
    /// Dirty victims written back.
    pub writebacks: u64,
}

impl CacheStats {
    /// Miss ratio in `[0, 1]`; zero when the cache saw no accesses.
    pub fn miss_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64
        }
    }
}

/// Per-crossbar counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Crossbar path.
    pub name: String,
    /// Packets forwarded.
    pub transactions: u64,
}

/// Per-memory-controller counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemCtrlStats {
    /// Controller path.
    pub name: String,
    /// Read requests serviced.
    pub reads: u64,
    /// Write requests serviced.
    pub writes: u64,
    /// Accesses that hit the open row.
    pub row_hits: u64,
    /// Accesses that opened a row.
    pub row_misses: u64,
}

/// Size of the elaborated graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElaborationStats {
    /// Objects in the graph.
    pub objects: usize,
    /// Port connections.
    pub connections: usize,
    /// CPUs.
    pub cpus: usize,
    /// Caches.
    pub caches: usize,
}

/// Section names for selective output: `"summary"`, `"elaboration"`, `"threads"`,
/// `"caches"`, `"interconnect"`, `"memory"`.
pub const STATS_SECTIONS: &[&str] = &[
    "summary",
    "elaboration",
    "threads",
    "caches",
    "interconnect",
    "memory",
];

/// Statistics of one simulation run.
#[derive(Debug, Clone)]
pub struct SimStats {
    start_time: Instant,
    /// Ticks simulated.
    pub sim_ticks: u64,
    /// Host seconds elapsed, fixed by `finish`.
    pub host_seconds: f64,
    /// Graph totals.
    pub elaboration: Option<ElaborationStats>,
    /// Per-thread counts.
    pub threads: Vec<ThreadStats>,
    /// Per-cache counts.
    pub caches: Vec<CacheStats>,
    /// Per-crossbar counts.
    pub buses: Vec<BusStats>,
    /// Per-controller counts.
    pub mem_ctrls: Vec<MemCtrlStats>,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            sim_ticks: 0,
            host_seconds: 0.0,
            elaboration: None,
            threads: Vec::new(),
            caches: Vec::new(),
            buses: Vec::new(),
            mem_ctrls: Vec::new(),
        }
    }
}

fn stat(out: &mut impl Write, name: &str, value: impl Display, desc: &str) -> io::Result<()> {
    writeln!(out, "{name:<52} {value:>20}   # {desc}")
}

impl SimStats {
    /// Starts a new collection; host time is measured from now.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the final tick and freezes host time.
    pub fn finish(&mut self, sim_ticks: u64) {
        self.sim_ticks = sim_ticks;
        self.host_seconds = self.start_time.elapsed().as_secs_f64();
    }

    /// Simulated seconds.
    pub fn sim_seconds(&self) -> f64 {
        self.sim_ticks as f64 / TICKS_PER_SECOND as f64
    }

    /// Writes the requested sections; an empty slice writes all of them.
    pub fn write_sections(&self, out: &mut impl Write, sections: &[&str]) -> io::Result<()> {
        let want = |s: &str| sections.is_empty() || sections.contains(&s);

        if want("summary") {
            let seconds = format!("{:.6}", self.sim_seconds());
            let host = format!("{:.2}", self.host_seconds);
            stat(out, "simSeconds", seconds, "Number of seconds simulated (Second)")?;
            stat(out, "simTicks", self.sim_ticks, "Number of ticks simulated (Tick)")?;
            stat(
                out,
                "simFreq",
                TICKS_PER_SECOND,
                "The number of ticks per simulated second ((Tick/Second))",
            )?;
            stat(out, "hostSeconds", host, "Real time elapsed on the host (Second)")?;
        }
        if let Some(e) = self.elaboration.filter(|_| want("elaboration")) {
            stat(out, "system.numObjects", e.objects, "Objects in the system (Count)")?;
            stat(out, "system.numConnections", e.connections, "Port connections (Count)")?;
            stat(out, "system.numCpus", e.cpus, "CPUs (Count)")?;
            stat(out, "system.numCaches", e.caches, "Caches (Count)")?;
        }
        if want("threads") {
            for t in &self.threads {
                let rows = [
                    ("numFetches", t.fetches, "Instruction fetches (Count)"),
                    ("numReads", t.reads, "Data reads (Count)"),
                    ("numWrites", t.writes, "Data writes (Count)"),
                ];
                for (suffix, value, desc) in rows {
                    stat(out, &format!("{}.{suffix}", t.name), value, desc)?;
                }
            }
        }
        if want("caches") {
            for c in &self.caches {
                let rows = [
                    ("overallHits::total", c.hits, "number of overall hits (Count)"),
                    ("overallMisses::total", c.misses, "number of overall misses (Count)"),
                    ("writebacks::total", c.writebacks, "number of writebacks (Count)"),
                ];
                for (suffix, value, desc) in rows {
                    stat(out, &format!("{}.{suffix}", c.name), value, desc)?;
                }
                stat(
                    out,
                    &format!("{}.overallMissRate::total", c.name),
                    format!("{:.6}", c.miss_rate()),
                    "miss rate for overall accesses (Ratio)",
                )?;
            }
        }
        if want("interconnect") {
            for b in &self.buses {
                stat(
                    out,
                    &format!("{}.pktCount::total", b.name),
                    b.transactions,
                    "Packet count per connected requestor and responder (Count)",
                )?;
            }
        }
        if want("memory") {
            for m in &self.mem_ctrls {
                let rows = [
                    ("readReqs", m.reads, "Number of read requests accepted (Count)"),
                    ("writeReqs", m.writes, "Number of write requests accepted (Count)"),
                    ("dram.rowHits", m.row_hits, "Number of row buffer hits (Count)"),
                    ("dram.rowMisses", m.row_misses, "Number of row buffer misses (Count)"),
                ];
                for (suffix, value, desc) in rows {
                    stat(out, &format!("{}.{suffix}", m.name), value, desc)?;
                }
            }
        }
        Ok(())
    }

    /// Writes every section between the begin and end markers.
    pub fn dump(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "---------- Begin Simulation Statistics ----------")?;
        self.write_sections(out, &[])?;
        writeln!(out)?;
        writeln!(out, "---------- End Simulation Statistics   ----------")
    }
}

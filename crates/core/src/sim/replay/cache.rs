//! Set-associative cache model.
//!
//! Write-allocate with write-back: a write hit marks the line dirty, a write miss fills the
//! line dirty, and evicting a dirty line counts a write-back. Hits cost `max(tag, data)` cycles;
//! misses cost `tag + response` cycles on top of whatever the next level charges.

use crate::common::units::Frequency;
use crate::graph::CacheParams;
use crate::stats::CacheStats;

use super::policies::{self, ReplacementPolicy};

#[derive(Debug, Clone, Copy, Default)]
struct Line {
    tag: u64,
    valid: bool,
    dirty: bool,
}

/// Result of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// The line was present.
    pub hit: bool,
    /// Ticks charged by this cache.
    pub ticks: u64,
    /// A dirty victim was evicted.
    pub writeback: bool,
}

/// Timing and contents of one cache.
pub struct CacheModel {
    lines: Vec<Line>,
    sets: usize,
    ways: usize,
    line_bytes: u64,
    hit_ticks: u64,
    miss_ticks: u64,
    policy: Box<dyn ReplacementPolicy>,
    stats: CacheStats,
}

impl std::fmt::Debug for CacheModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheModel")
            .field("name", &self.stats.name)
            .field("sets", &self.sets)
            .field("ways", &self.ways)
            .field("line_bytes", &self.line_bytes)
            .finish_non_exhaustive()
    }
}

impl CacheModel {
    /// Builds an empty cache clocked by `clock`, the frequency of its owning domain.
    ///
    /// Geometry is assumed valid; the graph was checked when it was frozen.
    pub fn new(name: String, params: &CacheParams, line_bytes: u32, clock: Frequency) -> Self {
        let ways = params.assoc.max(1) as usize;
        let line_bytes = u64::from(line_bytes.max(1));
        let sets = ((params.size.bytes() / line_bytes) as usize / ways).max(1);
        let hit_cycles = u64::from(params.tag_latency.max(params.data_latency));
        let miss_cycles = u64::from(params.tag_latency) + u64::from(params.response_latency);
        Self {
            lines: vec![Line::default(); sets * ways],
            sets,
            ways,
            line_bytes,
            hit_ticks: clock.cycles_to_ticks(hit_cycles),
            miss_ticks: clock.cycles_to_ticks(miss_cycles),
            policy: policies::build(params.replacement, sets, ways),
            stats: CacheStats {
                name,
                ..CacheStats::default()
            },
        }
    }

    fn locate(&self, addr: u64) -> (usize, u64) {
        let block = addr / self.line_bytes;
        let set = (block % self.sets as u64) as usize;
        (set, block / self.sets as u64)
    }

    /// Returns `true` if `addr` is cached.
    pub fn contains(&self, addr: u64) -> bool {
        let (set, tag) = self.locate(addr);
        let base = set * self.ways;
        self.lines[base..base + self.ways]
            .iter()
            .any(|l| l.valid && l.tag == tag)
    }

    /// Looks up `addr`, filling it on a miss.
    pub fn access(&mut self, addr: u64, write: bool) -> Lookup {
        let (set, tag) = self.locate(addr);
        let base = set * self.ways;

        let hit_way = (0..self.ways).find(|w| {
            let l = &self.lines[base + w];
            l.valid && l.tag == tag
        });
        if let Some(way) = hit_way {
            self.policy.touch(set, way);
            self.lines[base + way].dirty |= write;
            self.stats.hits += 1;
            return Lookup {
                hit: true,
                ticks: self.hit_ticks,
                writeback: false,
            };
        }

        self.stats.misses += 1;
        let way = (0..self.ways)
            .find(|w| !self.lines[base + w].valid)
            .unwrap_or_else(|| self.policy.victim(set));
        let victim = self.lines[base + way];
        let writeback = victim.valid && victim.dirty;
        if writeback {
            self.stats.writebacks += 1;
        }
        self.lines[base + way] = Line {
            tag,
            valid: true,
            dirty: write,
        };
        self.policy.reset(set, way);
        Lookup {
            hit: false,
            ticks: self.miss_ticks,
            writeback,
        }
    }

    /// Counts collected so far.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

//! Memory controller timing.
//!
//! 1. **Simple:** Every access costs the part's fixed latency.
//! 2. **Row buffer:** One open row per controller. A hit on the open row costs `tCL + tBURST`,
//!    opening a row on an idle bank `tRCD + tCL + tBURST`, and replacing an open row
//!    `tRP + tRCD + tCL + tBURST`.
//!
//! All parameters are in ticks.

use crate::catalog::{MemoryPart, MemoryTiming};
use crate::stats::MemCtrlStats;

/// Latency model of one memory controller.
#[derive(Debug, Clone)]
pub struct MemCtrlModel {
    timing: MemoryTiming,
    open_row: Option<u64>,
    stats: MemCtrlStats,
}

impl MemCtrlModel {
    /// Creates a controller for `part` with no row open.
    pub fn new(name: String, part: &MemoryPart) -> Self {
        Self {
            timing: part.timing,
            open_row: None,
            stats: MemCtrlStats {
                name,
                ..MemCtrlStats::default()
            },
        }
    }

    /// Services one access and returns its latency in ticks.
    pub fn access(&mut self, addr: u64, write: bool) -> u64 {
        if write {
            self.stats.writes += 1;
        } else {
            self.stats.reads += 1;
        }

        match self.timing {
            MemoryTiming::Simple { latency } => latency,
            MemoryTiming::Dram {
                t_cl,
                t_rcd,
                t_rp,
                t_burst,
                row_buffer_bytes,
            } => {
                let row = addr / row_buffer_bytes.max(1);
                match self.open_row {
                    Some(open) if open == row => {
                        self.stats.row_hits += 1;
                        t_cl + t_burst
                    }
                    Some(_) => {
                        self.stats.row_misses += 1;
                        self.open_row = Some(row);
                        t_rp + t_rcd + t_cl + t_burst
                    }
                    None => {
                        self.stats.row_misses += 1;
                        self.open_row = Some(row);
                        t_rcd + t_cl + t_burst
                    }
                }
            }
        }
    }

    /// Counts collected so far.
    pub const fn stats(&self) -> &MemCtrlStats {
        &self.stats
    }
}

//! Dry-run backend. Elaborates the system and exits at tick 0 without running it.

use std::path::Path;

use crate::common::error::SimError;
use crate::graph::FrozenSystem;
use crate::stats::{ElaborationStats, SimStats};

use super::{Backend, ExitEvent};

/// Cause reported by the dry-run backend.
pub const CAUSE_DRY_RUN: &str = "dry run: configuration elaborated";

/// Elaborates the system without executing it.
///
/// Statistics carry only the size of the graph.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    stats: Option<SimStats>,
}

impl DryRunBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for DryRunBackend {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn instantiate(&mut self, system: &FrozenSystem, _outdir: &Path) -> Result<(), SimError> {
        let mut stats = SimStats::new();
        stats.elaboration = Some(ElaborationStats {
            objects: system.graph().len(),
            connections: system.graph().edges().len(),
            cpus: system.cpus().count(),
            caches: system.caches().count(),
        });
        self.stats = Some(stats);
        Ok(())
    }

    fn simulate(&mut self, _max_tick: Option<u64>) -> Result<ExitEvent, SimError> {
        let stats = self.stats.as_mut().ok_or(SimError::NotInstantiated)?;
        stats.finish(0);
        Ok(ExitEvent::new(0, CAUSE_DRY_RUN))
    }

    fn stats(&self) -> Option<&SimStats> {
        self.stats.as_ref()
    }
}

//! Simulation handoff.
//!
//! A frozen system crosses into execution through exactly one boundary, the `Backend` trait.
//! This module provides:
//! 1. **Boundary:** `Backend` with `instantiate`, `simulate`, and `stats`.
//! 2. **Driver:** `Simulation` enforces the `Created -> Instantiated -> Finished` lifecycle,
//!    dumps `config.json`/`config.dot`, prints the run banner and exit line, and writes stats.
//! 3. **Backends:** Dry run (elaborate only), external simulator process, and trace replay.

/// Elaborate-only backend.
pub mod dry_run;
/// External simulator process backend.
pub mod external;
/// Trace-driven cache and memory replay backend.
pub mod replay;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub use dry_run::DryRunBackend;
pub use external::ExternalBackend;
pub use replay::ReplayBackend;

use crate::common::error::SimError;
use crate::config::{BackendKind, RunConfig};
use crate::graph::FrozenSystem;
use crate::graph::export;
use crate::stats::SimStats;

/// Cause reported when every thread has run out of work.
pub const CAUSE_THREADS_DONE: &str = "exiting with last active thread context";

/// Cause reported when the tick limit stops a run.
pub const CAUSE_LIMIT: &str = "simulate() limit reached";

/// Why and when a `simulate` call returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitEvent {
    /// Tick at which the simulation stopped.
    pub tick: u64,
    /// Human-readable cause.
    pub cause: String,
}

impl ExitEvent {
    /// Creates an exit event.
    pub fn new(tick: u64, cause: impl Into<String>) -> Self {
        Self {
            tick,
            cause: cause.into(),
        }
    }

    /// Returns `true` if the tick limit caused the exit; simulation can then resume.
    pub fn is_limit(&self) -> bool {
        self.cause == CAUSE_LIMIT
    }
}

/// An execution engine for frozen systems.
pub trait Backend {
    /// Short name for logs (`"replay"`).
    fn name(&self) -> &'static str;

    /// Prepares to run `system`; `outdir` already holds `config.json`.
    fn instantiate(&mut self, system: &FrozenSystem, outdir: &Path) -> Result<(), SimError>;

    /// Runs until an exit event or until `max_tick`, if given.
    fn simulate(&mut self, max_tick: Option<u64>) -> Result<ExitEvent, SimError>;

    /// Statistics gathered so far, if this backend collects any.
    fn stats(&self) -> Option<&SimStats>;
}

/// Builds the backend selected in `run`.
pub fn backend_for(run: &RunConfig) -> Result<Box<dyn Backend>, SimError> {
    Ok(match run.backend {
        BackendKind::DryRun => Box::new(DryRunBackend::new()),
        BackendKind::External => {
            let program = run.simulator.clone().ok_or(SimError::MissingSimulator)?;
            Box::new(ExternalBackend::new(program, run.simulator_args.clone()))
        }
        BackendKind::Replay => Box::new(ReplayBackend::new(run.traces.clone())),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Instantiated,
    Finished,
}

/// Files written and the exit event of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Final exit event.
    pub exit: ExitEvent,
    /// Path of `config.json`.
    pub config_json: PathBuf,
    /// Path of `config.dot`.
    pub config_dot: PathBuf,
    /// Path of the statistics file, when the backend produced statistics.
    pub stats_file: Option<PathBuf>,
}

/// Drives one backend through a single run.
pub struct Simulation {
    backend: Box<dyn Backend>,
    outdir: PathBuf,
    stats_file: String,
    phase: Phase,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("backend", &self.backend.name())
            .field("outdir", &self.outdir)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SimError + '_ {
    move |source| SimError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl Simulation {
    /// Wraps `backend`, writing output under `outdir`.
    pub fn new(backend: Box<dyn Backend>, outdir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            outdir: outdir.into(),
            stats_file: "stats.txt".to_string(),
            phase: Phase::Created,
        }
    }

    /// Sets the statistics file name inside the output directory.
    #[must_use]
    pub fn with_stats_file(mut self, name: impl Into<String>) -> Self {
        self.stats_file = name.into();
        self
    }

    /// Output directory.
    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Name of the wrapped backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Writes the configuration dumps and instantiates the backend.
    pub fn instantiate(&mut self, system: &FrozenSystem) -> Result<(PathBuf, PathBuf), SimError> {
        if self.phase != Phase::Created {
            return Err(SimError::AlreadyInstantiated);
        }
        fs::create_dir_all(&self.outdir).map_err(io_err(&self.outdir))?;

        let json_path = self.outdir.join("config.json");
        let json = serde_json::to_string_pretty(&export::to_json(system)?)?;
        fs::write(&json_path, json).map_err(io_err(&json_path))?;

        let dot_path = self.outdir.join("config.dot");
        fs::write(&dot_path, export::to_dot(system)).map_err(io_err(&dot_path))?;

        self.backend.instantiate(system, &self.outdir)?;
        self.phase = Phase::Instantiated;
        tracing::info!(backend = self.backend.name(), outdir = %self.outdir.display(), "instantiated");
        Ok((json_path, dot_path))
    }

    /// Runs the backend until its next exit event.
    ///
    /// A run stopped by the tick limit may be resumed; any other exit finishes it.
    pub fn simulate(&mut self, max_tick: Option<u64>) -> Result<ExitEvent, SimError> {
        match self.phase {
            Phase::Created => return Err(SimError::NotInstantiated),
            Phase::Finished => return Err(SimError::Finished),
            Phase::Instantiated => {}
        }
        let exit = self.backend.simulate(max_tick)?;
        if !exit.is_limit() {
            self.phase = Phase::Finished;
        }
        tracing::info!(tick = exit.tick, cause = %exit.cause, "simulate returned");
        Ok(exit)
    }

    /// Writes backend statistics to the stats file; returns its path if anything was written.
    pub fn dump_stats(&self) -> Result<Option<PathBuf>, SimError> {
        let Some(stats) = self.backend.stats() else {
            return Ok(None);
        };
        let path = self.outdir.join(&self.stats_file);
        let file = File::create(&path).map_err(io_err(&path))?;
        let mut out = BufWriter::new(file);
        stats.dump(&mut out).map_err(io_err(&path))?;
        out.flush().map_err(io_err(&path))?;
        Ok(Some(path))
    }

    /// Instantiates, simulates once, and dumps statistics.
    pub fn run(&mut self, system: &FrozenSystem, max_tick: Option<u64>) -> Result<RunSummary, SimError> {
        let (config_json, config_dot) = self.instantiate(system)?;
        println!("Beginning simulation!");
        let exit = self.simulate(max_tick)?;
        println!("Exiting @ tick {} because {}", exit.tick, exit.cause);
        let stats_file = self.dump_stats()?;
        Ok(RunSummary {
            exit,
            config_json,
            config_dot,
            stats_file,
        })
    }
}

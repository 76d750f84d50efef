//! External simulator backend.
//!
//! Runs `program args... [--abs-max-tick N] --outdir <outdir> <outdir>/config.json`, echoes
//! its standard output, and takes the last `Exiting @ tick N because CAUSE` line as the exit
//! event. The external program writes its own statistics.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::common::error::SimError;
use crate::graph::FrozenSystem;
use crate::stats::SimStats;

use super::{Backend, ExitEvent};

/// Parses an `Exiting @ tick N because CAUSE` line.
pub fn parse_exit_line(line: &str) -> Option<ExitEvent> {
    let rest = line.trim().strip_prefix("Exiting @ tick ")?;
    let (tick, cause) = rest.split_once(" because ")?;
    Some(ExitEvent::new(tick.trim().parse().ok()?, cause.trim()))
}

/// Hands the dumped configuration to another simulator binary.
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    program: PathBuf,
    args: Vec<String>,
    outdir: Option<PathBuf>,
}

impl ExternalBackend {
    /// Creates a backend running `program` with leading `args`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            outdir: None,
        }
    }

    /// Full argument list for a run limited to `max_tick`.
    pub fn command_args(&self, outdir: &Path, max_tick: Option<u64>) -> Vec<String> {
        let mut argv = self.args.clone();
        if let Some(tick) = max_tick {
            argv.push("--abs-max-tick".into());
            argv.push(tick.to_string());
        }
        argv.push("--outdir".into());
        argv.push(outdir.display().to_string());
        argv.push(outdir.join("config.json").display().to_string());
        argv
    }
}

impl Backend for ExternalBackend {
    fn name(&self) -> &'static str {
        "external"
    }

    fn instantiate(&mut self, _system: &FrozenSystem, outdir: &Path) -> Result<(), SimError> {
        self.outdir = Some(outdir.to_path_buf());
        Ok(())
    }

    fn simulate(&mut self, max_tick: Option<u64>) -> Result<ExitEvent, SimError> {
        let outdir = self.outdir.as_deref().ok_or(SimError::NotInstantiated)?;
        let argv = self.command_args(outdir, max_tick);
        tracing::info!(program = %self.program.display(), args = ?argv, "starting external simulator");

        let spawn_err = |source| SimError::Spawn {
            program: self.program.clone(),
            source,
        };
        let mut child = Command::new(&self.program)
            .args(&argv)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        let mut exit = None;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(source) => {
                        // Reap the child before reporting.
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SimError::Output {
                            program: self.program.clone(),
                            source,
                        });
                    }
                };
                println!("{line}");
                if let Some(event) = parse_exit_line(&line) {
                    exit = Some(event);
                }
            }
        }
        let status = child.wait().map_err(spawn_err)?;

        match exit {
            Some(event) => Ok(event),
            None if status.success() => Ok(ExitEvent::new(0, "simulator exited without an exit event")),
            None => Err(SimError::External {
                program: self.program.clone(),
                status: status.to_string(),
            }),
        }
    }

    fn stats(&self) -> Option<&SimStats> {
        None
    }
}

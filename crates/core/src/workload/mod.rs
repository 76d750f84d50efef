//! Workload and process derivation.
//!
//! Turns the raw workload flags into process descriptors:
//! 1. **Splitting:** `cmd` is split on literal `;`; each auxiliary string (inputs, outputs,
//!    error outputs, options) is split the same way unless it is empty, which means "no entries".
//! 2. **Alignment:** Entry `i` of each auxiliary list belongs to workload `i`. Shorter lists
//!    leave later workloads without that setting.
//! 3. **Threads:** With SMT every process becomes a hardware thread of one out-of-order CPU.

/// ELF inspection for the system workload.
pub mod binary;
/// Process descriptor.
pub mod process;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use binary::SeWorkload;
pub use process::{BASE_PID, Process};

use crate::catalog::CpuModel;
use crate::common::error::WorkloadError;

/// Raw workload flags as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadArgs {
    /// `;`-separated executables
    pub cmd: Option<String>,
    /// `;`-separated stdin redirections
    pub input: String,
    /// `;`-separated stdout redirections
    pub output: String,
    /// `;`-separated stderr redirections
    pub errout: String,
    /// `;`-separated option strings, each split on whitespace
    pub options: String,
    /// File of `NAME=value` lines shared by every process
    pub env: Option<PathBuf>,
}

/// Launch environment captured once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    /// Working directory given to every process
    pub cwd: PathBuf,
    /// Group id given to every process
    pub gid: u32,
}

impl LaunchContext {
    /// Captures the current directory and group id of this process.
    pub fn current() -> Result<Self, WorkloadError> {
        let cwd = env::current_dir().map_err(WorkloadError::LaunchDir)?;
        Ok(Self {
            cwd,
            gid: current_gid(),
        })
    }
}

#[cfg(unix)]
fn current_gid() -> u32 {
    // SAFETY: getgid has no preconditions and cannot fail.
    unsafe { libc::getgid() }
}

#[cfg(not(unix))]
fn current_gid() -> u32 {
    0
}

/// Processes derived from one set of workload flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSet {
    /// Processes in workload order
    pub processes: Vec<Process>,
    /// Hardware threads per CPU (process count with SMT, otherwise 1)
    pub num_threads: usize,
}

/// Splits an auxiliary flag; an empty flag has no entries.
fn split_aux(value: &str) -> Vec<&str> {
    if value.is_empty() {
        Vec::new()
    } else {
        value.split(';').collect()
    }
}

fn note_short(name: &str, list: &[&str], workloads: usize) {
    if !list.is_empty() && list.len() < workloads {
        tracing::debug!(
            flag = name,
            entries = list.len(),
            workloads,
            "auxiliary list shorter than workload list; later workloads get none"
        );
    }
}

fn read_env_file(path: &Path) -> Result<Vec<String>, WorkloadError> {
    let text = fs::read_to_string(path).map_err(|source| WorkloadError::EnvFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.lines().map(|line| line.trim_end().to_string()).collect())
}

/// Builds one process per `;`-separated workload in `args.cmd`.
///
/// Fails with [`WorkloadError::NoWorkload`] when `cmd` is absent or empty, and with
/// [`WorkloadError::SmtRequiresO3`] when `smt` is set for a CPU outside the O3 class.
pub fn get_processes(
    args: &WorkloadArgs,
    ctx: &LaunchContext,
    smt: bool,
    cpu: &CpuModel,
) -> Result<ProcessSet, WorkloadError> {
    let cmd = match args.cmd.as_deref() {
        Some(cmd) if !cmd.is_empty() => cmd,
        _ => return Err(WorkloadError::NoWorkload),
    };

    let workloads: Vec<&str> = cmd.split(';').collect();
    let inputs = split_aux(&args.input);
    let outputs = split_aux(&args.output);
    let errouts = split_aux(&args.errout);
    let pargs = split_aux(&args.options);

    for (name, list) in [
        ("input", &inputs),
        ("output", &outputs),
        ("errout", &errouts),
        ("options", &pargs),
    ] {
        note_short(name, list, workloads.len());
    }

    let env = match &args.env {
        Some(path) => read_env_file(path)?,
        None => Vec::new(),
    };

    let nth = |list: &[&str], idx: usize| list.get(idx).map(|s| (*s).to_string());

    let processes: Vec<Process> = workloads
        .iter()
        .enumerate()
        .map(|(idx, wrkld)| {
            let mut argv = vec![(*wrkld).to_string()];
            if let Some(opts) = pargs.get(idx) {
                argv.extend(opts.split_whitespace().map(str::to_string));
            }
            Process {
                pid: BASE_PID + idx as u32,
                executable: (*wrkld).to_string(),
                cwd: ctx.cwd.clone(),
                gid: ctx.gid,
                env: env.clone(),
                cmd: argv,
                input: nth(&inputs, idx),
                output: nth(&outputs, idx),
                errout: nth(&errouts, idx),
            }
        })
        .collect();

    for p in &processes {
        tracing::debug!(pid = p.pid, cmd = %p.command_line(), "process created");
    }

    if smt {
        if !cpu.class.is_o3() {
            return Err(WorkloadError::SmtRequiresO3 {
                cpu_type: cpu.name.to_string(),
            });
        }
        let num_threads = processes.len();
        return Ok(ProcessSet {
            processes,
            num_threads,
        });
    }

    Ok(ProcessSet {
        processes,
        num_threads: 1,
    })
}

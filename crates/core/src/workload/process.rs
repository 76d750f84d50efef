//! Per-workload process descriptor.

use std::path::PathBuf;

use serde::Serialize;

/// First process id; workload `i` receives `BASE_PID + i`.
pub const BASE_PID: u32 = 100;

/// A syscall-emulation process synthesized from one workload entry.
///
/// Built once by [`super::get_processes`] and never mutated afterwards; the builder moves it
/// into the frozen graph, from which backends read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Process {
    /// Process id (`100 + index`)
    pub pid: u32,
    /// Executable path as given on the command line
    pub executable: String,
    /// Launch directory
    pub cwd: PathBuf,
    /// Launching user's group id
    pub gid: u32,
    /// `NAME=value` environment entries
    pub env: Vec<String>,
    /// Argument vector: executable followed by its options
    pub cmd: Vec<String>,
    /// stdin redirection
    pub input: Option<String>,
    /// stdout redirection
    pub output: Option<String>,
    /// stderr redirection
    pub errout: Option<String>,
}

impl Process {
    /// Returns the argument vector joined by spaces, as shown in logs.
    pub fn command_line(&self) -> String {
        self.cmd.join(" ")
    }
}

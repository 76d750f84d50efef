//! Error definitions.
//!
//! Each stage of the flow from flags to finished simulation has its own error enum:
//! 1. **Input:** `UnitError`, `ConfigError`, `CatalogError`, `WorkloadError`.
//! 2. **Composition:** `BuildError`, `GraphError`, and the `ValidationIssue`s collected
//!    when a graph is frozen.
//! 3. **Execution:** `SimError` from the backend boundary.
//!
//! `Error` wraps all of them so callers can use `?` across stages.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::units::AddrRange;
use crate::catalog::Isa;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A quantity string (`"16kB"`, `"2GHz"`, `"1.0V"`) could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The input is not a valid quantity of the given kind.
    #[error("invalid {kind} '{input}': {reason}")]
    Invalid {
        /// Quantity kind (e.g. `"clock"`).
        kind: &'static str,
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file '{}': {source}", .path.display())]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("invalid config file '{}': {source}", .path.display())]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A quantity override was malformed.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Lookup failures in the preset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No preset of `kind` is registered under `name`.
    #[error("'{name}' is not a valid {kind} (available: {})", .available.join(", "))]
    Unknown {
        /// Preset category (e.g. `"CPU type"`).
        kind: &'static str,
        /// Requested name.
        name: String,
        /// Registered names of that category.
        available: Vec<String>,
    },
}

/// Workload and process derivation errors.
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// No workload command was supplied.
    #[error("No workload specified")]
    NoWorkload,
    /// The environment file could not be read.
    #[error("could not read environment file '{}': {source}", .path.display())]
    EnvFile {
        /// Environment file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The launch directory could not be determined.
    #[error("could not determine the launch directory: {0}")]
    LaunchDir(#[source] io::Error),
    /// SMT was requested for a CPU model outside the out-of-order class.
    #[error("SMT requires an O3CPU (selected '{cpu_type}')")]
    SmtRequiresO3 {
        /// Selected CPU type.
        cpu_type: String,
    },
    /// The workload binary could not be read.
    #[error("could not read workload binary '{}': {source}", .path.display())]
    Binary {
        /// Binary path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The workload binary is not an ELF executable.
    #[error("'{}' is not an ELF executable: {reason}", .path.display())]
    NotElf {
        /// Binary path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
    /// The workload binary targets an architecture with no syscall-emulation support.
    #[error("'{}' targets unsupported architecture {arch}", .path.display())]
    UnsupportedArch {
        /// Binary path.
        path: PathBuf,
        /// Architecture as reported by the ELF header.
        arch: String,
    },
}

/// Topology construction errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// SMT cannot be combined with several CPUs.
    #[error("You cannot use SMT with multiple CPUs! ({num_cpus} requested)")]
    SmtMultipleCpus {
        /// Requested CPU count.
        num_cpus: usize,
    },
    /// More CPUs than workloads when each CPU needs its own process.
    #[error("{num_cpus} CPUs requested but only {workloads} workloads given")]
    NotEnoughWorkloads {
        /// Requested CPU count.
        num_cpus: usize,
        /// Number of processes.
        workloads: usize,
    },
    /// Zero CPUs requested.
    #[error("at least one CPU is required")]
    NoCpus,
    /// A preset lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A connection was rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Object graph errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The object does not declare a port with that name.
    #[error("{object} has no port named '{port}'")]
    UnknownPort {
        /// Object path.
        object: String,
        /// Requested port.
        port: String,
    },
    /// Both ends have the same role.
    #[error("cannot connect {a} to {b}: both are {role} ports")]
    RoleMismatch {
        /// First endpoint.
        a: String,
        /// Second endpoint.
        b: String,
        /// Shared role.
        role: String,
    },
    /// A non-vector port is already bound.
    #[error("{port} is already connected to {peer}")]
    AlreadyConnected {
        /// Port being bound.
        port: String,
        /// Existing peer.
        peer: String,
    },
    /// An object id does not belong to this graph.
    #[error("object id {0} does not exist")]
    UnknownObject(usize),
    /// Freezing found one or more problems.
    #[error("system failed validation:{}", IssueList(.0))]
    Validation(Vec<ValidationIssue>),
}

struct IssueList<'a>(&'a [ValidationIssue]);

impl fmt::Display for IssueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in self.0 {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

/// A single problem found while freezing a system graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// No root object.
    #[error("no root object")]
    MissingRoot,
    /// More than one root object.
    #[error("{count} root objects (expected one)")]
    MultipleRoots {
        /// Number of roots found.
        count: usize,
    },
    /// The root holds no `System`.
    #[error("root contains no system")]
    MissingSystem,
    /// The system has no syscall-emulation workload.
    #[error("system has no workload")]
    MissingSeWorkload,
    /// A non-vector port has no peer.
    #[error("port {port} is not connected")]
    UnconnectedPort {
        /// Port path.
        port: String,
    },
    /// The system cache line size is not a power of two.
    #[error("cache line size {size} is not a power of two")]
    CacheLineSize {
        /// Configured line size.
        size: u32,
    },
    /// A cache's size, associativity, and line size do not form a valid geometry.
    #[error("{cache}: {reason}")]
    CacheGeometry {
        /// Cache path.
        cache: String,
        /// What is wrong.
        reason: String,
    },
    /// No memory controller is present.
    #[error("no memory controller")]
    NoMemoryController,
    /// A memory interface range falls outside the system memory ranges.
    #[error("{interface} range {range} is outside the system memory ranges")]
    MemRangeOutside {
        /// Interface path.
        interface: String,
        /// Offending range.
        range: AddrRange,
    },
    /// A CPU's clock domain is missing or not a clock domain.
    #[error("{cpu} has no valid clock domain")]
    NoClockDomain {
        /// CPU path.
        cpu: String,
    },
    /// A CPU has no workload process.
    #[error("{cpu} has no workload")]
    NoWorkload {
        /// CPU path.
        cpu: String,
    },
    /// A multithreaded CPU is not of the out-of-order class.
    #[error("{cpu} runs {threads} threads but SMT requires an O3CPU")]
    SmtRequiresO3 {
        /// CPU path.
        cpu: String,
        /// Thread count.
        threads: usize,
    },
    /// A requestor port has no path to a memory controller.
    #[error("{port} does not reach a memory controller")]
    Unreachable {
        /// Starting port path.
        port: String,
    },
    /// Following a requestor port loops back on itself.
    #[error("request path from {port} contains a cycle")]
    Cycle {
        /// Starting port path.
        port: String,
    },
    /// The CPU model cannot run the workload's ISA.
    #[error("{cpu} ({cpu_isa}) cannot run a {workload_isa} workload")]
    IsaMismatch {
        /// CPU path.
        cpu: String,
        /// CPU model ISA.
        cpu_isa: Isa,
        /// Workload ISA.
        workload_isa: Isa,
    },
}

/// Backend and simulation driver errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// `simulate` called before `instantiate`.
    #[error("simulate() called before instantiate()")]
    NotInstantiated,
    /// `instantiate` called twice.
    #[error("system has already been instantiated")]
    AlreadyInstantiated,
    /// `simulate` called after the run finished.
    #[error("simulation has already finished")]
    Finished,
    /// An output file could not be written or an input file read.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A replay trace line is malformed.
    #[error("{}:{line}: {reason}", .path.display())]
    Trace {
        /// Trace path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What is wrong.
        reason: String,
    },
    /// An access targets no memory interface.
    #[error("access to unmapped address {addr:#x}")]
    UnmappedAddress {
        /// Accessed address.
        addr: u64,
    },
    /// The external simulator could not be started.
    #[error("could not start simulator '{}': {source}", .program.display())]
    Spawn {
        /// Program path.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading the external simulator's standard output failed.
    #[error("could not read output of simulator '{}': {source}", .program.display())]
    Output {
        /// Program path.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The external backend was selected without a simulator program.
    #[error("the external backend requires a simulator program (--simulator)")]
    MissingSimulator,
    /// The external simulator failed without reporting an exit event.
    #[error("simulator '{}' failed: {status}", .program.display())]
    External {
        /// Program path.
        program: PathBuf,
        /// Exit status description.
        status: String,
    },
    /// The frozen system cannot be mapped onto the backend's models.
    #[error("cannot model {object}: {reason}")]
    Model {
        /// Object path.
        object: String,
        /// What is missing.
        reason: String,
    },
    /// Serializing the configuration failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Quantity parsing.
    #[error(transparent)]
    Unit(#[from] UnitError),
    /// Configuration loading.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Preset lookup.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Workload derivation.
    #[error(transparent)]
    Workload(#[from] WorkloadError),
    /// Topology construction.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Graph connection or validation.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Simulation.
    #[error(transparent)]
    Sim(#[from] SimError),
}

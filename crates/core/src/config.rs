//! Configuration system for simulated-system composition.
//!
//! This module defines all configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline parameters matching the driver options (512MB memory, 1GHz system
//!    clock, 2GHz CPU clock, 64-byte lines, `AtomicSimpleCPU`, `DDR3_1600_8x8`).
//! 2. **Structures:** Hierarchical config for the system, CPU, cache hierarchy, memory, and run.
//! 3. **Enums:** Backend selection and replacement-policy overrides.
//!
//! Configuration is read from JSON (`Config::from_json_file`) and then overridden by explicit
//! command-line flags, or built with `Config::default()`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;
use crate::common::units::{Frequency, MemSize, Voltage};

/// Default configuration constants.
///
/// These values match the shared option helper the driver scripts delegate to.
mod defaults {
    use crate::common::units::{Frequency, MemSize, Voltage};

    /// Physical memory size (512 MiB).
    pub const MEM_SIZE: MemSize = MemSize::mib(512);

    /// System cache line size in bytes.
    pub const CACHELINE_SIZE: u32 = 64;

    /// System (bus, L2, memory) clock.
    pub const SYS_CLOCK: Frequency = Frequency::ghz(1);

    /// CPU clock.
    pub const CPU_CLOCK: Frequency = Frequency::ghz(2);

    /// System voltage domain.
    pub const SYS_VOLTAGE: Voltage = Voltage::from_volts(1.0);

    /// Number of CPUs.
    pub const NUM_CPUS: usize = 1;

    /// CPU model name.
    pub const CPU_TYPE: &str = "AtomicSimpleCPU";

    /// Instructions between simpoint samples.
    pub const SIMPOINT_INTERVAL: u64 = 100_000_000;

    /// Memory part name.
    pub const MEM_TYPE: &str = "DDR3_1600_8x8";

    /// Output directory for config and stats dumps.
    pub const OUTDIR: &str = "m5out";

    /// Statistics file name inside the output directory.
    pub const STATS_FILE: &str = "stats.txt";

    /// Preset for the L1 instruction cache.
    pub const L1I_PRESET: &str = "L1ICache";

    /// Preset for the L1 data cache.
    pub const L1D_PRESET: &str = "L1DCache";

    /// Preset for the shared L2 cache.
    pub const L2_PRESET: &str = "L2Cache";
}

/// Cache replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ReplacementPolicy {
    /// Least recently used.
    #[default]
    #[serde(rename = "LRURP", alias = "LRU", alias = "Lru")]
    Lru,
    /// First in, first out.
    #[serde(rename = "FIFORP", alias = "FIFO", alias = "Fifo")]
    Fifo,
    /// Pseudo-random victim.
    #[serde(rename = "RandomRP", alias = "Random")]
    Random,
    /// Most recently used.
    #[serde(rename = "MRURP", alias = "MRU", alias = "Mru")]
    Mru,
    /// Tree pseudo-LRU.
    #[serde(rename = "TreePLRURP", alias = "PLRU", alias = "Plru")]
    TreePlru,
}

impl ReplacementPolicy {
    /// Returns the policy's class name as written in configuration (`"LRURP"`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lru => "LRURP",
            Self::Fifo => "FIFORP",
            Self::Random => "RandomRP",
            Self::Mru => "MRURP",
            Self::TreePlru => "TreePLRURP",
        }
    }
}

/// Execution engine the frozen system is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Elaborate and dump the configuration without simulating.
    #[default]
    DryRun,
    /// Replay per-process memory access traces through the cache and memory models.
    Replay,
    /// Run an external simulator binary on the dumped configuration.
    External,
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use simwire_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.cpu.cpu_type, "AtomicSimpleCPU");
/// assert_eq!(config.system.cacheline_size, 64);
/// ```
///
/// Partial JSON keeps defaults for everything it leaves out:
///
/// ```
/// use simwire_core::config::Config;
///
/// let json = r#"{
///     "system": { "mem_size": "8192MB", "cpu_clock": "3GHz" },
///     "cpu": { "cpu_type": "X86O3CPU", "smt": true },
///     "caches": { "caches": true, "l2cache": true, "l2": { "size": "1MB" } }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.system.mem_size.bytes(), 8192 * 1024 * 1024);
/// assert_eq!(config.system.cpu_clock.hz(), 3_000_000_000);
/// assert!(config.cpu.smt);
/// assert_eq!(config.caches.l1i.preset, "L1ICache");
/// assert_eq!(config.memory.mem_type, "DDR3_1600_8x8");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Memory size, clocks, and voltages
    pub system: SystemConfig,
    /// CPU model and predictor selection
    pub cpu: CpuConfig,
    /// Cache hierarchy
    pub caches: CacheHierarchyConfig,
    /// Main memory
    pub memory: MemoryConfig,
    /// Backend, limits, and output locations
    pub run: RunConfig,
}

impl Config {
    /// Loads a configuration from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// System-wide parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SystemConfig {
    /// Physical memory size
    #[serde(default = "SystemConfig::default_mem_size")]
    pub mem_size: MemSize,

    /// Cache line size in bytes
    #[serde(default = "SystemConfig::default_cacheline_size")]
    pub cacheline_size: u32,

    /// System clock (buses, L2, memory controller)
    #[serde(default = "SystemConfig::default_sys_clock")]
    pub sys_clock: Frequency,

    /// System voltage domain
    #[serde(default = "SystemConfig::default_sys_voltage")]
    pub sys_voltage: Voltage,

    /// CPU clock
    #[serde(default = "SystemConfig::default_cpu_clock")]
    pub cpu_clock: Frequency,

    /// Number of CPUs
    #[serde(default = "SystemConfig::default_num_cpus")]
    pub num_cpus: usize,
}

impl SystemConfig {
    fn default_mem_size() -> MemSize {
        defaults::MEM_SIZE
    }

    fn default_cacheline_size() -> u32 {
        defaults::CACHELINE_SIZE
    }

    fn default_sys_clock() -> Frequency {
        defaults::SYS_CLOCK
    }

    fn default_sys_voltage() -> Voltage {
        defaults::SYS_VOLTAGE
    }

    fn default_cpu_clock() -> Frequency {
        defaults::CPU_CLOCK
    }

    fn default_num_cpus() -> usize {
        defaults::NUM_CPUS
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mem_size: defaults::MEM_SIZE,
            cacheline_size: defaults::CACHELINE_SIZE,
            sys_clock: defaults::SYS_CLOCK,
            sys_voltage: defaults::SYS_VOLTAGE,
            cpu_clock: defaults::CPU_CLOCK,
            num_cpus: defaults::NUM_CPUS,
        }
    }
}

/// CPU model and optional attachments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CpuConfig {
    /// CPU model name, resolved through the catalog
    #[serde(default = "CpuConfig::default_cpu_type")]
    pub cpu_type: String,

    /// Branch predictor name
    #[serde(default)]
    pub bp_type: Option<String>,

    /// Indirect branch predictor name
    #[serde(default)]
    pub indirect_bp_type: Option<String>,

    /// Run every workload as a hardware thread on one CPU
    #[serde(default)]
    pub smt: bool,

    /// Attach a checker CPU
    #[serde(default)]
    pub checker: bool,

    /// Attach a simpoint profiling probe
    #[serde(default)]
    pub simpoint_profile: bool,

    /// Instructions per simpoint interval
    #[serde(default = "CpuConfig::default_simpoint_interval")]
    pub simpoint_interval: u64,

    /// Wait for a remote debugger before running
    #[serde(default)]
    pub wait_gdb: bool,
}

impl CpuConfig {
    fn default_cpu_type() -> String {
        defaults::CPU_TYPE.to_string()
    }

    fn default_simpoint_interval() -> u64 {
        defaults::SIMPOINT_INTERVAL
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            cpu_type: defaults::CPU_TYPE.to_string(),
            bp_type: None,
            indirect_bp_type: None,
            smt: false,
            checker: false,
            simpoint_profile: false,
            simpoint_interval: defaults::SIMPOINT_INTERVAL,
            wait_gdb: false,
        }
    }
}

/// Cache hierarchy selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheHierarchyConfig {
    /// Private L1 instruction and data caches per CPU
    #[serde(default)]
    pub caches: bool,

    /// Shared L2 cache behind an L2 crossbar
    #[serde(default)]
    pub l2cache: bool,

    /// L1 instruction cache
    #[serde(default = "CacheHierarchyConfig::default_l1i")]
    pub l1i: CacheSelection,

    /// L1 data cache
    #[serde(default = "CacheHierarchyConfig::default_l1d")]
    pub l1d: CacheSelection,

    /// Shared L2 cache
    #[serde(default = "CacheHierarchyConfig::default_l2")]
    pub l2: CacheSelection,
}

impl CacheHierarchyConfig {
    fn default_l1i() -> CacheSelection {
        CacheSelection::preset(defaults::L1I_PRESET)
    }

    fn default_l1d() -> CacheSelection {
        CacheSelection::preset(defaults::L1D_PRESET)
    }

    fn default_l2() -> CacheSelection {
        CacheSelection::preset(defaults::L2_PRESET)
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            caches: false,
            l2cache: false,
            l1i: Self::default_l1i(),
            l1d: Self::default_l1d(),
            l2: Self::default_l2(),
        }
    }
}

/// A cache preset plus optional parameter overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSelection {
    /// Preset name, resolved through the catalog
    pub preset: String,

    /// Capacity override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<MemSize>,

    /// Associativity override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assoc: Option<u32>,

    /// Replacement policy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<ReplacementPolicy>,
}

impl CacheSelection {
    /// Selects `name` with no overrides.
    pub fn preset(name: &str) -> Self {
        Self {
            preset: name.to_string(),
            size: None,
            assoc: None,
            replacement: None,
        }
    }
}

/// Main memory selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemoryConfig {
    /// Memory part name, resolved through the catalog
    #[serde(default = "MemoryConfig::default_mem_type")]
    pub mem_type: String,
}

impl MemoryConfig {
    fn default_mem_type() -> String {
        defaults::MEM_TYPE.to_string()
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            mem_type: defaults::MEM_TYPE.to_string(),
        }
    }
}

/// Run control: backend, limits, output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunConfig {
    /// Execution engine
    #[serde(default)]
    pub backend: BackendKind,

    /// Directory receiving `config.json`, `config.dot`, and statistics
    #[serde(default = "RunConfig::default_outdir")]
    pub outdir: PathBuf,

    /// Statistics file name inside `outdir`
    #[serde(default = "RunConfig::default_stats_file")]
    pub stats_file: String,

    /// Absolute tick at which to stop
    #[serde(default)]
    pub abs_max_tick: Option<u64>,

    /// External simulator program (for `BackendKind::External`)
    #[serde(default)]
    pub simulator: Option<PathBuf>,

    /// Extra arguments passed to the external simulator
    #[serde(default)]
    pub simulator_args: Vec<String>,

    /// Access traces aligned by position with the workloads (for `BackendKind::Replay`)
    #[serde(default)]
    pub traces: Vec<PathBuf>,
}

impl RunConfig {
    fn default_outdir() -> PathBuf {
        PathBuf::from(defaults::OUTDIR)
    }

    fn default_stats_file() -> String {
        defaults::STATS_FILE.to_string()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            outdir: Self::default_outdir(),
            stats_file: Self::default_stats_file(),
            abs_max_tick: None,
            simulator: None,
            simulator_args: Vec::new(),
            traces: Vec::new(),
        }
    }
}

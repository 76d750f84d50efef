//! Command-line options.
//!
//! Flags mirror the workload and simulator-wide options of the driver scripts, including their
//! underscore spellings for cache geometry (`--l1d_size`). Explicit flags override values from
//! `--config`, which override built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use simwire_core::Config;
use simwire_core::common::units::{Frequency, MemSize, Voltage};
use simwire_core::config::BackendKind;
use simwire_core::workload::WorkloadArgs;

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    match s {
        "dry-run" => Ok(BackendKind::DryRun),
        "replay" => Ok(BackendKind::Replay),
        "external" => Ok(BackendKind::External),
        other => Err(format!(
            "unknown backend '{other}' (expected dry-run, replay, or external)"
        )),
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "simwire",
    author,
    version,
    about = "Compose, validate, and run a syscall-emulation system configuration",
    long_about = "Builds a port-connected system from workload and hardware flags, validates it, \
dumps config.json and config.dot to the output directory, and hands it to a backend.\n\n\
Examples:\n  simwire -c tests/hello --caches --l2cache\n  \
simwire -c 'a.out;b.out' -o '1 2;3' -n 2 --backend replay --trace 'a.trace;b.trace'\n  \
simwire --list-cpu-types"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    // ── Workload ────────────────────────────────────────────────────────
    /// Binaries to run in syscall-emulation mode, separated by ';'.
    #[arg(short = 'c', long)]
    pub cmd: Option<String>,

    /// Arguments for each binary, ';'-separated and whitespace-split per binary.
    #[arg(short = 'o', long, default_value = "", allow_hyphen_values = true)]
    pub options: String,

    /// Files to use as stdin, ';'-separated.
    #[arg(short = 'i', long, default_value = "")]
    pub input: String,

    /// Files to use as stdout, ';'-separated.
    #[arg(long, default_value = "")]
    pub output: String,

    /// Files to use as stderr, ';'-separated.
    #[arg(long, default_value = "")]
    pub errout: String,

    /// File of NAME=value lines given to every process.
    #[arg(short = 'e', long)]
    pub env: Option<PathBuf>,

    // ── System ──────────────────────────────────────────────────────────
    /// Number of CPUs.
    #[arg(short = 'n', long)]
    pub num_cpus: Option<usize>,

    /// System voltage (e.g. 1.0V).
    #[arg(long)]
    pub sys_voltage: Option<Voltage>,

    /// System clock for buses, L2, and memory (e.g. 1GHz).
    #[arg(long)]
    pub sys_clock: Option<Frequency>,

    /// CPU clock (e.g. 2GHz).
    #[arg(long)]
    pub cpu_clock: Option<Frequency>,

    /// Memory part (see --list-mem-types).
    #[arg(long)]
    pub mem_type: Option<String>,

    /// Physical memory size (e.g. 512MB).
    #[arg(long)]
    pub mem_size: Option<MemSize>,

    // ── CPU ─────────────────────────────────────────────────────────────
    /// CPU model (see --list-cpu-types).
    #[arg(long)]
    pub cpu_type: Option<String>,

    /// Branch predictor (see --list-bp-types).
    #[arg(long)]
    pub bp_type: Option<String>,

    /// Indirect branch predictor (see --list-indirect-bp-types).
    #[arg(long)]
    pub indirect_bp_type: Option<String>,

    /// Run all workloads as hardware threads of one O3 CPU.
    #[arg(long)]
    pub smt: bool,

    /// Attach a checker CPU.
    #[arg(long)]
    pub checker: bool,

    /// Attach a simpoint profiling probe.
    #[arg(long)]
    pub simpoint_profile: bool,

    /// Instructions per simpoint interval.
    #[arg(long)]
    pub simpoint_interval: Option<u64>,

    /// Wait for a remote debugger before running.
    #[arg(long)]
    pub wait_gdb: bool,

    // ── Caches ──────────────────────────────────────────────────────────
    /// Private L1 instruction and data caches.
    #[arg(long)]
    pub caches: bool,

    /// Shared L2 cache.
    #[arg(long)]
    pub l2cache: bool,

    /// L1 data cache size.
    #[arg(long = "l1d_size")]
    pub l1d_size: Option<MemSize>,

    /// L1 instruction cache size.
    #[arg(long = "l1i_size")]
    pub l1i_size: Option<MemSize>,

    /// L2 cache size.
    #[arg(long = "l2_size")]
    pub l2_size: Option<MemSize>,

    /// L1 data cache associativity.
    #[arg(long = "l1d_assoc")]
    pub l1d_assoc: Option<u32>,

    /// L1 instruction cache associativity.
    #[arg(long = "l1i_assoc")]
    pub l1i_assoc: Option<u32>,

    /// L2 cache associativity.
    #[arg(long = "l2_assoc")]
    pub l2_assoc: Option<u32>,

    /// Cache line size in bytes.
    #[arg(long = "cacheline_size")]
    pub cacheline_size: Option<u32>,

    // ── Run ─────────────────────────────────────────────────────────────
    /// Stop at this absolute tick.
    #[arg(short = 'm', long)]
    pub abs_max_tick: Option<u64>,

    /// Output directory for config and statistics dumps.
    #[arg(short = 'd', long)]
    pub outdir: Option<PathBuf>,

    /// JSON configuration file; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Execution engine: dry-run, replay, or external.
    #[arg(long, value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// External simulator program.
    #[arg(long)]
    pub simulator: Option<PathBuf>,

    /// Extra argument for the external simulator (repeatable).
    #[arg(long = "simulator-arg", allow_hyphen_values = true)]
    pub simulator_args: Vec<String>,

    /// Access traces for the replay backend, ';'-separated, one per workload.
    #[arg(long)]
    pub trace: Option<String>,

    // ── Listings ────────────────────────────────────────────────────────
    /// List available CPU types.
    #[arg(long)]
    pub list_cpu_types: bool,

    /// List available branch predictors.
    #[arg(long)]
    pub list_bp_types: bool,

    /// List available indirect branch predictors.
    #[arg(long)]
    pub list_indirect_bp_types: bool,

    /// List available memory types.
    #[arg(long)]
    pub list_mem_types: bool,

    /// List available cache presets.
    #[arg(long)]
    pub list_cache_presets: bool,
}

impl Options {
    /// Workload flags as the process builder expects them.
    pub fn workload_args(&self) -> WorkloadArgs {
        WorkloadArgs {
            cmd: self.cmd.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            errout: self.errout.clone(),
            options: self.options.clone(),
            env: self.env.clone(),
        }
    }

    /// Returns `true` if any listing flag was given.
    pub const fn wants_listing(&self) -> bool {
        self.list_cpu_types
            || self.list_bp_types
            || self.list_indirect_bp_types
            || self.list_mem_types
            || self.list_cache_presets
    }

    /// Overrides `config` with every flag given on the command line.
    pub fn apply(&self, config: &mut Config) {
        let sys = &mut config.system;
        set(&mut sys.num_cpus, self.num_cpus);
        set(&mut sys.sys_voltage, self.sys_voltage);
        set(&mut sys.sys_clock, self.sys_clock);
        set(&mut sys.cpu_clock, self.cpu_clock);
        set(&mut sys.mem_size, self.mem_size);
        set(&mut sys.cacheline_size, self.cacheline_size);

        set(&mut config.memory.mem_type, self.mem_type.clone());

        let cpu = &mut config.cpu;
        set(&mut cpu.cpu_type, self.cpu_type.clone());
        if self.bp_type.is_some() {
            cpu.bp_type.clone_from(&self.bp_type);
        }
        if self.indirect_bp_type.is_some() {
            cpu.indirect_bp_type.clone_from(&self.indirect_bp_type);
        }
        cpu.smt |= self.smt;
        cpu.checker |= self.checker;
        cpu.simpoint_profile |= self.simpoint_profile;
        cpu.wait_gdb |= self.wait_gdb;
        set(&mut cpu.simpoint_interval, self.simpoint_interval);

        let caches = &mut config.caches;
        caches.caches |= self.caches;
        caches.l2cache |= self.l2cache;
        set_some(&mut caches.l1d.size, self.l1d_size);
        set_some(&mut caches.l1i.size, self.l1i_size);
        set_some(&mut caches.l2.size, self.l2_size);
        set_some(&mut caches.l1d.assoc, self.l1d_assoc);
        set_some(&mut caches.l1i.assoc, self.l1i_assoc);
        set_some(&mut caches.l2.assoc, self.l2_assoc);

        let run = &mut config.run;
        set(&mut run.backend, self.backend);
        set(&mut run.outdir, self.outdir.clone());
        set_some(&mut run.abs_max_tick, self.abs_max_tick);
        set_some(&mut run.simulator, self.simulator.clone());
        if !self.simulator_args.is_empty() {
            run.simulator_args.clone_from(&self.simulator_args);
        }
        if let Some(traces) = &self.trace {
            run.traces = traces
                .split(';')
                .map(PathBuf::from)
                .collect();
        }
    }
}

fn set<T>(slot: &mut T, flag: Option<T>) {
    if let Some(value) = flag {
        *slot = value;
    }
}

fn set_some<T>(slot: &mut Option<T>, flag: Option<T>) {
    if flag.is_some() {
        *slot = flag;
    }
}

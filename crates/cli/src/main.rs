//! Syscall-emulation system composition CLI.
//!
//! This binary is the single entry point for building and running a configuration. It performs:
//! 1. **Listing:** Print the catalog's CPU models, predictors, memory parts, and cache presets.
//! 2. **Workload:** Derive one process per `;`-separated `--cmd` entry.
//! 3. **Composition:** Build the system graph from config and flags, then validate and freeze it.
//! 4. **Run:** Dump `config.json`/`config.dot` and hand the frozen system to the chosen backend.

mod options;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use simwire_core::common::error::WorkloadError;
use simwire_core::graph::builder::SystemBuilder;
use simwire_core::sim::{self, Simulation};
use simwire_core::workload::{self, LaunchContext, SeWorkload};
use simwire_core::{Catalog, Config, Error};

use crate::options::Options;

fn main() -> ExitCode {
    init_tracing();
    let opts = Options::parse();
    let catalog = Catalog::builtin();

    if opts.wants_listing() {
        print_listings(&opts, &catalog);
        return ExitCode::SUCCESS;
    }

    match run(&opts, &catalog) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds, freezes, and runs the configured system.
fn run(opts: &Options, catalog: &Catalog) -> Result<(), Error> {
    let args = opts.workload_args();
    if args.cmd.as_deref().is_none_or(str::is_empty) {
        return Err(WorkloadError::NoWorkload.into());
    }

    let mut config = match &opts.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    opts.apply(&mut config);

    let cpu = catalog.cpu(&config.cpu.cpu_type)?;
    let ctx = LaunchContext::current()?;
    let set = workload::get_processes(&args, &ctx, config.cpu.smt, cpu)?;

    let first = set.processes.first().ok_or(WorkloadError::NoWorkload)?;
    let se = SeWorkload::init_compatible(&first.executable)?;

    let graph = SystemBuilder::new(&config, catalog).build(&set, se)?;
    let system = graph.freeze()?;

    let backend = sim::backend_for(&config.run)?;
    let mut simulation = Simulation::new(backend, &config.run.outdir)
        .with_stats_file(config.run.stats_file.as_str());
    let _ = simulation.run(&system, config.run.abs_max_tick)?;
    Ok(())
}

fn report(e: &Error) {
    match e {
        Error::Workload(WorkloadError::NoWorkload) => {
            eprintln!("No workload specified. Exiting!\n");
        }
        Error::Workload(WorkloadError::SmtRequiresO3 { .. }) => {
            eprintln!("assertion failed: SMT requires an O3CPU");
        }
        other => eprintln!("[!] FATAL: {other}"),
    }
}

fn print_listings(opts: &Options, catalog: &Catalog) {
    if opts.list_cpu_types {
        println!("Available CPU types:");
        for cpu in catalog.cpus() {
            println!("    {:<24} {}", cpu.name, cpu.isa);
        }
    }
    if opts.list_bp_types {
        println!("Available branch predictor types:");
        for bp in catalog.branch_predictors() {
            println!("    {:<24} {}", bp.name, bp.description);
        }
    }
    if opts.list_indirect_bp_types {
        println!("Available indirect branch predictor types:");
        for bp in catalog.indirect_predictors() {
            println!("    {:<24} {}", bp.name, bp.description);
        }
    }
    if opts.list_mem_types {
        println!("Available memory types:");
        for part in catalog.memories() {
            println!("    {}", part.name);
        }
    }
    if opts.list_cache_presets {
        println!("Available cache presets:");
        for cache in catalog.caches() {
            println!(
                "    {:<24} {} {}-way {}",
                cache.name,
                cache.size,
                cache.assoc,
                cache.replacement.name()
            );
        }
    }
}

//! Topology construction.
//!
//! `SystemBuilder` composes the standard syscall-emulation machine from configuration:
//! 1. **Domains:** System and CPU voltage/clock domains.
//! 2. **Interconnect:** A `SystemXBar` memory bus, plus an `L2XBar` when a shared L2 is enabled.
//! 3. **CPUs:** `num_cpus` CPUs with their processes, predictors, optional private L1s, and
//!    (for x86) a local interrupt controller wired to the memory bus.
//! 4. **Memory:** A memory controller with one interface over the whole memory range.
//! 5. **Workload:** The system-level workload object.

use crate::catalog::{Catalog, Isa};
use crate::common::error::{BuildError, CatalogError};
use crate::common::units::{AddrRange, Voltage};
use crate::config::{CacheSelection, Config};
use crate::workload::{ProcessSet, SeWorkload};

use super::{
    CacheParams, CpuParams, ObjectId, ObjectKind, SystemGraph, SystemParams, XBarParams,
};

/// Voltage of the CPU voltage domain.
const CPU_VOLTAGE: Voltage = Voltage::from_volts(1.0);

/// Builds a [`SystemGraph`] from configuration and a set of processes.
#[derive(Debug, Clone, Copy)]
pub struct SystemBuilder<'a> {
    config: &'a Config,
    catalog: &'a Catalog,
}

impl<'a> SystemBuilder<'a> {
    /// Creates a builder over `config`, resolving names through `catalog`.
    pub const fn new(config: &'a Config, catalog: &'a Catalog) -> Self {
        Self { config, catalog }
    }

    /// Resolves a cache selection into parameters: preset values with overrides applied.
    pub fn cache_params(&self, selection: &CacheSelection) -> Result<CacheParams, CatalogError> {
        let preset = self.catalog.cache(&selection.preset)?;
        Ok(CacheParams {
            preset: preset.name,
            size: selection.size.unwrap_or(preset.size),
            assoc: selection.assoc.unwrap_or(preset.assoc),
            tag_latency: preset.tag_latency,
            data_latency: preset.data_latency,
            response_latency: preset.response_latency,
            mshrs: preset.mshrs,
            tgts_per_mshr: preset.tgts_per_mshr,
            replacement: selection.replacement.unwrap_or(preset.replacement),
        })
    }

    /// Builds the unfrozen graph.
    ///
    /// With SMT every CPU runs all processes as threads; with a single process every CPU runs
    /// it; otherwise CPU `i` runs process `i`.
    pub fn build(
        &self,
        processes: &ProcessSet,
        workload: SeWorkload,
    ) -> Result<SystemGraph, BuildError> {
        let sys = &self.config.system;
        let cpu_cfg = &self.config.cpu;
        let caches = &self.config.caches;

        let model = *self.catalog.cpu(&cpu_cfg.cpu_type)?;
        let num_cpus = sys.num_cpus;
        let nprocs = processes.processes.len();

        if num_cpus == 0 {
            return Err(BuildError::NoCpus);
        }
        if cpu_cfg.smt && num_cpus > 1 {
            return Err(BuildError::SmtMultipleCpus { num_cpus });
        }
        if !cpu_cfg.smt && nprocs > 1 && num_cpus > nprocs {
            return Err(BuildError::NotEnoughWorkloads {
                num_cpus,
                workloads: nprocs,
            });
        }
        if !cpu_cfg.smt && nprocs > num_cpus {
            for p in &processes.processes[num_cpus..] {
                tracing::warn!(pid = p.pid, cmd = %p.command_line(), "workload ignored: no CPU left to run it");
            }
        }

        let branch_pred = cpu_cfg
            .bp_type
            .as_deref()
            .map(|name| self.catalog.branch_predictor(name))
            .transpose()?
            .map(|m| m.name);
        let indirect_branch_pred = cpu_cfg
            .indirect_bp_type
            .as_deref()
            .map(|name| self.catalog.indirect_predictor(name))
            .transpose()?
            .map(|m| m.name);
        let part = *self.catalog.memory(&self.config.memory.mem_type)?;

        let (l1i, l1d) = if caches.caches {
            (
                Some(self.cache_params(&caches.l1i)?),
                Some(self.cache_params(&caches.l1d)?),
            )
        } else {
            (None, None)
        };
        let l2 = if caches.l2cache {
            Some(self.cache_params(&caches.l2)?)
        } else {
            None
        };

        let mut g = SystemGraph::new();
        let root = g.add(None, "root", ObjectKind::Root { full_system: false });
        let mem_range = AddrRange::with_size(sys.mem_size);
        let system = g.add(
            Some(root),
            "system",
            ObjectKind::System(SystemParams {
                mem_mode: model.class.memory_mode(),
                mem_ranges: vec![mem_range],
                cache_line_size: sys.cacheline_size,
                clk_domain: None,
            }),
        );

        let membus = g.add(Some(system), "membus", ObjectKind::XBar(XBarParams::system()));
        g.connect((system, "system_port"), (membus, "cpu_side_ports"))?;

        let voltage_domain = g.add(
            Some(system),
            "voltage_domain",
            ObjectKind::VoltageDomain {
                voltage: sys.sys_voltage,
            },
        );
        let clk_domain = g.add(
            Some(system),
            "clk_domain",
            ObjectKind::SrcClockDomain {
                clock: sys.sys_clock,
                voltage_domain,
            },
        );
        if let ObjectKind::System(p) = &mut g.object_mut(system)?.kind {
            p.clk_domain = Some(clk_domain);
        }

        let cpu_voltage_domain = g.add(
            Some(system),
            "cpu_voltage_domain",
            ObjectKind::VoltageDomain {
                voltage: CPU_VOLTAGE,
            },
        );
        let cpu_clk_domain = g.add(
            Some(system),
            "cpu_clk_domain",
            ObjectKind::SrcClockDomain {
                clock: sys.cpu_clock,
                voltage_domain: cpu_voltage_domain,
            },
        );

        let mem_ctrl = g.add(Some(system), "mem_ctrl", ObjectKind::MemCtrl);
        let _dram = g.add(
            Some(mem_ctrl),
            "dram",
            ObjectKind::MemInterface {
                part,
                range: mem_range,
            },
        );
        g.connect((mem_ctrl, "port"), (membus, "mem_side_ports"))?;

        let downstream = match l2 {
            Some(params) => {
                let l2bus = g.add(Some(system), "l2bus", ObjectKind::XBar(XBarParams::l2()));
                let l2cache = g.add(Some(system), "l2cache", ObjectKind::Cache(params));
                g.connect((l2cache, "cpu_side"), (l2bus, "mem_side_ports"))?;
                g.connect((l2cache, "mem_side"), (membus, "cpu_side_ports"))?;
                l2bus
            }
            None => membus,
        };

        let isa = if model.isa == Isa::Any {
            workload.isa
        } else {
            model.isa
        };

        for cpu_id in 0..num_cpus {
            let name = if num_cpus == 1 {
                "cpu".to_string()
            } else {
                format!("cpu{cpu_id}")
            };
            let assigned = if cpu_cfg.smt || nprocs == 1 {
                processes.processes.clone()
            } else {
                processes.processes.get(cpu_id).cloned().into_iter().collect()
            };

            let cpu = g.add(
                Some(system),
                name,
                ObjectKind::Cpu(CpuParams {
                    model: model.name,
                    class: model.class,
                    isa: model.isa,
                    cpu_id,
                    clk_domain: Some(cpu_clk_domain),
                    num_threads: processes.num_threads,
                    workload: assigned,
                    branch_pred,
                    indirect_branch_pred,
                    checker: cpu_cfg.checker,
                    simpoint_interval: cpu_cfg
                        .simpoint_profile
                        .then_some(cpu_cfg.simpoint_interval),
                    wait_gdb: cpu_cfg.wait_gdb,
                }),
            );

            match (l1i, l1d) {
                (Some(icache), Some(dcache)) => {
                    let icache = g.add(Some(cpu), "icache", ObjectKind::Cache(icache));
                    let dcache = g.add(Some(cpu), "dcache", ObjectKind::Cache(dcache));
                    g.connect((cpu, "icache_port"), (icache, "cpu_side"))?;
                    g.connect((cpu, "dcache_port"), (dcache, "cpu_side"))?;
                    g.connect((icache, "mem_side"), (downstream, "cpu_side_ports"))?;
                    g.connect((dcache, "mem_side"), (downstream, "cpu_side_ports"))?;
                }
                _ => {
                    g.connect((cpu, "icache_port"), (downstream, "cpu_side_ports"))?;
                    g.connect((cpu, "dcache_port"), (downstream, "cpu_side_ports"))?;
                }
            }

            if isa == Isa::X86 {
                add_interrupts(&mut g, cpu, membus)?;
            }
        }

        let _workload = g.add(Some(system), "workload", ObjectKind::Workload(workload));

        tracing::info!(
            cpus = num_cpus,
            cpu_type = model.name,
            caches = caches.caches,
            l2cache = caches.l2cache,
            mem_type = part.name,
            "topology built"
        );
        Ok(g)
    }
}

fn add_interrupts(g: &mut SystemGraph, cpu: ObjectId, membus: ObjectId) -> Result<(), BuildError> {
    let interrupts = g.add(Some(cpu), "interrupts", ObjectKind::Interrupts);
    g.connect((interrupts, "pio"), (membus, "mem_side_ports"))?;
    g.connect((interrupts, "int_requestor"), (membus, "cpu_side_ports"))?;
    g.connect((interrupts, "int_responder"), (membus, "mem_side_ports"))?;
    Ok(())
}

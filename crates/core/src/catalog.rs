//! Registry of named component presets.
//!
//! Driver scripts traditionally pull CPU types, cache classes, and memory parts into scope
//! by name. This module makes that registry explicit: every name maps to a configuration
//! struct, and the whole table is built once with `Catalog::builtin()`. It provides:
//! 1. **CPU models:** Class (atomic, timing, in-order, out-of-order) and ISA per name.
//! 2. **Predictors:** Direct and indirect branch predictor names.
//! 3. **Cache presets:** Geometry, latencies, MSHRs, and replacement policy.
//! 4. **Memory parts:** Row-buffer latency parameters per DRAM part.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::common::error::CatalogError;
use crate::common::units::MemSize;
use crate::config::ReplacementPolicy;

/// Instruction set a CPU model or workload binary targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Isa {
    /// ISA-agnostic model name (the single built ISA is implied).
    Any,
    /// x86-64.
    X86,
    /// RISC-V.
    Riscv,
    /// Arm / AArch64.
    Arm,
}

impl Isa {
    /// Returns `true` if a CPU of this ISA can execute a workload of `workload` ISA.
    pub fn runs(self, workload: Self) -> bool {
        self == Self::Any || self == workload
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Any => "any ISA",
            Self::X86 => "X86",
            Self::Riscv => "RISC-V",
            Self::Arm => "Arm",
        };
        f.write_str(s)
    }
}

/// How the memory system is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemMode {
    /// Functional accesses with estimated latency.
    Atomic,
    /// Fully timed request/response accesses.
    Timing,
}

impl fmt::Display for MemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Atomic => "atomic",
            Self::Timing => "timing",
        })
    }
}

/// CPU model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CpuClass {
    /// Single-cycle functional CPU.
    AtomicSimple,
    /// Simple CPU with timed memory accesses.
    TimingSimple,
    /// Four-stage in-order pipeline.
    Minor,
    /// Out-of-order superscalar.
    O3,
}

impl CpuClass {
    /// Returns the memory mode this class requires.
    pub const fn memory_mode(self) -> MemMode {
        match self {
            Self::AtomicSimple => MemMode::Atomic,
            Self::TimingSimple | Self::Minor | Self::O3 => MemMode::Timing,
        }
    }

    /// Returns `true` for the out-of-order class, the only one supporting SMT.
    pub const fn is_o3(self) -> bool {
        matches!(self, Self::O3)
    }
}

/// A selectable CPU model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuModel {
    /// Model name (`"X86MinorCPU"`).
    pub name: &'static str,
    /// Model family.
    pub class: CpuClass,
    /// Target ISA.
    pub isa: Isa,
}

/// A selectable branch predictor (direct or indirect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictorModel {
    /// Predictor name (`"TournamentBP"`).
    pub name: &'static str,
    /// One-line description for listings.
    pub description: &'static str,
}

/// A named cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CachePreset {
    /// Preset name (`"L1DCache"`).
    pub name: &'static str,
    /// Capacity.
    pub size: MemSize,
    /// Associativity.
    pub assoc: u32,
    /// Tag lookup latency in cycles.
    pub tag_latency: u32,
    /// Data array latency in cycles.
    pub data_latency: u32,
    /// Response latency in cycles.
    pub response_latency: u32,
    /// Miss status holding registers.
    pub mshrs: u32,
    /// Targets per MSHR.
    pub tgts_per_mshr: u32,
    /// Replacement policy.
    pub replacement: ReplacementPolicy,
}

/// Timing model of a memory part. All latencies are in ticks (picoseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemoryTiming {
    /// Row-buffer DRAM.
    Dram {
        /// CAS latency.
        t_cl: u64,
        /// RAS-to-CAS delay.
        t_rcd: u64,
        /// Row precharge time.
        t_rp: u64,
        /// Burst transfer time.
        t_burst: u64,
        /// Row buffer size in bytes.
        row_buffer_bytes: u64,
    },
    /// Fixed-latency memory.
    Simple {
        /// Access latency.
        latency: u64,
    },
}

/// A selectable memory part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryPart {
    /// Part name (`"DDR3_1600_8x8"`).
    pub name: &'static str,
    /// Timing parameters.
    pub timing: MemoryTiming,
}

const fn cpu(name: &'static str, class: CpuClass, isa: Isa) -> CpuModel {
    CpuModel { name, class, isa }
}

const CPU_MODELS: &[CpuModel] = &[
    cpu("AtomicSimpleCPU", CpuClass::AtomicSimple, Isa::Any),
    cpu("TimingSimpleCPU", CpuClass::TimingSimple, Isa::Any),
    cpu("MinorCPU", CpuClass::Minor, Isa::Any),
    cpu("O3CPU", CpuClass::O3, Isa::Any),
    cpu("DerivO3CPU", CpuClass::O3, Isa::Any),
    cpu("X86AtomicSimpleCPU", CpuClass::AtomicSimple, Isa::X86),
    cpu("X86TimingSimpleCPU", CpuClass::TimingSimple, Isa::X86),
    cpu("X86MinorCPU", CpuClass::Minor, Isa::X86),
    cpu("X86O3CPU", CpuClass::O3, Isa::X86),
    cpu("RiscvAtomicSimpleCPU", CpuClass::AtomicSimple, Isa::Riscv),
    cpu("RiscvTimingSimpleCPU", CpuClass::TimingSimple, Isa::Riscv),
    cpu("RiscvMinorCPU", CpuClass::Minor, Isa::Riscv),
    cpu("RiscvO3CPU", CpuClass::O3, Isa::Riscv),
    cpu("ArmAtomicSimpleCPU", CpuClass::AtomicSimple, Isa::Arm),
    cpu("ArmTimingSimpleCPU", CpuClass::TimingSimple, Isa::Arm),
    cpu("ArmMinorCPU", CpuClass::Minor, Isa::Arm),
    cpu("ArmO3CPU", CpuClass::O3, Isa::Arm),
];

const BRANCH_PREDICTORS: &[PredictorModel] = &[
    PredictorModel {
        name: "LocalBP",
        description: "per-branch two-bit saturating counters",
    },
    PredictorModel {
        name: "BiModeBP",
        description: "bi-mode taken/not-taken split tables",
    },
    PredictorModel {
        name: "TournamentBP",
        description: "local/global tournament with a choice predictor",
    },
    PredictorModel {
        name: "TAGE",
        description: "tagged geometric history lengths",
    },
    PredictorModel {
        name: "LTAGE",
        description: "TAGE with a loop predictor",
    },
    PredictorModel {
        name: "MultiperspectivePerceptron8KB",
        description: "multiperspective perceptron, 8KB budget",
    },
    PredictorModel {
        name: "MultiperspectivePerceptron64KB",
        description: "multiperspective perceptron, 64KB budget",
    },
];

const INDIRECT_PREDICTORS: &[PredictorModel] = &[
    PredictorModel {
        name: "SimpleIndirectPredictor",
        description: "set-associative target cache indexed by path history",
    },
    PredictorModel {
        name: "ITTAGE",
        description: "indirect-target TAGE",
    },
];

const CACHE_PRESETS: &[CachePreset] = &[
    CachePreset {
        name: "L1ICache",
        size: MemSize::kib(16),
        assoc: 2,
        tag_latency: 2,
        data_latency: 2,
        response_latency: 2,
        mshrs: 4,
        tgts_per_mshr: 20,
        replacement: ReplacementPolicy::Random,
    },
    CachePreset {
        name: "L1DCache",
        size: MemSize::kib(16),
        assoc: 2,
        tag_latency: 2,
        data_latency: 2,
        response_latency: 2,
        mshrs: 4,
        tgts_per_mshr: 20,
        replacement: ReplacementPolicy::Random,
    },
    CachePreset {
        name: "L2Cache",
        size: MemSize::kib(256),
        assoc: 8,
        tag_latency: 20,
        data_latency: 20,
        response_latency: 20,
        mshrs: 20,
        tgts_per_mshr: 12,
        replacement: ReplacementPolicy::Lru,
    },
    CachePreset {
        name: "L1Cache",
        size: MemSize::kib(64),
        assoc: 2,
        tag_latency: 2,
        data_latency: 2,
        response_latency: 2,
        mshrs: 4,
        tgts_per_mshr: 20,
        replacement: ReplacementPolicy::Lru,
    },
    CachePreset {
        name: "IOCache",
        size: MemSize::kib(1),
        assoc: 8,
        tag_latency: 50,
        data_latency: 50,
        response_latency: 50,
        mshrs: 20,
        tgts_per_mshr: 12,
        replacement: ReplacementPolicy::Lru,
    },
];

const MEMORY_PARTS: &[MemoryPart] = &[
    MemoryPart {
        name: "DDR3_1600_8x8",
        timing: MemoryTiming::Dram {
            t_cl: 13_750,
            t_rcd: 13_750,
            t_rp: 13_750,
            t_burst: 5_000,
            row_buffer_bytes: 8 * 1024,
        },
    },
    MemoryPart {
        name: "DDR3_2133_8x8",
        timing: MemoryTiming::Dram {
            t_cl: 13_090,
            t_rcd: 13_090,
            t_rp: 13_090,
            t_burst: 3_752,
            row_buffer_bytes: 8 * 1024,
        },
    },
    MemoryPart {
        name: "DDR4_2400_8x8",
        timing: MemoryTiming::Dram {
            t_cl: 14_160,
            t_rcd: 14_160,
            t_rp: 14_160,
            t_burst: 3_332,
            row_buffer_bytes: 8 * 1024,
        },
    },
    MemoryPart {
        name: "LPDDR3_1600_1x32",
        timing: MemoryTiming::Dram {
            t_cl: 15_000,
            t_rcd: 18_000,
            t_rp: 18_000,
            t_burst: 5_000,
            row_buffer_bytes: 4 * 1024,
        },
    },
    MemoryPart {
        name: "HBM_1000_4H_1x128",
        timing: MemoryTiming::Dram {
            t_cl: 7_000,
            t_rcd: 7_000,
            t_rp: 7_000,
            t_burst: 2_000,
            row_buffer_bytes: 2 * 1024,
        },
    },
    MemoryPart {
        name: "SimpleMemory",
        timing: MemoryTiming::Simple { latency: 30_000 },
    },
];

/// Name-indexed registry of every preset.
#[derive(Debug, Clone)]
pub struct Catalog {
    cpus: BTreeMap<&'static str, CpuModel>,
    branch_predictors: BTreeMap<&'static str, PredictorModel>,
    indirect_predictors: BTreeMap<&'static str, PredictorModel>,
    caches: BTreeMap<&'static str, CachePreset>,
    memories: BTreeMap<&'static str, MemoryPart>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lookup<'a, T>(
    table: &'a BTreeMap<&'static str, T>,
    kind: &'static str,
    name: &str,
) -> Result<&'a T, CatalogError> {
    table.get(name).ok_or_else(|| CatalogError::Unknown {
        kind,
        name: name.to_string(),
        available: table.keys().map(|k| (*k).to_string()).collect(),
    })
}

impl Catalog {
    /// Builds the registry of every built-in preset.
    pub fn builtin() -> Self {
        Self {
            cpus: CPU_MODELS.iter().map(|m| (m.name, *m)).collect(),
            branch_predictors: BRANCH_PREDICTORS.iter().map(|m| (m.name, *m)).collect(),
            indirect_predictors: INDIRECT_PREDICTORS.iter().map(|m| (m.name, *m)).collect(),
            caches: CACHE_PRESETS.iter().map(|p| (p.name, *p)).collect(),
            memories: MEMORY_PARTS.iter().map(|p| (p.name, *p)).collect(),
        }
    }

    /// Resolves a CPU model by name.
    pub fn cpu(&self, name: &str) -> Result<&CpuModel, CatalogError> {
        lookup(&self.cpus, "CPU type", name)
    }

    /// Resolves a branch predictor by name.
    pub fn branch_predictor(&self, name: &str) -> Result<&PredictorModel, CatalogError> {
        lookup(&self.branch_predictors, "branch predictor type", name)
    }

    /// Resolves an indirect branch predictor by name.
    pub fn indirect_predictor(&self, name: &str) -> Result<&PredictorModel, CatalogError> {
        lookup(&self.indirect_predictors, "indirect branch predictor type", name)
    }

    /// Resolves a cache preset by name.
    pub fn cache(&self, name: &str) -> Result<&CachePreset, CatalogError> {
        lookup(&self.caches, "cache preset", name)
    }

    /// Resolves a memory part by name.
    pub fn memory(&self, name: &str) -> Result<&MemoryPart, CatalogError> {
        lookup(&self.memories, "memory type", name)
    }

    /// Returns `true` if `model` belongs to the out-of-order class.
    pub fn is_o3_cpu(model: &CpuModel) -> bool {
        model.class.is_o3()
    }

    /// Iterates CPU models in name order.
    pub fn cpus(&self) -> impl Iterator<Item = &CpuModel> {
        self.cpus.values()
    }

    /// Iterates branch predictors in name order.
    pub fn branch_predictors(&self) -> impl Iterator<Item = &PredictorModel> {
        self.branch_predictors.values()
    }

    /// Iterates indirect branch predictors in name order.
    pub fn indirect_predictors(&self) -> impl Iterator<Item = &PredictorModel> {
        self.indirect_predictors.values()
    }

    /// Iterates cache presets in name order.
    pub fn caches(&self) -> impl Iterator<Item = &CachePreset> {
        self.caches.values()
    }

    /// Iterates memory parts in name order.
    pub fn memories(&self) -> impl Iterator<Item = &MemoryPart> {
        self.memories.values()
    }
}

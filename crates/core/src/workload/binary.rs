//! Workload binary inspection.
//!
//! The system-level workload object is compatible with the first process's executable. Its
//! ISA is read from the ELF header so the graph can reject CPU models that cannot run it.

use std::fs;
use std::path::{Path, PathBuf};

use object::{Architecture, Object};
use serde::Serialize;

use crate::catalog::Isa;
use crate::common::error::WorkloadError;

/// The syscall-emulation workload attached to the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeWorkload {
    /// Binary the workload was initialised from.
    pub binary: PathBuf,
    /// ISA detected from the ELF header.
    pub isa: Isa,
}

impl SeWorkload {
    /// Creates a workload compatible with the ELF executable at `path`.
    pub fn init_compatible(path: impl AsRef<Path>) -> Result<Self, WorkloadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| WorkloadError::Binary {
            path: path.to_path_buf(),
            source,
        })?;
        let isa = detect_isa(path, &data)?;
        tracing::debug!(binary = %path.display(), %isa, "workload binary inspected");
        Ok(Self {
            binary: path.to_path_buf(),
            isa,
        })
    }

    /// Creates a workload with a known ISA without reading the binary.
    pub fn with_isa(binary: impl Into<PathBuf>, isa: Isa) -> Self {
        Self {
            binary: binary.into(),
            isa,
        }
    }
}

fn detect_isa(path: &Path, data: &[u8]) -> Result<Isa, WorkloadError> {
    let file = object::File::parse(data).map_err(|e| WorkloadError::NotElf {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    match file.architecture() {
        Architecture::X86_64 | Architecture::X86_64_X32 | Architecture::I386 => Ok(Isa::X86),
        Architecture::Riscv32 | Architecture::Riscv64 => Ok(Isa::Riscv),
        Architecture::Arm | Architecture::Aarch64 | Architecture::Aarch64_Ilp32 => Ok(Isa::Arm),
        other => Err(WorkloadError::UnsupportedArch {
            path: path.to_path_buf(),
            arch: format!("{other:?}"),
        }),
    }
}

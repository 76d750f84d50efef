//! Simulated-system composition library.
//!
//! This crate describes a hardware timing model as a port-connected object graph and
//! hands it to an execution engine. It provides:
//! 1. **Workload:** Process descriptors derived from semicolon-joined workload flags.
//! 2. **Catalog:** Named presets for CPU models, caches, memory parts, and predictors.
//! 3. **Graph:** Simulation objects, typed ports, topology builder, validation, and export.
//! 4. **Simulation:** A single backend boundary (dry-run, external simulator, trace replay).
//! 5. **Statistics:** Counters collected by the backend and dumped after the run.

/// Shared types (units, errors).
pub mod common;
/// Configuration structures with defaults and JSON loading.
pub mod config;
/// Registry of named presets resolved once at startup.
pub mod catalog;
/// Port-connected object graph, builder, validation, and export.
pub mod graph;
/// Backend boundary and simulation driver.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;
/// Workload and process derivation.
pub mod workload;

/// Registry type; use `Catalog::builtin()`.
pub use crate::catalog::Catalog;
/// Crate-wide error type.
pub use crate::common::error::Error;
/// Root configuration type; use `Config::default()` or `Config::from_json_file`.
pub use crate::config::Config;
/// Validated, immutable system handed to a backend.
pub use crate::graph::FrozenSystem;
/// Simulation driver owning a backend.
pub use crate::sim::Simulation;

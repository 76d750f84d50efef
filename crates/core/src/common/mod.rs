//! Common types shared across the crate.
//!
//! 1. **Units:** Strong types for memory sizes, frequencies, and voltages in the
//!    simulator's string notation (`"16kB"`, `"2GHz"`, `"1.0V"`).
//! 2. **Errors:** Per-concern error enums and the crate-wide `Error`.

/// Error types for every stage from configuration to simulation.
pub mod error;

/// Quantity parsing (sizes, clocks, voltages) and address ranges.
pub mod units;

pub use error::{Error, Result};
pub use units::{AddrRange, Frequency, MemSize, TICKS_PER_SECOND, Voltage};

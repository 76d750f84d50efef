//! Quantity types in the simulator's string notation.
//!
//! This module parses and formats the three kinds of quantities used by configuration
//! files and command-line flags:
//! 1. **Memory sizes:** `"512MB"`, `"16kB"`, `"8GiB"` (binary multiples, as the simulator uses).
//! 2. **Clocks:** Frequencies (`"2GHz"`) or periods (`"500ps"`), stored in Hz and converted
//!    to tick periods where one tick is one picosecond.
//! 3. **Voltages:** `"1.0V"`, `"900mV"`.
//!
//! All three serialize back to strings so configuration round-trips through JSON unchanged
//! in meaning.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::UnitError;

/// Simulated ticks per second (one tick is one picosecond).
pub const TICKS_PER_SECOND: u64 = 1_000_000_000_000;

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;

/// Splits `"16kB"` into `("16", "kB")`; surrounding whitespace is ignored.
fn split_quantity(input: &str) -> (&str, &str) {
    let trimmed = input.trim();
    let idx = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (num, unit) = trimmed.split_at(idx);
    (num.trim(), unit.trim())
}

/// A memory capacity in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemSize(u64);

impl MemSize {
    /// Creates a size from a raw byte count.
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Creates a size of `kib` kibibytes.
    pub const fn kib(kib: u64) -> Self {
        Self(kib * KIB)
    }

    /// Creates a size of `mib` mebibytes.
    pub const fn mib(mib: u64) -> Self {
        Self(mib * MIB)
    }

    /// Returns the size in bytes.
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for MemSize {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| UnitError::Invalid {
            kind: "memory size",
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (num, unit) = split_quantity(s);
        if num.is_empty() {
            return Err(invalid("missing number"));
        }
        let value: u64 = num
            .parse()
            .map_err(|_| invalid("expected a whole number of units"))?;
        let multiplier = match unit {
            "" | "B" => 1,
            "k" | "K" | "kB" | "KB" | "kiB" | "KiB" => KIB,
            "M" | "MB" | "MiB" => MIB,
            "G" | "GB" | "GiB" => GIB,
            "T" | "TB" | "TiB" => TIB,
            _ => return Err(invalid("unknown unit")),
        };
        value
            .checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| invalid("value overflows 64 bits"))
    }
}

impl TryFrom<String> for MemSize {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemSize> for String {
    fn from(value: MemSize) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        if b != 0 && b % TIB == 0 {
            write!(f, "{}TB", b / TIB)
        } else if b != 0 && b % GIB == 0 {
            write!(f, "{}GB", b / GIB)
        } else if b != 0 && b % MIB == 0 {
            write!(f, "{}MB", b / MIB)
        } else if b != 0 && b % KIB == 0 {
            write!(f, "{}kB", b / KIB)
        } else {
            write!(f, "{b}B")
        }
    }
}

/// A clock frequency in Hz.
///
/// Accepts either a frequency (`"1GHz"`) or a period (`"1ns"`); both resolve to the same
/// value. Simulated time advances in ticks of one picosecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency(u64);

impl Frequency {
    /// Creates a frequency from Hz.
    pub const fn from_hz(hz: u64) -> Self {
        Self(hz)
    }

    /// Creates a frequency from MHz.
    pub const fn mhz(mhz: u64) -> Self {
        Self(mhz * 1_000_000)
    }

    /// Creates a frequency from GHz.
    pub const fn ghz(ghz: u64) -> Self {
        Self(ghz * 1_000_000_000)
    }

    /// Returns the frequency in Hz.
    pub const fn hz(self) -> u64 {
        self.0
    }

    /// Returns the clock period in ticks, never less than one.
    pub fn period_ticks(self) -> u64 {
        let ticks = (TICKS_PER_SECOND as f64 / self.0 as f64).round() as u64;
        ticks.max(1)
    }

    /// Converts a cycle count in this clock domain into ticks.
    pub fn cycles_to_ticks(self, cycles: u64) -> u64 {
        cycles.saturating_mul(self.period_ticks())
    }
}

impl FromStr for Frequency {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| UnitError::Invalid {
            kind: "clock",
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (num, unit) = split_quantity(s);
        let value: f64 = num.parse().map_err(|_| invalid("expected a number"))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid("must be positive"));
        }

        let hz = match unit.to_ascii_lowercase().as_str() {
            "hz" => value,
            "khz" => value * 1e3,
            "mhz" => value * 1e6,
            "ghz" => value * 1e9,
            "thz" => value * 1e12,
            "s" => 1.0 / value,
            "ms" => 1.0 / (value * 1e-3),
            "us" => 1.0 / (value * 1e-6),
            "ns" => 1.0 / (value * 1e-9),
            "ps" => 1.0 / (value * 1e-12),
            "" => return Err(invalid("missing unit (Hz or s)")),
            _ => return Err(invalid("unknown unit")),
        };

        let hz = hz.round();
        if hz < 1.0 {
            return Err(invalid("resolves to less than 1Hz"));
        }
        Ok(Self(hz as u64))
    }
}

impl TryFrom<String> for Frequency {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        if hz % 1_000_000_000 == 0 {
            write!(f, "{}GHz", hz / 1_000_000_000)
        } else if hz % 1_000_000 == 0 {
            write!(f, "{}MHz", hz / 1_000_000)
        } else if hz % 1_000 == 0 {
            write!(f, "{}kHz", hz / 1_000)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}

/// A supply voltage in volts.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Voltage(f64);

impl Voltage {
    /// Creates a voltage from volts.
    pub const fn from_volts(volts: f64) -> Self {
        Self(volts)
    }

    /// Returns the voltage in volts.
    pub const fn volts(self) -> f64 {
        self.0
    }
}

impl FromStr for Voltage {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| UnitError::Invalid {
            kind: "voltage",
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (num, unit) = split_quantity(s);
        let value: f64 = num.parse().map_err(|_| invalid("expected a number"))?;
        let volts = match unit {
            "V" | "v" => value,
            "mV" | "mv" => value / 1000.0,
            "" => return Err(invalid("missing unit (V)")),
            _ => return Err(invalid("unknown unit")),
        };
        if !volts.is_finite() || volts <= 0.0 {
            return Err(invalid("must be positive"));
        }
        Ok(Self(volts))
    }
}

impl TryFrom<String> for Voltage {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Voltage> for String {
    fn from(value: Voltage) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}V", self.0)
    }
}

/// Half-open physical address range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AddrRange {
    /// First address in the range.
    pub start: u64,
    /// One past the last address in the range.
    pub end: u64,
}

impl AddrRange {
    /// Creates the range `[0, size)`, matching `AddrRange(size)` in the driver scripts.
    pub const fn with_size(size: MemSize) -> Self {
        Self {
            start: 0,
            end: size.bytes(),
        }
    }

    /// Returns the number of bytes covered.
    pub const fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if `addr` lies inside the range.
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Returns `true` if `other` lies entirely inside this range.
    pub const fn covers(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}:{:#x}", self.start, self.end)
    }
}

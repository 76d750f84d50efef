//! Access trace parsing.
//!
//! One access per line: `I <addr>` (fetch), `R <addr>` (read) or `W <addr>` (write). Addresses
//! are hex with a `0x` prefix or decimal. Blank lines and `#` comments are skipped.

use std::fs;
use std::path::Path;

use crate::common::error::SimError;

/// Kind of memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Instruction fetch, issued on the instruction port.
    Fetch,
    /// Data read.
    Read,
    /// Data write.
    Write,
}

impl AccessKind {
    /// Returns `true` for writes.
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

/// A single traced access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Access kind.
    pub kind: AccessKind,
    /// Physical address.
    pub addr: u64,
}

fn parse_addr(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Parses trace text; `path` is only used in error messages.
pub fn parse_trace(path: &Path, text: &str) -> Result<Vec<Access>, SimError> {
    let mut accesses = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let bad = |reason: String| SimError::Trace {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        };

        let mut fields = line.split_whitespace();
        let (Some(op), Some(addr), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(bad(format!("expected '<I|R|W> <addr>', found '{line}'")));
        };
        let kind = match op {
            "I" | "i" => AccessKind::Fetch,
            "R" | "r" => AccessKind::Read,
            "W" | "w" => AccessKind::Write,
            other => return Err(bad(format!("unknown access kind '{other}'"))),
        };
        let addr = parse_addr(addr).ok_or_else(|| bad(format!("invalid address '{addr}'")))?;
        accesses.push(Access { kind, addr });
    }
    Ok(accesses)
}

/// Reads and parses the trace file at `path`.
pub fn load_trace(path: &Path) -> Result<Vec<Access>, SimError> {
    let text = fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(path, &text)
}

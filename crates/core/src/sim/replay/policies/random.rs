//! Random Replacement Policy.
//!
//! Victims come from a fixed-seed xorshift generator shared by all sets, so two runs of the
//! same trace evict the same ways.

use super::ReplacementPolicy;

/// Xorshift seed; fixed so runs are reproducible.
const SEED: u64 = 0x2545_F491_4F6C_DD1D;

/// Evicts a pseudo-randomly chosen way.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    ways: usize,
    state: u64,
}

impl RandomPolicy {
    /// Creates random state for a cache of `ways` ways.
    pub const fn new(ways: usize) -> Self {
        Self { ways, state: SEED }
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn reset(&mut self, _set: usize, _way: usize) {}

    fn touch(&mut self, _set: usize, _way: usize) {}

    fn victim(&mut self, _set: usize) -> usize {
        (self.next() % self.ways.max(1) as u64) as usize
    }
}

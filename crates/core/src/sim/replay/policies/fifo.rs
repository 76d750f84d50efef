//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Each way remembers when it was filled. Hits leave the order untouched, so a heavily reused
//! line is evicted as soon as it becomes the oldest fill in its set.

use super::ReplacementPolicy;

/// Evicts the way filled longest ago.
#[derive(Debug, Clone)]
pub struct FifoPolicy {
    filled_at: Vec<u64>,
    ways: usize,
    clock: u64,
}

impl FifoPolicy {
    /// Creates FIFO state for `sets` x `ways`.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            filled_at: vec![0; sets * ways],
            ways,
            clock: 0,
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    /// Stamps `way` with the next fill number.
    fn reset(&mut self, set: usize, way: usize) {
        self.clock += 1;
        self.filled_at[set * self.ways + way] = self.clock;
    }

    /// Hits do not change the fill order.
    fn touch(&mut self, _set: usize, _way: usize) {}

    /// Returns the way with the oldest fill stamp.
    fn victim(&mut self, set: usize) -> usize {
        let base = set * self.ways;
        (0..self.ways)
            .min_by_key(|w| self.filled_at[base + w])
            .unwrap_or(0)
    }
}

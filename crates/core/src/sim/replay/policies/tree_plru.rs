//! Tree pseudo-LRU.
//!
//! Each set keeps `ways - 1` direction bits laid out as an implicit binary tree (node `n` has
//! children `2n + 1` and `2n + 2`). A bit set to 1 points to the right subtree. Accessing a way
//! flips every bit on its path to point away from it; the victim is found by following the bits.
//! Associativity must be a power of two.

use super::ReplacementPolicy;

/// Tree pseudo-LRU state.
#[derive(Debug, Clone)]
pub struct TreePlruPolicy {
    bits: Vec<bool>,
    ways: usize,
}

impl TreePlruPolicy {
    /// Creates tree state for `sets` x `ways`.
    pub fn new(sets: usize, ways: usize) -> Self {
        let nodes = ways.saturating_sub(1).max(1);
        Self {
            bits: vec![false; sets * nodes],
            ways,
        }
    }

    fn nodes(&self) -> usize {
        self.ways.saturating_sub(1).max(1)
    }

    fn point_away(&mut self, set: usize, way: usize) {
        let base = set * self.nodes();
        let mut node = 0;
        let mut lo = 0;
        let mut span = self.ways;
        while span > 1 {
            let half = span / 2;
            let right = way >= lo + half;
            self.bits[base + node] = !right;
            if right {
                lo += half;
                node = 2 * node + 2;
            } else {
                node = 2 * node + 1;
            }
            span = half;
        }
    }
}

impl ReplacementPolicy for TreePlruPolicy {
    fn reset(&mut self, set: usize, way: usize) {
        self.point_away(set, way);
    }

    /// Flips the path bits of `way` so they point away from it.
    fn touch(&mut self, set: usize, way: usize) {
        self.point_away(set, way);
    }

    /// Follows the direction bits from the root to a leaf.
    fn victim(&mut self, set: usize) -> usize {
        let base = set * self.nodes();
        let mut node = 0;
        let mut lo = 0;
        let mut span = self.ways;
        while span > 1 {
            let half = span / 2;
            if self.bits[base + node] {
                lo += half;
                node = 2 * node + 2;
            } else {
                node = 2 * node + 1;
            }
            span = half;
        }
        lo
    }
}

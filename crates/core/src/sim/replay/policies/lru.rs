//! Recency-ordered policies.
//!
//! Both keep a last-use stamp per way; LRU evicts the smallest stamp, MRU the largest.

use super::ReplacementPolicy;

#[derive(Debug, Clone)]
struct Recency {
    last_use: Vec<u64>,
    ways: usize,
    clock: u64,
}

impl Recency {
    fn new(sets: usize, ways: usize) -> Self {
        Self {
            last_use: vec![0; sets * ways],
            ways,
            clock: 0,
        }
    }

    fn stamp(&mut self, set: usize, way: usize) {
        self.clock += 1;
        self.last_use[set * self.ways + way] = self.clock;
    }

    fn stamps(&self, set: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        let base = set * self.ways;
        (0..self.ways).map(move |w| (w, self.last_use[base + w]))
    }
}

/// Evicts the least recently used way.
#[derive(Debug, Clone)]
pub struct LruPolicy(Recency);

impl LruPolicy {
    /// Creates LRU state for `sets` x `ways`.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self(Recency::new(sets, ways))
    }
}

impl ReplacementPolicy for LruPolicy {
    /// A fill counts as a use.
    fn reset(&mut self, set: usize, way: usize) {
        self.0.stamp(set, way);
    }

    /// Moves `way` to the most recent position.
    fn touch(&mut self, set: usize, way: usize) {
        self.0.stamp(set, way);
    }

    /// Returns the way with the oldest stamp.
    fn victim(&mut self, set: usize) -> usize {
        self.0.stamps(set).min_by_key(|(_, t)| *t).map_or(0, |(w, _)| w)
    }
}

/// Evicts the most recently used way.
#[derive(Debug, Clone)]
pub struct MruPolicy(Recency);

impl MruPolicy {
    /// Creates MRU state for `sets` x `ways`.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self(Recency::new(sets, ways))
    }
}

impl ReplacementPolicy for MruPolicy {
    fn reset(&mut self, set: usize, way: usize) {
        self.0.stamp(set, way);
    }

    fn touch(&mut self, set: usize, way: usize) {
        self.0.stamp(set, way);
    }

    fn victim(&mut self, set: usize) -> usize {
        self.0.stamps(set).max_by_key(|(_, t)| *t).map_or(0, |(w, _)| w)
    }
}

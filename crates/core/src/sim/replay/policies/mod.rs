//! Cache replacement policies.
//!
//! Policies see three events per set: a fill (`reset`), a hit (`touch`), and a request for a
//! victim among fully valid ways (`victim`). Invalid ways are filled before any policy is asked.
//!
//! # Policies
//!
//! - `Fifo`: Oldest fill is evicted; hits do not matter.
//! - `Lru`: Least recently touched is evicted.
//! - `Mru`: Most recently touched is evicted.
//! - `TreePlru`: Binary tree of direction bits approximating LRU.
//! - `Random`: Xorshift-selected way.

/// First-in, first-out.
pub mod fifo;
/// Least and most recently used.
pub mod lru;
/// Xorshift random.
pub mod random;
/// Tree pseudo-LRU.
pub mod tree_plru;

pub use fifo::FifoPolicy;
pub use lru::{LruPolicy, MruPolicy};
pub use random::RandomPolicy;
pub use tree_plru::TreePlruPolicy;

use crate::config::ReplacementPolicy as PolicyKind;

/// Replacement state of one cache.
pub trait ReplacementPolicy: Send {
    /// Records a fill of `way` in `set`.
    fn reset(&mut self, set: usize, way: usize);

    /// Records a hit on `way` in `set`.
    fn touch(&mut self, set: usize, way: usize);

    /// Chooses the way of `set` to evict.
    fn victim(&mut self, set: usize) -> usize;
}

/// Builds the policy state for a cache of `sets` x `ways`.
pub fn build(kind: PolicyKind, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyKind::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyKind::Mru => Box::new(MruPolicy::new(sets, ways)),
        PolicyKind::Fifo => Box::new(FifoPolicy::new(sets, ways)),
        PolicyKind::Random => Box::new(RandomPolicy::new(ways)),
        PolicyKind::TreePlru => Box::new(TreePlruPolicy::new(sets, ways)),
    }
}

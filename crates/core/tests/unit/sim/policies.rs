//! Replacement Policy Tests.
//!
//! Each case fills ways 0..4 of a single set in order, then hits way 0.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use simwire_core::config::ReplacementPolicy as Kind;
use simwire_core::sim::replay::policies::{
    self, FifoPolicy, LruPolicy, MruPolicy, RandomPolicy, ReplacementPolicy, TreePlruPolicy,
};

const WAYS: usize = 4;

fn fill_then_hit_zero(policy: &mut dyn ReplacementPolicy) -> usize {
    for way in 0..WAYS {
        policy.reset(0, way);
    }
    policy.touch(0, 0);
    policy.victim(0)
}

#[rstest]
#[case::lru(Box::new(LruPolicy::new(1, WAYS)), 1)]
#[case::mru(Box::new(MruPolicy::new(1, WAYS)), 0)]
#[case::fifo(Box::new(FifoPolicy::new(1, WAYS)), 0)]
#[case::tree_plru(Box::new(TreePlruPolicy::new(1, WAYS)), 2)]
fn victim_after_fill_and_hit(#[case] mut policy: Box<dyn ReplacementPolicy>, #[case] victim: usize) {
    assert_eq!(fill_then_hit_zero(policy.as_mut()), victim);
}

#[test]
fn tree_plru_without_hits_evicts_first_fill() {
    let mut p = TreePlruPolicy::new(2, WAYS);
    for way in 0..WAYS {
        p.reset(1, way);
    }
    assert_eq!(p.victim(1), 0);
    // Set 0 was never touched.
    assert_eq!(p.victim(0), 0);
}

#[test]
fn sets_are_independent() {
    let mut p = LruPolicy::new(2, 2);
    p.reset(0, 0);
    p.reset(0, 1);
    p.reset(1, 1);
    p.reset(1, 0);
    assert_eq!(p.victim(0), 0);
    assert_eq!(p.victim(1), 1);
}

#[test]
fn random_is_reproducible() {
    let mut a = RandomPolicy::new(WAYS);
    let mut b = RandomPolicy::new(WAYS);
    let first: Vec<usize> = (0..16).map(|_| a.victim(0)).collect();
    let second: Vec<usize> = (0..16).map(|_| b.victim(0)).collect();
    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn victims_stay_in_range(
        kind in prop_oneof![
            Just(Kind::Lru),
            Just(Kind::Mru),
            Just(Kind::Fifo),
            Just(Kind::Random),
            Just(Kind::TreePlru),
        ],
        log_ways in 0u32..5,
        hits in prop::collection::vec(0usize..16, 0..32),
    ) {
        let ways = 1usize << log_ways;
        let mut p = policies::build(kind, 2, ways);
        for way in 0..ways {
            p.reset(1, way);
        }
        for h in hits {
            p.touch(1, h % ways);
            prop_assert!(p.victim(1) < ways);
        }
        prop_assert!(p.victim(1) < ways);
    }
}

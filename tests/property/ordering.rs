//! Property-based tests for FIFO ordering and id uniqueness

use jobgate::queue::FifoQueue;
use jobgate::store::JobStore;
use jobgate::{Category, JobId, JobInput};
use proptest::prelude::*;
use std::collections::HashSet;

/// Any number of creates yields pairwise distinct ids
#[test]
fn test_job_ids_are_distinct_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..200, 0usize..Category::ALL.len()), |(count, cat)| {
            let store = JobStore::new();
            let category = Category::ALL[cat];
            let ids: HashSet<JobId> = (0..count)
                .map(|_| store.create(category, "owner", JobInput::new()))
                .collect();
            prop_assert_eq!(ids.len(), count);
            prop_assert_eq!(store.len(), count);
            Ok(())
        })
        .unwrap();
}

/// After any number of pops, waiting ids keep their relative order and
/// positions stay 1-based and contiguous
#[test]
fn test_positions_follow_enqueue_order_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..64).prop_flat_map(|n| (Just(n), 0..=n)), |(pushed, popped)| {
            let queue = FifoQueue::new();
            let ids: Vec<JobId> = (0..pushed).map(|_| JobId::next()).collect();
            for id in &ids {
                queue.push(*id);
            }

            for expected in ids.iter().take(popped) {
                prop_assert_eq!(queue.try_pop(), Some(*expected));
            }

            for (offset, id) in ids.iter().enumerate() {
                let position = queue.position(*id);
                if offset < popped {
                    prop_assert_eq!(position, None);
                } else {
                    prop_assert_eq!(position, Some(offset - popped + 1));
                }
            }

            let waiting: Vec<usize> = ids[popped..]
                .iter()
                .filter_map(|id| queue.position(*id))
                .collect();
            prop_assert!(waiting.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(queue.len(), pushed - popped);
            Ok(())
        })
        .unwrap();
}

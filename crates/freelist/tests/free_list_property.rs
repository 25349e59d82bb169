//! Property tests for free list invariants.
//!
//! After any sequence of acquire / release operations that respects the
//! release contract, `0 <= free <= allocated <= capacity` holds and the
//! in-use count equals the number of indices the test is holding.

#![cfg(not(loom))]

use std::collections::BTreeSet;

use nebula_freelist::{FreeList, FreeListError};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Acquire,
    /// Release the held index at `selector % held.len()`
    Release { selector: usize },
    /// Guarded release of an index that is not held
    ReleaseFree { selector: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Acquire),
        2 => any::<usize>().prop_map(|selector| Op::Release { selector }),
        1 => any::<usize>().prop_map(|selector| Op::ReleaseFree { selector }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn counters_match_model(
        capacity in 1usize..32,
        guarded in any::<bool>(),
        ops in proptest::collection::vec(op_strategy(), 1..200),
    ) {
        let list = FreeList::new(capacity).unwrap();
        let mut held = BTreeSet::new();
        let mut last_released = None;

        for op in &ops {
            match *op {
                Op::Acquire => match list.acquire() {
                    Ok(index) => {
                        prop_assert!(index < capacity);
                        prop_assert!(held.insert(index), "index {} handed out twice", index);
                        if let Some(expected) = last_released.take() {
                            prop_assert_eq!(index, expected, "freed index not reused first");
                        }
                    },
                    Err(FreeListError::PoolExhausted { .. }) => {
                        prop_assert_eq!(held.len(), capacity);
                    },
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                },
                Op::Release { selector } => {
                    if held.is_empty() {
                        continue;
                    }
                    let index = *held.iter().nth(selector % held.len()).unwrap();
                    held.remove(&index);
                    if guarded {
                        prop_assert!(list.try_release(index));
                    } else {
                        list.push_unsafe(index);
                    }
                    last_released = Some(index);
                },
                Op::ReleaseFree { selector } => {
                    let index = selector % capacity;
                    // `push_unsafe` leaves the in-use flags set, so only the
                    // guarded discipline can detect a stray release.
                    if !guarded || held.contains(&index) {
                        continue;
                    }
                    let before = list.snapshot();
                    prop_assert!(!list.try_release(index));
                    prop_assert_eq!(list.snapshot(), before);
                },
            }

            let snapshot = list.snapshot();
            prop_assert!(snapshot.free <= snapshot.allocated);
            prop_assert!(snapshot.allocated <= capacity);
            prop_assert_eq!(snapshot.in_use, held.len());
            prop_assert_eq!(list.in_use(), held.len());
        }
    }

    #[test]
    fn reset_restores_fresh_state(
        capacity in 1usize..16,
        acquisitions in 0usize..16,
    ) {
        let mut list = FreeList::new(capacity).unwrap();
        for _ in 0..acquisitions.min(capacity) {
            list.acquire().unwrap();
        }

        list.reset();

        let fresh: Vec<_> = (0..capacity).map(|_| list.acquire().unwrap()).collect();
        prop_assert_eq!(fresh, (0..capacity).collect::<Vec<_>>());
    }
}

//! Packed allocated / free-stack counters.
//!
//! Both counters live in one `AtomicU64`: the allocated count `A` in the low
//! 32 bits and the free-stack size `S` in the high 32 bits.
//!
//! ```text
//!  63                32 31                 0
//! +--------------------+--------------------+
//! |   S (free stack)   |   A (allocated)    |
//! +--------------------+--------------------+
//! ```
//!
//! Every update is a single RMW on the whole word, so one `load` always
//! yields a pair that existed at one instant. `A` can overshoot the capacity
//! by the number of racing acquirers before they roll back; capacity is
//! capped at [`MAX_CAPACITY`](crate::MAX_CAPACITY) (`i32::MAX`), which keeps
//! that overshoot from ever carrying into `S`.

use crate::sync::{AtomicU64, Ordering};

const FREE_SHIFT: u32 = 32;
const FREE_ONE: u64 = 1 << FREE_SHIFT;
const ALLOCATED_MASK: u64 = u32::MAX as u64;

/// `(A, S)` observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct CounterPair {
    pub(crate) allocated: u32,
    pub(crate) free: u32,
}

impl CounterPair {
    #[inline]
    fn unpack(word: u64) -> Self {
        Self {
            allocated: (word & ALLOCATED_MASK) as u32,
            free: (word >> FREE_SHIFT) as u32,
        }
    }

    #[inline]
    fn pack(self) -> u64 {
        (u64::from(self.free) << FREE_SHIFT) | u64::from(self.allocated)
    }
}

#[derive(Debug)]
pub(crate) struct Counters(AtomicU64);

impl Counters {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Tear-free read of both counters.
    #[inline]
    pub(crate) fn load(&self, ordering: Ordering) -> CounterPair {
        CounterPair::unpack(self.0.load(ordering))
    }

    /// Bump `A`, returning its previous value (the candidate index).
    #[inline]
    pub(crate) fn bump(&self) -> u32 {
        CounterPair::unpack(self.0.fetch_add(1, Ordering::AcqRel)).allocated
    }

    /// Undo a [`bump`](Self::bump) that overshot the capacity.
    #[inline]
    pub(crate) fn rollback_bump(&self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }

    /// Reserve one free-stack position, returning the new size `S'`.
    /// The reserved position is `S' - 1`.
    #[inline]
    pub(crate) fn reserve_push(&self) -> u32 {
        CounterPair::unpack(self.0.fetch_add(FREE_ONE, Ordering::AcqRel)).free + 1
    }

    /// Undo a [`reserve_push`](Self::reserve_push) that ran past the slots.
    #[inline]
    pub(crate) fn cancel_push(&self) {
        self.0.fetch_sub(FREE_ONE, Ordering::AcqRel);
    }

    /// Try to move `S` from `current.free` to `current.free - 1`.
    ///
    /// Fails with the fresh pair when either half changed since `current`
    /// was read, so bump and rollback traffic on `A` fails the claim as well.
    /// Callers compare `free` on the returned pair to tell the two apart.
    /// `current.free` must be non-zero.
    #[inline]
    pub(crate) fn try_claim_pop(&self, current: CounterPair) -> Result<(), CounterPair> {
        debug_assert!(current.free > 0);
        let claimed = CounterPair {
            allocated: current.allocated,
            free: current.free - 1,
        };
        self.0
            .compare_exchange(
                current.pack(),
                claimed.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(CounterPair::unpack)
    }

    pub(crate) fn clear(&self) {
        self.0.store(0, Ordering::Release);
    }
}

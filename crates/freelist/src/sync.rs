//! Atomic primitives used by the free list.
//!
//! Under `--cfg loom` everything resolves to loom's model-checked types so the
//! same code runs under the permutation tester in `tests/loom.rs`.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Hint issued on every iteration of a busy-wait loop.
///
/// Loom only explores other threads when the spinning thread yields, so a
/// plain `spin_loop` would never terminate under the model checker.
#[inline]
pub(crate) fn spin_hint() {
    #[cfg(loom)]
    loom::thread::yield_now();

    #[cfg(not(loom))]
    core::hint::spin_loop();
}

/// Give the remainder of the time slice away.
#[inline]
pub(crate) fn yield_now() {
    #[cfg(loom)]
    loom::thread::yield_now();

    #[cfg(not(loom))]
    std::thread::yield_now();
}

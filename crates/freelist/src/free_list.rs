//! Lock-free fixed-capacity index allocator
//!
//! # Layout
//!
//! ```text
//! counters: [ S | A ]            one AtomicU64, see `counters`
//! slots:    [s0][s1]...[sC-1]    AtomicU32, 0 = unwritten, else index + 1
//! in_use:   [f0][f1]...[fC-1]    AtomicBool per index (optional)
//! ```
//!
//! Indices below `A` that are not checked out sit in `slots[0..S]`. Acquire
//! pops from that stack when `S > 0` and otherwise bumps `A`. Release
//! reserves a stack position by bumping `S` and then publishes the encoded
//! index into it.
//!
//! ## Invariants
//!
//! At every quiescent point:
//! - `0 <= S <= A <= C`
//! - `A - S` equals the number of checked-out indices
//! - every index in `0..A` is either checked out or stored exactly once in
//!   `slots[0..S]`
//!
//! A release bumps `S` before its slot write lands, so an acquirer that
//! claims that position spins until the value is non-zero instead of
//! reading a half-finished push.

use core::fmt;

use tracing::{debug, trace};

use crate::backoff::Backoff;
use crate::config::FreeListConfig;
use crate::counters::Counters;
use crate::error::{FreeListError, FreeListResult};
use crate::guard::SlotGuard;
use crate::stats::{FreeListStats, StatsRecorder};
use crate::sync::{AtomicBool, AtomicU32, Ordering};

/// Largest capacity a [`FreeList`] accepts.
pub const MAX_CAPACITY: usize = i32::MAX as usize;

/// Slot value marking a position whose push has not landed yet.
const EMPTY_SLOT: u32 = 0;

#[inline]
fn encode(index: usize) -> u32 {
    index as u32 + 1
}

#[inline]
fn decode(raw: u32) -> usize {
    (raw - 1) as usize
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    /// Indices ever bump-allocated (clamped to capacity)
    pub allocated: usize,
    /// Entries on the free stack
    pub free: usize,
    /// Indices currently checked out
    pub in_use: usize,
    /// Fixed capacity
    pub capacity: usize,
}

impl Occupancy {
    /// Indices that can still be acquired
    pub fn available(&self) -> usize {
        self.capacity - self.in_use
    }
}

/// Fixed-capacity lock-free index allocator
///
/// Hands out small integer handles in `0..capacity` to any number of threads
/// without locks. Freed indices are kept on a LIFO stack and handed out again
/// before any new index is bump-allocated.
///
/// Two release disciplines exist:
/// - [`push_unsafe`](Self::push_unsafe) trusts the caller to release each
///   checked-out index exactly once.
/// - [`try_release`](Self::try_release) consults the in-use flags and
///   rejects double releases.
///
/// `push_unsafe` does not clear the in-use flags, so a given instance should
/// stick to one discipline.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use nebula_freelist::FreeList;
///
/// let list = Arc::new(FreeList::new(64)?);
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let list = Arc::clone(&list);
///         thread::spawn(move || {
///             for _ in 0..1000 {
///                 let index = list.acquire().unwrap();
///                 // Use index...
///                 assert!(list.try_release(index));
///             }
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(list.in_use_consistent(), 0);
/// # Ok::<(), nebula_freelist::FreeListError>(())
/// ```
pub struct FreeList {
    counters: Counters,
    /// Free-stack storage. Empty once disposed.
    slots: Box<[AtomicU32]>,
    in_use: Option<Box<[AtomicBool]>>,
    capacity: usize,
    config: FreeListConfig,
    stats: StatsRecorder,
    created: bool,
}

impl FreeList {
    /// Creates a free list with default configuration
    pub fn new(capacity: usize) -> FreeListResult<Self> {
        Self::with_config(capacity, FreeListConfig::default())
    }

    /// Creates a free list with custom configuration
    ///
    /// # Errors
    /// Returns `InvalidArgument` if:
    /// - `capacity` is zero or above [`MAX_CAPACITY`]
    /// - `config` fails validation
    pub fn with_config(capacity: usize, config: FreeListConfig) -> FreeListResult<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(FreeListError::invalid_capacity(capacity, MAX_CAPACITY));
        }
        config.validate()?;

        let slots = (0..capacity).map(|_| AtomicU32::new(EMPTY_SLOT)).collect();
        let in_use = config
            .track_in_use
            .then(|| (0..capacity).map(|_| AtomicBool::new(false)).collect());

        debug!(
            capacity,
            track_in_use = config.track_in_use,
            max_retries = ?config.max_retries,
            "free list created"
        );

        Ok(Self {
            counters: Counters::new(),
            slots,
            in_use,
            capacity,
            stats: StatsRecorder::new(config.track_stats),
            config,
            created: true,
        })
    }

    /// Creates a free list with production config
    pub fn production(capacity: usize) -> FreeListResult<Self> {
        Self::with_config(capacity, FreeListConfig::production())
    }

    /// Creates a free list with debug config
    pub fn debug(capacity: usize) -> FreeListResult<Self> {
        Self::with_config(capacity, FreeListConfig::debug())
    }

    /// Creates a free list with performance config
    pub fn performance(capacity: usize) -> FreeListResult<Self> {
        Self::with_config(capacity, FreeListConfig::performance())
    }

    // ------------------------------------------------------------------
    // Acquire
    // ------------------------------------------------------------------

    /// Checks out an index.
    ///
    /// Returns the most recently freed index if the free stack is non-empty,
    /// otherwise bump-allocates the next never-used index.
    ///
    /// # Errors
    /// - `PoolExhausted` when the stack is empty and all `capacity` indices
    ///   are checked out.
    /// - `SpinTimeout` when the free-stack size changed under this call
    ///   `max_retries` times in a row. Nothing is claimed in that case.
    pub fn acquire(&self) -> FreeListResult<usize> {
        if let Some(index) = self.pop_free()? {
            self.mark_in_use(index);
            self.stats.record_reuse();
            self.record_peak();
            return Ok(index);
        }

        self.bump_allocate()
    }

    /// Checks out an index that is returned when the guard drops.
    ///
    /// The guard releases through [`try_release`](Self::try_release), or
    /// through [`push_unsafe`](Self::push_unsafe) when in-use tracking is
    /// disabled.
    pub fn acquire_guard(&self) -> FreeListResult<SlotGuard<'_>> {
        self.acquire().map(|index| SlotGuard::new(self, index))
    }

    /// Claims the top free-stack position, if any, and takes its index.
    fn pop_free(&self) -> FreeListResult<Option<usize>> {
        let mut backoff = Backoff::new(self.config.use_backoff);
        let mut attempts: u32 = 0;
        let mut current = self.counters.load(Ordering::Acquire);

        loop {
            if current.free == 0 {
                return Ok(None);
            }

            match self.counters.try_claim_pop(current) {
                Ok(()) => break,
                Err(fresh) => {
                    self.stats.record_contention();
                    // Bumps and rollbacks of `A` fail the claim too, but only a
                    // moved `S` spends the retry budget.
                    if fresh.free != current.free {
                        attempts = attempts.saturating_add(1);
                        self.check_retry_budget(attempts)?;
                    }
                    backoff.snooze();
                    current = fresh;
                },
            }
        }

        let position = (current.free - 1) as usize;
        Ok(Some(self.take_slot(position)))
    }

    /// Fails with `SpinTimeout` once `attempts` reaches `max_retries`.
    fn check_retry_budget(&self, attempts: u32) -> FreeListResult<()> {
        match self.config.max_retries {
            Some(max) if attempts >= max => {
                self.stats.record_spin_timeout();
                Err(FreeListError::spin_timeout("acquire", attempts))
            },
            _ => Ok(()),
        }
    }

    /// Empties a claimed slot, waiting for a pending push to land.
    ///
    /// Unbounded: the position is already claimed, and the pusher that
    /// reserved it is between its counter bump and its slot write.
    fn take_slot(&self, position: usize) -> usize {
        let slot = &self.slots[position];
        let mut backoff = Backoff::new(self.config.use_backoff);
        let mut reported = false;
        loop {
            let raw = slot.swap(EMPTY_SLOT, Ordering::AcqRel);
            if raw != EMPTY_SLOT {
                return decode(raw);
            }
            if !reported && backoff.is_yielding() {
                trace!(position, "waiting for pending push to land");
                reported = true;
            }
            backoff.snooze();
        }
    }

    fn bump_allocate(&self) -> FreeListResult<usize> {
        let index = self.counters.bump() as usize;
        if index >= self.slots.len() {
            self.counters.rollback_bump();
            self.stats.record_exhausted();
            return Err(FreeListError::pool_exhausted(self.capacity));
        }

        self.mark_in_use(index);
        self.stats.record_bump();
        self.record_peak();
        Ok(index)
    }

    #[inline]
    fn mark_in_use(&self, index: usize) {
        if let Some(flag) = self.flag(index) {
            flag.store(true, Ordering::Release);
        }
    }

    /// Whether the in-use flags exist, i.e. `try_release` can guard
    pub(crate) fn tracks_in_use(&self) -> bool {
        self.in_use.is_some()
    }

    #[inline]
    fn flag(&self, index: usize) -> Option<&AtomicBool> {
        self.in_use.as_deref().and_then(|flags| flags.get(index))
    }

    fn record_peak(&self) {
        if self.stats.is_enabled() {
            self.stats.update_peak(self.in_use_consistent());
        }
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Returns `index` to the free stack without any validation.
    ///
    /// The caller guarantees that `index` is currently checked out and that
    /// nobody else releases it concurrently. Releasing the same index twice
    /// puts it on the stack twice, after which two acquirers can receive it.
    /// The in-use flags are left untouched.
    ///
    /// Ignored after [`dispose`](Self::dispose).
    ///
    /// # Panics
    /// Panics if more indices are released than the free list can hold,
    /// which only happens when the caller breaks the contract above. A
    /// concurrent `acquire` may already have claimed the overflowing
    /// position before it is cancelled; that acquirer then panics in its
    /// own thread with an out-of-bounds slot access.
    pub fn push_unsafe(&self, index: usize) {
        debug_assert!(
            index < self.capacity,
            "index {index} out of range for capacity {}",
            self.capacity
        );
        if self.slots.is_empty() {
            debug!(index, "release on disposed free list ignored");
            return;
        }

        let position = self.counters.reserve_push() as usize - 1;
        let Some(slot) = self.slots.get(position) else {
            self.counters.cancel_push();
            panic!(
                "free stack overflow: {} entries pushed onto a free list of capacity {}",
                position + 1,
                self.capacity
            );
        };

        let encoded = encode(index);
        let mut backoff = Backoff::new(self.config.use_backoff);
        // The position is ours; a non-empty slot means an acquirer that
        // claimed it earlier has not swapped its value out yet.
        while slot
            .compare_exchange(EMPTY_SLOT, encoded, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            backoff.snooze();
        }

        self.stats.record_release();
    }

    /// Returns `index` to the free stack if it is currently checked out.
    ///
    /// Returns `false` without touching the stack when `index` is already
    /// free, out of range, or in-use tracking is disabled. Repeated calls on
    /// the same index after a successful one are harmless.
    pub fn try_release(&self, index: usize) -> bool {
        let Some(flag) = self.flag(index) else {
            trace!(index, "guarded release rejected: index is not tracked");
            self.stats.record_rejected_release();
            return false;
        };

        if flag
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!(index, "guarded release rejected: index is not checked out");
            self.stats.record_rejected_release();
            return false;
        }

        self.push_unsafe(index);
        true
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Clears counters, stack slots, in-use flags and statistics.
    ///
    /// Every previously acquired index becomes free again and the next
    /// acquisitions start from index 0.
    pub fn reset(&mut self) {
        self.counters.clear();
        for slot in &*self.slots {
            slot.store(EMPTY_SLOT, Ordering::Relaxed);
        }
        if let Some(flags) = &self.in_use {
            for flag in &**flags {
                flag.store(false, Ordering::Relaxed);
            }
        }
        self.stats.reset();

        debug!(capacity = self.capacity, "free list reset");
    }

    /// Releases the backing storage.
    ///
    /// A second call is a no-op. Afterwards `acquire` reports
    /// `PoolExhausted` and releases are ignored. Dropping the free list
    /// releases the storage as well.
    pub fn dispose(&mut self) {
        if !self.created {
            return;
        }

        self.counters.clear();
        self.slots = Box::default();
        self.in_use = None;
        self.created = false;

        debug!(capacity = self.capacity, "free list disposed");
    }

    /// Whether the backing storage is still allocated
    pub fn is_created(&self) -> bool {
        self.created
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Returns the fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configuration
    pub fn config(&self) -> &FreeListConfig {
        &self.config
    }

    /// Approximate in-use count.
    ///
    /// Reads `A` and `S` with two independent loads, so under concurrent
    /// mutation the pair may not belong to the same instant. Saturates at
    /// zero. Use [`in_use_consistent`](Self::in_use_consistent) when the
    /// value must be meaningful while other threads are active.
    pub fn in_use(&self) -> usize {
        let allocated = self.counters.load(Ordering::Relaxed).allocated;
        let free = self.counters.load(Ordering::Relaxed).free;
        (allocated as usize).saturating_sub(free as usize)
    }

    /// In-use count computed from one tear-free read of both counters.
    ///
    /// Always within `0..=capacity`, even while acquisitions and releases
    /// are in flight.
    pub fn in_use_consistent(&self) -> usize {
        self.snapshot().in_use
    }

    /// Consistent view of the counters
    pub fn snapshot(&self) -> Occupancy {
        let pair = self.counters.load(Ordering::Acquire);
        // A racing bump may sit above capacity until it rolls back.
        let allocated = (pair.allocated as usize).min(self.capacity);
        let free = pair.free as usize;
        Occupancy {
            allocated,
            free,
            in_use: allocated.saturating_sub(free),
            capacity: self.capacity,
        }
    }

    /// Number of indices ever bump-allocated (clamped to capacity)
    pub fn allocated(&self) -> usize {
        self.snapshot().allocated
    }

    /// Number of entries on the free stack
    pub fn free_len(&self) -> usize {
        self.snapshot().free
    }

    /// Whether `index` is checked out according to the in-use flags.
    ///
    /// `None` when tracking is disabled or `index` is out of range. Only
    /// meaningful under the `try_release` discipline.
    pub fn is_in_use(&self, index: usize) -> Option<bool> {
        self.flag(index).map(|flag| flag.load(Ordering::Acquire))
    }

    /// Get statistics (if tracking is enabled)
    pub fn stats(&self) -> Option<FreeListStats> {
        self.stats.is_enabled().then(|| self.stats.snapshot())
    }
}

impl fmt::Debug for FreeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occupancy = self.snapshot();
        f.debug_struct("FreeList")
            .field("capacity", &self.capacity)
            .field("allocated", &occupancy.allocated)
            .field("free", &occupancy.free)
            .field("in_use", &occupancy.in_use)
            .field("track_in_use", &self.in_use.is_some())
            .field("created", &self.created)
            .finish()
    }
}

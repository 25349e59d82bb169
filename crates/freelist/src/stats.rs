//! Statistics tracking for the free list

use core::fmt;

use crate::sync::{AtomicU64, Ordering};

/// Operation counters, updated with relaxed atomics when enabled.
#[derive(Debug)]
pub(crate) struct StatsRecorder {
    enabled: bool,
    reused: AtomicU64,
    bumped: AtomicU64,
    released: AtomicU64,
    rejected_releases: AtomicU64,
    exhausted: AtomicU64,
    contention_retries: AtomicU64,
    spin_timeouts: AtomicU64,
    peak_in_use: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reused: AtomicU64::new(0),
            bumped: AtomicU64::new(0),
            released: AtomicU64::new(0),
            rejected_releases: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
            contention_retries: AtomicU64::new(0),
            spin_timeouts: AtomicU64::new(0),
            peak_in_use: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an index taken from the free stack
    pub(crate) fn record_reuse(&self) {
        self.bump(&self.reused);
    }

    /// Record a fresh bump allocation
    pub(crate) fn record_bump(&self) {
        self.bump(&self.bumped);
    }

    /// Record an index pushed back onto the free stack
    pub(crate) fn record_release(&self) {
        self.bump(&self.released);
    }

    /// Record a guarded release that was refused
    pub(crate) fn record_rejected_release(&self) {
        self.bump(&self.rejected_releases);
    }

    pub(crate) fn record_exhausted(&self) {
        self.bump(&self.exhausted);
    }

    pub(crate) fn record_contention(&self) {
        self.bump(&self.contention_retries);
    }

    pub(crate) fn record_spin_timeout(&self) {
        self.bump(&self.spin_timeouts);
    }

    /// Raise the recorded peak to `in_use` if it is higher
    pub(crate) fn update_peak(&self, in_use: usize) {
        if !self.enabled {
            return;
        }
        let value = in_use as u64;
        let mut max = self.peak_in_use.load(Ordering::Relaxed);
        while value > max {
            match self.peak_in_use.compare_exchange_weak(
                max,
                value,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => max = x,
            }
        }
    }

    pub(crate) fn snapshot(&self) -> FreeListStats {
        FreeListStats {
            reused: self.reused.load(Ordering::Relaxed),
            bumped: self.bumped.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            rejected_releases: self.rejected_releases.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            contention_retries: self.contention_retries.load(Ordering::Relaxed),
            spin_timeouts: self.spin_timeouts.load(Ordering::Relaxed),
            peak_in_use: self.peak_in_use.load(Ordering::Relaxed) as usize,
        }
    }

    /// Reset all statistics
    pub(crate) fn reset(&self) {
        for counter in [
            &self.reused,
            &self.bumped,
            &self.released,
            &self.rejected_releases,
            &self.exhausted,
            &self.contention_retries,
            &self.spin_timeouts,
            &self.peak_in_use,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Free list statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeListStats {
    /// Acquisitions served from the free stack
    pub reused: u64,
    /// Acquisitions served by bump allocation
    pub bumped: u64,
    /// Indices pushed back onto the free stack (both release paths)
    pub released: u64,
    /// Guarded releases refused because the index was not checked out
    pub rejected_releases: u64,
    /// Acquisitions that failed with `PoolExhausted`
    pub exhausted: u64,
    /// Failed counter CAS attempts in `acquire`
    pub contention_retries: u64,
    /// Acquisitions that gave up with `SpinTimeout`
    pub spin_timeouts: u64,
    /// Highest in-use count observed after an acquisition
    pub peak_in_use: usize,
}

impl FreeListStats {
    /// Total successful acquisitions
    pub fn total_acquisitions(&self) -> u64 {
        self.reused + self.bumped
    }

    /// Share of acquisitions served from the free stack (0.0 - 1.0)
    pub fn reuse_rate(&self) -> f64 {
        let total = self.total_acquisitions();
        if total == 0 {
            0.0
        } else {
            self.reused as f64 / total as f64
        }
    }
}

impl fmt::Display for FreeListStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Free List Statistics:")?;
        writeln!(
            f,
            "  Acquisitions: {} (reuse rate: {:.2}%)",
            self.total_acquisitions(),
            self.reuse_rate() * 100.0
        )?;
        writeln!(f, "  Releases: {} (rejected: {})", self.released, self.rejected_releases)?;
        writeln!(f, "  Exhausted: {}", self.exhausted)?;
        writeln!(
            f,
            "  Contention retries: {} (timeouts: {})",
            self.contention_retries, self.spin_timeouts
        )?;
        write!(f, "  Peak in use: {}", self.peak_in_use)
    }
}

//! Exponential backoff for CAS retry and slot-wait loops.

use crate::sync::{spin_hint, yield_now};

/// Spin budget (in `spin_loop` hints) after which the backoff yields instead.
const SPIN_LIMIT: u32 = 64;

/// Backoff state for one retry loop.
///
/// Each [`snooze`](Self::snooze) doubles the number of spin hints up to
/// [`SPIN_LIMIT`], after which the thread yields its time slice. A disabled
/// backoff issues a single hint per iteration.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    current: u32,
    enabled: bool,
}

impl Backoff {
    #[inline]
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            current: 1,
            enabled,
        }
    }

    /// Wait a little before the next attempt.
    #[inline]
    pub(crate) fn snooze(&mut self) {
        if !self.enabled {
            spin_hint();
            return;
        }

        if self.current < SPIN_LIMIT {
            for _ in 0..self.current {
                spin_hint();
            }
            self.current *= 2;
        } else {
            yield_now();
        }
    }

    /// Whether the spin phase is over and the loop has started yielding.
    #[inline]
    pub(crate) fn is_yielding(&self) -> bool {
        self.enabled && self.current >= SPIN_LIMIT
    }
}

//! Free list configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FreeListError, FreeListResult};

/// Configuration for [`FreeList`](crate::FreeList)
///
/// Capacity is not part of the config: it is passed to the constructor and
/// never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FreeListConfig {
    /// Allocate the per-index in-use flags consulted by `try_release`.
    ///
    /// Without them the guarded release path cannot tell a live index from a
    /// free one and rejects every call.
    pub track_in_use: bool,

    /// Maximum CAS retry attempts on the free-stack counter before `acquire`
    /// fails with `SpinTimeout`. `None` retries forever.
    pub max_retries: Option<u32>,

    /// Use exponential backoff between CAS retries and slot waits
    pub use_backoff: bool,

    /// Enable statistics tracking
    pub track_stats: bool,
}

impl Default for FreeListConfig {
    fn default() -> Self {
        Self {
            track_in_use: true,
            max_retries: Some(10_000),
            use_backoff: true,
            track_stats: cfg!(debug_assertions),
        }
    }
}

impl FreeListConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_in_use: true,
            max_retries: Some(100_000),
            use_backoff: true,
            track_stats: false,
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_in_use: true,
            max_retries: Some(1_000),
            use_backoff: false,
            track_stats: true,
        }
    }

    /// Performance configuration - minimal overhead
    ///
    /// Drops the in-use flags, so only `push_unsafe` can return indices.
    #[must_use]
    pub fn performance() -> Self {
        Self {
            track_in_use: false,
            max_retries: None,
            use_backoff: false,
            track_stats: false,
        }
    }

    /// Validate configuration, returning an error if invalid.
    pub fn validate(&self) -> FreeListResult<()> {
        if self.max_retries == Some(0) {
            return Err(FreeListError::invalid_argument(
                "max_retries must be greater than 0 (use None for unbounded)",
            ));
        }
        Ok(())
    }
}

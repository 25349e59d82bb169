//! Error types for nebula-freelist
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;
use tracing::{trace, warn};

/// Free list errors
///
/// Exhaustion and spin timeouts are ordinary operating conditions and are
/// returned as values. A rejected double release is not an error at all:
/// [`FreeList::try_release`](crate::FreeList::try_release) reports it as
/// `false`.
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FreeListError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Free list exhausted (capacity: {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("Spin timeout in {operation} after {attempts} attempts")]
    SpinTimeout {
        operation: &'static str,
        attempts: u32,
    },
}

impl FreeListError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. } | Self::SpinTimeout { .. }
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "FREELIST:ARG:INVALID",
            Self::PoolExhausted { .. } => "FREELIST:POOL:EXHAUSTED",
            Self::SpinTimeout { .. } => "FREELIST:SPIN:TIMEOUT",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create invalid capacity error
    pub fn invalid_capacity(capacity: usize, max: usize) -> Self {
        Self::invalid_argument(format!("capacity must be in 1..={max}, got {capacity}"))
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(capacity: usize) -> Self {
        trace!(capacity, "free list exhausted");

        Self::PoolExhausted { capacity }
    }

    /// Create spin timeout error
    pub fn spin_timeout(operation: &'static str, attempts: u32) -> Self {
        warn!(operation, attempts, "free list retry budget exhausted");

        Self::SpinTimeout {
            operation,
            attempts,
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for free list operations
pub type FreeListResult<T> = Result<T, FreeListError>;

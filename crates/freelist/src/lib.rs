//! # nebula-freelist
//!
//! Fixed-capacity, lock-free index allocator for slot-based pools.
//!
//! A [`FreeList`] hands out small integer handles in `0..capacity` to many
//! threads at once and takes them back, using only atomic compare-and-swap,
//! fetch-add and swap. It combines:
//! - a bump allocator for never-used indices
//! - a LIFO stack of freed indices that are handed out first
//! - optional per-index in-use flags that make release double-free safe
//!
//! The caller maps indices to real resources (buffers, connections, nodes);
//! that mapping is not part of this crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_freelist::prelude::*;
//!
//! let list = FreeList::new(3)?;
//!
//! let a = list.acquire()?;
//! let b = list.acquire()?;
//! assert!(list.try_release(a));
//! assert!(!list.try_release(a)); // double release is rejected
//!
//! // Freed indices come back first
//! assert_eq!(list.acquire()?, a);
//!
//! // Or let a guard release the index on drop
//! {
//!     let slot = list.acquire_guard()?;
//!     assert_eq!(slot.index(), 2);
//! }
//! assert_eq!(list.in_use_consistent(), 2);
//! # let _ = b;
//! # Ok::<(), FreeListError>(())
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize` / `Deserialize` for [`FreeListConfig`]
//!
//! ## Model checking
//!
//! The atomics go through an internal shim that switches to `loom` under
//! `RUSTFLAGS="--cfg loom"`:
//!
//! ```text
//! RUSTFLAGS="--cfg loom" cargo test -p nebula-freelist --test loom --release
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod backoff;
pub mod config;
mod counters;
pub mod error;
pub mod free_list;
pub mod guard;
pub mod stats;
mod sync;

pub use crate::config::FreeListConfig;
pub use crate::error::{FreeListError, FreeListResult};
pub use crate::free_list::{FreeList, MAX_CAPACITY, Occupancy};
pub use crate::guard::SlotGuard;
pub use crate::stats::FreeListStats;

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::config::FreeListConfig;
    pub use crate::error::{FreeListError, FreeListResult};
    pub use crate::free_list::{FreeList, Occupancy};
    pub use crate::guard::SlotGuard;
    pub use crate::stats::FreeListStats;
}

//! RAII checkout of a single index.

use core::fmt;
use core::ops::Deref;

use crate::free_list::FreeList;

/// An index checked out from a [`FreeList`].
///
/// Dropping the guard returns the index through
/// [`FreeList::try_release`]. On a list without in-use tracking it goes
/// through [`FreeList::push_unsafe`] instead, so the index must not be
/// released by hand while the guard is armed.
#[must_use = "dropping the guard immediately releases the index"]
pub struct SlotGuard<'a> {
    list: &'a FreeList,
    index: usize,
    armed: bool,
}

impl<'a> SlotGuard<'a> {
    pub(crate) fn new(list: &'a FreeList, index: usize) -> Self {
        Self {
            list,
            index,
            armed: true,
        }
    }

    /// The checked-out index
    pub fn index(&self) -> usize {
        self.index
    }

    /// The free list this index belongs to
    pub fn list(&self) -> &'a FreeList {
        self.list
    }

    /// Detach the index from the guard, leaving it checked out.
    ///
    /// The caller becomes responsible for releasing it.
    pub fn detach(mut self) -> usize {
        self.armed = false;
        self.index
    }
}

impl Deref for SlotGuard<'_> {
    type Target = usize;

    fn deref(&self) -> &Self::Target {
        &self.index
    }
}

impl fmt::Debug for SlotGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotGuard")
            .field("index", &self.index)
            .field("armed", &self.armed)
            .finish()
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.list.tracks_in_use() {
            self.list.try_release(self.index);
        } else {
            self.list.push_unsafe(self.index);
        }
    }
}

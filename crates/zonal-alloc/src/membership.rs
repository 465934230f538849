//! Ownership queries for debugging.
//!
//! Only compiled with debug assertions or the `diagnostics` feature.
//! These scans are linear in chunks or free-list length and are never run
//! from an allocation path.

use zonal_core::WordHandle;

use crate::size_class::SizeClassAllocator;

/// Read-only view answering "does this allocator own that block?".
#[derive(Clone, Copy)]
pub struct MembershipProbe<'a> {
    alloc: &'a SizeClassAllocator,
}

impl MembershipProbe<'_> {
    /// Whether `handle` names `n` words that this allocator carved in the
    /// current epoch, whether currently on loan or sitting on a free list.
    pub fn has_in_pools(&self, handle: WordHandle, n: usize) -> bool {
        self.alloc.arena.contains(handle, n) || self.is_free(handle, n)
    }

    /// Whether `handle` is on the free list for size `n`.
    pub fn is_free(&self, handle: WordHandle, n: usize) -> bool {
        self.alloc
            .free_lists
            .get(&n)
            .is_some_and(|list| list.contains(&handle))
    }
}

impl SizeClassAllocator {
    /// Borrow a [`MembershipProbe`] over this allocator.
    pub fn probe(&self) -> MembershipProbe<'_> {
        MembershipProbe { alloc: self }
    }
}

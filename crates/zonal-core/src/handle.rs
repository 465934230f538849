//! The allocation unit and block handles.
//!
//! A [`WordHandle`] names a block of words inside an allocator. It replaces
//! a raw pointer: `chunk` selects backing storage, `offset` is the first
//! word within it, and `epoch` ties the handle to one allocator lifetime
//! so that handles surviving a `reset()` are detectable.

use std::fmt;

/// The allocation unit: one 32-bit integer.
///
/// Sizes passed to every allocator in this workspace are counts of
/// `Word`s, never bytes.
pub type Word = u32;

/// Location of an allocated block of words.
///
/// Handles carry no size. A block must be released with the same word
/// count it was allocated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct WordHandle {
    chunk: u32,
    offset: u32,
    epoch: u32,
}

impl WordHandle {
    /// Create a handle from its raw parts.
    pub const fn new(chunk: u32, offset: u32, epoch: u32) -> Self {
        Self {
            chunk,
            offset,
            epoch,
        }
    }

    /// Index of the chunk (or system block slot) holding the block.
    pub const fn chunk(&self) -> u32 {
        self.chunk
    }

    /// Offset of the first word within its chunk.
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Allocator epoch (or slot generation) the handle was issued in.
    pub const fn epoch(&self) -> u32 {
        self.epoch
    }

    /// The same location stamped with a different epoch.
    pub const fn with_epoch(self, epoch: u32) -> Self {
        Self { epoch, ..self }
    }

    /// Whether the word range `[offset, offset + words)` of this handle
    /// overlaps the range of `other`, assuming both live in one allocator.
    pub fn overlaps(&self, words: usize, other: &WordHandle, other_words: usize) -> bool {
        if self.chunk != other.chunk || self.epoch != other.epoch {
            return false;
        }
        let a = self.offset as usize;
        let b = other.offset as usize;
        a < b + other_words && b < a + words
    }
}

impl fmt::Display for WordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WordHandle(chunk={}, off={}, epoch={})",
            self.chunk, self.offset, self.epoch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_parts() {
        let h = WordHandle::new(3, 1024, 7);
        assert_eq!(h.chunk(), 3);
        assert_eq!(h.offset(), 1024);
        assert_eq!(h.epoch(), 7);
    }

    #[test]
    fn with_epoch_keeps_location() {
        let h = WordHandle::new(1, 8, 0).with_epoch(5);
        assert_eq!(h, WordHandle::new(1, 8, 5));
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let a = WordHandle::new(0, 0, 0);
        let b = WordHandle::new(0, 3, 0);
        assert!(!a.overlaps(3, &b, 3));
        assert!(!b.overlaps(3, &a, 3));
    }

    #[test]
    fn intersecting_ranges_overlap() {
        let a = WordHandle::new(0, 0, 0);
        let b = WordHandle::new(0, 2, 0);
        assert!(a.overlaps(3, &b, 1));
        assert!(b.overlaps(1, &a, 3));
    }

    #[test]
    fn different_chunks_never_overlap() {
        let a = WordHandle::new(0, 0, 0);
        let b = WordHandle::new(1, 0, 0);
        assert!(!a.overlaps(8, &b, 8));
    }

    #[test]
    fn display_names_all_parts() {
        let h = WordHandle::new(2, 16, 1);
        assert_eq!(h.to_string(), "WordHandle(chunk=2, off=16, epoch=1)");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn overlap_is_symmetric(
                a_off in 0u32..64, a_len in 1usize..16,
                b_off in 0u32..64, b_len in 1usize..16,
            ) {
                let a = WordHandle::new(0, a_off, 0);
                let b = WordHandle::new(0, b_off, 0);
                prop_assert_eq!(a.overlaps(a_len, &b, b_len), b.overlaps(b_len, &a, a_len));
            }
        }
    }
}

//! Block handles as they cross the C boundary.

use zonal_core::WordHandle;

/// A block of words owned by a Zonal allocator.
///
/// `location` packs the chunk index into the upper 32 bits and the word
/// offset into the lower 32. `epoch` must be passed back unchanged; it is
/// how the allocator recognises blocks from before a reset.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZonalBlock {
    /// Chunk (high 32 bits) and offset (low 32 bits).
    pub location: u64,
    /// Allocator epoch the block was issued in.
    pub epoch: u32,
}

impl From<WordHandle> for ZonalBlock {
    fn from(h: WordHandle) -> Self {
        Self {
            location: ((h.chunk() as u64) << 32) | h.offset() as u64,
            epoch: h.epoch(),
        }
    }
}

impl From<ZonalBlock> for WordHandle {
    fn from(b: ZonalBlock) -> Self {
        WordHandle::new((b.location >> 32) as u32, b.location as u32, b.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_and_offset_pack_into_location() {
        let block = ZonalBlock::from(WordHandle::new(2, 16, 5));
        assert_eq!(block.location, (2 << 32) | 16);
        assert_eq!(block.epoch, 5);
        assert_eq!(WordHandle::from(block), WordHandle::new(2, 16, 5));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn conversion_preserves_every_field(chunk: u32, offset: u32, epoch: u32) {
                let h = WordHandle::new(chunk, offset, epoch);
                prop_assert_eq!(WordHandle::from(ZonalBlock::from(h)), h);
            }
        }
    }
}

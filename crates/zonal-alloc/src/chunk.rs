//! Word chunks and the growable chunk arena.
//!
//! A [`Chunk`] is a contiguous `Vec<Word>` (4M words by default) with a
//! bump cursor. A [`ChunkArena`] owns every chunk it has created and
//! carves word ranges out of the newest one, appending a fresh chunk
//! when it runs out. Chunks are never returned individually; only
//! [`ChunkArena::reset`] (or dropping the arena) releases them.

use zonal_core::{AllocError, Word, WordHandle};

use crate::config::Alignment;

/// A single contiguous chunk with bump allocation.
pub struct Chunk {
    /// Backing storage. Reserved to full capacity at creation.
    data: Vec<Word>,
    /// Bump pointer: next free word.
    cursor: usize,
}

impl Chunk {
    /// Create a zero-filled chunk of `capacity` words.
    ///
    /// Fails with [`AllocError::OutOfMemory`] instead of aborting when the
    /// system allocator cannot supply the memory.
    pub fn try_new(capacity: usize) -> Result<Self, AllocError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| AllocError::OutOfMemory { words: capacity })?;
        data.resize(capacity, 0);
        Ok(Self { data, cursor: 0 })
    }

    /// Whether a block of `len` words fits after alignment padding.
    pub fn fits(&self, len: usize, alignment: Alignment) -> bool {
        alignment
            .align_up(self.cursor)
            .checked_add(len)
            .is_some_and(|end| end <= self.data.len())
    }

    /// Bump-allocate `len` words, returning the block's offset.
    ///
    /// Returns `None` if the remaining capacity is insufficient.
    pub fn alloc(&mut self, len: usize, alignment: Alignment) -> Option<usize> {
        let start = alignment.align_up(self.cursor);
        let end = start.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        self.cursor = end;
        Some(start)
    }

    /// Whether `[offset, offset + len)` lies inside the carved region.
    pub fn contains(&self, offset: usize, len: usize) -> bool {
        len > 0 && offset.checked_add(len).is_some_and(|end| end <= self.cursor)
    }

    /// Shared slice over a carved range.
    pub fn slice(&self, offset: usize, len: usize) -> Option<&[Word]> {
        if !self.contains(offset, len) {
            return None;
        }
        Some(&self.data[offset..offset + len])
    }

    /// Mutable slice over a carved range.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Option<&mut [Word]> {
        if !self.contains(offset, len) {
            return None;
        }
        Some(&mut self.data[offset..offset + len])
    }

    /// Number of words carved (including alignment padding).
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in words.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Remaining free capacity in words.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<Word>()
    }
}

/// A growable chain of [`Chunk`]s with bump allocation.
///
/// The newest chunk is the last element; only it is ever carved from.
/// When a request does not fit, the tail of the current chunk is
/// abandoned and a new chunk of `max(chunk_words, n)` words is appended.
/// Blocks never span chunks.
///
/// Every handle produced by [`carve`](Self::carve) is stamped with the
/// arena epoch, which [`reset`](Self::reset) advances.
pub struct ChunkArena {
    chunks: Vec<Chunk>,
    chunk_words: usize,
    max_chunks: Option<usize>,
    alignment: Alignment,
    /// Sum of carved block sizes, excluding padding and abandoned tails.
    carved_words: usize,
    epoch: u32,
}

impl ChunkArena {
    /// Create an empty arena. No memory is reserved until the first request.
    pub fn new(chunk_words: usize, max_chunks: Option<usize>, alignment: Alignment) -> Self {
        Self {
            chunks: Vec::new(),
            chunk_words,
            max_chunks,
            alignment,
            carved_words: 0,
            epoch: 0,
        }
    }

    /// Guarantee the newest chunk can satisfy a request of `n` words.
    ///
    /// Appends a new chunk when it cannot. Fails with
    /// [`AllocError::CapacityExceeded`] if the chunk budget is spent, or
    /// [`AllocError::OutOfMemory`] if the system allocator refuses.
    pub fn ensure_capacity(&mut self, n: usize) -> Result<(), AllocError> {
        if let Some(current) = self.chunks.last() {
            if current.fits(n, self.alignment) {
                return Ok(());
            }
        }

        if let Some(max) = self.max_chunks {
            if self.chunks.len() >= max {
                return Err(AllocError::CapacityExceeded {
                    requested: n,
                    capacity: self.capacity_words(),
                });
            }
        }

        let words = self.chunk_words.max(n);
        let chunk = Chunk::try_new(words)?;
        self.chunks
            .try_reserve(1)
            .map_err(|_| AllocError::OutOfMemory { words })?;
        self.chunks.push(chunk);
        tracing::debug!(
            chunk = self.chunks.len() - 1,
            words,
            epoch = self.epoch,
            "chunk arena grew"
        );
        Ok(())
    }

    /// Carve `n` words from the newest chunk.
    ///
    /// # Panics
    ///
    /// Panics if no chunk exists. Callers must satisfy
    /// [`ensure_capacity`](Self::ensure_capacity) first.
    pub fn carve(&mut self, n: usize) -> WordHandle {
        debug_assert!(n > 0, "zero-word carve");
        let index = self.chunks.len() - 1;
        let chunk = &mut self.chunks[index];
        debug_assert!(
            chunk.fits(n, self.alignment),
            "carve({n}) without ensure_capacity: {} words left",
            chunk.remaining()
        );
        let offset = chunk.alloc(n, self.alignment).unwrap_or(chunk.used());
        self.carved_words += n;
        WordHandle::new(index as u32, offset as u32, self.epoch)
    }

    /// Whether `handle` addresses `n` carved words of the current epoch.
    pub fn contains(&self, handle: WordHandle, n: usize) -> bool {
        handle.epoch() == self.epoch
            && self
                .chunks
                .get(handle.chunk() as usize)
                .is_some_and(|c| c.contains(handle.offset() as usize, n))
    }

    /// Resolve a handle to its words.
    pub fn words(&self, handle: WordHandle, n: usize) -> Option<&[Word]> {
        if handle.epoch() != self.epoch {
            return None;
        }
        self.chunks
            .get(handle.chunk() as usize)?
            .slice(handle.offset() as usize, n)
    }

    /// Resolve a handle to its words for writing.
    pub fn words_mut(&mut self, handle: WordHandle, n: usize) -> Option<&mut [Word]> {
        if handle.epoch() != self.epoch {
            return None;
        }
        self.chunks
            .get_mut(handle.chunk() as usize)?
            .slice_mut(handle.offset() as usize, n)
    }

    /// Release every chunk and advance the epoch.
    ///
    /// All handles issued so far become stale.
    pub fn reset(&mut self) {
        self.chunks = Vec::new();
        self.carved_words = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Iterate over chunks, oldest first.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Number of chunks currently held.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Configured chunk size in words.
    pub fn chunk_words(&self) -> usize {
        self.chunk_words
    }

    /// Sum of all carved block sizes in words.
    pub fn carved_words(&self) -> usize {
        self.carved_words
    }

    /// Total capacity across all chunks in words.
    pub fn capacity_words(&self) -> usize {
        self.chunks.iter().map(Chunk::capacity).sum()
    }

    /// Free words left in the newest chunk.
    pub fn remaining_words(&self) -> usize {
        self.chunks.last().map_or(0, Chunk::remaining)
    }

    /// Memory usage across all chunks in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.chunks.iter().map(Chunk::memory_bytes).sum()
    }

    /// Current epoch.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Block placement rule.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }
}

//! General-purpose backend: one heap block per allocation.
//!
//! [`SystemWordAllocator`] is the baseline the arena is measured against.
//! Every `allocate` gets its own boxed slice and every `deallocate` frees
//! it immediately. Blocks live in a slot table; a handle carries the slot
//! index in its chunk field and the slot's generation in its epoch field,
//! so a released handle never resolves again.

use std::fmt;

use zonal_core::{AllocError, Word, WordAllocator, WordHandle};

struct Slot {
    generation: u32,
    block: Option<Box<[Word]>>,
}

/// Word allocator backed directly by the global heap.
#[derive(Default)]
pub struct SystemWordAllocator {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    live: usize,
    live_words: usize,
}

impl SystemWordAllocator {
    /// Create an allocator with no blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks currently allocated.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Sum of the sizes of all live blocks, in words.
    pub fn live_words(&self) -> usize {
        self.live_words
    }

    fn slot(&self, handle: WordHandle) -> Option<&Slot> {
        if handle.offset() != 0 {
            return None;
        }
        let slot = self.slots.get(handle.chunk() as usize)?;
        (slot.generation == handle.epoch()).then_some(slot)
    }

    fn slot_mut(&mut self, handle: WordHandle) -> Option<&mut Slot> {
        if handle.offset() != 0 {
            return None;
        }
        let slot = self.slots.get_mut(handle.chunk() as usize)?;
        (slot.generation == handle.epoch()).then_some(slot)
    }

    /// Free the block behind a handle that is known to be live.
    fn release(&mut self, handle: WordHandle) -> Option<usize> {
        let index = handle.chunk();
        let slot = self.slot_mut(handle)?;
        let block = slot.block.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        // A wrapped generation would let a stale handle from generation 0
        // resolve again; retire the slot instead of recycling it.
        if slot.generation != 0 {
            self.free_slots.push(index);
        }
        self.live -= 1;
        self.live_words -= block.len();
        Some(block.len())
    }
}

impl WordAllocator for SystemWordAllocator {
    fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError> {
        if words == 0 {
            return Err(AllocError::ZeroSize);
        }
        let mut data: Vec<Word> = Vec::new();
        data.try_reserve_exact(words)
            .map_err(|_| AllocError::OutOfMemory { words })?;
        data.resize(words, 0);
        let block = Some(data.into_boxed_slice());

        let handle = match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.block = block;
                WordHandle::new(index, 0, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| {
                    AllocError::CapacityExceeded {
                        requested: self.slots.len() + 1,
                        capacity: u32::MAX as usize,
                    }
                })?;
                self.slots.push(Slot {
                    generation: 0,
                    block,
                });
                WordHandle::new(index, 0, 0)
            }
        };
        self.live += 1;
        self.live_words += words;
        Ok(handle)
    }

    fn deallocate(&mut self, handle: WordHandle, words: usize) {
        let released = self.release(handle);
        debug_assert!(released.is_some(), "{handle} is not a live system block");
        debug_assert!(
            released.is_none_or(|len| len == words),
            "{handle} released with {words} words"
        );
    }

    fn try_deallocate(&mut self, handle: WordHandle, words: usize) -> Result<(), AllocError> {
        if words == 0 {
            return Err(AllocError::ZeroSize);
        }
        let Some(slot) = self.slots.get(handle.chunk() as usize) else {
            return Err(AllocError::ForeignHandle { handle });
        };
        if handle.offset() != 0 || handle.epoch() > slot.generation {
            return Err(AllocError::ForeignHandle { handle });
        }
        let live_len = match (&slot.block, handle.epoch() == slot.generation) {
            (Some(block), true) => block.len(),
            _ => return Err(AllocError::DoubleFree { handle }),
        };
        if live_len != words {
            return Err(AllocError::SizeMismatch {
                handle,
                expected: live_len,
                actual: words,
            });
        }
        self.release(handle);
        Ok(())
    }

    fn words(&self, handle: WordHandle, words: usize) -> Option<&[Word]> {
        self.slot(handle)?.block.as_deref()?.get(..words)
    }

    fn words_mut(&mut self, handle: WordHandle, words: usize) -> Option<&mut [Word]> {
        self.slot_mut(handle)?.block.as_deref_mut()?.get_mut(..words)
    }
}

impl fmt::Debug for SystemWordAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemWordAllocator")
            .field("slots", &self.slots.len())
            .field("live", &self.live)
            .field("live_words", &self.live_words)
            .finish()
    }
}

//! The word allocation capability shared by every backend.

use crate::error::AllocError;
use crate::handle::{Word, WordHandle};

/// Allocate and release blocks of [`Word`]s.
///
/// This is the whole contract between the allocators and the numeric
/// code that consumes them. `&mut self` plays the role of the opaque
/// allocator context: a collaborator holds some `W: WordAllocator` (or a
/// `Box<dyn WordAllocator>`) chosen at construction time and never needs
/// to know which backend it is talking to.
///
/// Implementations are single-threaded. Callers that share one across
/// threads must provide their own mutual exclusion.
pub trait WordAllocator {
    /// Allocate a block of `words` words.
    ///
    /// Contents of the returned block are unspecified (a recycled block
    /// keeps whatever its previous owner wrote). Fails only when backing
    /// memory cannot be obtained, or on an invalid size.
    fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError>;

    /// Release a block previously returned by [`allocate`](Self::allocate).
    ///
    /// `words` must equal the size passed at allocation; the handle does
    /// not record it. Misuse is only caught by debug assertions.
    fn deallocate(&mut self, handle: WordHandle, words: usize);

    /// Checked variant of [`deallocate`](Self::deallocate).
    ///
    /// Rejects the misuse the backend is able to detect with a typed
    /// error instead of corrupting its free lists.
    fn try_deallocate(&mut self, handle: WordHandle, words: usize) -> Result<(), AllocError>;

    /// Resolve a handle to its words.
    ///
    /// Returns `None` if the handle does not address `words` words of
    /// memory owned by this allocator.
    fn words(&self, handle: WordHandle, words: usize) -> Option<&[Word]>;

    /// Resolve a handle to its words for writing.
    fn words_mut(&mut self, handle: WordHandle, words: usize) -> Option<&mut [Word]>;

    /// Allocate a block and fill it with zeroes.
    fn allocate_zeroed(&mut self, words: usize) -> Result<WordHandle, AllocError> {
        let handle = self.allocate(words)?;
        if let Some(data) = self.words_mut(handle, words) {
            data.fill(0);
        }
        Ok(handle)
    }
}

impl<A: WordAllocator + ?Sized> WordAllocator for &mut A {
    fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError> {
        (**self).allocate(words)
    }

    fn deallocate(&mut self, handle: WordHandle, words: usize) {
        (**self).deallocate(handle, words)
    }

    fn try_deallocate(&mut self, handle: WordHandle, words: usize) -> Result<(), AllocError> {
        (**self).try_deallocate(handle, words)
    }

    fn words(&self, handle: WordHandle, words: usize) -> Option<&[Word]> {
        (**self).words(handle, words)
    }

    fn words_mut(&mut self, handle: WordHandle, words: usize) -> Option<&mut [Word]> {
        (**self).words_mut(handle, words)
    }
}

impl<A: WordAllocator + ?Sized> WordAllocator for Box<A> {
    fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError> {
        (**self).allocate(words)
    }

    fn deallocate(&mut self, handle: WordHandle, words: usize) {
        (**self).deallocate(handle, words)
    }

    fn try_deallocate(&mut self, handle: WordHandle, words: usize) -> Result<(), AllocError> {
        (**self).try_deallocate(handle, words)
    }

    fn words(&self, handle: WordHandle, words: usize) -> Option<&[Word]> {
        (**self).words(handle, words)
    }

    fn words_mut(&mut self, handle: WordHandle, words: usize) -> Option<&mut [Word]> {
        (**self).words_mut(handle, words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One block per handle, never reused. Enough to exercise the
    /// provided methods and the forwarding impls.
    struct VecBacked {
        blocks: Vec<Option<Vec<Word>>>,
    }

    impl WordAllocator for VecBacked {
        fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError> {
            if words == 0 {
                return Err(AllocError::ZeroSize);
            }
            self.blocks.push(Some(vec![7; words]));
            Ok(WordHandle::new(self.blocks.len() as u32 - 1, 0, 0))
        }

        fn deallocate(&mut self, handle: WordHandle, _words: usize) {
            self.blocks[handle.chunk() as usize] = None;
        }

        fn try_deallocate(&mut self, handle: WordHandle, words: usize) -> Result<(), AllocError> {
            match self.blocks.get(handle.chunk() as usize) {
                Some(Some(_)) => {
                    self.deallocate(handle, words);
                    Ok(())
                }
                Some(None) => Err(AllocError::DoubleFree { handle }),
                None => Err(AllocError::ForeignHandle { handle }),
            }
        }

        fn words(&self, handle: WordHandle, words: usize) -> Option<&[Word]> {
            let block = self.blocks.get(handle.chunk() as usize)?.as_ref()?;
            block.get(..words)
        }

        fn words_mut(&mut self, handle: WordHandle, words: usize) -> Option<&mut [Word]> {
            let block = self.blocks.get_mut(handle.chunk() as usize)?.as_mut()?;
            block.get_mut(..words)
        }
    }

    #[test]
    fn allocate_zeroed_clears_block() {
        let mut a = VecBacked { blocks: Vec::new() };
        let h = a.allocate_zeroed(4).unwrap();
        assert_eq!(a.words(h, 4).unwrap(), &[0, 0, 0, 0]);
    }

    #[test]
    fn boxed_dyn_forwards() {
        let mut a: Box<dyn WordAllocator> = Box::new(VecBacked { blocks: Vec::new() });
        let h = a.allocate(2).unwrap();
        a.words_mut(h, 2).unwrap()[1] = 9;
        assert_eq!(a.words(h, 2).unwrap(), &[7, 9]);
        a.try_deallocate(h, 2).unwrap();
        assert_eq!(
            a.try_deallocate(h, 2),
            Err(AllocError::DoubleFree { handle: h })
        );
    }

    #[test]
    fn mut_ref_forwards() {
        fn take<W: WordAllocator>(mut w: W) -> WordHandle {
            w.allocate(1).unwrap()
        }
        let mut a = VecBacked { blocks: Vec::new() };
        let h = take(&mut a);
        assert!(a.words(h, 1).is_some());
    }
}

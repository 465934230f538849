//! Exact-size free-list allocator over a chunk arena.
//!
//! [`SizeClassAllocator`] serves word buffers for symbolic state
//! matrices. Each distinct request size has its own LIFO free list;
//! released blocks go back to that list rather than to the arena, and the
//! arena only ever grows. [`SizeClassAllocator::reset`] drops everything
//! at once at the end of a run.

use std::fmt;
use std::io;

use indexmap::IndexMap;
use zonal_core::{AllocError, Word, WordAllocator, WordHandle};

use crate::chunk::ChunkArena;
use crate::config::AllocConfig;
use crate::stats::{AllocStats, SizeClassStats};

/// Allocator keyed by exact word count, with bulk release.
///
/// `allocate` pops the free list for the requested size, or carves fresh
/// words from the newest chunk. `deallocate` pushes the block back on the
/// head of its size's list. There is no size rounding: a freed 3-word
/// block is only ever reused for another 3-word request.
///
/// The unchecked entry points (`allocate`, `deallocate`) assert their
/// preconditions in debug builds only. The `try_*` variants check them in
/// every build and report violations as [`AllocError`]s.
///
/// With [`AllocConfig::track_loans`] set, every loan's size is recorded
/// and `try_deallocate` accepts exactly the blocks currently on loan, at
/// exactly their allocated size.
pub struct SizeClassAllocator {
    pub(crate) arena: ChunkArena,
    /// Word size → stack of freed blocks of exactly that size.
    pub(crate) free_lists: IndexMap<usize, Vec<WordHandle>>,
    /// Outstanding loans.
    live: usize,
    /// Handle → size of every outstanding loan, when tracking is on.
    loans: Option<IndexMap<WordHandle, usize>>,
    config: AllocConfig,
}

impl SizeClassAllocator {
    /// Create an empty allocator. No chunk is reserved until the first
    /// allocation.
    pub fn new(config: AllocConfig) -> Result<Self, AllocError> {
        config.validate()?;
        Ok(Self {
            arena: ChunkArena::new(config.chunk_words, config.max_chunks, config.alignment),
            free_lists: IndexMap::new(),
            live: 0,
            loans: config.track_loans.then(IndexMap::new),
            config,
        })
    }

    /// Allocate `n` words.
    ///
    /// Reuses the most recently freed block of size `n` if there is one.
    /// Fails only when a new chunk is needed and cannot be obtained.
    ///
    /// `n` must be in `1..=chunk_words`; this is asserted in debug builds.
    /// Use [`try_allocate`](Self::try_allocate) to have it checked.
    pub fn allocate(&mut self, n: usize) -> Result<WordHandle, AllocError> {
        debug_assert!(n > 0, "zero-word allocation");
        debug_assert!(
            n <= self.config.max_request_words(),
            "allocation of {n} words exceeds chunk size {}",
            self.config.max_request_words()
        );

        let handle = match self.free_lists.get_mut(&n).and_then(Vec::pop) {
            Some(handle) => handle,
            None => {
                self.arena.ensure_capacity(n)?;
                self.arena.carve(n)
            }
        };
        self.live += 1;
        if let Some(loans) = &mut self.loans {
            loans.insert(handle, n);
        }
        Ok(handle)
    }

    /// Checked variant of [`allocate`](Self::allocate).
    pub fn try_allocate(&mut self, n: usize) -> Result<WordHandle, AllocError> {
        if n == 0 {
            return Err(AllocError::ZeroSize);
        }
        let max = self.config.max_request_words();
        if n > max {
            return Err(AllocError::Oversize { requested: n, max });
        }
        self.allocate(n)
    }

    /// Return a block of `n` words to its free list.
    ///
    /// `handle` must come from `allocate(n)` with the same `n`, in the
    /// current epoch, and must not already be free. These are asserted in
    /// debug builds; the last two only when loans are tracked.
    pub fn deallocate(&mut self, handle: WordHandle, n: usize) {
        debug_assert!(n > 0, "zero-word deallocation");
        debug_assert!(
            self.arena.contains(handle, n),
            "{handle} ({n} words) is not carved memory of epoch {}",
            self.arena.epoch()
        );
        debug_assert!(self.live > 0, "{handle} released with no outstanding loans");
        if let Some(loans) = &mut self.loans {
            let recorded = loans.swap_remove(&handle);
            debug_assert_eq!(recorded, Some(n), "{handle} is not a {n}-word loan");
        }
        self.free_lists.entry(n).or_default().push(handle);
        self.live = self.live.saturating_sub(1);
    }

    /// Checked variant of [`deallocate`](Self::deallocate).
    ///
    /// Always detects zero sizes, handles from before the last reset, and
    /// handles outside carved memory.
    ///
    /// With loan tracking on, a handle that is not currently on loan is
    /// rejected as a double free (if it sits on a free list) or as
    /// foreign, and a wrong size is a [`AllocError::SizeMismatch`].
    /// Without tracking, only a repeated release at the same size is
    /// caught, by scanning that size's free list; a wrong size that still
    /// fits carved memory goes undetected.
    pub fn try_deallocate(&mut self, handle: WordHandle, n: usize) -> Result<(), AllocError> {
        if n == 0 {
            return Err(AllocError::ZeroSize);
        }
        if handle.epoch() != self.arena.epoch() {
            return Err(AllocError::StaleHandle {
                handle_epoch: handle.epoch(),
                current_epoch: self.arena.epoch(),
            });
        }
        match &self.loans {
            Some(loans) => match loans.get(&handle) {
                Some(&expected) if expected != n => {
                    return Err(AllocError::SizeMismatch {
                        handle,
                        expected,
                        actual: n,
                    });
                }
                Some(_) => {}
                None if self.on_free_list(handle) => {
                    return Err(AllocError::DoubleFree { handle });
                }
                None => return Err(AllocError::ForeignHandle { handle }),
            },
            None => {
                if !self.arena.contains(handle, n) {
                    return Err(AllocError::ForeignHandle { handle });
                }
                if self.free_lists.get(&n).is_some_and(|list| list.contains(&handle)) {
                    return Err(AllocError::DoubleFree { handle });
                }
            }
        }
        self.deallocate(handle, n);
        Ok(())
    }

    /// True when `handle` sits on any free list.
    fn on_free_list(&self, handle: WordHandle) -> bool {
        self.free_lists.values().any(|list| list.contains(&handle))
    }

    /// Release every chunk and clear every free list.
    ///
    /// Returns the allocator to its just-constructed state, except that
    /// the epoch advances so every earlier handle is stale. Loans still
    /// outstanding are invalidated; this is logged but allowed. Use
    /// [`try_reset`](Self::try_reset) to refuse instead.
    pub fn reset(&mut self) {
        if self.live > 0 {
            tracing::warn!(
                live = self.live,
                epoch = self.arena.epoch(),
                "size-class allocator reset with outstanding allocations"
            );
        }
        tracing::debug!(
            chunks = self.arena.chunk_count(),
            carved_words = self.arena.carved_words(),
            "size-class allocator reset"
        );
        self.arena.reset();
        self.free_lists = IndexMap::new();
        self.live = 0;
        if let Some(loans) = &mut self.loans {
            loans.clear();
        }
    }

    /// Reset only if no loans are outstanding.
    pub fn try_reset(&mut self) -> Result<(), AllocError> {
        if self.live > 0 {
            return Err(AllocError::LiveAllocations { count: self.live });
        }
        self.reset();
        Ok(())
    }

    /// Resolve a handle to its `n` words.
    ///
    /// Returns `None` for stale handles or ranges outside carved memory.
    pub fn words(&self, handle: WordHandle, n: usize) -> Option<&[Word]> {
        self.arena.words(handle, n)
    }

    /// Resolve a handle to its `n` words for writing.
    pub fn words_mut(&mut self, handle: WordHandle, n: usize) -> Option<&mut [Word]> {
        self.arena.words_mut(handle, n)
    }

    /// Number of outstanding loans.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of chunks held.
    pub fn chunk_count(&self) -> usize {
        self.arena.chunk_count()
    }

    /// Length of the free list for blocks of `n` words.
    pub fn free_list_len(&self, n: usize) -> usize {
        self.free_lists.get(&n).map_or(0, Vec::len)
    }

    /// Total number of blocks on all free lists.
    pub fn free_block_count(&self) -> usize {
        self.free_lists.values().map(Vec::len).sum()
    }

    /// True when every loan's size is recorded.
    pub fn tracks_loans(&self) -> bool {
        self.loans.is_some()
    }

    /// Current epoch.
    pub fn epoch(&self) -> u32 {
        self.arena.epoch()
    }

    /// The configuration this allocator was built with.
    pub fn config(&self) -> &AllocConfig {
        &self.config
    }

    /// Snapshot the allocator's counters.
    pub fn stats(&self) -> AllocStats {
        let mut free_lists: Vec<SizeClassStats> = self
            .free_lists
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(&words, list)| SizeClassStats {
                words,
                free_blocks: list.len(),
            })
            .collect();
        free_lists.sort_unstable_by_key(|s| s.words);

        AllocStats {
            chunk_count: self.arena.chunk_count(),
            chunk_words: self.arena.chunk_words(),
            capacity_words: self.arena.capacity_words(),
            carved_words: self.arena.carved_words(),
            live_allocations: self.live,
            epoch: self.arena.epoch(),
            free_lists,
        }
    }

    /// Write a human-readable statistics report to `out`.
    pub fn print_stats<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.stats())
    }
}

impl Default for SizeClassAllocator {
    fn default() -> Self {
        let config = AllocConfig::default();
        Self {
            arena: ChunkArena::new(config.chunk_words, config.max_chunks, config.alignment),
            free_lists: IndexMap::new(),
            live: 0,
            loans: None,
            config,
        }
    }
}

impl fmt::Display for SizeClassAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.stats(), f)
    }
}

impl WordAllocator for SizeClassAllocator {
    fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError> {
        SizeClassAllocator::allocate(self, words)
    }

    fn deallocate(&mut self, handle: WordHandle, words: usize) {
        SizeClassAllocator::deallocate(self, handle, words)
    }

    fn try_deallocate(&mut self, handle: WordHandle, words: usize) -> Result<(), AllocError> {
        SizeClassAllocator::try_deallocate(self, handle, words)
    }

    fn words(&self, handle: WordHandle, words: usize) -> Option<&[Word]> {
        SizeClassAllocator::words(self, handle, words)
    }

    fn words_mut(&mut self, handle: WordHandle, words: usize) -> Option<&mut [Word]> {
        SizeClassAllocator::words_mut(self, handle, words)
    }
}

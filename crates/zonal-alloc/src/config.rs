//! Allocator configuration parameters.

use zonal_core::{AllocError, WordAllocator};

use crate::size_class::SizeClassAllocator;
use crate::system::SystemWordAllocator;

/// Placement rule for word blocks inside a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Blocks start at any word offset (natural alignment).
    #[default]
    Word,
    /// Blocks start at even word offsets, so pairs of words can be read
    /// as one 64-bit quantity. Padding words are skipped, never reused.
    DoubleWord,
}

impl Alignment {
    /// Alignment in words.
    pub const fn words(self) -> usize {
        match self {
            Self::Word => 1,
            Self::DoubleWord => 2,
        }
    }

    /// Round `offset` up to the next permitted block start.
    pub const fn align_up(self, offset: usize) -> usize {
        let mask = self.words() - 1;
        (offset + mask) & !mask
    }
}

/// Which [`WordAllocator`] implementation a collaborator should get.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Chunk-backed [`SizeClassAllocator`].
    #[default]
    Arena,
    /// One system allocation per block ([`SystemWordAllocator`]).
    System,
}

/// Configuration for the word allocators.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocConfig {
    /// Size of each chunk in words. Also the largest single request.
    ///
    /// Default: 4_194_304 (16MB at 4 bytes per word). Must be at least 2
    /// and fit in a `u32` offset.
    pub chunk_words: usize,

    /// Upper bound on the number of live chunks, or `None` for unbounded
    /// growth. Exceeding it fails with [`AllocError::CapacityExceeded`].
    pub max_chunks: Option<usize>,

    /// Block placement rule.
    pub alignment: Alignment,

    /// Implementation returned by [`AllocConfig::build_word_allocator`].
    pub backend: Backend,

    /// Record the size of every loan so the checked release path can
    /// reject double frees and size mismatches exactly.
    ///
    /// Default: off. Costs one map update per allocate and deallocate.
    pub track_loans: bool,
}

impl AllocConfig {
    /// Default chunk size: 2^22 words.
    pub const DEFAULT_CHUNK_WORDS: usize = 1 << 22;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            chunk_words: Self::DEFAULT_CHUNK_WORDS,
            max_chunks: None,
            alignment: Alignment::Word,
            backend: Backend::Arena,
            track_loans: false,
        }
    }

    /// Set the chunk size in words.
    pub fn with_chunk_words(mut self, chunk_words: usize) -> Self {
        self.chunk_words = chunk_words;
        self
    }

    /// Cap the number of chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = Some(max_chunks);
        self
    }

    /// Set the block placement rule.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Select the backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Turn loan tracking on or off.
    pub fn with_loan_tracking(mut self, track_loans: bool) -> Self {
        self.track_loans = track_loans;
        self
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), AllocError> {
        if self.chunk_words < 2 {
            return Err(AllocError::InvalidConfig {
                reason: format!("chunk_words must be >= 2 (got {})", self.chunk_words),
            });
        }
        if self.chunk_words > u32::MAX as usize {
            return Err(AllocError::InvalidConfig {
                reason: format!(
                    "chunk_words must fit a u32 offset (got {})",
                    self.chunk_words
                ),
            });
        }
        if self.alignment == Alignment::DoubleWord && self.chunk_words % 2 != 0 {
            return Err(AllocError::InvalidConfig {
                reason: format!(
                    "chunk_words must be even with double-word alignment (got {})",
                    self.chunk_words
                ),
            });
        }
        if let Some(max) = self.max_chunks {
            if max == 0 || max > u32::MAX as usize {
                return Err(AllocError::InvalidConfig {
                    reason: format!("max_chunks must be in 1..=u32::MAX (got {max})"),
                });
            }
        }
        Ok(())
    }

    /// Largest request a single chunk can satisfy, in words.
    pub fn max_request_words(&self) -> usize {
        self.chunk_words
    }

    /// Size of one chunk in bytes.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_words * std::mem::size_of::<zonal_core::Word>()
    }

    /// Build the configured backend behind the [`WordAllocator`] capability.
    pub fn build_word_allocator(&self) -> Result<Box<dyn WordAllocator + Send>, AllocError> {
        match self.backend {
            Backend::Arena => Ok(Box::new(SizeClassAllocator::new(self.clone())?)),
            Backend::System => Ok(Box::new(SystemWordAllocator::new())),
        }
    }
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for [`FixedItemPool`](crate::FixedItemPool).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemPoolConfig {
    /// Number of item cells per pool. Default: 131_072. Must be > 1.
    pub items_per_pool: usize,
}

impl ItemPoolConfig {
    /// Default number of items per pool: 2^17.
    pub const DEFAULT_ITEMS_PER_POOL: usize = 1 << 17;

    /// Create a config with the given pool size.
    pub fn new(items_per_pool: usize) -> Self {
        Self { items_per_pool }
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), AllocError> {
        if self.items_per_pool <= 1 {
            return Err(AllocError::InvalidConfig {
                reason: format!(
                    "items_per_pool must be > 1 (got {})",
                    self.items_per_pool
                ),
            });
        }
        Ok(())
    }
}

impl Default for ItemPoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ITEMS_PER_POOL)
    }
}

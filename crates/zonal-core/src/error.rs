//! Allocation error types.
//!
//! One enum covers the three failure classes of the allocators:
//!
//! - **Contract violations** reported by the checked `try_*` entry points
//!   (zero or oversize requests, stale, foreign or mismatched handles,
//!   undersized item types, bad configuration).
//! - **Resource exhaustion** when the system allocator or the configured
//!   chunk budget cannot supply another chunk or pool.
//! - **Lifecycle rejections** such as resetting with loans outstanding.

use std::error::Error;
use std::fmt;

use crate::handle::WordHandle;

/// Errors that can occur during allocator operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// A request for zero words.
    ZeroSize,
    /// A request larger than one chunk.
    Oversize {
        /// Number of words requested.
        requested: usize,
        /// Largest request a single chunk can satisfy.
        max: usize,
    },
    /// The system allocator could not supply a new chunk or pool.
    OutOfMemory {
        /// Size of the failed reservation, in words or cells.
        words: usize,
    },
    /// The configured chunk budget is spent.
    CapacityExceeded {
        /// Number of words requested.
        requested: usize,
        /// Total capacity across all chunks, in words.
        capacity: usize,
    },
    /// A handle issued before the most recent `reset()`.
    StaleHandle {
        /// The epoch encoded in the handle.
        handle_epoch: u32,
        /// The allocator's current epoch.
        current_epoch: u32,
    },
    /// A handle that does not lie inside memory owned by this allocator.
    ForeignHandle {
        /// The offending handle.
        handle: WordHandle,
    },
    /// A block released with a word count different from its allocation.
    SizeMismatch {
        /// The released handle.
        handle: WordHandle,
        /// Word count recorded at allocation.
        expected: usize,
        /// Word count passed to deallocate.
        actual: usize,
    },
    /// A block released twice.
    DoubleFree {
        /// The released handle.
        handle: WordHandle,
    },
    /// Configuration parameters are out of range.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
    /// The pooled item type cannot hold a free-list link.
    ItemTooSmall {
        /// `size_of` the item type.
        item_bytes: usize,
        /// Minimum accepted size (one machine pointer).
        min_bytes: usize,
    },
    /// A reset was refused because loans are still outstanding.
    LiveAllocations {
        /// Number of outstanding loans.
        count: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => write!(f, "zero-word allocation requested"),
            Self::Oversize { requested, max } => {
                write!(
                    f,
                    "allocation of {requested} words exceeds chunk size of {max} words"
                )
            }
            Self::OutOfMemory { words } => {
                write!(f, "system allocator failed to supply {words} words")
            }
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "chunk budget exceeded: requested {requested} words, capacity {capacity} words"
                )
            }
            Self::StaleHandle {
                handle_epoch,
                current_epoch,
            } => {
                write!(
                    f,
                    "stale handle: epoch {handle_epoch}, allocator epoch {current_epoch}"
                )
            }
            Self::ForeignHandle { handle } => {
                write!(f, "{handle} does not belong to this allocator")
            }
            Self::SizeMismatch {
                handle,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{handle} was allocated with {expected} words but released with {actual}"
                )
            }
            Self::DoubleFree { handle } => write!(f, "{handle} released twice"),
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
            Self::ItemTooSmall {
                item_bytes,
                min_bytes,
            } => {
                write!(
                    f,
                    "item of {item_bytes} bytes is smaller than a free-list link ({min_bytes} bytes)"
                )
            }
            Self::LiveAllocations { count } => {
                write!(f, "reset refused: {count} allocations still live")
            }
        }
    }
}

impl Error for AllocError {}

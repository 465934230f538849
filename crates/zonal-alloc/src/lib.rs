//! Size-segregated allocators for state-space search.
//!
//! State-space exploration allocates and frees enormous numbers of small,
//! same-shaped buffers. This crate serves them from large chunks and
//! keeps freed blocks on exact-size free lists, so memory is recycled in
//! O(1) and released in bulk at the end of a run.
//!
//! # Architecture
//!
//! ```text
//! SizeClassAllocator (word buffers, keyed by exact size)
//! ├── ChunkArena → Chunk[] (bump-allocated Vec<Word>, 4M words default)
//! └── free lists: size → LIFO stack of WordHandle
//!
//! FixedItemPool<T> (one record shape)
//! └── pools: Box<[Cell<T>]>[]  (Vacant link | Occupied item)
//!
//! WordAllocator backends: SizeClassAllocator, SystemWordAllocator,
//! LeakCheckingAllocator<A>
//! ```
//!
//! # Handles
//!
//! Nothing here hands out pointers. Blocks are named by
//! [`WordHandle`](zonal_core::WordHandle)s and items by [`ItemHandle`]s,
//! both stamped with the allocator epoch so that a handle outliving a
//! `reset()` resolves to `None` instead of aliasing new data.
//!
//! # Threading
//!
//! Every type is single-threaded. Use one instance per thread, or wrap
//! an instance in a lock.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod chunk;
pub mod config;
pub mod item_pool;
pub mod leak_check;
#[cfg(any(debug_assertions, feature = "diagnostics"))]
pub mod membership;
pub mod size_class;
pub mod stats;
pub mod system;

// Public re-exports for the primary API surface.
pub use config::{AllocConfig, Alignment, Backend, ItemPoolConfig};
pub use item_pool::{FixedItemPool, ItemAllocError, ItemHandle};
pub use leak_check::{LeakCheckingAllocator, LeakReport};
#[cfg(any(debug_assertions, feature = "diagnostics"))]
pub use membership::MembershipProbe;
pub use size_class::SizeClassAllocator;
pub use stats::{AllocStats, ItemPoolStats, SizeClassStats};
pub use system::SystemWordAllocator;

pub use zonal_core::{AllocError, Word, WordAllocator, WordHandle};

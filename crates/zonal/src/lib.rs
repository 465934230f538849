//! Zonal: size-segregated allocators for state-space search.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Zonal sub-crates. For most users, adding `zonal` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use zonal::prelude::*;
//!
//! // Word buffers for zone matrices, recycled by exact size.
//! let mut words = SizeClassAllocator::new(AllocConfig::new().with_chunk_words(1024)).unwrap();
//! let dbm = words.allocate(16).unwrap();
//! words.words_mut(dbm, 16).unwrap().fill(0);
//! words.deallocate(dbm, 16);
//! assert_eq!(words.allocate(16).unwrap(), dbm);
//!
//! // Search nodes from a recycling pool.
//! #[derive(Debug, PartialEq)]
//! struct Node {
//!     state: u64,
//!     depth: u32,
//! }
//! let mut nodes = FixedItemPool::new(ItemPoolConfig::new(256)).unwrap();
//! let n = nodes.allocate(Node { state: 7, depth: 0 }).unwrap();
//! assert_eq!(nodes.get(n).unwrap().state, 7);
//! assert_eq!(nodes.deallocate(n), Some(Node { state: 7, depth: 0 }));
//!
//! // Release every chunk at the end of the run.
//! words.reset();
//! assert_eq!(words.chunk_count(), 0);
//! ```
//!
//! # Choosing a backend at runtime
//!
//! ```rust
//! use zonal::prelude::*;
//!
//! fn explore(alloc: &mut dyn WordAllocator) -> Result<(), AllocError> {
//!     let h = alloc.allocate_zeroed(9)?;
//!     alloc.deallocate(h, 9);
//!     Ok(())
//! }
//!
//! for backend in [Backend::Arena, Backend::System] {
//!     let mut alloc = AllocConfig::new().with_backend(backend).build_word_allocator().unwrap();
//!     explore(&mut *alloc).unwrap();
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `zonal-core` | `Word`, `WordHandle`, `AllocError`, `WordAllocator` |
//! | [`alloc`] | `zonal-alloc` | Chunk arena, size-class allocator, item pools, backends, stats |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handles, errors, and the allocator trait (`zonal-core`).
pub use zonal_core as types;

/// Allocator implementations (`zonal-alloc`).
///
/// [`alloc::SizeClassAllocator`] for word buffers,
/// [`alloc::FixedItemPool`] for fixed-shape records,
/// [`alloc::SystemWordAllocator`] as the heap baseline, and
/// [`alloc::LeakCheckingAllocator`] for debugging.
pub use zonal_alloc as alloc;

/// Common imports for typical Zonal usage.
///
/// ```rust
/// use zonal::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use zonal_core::{AllocError, Word, WordAllocator, WordHandle};

    // Configuration
    pub use zonal_alloc::{AllocConfig, Alignment, Backend, ItemPoolConfig};

    // Allocators
    pub use zonal_alloc::{
        FixedItemPool, ItemAllocError, ItemHandle, LeakCheckingAllocator, SizeClassAllocator,
        SystemWordAllocator,
    };

    // Statistics
    pub use zonal_alloc::{AllocStats, ItemPoolStats};
}

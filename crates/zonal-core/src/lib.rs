//! Core types and traits for the Zonal allocators.
//!
//! This is the leaf crate with zero internal dependencies. Numeric and
//! search collaborators depend on it alone: it defines the allocation
//! unit ([`Word`]), the index-based block handle ([`WordHandle`]), the
//! shared error type ([`AllocError`]), and the [`WordAllocator`]
//! capability that every backend implements.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod error;
pub mod handle;

pub use allocator::WordAllocator;
pub use error::AllocError;
pub use handle::{Word, WordHandle};

//! C-compatible status codes.
//!
//! [`ZonalStatus`] is a `repr(i32)` enum with one code per
//! [`AllocError`] variant plus the boundary's own failures.

use zonal_core::AllocError;

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZonalStatus {
    /// Success.
    Ok = 0,
    /// Allocator handle is invalid or was already destroyed.
    InvalidHandle = -1,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -2,
    /// A zero-word block was requested or released.
    ZeroSize = -3,
    /// Request larger than one chunk.
    Oversize = -4,
    /// The system allocator refused backing memory.
    OutOfMemory = -5,
    /// The configured chunk budget is spent.
    CapacityExceeded = -6,
    /// Block handle predates the last reset.
    StaleBlock = -7,
    /// Block handle does not address memory of this allocator.
    ForeignBlock = -8,
    /// Block released with a size other than the one it was allocated with.
    SizeMismatch = -9,
    /// Block released twice.
    DoubleFree = -10,
    /// Configuration validation error.
    ConfigError = -11,
    /// Reset refused while blocks are on loan.
    LiveAllocations = -12,
    /// The allocator kind does not support this operation.
    Unsupported = -13,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -20,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&AllocError> for ZonalStatus {
    fn from(e: &AllocError) -> Self {
        match e {
            AllocError::ZeroSize => ZonalStatus::ZeroSize,
            AllocError::Oversize { .. } => ZonalStatus::Oversize,
            AllocError::OutOfMemory { .. } => ZonalStatus::OutOfMemory,
            AllocError::CapacityExceeded { .. } => ZonalStatus::CapacityExceeded,
            AllocError::StaleHandle { .. } => ZonalStatus::StaleBlock,
            AllocError::ForeignHandle { .. } => ZonalStatus::ForeignBlock,
            AllocError::SizeMismatch { .. } => ZonalStatus::SizeMismatch,
            AllocError::DoubleFree { .. } => ZonalStatus::DoubleFree,
            AllocError::InvalidConfig { .. } | AllocError::ItemTooSmall { .. } => {
                ZonalStatus::ConfigError
            }
            AllocError::LiveAllocations { .. } => ZonalStatus::LiveAllocations,
        }
    }
}

impl<T> From<Result<T, AllocError>> for ZonalStatus {
    fn from(result: Result<T, AllocError>) -> Self {
        match result {
            Ok(_) => ZonalStatus::Ok,
            Err(e) => ZonalStatus::from(&e),
        }
    }
}

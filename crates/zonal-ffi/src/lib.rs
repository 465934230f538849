//! C FFI bindings for the Zonal allocators.
//!
//! Exposes the word allocators to C callers. Allocators live in a global
//! generation-checked table and are named by opaque `u64` handles; blocks
//! cross the boundary as [`ZonalBlock`] values. Every entry point returns
//! an `i32` [`ZonalStatus`] and catches panics before they unwind into C.
//!
//! This is the only crate in the workspace that contains `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    /// Message of the most recent panic caught on this thread.
    pub(crate) static LAST_PANIC: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Record a caught panic payload for [`zonal_last_panic_message`].
pub(crate) fn store_panic(payload: &(dyn std::any::Any + Send)) {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(message = %msg, "panic caught at FFI boundary");
    LAST_PANIC.with(|cell| *cell.borrow_mut() = msg);
}

/// Run an FFI body, converting a panic into `ZonalStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(status) => status,
            Err(payload) => {
                $crate::store_panic(payload.as_ref());
                $crate::status::ZonalStatus::Panicked as i32
            }
        }
    };
}

/// Lock a mutex inside an [`ffi_guard!`] body, returning
/// `ZonalStatus::InternalError` from the body if it is poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::ZonalStatus::InternalError as i32,
        }
    };
}

pub mod allocator;
pub mod block;
mod handle;
pub mod status;

pub use allocator::{
    zonal_allocate, zonal_allocator_count, zonal_allocator_destroy, zonal_arena_create,
    zonal_deallocate, zonal_live_count, zonal_read_words, zonal_reset, zonal_system_create,
    zonal_write_words,
};
pub use block::ZonalBlock;
pub use status::ZonalStatus;

/// Copy the last panic message caught on this thread into `buf`.
///
/// Returns the full message length in bytes (excluding the terminator).
/// Writes at most `cap - 1` bytes followed by a NUL. Pass a null `buf` (or
/// `cap == 0`) to query the length only. Returns 0 if no panic was caught.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_last_panic_message(buf: *mut c_char, cap: usize) -> i32 {
    LAST_PANIC.with(|cell| {
        let msg = cell.borrow();
        let bytes = msg.as_bytes();
        if !buf.is_null() && cap > 0 {
            let n = bytes.len().min(cap - 1);
            // SAFETY: buf points to at least `cap` writable bytes per caller contract.
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
                *buf.add(n) = 0;
            }
        }
        i32::try_from(bytes.len()).unwrap_or(i32::MAX)
    })
}

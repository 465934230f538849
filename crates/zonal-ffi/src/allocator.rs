//! Allocator lifecycle and block operations for C callers.
//!
//! All allocators share one global table behind a `Mutex`; each call holds
//! the lock for the whole operation, so one allocator handle may be used
//! from several threads.

use std::sync::Mutex;

use zonal_alloc::{AllocConfig, SizeClassAllocator, SystemWordAllocator};
use zonal_core::{AllocError, Word, WordAllocator, WordHandle};

use crate::block::ZonalBlock;
use crate::handle::SlotTable;
use crate::status::ZonalStatus;

/// An allocator owned by the table, with its concrete kind kept so that
/// kind-specific operations (reset, live count) stay reachable.
enum ManagedAllocator {
    Arena(SizeClassAllocator),
    System(SystemWordAllocator),
}

impl ManagedAllocator {
    fn as_dyn(&mut self) -> &mut dyn WordAllocator {
        match self {
            ManagedAllocator::Arena(a) => a,
            ManagedAllocator::System(s) => s,
        }
    }

    fn as_dyn_ref(&self) -> &dyn WordAllocator {
        match self {
            ManagedAllocator::Arena(a) => a,
            ManagedAllocator::System(s) => s,
        }
    }

    fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError> {
        match self {
            // C callers get the checked path; a bad size must not reach a
            // debug assertion across the boundary.
            ManagedAllocator::Arena(a) => a.try_allocate(words),
            ManagedAllocator::System(s) => s.allocate(words),
        }
    }

    fn live_count(&self) -> usize {
        match self {
            ManagedAllocator::Arena(a) => a.live_count(),
            ManagedAllocator::System(s) => s.live_count(),
        }
    }
}

static ALLOCATORS: Mutex<SlotTable<ManagedAllocator>> = Mutex::new(SlotTable::new());

/// Store a new allocator and write its handle to `out`.
///
/// Must be called inside an `ffi_guard!` body with a non-null `out`.
#[allow(unsafe_code)]
fn register(allocator: ManagedAllocator, out: *mut u64) -> i32 {
    let Some(handle) = ffi_lock!(ALLOCATORS).insert(allocator) else {
        return ZonalStatus::CapacityExceeded as i32;
    };
    // SAFETY: out is non-null (checked by callers) and valid per caller contract.
    unsafe { *out = handle };
    ZonalStatus::Ok as i32
}

/// Create a size-class arena allocator with chunks of `chunk_words` words.
///
/// `chunk_words == 0` selects the default (4M words). On success, writes
/// the allocator handle to `out` and returns `ZONAL_STATUS_OK`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_arena_create(chunk_words: usize, out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return ZonalStatus::InvalidArgument as i32;
        }
        // Every loan is recorded so a bad release from C is refused
        // instead of corrupting the free lists.
        let mut config = AllocConfig::new().with_loan_tracking(true);
        if chunk_words != 0 {
            config = config.with_chunk_words(chunk_words);
        }
        let arena = match SizeClassAllocator::new(config) {
            Ok(a) => a,
            Err(e) => return ZonalStatus::from(&e) as i32,
        };
        register(ManagedAllocator::Arena(arena), out)
    })
}

/// Create a system-heap allocator (one heap block per allocation).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_system_create(out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return ZonalStatus::InvalidArgument as i32;
        }
        register(ManagedAllocator::System(SystemWordAllocator::new()), out)
    })
}

/// Destroy an allocator, releasing every block it still holds.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_allocator_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(ALLOCATORS).remove(handle) {
            Some(_) => ZonalStatus::Ok as i32,
            None => ZonalStatus::InvalidHandle as i32,
        }
    })
}

/// Allocate `words` words and write the block to `out_block`.
///
/// Block contents are unspecified until written.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_allocate(handle: u64, words: usize, out_block: *mut ZonalBlock) -> i32 {
    ffi_guard!({
        if out_block.is_null() {
            return ZonalStatus::InvalidArgument as i32;
        }
        let mut table = ffi_lock!(ALLOCATORS);
        let Some(alloc) = table.get_mut(handle) else {
            return ZonalStatus::InvalidHandle as i32;
        };
        match alloc.allocate(words) {
            Ok(h) => {
                // SAFETY: out_block is non-null and valid per caller contract.
                unsafe { *out_block = ZonalBlock::from(h) };
                ZonalStatus::Ok as i32
            }
            Err(e) => ZonalStatus::from(&e) as i32,
        }
    })
}

/// Release a block of `words` words.
///
/// Checked: stale, foreign, double-freed and mis-sized blocks are
/// rejected with a status instead of corrupting the allocator.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_deallocate(handle: u64, block: ZonalBlock, words: usize) -> i32 {
    ffi_guard!({
        let mut table = ffi_lock!(ALLOCATORS);
        let Some(alloc) = table.get_mut(handle) else {
            return ZonalStatus::InvalidHandle as i32;
        };
        ZonalStatus::from(
            alloc
                .as_dyn()
                .try_deallocate(WordHandle::from(block), words),
        ) as i32
    })
}

/// Copy `len` words from `src` into the first `len` words of `block`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_write_words(
    handle: u64,
    block: ZonalBlock,
    src: *const Word,
    len: usize,
) -> i32 {
    ffi_guard!({
        if len == 0 {
            return ZonalStatus::Ok as i32;
        }
        if src.is_null() {
            return ZonalStatus::InvalidArgument as i32;
        }
        let mut table = ffi_lock!(ALLOCATORS);
        let Some(alloc) = table.get_mut(handle) else {
            return ZonalStatus::InvalidHandle as i32;
        };
        let Some(dst) = alloc.as_dyn().words_mut(WordHandle::from(block), len) else {
            return ZonalStatus::ForeignBlock as i32;
        };
        // SAFETY: src points to len valid words per caller contract, and
        // cannot alias allocator-owned memory handed out as a slice here.
        let src = unsafe { std::slice::from_raw_parts(src, len) };
        dst.copy_from_slice(src);
        ZonalStatus::Ok as i32
    })
}

/// Copy the first `len` words of `block` into `dst`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_read_words(
    handle: u64,
    block: ZonalBlock,
    dst: *mut Word,
    len: usize,
) -> i32 {
    ffi_guard!({
        if len == 0 {
            return ZonalStatus::Ok as i32;
        }
        if dst.is_null() {
            return ZonalStatus::InvalidArgument as i32;
        }
        let table = ffi_lock!(ALLOCATORS);
        let Some(alloc) = table.get(handle) else {
            return ZonalStatus::InvalidHandle as i32;
        };
        let Some(src) = alloc.as_dyn_ref().words(WordHandle::from(block), len) else {
            return ZonalStatus::ForeignBlock as i32;
        };
        // SAFETY: dst points to len writable words per caller contract.
        unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst, len) };
        ZonalStatus::Ok as i32
    })
}

/// Release every chunk of an arena allocator in one step.
///
/// With `force == 0` the reset is refused with `LIVE_ALLOCATIONS` while
/// blocks are on loan; otherwise outstanding blocks are invalidated.
/// System allocators return `UNSUPPORTED`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_reset(handle: u64, force: u8) -> i32 {
    ffi_guard!({
        let mut table = ffi_lock!(ALLOCATORS);
        match table.get_mut(handle) {
            Some(ManagedAllocator::Arena(a)) if force != 0 => {
                a.reset();
                ZonalStatus::Ok as i32
            }
            Some(ManagedAllocator::Arena(a)) => ZonalStatus::from(a.try_reset()) as i32,
            Some(ManagedAllocator::System(_)) => ZonalStatus::Unsupported as i32,
            None => ZonalStatus::InvalidHandle as i32,
        }
    })
}

/// Write the number of outstanding blocks to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_live_count(handle: u64, out: *mut usize) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return ZonalStatus::InvalidArgument as i32;
        }
        let table = ffi_lock!(ALLOCATORS);
        let Some(alloc) = table.get(handle) else {
            return ZonalStatus::InvalidHandle as i32;
        };
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = alloc.live_count() };
        ZonalStatus::Ok as i32
    })
}

/// Write the number of live allocators to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn zonal_allocator_count(out: *mut usize) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return ZonalStatus::InvalidArgument as i32;
        }
        let count = ffi_lock!(ALLOCATORS).len();
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = count };
        ZonalStatus::Ok as i32
    })
}

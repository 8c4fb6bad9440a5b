//! Arena lifecycle FFI: create, extend with device blocks, allocate,
//! release.

use std::ffi::c_void;
use std::sync::Mutex;

use tessera_arena::{arena_min_bytes, Allocation, Arena, ArenaError, DeviceBlocks};
use tessera_core::DevicePtr;

use crate::handle::HandleTable;
use crate::parse_backend;
use crate::status::TesseraStatus;

static ARENAS: Mutex<HandleTable<Arena<'static>>> = Mutex::new(HandleTable::new());

/// Run `f` on the arena behind `handle` with the table locked.
pub(crate) fn with_arena<R>(
    handle: u64,
    f: impl FnOnce(&mut Arena<'static>) -> Result<R, TesseraStatus>,
) -> Result<R, TesseraStatus> {
    let mut arenas = ffi_lock!(ARENAS);
    let arena = arenas
        .get_mut(handle)
        .ok_or(TesseraStatus::InvalidHandle)?;
    f(arena)
}

/// Smallest host buffer, in bytes, that [`tessera_arena_create`] accepts.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_arena_min_bytes() -> usize {
    arena_min_bytes()
}

/// Lay an arena over `size` bytes at `buffer` and return its handle.
///
/// The buffer stays owned by the caller and must remain valid, and must not
/// be touched by the caller, until [`tessera_arena_release`]. Returns 0 on
/// failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_arena_create(buffer: *mut c_void, size: usize) -> u64 {
    ffi_guard!(0, {
        if buffer.is_null() {
            return Err(ArenaError::NullBuffer.into());
        }
        // SAFETY: buffer is non-null and, per the caller contract, points
        // to `size` writable bytes exclusively lent to the arena until it
        // is released.
        let bytes: &'static mut [u8] =
            unsafe { std::slice::from_raw_parts_mut(buffer.cast::<u8>(), size) };
        let arena = Arena::new(bytes)?;
        Ok(ffi_lock!(ARENAS).insert(arena))
    })
}

/// Attach `count` device blocks of `block_bytes` each, for `backend`.
///
/// `blocks` points to `count` device addresses from the vendor allocator.
/// The block table is carved out of the arena's host buffer. Returns the
/// arena handle, or 0 on failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_arena_extend_with_device_blocks(
    arena: u64,
    backend: u32,
    blocks: *const *mut c_void,
    block_bytes: usize,
    count: usize,
) -> u64 {
    ffi_guard!(0, {
        let backend = parse_backend(backend)?;
        let raw: &[*mut c_void] = if count == 0 {
            &[]
        } else if blocks.is_null() {
            return Err(ArenaError::NullInput {
                what: "device block list is null",
            }
            .into());
        } else {
            // SAFETY: blocks is non-null and points to `count` entries
            // per the caller contract.
            unsafe { std::slice::from_raw_parts(blocks, count) }
        };
        let ptrs: Vec<DevicePtr> = raw.iter().map(|&p| DevicePtr::from_raw(p)).collect();
        with_arena(arena, |a| {
            a.extend_with_device_blocks(DeviceBlocks::new(backend, &ptrs, block_bytes))?;
            Ok(arena)
        })
    })
}

/// Whether a `bytes`-byte request on `backend` would currently succeed.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_arena_can_alloc(arena: u64, backend: u32, bytes: usize) -> bool {
    ffi_guard!(false, {
        let backend = parse_backend(backend)?;
        with_arena(arena, |a| Ok(a.can_allocate(backend, bytes)))
    })
}

/// Allocate `bytes` bytes on `backend`.
///
/// Host requests return a pointer into the arena's buffer, device requests
/// a device address. Returns null on failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_arena_malloc(arena: u64, backend: u32, bytes: usize) -> *mut c_void {
    ffi_guard!(std::ptr::null_mut(), {
        let backend = parse_backend(backend)?;
        with_arena(arena, |a| match a.allocate(backend, bytes)? {
            Allocation::Host(region) => Ok(a.host_ptr(region)?.cast::<c_void>()),
            Allocation::Device(region) => Ok(region.ptr().as_raw()),
        })
    })
}

/// Drop the arena behind `arena` and every tensor handle created in it.
///
/// The host buffer and device blocks are not freed; they belong to the
/// caller, who may reuse them once this returns `true`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_arena_release(arena: u64) -> bool {
    ffi_guard!(false, {
        ffi_lock!(ARENAS)
            .remove(arena)
            .ok_or(TesseraStatus::InvalidHandle)?;
        crate::tensor::forget_arena(arena)?;
        Ok(true)
    })
}

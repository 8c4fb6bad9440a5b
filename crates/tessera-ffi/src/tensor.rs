//! Tensor FFI: create, inspect, reshape.
//!
//! A tensor handle remembers the arena handle it was created in; every call
//! resolves the tensor first, releases that table, then locks the arena
//! table. The two locks are never held together.

use std::ffi::c_void;
use std::sync::Mutex;

use tessera_tensor::{Tensor, TensorData, TensorError};

use crate::arena::with_arena;
use crate::handle::HandleTable;
use crate::parse_backend;
use crate::status::TesseraStatus;

/// A tensor and the arena it lives in.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TensorEntry {
    pub(crate) arena: u64,
    pub(crate) tensor: Tensor,
}

static TENSORS: Mutex<HandleTable<TensorEntry>> = Mutex::new(HandleTable::new());

/// Resolve a tensor handle.
pub(crate) fn entry(handle: u64) -> Result<TensorEntry, TesseraStatus> {
    ffi_lock!(TENSORS)
        .get(handle)
        .copied()
        .ok_or(TesseraStatus::InvalidHandle)
}

/// Drop every tensor handle that belongs to `arena`.
pub(crate) fn forget_arena(arena: u64) -> Result<usize, TesseraStatus> {
    Ok(ffi_lock!(TENSORS).remove_where(|e| e.arena == arena))
}

/// View a C dims array. A zero count needs no pointer.
#[allow(unsafe_code)]
fn dims_slice<'a>(num_dims: u32, dims: *const usize) -> Result<&'a [usize], TesseraStatus> {
    if num_dims == 0 {
        return Ok(&[]);
    }
    if dims.is_null() {
        return Err(TensorError::NullInput.into());
    }
    // SAFETY: dims is non-null and points to `num_dims` entries per the
    // caller contract.
    Ok(unsafe { std::slice::from_raw_parts(dims, num_dims as usize) })
}

/// Create a tensor of shape `dims[..num_dims]` on `backend` in `arena`.
///
/// Returns the tensor handle, or 0 on failure. Payload contents are not
/// initialised.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_tensor_create(
    arena: u64,
    num_dims: u32,
    dims: *const usize,
    backend: u32,
) -> u64 {
    ffi_guard!(0, {
        let backend = parse_backend(backend)?;
        let dims = dims_slice(num_dims, dims)?;
        let tensor = with_arena(arena, |a| Ok(Tensor::create(a, dims, backend)?))?;
        Ok(ffi_lock!(TENSORS).insert(TensorEntry { arena, tensor }))
    })
}

/// Pointer to the tensor's payload: host memory for host tensors, a device
/// address otherwise. Returns null on failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_tensor_get_data(tensor: u64) -> *mut c_void {
    ffi_guard!(std::ptr::null_mut(), {
        let e = entry(tensor)?;
        with_arena(e.arena, |a| match e.tensor.data(a)? {
            TensorData::Host(region) => Ok(a.host_ptr(region)?.cast::<c_void>()),
            TensorData::Device { ptr, .. } => Ok(ptr.as_raw()),
        })
    })
}

/// Number of dimensions, copying the extents into `dims_out` when it is
/// non-null.
///
/// Fails with `BufferTooSmall` if `cap` cannot hold them. A successful
/// return of 0 means the tensor has been reshaped to no dimensions; check
/// [`tessera_last_status`](crate::tessera_last_status) to tell it apart
/// from failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_tensor_get_dims(tensor: u64, dims_out: *mut usize, cap: u32) -> u32 {
    ffi_guard!(0, {
        let e = entry(tensor)?;
        let dims = with_arena(e.arena, |a| Ok(e.tensor.dims(a)?))?;
        if !dims_out.is_null() {
            if (cap as usize) < dims.len() {
                return Err(TesseraStatus::BufferTooSmall);
            }
            // SAFETY: dims_out is non-null and holds at least `cap` entries
            // per the caller contract; we write `dims.len() <= cap`.
            let out = unsafe { std::slice::from_raw_parts_mut(dims_out, dims.len()) };
            out.copy_from_slice(&dims);
        }
        Ok(dims.len() as u32)
    })
}

/// Payload size in bytes for the current shape. Returns 0 on failure, and
/// for a tensor reshaped to no dimensions.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_tensor_get_size(tensor: u64) -> usize {
    ffi_guard!(0, {
        let e = entry(tensor)?;
        with_arena(e.arena, |a| Ok(e.tensor.size(a)?))
    })
}

/// Reshape in place to `dims[..num_dims]`. Returns the tensor handle, or 0
/// on failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_tensor_set_dims(tensor: u64, num_dims: u32, dims: *const usize) -> u64 {
    ffi_guard!(0, {
        let dims = dims_slice(num_dims, dims)?;
        let e = entry(tensor)?;
        with_arena(e.arena, |a| Ok(e.tensor.set_dims(a, dims).map(|_| tensor)?))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{tessera_arena_create, tessera_arena_release};
    use crate::status::tessera_last_status;

    #[test]
    fn zero_dims_need_no_pointer() {
        assert_eq!(dims_slice(0, std::ptr::null()), Ok(&[][..]));
        assert_eq!(
            dims_slice(2, std::ptr::null()),
            Err(TesseraStatus::NullInput)
        );
    }

    #[test]
    fn release_invalidates_tensor_handles() {
        let mut buf = vec![0u8; 512];
        let arena = tessera_arena_create(buf.as_mut_ptr().cast(), buf.len());
        let dims = [2usize, 3];
        let t = tessera_tensor_create(arena, 2, dims.as_ptr(), 0);
        assert_ne!(t, 0);
        assert_eq!(tessera_tensor_get_size(t), 24);

        assert!(tessera_arena_release(arena));
        assert_eq!(tessera_tensor_get_size(t), 0);
        assert_eq!(tessera_last_status(), TesseraStatus::InvalidHandle as i32);
    }
}

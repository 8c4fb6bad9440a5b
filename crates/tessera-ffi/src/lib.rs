//! C FFI bindings for the Tessera arena allocator.
//!
//! Arenas and tensors cross the boundary as `u64` handles into
//! generation-checked tables; `0` is never a valid handle. Every function
//! returns an absent value (0, null or `false`) on failure and records the
//! reason for [`tessera_last_status`]. Panics are caught at the boundary and
//! reported as [`TesseraStatus::Panicked`].
//!
//! This is the only Tessera crate that contains `unsafe` code: turning
//! caller pointers into slices.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `$body` (which evaluates to `Result<T, TesseraStatus>`) with panics
/// contained, record the outcome as the thread's last status and return the
/// value or `$absent`.
macro_rules! ffi_guard {
    ($absent:expr, $body:block) => {{
        let outcome = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(
            || -> ::std::result::Result<_, $crate::status::TesseraStatus> { $body },
        ))
        .unwrap_or(Err($crate::status::TesseraStatus::Panicked));
        $crate::status::finish(outcome, $absent)
    }};
}

/// Lock a handle-table mutex, failing the enclosing call with
/// `InternalError` if a previous panic poisoned it.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        $mutex
            .lock()
            .map_err(|_| $crate::status::TesseraStatus::InternalError)?
    };
}

pub mod arena;
mod handle;
pub mod matmul;
pub mod status;
pub mod tensor;

use tessera_core::Backend;

pub use arena::{
    tessera_arena_can_alloc, tessera_arena_create, tessera_arena_extend_with_device_blocks,
    tessera_arena_malloc, tessera_arena_min_bytes, tessera_arena_release,
};
pub use matmul::tessera_matmul;
pub use status::{tessera_last_status, TesseraStatus};
pub use tensor::{
    tessera_tensor_create, tessera_tensor_get_data, tessera_tensor_get_dims,
    tessera_tensor_get_size, tessera_tensor_set_dims,
};

/// Decode a C backend tag.
pub(crate) fn parse_backend(tag: u32) -> Result<Backend, TesseraStatus> {
    Backend::from_raw(tag).ok_or(TesseraStatus::UnsupportedBackend)
}

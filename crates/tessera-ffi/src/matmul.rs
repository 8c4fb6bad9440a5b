//! Matrix multiply FFI.

use std::sync::{LazyLock, Mutex};

use tessera_dispatch::Dispatcher;

use crate::arena::with_arena;
use crate::status::TesseraStatus;
use crate::tensor::entry;

/// Kernels reachable from C. Only the host GEMM is registered here; device
/// kernels are wired up by Rust embedders through [`Dispatcher`] directly.
static DISPATCHER: LazyLock<Mutex<Dispatcher>> =
    LazyLock::new(|| Mutex::new(Dispatcher::with_host()));

/// Compute `result = a × b`.
///
/// All three tensors must live in the same arena. Returns the result
/// handle, or 0 on failure; nothing is written to `result` unless every
/// check passes.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_matmul(result: u64, a: u64, b: u64) -> u64 {
    ffi_guard!(0, {
        let (r, x, y) = (entry(result)?, entry(a)?, entry(b)?);
        if x.arena != r.arena || y.arena != r.arena {
            return Err(TesseraStatus::ArenaMismatch);
        }
        let dispatcher = ffi_lock!(DISPATCHER);
        with_arena(r.arena, |arena| {
            dispatcher.matmul(arena, r.tensor, x.tensor, y.tensor)?;
            Ok(result)
        })
    })
}

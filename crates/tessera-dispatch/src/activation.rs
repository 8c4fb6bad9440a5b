//! Element-wise activations.

use tessera_arena::{Arena, ArenaEvent};
use tessera_core::Backend;
use tessera_tensor::Tensor;

use crate::error::DispatchError;

/// Apply ReLU to every element of a host tensor, in place.
///
/// Elements with the sign bit set become `0.0`, so `-0.0` is cleared too.
/// Device tensors fail with `UnsupportedBackend`.
pub fn relu(arena: &mut Arena<'_>, tensor: Tensor) -> Result<(), DispatchError> {
    let outcome = try_relu(arena, tensor);
    if let Err(e) = &outcome {
        arena.log().record(&ArenaEvent::Failed {
            operation: "relu",
            error: e,
        });
    }
    outcome
}

fn try_relu(arena: &mut Arena<'_>, tensor: Tensor) -> Result<(), DispatchError> {
    let backend = tensor.backend(arena)?;
    if backend != Backend::Host {
        return Err(DispatchError::UnsupportedBackend { backend });
    }
    let mut values = tensor.read_host(arena)?;
    for v in &mut values {
        if v.is_sign_negative() {
            *v = 0.0;
        }
    }
    tensor.write_host(arena, &values)?;
    Ok(())
}

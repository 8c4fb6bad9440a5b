//! Kernel registry and the matmul entry point.

use std::fmt;

use indexmap::IndexMap;
use tessera_arena::{Arena, ArenaEvent};
use tessera_core::Backend;
use tessera_tensor::Tensor;

use crate::error::DispatchError;
use crate::host::HostGemm;
use crate::kernel::{GemmJob, GemmKernel};

/// Routes tensor operations to the kernel registered for their backend.
///
/// Kernels are kept in registration order; at most one per backend.
pub struct Dispatcher {
    kernels: IndexMap<Backend, Box<dyn GemmKernel>>,
}

impl Dispatcher {
    /// A dispatcher with no kernels. Every `matmul` fails with
    /// `UnsupportedBackend` until one is registered.
    pub fn new() -> Self {
        Self {
            kernels: IndexMap::new(),
        }
    }

    /// A dispatcher with [`HostGemm`] registered for [`Backend::Host`].
    pub fn with_host() -> Self {
        let mut d = Self::new();
        d.register(Box::new(HostGemm));
        d
    }

    /// Register `kernel` for its backend, returning the kernel it replaces.
    pub fn register(&mut self, kernel: Box<dyn GemmKernel>) -> Option<Box<dyn GemmKernel>> {
        self.kernels.insert(kernel.backend(), kernel)
    }

    /// Whether a kernel is registered for `backend`.
    pub fn supports(&self, backend: Backend) -> bool {
        self.kernels.contains_key(&backend)
    }

    /// Backends with a registered kernel, in registration order.
    pub fn backends(&self) -> impl Iterator<Item = Backend> + '_ {
        self.kernels.keys().copied()
    }

    /// Compute `result = a × b`.
    ///
    /// Checked in order before any kernel runs: `a` and `b` are 2-D,
    /// `a.dims[1] == b.dims[0]`, `result` is neither operand, all three
    /// share one backend, `result.dims == [a.dims[0], b.dims[1]]`, and a
    /// kernel is registered for that backend. The first violation is
    /// returned and the kernel is never invoked.
    pub fn matmul(
        &self,
        arena: &mut Arena<'_>,
        result: Tensor,
        a: Tensor,
        b: Tensor,
    ) -> Result<(), DispatchError> {
        let outcome = self.try_matmul(arena, result, a, b);
        if let Err(e) = &outcome {
            arena.log().record(&ArenaEvent::Failed {
                operation: "matmul",
                error: e,
            });
        }
        outcome
    }

    fn try_matmul(
        &self,
        arena: &mut Arena<'_>,
        result: Tensor,
        a: Tensor,
        b: Tensor,
    ) -> Result<(), DispatchError> {
        let a_dims = a.dims(arena)?;
        let b_dims = b.dims(arena)?;
        let c_dims = result.dims(arena)?;

        if a_dims.len() != 2 || b_dims.len() != 2 {
            return Err(DispatchError::ShapeMismatch {
                reason: format!("operands must be 2-D, got {a_dims:?} and {b_dims:?}"),
            });
        }
        let (m, k, n) = (a_dims[0], a_dims[1], b_dims[1]);
        if b_dims[0] != k {
            return Err(DispatchError::ShapeMismatch {
                reason: format!("inner dimensions differ: {a_dims:?} × {b_dims:?}"),
            });
        }

        let a_data = a.data(arena)?;
        let b_data = b.data(arena)?;
        let c_data = result.data(arena)?;
        if result == a || result == b || c_data == a_data || c_data == b_data {
            return Err(DispatchError::AliasingViolation);
        }

        let backend = a_data.backend();
        for other in [b_data.backend(), c_data.backend()] {
            if other != backend {
                return Err(DispatchError::BackendMismatch {
                    left: backend,
                    right: other,
                });
            }
        }

        if c_dims.as_slice() != [m, n] {
            return Err(DispatchError::ShapeMismatch {
                reason: format!("result is {c_dims:?}, expected [{m}, {n}]"),
            });
        }

        let kernel = self
            .kernels
            .get(&backend)
            .ok_or(DispatchError::UnsupportedBackend { backend })?;
        let job = GemmJob {
            backend,
            m,
            n,
            k,
            a: a_data,
            b: b_data,
            c: c_data,
        };
        kernel.sgemm(arena, &job)?;
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_host()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("backends", &self.kernels.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! Dispatch and kernel error types.

use std::error::Error;
use std::fmt;

use tessera_core::Backend;
use tessera_tensor::TensorError;

/// Failures reported by a kernel implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KernelError {
    /// The vendor library handle could not be created.
    HandleCreation {
        /// Backend whose library failed.
        backend: Backend,
        /// Vendor-supplied detail.
        reason: String,
    },
    /// The kernel launch failed.
    Launch {
        /// Backend whose launch failed.
        backend: Backend,
        /// Vendor-supplied detail.
        reason: String,
    },
    /// The kernel could not reach an operand's memory.
    Memory {
        /// Backend the kernel runs on.
        backend: Backend,
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandleCreation { backend, reason } => {
                write!(f, "{backend} kernel handle creation failed: {reason}")
            }
            Self::Launch { backend, reason } => {
                write!(f, "{backend} kernel launch failed: {reason}")
            }
            Self::Memory { backend, reason } => {
                write!(f, "{backend} kernel memory access failed: {reason}")
            }
        }
    }
}

impl Error for KernelError {}

/// Errors returned by [`Dispatcher::matmul`](crate::Dispatcher::matmul)
/// and [`relu`](crate::relu).
///
/// Contract violations are detected before any kernel runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// Operand or result shapes are incompatible.
    ShapeMismatch {
        /// Human-readable description of the mismatch.
        reason: String,
    },
    /// Operands live on different backends.
    BackendMismatch {
        /// Backend of the first operand.
        left: Backend,
        /// Backend of the conflicting tensor.
        right: Backend,
    },
    /// The result tensor is also an operand.
    AliasingViolation,
    /// No kernel is registered for this backend, or the operation has no
    /// implementation there.
    UnsupportedBackend {
        /// The backend asked for.
        backend: Backend,
    },
    /// Reading an operand failed.
    Tensor(TensorError),
    /// The kernel failed.
    Kernel(KernelError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { reason } => write!(f, "shape mismatch: {reason}"),
            Self::BackendMismatch { left, right } => {
                write!(f, "backend mismatch: {left} vs {right}")
            }
            Self::AliasingViolation => {
                write!(f, "result tensor aliases an operand")
            }
            Self::UnsupportedBackend { backend } => {
                write!(f, "no kernel registered for backend {backend}")
            }
            Self::Tensor(e) => write!(f, "tensor error: {e}"),
            Self::Kernel(e) => write!(f, "kernel error: {e}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tensor(e) => Some(e),
            Self::Kernel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TensorError> for DispatchError {
    fn from(e: TensorError) -> Self {
        Self::Tensor(e)
    }
}

impl From<KernelError> for DispatchError {
    fn from(e: KernelError) -> Self {
        Self::Kernel(e)
    }
}

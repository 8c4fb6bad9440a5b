//! Tensor-specific error types.

use std::error::Error;
use std::fmt;

use tessera_arena::ArenaError;
use tessera_core::{ArenaId, Backend};

/// Errors that can occur while creating or inspecting tensors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TensorError {
    /// A required input was null (C boundary only).
    NullInput,
    /// A tensor must have at least one dimension.
    ZeroDimensions,
    /// A dimension has extent zero.
    ZeroExtent {
        /// The offending axis.
        axis: usize,
    },
    /// The element count or byte size overflows `usize`.
    SizeOverflow,
    /// A backend tag is not recognised.
    UnsupportedBackend {
        /// The raw tag.
        tag: u32,
    },
    /// The handle was created by a different arena.
    WrongArena {
        /// The arena that created the handle.
        tensor_arena: ArenaId,
        /// The arena it was presented to.
        arena: ArenaId,
    },
    /// The handle does not point at a tensor header in this arena.
    CorruptHeader {
        /// Byte offset of the handle.
        offset: usize,
    },
    /// A reshape asks for more dimensions than were reserved at creation.
    DimsCapacityExceeded {
        /// Requested number of dimensions.
        requested: usize,
        /// Dimension slots reserved at creation.
        capacity: usize,
    },
    /// A reshape needs more payload than was reserved at creation.
    ReshapeExceedsStorage {
        /// Payload bytes the new shape needs.
        requested_bytes: usize,
        /// Payload bytes reserved at creation.
        reserved_bytes: usize,
    },
    /// Host access was attempted on a device tensor.
    NotHostResident {
        /// The tensor's backend.
        backend: Backend,
    },
    /// A host copy had the wrong number of elements.
    LengthMismatch {
        /// Elements the tensor holds.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
    /// The underlying arena operation failed.
    Arena(ArenaError),
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullInput => write!(f, "null input"),
            Self::ZeroDimensions => {
                write!(f, "tensors must have a non-zero number of dimensions")
            }
            Self::ZeroExtent { axis } => write!(f, "dimension {axis} has extent zero"),
            Self::SizeOverflow => write!(f, "tensor size overflows usize"),
            Self::UnsupportedBackend { tag } => write!(f, "unsupported backend tag {tag}"),
            Self::WrongArena {
                tensor_arena,
                arena,
            } => {
                write!(
                    f,
                    "tensor belongs to arena {tensor_arena}, not arena {arena}"
                )
            }
            Self::CorruptHeader { offset } => {
                write!(f, "no valid tensor header at offset {offset}")
            }
            Self::DimsCapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "reshape to {requested} dimensions exceeds the {capacity} reserved"
                )
            }
            Self::ReshapeExceedsStorage {
                requested_bytes,
                reserved_bytes,
            } => {
                write!(
                    f,
                    "reshape needs {requested_bytes} bytes but only {reserved_bytes} are reserved"
                )
            }
            Self::NotHostResident { backend } => {
                write!(f, "tensor lives on {backend}, not host memory")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} elements, got {actual}")
            }
            Self::Arena(e) => write!(f, "arena error: {e}"),
        }
    }
}

impl Error for TensorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for TensorError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

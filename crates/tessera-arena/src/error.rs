//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use tessera_core::Backend;

/// Errors that can occur during arena operations.
///
/// Every failing operation leaves the arena exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// A null buffer was supplied where host memory was expected.
    NullBuffer,
    /// A required input was null or empty.
    NullInput {
        /// Which input was missing.
        what: &'static str,
    },
    /// The host buffer is shorter than [`arena_min_bytes`](crate::arena_min_bytes).
    BufferTooSmall {
        /// Length of the supplied buffer.
        size: usize,
        /// Minimum accepted length.
        min: usize,
    },
    /// No sub-arena of the requested backend can satisfy the request.
    OutOfArenaSpace {
        /// Backend the request was made for.
        backend: Backend,
        /// Number of bytes requested.
        requested: usize,
        /// Largest request that would currently succeed.
        available: usize,
    },
    /// The device block table does not fit in the host sub-arena.
    InsufficientHostCapacity {
        /// Bytes needed for the block table.
        requested: usize,
        /// Bytes left in the host sub-arena.
        available: usize,
    },
    /// The arena already has a device extension.
    AlreadyExtended {
        /// Backend of the existing extension.
        existing: Backend,
    },
    /// The backend cannot be used for this operation.
    UnsupportedBackend {
        /// The offending backend.
        backend: Backend,
    },
    /// A host region does not lie inside the allocated part of the buffer.
    RegionOutOfBounds {
        /// Start of the region.
        offset: usize,
        /// Length of the region.
        len: usize,
        /// Bytes currently allocated in the host sub-arena.
        used: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullBuffer => write!(f, "arena buffer is null"),
            Self::NullInput { what } => write!(f, "null input: {what}"),
            Self::BufferTooSmall { size, min } => {
                write!(
                    f,
                    "arena buffer too small: {size} bytes supplied, minimum {min} bytes"
                )
            }
            Self::OutOfArenaSpace {
                backend,
                requested,
                available,
            } => {
                write!(
                    f,
                    "out of {backend} arena space: requested {requested} bytes, largest available {available} bytes"
                )
            }
            Self::InsufficientHostCapacity {
                requested,
                available,
            } => {
                write!(
                    f,
                    "host arena cannot hold device block table: requested {requested} bytes, available {available} bytes"
                )
            }
            Self::AlreadyExtended { existing } => {
                write!(f, "arena already has a {existing} device extension")
            }
            Self::UnsupportedBackend { backend } => {
                write!(f, "backend {backend} is not supported here")
            }
            Self::RegionOutOfBounds { offset, len, used } => {
                write!(
                    f,
                    "host region {offset}+{len} lies outside the {used} allocated bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}

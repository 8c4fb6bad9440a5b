//! Core types for the Tessera arena allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by every other Tessera crate: the [`Backend`] a buffer
//! lives on, opaque [`DevicePtr`] addresses for accelerator memory, the
//! [`ArenaId`] that ties tensor handles to their arena, the [`Dims`] shape
//! type, and the element width of tensor payloads.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod device;
pub mod id;

pub use backend::Backend;
pub use device::DevicePtr;
pub use id::ArenaId;

use smallvec::SmallVec;

/// Width in bytes of one tensor element (`f32`).
pub const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();

/// A tensor shape, outermost axis first.
///
/// Uses `SmallVec<[usize; 4]>` so shapes up to rank 4 (every matrix and
/// most activation buffers) never touch the heap.
pub type Dims = SmallVec<[usize; 4]>;

//! Tessera: a manual memory arena for host and accelerator tensors.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Tessera sub-crates. For most users, adding `tessera` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! // The caller owns the memory; the arena only borrows it.
//! let mut buf = vec![0u8; 4096];
//! let mut arena = Arena::with_log(&mut buf[..], SilentLog).unwrap();
//!
//! // Device blocks come from the vendor allocator. They are never
//! // dereferenced, so any addresses will do here.
//! let blocks = [DevicePtr::new(0x7f00_0000_0000), DevicePtr::new(0x7f00_0010_0000)];
//! arena
//!     .extend_with_device_blocks(DeviceBlocks::new(Backend::Rocm, &blocks, 1 << 20))
//!     .unwrap();
//!
//! let a = Tensor::create(&mut arena, &[2, 3], Backend::Host).unwrap();
//! let b = Tensor::create(&mut arena, &[3, 2], Backend::Host).unwrap();
//! let c = Tensor::create(&mut arena, &[2, 2], Backend::Host).unwrap();
//! a.write_host(&mut arena, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! b.write_host(&mut arena, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
//!
//! Dispatcher::with_host().matmul(&mut arena, c, a, b).unwrap();
//! assert_eq!(c.read_host(&arena).unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
//!
//! // Device tensors keep their metadata on the host.
//! let w = Tensor::create(&mut arena, &[128, 128], Backend::Rocm).unwrap();
//! assert_eq!(w.size(&arena).unwrap(), 128 * 128 * 4);
//! assert!(matches!(w.data(&arena).unwrap(), TensorData::Device { .. }));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | `Backend`, `DevicePtr`, element width |
//! | [`arena`] | `tessera-arena` | Host and device sub-arenas, regions, logging |
//! | [`tensor`] | `tessera-tensor` | Tensor handles, header layout |
//! | [`dispatch`] | `tessera-dispatch` | Kernel seam, host GEMM, activations |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Backends and device addresses (`tessera-core`).
pub use tessera_core as types;

/// Arena allocation (`tessera-arena`).
///
/// [`arena::Arena`] is the entry point; [`arena::ArenaLog`] is the
/// diagnostics capability each arena carries.
pub use tessera_arena as arena;

/// Tensors laid out inside arenas (`tessera-tensor`).
pub use tessera_tensor as tensor;

/// Backend kernel dispatch (`tessera-dispatch`).
///
/// Implement [`dispatch::GemmKernel`] to plug a vendor library in.
pub use tessera_dispatch as dispatch;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tessera_core::{ArenaId, Backend, DevicePtr, ELEMENT_BYTES};

    // Arena
    pub use tessera_arena::{
        arena_min_bytes, Allocation, Arena, ArenaLog, DeviceBlocks, SilentLog, TracingLog,
    };

    // Tensor
    pub use tessera_tensor::{Tensor, TensorData};

    // Dispatch
    pub use tessera_dispatch::{relu, Dispatcher, GemmJob, GemmKernel};

    // Errors
    pub use tessera_arena::ArenaError;
    pub use tessera_dispatch::{DispatchError, KernelError};
    pub use tessera_tensor::TensorError;
}

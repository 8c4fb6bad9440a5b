//! Backend dispatch for Tessera tensors.
//!
//! The [`Dispatcher`] is the boundary between the arena/tensor layer and
//! numeric kernels. It enforces the input contract (shapes, aliasing,
//! backend agreement) and only then hands a [`GemmJob`] to the
//! [`GemmKernel`] registered for the operands' backend. Vendor kernels live
//! outside this crate; [`HostGemm`] is the in-tree host implementation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod activation;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod kernel;

pub use activation::relu;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, KernelError};
pub use host::HostGemm;
pub use kernel::{GemmJob, GemmKernel};

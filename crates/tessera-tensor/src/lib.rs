//! Shaped `f32` tensors laid out inside Tessera arenas.
//!
//! A [`Tensor`] is a small `Copy` handle: the offset of its header in the
//! arena's host buffer. Everything else (backend, shape, payload location)
//! is stored in that header and read back on demand.
//!
//! # Layout
//!
//! ```text
//! host tensor:    | header | payload (4 × Π dims) | dims (8 × n) |
//! device tensor:  | header | dims (8 × n) |   (host buffer)
//!                 | payload (4 × Π dims) |      (device block)
//! ```
//!
//! The header records the dims and payload offsets explicitly, so no code
//! depends on pointer arithmetic past the end of a struct.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod data;
pub mod error;
pub mod layout;
pub mod tensor;

pub use data::TensorData;
pub use error::TensorError;
pub use layout::{TensorHeader, TensorLayout};
pub use tensor::Tensor;

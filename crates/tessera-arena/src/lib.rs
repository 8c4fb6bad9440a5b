//! Host bump and device block-pool arena allocation for Tessera.
//!
//! An [`Arena`] is built over a byte buffer the caller owns. Everything the
//! arena tracks beyond a handful of Rust-side fields is written into that
//! buffer: its own header, the device block table, and (via
//! `tessera-tensor`) tensor metadata.
//!
//! # Architecture
//!
//! ```text
//! Arena<'buf>
//! ├── HostArena        bump allocator over the caller's buffer
//! │   └── [header | allocations ... | free]
//! ├── Option<DeviceArena>   first-fit pool over N equal-sized device blocks
//! │   └── block table (base, used) × N, carved out of the host buffer
//! └── Box<dyn ArenaLog>     diagnostics capability (tracing by default)
//! ```
//!
//! Nothing is ever freed. A failed request never mutates the arena.
//!
//! Device addresses are opaque [`DevicePtr`](tessera_core::DevicePtr)
//! values and are never dereferenced. Host memory is held as a raw base
//! pointer in one private module; everything else reaches it through
//! slices over a single region at a time, so pointers handed to C for one
//! region survive Rust access to the others.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
mod buffer;
pub mod config;
pub mod device;
pub mod error;
pub mod host;
pub mod log;
pub mod raw;
pub mod region;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::{arena_min_bytes, DeviceBlocks};
pub use device::DeviceArena;
pub use error::ArenaError;
pub use host::HostArena;
pub use log::{ArenaEvent, ArenaLog, SilentLog, TracingLog};
pub use region::{Allocation, DeviceRegion, HostRegion};

//! Diagnostics capability carried by every arena.
//!
//! Arenas do not write to any process-wide sink on their own. Each one owns
//! an [`ArenaLog`] chosen at construction: [`TracingLog`] (the default)
//! forwards to the `tracing` ecosystem, [`SilentLog`] discards everything,
//! and tests inject recorders to assert on what happened.

use std::error::Error;

use tessera_core::Backend;

/// Something worth reporting about an arena.
#[derive(Clone, Copy, Debug)]
pub enum ArenaEvent<'a> {
    /// A new arena was laid over a host buffer.
    Created {
        /// Capacity of the host buffer in bytes.
        capacity_bytes: usize,
    },
    /// A device pool was attached.
    DeviceExtended {
        /// Accelerator the pool serves.
        backend: Backend,
        /// Number of blocks.
        num_blocks: usize,
        /// Capacity of each block.
        block_capacity_bytes: usize,
        /// Host bytes consumed by the block table.
        table_bytes: usize,
    },
    /// An allocation succeeded.
    Allocated {
        /// Backend the bytes came from.
        backend: Backend,
        /// Bytes allocated.
        bytes: usize,
        /// Device block index, for device allocations.
        block: Option<usize>,
    },
    /// An operation failed. The arena is unchanged.
    Failed {
        /// Name of the failing operation.
        operation: &'static str,
        /// Why it failed.
        error: &'a (dyn Error + 'static),
    },
}

/// Receiver for [`ArenaEvent`]s.
///
/// `Send` so an arena can be parked behind a mutex at the C boundary.
pub trait ArenaLog: Send {
    /// Record one event.
    fn record(&self, event: &ArenaEvent<'_>);
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl ArenaLog for TracingLog {
    fn record(&self, event: &ArenaEvent<'_>) {
        match *event {
            ArenaEvent::Created { capacity_bytes } => {
                tracing::debug!(capacity_bytes, "arena created");
            }
            ArenaEvent::DeviceExtended {
                backend,
                num_blocks,
                block_capacity_bytes,
                table_bytes,
            } => {
                tracing::debug!(
                    backend = backend.name(),
                    num_blocks,
                    block_capacity_bytes,
                    table_bytes,
                    "arena extended with device blocks"
                );
            }
            ArenaEvent::Allocated {
                backend,
                bytes,
                block,
            } => {
                tracing::trace!(backend = backend.name(), bytes, ?block, "arena allocation");
            }
            ArenaEvent::Failed { operation, error } => {
                tracing::warn!(operation, %error, "arena operation failed");
            }
        }
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentLog;

impl ArenaLog for SilentLog {
    fn record(&self, _event: &ArenaEvent<'_>) {}
}

impl<L: ArenaLog + Sync> ArenaLog for std::sync::Arc<L> {
    fn record(&self, event: &ArenaEvent<'_>) {
        (**self).record(event);
    }
}

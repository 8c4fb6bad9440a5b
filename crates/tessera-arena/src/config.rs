//! Arena layout constants and device extension parameters.

use tessera_core::{Backend, DevicePtr};

use crate::error::ArenaError;

/// Size of the arena header written at the front of the host buffer.
///
/// Two little-endian `u64` words: capacity in bytes, then used bytes.
pub const ARENA_HEADER_BYTES: usize = 16;

/// Slack required beyond the header for a buffer to be accepted.
pub const ARENA_MIN_SLACK_BYTES: usize = 8;

/// Host bytes consumed per device block: base address, then used counter.
pub const DEVICE_TABLE_ENTRY_BYTES: usize = 16;

/// Minimum buffer size accepted by [`Arena::new`](crate::Arena::new).
pub const fn arena_min_bytes() -> usize {
    ARENA_HEADER_BYTES + ARENA_MIN_SLACK_BYTES
}

/// Accelerator memory handed to an arena by
/// [`Arena::extend_with_device_blocks`](crate::Arena::extend_with_device_blocks).
///
/// Every block must hold `block_capacity_bytes` bytes. The block list is
/// copied into the host buffer, so the slice need not outlive the call.
#[derive(Clone, Copy, Debug)]
pub struct DeviceBlocks<'a> {
    /// The accelerator the blocks belong to. Must not be `Host`.
    pub backend: Backend,
    /// Base address of each block, in allocation-priority order.
    pub blocks: &'a [DevicePtr],
    /// Capacity shared by every block.
    pub block_capacity_bytes: usize,
}

impl<'a> DeviceBlocks<'a> {
    /// Describe `blocks` of `block_capacity_bytes` each on `backend`.
    pub fn new(backend: Backend, blocks: &'a [DevicePtr], block_capacity_bytes: usize) -> Self {
        Self {
            backend,
            blocks,
            block_capacity_bytes,
        }
    }

    /// Number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Host bytes needed for the block table.
    ///
    /// Returns `None` if the table size overflows `usize`.
    pub fn table_bytes(&self) -> Option<usize> {
        self.blocks.len().checked_mul(DEVICE_TABLE_ENTRY_BYTES)
    }

    /// Reject host backends, empty block lists and null block addresses.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.backend.is_device() {
            return Err(ArenaError::UnsupportedBackend {
                backend: self.backend,
            });
        }
        if self.blocks.is_empty() {
            return Err(ArenaError::NullInput {
                what: "device block list is empty",
            });
        }
        if self.blocks.iter().any(|b| b.is_null()) {
            return Err(ArenaError::NullInput {
                what: "device block address is null",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_bytes_is_header_plus_slack() {
        assert_eq!(arena_min_bytes(), 24);
    }

    #[test]
    fn table_bytes_scales_with_blocks() {
        let blocks = [DevicePtr::new(0x1000), DevicePtr::new(0x2000)];
        let cfg = DeviceBlocks::new(Backend::Rocm, &blocks, 4096);
        assert_eq!(cfg.table_bytes(), Some(32));
        assert_eq!(cfg.num_blocks(), 2);
    }

    #[test]
    fn host_backend_rejected() {
        let blocks = [DevicePtr::new(0x1000)];
        let cfg = DeviceBlocks::new(Backend::Host, &blocks, 4096);
        assert_eq!(
            cfg.validate(),
            Err(ArenaError::UnsupportedBackend {
                backend: Backend::Host
            })
        );
    }

    #[test]
    fn empty_and_null_blocks_rejected() {
        let cfg = DeviceBlocks::new(Backend::Cuda, &[], 4096);
        assert!(matches!(cfg.validate(), Err(ArenaError::NullInput { .. })));

        let blocks = [DevicePtr::new(0x1000), DevicePtr::NULL];
        let cfg = DeviceBlocks::new(Backend::Cuda, &blocks, 4096);
        assert!(matches!(cfg.validate(), Err(ArenaError::NullInput { .. })));
    }
}

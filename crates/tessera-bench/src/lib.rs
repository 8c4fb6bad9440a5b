//! Benchmark profiles for the Tessera arena allocator.
//!
//! - [`ArenaProfile::reference`]: 1 MiB host buffer, 8 device blocks of 1 MiB
//! - [`ArenaProfile::stress`]: 16 MiB host buffer, 64 device blocks of 4 MiB

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_arena::{Arena, ArenaError, DeviceBlocks, SilentLog};
use tessera_core::{Backend, DevicePtr};

/// Base of the fake device address range used by benchmarks.
const DEVICE_BASE: u64 = 0x7e00_0000_0000;

/// Sizes of a benchmark arena.
#[derive(Clone, Copy, Debug)]
pub struct ArenaProfile {
    /// Host buffer length in bytes.
    pub host_bytes: usize,
    /// Number of device blocks.
    pub num_blocks: usize,
    /// Capacity of each device block.
    pub block_bytes: usize,
}

impl ArenaProfile {
    /// Small profile for per-operation latency.
    pub const fn reference() -> Self {
        Self {
            host_bytes: 1 << 20,
            num_blocks: 8,
            block_bytes: 1 << 20,
        }
    }

    /// Large profile for long allocation runs.
    pub const fn stress() -> Self {
        Self {
            host_bytes: 16 << 20,
            num_blocks: 64,
            block_bytes: 4 << 20,
        }
    }

    /// A zeroed host buffer of this profile's size.
    pub fn host_buffer(&self) -> Vec<u8> {
        vec![0; self.host_bytes]
    }

    /// Fake, never-dereferenced device block addresses.
    pub fn device_blocks(&self) -> Vec<DevicePtr> {
        (0..self.num_blocks as u64)
            .map(|i| DevicePtr::new(DEVICE_BASE + i * self.block_bytes as u64))
            .collect()
    }

    /// Lay a silent arena over `buf`, extended with `blocks` on `backend`.
    pub fn arena<'a>(
        &self,
        buf: &'a mut [u8],
        backend: Backend,
        blocks: &[DevicePtr],
    ) -> Result<Arena<'a>, ArenaError> {
        let mut arena = Arena::with_log(buf, SilentLog)?;
        arena.extend_with_device_blocks(DeviceBlocks::new(backend, blocks, self.block_bytes))?;
        Ok(arena)
    }
}

//! The device sub-arena: a first-fit pool over fixed-size device blocks.
//!
//! The pool's state lives in a table carved out of the host buffer, one
//! [`DEVICE_TABLE_ENTRY_BYTES`] entry per block. Methods take the table's
//! bytes, not the whole buffer:
//!
//! ```text
//! | base: u64 | used: u64 | base: u64 | used: u64 | ...
//! ```
//!
//! Allocations never span blocks. A request is served from the first block,
//! in index order, with enough free space; only that block's counter moves.

use tessera_core::{Backend, DevicePtr};

use crate::config::{DeviceBlocks, DEVICE_TABLE_ENTRY_BYTES};
use crate::error::ArenaError;
use crate::raw;
use crate::region::{DeviceRegion, HostRegion};

const ENTRY_BASE_AT: usize = 0;
const ENTRY_USED_AT: usize = 8;

/// Bookkeeping for a device extension.
///
/// This struct only records where the block table lives; every method
/// takes the bytes of that table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceArena {
    backend: Backend,
    block_capacity: usize,
    num_blocks: usize,
    table: HostRegion,
}

impl DeviceArena {
    /// Initialise the block table from `blocks`.
    ///
    /// `bytes` are the contents of `table`, which must be exactly
    /// `blocks.table_bytes()` long; the caller has already validated
    /// `blocks`.
    pub(crate) fn init(bytes: &mut [u8], table: HostRegion, blocks: &DeviceBlocks<'_>) -> Self {
        for (i, base) in blocks.blocks.iter().enumerate() {
            let entry = i * DEVICE_TABLE_ENTRY_BYTES;
            raw::write_u64(bytes, entry + ENTRY_BASE_AT, base.addr());
            raw::write_usize(bytes, entry + ENTRY_USED_AT, 0);
        }
        Self {
            backend: blocks.backend,
            block_capacity: blocks.block_capacity_bytes,
            num_blocks: blocks.num_blocks(),
            table,
        }
    }

    /// The accelerator this pool serves.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Capacity of each block in bytes.
    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Number of blocks in the pool.
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Where the block table lives in the host buffer.
    pub fn table(&self) -> HostRegion {
        self.table
    }

    /// Base address of block `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_blocks()`.
    pub fn block_base(&self, table: &[u8], i: usize) -> DevicePtr {
        DevicePtr::new(raw::read_u64(table, self.entry(i) + ENTRY_BASE_AT))
    }

    /// Bytes allocated from block `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_blocks()`.
    pub fn block_used(&self, table: &[u8], i: usize) -> usize {
        raw::read_usize(table, self.entry(i) + ENTRY_USED_AT)
    }

    /// Bytes still free in block `i`.
    pub fn block_free(&self, table: &[u8], i: usize) -> usize {
        self.block_capacity
            .saturating_sub(self.block_used(table, i))
    }

    /// Index of the first block with at least `bytes` free.
    pub fn first_fit(&self, table: &[u8], bytes: usize) -> Option<usize> {
        if bytes > self.block_capacity {
            return None;
        }
        (0..self.num_blocks).find(|&i| self.block_free(table, i) >= bytes)
    }

    /// Whether a `bytes`-byte request can be served by a single block.
    pub fn can_alloc(&self, table: &[u8], bytes: usize) -> bool {
        self.first_fit(table, bytes).is_some()
    }

    /// Largest request that would currently succeed.
    pub fn largest_free(&self, table: &[u8]) -> usize {
        (0..self.num_blocks)
            .map(|i| self.block_free(table, i))
            .max()
            .unwrap_or(0)
    }

    /// Total bytes allocated across all blocks.
    pub fn total_used(&self, table: &[u8]) -> usize {
        (0..self.num_blocks).map(|i| self.block_used(table, i)).sum()
    }

    /// Allocate `bytes` from the first block that fits.
    pub(crate) fn alloc(&self, table: &mut [u8], bytes: usize) -> Result<DeviceRegion, ArenaError> {
        let out_of_space = |table: &[u8]| ArenaError::OutOfArenaSpace {
            backend: self.backend,
            requested: bytes,
            available: self.largest_free(table),
        };
        let block = self.first_fit(table, bytes).ok_or_else(|| out_of_space(table))?;
        let used = self.block_used(table, block);
        let ptr = self
            .block_base(table, block)
            .checked_add(used)
            .ok_or_else(|| out_of_space(table))?;
        raw::write_usize(table, self.entry(block) + ENTRY_USED_AT, used + bytes);
        Ok(DeviceRegion {
            backend: self.backend,
            block,
            ptr,
            len: bytes,
        })
    }

    fn entry(&self, i: usize) -> usize {
        assert!(i < self.num_blocks, "block index {i} out of range");
        i * DEVICE_TABLE_ENTRY_BYTES
    }
}

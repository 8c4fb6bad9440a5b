//! The host sub-arena: a bump allocator over the caller's byte buffer.
//!
//! The first [`ARENA_HEADER_BYTES`] of the buffer hold the arena header
//! (capacity and used bytes). Allocations are handed out in order after
//! it and are never reused, split or reclaimed.

use tessera_core::Backend;

use crate::buffer::HostBuffer;
use crate::config::{arena_min_bytes, ARENA_HEADER_BYTES};
use crate::error::ArenaError;
use crate::raw;
use crate::region::HostRegion;

const HEADER_CAPACITY_AT: usize = 0;
const HEADER_USED_AT: usize = 8;

/// Bump allocator over a borrowed host buffer.
///
/// `used` only ever grows. Contents of returned regions are whatever the
/// caller's buffer held; nothing is zeroed.
pub struct HostArena<'buf> {
    /// Backing storage, owned by the caller.
    buf: HostBuffer<'buf>,
    /// Bump pointer: next free byte.
    used: usize,
}

impl<'buf> HostArena<'buf> {
    /// Take over `buf`, writing the arena header at its front.
    pub fn new(buf: &'buf mut [u8]) -> Result<Self, ArenaError> {
        let min = arena_min_bytes();
        if buf.len() < min {
            return Err(ArenaError::BufferTooSmall {
                size: buf.len(),
                min,
            });
        }
        let mut host = Self {
            buf: HostBuffer::new(buf),
            used: ARENA_HEADER_BYTES,
        };
        let capacity = host.capacity();
        raw::write_usize(host.header_mut(), HEADER_CAPACITY_AT, capacity);
        host.sync_header();
        Ok(host)
    }

    /// Whether `bytes` more bytes fit.
    pub fn can_alloc(&self, bytes: usize) -> bool {
        bytes <= self.remaining()
    }

    /// Bump-allocate `bytes` bytes.
    ///
    /// Returns `ArenaError::OutOfArenaSpace` without touching the arena if
    /// they do not fit.
    pub fn alloc(&mut self, bytes: usize) -> Result<HostRegion, ArenaError> {
        if !self.can_alloc(bytes) {
            return Err(ArenaError::OutOfArenaSpace {
                backend: Backend::Host,
                requested: bytes,
                available: self.remaining(),
            });
        }
        let region = HostRegion::new(self.used, bytes);
        self.used += bytes;
        self.sync_header();
        Ok(region)
    }

    /// Bytes of an allocated region.
    pub fn bytes(&self, region: HostRegion) -> Result<&[u8], ArenaError> {
        let end = self.check(region)?;
        Ok(self.buf.slice(region.offset..end))
    }

    /// Mutable bytes of an allocated region.
    pub fn bytes_mut(&mut self, region: HostRegion) -> Result<&mut [u8], ArenaError> {
        let end = self.check(region)?;
        Ok(self.buf.slice_mut(region.offset..end))
    }

    /// Raw pointer to the first byte of `region`, for handing to C.
    ///
    /// The pointer stays usable while other regions are accessed through
    /// this arena.
    pub fn ptr_mut(&mut self, region: HostRegion) -> Result<*mut u8, ArenaError> {
        self.check(region)?;
        Ok(self.buf.ptr_at(region.offset))
    }

    /// Total capacity in bytes, header included.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes allocated so far, header included.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.used
    }

    /// The arena header: capacity, then used bytes.
    pub fn header(&self) -> &[u8] {
        self.buf.slice(0..ARENA_HEADER_BYTES)
    }

    fn header_mut(&mut self) -> &mut [u8] {
        self.buf.slice_mut(0..ARENA_HEADER_BYTES)
    }

    /// Bytes of a region the arena carved out for itself, such as the
    /// device block table. Not checked against `used`.
    pub(crate) fn internal(&self, region: HostRegion) -> &[u8] {
        self.buf.slice(region.offset..region.offset + region.len)
    }

    pub(crate) fn internal_mut(&mut self, region: HostRegion) -> &mut [u8] {
        self.buf.slice_mut(region.offset..region.offset + region.len)
    }

    fn check(&self, region: HostRegion) -> Result<usize, ArenaError> {
        match region.end() {
            Some(end) if region.offset >= ARENA_HEADER_BYTES && end <= self.used => Ok(end),
            _ => Err(ArenaError::RegionOutOfBounds {
                offset: region.offset,
                len: region.len,
                used: self.used,
            }),
        }
    }

    fn sync_header(&mut self) {
        let used = self.used;
        raw::write_usize(self.header_mut(), HEADER_USED_AT, used);
    }
}

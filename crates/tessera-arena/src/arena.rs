//! The arena: one host sub-arena plus an optional device sub-arena.

use std::fmt;

use tessera_core::{ArenaId, Backend};

use crate::config::DeviceBlocks;
use crate::device::DeviceArena;
use crate::error::ArenaError;
use crate::host::HostArena;
use crate::log::{ArenaEvent, ArenaLog, TracingLog};
use crate::region::{Allocation, HostRegion};

/// A manual memory arena over caller-owned memory.
///
/// The arena borrows its host buffer for `'buf` and never frees anything:
/// memory is reclaimed only when the caller drops the arena and reuses the
/// buffer. Device blocks are never dereferenced; the arena only hands out
/// addresses inside them.
///
/// Single-threaded: all mutation goes through `&mut self`.
pub struct Arena<'buf> {
    id: ArenaId,
    host: HostArena<'buf>,
    device: Option<DeviceArena>,
    log: Box<dyn ArenaLog + 'buf>,
}

impl<'buf> Arena<'buf> {
    /// Lay an arena over `buffer`, logging through `tracing`.
    ///
    /// The arena header occupies the first
    /// [`ARENA_HEADER_BYTES`](crate::config::ARENA_HEADER_BYTES) bytes.
    /// Fails with `BufferTooSmall` below [`arena_min_bytes`](crate::arena_min_bytes).
    pub fn new(buffer: &'buf mut [u8]) -> Result<Self, ArenaError> {
        Self::with_log(buffer, TracingLog)
    }

    /// Lay an arena over `buffer`, reporting to `log`.
    pub fn with_log(buffer: &'buf mut [u8], log: impl ArenaLog + 'buf) -> Result<Self, ArenaError> {
        let host = match HostArena::new(buffer) {
            Ok(host) => host,
            Err(e) => {
                log.record(&ArenaEvent::Failed {
                    operation: "create",
                    error: &e,
                });
                return Err(e);
            }
        };
        log.record(&ArenaEvent::Created {
            capacity_bytes: host.capacity(),
        });
        Ok(Self {
            id: ArenaId::next(),
            host,
            device: None,
            log: Box::new(log),
        })
    }

    /// Attach a pool of device blocks.
    ///
    /// The block table is allocated from the host sub-arena. Errors, in the
    /// order they are checked: `UnsupportedBackend` for a host backend,
    /// `AlreadyExtended`, `NullInput` for an empty list or a null block,
    /// `InsufficientHostCapacity` if the table does not fit. On error the
    /// arena is untouched.
    pub fn extend_with_device_blocks(&mut self, blocks: DeviceBlocks<'_>) -> Result<(), ArenaError> {
        let result = self.try_extend(&blocks);
        if let Err(e) = &result {
            self.log.record(&ArenaEvent::Failed {
                operation: "extend_with_device_blocks",
                error: e,
            });
        }
        result
    }

    fn try_extend(&mut self, blocks: &DeviceBlocks<'_>) -> Result<(), ArenaError> {
        if !blocks.backend.is_device() {
            return Err(ArenaError::UnsupportedBackend {
                backend: blocks.backend,
            });
        }
        if let Some(existing) = &self.device {
            return Err(ArenaError::AlreadyExtended {
                existing: existing.backend(),
            });
        }
        blocks.validate()?;
        let table_bytes = blocks
            .table_bytes()
            .ok_or(ArenaError::InsufficientHostCapacity {
                requested: usize::MAX,
                available: self.host.remaining(),
            })?;
        let table = self.host.alloc(table_bytes).map_err(|_| {
            ArenaError::InsufficientHostCapacity {
                requested: table_bytes,
                available: self.host.remaining(),
            }
        })?;
        let device = DeviceArena::init(self.host.internal_mut(table), table, blocks);
        self.device = Some(device);
        self.log.record(&ArenaEvent::DeviceExtended {
            backend: blocks.backend,
            num_blocks: blocks.num_blocks(),
            block_capacity_bytes: blocks.block_capacity_bytes,
            table_bytes,
        });
        Ok(())
    }

    /// Whether a `bytes`-byte request on `backend` would succeed right now.
    ///
    /// Host requests fit if they do not exceed the remaining host bytes.
    /// Device requests need a device extension for that backend and a single
    /// block with enough free space; allocations never span blocks.
    pub fn can_allocate(&self, backend: Backend, bytes: usize) -> bool {
        match backend {
            Backend::Host => self.host.can_alloc(bytes),
            _ => match self.device_for(backend) {
                Some(device) => device.can_alloc(self.host.internal(device.table()), bytes),
                None => false,
            },
        }
    }

    /// Largest request on `backend` that would succeed right now.
    ///
    /// For a device backend this is the most free space in any one block,
    /// or 0 without a matching extension.
    pub fn available_bytes(&self, backend: Backend) -> usize {
        match backend {
            Backend::Host => self.host.remaining(),
            _ => self
                .device_for(backend)
                .map_or(0, |device| device.largest_free(self.host.internal(device.table()))),
        }
    }

    /// Allocate `bytes` bytes on `backend`.
    ///
    /// Host requests bump the host cursor. Device requests are served
    /// first-fit from the device pool. Fails with `OutOfArenaSpace`, leaving
    /// the arena unchanged, whenever [`can_allocate`](Self::can_allocate)
    /// would return `false`. Returned memory is not zeroed.
    pub fn allocate(&mut self, backend: Backend, bytes: usize) -> Result<Allocation, ArenaError> {
        let result = self.try_allocate(backend, bytes);
        match &result {
            Ok(allocation) => self.log.record(&ArenaEvent::Allocated {
                backend,
                bytes,
                block: allocation.device().map(|r| r.block()),
            }),
            Err(e) => self.log.record(&ArenaEvent::Failed {
                operation: "allocate",
                error: e,
            }),
        }
        result
    }

    fn try_allocate(&mut self, backend: Backend, bytes: usize) -> Result<Allocation, ArenaError> {
        match backend {
            Backend::Host => self.host.alloc(bytes).map(Allocation::Host),
            _ => {
                let device = *self.device_for(backend).ok_or(ArenaError::OutOfArenaSpace {
                    backend,
                    requested: bytes,
                    available: 0,
                })?;
                device
                    .alloc(self.host.internal_mut(device.table()), bytes)
                    .map(Allocation::Device)
            }
        }
    }

    /// Allocate `bytes` bytes from the host sub-arena.
    pub fn allocate_host(&mut self, bytes: usize) -> Result<HostRegion, ArenaError> {
        let region = self.allocate(Backend::Host, bytes)?;
        // Host requests always produce host regions.
        region.host().ok_or(ArenaError::UnsupportedBackend {
            backend: Backend::Host,
        })
    }

    /// Bytes of an allocated host region.
    pub fn host_bytes(&self, region: HostRegion) -> Result<&[u8], ArenaError> {
        self.host.bytes(region)
    }

    /// Mutable bytes of an allocated host region.
    pub fn host_bytes_mut(&mut self, region: HostRegion) -> Result<&mut [u8], ArenaError> {
        self.host.bytes_mut(region)
    }

    /// Raw pointer to the first byte of an allocated host region.
    pub fn host_ptr(&mut self, region: HostRegion) -> Result<*mut u8, ArenaError> {
        self.host.ptr_mut(region)
    }

    /// This arena's process-unique identity.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// The host sub-arena.
    pub fn host(&self) -> &HostArena<'buf> {
        &self.host
    }

    /// The device sub-arena, if one has been attached.
    pub fn device(&self) -> Option<&DeviceArena> {
        self.device.as_ref()
    }

    /// Host buffer capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.host.capacity()
    }

    /// Host bytes allocated so far, header included.
    pub fn used_bytes(&self) -> usize {
        self.host.used()
    }

    /// Bytes allocated from device block `i`.
    ///
    /// Returns `None` without a device extension or if `i` is out of range.
    pub fn device_block_used(&self, i: usize) -> Option<usize> {
        let device = self.device.as_ref()?;
        (i < device.num_blocks()).then(|| device.block_used(self.host.internal(device.table()), i))
    }

    /// The diagnostics capability this arena reports to.
    pub fn log(&self) -> &dyn ArenaLog {
        self.log.as_ref()
    }

    fn device_for(&self, backend: Backend) -> Option<&DeviceArena> {
        self.device.as_ref().filter(|d| d.backend() == backend)
    }
}

impl fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("capacity_bytes", &self.host.capacity())
            .field("used_bytes", &self.host.used())
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

//! Allocation results and their location descriptors.
//!
//! A successful [`Arena::allocate`](crate::Arena::allocate) returns an
//! [`Allocation`] telling the caller which address space the bytes live in.
//! Host and device addresses are different types, so one can never be
//! mistaken for the other.

use std::fmt;

use tessera_core::{Backend, DevicePtr};

/// A byte range inside the arena's host buffer.
///
/// Regions are plain offsets; resolve them to bytes with
/// [`Arena::host_bytes`](crate::Arena::host_bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct HostRegion {
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl HostRegion {
    /// Describe `len` bytes starting at byte `offset` of the host buffer.
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Byte offset from the start of the host buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte, or `None` on overflow.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.len)
    }

    /// The sub-region `len` bytes long starting `at` bytes into this one.
    ///
    /// Returns `None` if it would extend past this region.
    pub fn sub(&self, at: usize, len: usize) -> Option<HostRegion> {
        let end = at.checked_add(len)?;
        if end > self.len {
            return None;
        }
        Some(HostRegion::new(self.offset + at, len))
    }
}

impl fmt::Display for HostRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host[{}..{}]", self.offset, self.offset + self.len)
    }
}

/// A byte range inside one device block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct DeviceRegion {
    pub(crate) backend: Backend,
    pub(crate) block: usize,
    pub(crate) ptr: DevicePtr,
    pub(crate) len: usize,
}

impl DeviceRegion {
    /// The accelerator this region lives on.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Index of the block the region was carved from.
    pub fn block(&self) -> usize {
        self.block
    }

    /// Device address of the first byte.
    pub fn ptr(&self) -> DevicePtr {
        self.ptr
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for DeviceRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[block {}, {} +{}]",
            self.backend, self.block, self.ptr, self.len
        )
    }
}

/// The result of a successful allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub enum Allocation {
    /// Bytes in the host buffer.
    Host(HostRegion),
    /// Bytes in a device block.
    Device(DeviceRegion),
}

impl Allocation {
    /// The backend the bytes belong to.
    pub fn backend(&self) -> Backend {
        match self {
            Self::Host(_) => Backend::Host,
            Self::Device(region) => region.backend,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Host(region) => region.len,
            Self::Device(region) => region.len,
        }
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The host region, if this is a host allocation.
    pub fn host(self) -> Option<HostRegion> {
        match self {
            Self::Host(region) => Some(region),
            Self::Device(_) => None,
        }
    }

    /// The device region, if this is a device allocation.
    pub fn device(self) -> Option<DeviceRegion> {
        match self {
            Self::Host(_) => None,
            Self::Device(region) => Some(region),
        }
    }
}

//! Byte layout of tensor metadata.
//!
//! Every tensor starts with a [`TENSOR_HEADER_BYTES`]-byte header in the
//! host buffer, encoded as little-endian words:
//!
//! | offset | width | field                                           |
//! |--------|-------|-------------------------------------------------|
//! | 0      | 4     | magic `b"TNSR"`                                 |
//! | 4      | 4     | backend tag                                     |
//! | 8      | 4     | current number of dims                          |
//! | 12     | 4     | dims slots reserved                             |
//! | 16     | 8     | byte offset of the dims array                   |
//! | 24     | 8     | payload bytes reserved                          |
//! | 32     | 8     | payload location (host offset or device address)|
//! | 40     | 8     | device block index (`u64::MAX` on host)         |

use tessera_arena::raw;
use tessera_core::{Backend, ELEMENT_BYTES};

use crate::error::TensorError;

/// Size of the per-tensor header.
pub const TENSOR_HEADER_BYTES: usize = 48;

/// Bytes used to store one dimension extent.
pub const DIM_BYTES: usize = 8;

const MAGIC: u32 = u32::from_le_bytes(*b"TNSR");
const NO_BLOCK: u64 = u64::MAX;

const MAGIC_AT: usize = 0;
const BACKEND_AT: usize = 4;
const NUM_DIMS_AT: usize = 8;
const DIMS_CAPACITY_AT: usize = 12;
const DIMS_OFFSET_AT: usize = 16;
const RESERVED_AT: usize = 24;
const PAYLOAD_AT: usize = 32;
const BLOCK_AT: usize = 40;

/// Element count of `dims`, checked for overflow.
///
/// The empty shape has zero elements.
pub fn element_count(dims: &[usize]) -> Result<usize, TensorError> {
    if dims.is_empty() {
        return Ok(0);
    }
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(TensorError::SizeOverflow)
}

/// Payload bytes of `dims`: `4 × Π dims`, or 0 for the empty shape.
pub fn payload_bytes(dims: &[usize]) -> Result<usize, TensorError> {
    element_count(dims)?
        .checked_mul(ELEMENT_BYTES)
        .ok_or(TensorError::SizeOverflow)
}

/// Sizes of the regions a new tensor needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorLayout {
    /// Payload bytes.
    pub payload_bytes: usize,
    /// Bytes of the trailing dims array.
    pub dims_bytes: usize,
    /// Host bytes to request: header, dims, and the payload too for host
    /// tensors.
    pub host_bytes: usize,
}

impl TensorLayout {
    /// Compute the layout of a tensor with shape `dims` on `backend`.
    pub fn new(dims: &[usize], backend: Backend) -> Result<Self, TensorError> {
        let payload_bytes = payload_bytes(dims)?;
        let dims_bytes = dims
            .len()
            .checked_mul(DIM_BYTES)
            .ok_or(TensorError::SizeOverflow)?;
        let metadata = TENSOR_HEADER_BYTES
            .checked_add(dims_bytes)
            .ok_or(TensorError::SizeOverflow)?;
        let host_bytes = if backend.is_device() {
            metadata
        } else {
            metadata
                .checked_add(payload_bytes)
                .ok_or(TensorError::SizeOverflow)?
        };
        Ok(Self {
            payload_bytes,
            dims_bytes,
            host_bytes,
        })
    }

    /// Offset of the dims array from the start of the tensor's host region.
    ///
    /// The dims always sit at the tail of the region.
    pub fn dims_at(&self) -> usize {
        self.host_bytes - self.dims_bytes
    }
}

/// Where a tensor's payload lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadLocation {
    /// Byte offset into the host buffer.
    Host {
        /// Offset of the first payload byte.
        offset: usize,
    },
    /// Address inside a device block.
    Device {
        /// Device address of the first payload byte.
        addr: u64,
        /// Index of the block holding the payload.
        block: usize,
    },
}

/// Decoded tensor header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorHeader {
    /// Backend the payload lives on.
    pub backend: Backend,
    /// Current number of dimensions.
    pub num_dims: usize,
    /// Dimension slots reserved at creation.
    pub dims_capacity: usize,
    /// Byte offset of the dims array in the host buffer.
    pub dims_offset: usize,
    /// Payload bytes reserved at creation.
    pub reserved_bytes: usize,
    /// Payload location.
    pub payload: PayloadLocation,
}

impl TensorHeader {
    /// Encode into the first [`TENSOR_HEADER_BYTES`] of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`TENSOR_HEADER_BYTES`].
    pub fn encode(&self, buf: &mut [u8]) {
        raw::write_u32(buf, MAGIC_AT, MAGIC);
        raw::write_u32(buf, BACKEND_AT, self.backend.as_raw());
        raw::write_u32(buf, NUM_DIMS_AT, self.num_dims as u32);
        raw::write_u32(buf, DIMS_CAPACITY_AT, self.dims_capacity as u32);
        raw::write_usize(buf, DIMS_OFFSET_AT, self.dims_offset);
        raw::write_usize(buf, RESERVED_AT, self.reserved_bytes);
        match self.payload {
            PayloadLocation::Host { offset } => {
                raw::write_usize(buf, PAYLOAD_AT, offset);
                raw::write_u64(buf, BLOCK_AT, NO_BLOCK);
            }
            PayloadLocation::Device { addr, block } => {
                raw::write_u64(buf, PAYLOAD_AT, addr);
                raw::write_usize(buf, BLOCK_AT, block);
            }
        }
    }

    /// Decode a header from `buf`, which starts at byte `offset` of the
    /// host buffer (used only for error reporting).
    pub fn decode(buf: &[u8], offset: usize) -> Result<Self, TensorError> {
        if buf.len() < TENSOR_HEADER_BYTES || raw::read_u32(buf, MAGIC_AT) != MAGIC {
            return Err(TensorError::CorruptHeader { offset });
        }
        let tag = raw::read_u32(buf, BACKEND_AT);
        let backend = Backend::from_raw(tag).ok_or(TensorError::UnsupportedBackend { tag })?;
        let num_dims = raw::read_u32(buf, NUM_DIMS_AT) as usize;
        let dims_capacity = raw::read_u32(buf, DIMS_CAPACITY_AT) as usize;
        if num_dims > dims_capacity {
            return Err(TensorError::CorruptHeader { offset });
        }
        let payload = if backend.is_device() {
            PayloadLocation::Device {
                addr: raw::read_u64(buf, PAYLOAD_AT),
                block: raw::read_usize(buf, BLOCK_AT),
            }
        } else {
            PayloadLocation::Host {
                offset: raw::read_usize(buf, PAYLOAD_AT),
            }
        };
        Ok(Self {
            backend,
            num_dims,
            dims_capacity,
            dims_offset: raw::read_usize(buf, DIMS_OFFSET_AT),
            reserved_bytes: raw::read_usize(buf, RESERVED_AT),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_bytes_of_3_by_4_is_48() {
        assert_eq!(payload_bytes(&[3, 4]), Ok(48));
    }

    #[test]
    fn empty_shape_has_no_payload() {
        assert_eq!(element_count(&[]), Ok(0));
        assert_eq!(payload_bytes(&[]), Ok(0));
    }

    #[test]
    fn overflowing_shape_rejected() {
        assert_eq!(
            element_count(&[usize::MAX, 2]),
            Err(TensorError::SizeOverflow)
        );
        assert_eq!(
            payload_bytes(&[usize::MAX / 2]),
            Err(TensorError::SizeOverflow)
        );
    }

    #[test]
    fn host_layout_includes_payload() {
        let l = TensorLayout::new(&[3, 4], Backend::Host).unwrap();
        assert_eq!(l.payload_bytes, 48);
        assert_eq!(l.dims_bytes, 16);
        assert_eq!(l.host_bytes, TENSOR_HEADER_BYTES + 48 + 16);
        assert_eq!(l.dims_at(), TENSOR_HEADER_BYTES + 48);
    }

    #[test]
    fn device_layout_is_metadata_only() {
        let l = TensorLayout::new(&[3, 4], Backend::Rocm).unwrap();
        assert_eq!(l.host_bytes, TENSOR_HEADER_BYTES + 16);
        assert_eq!(l.dims_at(), TENSOR_HEADER_BYTES);
    }

    #[test]
    fn header_round_trip_host_and_device() {
        let headers = [
            TensorHeader {
                backend: Backend::Host,
                num_dims: 2,
                dims_capacity: 2,
                dims_offset: 200,
                reserved_bytes: 48,
                payload: PayloadLocation::Host { offset: 112 },
            },
            TensorHeader {
                backend: Backend::Cuda,
                num_dims: 1,
                dims_capacity: 3,
                dims_offset: 64,
                reserved_bytes: 4096,
                payload: PayloadLocation::Device {
                    addr: 0x7f00_0000_1000,
                    block: 2,
                },
            },
        ];
        for h in headers {
            let mut buf = [0u8; TENSOR_HEADER_BYTES];
            h.encode(&mut buf);
            assert_eq!(TensorHeader::decode(&buf, 0), Ok(h));
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        let buf = [0u8; TENSOR_HEADER_BYTES];
        assert_eq!(
            TensorHeader::decode(&buf, 16),
            Err(TensorError::CorruptHeader { offset: 16 })
        );
    }

    #[test]
    fn decode_rejects_unknown_backend() {
        let mut buf = [0u8; TENSOR_HEADER_BYTES];
        raw::write_u32(&mut buf, MAGIC_AT, MAGIC);
        raw::write_u32(&mut buf, BACKEND_AT, 9);
        assert_eq!(
            TensorHeader::decode(&buf, 0),
            Err(TensorError::UnsupportedBackend { tag: 9 })
        );
    }
}

//! Tensor creation, accessors and reshaping.

use std::fmt;

use tessera_arena::{Arena, ArenaError, ArenaEvent, HostRegion};
use tessera_core::{ArenaId, Backend, Dims, DevicePtr, ELEMENT_BYTES};

use crate::data::{decode_f32s, encode_f32s, TensorData};
use crate::error::TensorError;
use crate::layout::{
    element_count, payload_bytes, PayloadLocation, TensorHeader, TensorLayout, DIM_BYTES,
    TENSOR_HEADER_BYTES,
};

/// Handle to a tensor stored in an [`Arena`].
///
/// The handle is the offset of the tensor's header in the arena's host
/// buffer, tagged with the [`ArenaId`] of the arena that created it. Every
/// accessor takes that arena and fails with `WrongArena` given any other.
/// Handles from different arenas never compare equal.
///
/// `dims[0]` is the slowest-varying axis and `dims[n - 1]` the contiguous
/// one, so a matrix is `[rows, cols]` in row-major order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub struct Tensor {
    arena: ArenaId,
    offset: usize,
}

impl Tensor {
    /// Allocate a tensor of shape `dims` on `backend`.
    ///
    /// Host tensors are one host allocation holding header, payload and
    /// dims. Device tensors keep header and dims in the host buffer and take
    /// the payload from the device pool. Both allocations are checked before
    /// either is made, so a device tensor that does not fit consumes nothing.
    ///
    /// Payload contents are not initialised.
    pub fn create(arena: &mut Arena<'_>, dims: &[usize], backend: Backend) -> Result<Self, TensorError> {
        let result = Self::try_create(arena, dims, backend);
        if let Err(e) = &result {
            arena.log().record(&ArenaEvent::Failed {
                operation: "create_tensor",
                error: e,
            });
        }
        result
    }

    fn try_create(arena: &mut Arena<'_>, dims: &[usize], backend: Backend) -> Result<Self, TensorError> {
        if dims.is_empty() {
            return Err(TensorError::ZeroDimensions);
        }
        if u32::try_from(dims.len()).is_err() {
            return Err(TensorError::SizeOverflow);
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(TensorError::ZeroExtent { axis });
        }
        let layout = TensorLayout::new(dims, backend)?;

        // Checked up front so a device miss leaves the host untouched.
        if backend.is_device() && !arena.can_allocate(backend, layout.payload_bytes) {
            return Err(ArenaError::OutOfArenaSpace {
                backend,
                requested: layout.payload_bytes,
                available: arena.available_bytes(backend),
            }
            .into());
        }

        let region = arena.allocate_host(layout.host_bytes)?;
        let payload = if backend.is_device() {
            let device = arena
                .allocate(backend, layout.payload_bytes)?
                .device()
                .ok_or(TensorError::UnsupportedBackend {
                    tag: backend.as_raw(),
                })?;
            PayloadLocation::Device {
                addr: device.ptr().addr(),
                block: device.block(),
            }
        } else {
            PayloadLocation::Host {
                offset: region.offset() + TENSOR_HEADER_BYTES,
            }
        };

        let header = TensorHeader {
            backend,
            num_dims: dims.len(),
            dims_capacity: dims.len(),
            dims_offset: region.offset() + layout.dims_at(),
            reserved_bytes: layout.payload_bytes,
            payload,
        };
        let bytes = arena.host_bytes_mut(region)?;
        header.encode(&mut bytes[..TENSOR_HEADER_BYTES]);
        write_dims(&mut bytes[layout.dims_at()..], dims);

        Ok(Self {
            arena: arena.id(),
            offset: region.offset(),
        })
    }

    /// Rebuild a handle in `arena` from a header offset previously
    /// returned by [`offset`](Self::offset).
    ///
    /// The offset is validated lazily: accessors fail with `CorruptHeader`
    /// if no tensor lives there.
    pub fn from_offset(arena: &Arena<'_>, offset: usize) -> Self {
        Self {
            arena: arena.id(),
            offset,
        }
    }

    /// The arena this handle belongs to.
    pub fn arena_id(&self) -> ArenaId {
        self.arena
    }

    /// Offset of this tensor's header in the host buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decode this tensor's header.
    pub fn header(&self, arena: &Arena<'_>) -> Result<TensorHeader, TensorError> {
        if self.arena != arena.id() {
            return Err(TensorError::WrongArena {
                tensor_arena: self.arena,
                arena: arena.id(),
            });
        }
        let bytes = arena
            .host_bytes(self.header_region())
            .map_err(|_| TensorError::CorruptHeader {
                offset: self.offset,
            })?;
        TensorHeader::decode(bytes, self.offset)
    }

    /// The backend this tensor's payload lives on.
    pub fn backend(&self, arena: &Arena<'_>) -> Result<Backend, TensorError> {
        Ok(self.header(arena)?.backend)
    }

    /// The current shape.
    pub fn dims(&self, arena: &Arena<'_>) -> Result<Dims, TensorError> {
        let header = self.header(arena)?;
        self.read_dims(arena, &header)
    }

    /// Number of elements in the current shape (0 for the empty shape).
    pub fn element_count(&self, arena: &Arena<'_>) -> Result<usize, TensorError> {
        element_count(&self.dims(arena)?)
    }

    /// Payload size in bytes for the current shape: `4 × Π dims`, or 0 when
    /// the tensor has no dimensions.
    pub fn size(&self, arena: &Arena<'_>) -> Result<usize, TensorError> {
        payload_bytes(&self.dims(arena)?)
    }

    /// Payload bytes reserved when the tensor was created.
    pub fn reserved_bytes(&self, arena: &Arena<'_>) -> Result<usize, TensorError> {
        Ok(self.header(arena)?.reserved_bytes)
    }

    /// Where the payload lives, sized for the current shape.
    pub fn data(&self, arena: &Arena<'_>) -> Result<TensorData, TensorError> {
        let header = self.header(arena)?;
        let len = payload_bytes(&self.read_dims(arena, &header)?)?;
        Ok(match header.payload {
            PayloadLocation::Host { offset } => TensorData::Host(HostRegion::new(offset, len)),
            PayloadLocation::Device { addr, .. } => TensorData::Device {
                backend: header.backend,
                ptr: DevicePtr::new(addr),
                len,
            },
        })
    }

    /// Reinterpret the payload with a new shape, in place.
    ///
    /// Nothing moves. The new shape may have at most as many dimensions as
    /// the tensor was created with and may not need more payload than was
    /// reserved. An empty `dims` leaves a tensor of size 0.
    pub fn set_dims(&self, arena: &mut Arena<'_>, dims: &[usize]) -> Result<Self, TensorError> {
        let result = self.try_set_dims(arena, dims);
        if let Err(e) = &result {
            arena.log().record(&ArenaEvent::Failed {
                operation: "set_dims",
                error: e,
            });
        }
        result
    }

    fn try_set_dims(&self, arena: &mut Arena<'_>, dims: &[usize]) -> Result<Self, TensorError> {
        let mut header = self.header(arena)?;
        if dims.len() > header.dims_capacity {
            return Err(TensorError::DimsCapacityExceeded {
                requested: dims.len(),
                capacity: header.dims_capacity,
            });
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(TensorError::ZeroExtent { axis });
        }
        let requested_bytes = payload_bytes(dims)?;
        if requested_bytes > header.reserved_bytes {
            return Err(TensorError::ReshapeExceedsStorage {
                requested_bytes,
                reserved_bytes: header.reserved_bytes,
            });
        }

        header.num_dims = dims.len();
        let dims_region = HostRegion::new(header.dims_offset, dims.len() * DIM_BYTES);
        write_dims(arena.host_bytes_mut(dims_region)?, dims);
        header.encode(arena.host_bytes_mut(self.header_region())?);
        Ok(*self)
    }

    /// Copy the payload out as `f32`s. Host tensors only.
    pub fn read_host(&self, arena: &Arena<'_>) -> Result<Vec<f32>, TensorError> {
        let region = self.host_payload(arena)?;
        Ok(decode_f32s(arena.host_bytes(region)?))
    }

    /// Overwrite the payload with `values`. Host tensors only.
    ///
    /// `values` must hold exactly [`element_count`](Self::element_count)
    /// elements.
    pub fn write_host(&self, arena: &mut Arena<'_>, values: &[f32]) -> Result<(), TensorError> {
        let region = self.host_payload(arena)?;
        let expected = region.len() / ELEMENT_BYTES;
        if values.len() != expected {
            return Err(TensorError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        encode_f32s(values, arena.host_bytes_mut(region)?);
        Ok(())
    }

    fn host_payload(&self, arena: &Arena<'_>) -> Result<HostRegion, TensorError> {
        match self.data(arena)? {
            TensorData::Host(region) => Ok(region),
            TensorData::Device { backend, .. } => Err(TensorError::NotHostResident { backend }),
        }
    }

    fn read_dims(&self, arena: &Arena<'_>, header: &TensorHeader) -> Result<Dims, TensorError> {
        let region = HostRegion::new(header.dims_offset, header.num_dims * DIM_BYTES);
        let bytes = arena
            .host_bytes(region)
            .map_err(|_| TensorError::CorruptHeader {
                offset: self.offset,
            })?;
        Ok((0..header.num_dims)
            .map(|i| tessera_arena::raw::read_usize(bytes, i * DIM_BYTES))
            .collect())
    }

    fn header_region(&self) -> HostRegion {
        HostRegion::new(self.offset, TENSOR_HEADER_BYTES)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({}@{})", self.arena, self.offset)
    }
}

fn write_dims(bytes: &mut [u8], dims: &[usize]) {
    for (i, &d) in dims.iter().enumerate() {
        tessera_arena::raw::write_usize(bytes, i * DIM_BYTES, d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arena::{DeviceBlocks, SilentLog};

    fn arena(buf: &mut [u8]) -> Arena<'_> {
        Arena::with_log(buf, SilentLog).unwrap()
    }

    #[test]
    fn host_tensor_is_one_contiguous_region() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let before = a.used_bytes();
        let t = Tensor::create(&mut a, &[3, 4], Backend::Host).unwrap();
        assert_eq!(t.offset(), before);
        assert_eq!(a.used_bytes() - before, TENSOR_HEADER_BYTES + 48 + 16);

        let header = t.header(&a).unwrap();
        assert_eq!(header.dims_offset, before + TENSOR_HEADER_BYTES + 48);
        assert_eq!(
            header.payload,
            PayloadLocation::Host {
                offset: before + TENSOR_HEADER_BYTES
            }
        );
    }

    #[test]
    fn size_of_3_by_4_is_48() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let t = Tensor::create(&mut a, &[3, 4], Backend::Host).unwrap();
        assert_eq!(t.size(&a), Ok(48));
        assert_eq!(t.element_count(&a), Ok(12));
        assert_eq!(t.dims(&a).unwrap().as_slice(), &[3, 4]);
    }

    #[test]
    fn zero_dimensions_rejected() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let used = a.used_bytes();
        assert_eq!(
            Tensor::create(&mut a, &[], Backend::Host),
            Err(TensorError::ZeroDimensions)
        );
        assert_eq!(a.used_bytes(), used);
    }

    #[test]
    fn zero_extent_rejected() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        assert_eq!(
            Tensor::create(&mut a, &[2, 0, 3], Backend::Host),
            Err(TensorError::ZeroExtent { axis: 1 })
        );
    }

    #[test]
    fn device_tensor_splits_metadata_and_payload() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let blocks = [DevicePtr::new(0x9000_0000)];
        a.extend_with_device_blocks(DeviceBlocks::new(Backend::Rocm, &blocks, 4096))
            .unwrap();
        let before = a.used_bytes();
        let t = Tensor::create(&mut a, &[2, 8], Backend::Rocm).unwrap();
        assert_eq!(a.used_bytes() - before, TENSOR_HEADER_BYTES + 16);
        assert_eq!(a.device_block_used(0), Some(64));
        assert_eq!(
            t.data(&a),
            Ok(TensorData::Device {
                backend: Backend::Rocm,
                ptr: DevicePtr::new(0x9000_0000),
                len: 64,
            })
        );
    }

    #[test]
    fn device_tensor_that_does_not_fit_consumes_no_host_bytes() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let blocks = [DevicePtr::new(0x9000_0000)];
        a.extend_with_device_blocks(DeviceBlocks::new(Backend::Cuda, &blocks, 16))
            .unwrap();
        let used = a.used_bytes();
        let err = Tensor::create(&mut a, &[5], Backend::Cuda).unwrap_err();
        assert!(matches!(
            err,
            TensorError::Arena(tessera_arena::ArenaError::OutOfArenaSpace { .. })
        ));
        assert_eq!(a.used_bytes(), used);
    }

    #[test]
    fn write_then_read_host_payload() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let t = Tensor::create(&mut a, &[2, 2], Backend::Host).unwrap();
        t.write_host(&mut a, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.read_host(&a).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            t.write_host(&mut a, &[1.0]),
            Err(TensorError::LengthMismatch {
                expected: 4,
                actual: 1
            })
        );
    }

    #[test]
    fn set_dims_shrinks_in_place() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let t = Tensor::create(&mut a, &[4, 6], Backend::Host).unwrap();
        let data_before = t.data(&a).unwrap().host().unwrap().offset();
        let used = a.used_bytes();
        let t = t.set_dims(&mut a, &[24]).unwrap();
        assert_eq!(t.dims(&a).unwrap().as_slice(), &[24]);
        let t = t.set_dims(&mut a, &[3, 2]).unwrap();
        assert_eq!(t.dims(&a).unwrap().as_slice(), &[3, 2]);
        assert_eq!(t.size(&a), Ok(24));
        assert_eq!(t.reserved_bytes(&a), Ok(96));
        assert_eq!(t.data(&a).unwrap().host().unwrap().offset(), data_before);
        assert_eq!(a.used_bytes(), used);
    }

    #[test]
    fn set_dims_empty_gives_zero_size() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let t = Tensor::create(&mut a, &[3], Backend::Host).unwrap();
        let t = t.set_dims(&mut a, &[]).unwrap();
        assert!(t.dims(&a).unwrap().is_empty());
        assert_eq!(t.size(&a), Ok(0));
    }

    #[test]
    fn set_dims_beyond_reservation_rejected() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let t = Tensor::create(&mut a, &[2, 2], Backend::Host).unwrap();
        assert_eq!(
            t.set_dims(&mut a, &[5]),
            Err(TensorError::ReshapeExceedsStorage {
                requested_bytes: 20,
                reserved_bytes: 16
            })
        );
        assert_eq!(
            t.set_dims(&mut a, &[1, 1, 4]),
            Err(TensorError::DimsCapacityExceeded {
                requested: 3,
                capacity: 2
            })
        );
        assert_eq!(t.dims(&a).unwrap().as_slice(), &[2, 2]);
    }

    #[test]
    fn bogus_handle_is_corrupt() {
        let mut buf = vec![0u8; 1024];
        let mut a = arena(&mut buf);
        let _scratch = a.allocate_host(100).unwrap();
        assert!(matches!(
            Tensor::from_offset(&a, 20).dims(&a),
            Err(TensorError::CorruptHeader { offset: 20 })
        ));
        assert!(matches!(
            Tensor::from_offset(&a, 4000).size(&a),
            Err(TensorError::CorruptHeader { offset: 4000 })
        ));
    }
}

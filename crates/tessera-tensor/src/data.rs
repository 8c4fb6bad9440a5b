//! Backend-tagged payload locations.

use std::fmt;

use tessera_arena::HostRegion;
use tessera_core::{Backend, DevicePtr};

/// Where a tensor's payload lives, as returned by
/// [`Tensor::data`](crate::Tensor::data).
///
/// Host and device payloads are different variants; a host region can never
/// compare equal to a device address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorData {
    /// Inline payload in the arena's host buffer.
    Host(HostRegion),
    /// Payload inside a device block.
    Device {
        /// Accelerator holding the payload.
        backend: Backend,
        /// Address of the first payload byte.
        ptr: DevicePtr,
        /// Payload length in bytes for the current shape.
        len: usize,
    },
}

impl TensorData {
    /// The backend the payload lives on.
    pub fn backend(&self) -> Backend {
        match self {
            Self::Host(_) => Backend::Host,
            Self::Device { backend, .. } => *backend,
        }
    }

    /// Payload length in bytes for the current shape.
    pub fn len(&self) -> usize {
        match self {
            Self::Host(region) => region.len(),
            Self::Device { len, .. } => *len,
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The host region, for host tensors.
    pub fn host(&self) -> Option<HostRegion> {
        match self {
            Self::Host(region) => Some(*region),
            Self::Device { .. } => None,
        }
    }

    /// The device address, for device tensors.
    pub fn device_ptr(&self) -> Option<DevicePtr> {
        match self {
            Self::Host(_) => None,
            Self::Device { ptr, .. } => Some(*ptr),
        }
    }
}

impl fmt::Display for TensorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(region) => write!(f, "{region}"),
            Self::Device { backend, ptr, len } => write!(f, "{backend}[{ptr} +{len}]"),
        }
    }
}

/// Decode little-endian `f32`s from `bytes`.
///
/// Trailing bytes that do not make up a whole element are ignored.
pub fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Encode `values` as little-endian `f32`s into `bytes`.
///
/// Writes `min(values.len(), bytes.len() / 4)` elements.
pub fn encode_f32s(values: &[f32], bytes: &mut [u8]) {
    for (chunk, v) in bytes.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
}

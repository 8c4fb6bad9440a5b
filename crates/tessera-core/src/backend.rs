//! Memory/compute backends.

use std::fmt;

/// The memory domain a buffer lives in.
///
/// `Host` buffers are bump-allocated from the caller's byte buffer. Every
/// other variant is an accelerator whose memory is handed to the arena as
/// fixed-size blocks and allocated first-fit.
///
/// The discriminants are stable: they are written into tensor headers and
/// cross the C boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Backend {
    /// Host (CPU) memory.
    Host = 0,
    /// AMD GPU memory (Radeon Open Compute).
    Rocm = 1,
    /// NVIDIA GPU memory.
    Cuda = 2,
}

impl Backend {
    /// Every backend, in tag order.
    pub const ALL: [Backend; 3] = [Backend::Host, Backend::Rocm, Backend::Cuda];

    /// Decode a raw tag. Returns `None` for unknown tags.
    pub fn from_raw(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Host),
            1 => Some(Self::Rocm),
            2 => Some(Self::Cuda),
            _ => None,
        }
    }

    /// The stable numeric tag for this backend.
    pub fn as_raw(self) -> u32 {
        self as u32
    }

    /// Whether payloads for this backend live in accelerator memory.
    pub fn is_device(self) -> bool {
        !matches!(self, Self::Host)
    }

    /// Short lowercase name, used in log fields.
    pub fn name(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Rocm => "rocm",
            Self::Cuda => "cuda",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_tags_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(Backend::from_raw(backend.as_raw()), Some(backend));
        }
    }

    #[test]
    fn tags_are_stable() {
        assert_eq!(Backend::Host.as_raw(), 0);
        assert_eq!(Backend::Rocm.as_raw(), 1);
        assert_eq!(Backend::Cuda.as_raw(), 2);
    }

    #[test]
    fn unknown_tag_is_none() {
        assert_eq!(Backend::from_raw(3), None);
        assert_eq!(Backend::from_raw(u32::MAX), None);
    }

    #[test]
    fn only_host_is_not_device() {
        assert!(!Backend::Host.is_device());
        assert!(Backend::Rocm.is_device());
        assert!(Backend::Cuda.is_device());
    }
}

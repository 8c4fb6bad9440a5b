//! Opaque accelerator addresses.
//!
//! Device memory is never dereferenced by Tessera. A [`DevicePtr`] is the
//! address the vendor runtime handed back from its allocation call, stored
//! as a `u64` so it can be copied into host-side metadata and compared
//! without touching raw pointers.

use std::ffi::c_void;
use std::fmt;

/// An address in accelerator memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevicePtr(u64);

impl DevicePtr {
    /// The null device address.
    pub const NULL: DevicePtr = DevicePtr(0);

    /// Wrap a raw address.
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Wrap a pointer returned by a vendor allocation call.
    pub fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr as usize as u64)
    }

    /// The address as a pointer suitable for passing back to a vendor API.
    pub fn as_raw(self) -> *mut c_void {
        self.0 as usize as *mut c_void
    }

    /// The numeric address.
    pub const fn addr(self) -> u64 {
        self.0
    }

    /// Whether this is the null address.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The address `bytes` past this one, or `None` on overflow.
    pub fn checked_add(self, bytes: usize) -> Option<Self> {
        let bytes = u64::try_from(bytes).ok()?;
        self.0.checked_add(bytes).map(Self)
    }
}

impl fmt::Debug for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevicePtr({:#x})", self.0)
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for DevicePtr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn null_is_null() {
        assert!(DevicePtr::NULL.is_null());
        assert!(DevicePtr::from_raw(std::ptr::null_mut()).is_null());
        assert!(!DevicePtr::new(0x1000).is_null());
    }

    #[test]
    fn checked_add_overflow_is_none() {
        assert_eq!(DevicePtr::new(u64::MAX).checked_add(1), None);
        assert_eq!(
            DevicePtr::new(0x1000).checked_add(0x10),
            Some(DevicePtr::new(0x1010))
        );
    }

    #[test]
    fn debug_prints_hex() {
        assert_eq!(format!("{:?}", DevicePtr::new(255)), "DevicePtr(0xff)");
    }

    proptest! {
        #[test]
        fn raw_pointer_round_trip(addr in 1usize..usize::MAX) {
            let ptr = DevicePtr::from_raw(addr as *mut c_void);
            prop_assert_eq!(ptr.as_raw() as usize, addr);
        }
    }
}

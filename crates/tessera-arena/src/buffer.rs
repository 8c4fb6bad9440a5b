//! Raw view of the caller's host buffer.
//!
//! The buffer is held as a base pointer and a length, not a `&mut [u8]`.
//! References are only ever created over the bytes one operation touches,
//! so a pointer handed out for one region stays valid while other regions
//! are read and written.
//!
//! This is the only module in the crate allowed to contain `unsafe`.

#![allow(unsafe_code)]

use std::marker::PhantomData;
use std::ops::Range;
use std::ptr::NonNull;

/// An exclusive borrow of `[u8]` for `'buf`, stored unpacked.
pub(crate) struct HostBuffer<'buf> {
    base: NonNull<u8>,
    len: usize,
    _borrow: PhantomData<&'buf mut [u8]>,
}

// SAFETY: a HostBuffer is semantically a `&'buf mut [u8]`, which is both
// Send and Sync. All access goes through `&self`/`&mut self`.
unsafe impl Send for HostBuffer<'_> {}
// SAFETY: see above.
unsafe impl Sync for HostBuffer<'_> {}

impl<'buf> HostBuffer<'buf> {
    pub(crate) fn new(buf: &'buf mut [u8]) -> Self {
        let len = buf.len();
        Self {
            base: NonNull::from(buf).cast::<u8>(),
            len,
            _borrow: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Shared view of `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is not inside the buffer.
    pub(crate) fn slice(&self, range: Range<usize>) -> &[u8] {
        self.check(&range);
        // SAFETY: `range` is inside the buffer, which is borrowed for 'buf.
        // `&self` rules out a live reference from `slice_mut`.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr().add(range.start), range.len()) }
    }

    /// Exclusive view of `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is not inside the buffer.
    pub(crate) fn slice_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        self.check(&range);
        // SAFETY: as in `slice`; `&mut self` makes this the only live
        // reference into the buffer.
        unsafe { std::slice::from_raw_parts_mut(self.base.as_ptr().add(range.start), range.len()) }
    }

    /// Pointer to byte `offset`, derived from the base pointer rather than
    /// from a reference.
    pub(crate) fn ptr_at(&mut self, offset: usize) -> *mut u8 {
        self.base.as_ptr().wrapping_add(offset)
    }

    fn check(&self, range: &Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "range {range:?} outside {}-byte buffer",
            self.len
        );
    }
}

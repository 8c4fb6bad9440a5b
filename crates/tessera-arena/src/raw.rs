//! Low-level primitives for reading and writing metadata words.
//!
//! All metadata Tessera stores inside the host buffer (arena header, device
//! block table, tensor headers and dims) is encoded as little-endian words
//! at arbitrary byte offsets. Words are copied through byte slices, so
//! offsets need no alignment.

/// Read a little-endian `u32` at byte offset `at`.
///
/// # Panics
///
/// Panics if `at + 4` exceeds `buf.len()`.
pub fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(word)
}

/// Write a little-endian `u32` at byte offset `at`.
///
/// # Panics
///
/// Panics if `at + 4` exceeds `buf.len()`.
pub fn write_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Read a little-endian `u64` at byte offset `at`.
///
/// # Panics
///
/// Panics if `at + 8` exceeds `buf.len()`.
pub fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(word)
}

/// Write a little-endian `u64` at byte offset `at`.
///
/// # Panics
///
/// Panics if `at + 8` exceeds `buf.len()`.
pub fn write_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

/// Read a `usize` stored as a little-endian `u64`.
///
/// Values that do not fit in `usize` saturate to `usize::MAX`, which every
/// caller treats as out of range.
pub fn read_usize(buf: &[u8], at: usize) -> usize {
    usize::try_from(read_u64(buf, at)).unwrap_or(usize::MAX)
}

/// Write a `usize` as a little-endian `u64`.
pub fn write_usize(buf: &mut [u8], at: usize, value: usize) {
    write_u64(buf, at, value as u64);
}

//! Test utilities and fixtures for Tessera development.
//!
//! Provides host buffers filled with a recognisable pattern, fake device
//! block lists (addresses that are never dereferenced), a recording
//! [`ArenaLog`] and, in [`fixtures`], a recording GEMM kernel.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use tessera_arena::{ArenaEvent, ArenaLog};
use tessera_core::DevicePtr;

/// Byte every fresh test buffer is filled with.
///
/// Arenas never zero memory, so tests that forget to initialise a payload
/// see this pattern instead of a lucky zero.
pub const FILL_BYTE: u8 = 0xCD;

/// Base address of the first fake device block.
pub const FAKE_DEVICE_BASE: u64 = 0x7f00_0000_0000;

/// A host buffer of `len` bytes filled with [`FILL_BYTE`].
pub fn host_buffer(len: usize) -> Vec<u8> {
    vec![FILL_BYTE; len]
}

/// `count` fake device block addresses, `stride` bytes apart, starting at
/// [`FAKE_DEVICE_BASE`].
pub fn fake_device_blocks(count: usize, stride: u64) -> Vec<DevicePtr> {
    (0..count as u64)
        .map(|i| DevicePtr::new(FAKE_DEVICE_BASE + i * stride))
        .collect()
}

/// An [`ArenaLog`] that keeps every event as a line of text.
///
/// Clones share the same record, so keep one clone and hand the other to
/// the arena.
#[derive(Clone, Debug, Default)]
pub struct RecordingLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Only the failure lines.
    pub fn failures(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with("failed "))
            .collect()
    }

    /// Whether any failure of `operation` was recorded.
    pub fn failed(&self, operation: &str) -> bool {
        let prefix = format!("failed {operation}:");
        self.lines().iter().any(|l| l.starts_with(&prefix))
    }
}

impl ArenaLog for RecordingLog {
    fn record(&self, event: &ArenaEvent<'_>) {
        let line = match *event {
            ArenaEvent::Created { capacity_bytes } => format!("created {capacity_bytes}"),
            ArenaEvent::DeviceExtended {
                backend,
                num_blocks,
                block_capacity_bytes,
                ..
            } => format!("extended {backend} {num_blocks}x{block_capacity_bytes}"),
            ArenaEvent::Allocated {
                backend,
                bytes,
                block: Some(block),
            } => format!("allocated {backend} {bytes} block {block}"),
            ArenaEvent::Allocated { backend, bytes, .. } => {
                format!("allocated {backend} {bytes}")
            }
            ArenaEvent::Failed { operation, error } => format!("failed {operation}: {error}"),
        };
        self.lines.lock().unwrap().push(line);
    }
}

//! C-compatible status codes and the per-thread last status.
//!
//! Every exported function returns an absent sentinel (0, null or `false`)
//! on failure and records why in a thread-local slot, read back with
//! [`tessera_last_status`].

use std::cell::Cell;

use tessera_arena::ArenaError;
use tessera_dispatch::{DispatchError, KernelError};
use tessera_tensor::TensorError;

/// C-compatible status code.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TesseraStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid or was already released.
    InvalidHandle = -1,
    /// A required pointer argument was null.
    NullInput = -2,
    /// The host buffer pointer was null.
    NullBuffer = -3,
    /// The host buffer is below the minimum arena size, or a caller-provided
    /// output buffer is too small.
    BufferTooSmall = -4,
    /// No sub-arena can satisfy the request.
    OutOfArenaSpace = -5,
    /// The device block table does not fit in the host buffer.
    InsufficientHostCapacity = -6,
    /// The arena already has a device extension.
    AlreadyExtended = -7,
    /// Unknown backend tag, or no support for that backend here.
    UnsupportedBackend = -8,
    /// A tensor must have at least one dimension.
    ZeroDimensions = -9,
    /// A dimension has extent zero.
    ZeroExtent = -10,
    /// The tensor size overflows.
    SizeOverflow = -11,
    /// A reshape exceeds the dims slots or payload reserved at creation.
    ReshapeExceedsStorage = -12,
    /// Operand shapes are incompatible.
    ShapeMismatch = -13,
    /// Operands live on different backends.
    BackendMismatch = -14,
    /// The result tensor aliases an operand.
    AliasingViolation = -15,
    /// A kernel failed.
    KernelFailed = -16,
    /// Tensor metadata is unreadable.
    CorruptTensor = -17,
    /// Tensors passed together belong to different arenas.
    ArenaMismatch = -18,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -19,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&ArenaError> for TesseraStatus {
    fn from(e: &ArenaError) -> Self {
        match e {
            ArenaError::NullBuffer => TesseraStatus::NullBuffer,
            ArenaError::NullInput { .. } => TesseraStatus::NullInput,
            ArenaError::BufferTooSmall { .. } => TesseraStatus::BufferTooSmall,
            ArenaError::OutOfArenaSpace { .. } => TesseraStatus::OutOfArenaSpace,
            ArenaError::InsufficientHostCapacity { .. } => {
                TesseraStatus::InsufficientHostCapacity
            }
            ArenaError::AlreadyExtended { .. } => TesseraStatus::AlreadyExtended,
            ArenaError::UnsupportedBackend { .. } => TesseraStatus::UnsupportedBackend,
            ArenaError::RegionOutOfBounds { .. } => TesseraStatus::InternalError,
        }
    }
}

impl From<&TensorError> for TesseraStatus {
    fn from(e: &TensorError) -> Self {
        match e {
            TensorError::NullInput => TesseraStatus::NullInput,
            TensorError::ZeroDimensions => TesseraStatus::ZeroDimensions,
            TensorError::ZeroExtent { .. } => TesseraStatus::ZeroExtent,
            TensorError::SizeOverflow => TesseraStatus::SizeOverflow,
            TensorError::UnsupportedBackend { .. } => TesseraStatus::UnsupportedBackend,
            TensorError::WrongArena { .. } => TesseraStatus::ArenaMismatch,
            TensorError::CorruptHeader { .. } => TesseraStatus::CorruptTensor,
            TensorError::DimsCapacityExceeded { .. }
            | TensorError::ReshapeExceedsStorage { .. } => TesseraStatus::ReshapeExceedsStorage,
            TensorError::NotHostResident { .. } => TesseraStatus::UnsupportedBackend,
            TensorError::LengthMismatch { .. } => TesseraStatus::ShapeMismatch,
            TensorError::Arena(inner) => TesseraStatus::from(inner),
        }
    }
}

impl From<&KernelError> for TesseraStatus {
    fn from(_e: &KernelError) -> Self {
        TesseraStatus::KernelFailed
    }
}

impl From<&DispatchError> for TesseraStatus {
    fn from(e: &DispatchError) -> Self {
        match e {
            DispatchError::ShapeMismatch { .. } => TesseraStatus::ShapeMismatch,
            DispatchError::BackendMismatch { .. } => TesseraStatus::BackendMismatch,
            DispatchError::AliasingViolation => TesseraStatus::AliasingViolation,
            DispatchError::UnsupportedBackend { .. } => TesseraStatus::UnsupportedBackend,
            DispatchError::Tensor(inner) => TesseraStatus::from(inner),
            DispatchError::Kernel(inner) => TesseraStatus::from(inner),
        }
    }
}

impl From<ArenaError> for TesseraStatus {
    fn from(e: ArenaError) -> Self {
        TesseraStatus::from(&e)
    }
}

impl From<TensorError> for TesseraStatus {
    fn from(e: TensorError) -> Self {
        TesseraStatus::from(&e)
    }
}

impl From<DispatchError> for TesseraStatus {
    fn from(e: DispatchError) -> Self {
        TesseraStatus::from(&e)
    }
}

thread_local! {
    static LAST_STATUS: Cell<TesseraStatus> = const { Cell::new(TesseraStatus::Ok) };
}

/// Record `outcome` as this thread's last status and unwrap it, substituting
/// `absent` on failure.
pub(crate) fn finish<T>(outcome: Result<T, TesseraStatus>, absent: T) -> T {
    match outcome {
        Ok(value) => {
            LAST_STATUS.with(|s| s.set(TesseraStatus::Ok));
            value
        }
        Err(status) => {
            LAST_STATUS.with(|s| s.set(status));
            absent
        }
    }
}

/// Status of the most recent call on this thread.
///
/// `0` after a success, a negative [`TesseraStatus`] otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tessera_last_status() -> i32 {
    LAST_STATUS.with(|s| s.get()) as i32
}

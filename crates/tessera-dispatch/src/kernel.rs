//! The kernel seam.

use tessera_arena::Arena;
use tessera_core::Backend;
use tessera_tensor::TensorData;

use crate::error::KernelError;

/// One validated single-precision GEMM: `c = a × b`.
///
/// All matrices are row-major. `a` is `m × k`, `b` is `k × n` and `c` is
/// `m × n`. The dispatcher only builds jobs whose operands agree on shape
/// and backend and whose result aliases neither operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GemmJob {
    /// Backend every operand lives on.
    pub backend: Backend,
    /// Rows of `a` and `c`.
    pub m: usize,
    /// Columns of `b` and `c`.
    pub n: usize,
    /// Columns of `a`, rows of `b`.
    pub k: usize,
    /// Left operand.
    pub a: TensorData,
    /// Right operand.
    pub b: TensorData,
    /// Result.
    pub c: TensorData,
}

/// A matrix multiply implementation for one backend.
///
/// Device kernels receive raw [`DevicePtr`](tessera_core::DevicePtr)s in
/// the job and never need the arena; host kernels read and write the
/// payload through it.
pub trait GemmKernel: Send {
    /// The backend this kernel serves.
    fn backend(&self) -> Backend;

    /// Run `job`. Errors are returned as-is; nothing is retried.
    fn sgemm(&self, arena: &mut Arena<'_>, job: &GemmJob) -> Result<(), KernelError>;
}

//! Reusable kernel fixtures.
//!
//! - [`RecordingKernel`] counts invocations and keeps the jobs it was
//!   given, optionally failing each one.

use std::sync::{Arc, Mutex};

use tessera_arena::Arena;
use tessera_core::Backend;
use tessera_dispatch::{GemmJob, GemmKernel, KernelError};

/// A GEMM kernel that does no arithmetic and remembers every job.
///
/// Clones share the job list, so a test can register one clone with a
/// dispatcher and inspect the other.
#[derive(Clone, Debug)]
pub struct RecordingKernel {
    pub backend: Backend,
    jobs: Arc<Mutex<Vec<GemmJob>>>,
    fail_with: Option<KernelError>,
}

impl RecordingKernel {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            jobs: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// A kernel that records the job and then returns `error`.
    pub fn failing(backend: Backend, error: KernelError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(backend)
        }
    }

    /// Number of times `sgemm` ran.
    pub fn calls(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    /// Jobs received so far, in order.
    pub fn jobs(&self) -> Vec<GemmJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl GemmKernel for RecordingKernel {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn sgemm(&self, _arena: &mut Arena<'_>, job: &GemmJob) -> Result<(), KernelError> {
        self.jobs.lock().unwrap().push(*job);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

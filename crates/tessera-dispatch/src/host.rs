//! Reference host GEMM.

use tessera_arena::{Arena, HostRegion};
use tessera_core::{Backend, ELEMENT_BYTES};
use tessera_tensor::data::{decode_f32s, encode_f32s};
use tessera_tensor::TensorData;

use crate::error::KernelError;
use crate::kernel::{GemmJob, GemmKernel};

/// Naive row-major `f32` GEMM over inline host payloads (alpha 1, beta 0).
#[derive(Clone, Copy, Debug, Default)]
pub struct HostGemm;

impl GemmKernel for HostGemm {
    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn sgemm(&self, arena: &mut Arena<'_>, job: &GemmJob) -> Result<(), KernelError> {
        let a = read(arena, job.a, job.m * job.k)?;
        let b = read(arena, job.b, job.k * job.n)?;

        let mut c = vec![0.0f32; job.m * job.n];
        for i in 0..job.m {
            for p in 0..job.k {
                let aip = a[i * job.k + p];
                let b_row = &b[p * job.n..(p + 1) * job.n];
                let c_row = &mut c[i * job.n..(i + 1) * job.n];
                for (cij, bpj) in c_row.iter_mut().zip(b_row) {
                    *cij += aip * bpj;
                }
            }
        }

        let region = host_region(job.c, job.m * job.n)?;
        let bytes = arena.host_bytes_mut(region).map_err(memory)?;
        encode_f32s(&c, bytes);
        Ok(())
    }
}

fn host_region(data: TensorData, elements: usize) -> Result<HostRegion, KernelError> {
    match data {
        TensorData::Host(region) if region.len() == elements * ELEMENT_BYTES => Ok(region),
        TensorData::Host(region) => Err(KernelError::Memory {
            backend: Backend::Host,
            reason: format!(
                "payload is {} bytes, expected {}",
                region.len(),
                elements * ELEMENT_BYTES
            ),
        }),
        TensorData::Device { backend, .. } => Err(KernelError::Memory {
            backend: Backend::Host,
            reason: format!("operand lives on {backend}"),
        }),
    }
}

fn read(arena: &Arena<'_>, data: TensorData, elements: usize) -> Result<Vec<f32>, KernelError> {
    let region = host_region(data, elements)?;
    Ok(decode_f32s(arena.host_bytes(region).map_err(memory)?))
}

fn memory(e: tessera_arena::ArenaError) -> KernelError {
    KernelError::Memory {
        backend: Backend::Host,
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arena::SilentLog;
    use tessera_tensor::Tensor;

    #[test]
    fn multiplies_row_major() {
        let mut buf = vec![0u8; 2048];
        let mut arena = Arena::with_log(&mut buf[..], SilentLog).unwrap();
        let a = Tensor::create(&mut arena, &[2, 3], Backend::Host).unwrap();
        let b = Tensor::create(&mut arena, &[3, 2], Backend::Host).unwrap();
        let c = Tensor::create(&mut arena, &[2, 2], Backend::Host).unwrap();
        a.write_host(&mut arena, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap();
        b.write_host(&mut arena, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0])
            .unwrap();

        let job = GemmJob {
            backend: Backend::Host,
            m: 2,
            n: 2,
            k: 3,
            a: a.data(&arena).unwrap(),
            b: b.data(&arena).unwrap(),
            c: c.data(&arena).unwrap(),
        };
        HostGemm.sgemm(&mut arena, &job).unwrap();
        assert_eq!(
            c.read_host(&arena).unwrap(),
            vec![58.0, 64.0, 139.0, 154.0]
        );
    }

    #[test]
    fn device_operand_is_a_memory_error() {
        let mut buf = vec![0u8; 256];
        let mut arena = Arena::with_log(&mut buf[..], SilentLog).unwrap();
        let host = arena.allocate_host(4).unwrap();
        let job = GemmJob {
            backend: Backend::Host,
            m: 1,
            n: 1,
            k: 1,
            a: TensorData::Device {
                backend: Backend::Rocm,
                ptr: tessera_core::DevicePtr::new(0x1000),
                len: 4,
            },
            b: TensorData::Host(host),
            c: TensorData::Host(host),
        };
        assert!(matches!(
            HostGemm.sgemm(&mut arena, &job),
            Err(KernelError::Memory { .. })
        ));
    }
}

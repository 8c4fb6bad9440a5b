//! Criterion micro-benchmarks for tensor creation and host GEMM.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_arena::{Arena, SilentLog};
use tessera_bench::ArenaProfile;
use tessera_core::Backend;
use tessera_dispatch::Dispatcher;
use tessera_tensor::Tensor;

/// Benchmark: create 1K small host tensors.
fn bench_tensor_create_1k(c: &mut Criterion) {
    let mut buf = ArenaProfile::reference().host_buffer();
    c.bench_function("tensor_create_1k", |b| {
        b.iter(|| {
            let mut arena = Arena::with_log(&mut buf[..], SilentLog).unwrap();
            for _ in 0..1_000 {
                black_box(Tensor::create(&mut arena, &[4, 4], Backend::Host).unwrap());
            }
        });
    });
}

/// Benchmark: read dims and size back from a tensor header.
fn bench_tensor_inspect(c: &mut Criterion) {
    let mut buf = ArenaProfile::reference().host_buffer();
    let mut arena = Arena::with_log(&mut buf[..], SilentLog).unwrap();
    let t = Tensor::create(&mut arena, &[8, 16, 32], Backend::Host).unwrap();
    c.bench_function("tensor_inspect", |b| {
        b.iter(|| {
            black_box(t.dims(&arena).unwrap());
            black_box(t.size(&arena).unwrap());
        });
    });
}

/// Benchmark: 64×64 host matmul through the dispatcher.
fn bench_host_matmul_64(c: &mut Criterion) {
    let mut buf = ArenaProfile::reference().host_buffer();
    let mut arena = Arena::with_log(&mut buf[..], SilentLog).unwrap();
    let a = Tensor::create(&mut arena, &[64, 64], Backend::Host).unwrap();
    let b_t = Tensor::create(&mut arena, &[64, 64], Backend::Host).unwrap();
    let out = Tensor::create(&mut arena, &[64, 64], Backend::Host).unwrap();
    let values: Vec<f32> = (0..64 * 64).map(|i| (i % 7) as f32).collect();
    a.write_host(&mut arena, &values).unwrap();
    b_t.write_host(&mut arena, &values).unwrap();
    let dispatcher = Dispatcher::with_host();
    c.bench_function("host_matmul_64", |b| {
        b.iter(|| dispatcher.matmul(&mut arena, out, a, b_t).unwrap());
    });
}

criterion_group!(
    benches,
    bench_tensor_create_1k,
    bench_tensor_inspect,
    bench_host_matmul_64
);
criterion_main!(benches);

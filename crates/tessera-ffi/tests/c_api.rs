//! Integration test: drive the C API the way a C caller would, through
//! handles, raw pointers and the last-status code.

use std::ffi::c_void;

use tessera_ffi::*;
use tessera_test_utils::{fake_device_blocks, host_buffer, FAKE_DEVICE_BASE};

const HOST: u32 = 0;
const ROCM: u32 = 1;
const CUDA: u32 = 2;

fn status() -> TesseraStatus {
    match tessera_last_status() {
        0 => TesseraStatus::Ok,
        -1 => TesseraStatus::InvalidHandle,
        -2 => TesseraStatus::NullInput,
        -4 => TesseraStatus::BufferTooSmall,
        -5 => TesseraStatus::OutOfArenaSpace,
        -7 => TesseraStatus::AlreadyExtended,
        -8 => TesseraStatus::UnsupportedBackend,
        -9 => TesseraStatus::ZeroDimensions,
        -12 => TesseraStatus::ReshapeExceedsStorage,
        -13 => TesseraStatus::ShapeMismatch,
        -14 => TesseraStatus::BackendMismatch,
        -15 => TesseraStatus::AliasingViolation,
        -18 => TesseraStatus::ArenaMismatch,
        other => panic!("unexpected status {other}"),
    }
}

fn write_f32s(ptr: *mut c_void, values: &[f32]) {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    // SAFETY: ptr is a host payload of at least `values.len()` elements.
    unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.cast::<u8>(), bytes.len()) };
}

fn read_f32s(ptr: *mut c_void, n: usize) -> Vec<f32> {
    let mut bytes = vec![0u8; n * 4];
    // SAFETY: ptr is a host payload of at least `n` elements.
    unsafe { std::ptr::copy_nonoverlapping(ptr.cast::<u8>(), bytes.as_mut_ptr(), bytes.len()) };
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn too_small_buffer_is_rejected() {
    let mut buf = host_buffer(tessera_arena_min_bytes() - 1);
    assert_eq!(tessera_arena_create(buf.as_mut_ptr().cast(), buf.len()), 0);
    assert_eq!(status(), TesseraStatus::BufferTooSmall);
}

#[test]
fn host_malloc_points_into_the_buffer() {
    let mut buf = host_buffer(256);
    let base = buf.as_mut_ptr() as usize;
    let arena = tessera_arena_create(buf.as_mut_ptr().cast(), buf.len());
    let p1 = tessera_arena_malloc(arena, HOST, 16) as usize;
    let p2 = tessera_arena_malloc(arena, HOST, 16) as usize;
    assert_eq!(p1, base + 16);
    assert_eq!(p2, p1 + 16);
    assert!(tessera_arena_malloc(arena, HOST, 1024).is_null());
    assert_eq!(status(), TesseraStatus::OutOfArenaSpace);
    assert!(tessera_arena_release(arena));
}

#[test]
fn device_extension_and_malloc() {
    let mut buf = host_buffer(256);
    let blocks: Vec<*mut c_void> = fake_device_blocks(2, 0x1000)
        .into_iter()
        .map(|p| p.as_raw())
        .collect();
    let arena = tessera_arena_create(buf.as_mut_ptr().cast(), buf.len());

    assert_eq!(
        tessera_arena_extend_with_device_blocks(arena, ROCM, std::ptr::null(), 64, 2),
        0
    );
    assert_eq!(status(), TesseraStatus::NullInput);
    assert_eq!(
        tessera_arena_extend_with_device_blocks(arena, HOST, blocks.as_ptr(), 64, 2),
        0
    );
    assert_eq!(status(), TesseraStatus::UnsupportedBackend);

    assert_eq!(
        tessera_arena_extend_with_device_blocks(arena, ROCM, blocks.as_ptr(), 64, 2),
        arena
    );
    assert_eq!(
        tessera_arena_extend_with_device_blocks(arena, ROCM, blocks.as_ptr(), 64, 2),
        0
    );
    assert_eq!(status(), TesseraStatus::AlreadyExtended);

    assert!(tessera_arena_can_alloc(arena, ROCM, 64));
    assert!(!tessera_arena_can_alloc(arena, ROCM, 65));
    assert!(!tessera_arena_can_alloc(arena, CUDA, 1));

    let d0 = tessera_arena_malloc(arena, ROCM, 40) as u64;
    let d1 = tessera_arena_malloc(arena, ROCM, 40) as u64;
    assert_eq!(d0, FAKE_DEVICE_BASE);
    assert_eq!(d1, FAKE_DEVICE_BASE + 0x1000);
    assert!(tessera_arena_malloc(arena, ROCM, 40).is_null());
    assert_eq!(status(), TesseraStatus::OutOfArenaSpace);
    assert!(tessera_arena_release(arena));
}

#[test]
fn tensor_dims_size_and_reshape() {
    let mut buf = host_buffer(1024);
    let arena = tessera_arena_create(buf.as_mut_ptr().cast(), buf.len());

    assert_eq!(tessera_tensor_create(arena, 0, std::ptr::null(), HOST), 0);
    assert_eq!(status(), TesseraStatus::ZeroDimensions);

    let dims = [3usize, 4];
    let t = tessera_tensor_create(arena, 2, dims.as_ptr(), HOST);
    assert_ne!(t, 0);
    assert_eq!(tessera_tensor_get_size(t), 48);

    let mut out = [0usize; 4];
    assert_eq!(tessera_tensor_get_dims(t, std::ptr::null_mut(), 0), 2);
    assert_eq!(tessera_tensor_get_dims(t, out.as_mut_ptr(), 1), 0);
    assert_eq!(status(), TesseraStatus::BufferTooSmall);
    assert_eq!(tessera_tensor_get_dims(t, out.as_mut_ptr(), 4), 2);
    assert_eq!(&out[..2], &[3, 4]);

    let flat = [12usize];
    assert_eq!(tessera_tensor_set_dims(t, 1, flat.as_ptr()), t);
    assert_eq!(tessera_tensor_get_dims(t, out.as_mut_ptr(), 4), 1);
    assert_eq!(out[0], 12);

    let bigger = [13usize];
    assert_eq!(tessera_tensor_set_dims(t, 1, bigger.as_ptr()), 0);
    assert_eq!(status(), TesseraStatus::ReshapeExceedsStorage);

    assert_eq!(tessera_tensor_set_dims(t, 0, std::ptr::null()), t);
    assert_eq!(tessera_tensor_get_size(t), 0);
    assert_eq!(status(), TesseraStatus::Ok);
    assert!(tessera_arena_release(arena));
}

#[test]
fn device_tensor_data_is_a_device_address() {
    let mut buf = host_buffer(512);
    let blocks: Vec<*mut c_void> = fake_device_blocks(1, 0x1000)
        .into_iter()
        .map(|p| p.as_raw())
        .collect();
    let arena = tessera_arena_create(buf.as_mut_ptr().cast(), buf.len());
    tessera_arena_extend_with_device_blocks(arena, CUDA, blocks.as_ptr(), 4096, 1);
    let dims = [8usize, 8];
    let t = tessera_tensor_create(arena, 2, dims.as_ptr(), CUDA);
    assert_eq!(tessera_tensor_get_data(t) as u64, FAKE_DEVICE_BASE);
    assert_eq!(tessera_tensor_get_size(t), 256);
    assert!(tessera_arena_release(arena));
}

#[test]
fn host_matmul_through_handles() {
    let mut buf = host_buffer(2048);
    let arena = tessera_arena_create(buf.as_mut_ptr().cast(), buf.len());
    let (d23, d32, d22) = ([2usize, 3], [3usize, 2], [2usize, 2]);
    let a = tessera_tensor_create(arena, 2, d23.as_ptr(), HOST);
    let b = tessera_tensor_create(arena, 2, d32.as_ptr(), HOST);
    let c = tessera_tensor_create(arena, 2, d22.as_ptr(), HOST);
    write_f32s(tessera_tensor_get_data(a), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    write_f32s(tessera_tensor_get_data(b), &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);

    assert_eq!(tessera_matmul(c, a, b), c);
    assert_eq!(
        read_f32s(tessera_tensor_get_data(c), 4),
        vec![58.0, 64.0, 139.0, 154.0]
    );

    assert_eq!(tessera_matmul(a, a, b), 0);
    assert_eq!(status(), TesseraStatus::AliasingViolation);
    assert_eq!(tessera_matmul(c, b, b), 0);
    assert_eq!(status(), TesseraStatus::ShapeMismatch);
    assert!(tessera_arena_release(arena));
}

#[test]
fn matmul_across_backends_or_arenas_rejected() {
    let mut buf = host_buffer(1024);
    let mut other_buf = host_buffer(512);
    let blocks: Vec<*mut c_void> = fake_device_blocks(1, 0x1000)
        .into_iter()
        .map(|p| p.as_raw())
        .collect();
    let arena = tessera_arena_create(buf.as_mut_ptr().cast(), buf.len());
    let other = tessera_arena_create(other_buf.as_mut_ptr().cast(), other_buf.len());
    tessera_arena_extend_with_device_blocks(arena, ROCM, blocks.as_ptr(), 4096, 1);

    let d = [2usize, 2];
    let host_a = tessera_tensor_create(arena, 2, d.as_ptr(), HOST);
    let dev_b = tessera_tensor_create(arena, 2, d.as_ptr(), ROCM);
    let host_c = tessera_tensor_create(arena, 2, d.as_ptr(), HOST);
    let foreign = tessera_tensor_create(other, 2, d.as_ptr(), HOST);

    assert_eq!(tessera_matmul(host_c, host_a, dev_b), 0);
    assert_eq!(status(), TesseraStatus::BackendMismatch);
    assert_eq!(tessera_matmul(host_c, host_a, foreign), 0);
    assert_eq!(status(), TesseraStatus::ArenaMismatch);

    assert!(tessera_arena_release(arena));
    assert!(tessera_arena_release(other));
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
#[cfg(not(target_arch = "wasm32"))]
use xenos_endian::Backend;

#[cfg(not(target_arch = "wasm32"))]
fn criterion_config() -> Criterion {
    match std::env::var("XENOS_BENCH_PROFILE").as_deref() {
        Ok("ci") => Criterion::default()
            .warm_up_time(Duration::from_millis(150))
            .measurement_time(Duration::from_millis(400))
            .sample_size(10)
            .noise_threshold(0.05),
        _ => Criterion::default()
            .warm_up_time(Duration::from_secs(1))
            .measurement_time(Duration::from_secs(2))
            .sample_size(50)
            .noise_threshold(0.03),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_swap(c: &mut Criterion) {
    // Typical vertex buffer sizes, plus an odd size that exercises the scalar tail.
    let sizes = [4 * 1024usize, 64 * 1024, 1024 * 1024 + 12];

    let mut group = c.benchmark_group("copy_and_swap_32");
    for &size in &sizes {
        let src: Vec<u8> = (0..size).map(|i| i as u8).collect();
        let mut dst = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        for backend in Backend::supported() {
            group.bench_with_input(
                BenchmarkId::new(format!("{backend:?}"), size),
                &src,
                |b, src| b.iter(|| backend.copy_and_swap_32(black_box(&mut dst), src, size / 4)),
            );
        }
    }
    group.finish();

    let mut group = c.benchmark_group("copy_cmp_swap_16");
    for &size in &sizes {
        let src: Vec<u8> = (0..size).map(|i| (i % 7) as u8).collect();
        let mut dst = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        for backend in Backend::supported() {
            group.bench_with_input(
                BenchmarkId::new(format!("{backend:?}"), size),
                &src,
                |b, src| {
                    b.iter(|| {
                        backend.copy_cmp_swap_16(black_box(&mut dst), src, 0x0600, size / 2)
                    })
                },
            );
        }
    }
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_swap
}

#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);

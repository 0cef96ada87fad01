//! Criterion benchmarks for fmpx-analysis components
//!
//! Run with: cargo bench -p fmpx-analysis
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fmpx_analysis::{Spectrum, analyze_mpx, fft::Window};
use std::f32::consts::TAU;

const SAMPLE_RATE: f32 = 192_000.0;

fn generate_composite(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            0.4 * (TAU * 1_000.0 * t).sin() + 0.08 * (TAU * 19_000.0 * t).sin()
        })
        .collect()
}

fn bench_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("Spectrum");
    let signal = generate_composite(65_536);
    for &fft_size in &[1024usize, 4096, 8192] {
        group.bench_with_input(
            BenchmarkId::new("measure", fft_size),
            &fft_size,
            |b, &fft_size| {
                b.iter(|| {
                    black_box(Spectrum::measure(
                        black_box(&signal),
                        SAMPLE_RATE,
                        fft_size,
                        Window::BlackmanHarris,
                    ))
                });
            },
        );
    }
    group.bench_function("analyze_mpx_64k", |b| {
        b.iter(|| black_box(analyze_mpx(black_box(&signal), SAMPLE_RATE)));
    });
    group.finish();
}

criterion_group!(benches, bench_spectrum);
criterion_main!(benches);

//! Criterion benchmarks for the tsunami block chain
//!
//! Run with: cargo bench -p tsunami-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tsunami_core::{BLOCK_SIZE, NATIVE_RATE, TsunamiEngine, WaveShaper, decimate, divisor};

const TARGET_RATES: &[u32] = &[48_000, 16_000, 8_000, 1_000, 10];

fn generate_test_block(size: usize) -> Vec<i16> {
    (0..size)
        .map(|i| {
            let t = i as f32 / NATIVE_RATE as f32;
            ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 16_384.0) as i16
        })
        .collect()
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("TsunamiEngine");
    let input = generate_test_block(BLOCK_SIZE);

    for &target in TARGET_RATES {
        let d = divisor(NATIVE_RATE, target);
        group.bench_with_input(BenchmarkId::new("process_block", target), &d, |b, &d| {
            let mut engine = TsunamiEngine::new(BLOCK_SIZE);
            let mut output = vec![0i16; BLOCK_SIZE];
            b.iter(|| black_box(engine.process_block(black_box(&input), d, &mut output)));
        });
    }

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stages");
    let input = generate_test_block(BLOCK_SIZE);

    group.bench_function("decimate_d3", |b| {
        b.iter(|| black_box(decimate(black_box(&input), 3)));
    });

    let shaper = WaveShaper::with_rule("16:15:2".parse().unwrap());
    group.bench_function("shape_in_place", |b| {
        let mut block = input.clone();
        b.iter(|| shaper.shape_in_place(black_box(&mut block)));
    });

    group.finish();
}

criterion_group!(benches, bench_engine, bench_stages);
criterion_main!(benches);

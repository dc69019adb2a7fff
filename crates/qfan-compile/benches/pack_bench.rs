//! Benchmarks for fan-out packing
//!
//! Run with: cargo bench -p qfan-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qfan_compile::{FanoutPacker, Pipeline, Reorderer};
use qfan_ir::{Circuit, Operation, QubitId, SingleQubitKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random CX/CP/H stream with a fixed seed.
fn random_ops(num_qubits: u32, len: usize) -> Vec<Operation> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len)
        .map(|_| {
            let c = rng.gen_range(0..num_qubits);
            let t = (c + rng.gen_range(1..num_qubits)) % num_qubits;
            match rng.gen_range(0..4) {
                0 => Operation::single(SingleQubitKind::H, QubitId(c)),
                1 => Operation::cp(rng.gen_range(0.1..3.0), QubitId(c), QubitId(t)).unwrap(),
                _ => Operation::cx(QubitId(c), QubitId(t)).unwrap(),
            }
        })
        .collect()
}

/// Benchmark the packer alone on random streams
fn bench_pack_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_random");
    let packer = FanoutPacker::new();

    for len in &[100, 1_000, 10_000] {
        let ops = random_ops(16, *len);
        group.bench_with_input(BenchmarkId::new("first_fit", len), &ops, |b, ops| {
            b.iter(|| packer.pack(black_box(ops)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the reorderer
fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder");
    let reorderer = Reorderer::default();

    for len in &[100, 1_000] {
        let ops = random_ops(16, *len);
        group.bench_with_input(BenchmarkId::new("random", len), &ops, |b, ops| {
            b.iter(|| reorderer.reorder(black_box(ops)));
        });
    }

    group.finish();
}

/// Benchmark the full pipeline on structured circuits
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let pipeline = Pipeline::new();

    for n in &[8, 16, 32] {
        let qft = Circuit::qft(*n).unwrap();
        group.bench_with_input(BenchmarkId::new("qft", n), &qft, |b, circuit| {
            b.iter(|| pipeline.run(black_box(circuit)).unwrap());
        });

        let ghz = Circuit::ghz(*n).unwrap();
        group.bench_with_input(BenchmarkId::new("ghz", n), &ghz, |b, circuit| {
            b.iter(|| pipeline.run(black_box(circuit)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pack_random, bench_reorder, bench_pipeline);
criterion_main!(benches);

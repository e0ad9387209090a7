//! Criterion benchmarks for the execution engine.
//!
//! `RUN` cost should scale with the number of integration steps and the
//! number of units, and stay flat in coefficient magnitude and noise.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vpu_anneal::compiler::{Compiler, StrategyConfig};
use vpu_anneal::engine::{EngineConfig, ExecutionEngine};
use vpu_anneal::isa::{Instruction, Program};
use vpu_anneal::model::Problem;
use vpu_anneal::problems::MaxCut;

/// Ring of `n` units with inhibitory neighbors.
fn ring_program(n: usize, coupling: f64, amplitude: f64, duration: f64) -> Program {
    let mut j = vec![0.0; n * n];
    for i in 0..n {
        let k = (i + 1) % n;
        if k != i {
            j[i * n + k] = -coupling;
            j[k * n + i] = -coupling;
        }
    }
    Program::from(vec![
        Instruction::Allocate { size: n },
        Instruction::coupling_bulk(j),
        Instruction::bias_bulk(vec![0.0; n]),
        Instruction::SetNoise { amplitude },
        Instruction::Run { duration },
        Instruction::Read,
    ])
}

fn engine() -> ExecutionEngine {
    match ExecutionEngine::new(EngineConfig::critical().with_seed(42)) {
        Ok(e) => e,
        Err(e) => panic!("invalid engine config: {e}"),
    }
}

fn bench_run_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_steps");
    group.sample_size(10);

    for &duration in &[0.01, 0.05, 0.1] {
        let program = ring_program(16, 1e-9, 2e-3, duration);
        let steps = (duration / 1e-4) as usize;
        group.bench_with_input(BenchmarkId::from_parameter(steps), &program, |b, p| {
            b.iter(|| black_box(engine().execute(black_box(p))))
        });
    }
    group.finish();
}

fn bench_run_units(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_units");
    group.sample_size(10);

    for &n in &[8, 32, 128] {
        let program = ring_program(n, 1e-9, 2e-3, 0.05);
        group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, p| {
            b.iter(|| black_box(engine().execute(black_box(p))))
        });
    }
    group.finish();
}

fn bench_run_magnitude(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_magnitude");
    group.sample_size(10);

    for &(coupling, amplitude) in &[(1e-10, 1e-3), (1.5e-9, 10e-3), (1e-6, 50e-3)] {
        let program = ring_program(16, coupling, amplitude, 0.05);
        group.bench_with_input(
            BenchmarkId::new(format!("j{coupling:e}_s{amplitude:e}"), 16),
            &program,
            |b, p| b.iter(|| black_box(engine().execute(black_box(p)))),
        );
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for &n in &[16, 64] {
        let edges = (0..n).map(|i| (i, (i + 1) % n, 1.0)).collect();
        let model = match MaxCut::new(n, edges).energy_model() {
            Ok(m) => m,
            Err(e) => panic!("invalid model: {e}"),
        };
        let strategy = StrategyConfig::default();
        group.bench_with_input(BenchmarkId::from_parameter(n), &model, |b, m| {
            b.iter(|| {
                let normalized = m.normalized(1.5e-9);
                let program = normalized.and_then(|nm| Compiler::default().compile(&nm.model, &strategy));
                black_box(program)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_run_steps,
    bench_run_units,
    bench_run_magnitude,
    bench_compile
);
criterion_main!(benches);

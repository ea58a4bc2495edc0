#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Backend benchmarks for Cal.
//!
//! Measures one call of each backend on the matrix workload, plus the
//! one-time cost of preparing the located backends.

use std::hint::black_box;

use calc::workload::{matrix_env, matrix_product};
use calc::{Backend, Prepared};
use cal_native::NativeConfig;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const SIZES: [usize; 3] = [4, 8, 16];

fn bench_eval(c: &mut Criterion) {
    let config = NativeConfig::from_env().unwrap();
    let mut group = c.benchmark_group("eval");

    for size in SIZES {
        let expr = matrix_product(size);
        let env = matrix_env(size, 1);

        for backend in Backend::ALL {
            let prepared = match Prepared::new(backend, &expr, &config) {
                Ok(prepared) => prepared,
                Err(err) => {
                    eprintln!("skipping {backend} at n={size}: {err}");
                    continue;
                }
            };
            let inputs = prepared.inputs(&env).unwrap();
            group.bench_with_input(BenchmarkId::new(backend.name(), size), &inputs, |b, inputs| {
                b.iter(|| prepared.run(black_box(inputs)).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    let config = NativeConfig::default();
    let mut group = c.benchmark_group("prepare");

    for size in SIZES {
        let expr = matrix_product(size);
        for backend in [Backend::Indexed, Backend::Specialized] {
            group.bench_with_input(BenchmarkId::new(backend.name(), size), &expr, |b, expr| {
                b.iter(|| Prepared::new(backend, black_box(expr), &config).unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_eval, bench_prepare);
criterion_main!(benches);

//! Benchmarks for GCP fitting
//!
//! Compares the deterministic solver on dense data against the stochastic
//! solvers on the same counts stored sparsely.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scirs2_core::random::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use tengcp_core::DenseND;
use tengcp_opt::{
    gcp_opt, AdamConfig, GcpOptions, Lbfgsb, LbfgsbConfig, Objectives, StochasticConfig,
    StochasticSolver, TensorData,
};
use tengcp_sparse::CooTensor;

fn counts(size: usize, seed: u64) -> DenseND<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let u = DenseND::<f64>::random_uniform(&[size, size, size], 0.0, 1.0, &mut rng);
    // roughly 80% zeros, small counts elsewhere
    u.map(|v| if v < 0.8 { 0.0 } else { ((v - 0.8) * 20.0).floor() + 1.0 })
}

fn bench_lbfgsb_dense(c: &mut Criterion) {
    let mut group = c.benchmark_group("gcp_lbfgsb_dense");
    group.sample_size(10);

    for &(size, rank) in &[(10, 3), (20, 5)] {
        let data: TensorData<f64> = counts(size, 1).into();
        group.throughput(Throughput::Elements((size * size * size) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}x{}_r{}", size, size, size, rank)),
            &(data, rank),
            |b, (data, rank)| {
                b.iter(|| {
                    let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(20));
                    black_box(gcp_opt(
                        black_box(data),
                        *rank,
                        Objectives::Poisson,
                        &mut solver,
                        GcpOptions::default().printitn(0),
                        &mut StdRng::seed_from_u64(0),
                    ))
                })
            },
        );
    }

    group.finish();
}

fn bench_stochastic_sparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("gcp_stochastic_sparse");
    group.sample_size(10);

    let size = 20;
    let rank = 5;
    let sparse: TensorData<f64> = CooTensor::from_dense(&counts(size, 1), 0.0).unwrap().into();
    let config = StochasticConfig::default().epoch_iters(50).max_iters(10);

    for name in ["sgd", "adam", "adagrad"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &sparse, |b, data| {
            b.iter(|| {
                let mut solver = match name {
                    "sgd" => StochasticSolver::sgd(config.clone()),
                    "adam" => StochasticSolver::adam(config.clone(), AdamConfig::default()),
                    _ => StochasticSolver::adagrad(config.clone()),
                };
                black_box(gcp_opt(
                    black_box(data),
                    rank,
                    Objectives::Poisson,
                    &mut solver,
                    GcpOptions::default().printitn(0),
                    &mut StdRng::seed_from_u64(0),
                ))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lbfgsb_dense, bench_stochastic_sparse);
criterion_main!(benches);

//! Integration tests for `gcp_opt` across objectives, solvers and samplers

use scirs2_core::ndarray_ext::array;
use scirs2_core::random::{rngs::StdRng, SeedableRng};
use tengcp_core::DenseND;
use tengcp_opt::{
    gcp_opt, gcp_opt_seeded, AdamConfig, ConvergenceReason, GcpError, GcpOptions, Init,
    KruskalTensor, Lbfgsb, LbfgsbConfig, Mask, Objective, Objectives, SampleSizes,
    SamplerConfig, SamplerType, StochasticConfig, StochasticSolver, Termination, TensorData,
};
use tengcp_sparse::CooTensor;

fn low_rank() -> DenseND<f64> {
    let a = array![[1.0, 0.2], [0.5, 1.0], [1.5, 0.3], [0.2, 0.8]];
    let b = array![[1.0, 0.5], [2.0, 0.1], [0.3, 1.2]];
    let c = array![[1.0, 1.0], [0.5, 2.0]];
    KruskalTensor::from_factors(vec![a, b, c])
        .unwrap()
        .full()
        .unwrap()
}

fn quiet() -> GcpOptions<f64> {
    GcpOptions::default().printitn(0)
}

fn rel_error(a: &DenseND<f64>, b: &DenseND<f64>) -> f64 {
    let num: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    let den: f64 = b.iter().map(|y| y * y).sum();
    (num / den).sqrt()
}

#[test]
fn test_gaussian_lbfgsb_recovers_low_rank() {
    let x = low_rank();
    let data: TensorData<f64> = x.clone().into();
    let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(500).pgtol(1e-7));
    let fit = gcp_opt(
        &data,
        2,
        Objectives::Gaussian,
        &mut solver,
        quiet(),
        &mut StdRng::seed_from_u64(10),
    )
    .unwrap();

    let recon = fit.model.full().unwrap();
    assert!(rel_error(&recon, &x) < 0.05, "relative error {}", rel_error(&recon, &x));
    assert!(!matches!(fit.info.termination, Termination::Error(_)));
    let first = fit.info.history[0].f;
    assert!(fit.info.final_f < first);
}

#[test]
fn test_poisson_adam_on_sparse_counts() {
    let coo = CooTensor::new(
        vec![
            vec![0, 0, 0],
            vec![1, 1, 0],
            vec![2, 0, 1],
            vec![3, 2, 1],
            vec![0, 2, 1],
        ],
        vec![3.0, 1.0, 2.0, 5.0, 1.0],
        vec![4, 3, 2],
    )
    .unwrap();
    let data: TensorData<f64> = coo.into();
    let mut solver = StochasticSolver::adam(
        StochasticConfig::default()
            .rate(1e-2)
            .epoch_iters(20)
            .max_iters(15),
        AdamConfig::default(),
    );
    let fit = gcp_opt(
        &data,
        2,
        Objectives::Poisson,
        &mut solver,
        quiet(),
        &mut StdRng::seed_from_u64(4),
    )
    .unwrap();

    assert_eq!(fit.info.solver, "adam");
    assert_eq!(fit.info.iterations, 15);
    assert!(fit.info.final_f <= fit.info.history[0].f);
    assert!(fit
        .model
        .factors()
        .iter()
        .all(|f| f.iter().all(|&v| v >= 0.0)));
}

#[test]
fn test_semi_stratified_bernoulli() {
    let x = DenseND::from_fn(&[5, 4], |i| ((i[0] + i[1]) % 2) as f64);
    let data: TensorData<f64> = CooTensor::from_dense(&x, 0.0).unwrap().into();
    let mut solver = StochasticSolver::sgd(
        StochasticConfig::default()
            .rate(1e-2)
            .epoch_iters(10)
            .max_iters(5),
    );
    let sampler = SamplerConfig::default()
        .with_sampler(SamplerType::SemiStratified)
        .gradient_samples(SampleSizes::Stratified {
            observed: 8,
            zeros: 8,
        });
    let fit = gcp_opt(
        &data,
        2,
        Objectives::BernoulliOdds,
        &mut solver,
        quiet().sampler(sampler),
        &mut StdRng::seed_from_u64(8),
    )
    .unwrap();
    assert_eq!(fit.model.rank(), 2);
    assert!(fit.info.final_f.is_finite());
}

#[test]
fn test_uniform_sampler_on_sparse_data() {
    let data: TensorData<f64> =
        CooTensor::new(vec![vec![0, 1], vec![2, 2]], vec![1.5, -0.5], vec![3, 3])
            .unwrap()
            .into();
    let mut solver = StochasticSolver::adagrad(
        StochasticConfig::default()
            .rate(0.05)
            .epoch_iters(5)
            .max_iters(4),
    );
    let fit = gcp_opt(
        &data,
        1,
        Objectives::Gaussian,
        &mut solver,
        quiet().sampler(SamplerConfig::default().with_sampler(SamplerType::Uniform)),
        &mut StdRng::seed_from_u64(2),
    )
    .unwrap();
    assert_eq!(fit.info.solver, "adagrad");
}

#[test]
fn test_missing_entries_mask() {
    let x = low_rank();
    let mut w = DenseND::<f64>::ones(x.shape());
    w[&[0, 0, 0]] = 0.0;
    w[&[3, 2, 1]] = 0.0;
    let mask = Mask::from_dense(w).unwrap();
    assert_eq!(mask.count(), x.len() - 2);

    let data: TensorData<f64> = x.clone().into();
    let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(3));
    let fit = gcp_opt(
        &data,
        2,
        Objectives::Gaussian,
        &mut solver,
        quiet().mask(mask),
        &mut StdRng::seed_from_u64(1),
    )
    .unwrap();
    assert!(!fit.model.isequal(&fit.initial));
    assert!(fit.initial.weights().iter().all(|&w| w == 1.0));
}

#[test]
fn test_fractional_mask_weights_fit_the_data_values() {
    let data: TensorData<f64> = DenseND::from_elem(&[2, 2], 2.0).into();
    let mask = Mask::from_dense(DenseND::from_elem(&[2, 2], 0.5)).unwrap();
    let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(500).pgtol(1e-8));
    let fit = gcp_opt(
        &data,
        1,
        Objectives::Gaussian,
        &mut solver,
        quiet().mask(mask),
        &mut StdRng::seed_from_u64(3),
    )
    .unwrap();
    let full = fit.model.full().unwrap();
    for v in full.iter() {
        assert!((v - 2.0).abs() < 1e-3, "fitted {} instead of 2.0", v);
    }
}

#[test]
fn test_custom_objective() {
    let x = low_rank();
    let data: TensorData<f64> = x.into();
    let half_squares = Objective::custom(
        |m: f64, x: f64| 0.5 * (m - x) * (m - x),
        |m: f64, x: f64| m - x,
        0.0,
    )
    .unwrap()
    .with_name("half-squares");
    let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(5));
    let fit = gcp_opt(
        &data,
        2,
        half_squares,
        &mut solver,
        quiet(),
        &mut StdRng::seed_from_u64(6),
    )
    .unwrap();
    assert!(fit
        .model
        .factors()
        .iter()
        .all(|f| f.iter().all(|&v| v >= 0.0)));
}

#[test]
fn test_f_est_tol_stops_after_first_epoch() {
    let data: TensorData<f64> = low_rank().into();
    let mut solver = StochasticSolver::sgd(
        StochasticConfig::default()
            .rate(1e-3)
            .epoch_iters(1)
            .max_iters(100)
            .f_est_tol(f64::INFINITY),
    );
    let fit = gcp_opt(
        &data,
        2,
        Objectives::Gaussian,
        &mut solver,
        quiet(),
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap();
    // every estimate is below an infinite tolerance
    assert_eq!(
        fit.info.termination,
        Termination::Converged(ConvergenceReason::FunctionTolerance)
    );
    assert_eq!(fit.info.iterations, 1);
}

#[test]
fn test_domain_errors() {
    let data: TensorData<f64> = DenseND::from_vec(vec![0.0, 1.5, 2.0, 1.0], &[2, 2])
        .unwrap()
        .into();
    let err = gcp_opt(
        &data,
        1,
        Objectives::Poisson,
        &mut Lbfgsb::default(),
        quiet(),
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, GcpError::Domain(_)));

    let err = gcp_opt(
        &data,
        1,
        Objectives::BernoulliLogit,
        &mut Lbfgsb::default(),
        quiet(),
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, GcpError::Domain(_)));
}

#[test]
fn test_seeded_entry_point() {
    let data: TensorData<f64> = low_rank().into();
    let run = |seed| {
        gcp_opt_seeded(
            &data,
            2,
            Objectives::Gaussian,
            &mut Lbfgsb::new(LbfgsbConfig::default().max_iters(2)),
            quiet(),
            seed,
        )
        .unwrap()
    };
    assert_eq!(run(Some(5)).initial, run(Some(5)).initial);
    assert_ne!(run(Some(5)).initial, run(Some(6)).initial);
    assert_eq!(run(None).initial.rank(), 2);
}

#[test]
fn test_init_forms_share_the_fit() {
    let data: TensorData<f64> = low_rank().into();
    let factors = vec![
        array![[0.5, 0.1], [0.4, 0.9], [0.3, 0.3], [0.2, 0.6]],
        array![[1.0, 0.5], [0.7, 0.2], [0.3, 0.4]],
        array![[0.6, 1.0], [0.5, 0.9]],
    ];
    let run = |init: Init<f64>| {
        gcp_opt(
            &data,
            2,
            Objectives::Gaussian,
            &mut Lbfgsb::new(LbfgsbConfig::default().max_iters(4)),
            quiet().init(init),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap()
    };
    let from_factors = run(Init::Factors(factors.clone()));
    let from_model = run(Init::Model(KruskalTensor::from_factors(factors).unwrap()));
    assert_eq!(from_factors.model, from_model.model);
}

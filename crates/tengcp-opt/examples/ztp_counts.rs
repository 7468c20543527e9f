//! Zero-truncated Poisson fit of a small count tensor
//!
//! Builds counts from a planted rank-2 model, hides the zeros (a zero-truncated
//! process never reports them) and fits with both solver families.
//!
//! Run with: cargo run --example ztp_counts

use scirs2_core::random::{rngs::StdRng, SeedableRng};
use tengcp_core::DenseND;
use tengcp_opt::{
    ztp, GcpOptions, GcpResult, KruskalTensor, Lbfgsb, LbfgsbConfig, StochasticConfig,
    StochasticSolver, TensorData,
};
use tengcp_sparse::CooTensor;

fn main() -> GcpResult<()> {
    println!("=== Zero-truncated Poisson CP ===\n");

    let mut rng = StdRng::seed_from_u64(2024);
    let shape = [6, 5, 4];
    let planted = KruskalTensor::<f64>::random(&shape, 2, &mut rng);
    let means = planted.full()?;
    let counts = DenseND::from_fn(&shape, |idx| {
        let m = 3.0 * means[idx];
        // deterministic stand-in for a Poisson draw
        let c = (m + 0.5 * ((idx[0] + 2 * idx[1] + 3 * idx[2]) % 3) as f64 - 0.5).round();
        c.max(0.0)
    });
    let observed = counts.nnz();
    println!(
        "Tensor {:?}: {} observed counts out of {}",
        shape,
        observed,
        counts.len()
    );

    // Deterministic solve on dense storage
    let dense: TensorData<f64> = counts.clone().into();
    let mut lbfgsb = Lbfgsb::new(LbfgsbConfig::default().max_iters(100));
    let (fitted, initial, info) = ztp(
        &dense,
        2,
        &mut lbfgsb,
        GcpOptions::default().printitn(25),
        &mut StdRng::seed_from_u64(1),
    )?
    .into_parts();
    println!("\nL-BFGS-B: {}", info);
    println!(
        "  objective {:.4} -> {:.4}",
        info.initial_f().unwrap_or(f64::NAN),
        info.final_f
    );
    println!("  initial weights: {:?}", initial.weights().to_vec());
    println!("  fitted value at (0, 0, 0): {:.4}", fitted.value_at(&[0, 0, 0]));

    // Stochastic solve on sparse storage
    let sparse: TensorData<f64> = CooTensor::from_dense(&counts, 0.0)?.into();
    let mut sgd = StochasticSolver::sgd(
        StochasticConfig::default()
            .rate(1e-2)
            .epoch_iters(50)
            .max_iters(20),
    );
    let fit = ztp(
        &sparse,
        2,
        &mut sgd,
        GcpOptions::default().printitn(5),
        &mut StdRng::seed_from_u64(1),
    )?;
    println!("\nSGD: {}", fit.info);
    println!("  failed epochs: {}", fit.info.failed_epochs);
    for record in fit.info.history.iter().step_by(5) {
        println!("  epoch {:3}: f~ = {:.4}", record.iteration, record.f);
    }

    Ok(())
}

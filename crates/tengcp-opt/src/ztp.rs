//! Zero-truncated Poisson fitting
//!
//! Counts generated by a process that never reports zero: the model is fit on
//! the observed (nonzero) entries only, and zeros in the tensor are treated as
//! unobserved rather than as zero counts.

use crate::data::TensorData;
use crate::driver::{gcp_opt, GcpFit, GcpOptions};
use crate::error::GcpResult;
use crate::mask::Mask;
use crate::objectives::Objectives;
use crate::scalar::GcpFloat;
use crate::solvers::GcpSolver;
use scirs2_core::random::rngs::StdRng;

/// Fit a zero-truncated Poisson CP model.
///
/// Without a mask, mask-based solvers get one covering exactly the nonzero
/// entries of dense `data`; sampler-based solvers draw only nonzero entries.
/// All other behaviour, including every error, is that of [`gcp_opt`].
///
/// # Examples
///
/// ```
/// use scirs2_core::random::{rngs::StdRng, SeedableRng};
/// use tengcp_core::DenseND;
/// use tengcp_opt::{ztp, GcpOptions, Lbfgsb, LbfgsbConfig, TensorData};
///
/// let counts: TensorData<f64> =
///     DenseND::from_vec(vec![3.0, 0.0, 1.0, 2.0], &[2, 2]).unwrap().into();
/// let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(5));
/// let (fitted, initial, info) = ztp(
///     &counts,
///     1,
///     &mut solver,
///     GcpOptions::default().printitn(0),
///     &mut StdRng::seed_from_u64(0),
/// )
/// .unwrap()
/// .into_parts();
/// assert!(initial.weights().iter().all(|&w| w == 1.0));
/// assert_eq!(fitted.rank(), 1);
/// assert!(info.iterations <= 5);
/// ```
pub fn ztp<T: GcpFloat>(
    data: &TensorData<T>,
    rank: usize,
    optimizer: &mut dyn GcpSolver<T>,
    mut options: GcpOptions<T>,
    rng: &mut StdRng,
) -> GcpResult<GcpFit<T>> {
    data.validate()?;
    if options.mask.is_none() && !optimizer.requires_sampler() && !data.is_sparse() {
        options.mask = Some(Mask::observed(data));
    }
    gcp_opt(
        data,
        rank,
        Objectives::ZeroTruncatedPoisson,
        optimizer,
        options,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GcpError;
    use crate::solvers::{Lbfgsb, LbfgsbConfig};
    use scirs2_core::random::SeedableRng;
    use tengcp_core::DenseND;

    #[test]
    fn test_default_mask_is_observed_support() {
        let a: TensorData<f64> = DenseND::from_vec(vec![2.0, 0.0, 0.0, 3.0], &[2, 2]).unwrap().into();
        let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(10));
        let opts = || GcpOptions::default().printitn(0);
        let fa = ztp(&a, 1, &mut solver, opts(), &mut StdRng::seed_from_u64(5)).unwrap();

        let mask = Mask::observed(&a);
        let fb = ztp(&a, 1, &mut solver, opts().mask(mask), &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(fa.model, fb.model);
    }

    #[test]
    fn test_rejects_negative_counts() {
        let bad: TensorData<f64> = DenseND::from_vec(vec![1.0, -1.0], &[2]).unwrap().into();
        let err = ztp(
            &bad,
            1,
            &mut Lbfgsb::default(),
            GcpOptions::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, GcpError::Domain(_)));
    }
}

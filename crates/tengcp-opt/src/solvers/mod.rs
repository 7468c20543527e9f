//! Optimizers behind a common interface
//!
//! Two families solve the same problem:
//!
//! - [`Lbfgsb`]: deterministic projected L-BFGS on the full objective. Dense
//!   data only; entry inclusion comes from an optional [`Mask`].
//! - [`StochasticSolver`]: SGD, Adam or Adagrad on sampled mini-batches. Works
//!   with dense or sparse data; entry inclusion comes from a [`GcpSampler`].
//!
//! Both project the factors onto the objective's lower bound after every step.

mod lbfgsb;
mod rules;
mod stochastic;

pub use lbfgsb::{Lbfgsb, LbfgsbConfig};
pub use rules::{Adagrad, Adam, AdamConfig, Sgd, UpdateRule};
pub use stochastic::{StochasticConfig, StochasticSolver};

use crate::data::TensorData;
use crate::error::{GcpError, GcpResult};
use crate::info::SolveInfo;
use crate::ktensor::KruskalTensor;
use crate::mask::Mask;
use crate::objectives::Objective;
use crate::sampler::GcpSampler;
use crate::scalar::GcpFloat;
use scirs2_core::ndarray_ext::Array2;
use scirs2_core::random::rngs::StdRng;
use std::fmt;
use std::str::FromStr;

/// Which entries enter the objective
pub enum Inclusion<'a, T> {
    /// Full evaluation weighted by the mask; `None` includes everything
    Mask(Option<&'a Mask<T>>),
    /// Sampled evaluation
    Sampler(&'a mut GcpSampler<T>),
}

/// Everything a solve needs besides the starting point
pub struct Problem<'a, T> {
    pub objective: &'a Objective<T>,
    pub data: &'a TensorData<T>,
    pub inclusion: Inclusion<'a, T>,
    /// Log progress every this many iterations or epochs; 0 is silent
    pub printitn: usize,
}

/// A GCP optimizer
///
/// `solve` receives a unit-weight model and returns a unit-weight model of the
/// same shape and rank, together with its diagnostics.
pub trait GcpSolver<T: GcpFloat> {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether entries are chosen by a sampler instead of a mask.
    fn requires_sampler(&self) -> bool;

    fn supports_sparse(&self) -> bool;

    /// Iteration (or epoch) limit, used to size default gradient samples.
    fn max_iters(&self) -> usize;

    /// Iterations per epoch; the sampler's draw budget is this times `max_iters`.
    fn epoch_iters(&self) -> usize {
        1
    }

    fn solve(
        &mut self,
        initial: &KruskalTensor<T>,
        problem: Problem<'_, T>,
        rng: &mut StdRng,
    ) -> GcpResult<(KruskalTensor<T>, SolveInfo<T>)>;
}

/// Solver selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverKind {
    Lbfgsb,
    Sgd,
    Adam,
    Adagrad,
}

impl SolverKind {
    pub const ALL: [SolverKind; 4] = [
        SolverKind::Lbfgsb,
        SolverKind::Sgd,
        SolverKind::Adam,
        SolverKind::Adagrad,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SolverKind::Lbfgsb => "lbfgsb",
            SolverKind::Sgd => "sgd",
            SolverKind::Adam => "adam",
            SolverKind::Adagrad => "adagrad",
        }
    }

    /// A solver of this kind with default settings.
    pub fn build<T: GcpFloat>(&self) -> Box<dyn GcpSolver<T>> {
        match self {
            SolverKind::Lbfgsb => Box::new(Lbfgsb::new(LbfgsbConfig::default())),
            SolverKind::Sgd => Box::new(StochasticSolver::sgd(StochasticConfig::default())),
            SolverKind::Adam => Box::new(StochasticSolver::adam(
                StochasticConfig::default(),
                AdamConfig::default(),
            )),
            SolverKind::Adagrad => {
                Box::new(StochasticSolver::adagrad(StochasticConfig::default()))
            }
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverKind {
    type Err = GcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        SolverKind::ALL
            .into_iter()
            .find(|k| k.name() == key)
            .ok_or_else(|| {
                GcpError::InvalidInput(format!(
                    "unknown optimizer '{}'; expected one of lbfgsb, sgd, adam, adagrad",
                    s
                ))
            })
    }
}

/// Clamp every factor entry to at least `lb`.
pub(crate) fn project<T: GcpFloat>(factors: &mut [Array2<T>], lb: T) {
    if lb == T::neg_infinity() {
        return;
    }
    for f in factors {
        f.mapv_inplace(|v| if v < lb { lb } else { v });
    }
}

pub(crate) fn all_finite<T: GcpFloat>(arrays: &[Array2<T>]) -> bool {
    arrays.iter().all(|a| a.iter().all(|v| v.is_finite()))
}

/// Rebuild a unit-weight model from solver factors.
pub(crate) fn to_model<T: GcpFloat>(factors: Vec<Array2<T>>) -> GcpResult<KruskalTensor<T>> {
    KruskalTensor::from_factors(factors)
}

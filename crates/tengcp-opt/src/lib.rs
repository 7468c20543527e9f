//! # tengcp-opt
//!
//! Generalized CP (GCP) tensor decomposition.
//!
//! GCP fits a rank-R Kruskal model M to a tensor X by minimizing an
//! elementwise loss chosen to match the data:
//!
//! min Σᵢ wᵢ f(mᵢ, xᵢ)   subject to   factor entries ≥ lower bound
//!
//! - [`objectives`]: the loss catalog (Gaussian, Poisson, Bernoulli, Gamma,
//!   zero-truncated Poisson, ...) and custom losses
//! - [`mask`]: entry weights for full-objective solvers
//! - [`sampler`]: stratified and uniform mini-batch sampling for stochastic solvers
//! - [`solvers`]: projected L-BFGS ([`Lbfgsb`]) and SGD / Adam / Adagrad
//!   ([`StochasticSolver`]) behind the [`GcpSolver`] trait
//! - [`driver`]: [`gcp_opt`], which validates inputs and runs a solver
//! - [`ztp`](mod@ztp): the zero-truncated Poisson wrapper
//!
//! ## Example
//!
//! ```
//! use scirs2_core::random::{rngs::StdRng, SeedableRng};
//! use tengcp_core::DenseND;
//! use tengcp_opt::{gcp_opt, GcpOptions, Objectives, SolverKind, TensorData};
//!
//! let x: TensorData<f64> = DenseND::from_fn(&[4, 3, 2], |i| ((i[0] + i[1] * i[2]) % 3) as f64).into();
//! let mut solver = "lbfgsb".parse::<SolverKind>().unwrap().build::<f64>();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let fit = gcp_opt(&x, 2, Objectives::Poisson, solver.as_mut(), GcpOptions::default().printitn(0), &mut rng);
//! assert!(fit.is_ok());
//! ```

#![deny(warnings)]

pub mod data;
pub mod driver;
pub mod error;
pub mod evaluate;
pub mod info;
pub mod ktensor;
pub mod mask;
pub mod objectives;
pub mod sampler;
pub mod scalar;
pub mod solvers;
pub mod ztp;


pub use data::TensorData;
pub use driver::{gcp_opt, gcp_opt_seeded, GcpFit, GcpOptions, Init, ObjectiveSpec};
pub use error::{GcpError, GcpResult};
pub use info::{ConvergenceReason, IterationRecord, SolveInfo, Termination};
pub use ktensor::KruskalTensor;
pub use mask::Mask;
pub use objectives::{setup, setup_by_name, Domain, Objective, Objectives, Support, EPS};
pub use sampler::{GcpSampler, SampleBatch, SampleSizes, SamplerConfig, SamplerType};
pub use scalar::GcpFloat;
pub use solvers::{
    Adagrad, Adam, AdamConfig, GcpSolver, Inclusion, Lbfgsb, LbfgsbConfig, Problem, Sgd,
    SolverKind, StochasticConfig, StochasticSolver, UpdateRule,
};
pub use ztp::ztp;

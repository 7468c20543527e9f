//! # TenGCP - Generalized CP Tensor Decomposition
//!
//! Fits a rank-R Kruskal model to a dense or sparse tensor by minimizing an
//! elementwise loss chosen from a registry (Gaussian, Poisson, Bernoulli,
//! Gamma, Huber, zero-truncated Poisson, ...), with optional missing-data masks
//! and either a deterministic bound-constrained quasi-Newton solver or
//! sampled stochastic solvers (SGD, Adam, Adagrad).
//!
//! This is the **meta crate** that re-exports all TenGCP components.
//!
//! ## Quick Start
//!
//! ```
//! use tengcp::prelude::*;
//!
//! let counts = DenseND::<f64>::from_fn(&[4, 3, 2], |idx| ((idx[0] + idx[1] * idx[2]) % 3) as f64);
//! let data: TensorData<f64> = counts.into();
//!
//! let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(20));
//! let fit = gcp_opt(
//!     &data,
//!     2,
//!     Objectives::Poisson,
//!     &mut solver,
//!     GcpOptions::default().printitn(0),
//!     &mut StdRng::seed_from_u64(3),
//! )?;
//! assert_eq!(fit.model.shape().as_slice(), &[4, 3, 2]);
//! # Ok::<(), tengcp::opt::GcpError>(())
//! ```
//!
//! ## Components
//!
//! ### Dense Tensors ([`core`])
//!
//! N-dimensional dense storage, unfolding and index arithmetic.
//!
//! ### Sparse Tensors ([`sparse`])
//!
//! Coordinate-format tensors with implicit zeros.
//!
//! ```
//! use tengcp::sparse::CooTensor;
//!
//! let coo = CooTensor::new(vec![vec![0, 0], vec![1, 1]], vec![1.0, 2.0], vec![2, 2]).unwrap();
//! assert_eq!(coo.nnz(), 2);
//! ```
//!
//! ### Kernels ([`kernels`])
//!
//! Khatri-Rao products, dense MTTKRP and the sampled kernels the stochastic
//! solvers run on.
//!
//! ### Decomposition ([`opt`])
//!
//! Objective registry, masks, samplers, solvers, [`gcp_opt`](opt::gcp_opt)
//! and the zero-truncated Poisson wrapper [`ztp`](opt::ztp).

#![deny(warnings)]

pub use tengcp_core as core;
pub use tengcp_kernels as kernels;
pub use tengcp_opt as opt;
pub use tengcp_sparse as sparse;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use tengcp::prelude::*;
    //!
    //! let mut rng = StdRng::seed_from_u64(0);
    //! let model = KruskalTensor::<f64>::random(&[3, 4], 2, &mut rng);
    //! assert_eq!(model.rank(), 2);
    //! ```

    // Tensor types
    pub use crate::core::DenseND;
    pub use crate::sparse::CooTensor;

    // Kernels
    pub use crate::kernels::{khatri_rao, mttkrp};

    // Decomposition
    pub use crate::opt::{
        gcp_opt, gcp_opt_seeded, ztp, GcpFit, GcpOptions, GcpResult, Init, KruskalTensor, Mask,
        Objectives, SamplerConfig, SamplerType, TensorData,
    };

    // Solvers
    pub use crate::opt::{
        AdamConfig, GcpSolver, Lbfgsb, LbfgsbConfig, SolverKind, StochasticConfig,
        StochasticSolver,
    };

    // Random number generation
    pub use scirs2_core::random::{rngs::StdRng, SeedableRng};
}

//! # tengcp-kernels
//!
//! Tensor kernels behind GCP fitting.
//!
//! - [`khatri_rao`] / [`khatri_rao_except`] - column-wise Kronecker products
//! - [`mttkrp`] / [`mttkrp_all`] - dense matricized-tensor times Khatri-Rao product,
//!   used for full gradients
//! - [`kruskal_values_at`] / [`mttkrp_sampled`] - the same algebra over a coordinate
//!   list, used for sampled gradients
//!
//! All kernels report failures through [`KernelError`].
//!
//! ```rust
//! use scirs2_core::ndarray_ext::Array2;
//! use tengcp_core::DenseND;
//! use tengcp_kernels::{khatri_rao, mttkrp};
//!
//! let a = Array2::<f64>::ones((10, 5));
//! let b = Array2::<f64>::ones((8, 5));
//! let kr = khatri_rao(&a.view(), &b.view()).unwrap();
//! assert_eq!(kr.shape(), &[80, 5]);
//!
//! let tensor = DenseND::<f64>::ones(&[3, 4, 5]);
//! let factors = vec![
//!     Array2::<f64>::ones((3, 2)),
//!     Array2::<f64>::ones((4, 2)),
//!     Array2::<f64>::ones((5, 2)),
//! ];
//! let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
//! let g = mttkrp(&tensor.view(), &views, 1).unwrap();
//! assert_eq!(g.shape(), &[4, 2]);
//! ```

#![deny(warnings)]

pub mod error;
pub mod khatri_rao;
pub mod mttkrp;
pub mod sampled;


pub use error::{KernelError, KernelResult};
pub use khatri_rao::{khatri_rao, khatri_rao_except};
pub use mttkrp::{mttkrp, mttkrp_all};
pub use sampled::{kruskal_values_at, mttkrp_sampled};

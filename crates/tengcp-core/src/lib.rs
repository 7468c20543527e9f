//! # tengcp-core
//!
//! Dense tensor storage and index helpers for the tengcp GCP engine.
//!
//! - **Dense tensor representation** ([`DenseND`]) over `scirs2_core::ndarray_ext`
//! - **Coordinate helpers** ([`ops::ravel_index`], [`ops::unravel_index`]) shared by the sparse
//!   format, the samplers and the kernels
//! - **Nonzero extraction** ([`DenseND::find`]) giving the observed support of a dense tensor
//!
//! ## Memory Layout
//!
//! Tensors are C-contiguous (row-major). Every linear index in this workspace follows that
//! ordering: the last mode varies fastest.
//!
//! ## Quick Start
//!
//! ```
//! use tengcp_core::DenseND;
//!
//! let tensor = DenseND::<f64>::from_fn(&[2, 3], |idx| (idx[0] * 3 + idx[1]) as f64);
//! assert_eq!(tensor.shape(), &[2, 3]);
//! assert_eq!(tensor[&[1, 2]], 5.0);
//!
//! let (subs, vals) = tensor.find();
//! assert_eq!(subs.len(), 5);
//! assert_eq!(vals[0], 1.0);
//! ```

#![deny(warnings)]

pub mod dense;
pub mod ops;
pub mod types;


pub use dense::DenseND;
pub use types::{Axis, Rank, Shape};

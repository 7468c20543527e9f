//! # tengcp-sparse
//!
//! Coordinate-format (COO) sparse tensors for the tengcp GCP engine.
//!
//! Real count and event tensors are overwhelmingly zero. [`CooTensor`] stores only the
//! recorded entries as unique `(coordinate, value)` pairs; the engine samples from
//! those entries and from the implicit zeros separately.
//!
//! ```
//! use tengcp_sparse::CooTensor;
//!
//! let coo = CooTensor::new(vec![vec![0, 1], vec![2, 0]], vec![3.0, 1.0], vec![3, 4]).unwrap();
//! assert_eq!(coo.nnz(), 2);
//! assert_eq!(coo.get(&[0, 1]), 3.0);
//! assert_eq!(coo.get(&[1, 1]), 0.0);
//! ```

#![deny(warnings)]

pub mod coo;

pub use coo::{CooError, CooTensor};

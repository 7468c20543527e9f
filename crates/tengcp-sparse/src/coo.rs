//! COO (Coordinate) sparse tensor format
//!
//! For an N-dimensional sparse tensor:
//! - `indices`: `Vec<Vec<usize>>` - each inner vec is one coordinate \[i₀, i₁, ..., iₙ₋₁\]
//! - `values`: `Vec<T>` - the recorded values
//! - `shape`: `Vec<usize>` - the shape of the tensor
//!
//! Coordinates are unique. Entries not listed are zero.
//!
//! # Examples
//!
//! ```
//! use tengcp_sparse::coo::CooTensor;
//!
//! let indices = vec![vec![0, 1], vec![1, 2], vec![2, 0]];
//! let values = vec![2.5, 3.0, 1.5];
//!
//! let coo = CooTensor::new(indices, values, vec![3, 4]).unwrap();
//! assert_eq!(coo.nnz(), 3);
//! assert_eq!(coo.shape(), &[3, 4]);
//! ```

use anyhow::Result;
use scirs2_core::numeric::Float;
use std::collections::HashSet;
use tengcp_core::ops::{checked_numel, ravel_index};
use tengcp_core::DenseND;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CooError {
    #[error(
        "Shape mismatch: indices have {indices_len} elements but shape has {shape_len} dimensions"
    )]
    ShapeMismatch {
        indices_len: usize,
        shape_len: usize,
    },

    #[error("Length mismatch: {indices} indices but {values} values")]
    LengthMismatch { indices: usize, values: usize },

    #[error("Index out of bounds: index {index:?} exceeds shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Duplicate index: {0:?} appears more than once")]
    DuplicateIndex(Vec<usize>),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

/// COO (Coordinate) sparse tensor
///
/// Stores the recorded entries of a tensor as unique (coordinate, value) pairs.
/// The shape is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooTensor<T> {
    indices: Vec<Vec<usize>>,
    values: Vec<T>,
    shape: Vec<usize>,
}

fn validate_shape(shape: &[usize]) -> Result<(), CooError> {
    if shape.is_empty() {
        return Err(CooError::InvalidShape("Shape cannot be empty".to_string()));
    }
    if shape.contains(&0) {
        return Err(CooError::InvalidShape(
            "Shape cannot contain zeros".to_string(),
        ));
    }
    if checked_numel(shape).is_none() {
        return Err(CooError::InvalidShape(format!(
            "Shape {:?} has more entries than fit in usize",
            shape
        )));
    }
    Ok(())
}

impl<T: Clone> CooTensor<T> {
    /// Create a new COO sparse tensor
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Indices and values have different lengths
    /// - Indices dimensionality doesn't match shape
    /// - Any index is out of bounds
    /// - A coordinate is listed twice
    /// - Shape is empty or contains zeros
    pub fn new(
        indices: Vec<Vec<usize>>,
        values: Vec<T>,
        shape: Vec<usize>,
    ) -> Result<Self, CooError> {
        if indices.len() != values.len() {
            return Err(CooError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        validate_shape(&shape)?;

        let mut seen = HashSet::with_capacity(indices.len());
        for idx in &indices {
            if idx.len() != shape.len() {
                return Err(CooError::ShapeMismatch {
                    indices_len: idx.len(),
                    shape_len: shape.len(),
                });
            }
            for (&coord, &size) in idx.iter().zip(&shape) {
                if coord >= size {
                    return Err(CooError::IndexOutOfBounds {
                        index: idx.clone(),
                        shape: shape.clone(),
                    });
                }
            }
            if !seen.insert(ravel_index(idx, &shape)) {
                return Err(CooError::DuplicateIndex(idx.clone()));
            }
        }

        Ok(Self {
            indices,
            values,
            shape,
        })
    }

    /// Create an empty COO tensor with given shape
    pub fn zeros(shape: Vec<usize>) -> Result<Self, CooError> {
        validate_shape(&shape)?;
        Ok(Self {
            indices: Vec::new(),
            values: Vec::new(),
            shape,
        })
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of modes
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of entries, stored or not
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Fraction of entries that are stored
    pub fn density(&self) -> f64 {
        self.nnz() as f64 / self.numel() as f64
    }

    /// Sort entries in row-major (C-contiguous) order
    pub fn sort(&mut self) {
        let mut perm: Vec<usize> = (0..self.nnz()).collect();
        perm.sort_by(|&i, &j| self.indices[i].cmp(&self.indices[j]));

        let indices = perm.iter().map(|&p| self.indices[p].clone()).collect();
        let values = perm.iter().map(|&p| self.values[p].clone()).collect();
        self.indices = indices;
        self.values = values;
    }
}

impl<T: Float> CooTensor<T> {
    /// Value at `index`, zero when the entry is not stored.
    ///
    /// Linear scan; callers needing repeated lookups build their own map.
    pub fn get(&self, index: &[usize]) -> T {
        self.indices
            .iter()
            .position(|idx| idx.as_slice() == index)
            .map(|p| self.values[p])
            .unwrap_or_else(T::zero)
    }

    /// Coordinates and values of the nonzero entries.
    ///
    /// Explicitly stored zeros are skipped, so this agrees with
    /// [`DenseND::find`] on the dense equivalent.
    pub fn find(&self) -> (Vec<Vec<usize>>, Vec<T>) {
        self.indices
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| !v.is_zero())
            .map(|(idx, &v)| (idx.clone(), v))
            .unzip()
    }

    /// Frobenius norm over the stored entries
    pub fn frobenius_norm(&self) -> T {
        self.values
            .iter()
            .fold(T::zero(), |acc, &v| acc + v * v)
            .sqrt()
    }

    /// Convert to dense tensor
    ///
    /// # Complexity
    ///
    /// Time: O(nnz)
    /// Space: O(∏ᵢ shape\[i\])
    pub fn to_dense(&self) -> Result<DenseND<T>> {
        let mut data = vec![T::zero(); self.numel()];
        for (idx, &value) in self.indices.iter().zip(&self.values) {
            data[ravel_index(idx, &self.shape)] = value;
        }
        DenseND::from_vec(data, &self.shape)
    }

    /// Create COO tensor from dense tensor
    ///
    /// Only stores elements where |value| > threshold.
    pub fn from_dense(dense: &DenseND<T>, threshold: T) -> Result<Self, CooError> {
        let (subs, vals) = dense.find();
        let (indices, values) = subs
            .into_iter()
            .zip(vals)
            .filter(|(_, v)| v.abs() > threshold)
            .unzip();
        Self::new(indices, values, dense.shape().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_lengths() {
        let err = CooTensor::new(vec![vec![0, 0]], vec![1.0, 2.0], vec![2, 2]).unwrap_err();
        assert_eq!(
            err,
            CooError::LengthMismatch {
                indices: 1,
                values: 2
            }
        );
    }

    #[test]
    fn test_new_rejects_out_of_bounds() {
        let err = CooTensor::new(vec![vec![2, 0]], vec![1.0], vec![2, 2]).unwrap_err();
        assert!(matches!(err, CooError::IndexOutOfBounds { .. }));
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let err = CooTensor::new(vec![vec![1, 1], vec![1, 1]], vec![1.0, 2.0], vec![2, 2])
            .unwrap_err();
        assert_eq!(err, CooError::DuplicateIndex(vec![1, 1]));
    }

    #[test]
    fn test_new_rejects_bad_shape() {
        assert!(CooTensor::<f64>::new(vec![], vec![], vec![]).is_err());
        assert!(CooTensor::<f64>::zeros(vec![3, 0]).is_err());
    }

    #[test]
    fn test_new_rejects_overflowing_shape() {
        let err = CooTensor::new(vec![vec![0, 0, 0]], vec![1.0], vec![1 << 22, 1 << 22, 1 << 22])
            .unwrap_err();
        assert!(matches!(err, CooError::InvalidShape(_)));
        assert!(CooTensor::<f64>::zeros(vec![usize::MAX, 2]).is_err());
    }

    #[test]
    fn test_new_accepts_large_shape_that_fits() {
        let coo = CooTensor::new(
            vec![vec![(1 << 20) - 1, (1 << 20) - 1]],
            vec![1.0],
            vec![1 << 20, 1 << 20],
        )
        .unwrap();
        assert_eq!(coo.numel(), 1 << 40);
    }

    #[test]
    fn test_dense_roundtrip() {
        let coo = CooTensor::new(
            vec![vec![0, 1, 0], vec![1, 0, 1]],
            vec![4.0, 5.0],
            vec![2, 2, 2],
        )
        .unwrap();
        let dense = coo.to_dense().unwrap();
        assert_eq!(dense[&[0, 1, 0]], 4.0);
        assert_eq!(dense[&[1, 0, 1]], 5.0);
        assert_eq!(dense.sum(), 9.0);

        let back = CooTensor::from_dense(&dense, 0.0).unwrap();
        assert_eq!(back, coo);
    }

    #[test]
    fn test_find_skips_stored_zeros() {
        let coo = CooTensor::new(vec![vec![0], vec![1]], vec![0.0, 2.0], vec![3]).unwrap();
        let (subs, vals) = coo.find();
        assert_eq!(subs, vec![vec![1]]);
        assert_eq!(vals, vec![2.0]);
    }

    #[test]
    fn test_sort_row_major() {
        let mut coo = CooTensor::new(
            vec![vec![1, 0], vec![0, 1], vec![0, 0]],
            vec![3.0, 2.0, 1.0],
            vec![2, 2],
        )
        .unwrap();
        coo.sort();
        assert_eq!(coo.indices(), &[vec![0, 0], vec![0, 1], vec![1, 0]]);
        assert_eq!(coo.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_norm_and_density() {
        let coo = CooTensor::new(vec![vec![0, 0], vec![1, 1]], vec![3.0, 4.0], vec![2, 5]).unwrap();
        assert_eq!(coo.frobenius_norm(), 5.0);
        assert!((coo.density() - 0.2).abs() < 1e-12);
    }
}

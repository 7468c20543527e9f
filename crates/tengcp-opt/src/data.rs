//! Dense-or-sparse input tensors

use crate::error::{GcpError, GcpResult};
use crate::scalar::GcpFloat;
use std::collections::HashMap;
use tengcp_core::ops::ravel_index;
use tengcp_core::DenseND;
use tengcp_sparse::CooTensor;

/// The tensor being fit: dense storage or coordinate-format sparse storage.
///
/// # Examples
///
/// ```
/// use tengcp_core::DenseND;
/// use tengcp_opt::TensorData;
///
/// let data: TensorData<f64> = DenseND::from_vec(vec![1.0, 0.0, 0.0, 1.0], &[2, 2]).unwrap().into();
/// assert_eq!(data.shape(), &[2, 2]);
/// assert!(!data.is_sparse());
/// assert_eq!(data.find().0.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData<T> {
    Dense(DenseND<T>),
    Sparse(CooTensor<T>),
}

impl<T> From<DenseND<T>> for TensorData<T> {
    fn from(t: DenseND<T>) -> Self {
        TensorData::Dense(t)
    }
}

impl<T> From<CooTensor<T>> for TensorData<T> {
    fn from(t: CooTensor<T>) -> Self {
        TensorData::Sparse(t)
    }
}

impl<T: GcpFloat> TensorData<T> {
    pub fn shape(&self) -> &[usize] {
        match self {
            TensorData::Dense(t) => t.shape(),
            TensorData::Sparse(t) => t.shape(),
        }
    }

    /// Number of modes.
    pub fn ndims(&self) -> usize {
        self.shape().len()
    }

    /// Total number of entries, stored or implicit.
    pub fn numel(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, TensorData::Sparse(_))
    }

    pub fn as_dense(&self) -> Option<&DenseND<T>> {
        match self {
            TensorData::Dense(t) => Some(t),
            TensorData::Sparse(_) => None,
        }
    }

    /// Coordinates and values of the nonzero entries.
    pub fn find(&self) -> (Vec<Vec<usize>>, Vec<T>) {
        match self {
            TensorData::Dense(t) => t.find(),
            TensorData::Sparse(t) => t.find(),
        }
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        match self {
            TensorData::Dense(t) => t.nnz(),
            TensorData::Sparse(t) => t.values().iter().filter(|v| !v.is_zero()).count(),
        }
    }

    /// Value at `index`; zero for unstored sparse entries.
    pub fn value_at(&self, index: &[usize]) -> T {
        match self {
            TensorData::Dense(t) => t[index],
            TensorData::Sparse(t) => t.get(index),
        }
    }

    /// Frobenius norm.
    pub fn norm(&self) -> T {
        match self {
            TensorData::Dense(t) => t.frobenius_norm(),
            TensorData::Sparse(t) => t.frobenius_norm(),
        }
    }

    /// Every value the objective will see: all dense entries, or the stored
    /// sparse entries plus an implicit zero when any entry is unstored.
    pub(crate) fn domain_values(&self) -> Box<dyn Iterator<Item = T> + '_> {
        match self {
            TensorData::Dense(t) => Box::new(t.iter().copied()),
            TensorData::Sparse(t) => {
                let implicit_zero = (t.nnz() < t.numel()).then(T::zero);
                Box::new(t.values().iter().copied().chain(implicit_zero))
            }
        }
    }

    /// Map from row-major linear index to stored value, for repeated sparse lookups.
    pub(crate) fn value_map(&self) -> HashMap<usize, T> {
        let (subs, vals) = self.find();
        let shape = self.shape();
        subs.iter()
            .zip(vals)
            .map(|(s, v)| (ravel_index(s, shape), v))
            .collect()
    }

    /// Reject tensors the engine cannot fit: no modes, or non-finite values.
    ///
    /// Zero-sized modes are already impossible for [`CooTensor`]; dense tensors
    /// are checked here.
    pub fn validate(&self) -> GcpResult<()> {
        let shape = self.shape();
        if shape.is_empty() || shape.contains(&0) {
            return Err(GcpError::InvalidInput(format!(
                "data must be a non-empty dense or sparse tensor, got shape {:?}",
                shape
            )));
        }
        if self.domain_values().any(|v| !v.is_finite()) {
            return Err(GcpError::InvalidInput(
                "data must be a non-empty dense or sparse tensor with finite values".into(),
            ));
        }
        Ok(())
    }

    /// Short storage description for log lines.
    pub(crate) fn describe(&self) -> String {
        match self {
            TensorData::Dense(t) => format!("dense {:?}", t.shape()),
            TensorData::Sparse(t) => format!("sparse {:?} with {} stored entries", t.shape(), t.nnz()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse() -> TensorData<f64> {
        CooTensor::new(vec![vec![0, 1], vec![1, 0]], vec![2.0, 3.0], vec![2, 3])
            .unwrap()
            .into()
    }

    #[test]
    fn test_sparse_queries() {
        let data = sparse();
        assert!(data.is_sparse());
        assert_eq!(data.numel(), 6);
        assert_eq!(data.nnz(), 2);
        assert_eq!(data.value_at(&[1, 0]), 3.0);
        assert_eq!(data.value_at(&[1, 2]), 0.0);
        assert!((data.norm() - 13f64.sqrt()).abs() < 1e-12);
        assert_eq!(data.value_map().get(&3), Some(&3.0));
    }

    #[test]
    fn test_domain_values_include_implicit_zero() {
        let vals: Vec<f64> = sparse().domain_values().collect();
        assert_eq!(vals, vec![2.0, 3.0, 0.0]);

        let full: TensorData<f64> =
            CooTensor::new(vec![vec![0], vec![1]], vec![1.0, 1.0], vec![2]).unwrap().into();
        assert_eq!(full.domain_values().count(), 2);
    }

    #[test]
    fn test_validate() {
        assert!(sparse().validate().is_ok());

        let empty: TensorData<f64> = DenseND::zeros(&[0, 2]).into();
        assert!(matches!(empty.validate(), Err(GcpError::InvalidInput(_))));

        let scalar: TensorData<f64> = DenseND::zeros(&[]).into();
        assert!(matches!(scalar.validate(), Err(GcpError::InvalidInput(_))));

        let mut t = DenseND::<f64>::ones(&[2]);
        t[&[0]] = f64::INFINITY;
        let bad: TensorData<f64> = t.into();
        assert!(matches!(bad.validate(), Err(GcpError::InvalidInput(_))));
    }

    #[test]
    fn test_overflowing_sparse_shape_is_an_error() {
        let built: GcpResult<TensorData<f64>> =
            CooTensor::new(vec![vec![1, 2, 3]], vec![1.0], vec![1 << 22, 1 << 22, 1 << 22])
                .map(TensorData::from)
                .map_err(GcpError::from);
        assert!(matches!(built, Err(GcpError::Sparse(_))));
    }
}

//! Entry masks: which entries of the data enter the objective sum
//!
//! A mask is a data-shaped tensor of non-negative weights, usually 0/1. An
//! absent mask is resolved once by the driver from the objective's
//! [`Support`]: every entry, or the observed (nonzero) support.

use crate::data::TensorData;
use crate::error::{GcpError, GcpResult};
use crate::objectives::Support;
use crate::scalar::GcpFloat;
use tengcp_core::DenseND;

/// Dense indicator or weight tensor over the data's entries
#[derive(Debug, Clone, PartialEq)]
pub struct Mask<T> {
    weights: DenseND<T>,
}

impl<T: GcpFloat> Mask<T> {
    /// Wrap a dense weight tensor. Entries must be finite and non-negative.
    pub fn from_dense(weights: DenseND<T>) -> GcpResult<Self> {
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < T::zero()) {
            return Err(GcpError::InvalidInput(format!(
                "mask entries must be finite and non-negative, found {}",
                bad
            )));
        }
        Ok(Self { weights })
    }

    /// Include every entry.
    pub fn all(shape: &[usize]) -> Self {
        Self {
            weights: DenseND::ones(shape),
        }
    }

    /// Include exactly the nonzero entries of `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tengcp_core::DenseND;
    /// use tengcp_opt::{Mask, TensorData};
    ///
    /// let data: TensorData<f64> = DenseND::from_vec(vec![1.0, 0.0, 0.0, 4.0], &[2, 2]).unwrap().into();
    /// let mask = Mask::observed(&data);
    /// assert_eq!(mask.count(), 2);
    /// assert!(mask.is_included(&[1, 1]));
    /// assert!(!mask.is_included(&[0, 1]));
    /// ```
    pub fn observed(data: &TensorData<T>) -> Self {
        let mut weights = DenseND::zeros(data.shape());
        let (subs, _) = data.find();
        for sub in &subs {
            weights[sub.as_slice()] = T::one();
        }
        Self { weights }
    }

    /// The mask implied by an inclusion policy when the caller gives none.
    pub fn build_default(data: &TensorData<T>, support: Support) -> Self {
        match support {
            Support::All => Self::all(data.shape()),
            Support::Observed => Self::observed(data),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.weights.shape()
    }

    /// Check that the mask covers `data` entry for entry.
    pub fn validate(&self, data: &TensorData<T>) -> GcpResult<()> {
        if self.shape() != data.shape() {
            return Err(GcpError::shape_mismatch(
                data.shape(),
                self.shape(),
                "mask shape must equal data shape",
            ));
        }
        Ok(())
    }

    pub fn weight(&self, index: &[usize]) -> T {
        self.weights[index]
    }

    pub fn is_included(&self, index: &[usize]) -> bool {
        self.weights[index] > T::zero()
    }

    /// Number of included entries.
    pub fn count(&self) -> usize {
        self.weights.nnz()
    }

    pub fn as_dense(&self) -> &DenseND<T> {
        &self.weights
    }

    /// Copy of dense data with excluded entries set to zero.
    ///
    /// Included entries keep their value whatever their weight; weights only
    /// scale loss terms.
    pub fn apply(&self, dense: &DenseND<T>) -> GcpResult<DenseND<T>> {
        if !dense.same_shape(&self.weights) {
            return Err(GcpError::shape_mismatch(
                dense.shape(),
                self.shape(),
                "mask shape must equal data shape",
            ));
        }
        Ok(dense.zip_map(&self.weights, |x, w| if w.is_zero() { T::zero() } else { x })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tengcp_sparse::CooTensor;

    #[test]
    fn test_observed_sparse() {
        let data: TensorData<f64> = CooTensor::new(
            vec![vec![0, 0, 1], vec![1, 2, 0]],
            vec![3.0, 1.0],
            vec![2, 3, 2],
        )
        .unwrap()
        .into();
        let mask = Mask::observed(&data);
        assert_eq!(mask.count(), 2);
        assert!(mask.is_included(&[1, 2, 0]));
        assert_eq!(mask.weight(&[0, 0, 0]), 0.0);
        assert!(mask.validate(&data).is_ok());
    }

    #[test]
    fn test_build_default() {
        let data: TensorData<f64> = DenseND::from_vec(vec![0.0, 2.0, 0.0], &[3]).unwrap().into();
        assert_eq!(Mask::build_default(&data, Support::All).count(), 3);
        assert_eq!(Mask::build_default(&data, Support::Observed).count(), 1);
    }

    #[test]
    fn test_validate_shape_mismatch() {
        let data: TensorData<f64> = DenseND::ones(&[2, 2]).into();
        let err = Mask::<f64>::all(&[2, 3]).validate(&data).unwrap_err();
        assert!(matches!(err, GcpError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_from_dense_rejects_negative() {
        let w = DenseND::from_vec(vec![1.0, -1.0], &[2]).unwrap();
        assert!(matches!(Mask::from_dense(w), Err(GcpError::InvalidInput(_))));
    }

    #[test]
    fn test_apply_zeroes_excluded() {
        let x = DenseND::from_vec(vec![5.0, 6.0, 7.0], &[3]).unwrap();
        let mask = Mask::from_dense(DenseND::from_vec(vec![1.0, 0.0, 1.0], &[3]).unwrap()).unwrap();
        assert_eq!(mask.apply(&x).unwrap().to_vec(), vec![5.0, 0.0, 7.0]);
    }

    #[test]
    fn test_apply_keeps_values_under_fractional_weights() {
        let x = DenseND::from_vec(vec![3.0, 2.0, 4.0], &[3]).unwrap();
        let mask = Mask::from_dense(DenseND::from_vec(vec![0.5, 0.0, 2.5], &[3]).unwrap()).unwrap();
        assert_eq!(mask.apply(&x).unwrap().to_vec(), vec![3.0, 0.0, 4.0]);
    }
}

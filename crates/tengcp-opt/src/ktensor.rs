//! Kruskal (CP) tensors: weights plus one factor matrix per mode
//!
//! A rank-R Kruskal tensor represents
//!
//! X = Σᵣ λᵣ (u₁ᵣ ⊗ u₂ᵣ ⊗ ... ⊗ uₙᵣ)
//!
//! where uₖᵣ is column r of factor matrix k and λ is the weight vector.

use crate::error::{GcpError, GcpResult};
use crate::evaluate::full_model;
use crate::scalar::GcpFloat;
use scirs2_core::ndarray_ext::{Array1, Array2};
use scirs2_core::random::Rng;
use tengcp_core::{DenseND, Shape};
use tengcp_kernels::kruskal_values_at;

/// Weights and factor matrices of a CP model
///
/// Invariant: every factor matrix has `rank` columns and `weights.len() == rank`.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tengcp_opt::KruskalTensor;
///
/// let a = array![[1.0, 0.0], [0.0, 1.0]];
/// let b = array![[1.0, 2.0], [3.0, 4.0]];
/// let k = KruskalTensor::new(array![2.0, 1.0], vec![a, b]).unwrap();
///
/// let full = k.full().unwrap();
/// assert_eq!(full[&[0, 1]], 2.0 * 1.0 * 3.0);
/// assert_eq!(k.value_at(&[1, 1]), 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KruskalTensor<T> {
    weights: Array1<T>,
    factors: Vec<Array2<T>>,
}

impl<T: GcpFloat> KruskalTensor<T> {
    /// Build a model, checking that weights and factors agree on the rank.
    pub fn new(weights: Array1<T>, factors: Vec<Array2<T>>) -> GcpResult<Self> {
        if factors.is_empty() {
            return Err(GcpError::InvalidInput(
                "a Kruskal tensor needs at least one factor matrix".into(),
            ));
        }
        let rank = weights.len();
        for (k, f) in factors.iter().enumerate() {
            if f.ncols() != rank {
                return Err(GcpError::InvalidInput(format!(
                    "factor matrix {} has {} columns but there are {} weights",
                    k,
                    f.ncols(),
                    rank
                )));
            }
            if f.nrows() == 0 {
                return Err(GcpError::InvalidInput(format!(
                    "factor matrix {} has no rows",
                    k
                )));
            }
        }
        Ok(Self { weights, factors })
    }

    /// Wrap factor matrices with unit weights.
    pub fn from_factors(factors: Vec<Array2<T>>) -> GcpResult<Self> {
        let rank = factors.first().map_or(0, |f| f.ncols());
        Self::new(Array1::ones(rank), factors)
    }

    /// Unit weights and factors drawn uniformly from `[0, 1)`.
    ///
    /// Factors are filled mode by mode, each in row-major order, so a seeded
    /// generator reproduces the model.
    pub fn random<R: Rng>(shape: &[usize], rank: usize, rng: &mut R) -> Self {
        let factors = shape
            .iter()
            .map(|&n| Array2::from_shape_fn((n, rank), |_| T::of(rng.random::<f64>())))
            .collect();
        Self {
            weights: Array1::ones(rank),
            factors,
        }
    }

    pub fn rank(&self) -> usize {
        self.weights.len()
    }

    /// Number of modes.
    pub fn ndims(&self) -> usize {
        self.factors.len()
    }

    pub fn shape(&self) -> Shape {
        self.factors.iter().map(|f| f.nrows()).collect()
    }

    pub fn weights(&self) -> &Array1<T> {
        &self.weights
    }

    pub fn factors(&self) -> &[Array2<T>] {
        &self.factors
    }

    pub fn into_parts(self) -> (Array1<T>, Vec<Array2<T>>) {
        (self.weights, self.factors)
    }

    /// Dense reconstruction.
    ///
    /// # Complexity
    ///
    /// Time: O(R × N × ∏ᵢ Iᵢ)
    /// Space: O(∏ᵢ Iᵢ)
    pub fn full(&self) -> GcpResult<DenseND<T>> {
        let mut factors = self.factors.clone();
        if let Some(first) = factors.first_mut() {
            for (mut col, &w) in first.columns_mut().into_iter().zip(self.weights.iter()) {
                col.mapv_inplace(|x| x * w);
            }
        }
        full_model(&factors)
    }

    /// Model value at one coordinate. The caller guarantees it is in bounds.
    pub fn value_at(&self, index: &[usize]) -> T {
        (0..self.rank()).fold(T::zero(), |acc, r| {
            let prod = index
                .iter()
                .zip(&self.factors)
                .fold(self.weights[r], |p, (&i, f)| p * f[[i, r]]);
            acc + prod
        })
    }

    /// Model values at many coordinates, bounds-checked.
    pub fn values_at(&self, subs: &[Vec<usize>]) -> GcpResult<Vec<T>> {
        let views: Vec<_> = self.factors.iter().map(|f| f.view()).collect();
        Ok(kruskal_values_at(&views, Some(self.weights.view()), subs)?)
    }

    /// Frobenius norm, computed from the factor Gram matrices.
    pub fn norm(&self) -> T {
        let rank = self.rank();
        let mut coef = Array2::<T>::from_shape_fn((rank, rank), |(r, s)| {
            self.weights[r] * self.weights[s]
        });
        for f in &self.factors {
            coef = coef * f.t().dot(f);
        }
        coef.sum().max(T::zero()).sqrt()
    }

    /// Multiply every weight by `s`.
    pub fn scale(&mut self, s: T) {
        self.weights.mapv_inplace(|w| w * s);
    }

    /// Fold the weights into factor `mode` so that every weight becomes 1.
    ///
    /// The represented tensor is unchanged.
    pub fn absorb_weights(&mut self, mode: usize) -> GcpResult<()> {
        if mode >= self.ndims() {
            return Err(GcpError::InvalidInput(format!(
                "mode {} out of range for a {}-way Kruskal tensor",
                mode,
                self.ndims()
            )));
        }
        let weights = self.weights.clone();
        for (mut col, &w) in self.factors[mode].columns_mut().into_iter().zip(&weights) {
            col.mapv_inplace(|x| x * w);
        }
        self.weights.fill(T::one());
        Ok(())
    }

    /// Move column norms into the weights and sort components by weight, descending.
    ///
    /// Columns with zero norm are left as they are.
    pub fn normalize(&mut self) {
        let rank = self.rank();
        for f in &mut self.factors {
            for r in 0..rank {
                let norm = f.column(r).iter().fold(T::zero(), |a, &x| a + x * x).sqrt();
                if norm > T::zero() {
                    self.weights[r] *= norm;
                    f.column_mut(r).mapv_inplace(|x| x / norm);
                }
            }
        }
        for r in 0..rank {
            if self.weights[r] < T::zero() {
                self.weights[r] = -self.weights[r];
                self.factors[0].column_mut(r).mapv_inplace(|x| -x);
            }
        }

        let mut order: Vec<usize> = (0..rank).collect();
        order.sort_by(|&a, &b| {
            self.weights[b]
                .partial_cmp(&self.weights[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.weights = order.iter().map(|&r| self.weights[r]).collect();
        for f in &mut self.factors {
            let permuted = Array2::from_shape_fn((f.nrows(), rank), |(i, r)| f[[i, order[r]]]);
            *f = permuted;
        }
    }

    /// Exact equality of weights and factors.
    pub fn isequal(&self, other: &Self) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;
    use scirs2_core::random::{rngs::StdRng, SeedableRng};

    fn model() -> KruskalTensor<f64> {
        KruskalTensor::new(
            array![3.0, 0.5],
            vec![
                array![[1.0, 2.0], [0.0, 1.0]],
                array![[1.0, -1.0], [2.0, 0.0], [0.5, 1.0]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_rank_mismatch() {
        let err = KruskalTensor::new(array![1.0], vec![array![[1.0, 2.0]]]).unwrap_err();
        assert!(matches!(err, GcpError::InvalidInput(_)));
        assert!(KruskalTensor::<f64>::new(array![1.0], vec![]).is_err());
    }

    #[test]
    fn test_full_matches_value_at() {
        let k = model();
        let full = k.full().unwrap();
        assert_eq!(full.shape(), &[2, 3]);
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(full[&[i, j]], k.value_at(&[i, j]));
            }
        }
        assert_eq!(full[&[0, 0]], 3.0 * 1.0 * 1.0 + 0.5 * 2.0 * -1.0);
    }

    #[test]
    fn test_full_folds_weights_into_first_factor() {
        let k = model();
        let mut absorbed = k.clone();
        absorbed.absorb_weights(0).unwrap();
        let a = k.full().unwrap();
        let b = full_model(absorbed.factors()).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_values_at_bounds_checked() {
        let k = model();
        assert_eq!(k.values_at(&[vec![1, 2]]).unwrap(), vec![k.value_at(&[1, 2])]);
        assert!(k.values_at(&[vec![2, 0]]).is_err());
    }

    #[test]
    fn test_norm_matches_full() {
        let k = model();
        let expected = k.full().unwrap().frobenius_norm();
        assert!((k.norm() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_absorb_weights_preserves_tensor() {
        let k = model();
        let mut absorbed = k.clone();
        absorbed.absorb_weights(0).unwrap();
        assert!(absorbed.weights().iter().all(|&w| w == 1.0));
        let a = k.full().unwrap();
        let b = absorbed.full().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
        assert!(absorbed.absorb_weights(2).is_err());
    }

    #[test]
    fn test_normalize_sorts_and_preserves_tensor() {
        let k = model();
        let mut n = k.clone();
        n.normalize();
        assert!(n.weights()[0] >= n.weights()[1]);
        for f in n.factors() {
            for col in f.columns() {
                let norm: f64 = col.iter().map(|x| x * x).sum::<f64>().sqrt();
                assert!((norm - 1.0).abs() < 1e-12);
            }
        }
        let a = k.full().unwrap();
        let b = n.full().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_random_is_reproducible() {
        let a = KruskalTensor::<f64>::random(&[3, 4], 2, &mut StdRng::seed_from_u64(9));
        let b = KruskalTensor::<f64>::random(&[3, 4], 2, &mut StdRng::seed_from_u64(9));
        assert!(a.isequal(&b));
        assert_eq!(a.shape().as_slice(), &[3, 4]);
        assert!(a.factors().iter().all(|f| f.iter().all(|&x| (0.0..1.0).contains(&x))));
        assert!(a.weights().iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_from_factors_unit_weights() {
        let k = KruskalTensor::from_factors(vec![array![[1.0, 2.0]], array![[3.0, 4.0]]]).unwrap();
        assert_eq!(k.rank(), 2);
        assert_eq!(k.weights(), &array![1.0, 1.0]);
    }
}

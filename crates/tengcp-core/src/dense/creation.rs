//! Tensor creation from functions and seeded random draws

use super::types::DenseND;
use scirs2_core::ndarray_ext::{Array, IxDyn};
use scirs2_core::numeric::{Num, NumCast};
use scirs2_core::random::Rng;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Build a tensor by evaluating `f` at every index, in row-major order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tengcp_core::DenseND;
    ///
    /// let eye = DenseND::<f64>::from_fn(&[3, 3], |idx| if idx[0] == idx[1] { 1.0 } else { 0.0 });
    /// assert_eq!(eye[&[1, 1]], 1.0);
    /// assert_eq!(eye[&[0, 2]], 0.0);
    /// ```
    pub fn from_fn<F>(shape: &[usize], f: F) -> Self
    where
        F: FnMut(&[usize]) -> T,
    {
        let mut tensor = Self::zeros(shape);
        tensor.fill_with(f);
        tensor
    }

    /// Tensor with independent uniform draws from `[low, high)`.
    ///
    /// Entries are drawn in row-major order from `rng`, so a seeded generator
    /// reproduces the tensor exactly.
    ///
    /// # Examples
    ///
    /// ```
    /// use scirs2_core::random::{rngs::StdRng, SeedableRng};
    /// use tengcp_core::DenseND;
    ///
    /// let mut a = StdRng::seed_from_u64(7);
    /// let mut b = StdRng::seed_from_u64(7);
    /// let x = DenseND::<f64>::random_uniform(&[2, 3], 0.0, 1.0, &mut a);
    /// let y = DenseND::<f64>::random_uniform(&[2, 3], 0.0, 1.0, &mut b);
    /// assert_eq!(x, y);
    /// ```
    pub fn random_uniform<R>(shape: &[usize], low: f64, high: f64, rng: &mut R) -> Self
    where
        T: NumCast,
        R: Rng,
    {
        let range = high - low;
        let data = Array::from_shape_fn(IxDyn(shape), |_| {
            let sample = low + rng.random::<f64>() * range;
            <T as NumCast>::from(sample).unwrap_or_else(T::zero)
        });
        Self::from_array(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::random::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_from_fn_matches_index() {
        let t = DenseND::<f64>::from_fn(&[2, 3, 2], |idx| (idx[0] * 100 + idx[1] * 10 + idx[2]) as f64);
        assert_eq!(t[&[1, 2, 1]], 121.0);
        assert_eq!(t[&[0, 1, 0]], 10.0);
    }

    #[test]
    fn test_random_uniform_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let t = DenseND::<f64>::random_uniform(&[4, 5], -1.0, 2.0, &mut rng);
        assert!(t.iter().all(|&v| (-1.0..2.0).contains(&v)));
    }

    #[test]
    fn test_random_uniform_advances_rng() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = DenseND::<f64>::random_uniform(&[3], 0.0, 1.0, &mut rng);
        let b = DenseND::<f64>::random_uniform(&[3], 0.0, 1.0, &mut rng);
        assert_ne!(a, b);
    }
}

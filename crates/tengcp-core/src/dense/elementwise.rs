//! Elementwise maps, masked products and reductions

use super::types::DenseND;
use scirs2_core::ndarray_ext::Zip;
use scirs2_core::numeric::{Float, Num};

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Apply `f` to every entry, returning a new tensor.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Self {
            data: self.data.mapv(|x| f(x)),
        }
    }

    pub fn map_inplace<F>(&mut self, f: F)
    where
        F: Fn(T) -> T,
    {
        self.data.mapv_inplace(|x| f(x));
    }

    /// Combine two same-shaped tensors entry by entry.
    pub fn zip_map<F>(&self, other: &Self, f: F) -> anyhow::Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        if !self.same_shape(other) {
            anyhow::bail!(
                "Shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            );
        }
        let mut out = self.data.clone();
        Zip::from(&mut out)
            .and(&other.data)
            .for_each(|a, b| *a = f(a.clone(), b.clone()));
        Ok(Self { data: out })
    }

    /// Elementwise (Hadamard) product.
    ///
    /// # Examples
    ///
    /// ```
    /// use tengcp_core::DenseND;
    ///
    /// let x = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// let w = DenseND::from_vec(vec![1.0, 0.0, 0.0, 1.0], &[2, 2]).unwrap();
    /// assert_eq!(x.hadamard(&w).unwrap().to_vec(), vec![1.0, 0.0, 0.0, 4.0]);
    /// ```
    pub fn hadamard(&self, other: &Self) -> anyhow::Result<Self> {
        self.zip_map(other, |a, b| a * b)
    }

    pub fn sum(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, v| acc + v.clone())
    }
}

impl<T> DenseND<T>
where
    T: Float,
{
    /// Frobenius norm: square root of the sum of squared entries.
    pub fn frobenius_norm(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &v| acc + v * v)
            .sqrt()
    }

    /// Whether every entry is finite.
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

//! Dense tensor type definition and basic accessors

use scirs2_core::ndarray_ext::{Array, ArrayView, ArrayViewMut, IxDyn};
use scirs2_core::numeric::Num;

/// Dense N-dimensional tensor backed by scirs2_core's ndarray
///
/// Storage is C-contiguous (row-major), so linear positions agree with
/// [`crate::ops::ravel_index`].
///
/// # Examples
///
/// ```
/// use tengcp_core::DenseND;
///
/// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
/// assert_eq!(tensor.shape(), &[2, 3, 4]);
/// assert_eq!(tensor.rank(), 3);
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(serialize = "T: serde::Serialize")))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "T: serde::Deserialize<'de>"))
)]
pub struct DenseND<T> {
    pub(crate) data: Array<T, IxDyn>,
}

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Create a tensor from an existing ndarray.
    ///
    /// Non-standard layouts are copied into row-major order.
    pub fn from_array(array: Array<T, IxDyn>) -> Self {
        let data = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        Self { data }
    }

    /// Create a tensor from a vector with given shape
    ///
    /// # Arguments
    ///
    /// * `vec` - Flattened data in row-major order
    /// * `shape` - Target shape
    ///
    /// # Examples
    ///
    /// ```
    /// use tengcp_core::DenseND;
    ///
    /// let tensor = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(tensor[&[1, 0]], 3.0);
    /// assert!(DenseND::from_vec(vec![1.0, 2.0], &[3]).is_err());
    /// ```
    pub fn from_vec(vec: Vec<T>, shape: &[usize]) -> anyhow::Result<Self> {
        let total = match crate::ops::checked_numel(shape) {
            Some(total) => total,
            None => anyhow::bail!("Shape {:?} has more entries than fit in usize", shape),
        };
        if vec.len() != total {
            anyhow::bail!(
                "Shape {:?} requires {} elements, but got {}",
                shape,
                total,
                vec.len()
            );
        }
        let array = Array::from_shape_vec(IxDyn(shape), vec)?;
        Ok(Self { data: array })
    }

    /// Number of modes.
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_array(&self) -> &Array<T, IxDyn> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array<T, IxDyn> {
        &mut self.data
    }

    pub fn into_array(self) -> Array<T, IxDyn> {
        self.data
    }

    pub fn view(&self) -> ArrayView<'_, T, IxDyn> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut<'_, T, IxDyn> {
        self.data.view_mut()
    }

    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// Entries in row-major order.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Overwrite every entry with `f(index)`, visiting entries in row-major order.
    pub fn fill_with<F>(&mut self, mut f: F)
    where
        F: FnMut(&[usize]) -> T,
    {
        let shape = self.shape().to_vec();
        if shape.is_empty() {
            return;
        }
        let mut indices = vec![0; shape.len()];
        for i in 0..self.len() {
            crate::ops::unravel_into(i, &shape, &mut indices);
            let value = f(&indices);
            self.data[&indices[..]] = value;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut()
    }

    pub fn same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_row_major() {
        let t = DenseND::from_vec((0..6).map(|x| x as f64).collect(), &[2, 3]).unwrap();
        assert_eq!(t[&[0, 2]], 2.0);
        assert_eq!(t[&[1, 0]], 3.0);
        assert_eq!(t.len(), 6);
        assert_eq!(t.rank(), 2);
    }

    #[test]
    fn test_from_vec_wrong_length() {
        let err = DenseND::from_vec(vec![1.0f64; 5], &[2, 3]).unwrap_err();
        assert!(err.to_string().contains("requires 6 elements"));
    }

    #[test]
    fn test_from_vec_overflowing_shape() {
        let err = DenseND::from_vec(vec![1.0f64; 4], &[1 << 22, 1 << 22, 1 << 22]).unwrap_err();
        assert!(err.to_string().contains("more entries than fit"));
    }

    #[test]
    fn test_fill_with_visits_every_index() {
        let mut t = DenseND::<f64>::zeros(&[2, 2, 2]);
        t.fill_with(|idx| (idx[0] * 4 + idx[1] * 2 + idx[2]) as f64);
        assert_eq!(t.to_vec(), (0..8).map(|x| x as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_from_array_standardizes_layout() {
        let arr = Array::from_shape_vec(IxDyn(&[2, 3]), (0..6).map(|x| x as f64).collect())
            .unwrap()
            .reversed_axes();
        let t = DenseND::from_array(arr);
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.to_vec(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }
}

//! Checked access and nonzero extraction

use super::types::DenseND;
use scirs2_core::ndarray_ext::{Dimension, IxDyn};
use scirs2_core::numeric::Num;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Entry at `index`, or `None` when out of bounds or of the wrong order.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.rank() {
            return None;
        }
        self.data.get(IxDyn(index))
    }

    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        if index.len() != self.rank() {
            return None;
        }
        self.data.get_mut(IxDyn(index))
    }

    /// Coordinates and values of every nonzero entry, in row-major order.
    ///
    /// This is the observed support of a dense tensor: the same pair a sparse
    /// tensor stores explicitly.
    ///
    /// # Examples
    ///
    /// ```
    /// use tengcp_core::DenseND;
    ///
    /// let t = DenseND::from_vec(vec![0.0, 2.0, 3.0, 0.0], &[2, 2]).unwrap();
    /// let (subs, vals) = t.find();
    /// assert_eq!(subs, vec![vec![0, 1], vec![1, 0]]);
    /// assert_eq!(vals, vec![2.0, 3.0]);
    /// ```
    pub fn find(&self) -> (Vec<Vec<usize>>, Vec<T>) {
        let mut subs = Vec::new();
        let mut vals = Vec::new();
        for (idx, value) in self.data.indexed_iter() {
            if !value.is_zero() {
                subs.push(idx.as_array_view().iter().copied().collect());
                vals.push(value.clone());
            }
        }
        (subs, vals)
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|v| !v.is_zero()).count()
    }
}

#[cfg(test)]
mod tests {
    use crate::DenseND;

    #[test]
    fn test_get_checks_bounds() {
        let t = DenseND::<f64>::ones(&[2, 3]);
        assert_eq!(t.get(&[1, 2]), Some(&1.0));
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[0]), None);
    }

    #[test]
    fn test_find_and_nnz() {
        let t = DenseND::<f64>::from_fn(&[2, 2, 2], |idx| if idx[2] == 1 { 1.5 } else { 0.0 });
        let (subs, vals) = t.find();
        assert_eq!(subs.len(), 4);
        assert_eq!(t.nnz(), 4);
        assert!(subs.iter().all(|s| s[2] == 1));
        assert!(vals.iter().all(|&v| v == 1.5));
    }

    #[test]
    fn test_find_all_zero() {
        let t = DenseND::<f64>::zeros(&[3, 3]);
        let (subs, vals) = t.find();
        assert!(subs.is_empty());
        assert!(vals.is_empty());
    }
}

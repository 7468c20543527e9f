//! Khatri-Rao product (column-wise Kronecker product)
//!
//! For matrices A (I × K) and B (J × K), the Khatri-Rao product C = A ⊙ B has
//! size (I*J × K) where column k of C is the Kronecker product of column k of A
//! and column k of B. Row `i*J + j` of C pairs row `i` of A with row `j` of B, so
//! the last operand varies fastest, matching row-major unfolding.

use crate::error::{check_factors, KernelResult};
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use scirs2_core::numeric::Num;

/// Compute the Khatri-Rao product of two matrices
///
/// # Errors
///
/// Returns [`crate::KernelError::RankMismatch`] when the column counts differ.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tengcp_kernels::khatri_rao;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[5.0, 6.0], [7.0, 8.0]];
/// let c = khatri_rao(&a.view(), &b.view()).unwrap();
/// assert_eq!(c.shape(), &[4, 2]);
///
/// // First column: [1*5, 1*7, 3*5, 3*7]
/// assert_eq!(c.column(0).to_vec(), vec![5.0, 7.0, 15.0, 21.0]);
/// ```
pub fn khatri_rao<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>>
where
    T: Clone + Num,
{
    let k = check_factors("khatri_rao", &[a.view(), b.view()], None)?;
    let (i, j) = (a.nrows(), b.nrows());
    let mut result = Array2::<T>::zeros((i * j, k));

    for col_idx in 0..k {
        let a_col = a.column(col_idx);
        let b_col = b.column(col_idx);
        for (row_a_idx, a_val) in a_col.iter().enumerate() {
            for (row_b_idx, b_val) in b_col.iter().enumerate() {
                result[[row_a_idx * j + row_b_idx, col_idx]] = a_val.clone() * b_val.clone();
            }
        }
    }

    Ok(result)
}

/// Khatri-Rao product of every matrix except `skip`, in forward order.
///
/// This is the right operand of the mode-`skip` MTTKRP under row-major unfolding.
pub fn khatri_rao_except<T>(factors: &[ArrayView2<T>], skip: usize) -> KernelResult<Array2<T>>
where
    T: Clone + Num,
{
    let rank = check_factors("khatri_rao_except", factors, None)?;
    let mut rest = factors
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .map(|(_, f)| f);

    let mut result = match rest.next() {
        Some(first) => first.to_owned(),
        // A single-mode tensor: the empty product is one row of ones.
        None => Array2::<T>::ones((1, rank)),
    };
    for matrix in rest {
        result = khatri_rao(&result.view(), matrix)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KernelError;
    use scirs2_core::ndarray_ext::array;

    #[test]
    fn test_khatri_rao_values() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[5.0, 6.0], [7.0, 8.0], [9.0, 10.0]];
        let c = khatri_rao(&a.view(), &b.view()).unwrap();
        assert_eq!(c.shape(), &[6, 2]);
        assert_eq!(c[[4, 1]], 4.0 * 8.0);
        assert_eq!(c[[2, 0]], 1.0 * 9.0);
    }

    #[test]
    fn test_khatri_rao_column_mismatch() {
        let a = array![[1.0, 2.0]];
        let b = array![[1.0]];
        assert!(matches!(
            khatri_rao(&a.view(), &b.view()),
            Err(KernelError::RankMismatch { .. })
        ));
    }

    #[test]
    fn test_khatri_rao_except_skips_mode() {
        let u1 = array![[1.0, 2.0], [3.0, 4.0]];
        let u2 = array![[5.0, 6.0], [7.0, 8.0], [9.0, 10.0]];
        let u3 = array![[11.0, 12.0], [13.0, 14.0]];
        let kr = khatri_rao_except(&[u1.view(), u2.view(), u3.view()], 1).unwrap();
        let expected = khatri_rao(&u1.view(), &u3.view()).unwrap();
        assert_eq!(kr, expected);
    }

    #[test]
    fn test_khatri_rao_except_single_mode() {
        let u = array![[1.0, 2.0, 3.0]];
        let kr = khatri_rao_except(&[u.view()], 0).unwrap();
        assert_eq!(kr, array![[1.0, 1.0, 1.0]]);
    }
}

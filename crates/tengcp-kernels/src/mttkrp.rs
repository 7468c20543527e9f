//! MTTKRP (Matricized Tensor Times Khatri-Rao Product) on dense tensors
//!
//! For tensor Y and factor matrices {U₁, ..., Uₙ}, it computes
//!
//! G = Y_(mode) × (U₁ ⊙ ... ⊙ U_(mode-1) ⊙ U_(mode+1) ⊙ ... ⊙ Uₙ)
//!
//! In GCP fitting Y is the elementwise loss derivative and G is the gradient of
//! the objective with respect to factor `mode`.

use crate::error::{check_factors, KernelError, KernelResult};
use crate::khatri_rao::khatri_rao_except;
use scirs2_core::ndarray_ext::{Array2, ArrayView, ArrayView2, IxDyn};
use scirs2_core::numeric::Float;

/// Compute MTTKRP for one mode
///
/// # Arguments
///
/// * `tensor` - Input tensor with N modes
/// * `factors` - Factor matrices, one per mode, each `(I_k, R)`
/// * `mode` - The mode to compute MTTKRP for (0-indexed)
///
/// # Returns
///
/// Matrix with shape (I_mode, R)
///
/// # Complexity
///
/// Time: O(I_mode × R × ∏ᵢ≠ₘₒ₋ᵈₑ Iᵢ)
/// Space: O(R × ∏ᵢ≠ₘₒ₋ᵈₑ Iᵢ) for the Khatri-Rao product
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::{Array, Array2};
/// use tengcp_kernels::mttkrp;
///
/// let tensor = Array::from_shape_vec(vec![2, 3, 4], (0..24).map(|x| x as f64).collect()).unwrap();
/// let u1 = Array2::<f64>::ones((2, 2));
/// let u2 = Array2::<f64>::ones((3, 2));
/// let u3 = Array2::<f64>::ones((4, 2));
///
/// let g = mttkrp(&tensor.view(), &[u1.view(), u2.view(), u3.view()], 1).unwrap();
/// assert_eq!(g.shape(), &[3, 2]);
/// ```
pub fn mttkrp<T>(
    tensor: &ArrayView<T, IxDyn>,
    factors: &[ArrayView2<T>],
    mode: usize,
) -> KernelResult<Array2<T>>
where
    T: Float + 'static,
{
    let shape = tensor.shape();
    if mode >= shape.len() {
        return Err(KernelError::invalid_mode(mode, shape.len(), "MTTKRP"));
    }
    check_factors("mttkrp", factors, Some(shape))?;

    let unfolded = unfold(tensor, mode)?;
    let kr = khatri_rao_except(factors, mode)?;
    Ok(unfolded.dot(&kr))
}

/// MTTKRP for every mode at once.
pub fn mttkrp_all<T>(
    tensor: &ArrayView<T, IxDyn>,
    factors: &[ArrayView2<T>],
) -> KernelResult<Vec<Array2<T>>>
where
    T: Float + 'static,
{
    (0..tensor.ndim())
        .map(|mode| mttkrp(tensor, factors, mode))
        .collect()
}

/// Mode-`mode` unfolding with row-major column ordering of the remaining modes.
fn unfold<T>(tensor: &ArrayView<T, IxDyn>, mode: usize) -> KernelResult<Array2<T>>
where
    T: Float,
{
    let shape = tensor.shape();
    let mode_size = shape[mode];
    let other_size: usize = shape
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != mode)
        .map(|(_, &s)| s)
        .product();

    let mut perm: Vec<usize> = Vec::with_capacity(shape.len());
    perm.push(mode);
    perm.extend((0..shape.len()).filter(|&i| i != mode));

    let permuted = tensor.clone().permuted_axes(IxDyn(&perm));
    let contiguous = permuted.as_standard_layout().into_owned();
    contiguous
        .into_shape_with_order((mode_size, other_size))
        .map_err(|e| KernelError::operation_error("unfold", e.to_string()))
}

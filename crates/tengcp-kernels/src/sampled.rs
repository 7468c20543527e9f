//! Kruskal kernels over coordinate lists
//!
//! Stochastic GCP never forms a full tensor. It evaluates the model at a batch of
//! coordinates and scatters weighted loss derivatives back into per-mode
//! gradients. Both operations cost O(S × R × N) for S coordinates.

use crate::error::{check_factors, KernelError, KernelResult};
use scirs2_core::ndarray_ext::{Array2, ArrayView1, ArrayView2};
use scirs2_core::numeric::Float;
use tengcp_core::ops::in_bounds;

fn check_coordinates<T>(
    operation: &str,
    factors: &[ArrayView2<T>],
    subs: &[Vec<usize>],
) -> KernelResult<usize> {
    let rank = check_factors(operation, factors, None)?;
    let shape: Vec<usize> = factors.iter().map(|f| f.nrows()).collect();
    for sub in subs {
        if !in_bounds(sub, &shape) {
            return Err(KernelError::CoordinateOutOfBounds {
                coordinate: sub.clone(),
                shape,
            });
        }
    }
    Ok(rank)
}

/// Values of the Kruskal model `Σ_r w_r ∏_k U_k[i_k, r]` at each coordinate.
///
/// `weights` of `None` means unit weights.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tengcp_kernels::kruskal_values_at;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[1.0, 1.0], [0.0, 2.0]];
/// let v = kruskal_values_at(&[a.view(), b.view()], None, &[vec![1, 1]]).unwrap();
/// assert_eq!(v, vec![3.0 * 0.0 + 4.0 * 2.0]);
/// ```
pub fn kruskal_values_at<T>(
    factors: &[ArrayView2<T>],
    weights: Option<ArrayView1<T>>,
    subs: &[Vec<usize>],
) -> KernelResult<Vec<T>>
where
    T: Float,
{
    let rank = check_coordinates("kruskal_values_at", factors, subs)?;
    if let Some(w) = &weights {
        if w.len() != rank {
            return Err(KernelError::dimension_mismatch(
                "kruskal_values_at",
                vec![rank],
                vec![w.len()],
                "one weight per component",
            ));
        }
    }

    let values = subs
        .iter()
        .map(|sub| {
            (0..rank).fold(T::zero(), |acc, r| {
                let w = weights.as_ref().map_or(T::one(), |w| w[r]);
                let prod = sub
                    .iter()
                    .zip(factors)
                    .fold(w, |p, (&i, factor)| p * factor[[i, r]]);
                acc + prod
            })
        })
        .collect();
    Ok(values)
}

/// Sampled MTTKRP for every mode.
///
/// For each coordinate `s` with derivative `y[s]`:
///
/// G_n\[i_n(s), r\] += y\[s\] · ∏_{k≠n} U_k\[i_k(s), r\]
///
/// which is the dense MTTKRP of a tensor holding `y` at `subs` and zero
/// elsewhere (repeated coordinates accumulate). The model weights are taken to be 1.
pub fn mttkrp_sampled<T>(
    factors: &[ArrayView2<T>],
    subs: &[Vec<usize>],
    y: &[T],
) -> KernelResult<Vec<Array2<T>>>
where
    T: Float,
{
    let rank = check_coordinates("mttkrp_sampled", factors, subs)?;
    if subs.len() != y.len() {
        return Err(KernelError::dimension_mismatch(
            "mttkrp_sampled",
            vec![subs.len()],
            vec![y.len()],
            "one derivative per sampled coordinate",
        ));
    }

    let nmodes = factors.len();
    let mut grads: Vec<Array2<T>> = factors
        .iter()
        .map(|f| Array2::zeros((f.nrows(), rank)))
        .collect();

    // prefix[k] = ∏_{j<k} U_j[i_j, r]; the running suffix covers j>k.
    let mut prefix = vec![T::one(); nmodes + 1];
    for (sub, &ys) in subs.iter().zip(y) {
        if ys.is_zero() {
            continue;
        }
        for r in 0..rank {
            for k in 0..nmodes {
                prefix[k + 1] = prefix[k] * factors[k][[sub[k], r]];
            }
            let mut suffix = T::one();
            for k in (0..nmodes).rev() {
                grads[k][[sub[k], r]] = grads[k][[sub[k], r]] + ys * prefix[k] * suffix;
                suffix = suffix * factors[k][[sub[k], r]];
            }
        }
    }
    Ok(grads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mttkrp::mttkrp_all;
    use scirs2_core::ndarray_ext::{array, Array, IxDyn};
    use tengcp_core::ops::unravel_index;

    #[test]
    fn test_values_with_weights() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[5.0, 6.0], [7.0, 8.0]];
        let w = array![2.0, 0.5];
        let v = kruskal_values_at(&[a.view(), b.view()], Some(w.view()), &[vec![0, 1], vec![1, 0]])
            .unwrap();
        assert_eq!(v[0], 2.0 * 1.0 * 7.0 + 0.5 * 2.0 * 8.0);
        assert_eq!(v[1], 2.0 * 3.0 * 5.0 + 0.5 * 4.0 * 6.0);
    }

    #[test]
    fn test_values_out_of_bounds() {
        let a = array![[1.0], [3.0]];
        let err = kruskal_values_at(&[a.view()], None, &[vec![2]]).unwrap_err();
        assert!(matches!(err, KernelError::CoordinateOutOfBounds { .. }));
    }

    #[test]
    fn test_sampled_matches_dense_on_full_grid() {
        let shape = [2, 3, 2];
        let a = array![[0.5, 1.0], [1.5, -1.0]];
        let b = array![[1.0, 0.0], [2.0, 1.0], [0.5, 0.5]];
        let c = array![[1.0, 2.0], [-1.0, 0.5]];
        let views = [a.view(), b.view(), c.view()];

        let total: usize = shape.iter().product();
        let subs: Vec<Vec<usize>> = (0..total).map(|l| unravel_index(l, &shape)).collect();
        let y: Vec<f64> = (0..total).map(|l| (l as f64) * 0.25 - 1.0).collect();

        let dense_y = Array::from_shape_vec(IxDyn(&shape), y.clone()).unwrap();
        let expected = mttkrp_all(&dense_y.view(), &views).unwrap();
        let sampled = mttkrp_sampled(&views, &subs, &y).unwrap();

        for (g, e) in sampled.iter().zip(&expected) {
            for (x, z) in g.iter().zip(e.iter()) {
                assert!((x - z).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_sampled_repeated_coordinates_accumulate() {
        let a = array![[1.0], [2.0]];
        let b = array![[3.0], [4.0]];
        let subs = vec![vec![1, 0], vec![1, 0]];
        let g = mttkrp_sampled(&[a.view(), b.view()], &subs, &[1.0, 2.0]).unwrap();
        assert_eq!(g[0][[1, 0]], 3.0 * 3.0);
        assert_eq!(g[1][[0, 0]], 3.0 * 2.0);
        assert_eq!(g[0][[0, 0]], 0.0);
    }

    #[test]
    fn test_sampled_length_mismatch() {
        let a = array![[1.0], [2.0]];
        let err = mttkrp_sampled(&[a.view()], &[vec![0]], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, KernelError::DimensionMismatch { .. }));
    }
}

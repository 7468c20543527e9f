//! Objective and gradient evaluation for a unit-weight CP model
//!
//! The full evaluation sums over every entry of a dense tensor:
//!
//! F = Σᵢ Wᵢ f(Mᵢ, Xᵢ),   ∂F/∂Uₖ = MTTKRP(Y, {U}, k)  with  Yᵢ = Wᵢ ∂f/∂m(Mᵢ, Xᵢ)
//!
//! The sampled evaluation replaces the sum by a weighted sum over a
//! [`SampleBatch`]. Factors are taken with unit weights throughout.

use crate::error::GcpResult;
use crate::mask::Mask;
use crate::objectives::Objective;
use crate::sampler::SampleBatch;
use crate::scalar::GcpFloat;
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use tengcp_core::ops::unravel_into;
use tengcp_core::DenseND;
use tengcp_kernels::{kruskal_values_at, mttkrp_all, mttkrp_sampled};

fn views<T>(factors: &[Array2<T>]) -> Vec<ArrayView2<'_, T>> {
    factors.iter().map(|f| f.view()).collect()
}

/// Dense reconstruction of `Σ_r ∏_k U_k[i_k, r]`.
pub fn full_model<T: GcpFloat>(factors: &[Array2<T>]) -> GcpResult<DenseND<T>> {
    let shape: Vec<usize> = factors.iter().map(|f| f.nrows()).collect();
    let rank = factors.first().map_or(0, |f| f.ncols());
    let total: usize = shape.iter().product();
    let mut idx = vec![0; shape.len()];
    let mut out = Vec::with_capacity(total);
    for lin in 0..total {
        unravel_into(lin, &shape, &mut idx);
        let v = (0..rank).fold(T::zero(), |acc, r| {
            acc + idx
                .iter()
                .zip(factors)
                .fold(T::one(), |p, (&i, u)| p * u[[i, r]])
        });
        out.push(v);
    }
    Ok(DenseND::from_vec(out, &shape)?)
}

/// Objective value over every included entry of `data`.
pub fn full_f<T: GcpFloat>(
    factors: &[Array2<T>],
    objective: &Objective<T>,
    data: &DenseND<T>,
    mask: Option<&Mask<T>>,
) -> GcpResult<T> {
    let model = full_model(factors)?;
    let f = match mask {
        None => model
            .iter()
            .zip(data.iter())
            .map(|(&m, &x)| objective.loss(m, x))
            .sum(),
        Some(w) => model
            .iter()
            .zip(data.iter())
            .zip(w.as_dense().iter())
            .filter(|(_, w)| !w.is_zero())
            .map(|((&m, &x), &w)| w * objective.loss(m, x))
            .sum(),
    };
    Ok(f)
}

/// Objective value and gradient with respect to each factor.
pub fn full_fg<T: GcpFloat>(
    factors: &[Array2<T>],
    objective: &Objective<T>,
    data: &DenseND<T>,
    mask: Option<&Mask<T>>,
) -> GcpResult<(T, Vec<Array2<T>>)> {
    let model = full_model(factors)?;
    let mut f = T::zero();
    let mut y = model;
    let weights: Box<dyn Iterator<Item = T> + '_> = match mask {
        Some(w) => Box::new(w.as_dense().iter().copied()),
        None => Box::new(std::iter::repeat(T::one())),
    };
    for ((yi, &x), w) in y.iter_mut().zip(data.iter()).zip(weights) {
        let m = *yi;
        if w.is_zero() {
            *yi = T::zero();
            continue;
        }
        f += w * objective.loss(m, x);
        *yi = w * objective.grad(m, x);
    }
    let grads = mttkrp_all(&y.view(), &views(factors))?;
    Ok((f, grads))
}

/// Weighted objective estimate over a batch.
pub fn sampled_f<T: GcpFloat>(
    factors: &[Array2<T>],
    objective: &Objective<T>,
    batch: &SampleBatch<T>,
) -> GcpResult<T> {
    let model = kruskal_values_at(&views(factors), None, &batch.subs)?;
    let f = model
        .iter()
        .zip(&batch.vals)
        .zip(&batch.weights)
        .enumerate()
        .map(|(i, ((&m, &x), &w))| {
            let loss = objective.loss(m, x);
            if batch.corrected && i < batch.n_observed {
                w * (loss - objective.loss(m, T::zero()))
            } else {
                w * loss
            }
        })
        .sum();
    Ok(f)
}

/// Weighted objective and gradient estimates over a batch.
pub fn sampled_fg<T: GcpFloat>(
    factors: &[Array2<T>],
    objective: &Objective<T>,
    batch: &SampleBatch<T>,
) -> GcpResult<(T, Vec<Array2<T>>)> {
    let fviews = views(factors);
    let model = kruskal_values_at(&fviews, None, &batch.subs)?;
    let mut f = T::zero();
    let mut y = Vec::with_capacity(batch.len());
    for (i, ((&m, &x), &w)) in model
        .iter()
        .zip(&batch.vals)
        .zip(&batch.weights)
        .enumerate()
    {
        if batch.corrected && i < batch.n_observed {
            f += w * (objective.loss(m, x) - objective.loss(m, T::zero()));
            y.push(w * (objective.grad(m, x) - objective.grad(m, T::zero())));
        } else {
            f += w * objective.loss(m, x);
            y.push(w * objective.grad(m, x));
        }
    }
    let grads = mttkrp_sampled(&fviews, &batch.subs, &y)?;
    Ok((f, grads))
}

//! Per-step update rules for the stochastic solver
//!
//! A rule turns a gradient estimate into a factor update and knows how to
//! undo its own state when an epoch is rejected.

use crate::scalar::GcpFloat;
use scirs2_core::ndarray_ext::{Array2, Zip};
use std::fmt;

/// Factor update applied once per stochastic step
pub trait UpdateRule<T: GcpFloat>: fmt::Debug + Send {
    fn name(&self) -> &'static str;

    /// Move `factors` against `grads`.
    fn step(&mut self, factors: &mut [Array2<T>], grads: &[Array2<T>]);

    /// Remember the current state as the last accepted epoch.
    fn checkpoint(&mut self);

    /// Return to the last checkpoint after a failed epoch.
    fn rollback(&mut self, decay: T);

    /// Current base step length.
    fn rate(&self) -> T;
}

/// Plain stochastic gradient descent
///
/// U ← U − η G; the rate η decays by `decay` after each failed epoch.
#[derive(Debug, Clone)]
pub struct Sgd<T> {
    rate: T,
}

impl<T: GcpFloat> Sgd<T> {
    pub fn new(rate: f64) -> Self {
        Self { rate: T::of(rate) }
    }
}

impl<T: GcpFloat> UpdateRule<T> for Sgd<T> {
    fn name(&self) -> &'static str {
        "sgd"
    }

    fn step(&mut self, factors: &mut [Array2<T>], grads: &[Array2<T>]) {
        let rate = self.rate;
        for (u, g) in factors.iter_mut().zip(grads) {
            Zip::from(u).and(g).for_each(|u, &g| *u -= rate * g);
        }
    }

    fn checkpoint(&mut self) {}

    fn rollback(&mut self, decay: T) {
        self.rate *= decay;
    }

    fn rate(&self) -> T {
        self.rate
    }
}

/// Adam moment parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdamConfig {
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamConfig {
    pub fn beta1(mut self, b1: f64) -> Self {
        self.beta1 = b1;
        self
    }

    pub fn beta2(mut self, b2: f64) -> Self {
        self.beta2 = b2;
        self
    }

    pub fn epsilon(mut self, eps: f64) -> Self {
        self.epsilon = eps;
        self
    }
}

#[derive(Debug, Clone)]
struct Moments<T> {
    t: i32,
    m: Vec<Array2<T>>,
    v: Vec<Array2<T>>,
}

/// Adaptive moment estimation
///
/// On a failed epoch the moments and step counter return to the checkpoint and
/// the rate decays.
#[derive(Debug, Clone)]
pub struct Adam<T> {
    rate: T,
    beta1: T,
    beta2: T,
    epsilon: T,
    state: Moments<T>,
    saved: Option<Moments<T>>,
}

impl<T: GcpFloat> Adam<T> {
    pub fn new(rate: f64, config: AdamConfig) -> Self {
        Self {
            rate: T::of(rate),
            beta1: T::of(config.beta1),
            beta2: T::of(config.beta2),
            epsilon: T::of(config.epsilon),
            state: Moments {
                t: 0,
                m: Vec::new(),
                v: Vec::new(),
            },
            saved: None,
        }
    }

    /// Steps taken since the last checkpoint that survived.
    pub fn steps(&self) -> i32 {
        self.state.t
    }
}

impl<T: GcpFloat> UpdateRule<T> for Adam<T> {
    fn name(&self) -> &'static str {
        "adam"
    }

    fn step(&mut self, factors: &mut [Array2<T>], grads: &[Array2<T>]) {
        if self.state.m.is_empty() {
            self.state.m = grads.iter().map(|g| Array2::zeros(g.raw_dim())).collect();
            self.state.v = self.state.m.clone();
        }
        self.state.t += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let c1 = T::one() - b1.powi(self.state.t);
        let c2 = T::one() - b2.powi(self.state.t);
        let rate = self.rate;

        for (((u, g), m), v) in factors
            .iter_mut()
            .zip(grads)
            .zip(self.state.m.iter_mut())
            .zip(self.state.v.iter_mut())
        {
            Zip::from(u)
                .and(g)
                .and(m)
                .and(v)
                .for_each(|u, &g, m, v| {
                    *m = b1 * *m + (T::one() - b1) * g;
                    *v = b2 * *v + (T::one() - b2) * g * g;
                    let m_hat = *m / c1;
                    let v_hat = *v / c2;
                    *u -= rate * m_hat / (v_hat.sqrt() + eps);
                });
        }
    }

    fn checkpoint(&mut self) {
        self.saved = Some(self.state.clone());
    }

    fn rollback(&mut self, decay: T) {
        if let Some(saved) = &self.saved {
            self.state = saved.clone();
        }
        self.rate *= decay;
    }

    fn rate(&self) -> T {
        self.rate
    }
}

/// Adagrad with a per-entry accumulator
///
/// U ← U − η G / √(Σ G² + ε). A failed epoch clears the accumulator instead of
/// decaying the rate.
#[derive(Debug, Clone)]
pub struct Adagrad<T> {
    rate: T,
    epsilon: T,
    sum_squares: Vec<Array2<T>>,
}

impl<T: GcpFloat> Adagrad<T> {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: T::of(rate),
            epsilon: T::of(1e-8),
            sum_squares: Vec::new(),
        }
    }
}

impl<T: GcpFloat> UpdateRule<T> for Adagrad<T> {
    fn name(&self) -> &'static str {
        "adagrad"
    }

    fn step(&mut self, factors: &mut [Array2<T>], grads: &[Array2<T>]) {
        if self.sum_squares.is_empty() {
            self.sum_squares = grads.iter().map(|g| Array2::zeros(g.raw_dim())).collect();
        }
        let (rate, eps) = (self.rate, self.epsilon);
        for ((u, g), acc) in factors
            .iter_mut()
            .zip(grads)
            .zip(self.sum_squares.iter_mut())
        {
            Zip::from(u).and(g).and(acc).for_each(|u, &g, acc| {
                *acc += g * g;
                *u -= rate * g / (*acc + eps).sqrt();
            });
        }
    }

    fn checkpoint(&mut self) {}

    fn rollback(&mut self, _decay: T) {
        self.sum_squares.clear();
    }

    fn rate(&self) -> T {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;

    #[test]
    fn test_sgd_step_and_decay() {
        let mut rule = Sgd::<f64>::new(0.5);
        let mut u = vec![array![[1.0, 2.0]]];
        rule.step(&mut u, &[array![[2.0, -2.0]]]);
        assert_eq!(u[0], array![[0.0, 3.0]]);
        rule.rollback(0.1);
        assert!((rule.rate() - 0.05).abs() < 1e-15);
    }

    #[test]
    fn test_adam_first_step_is_rate_sized() {
        let mut rule = Adam::<f64>::new(0.01, AdamConfig::default());
        let mut u = vec![array![[1.0, 1.0]]];
        rule.step(&mut u, &[array![[3.0, -0.2]]]);
        // bias-corrected first step is rate · sign(g)
        assert!((u[0][[0, 0]] - 0.99).abs() < 1e-6);
        assert!((u[0][[0, 1]] - 1.01).abs() < 1e-6);
    }

    #[test]
    fn test_adam_rollback_restores_moments() {
        let mut rule = Adam::<f64>::new(0.01, AdamConfig::default());
        let mut u = vec![array![[1.0]]];
        rule.step(&mut u, &[array![[1.0]]]);
        rule.checkpoint();
        rule.step(&mut u, &[array![[5.0]]]);
        rule.step(&mut u, &[array![[5.0]]]);
        assert_eq!(rule.steps(), 3);
        rule.rollback(0.1);
        assert_eq!(rule.steps(), 1);
        assert!((rule.rate() - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_adagrad_rollback_clears_accumulator() {
        let mut rule = Adagrad::<f64>::new(1.0);
        let mut u = vec![array![[0.0]]];
        rule.step(&mut u, &[array![[2.0]]]);
        assert!((u[0][[0, 0]] + 1.0).abs() < 1e-6);
        rule.step(&mut u, &[array![[2.0]]]);
        // accumulated: 2 / sqrt(8)
        assert!((u[0][[0, 0]] + 1.0 + 2.0 / 8f64.sqrt()).abs() < 1e-6);
        rule.rollback(0.1);
        let mut w = vec![array![[0.0]]];
        rule.step(&mut w, &[array![[2.0]]]);
        assert!((w[0][[0, 0]] + 1.0).abs() < 1e-6);
        assert_eq!(rule.rate(), 1.0);
    }
}

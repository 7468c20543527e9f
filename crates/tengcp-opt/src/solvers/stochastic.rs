//! Sampled first-order solver: SGD, Adam and Adagrad
//!
//! Work is grouped into epochs of `epoch_iters` steps. Each step draws a fresh
//! gradient batch, applies the update rule and projects onto the lower bound.
//! After each epoch the objective is re-estimated on the fixed function batch;
//! an increase rejects the whole epoch.

use super::rules::{Adagrad, Adam, AdamConfig, Sgd, UpdateRule};
use super::{all_finite, project, to_model, GcpSolver, Inclusion, Problem};
use crate::error::{GcpError, GcpResult};
use crate::evaluate::{sampled_f, sampled_fg};
use crate::info::{ConvergenceReason, SolveInfo, Termination};
use crate::ktensor::KruskalTensor;
use crate::scalar::GcpFloat;
use scirs2_core::random::rngs::StdRng;
use std::time::Instant;

/// Settings shared by every stochastic rule
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StochasticConfig {
    /// Initial step length
    pub rate: f64,
    /// Rate multiplier applied after a failed epoch
    pub decay: f64,
    /// Stop after this many failed epochs; `None` never stops early
    pub max_fails: Option<usize>,
    /// Steps per epoch
    pub epoch_iters: usize,
    /// Stop once the estimated objective drops below this
    pub f_est_tol: f64,
    /// Maximum number of epochs
    pub max_iters: usize,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            rate: 1e-3,
            decay: 0.1,
            max_fails: None,
            epoch_iters: 1000,
            f_est_tol: f64::NEG_INFINITY,
            max_iters: 1000,
        }
    }
}

impl StochasticConfig {
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn max_fails(mut self, fails: usize) -> Self {
        self.max_fails = Some(fails);
        self
    }

    pub fn epoch_iters(mut self, n: usize) -> Self {
        self.epoch_iters = n;
        self
    }

    pub fn f_est_tol(mut self, tol: f64) -> Self {
        self.f_est_tol = tol;
        self
    }

    pub fn max_iters(mut self, n: usize) -> Self {
        self.max_iters = n;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RuleKind {
    Sgd,
    Adam(AdamConfig),
    Adagrad,
}

/// Epoch-based stochastic solver
///
/// Every call to `solve` starts from a fresh rule state.
#[derive(Debug, Clone)]
pub struct StochasticSolver {
    config: StochasticConfig,
    rule: RuleKind,
}

impl StochasticSolver {
    pub fn sgd(config: StochasticConfig) -> Self {
        Self {
            config,
            rule: RuleKind::Sgd,
        }
    }

    pub fn adam(config: StochasticConfig, adam: AdamConfig) -> Self {
        Self {
            config,
            rule: RuleKind::Adam(adam),
        }
    }

    pub fn adagrad(config: StochasticConfig) -> Self {
        Self {
            config,
            rule: RuleKind::Adagrad,
        }
    }

    pub fn config(&self) -> &StochasticConfig {
        &self.config
    }

    fn build_rule<T: GcpFloat>(&self) -> Box<dyn UpdateRule<T>> {
        match self.rule {
            RuleKind::Sgd => Box::new(Sgd::new(self.config.rate)),
            RuleKind::Adam(adam) => Box::new(Adam::new(self.config.rate, adam)),
            RuleKind::Adagrad => Box::new(Adagrad::new(self.config.rate)),
        }
    }

    fn validate(&self) -> GcpResult<()> {
        let cfg = &self.config;
        if !(cfg.rate > 0.0 && cfg.rate.is_finite()) {
            return Err(GcpError::Configuration(format!(
                "rate must be positive and finite, got {}",
                cfg.rate
            )));
        }
        if !(cfg.decay > 0.0 && cfg.decay <= 1.0) {
            return Err(GcpError::Configuration(format!(
                "decay must lie in (0, 1], got {}",
                cfg.decay
            )));
        }
        if cfg.epoch_iters == 0 {
            return Err(GcpError::Configuration(
                "epoch_iters must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl<T: GcpFloat> GcpSolver<T> for StochasticSolver {
    fn name(&self) -> &str {
        match self.rule {
            RuleKind::Sgd => "sgd",
            RuleKind::Adam(_) => "adam",
            RuleKind::Adagrad => "adagrad",
        }
    }

    fn requires_sampler(&self) -> bool {
        true
    }

    fn supports_sparse(&self) -> bool {
        true
    }

    fn max_iters(&self) -> usize {
        self.config.max_iters
    }

    fn epoch_iters(&self) -> usize {
        self.config.epoch_iters
    }

    fn solve(
        &mut self,
        initial: &KruskalTensor<T>,
        problem: Problem<'_, T>,
        rng: &mut StdRng,
    ) -> GcpResult<(KruskalTensor<T>, SolveInfo<T>)> {
        self.validate()?;
        let start = Instant::now();
        let name = GcpSolver::<T>::name(self).to_string();
        let sampler = match problem.inclusion {
            Inclusion::Sampler(s) => s,
            Inclusion::Mask(_) => {
                return Err(GcpError::IncompatibleOptions(format!(
                    "{} estimates the objective from samples and does not take a mask",
                    name
                )))
            }
        };
        let cfg = &self.config;
        let objective = problem.objective;
        let lb = objective.lower_bound();
        let decay = T::of(cfg.decay);
        let f_est_tol = T::of(cfg.f_est_tol);

        let mut factors = initial.factors().to_vec();
        project(&mut factors, lb);
        let mut rule = self.build_rule::<T>();

        sampler.reset_budget(cfg.epoch_iters.saturating_mul(cfg.max_iters));
        let fsample = sampler.function_sample(rng);
        let mut f_est = sampled_f(&factors, objective, &fsample)?;
        if !f_est.is_finite() {
            return Err(GcpError::Numerical(
                "estimated objective is not finite at the initial guess".into(),
            ));
        }

        let mut info = SolveInfo::new(name.clone(), f_est);
        info.func_evals = 1;
        info.record(0, f_est, None);
        log::info!(
            "{}: rate {}, {} epochs of {} steps, {}",
            name,
            cfg.rate,
            cfg.max_iters,
            cfg.epoch_iters,
            sampler.describe()
        );

        let mut saved = factors.clone();
        rule.checkpoint();
        let mut nfails = 0usize;
        let mut termination = Termination::MaxIterations;

        for epoch in 1..=cfg.max_iters {
            for _ in 0..cfg.epoch_iters {
                let batch = sampler.draw(epoch, rng)?;
                let (_, grads) = sampled_fg(&factors, objective, &batch)?;
                if !all_finite(&grads) {
                    return Err(GcpError::Numerical(format!(
                        "non-finite gradient in epoch {}; try a smaller rate",
                        epoch
                    )));
                }
                rule.step(&mut factors, &grads);
                project(&mut factors, lb);
            }

            let f_new = sampled_f(&factors, objective, &fsample)?;
            info.func_evals += 1;
            info.iterations = epoch;
            if !f_new.is_finite() || f_new > f_est {
                nfails += 1;
                info.failed_epochs = nfails;
                factors.clone_from(&saved);
                rule.rollback(decay);
                log::warn!(
                    "{}: epoch {} increased the estimated objective, rolled back (rate now {})",
                    name,
                    epoch,
                    rule.rate()
                );
            } else {
                f_est = f_new;
                saved.clone_from(&factors);
                rule.checkpoint();
            }
            info.record(epoch, f_est, None);

            if problem.printitn > 0 && epoch % problem.printitn == 0 {
                log::info!(
                    "Epoch {:3}: f~ = {:.6e}, step = {:.2e}, nfails = {}",
                    epoch,
                    f_est.to_f64().unwrap_or(f64::NAN),
                    rule.rate().to_f64().unwrap_or(f64::NAN),
                    nfails
                );
            }

            if cfg.max_fails.is_some_and(|max| nfails > max) {
                termination = Termination::Converged(ConvergenceReason::Stalled);
                break;
            }
            if f_est < f_est_tol {
                termination = Termination::Converged(ConvergenceReason::FunctionTolerance);
                break;
            }
        }

        info.termination = termination;
        info.elapsed = start.elapsed();
        Ok((to_model(factors)?, info))
    }
}

//! Projected L-BFGS with lower bounds
//!
//! Minimizes the full GCP objective over the flattened factor entries subject
//! to `x ≥ lb`. Each iteration:
//!
//! 1. Fixes the active set (entries at the bound whose gradient pushes outward).
//! 2. Computes the two-loop L-BFGS direction on the free entries.
//! 3. Backtracks along the projected path until the Armijo condition holds.

use super::{all_finite, project, to_model, GcpSolver, Inclusion, Problem};
use crate::error::{GcpError, GcpResult};
use crate::evaluate::full_fg;
use crate::info::{ConvergenceReason, SolveInfo, Termination};
use crate::ktensor::KruskalTensor;
use crate::mask::Mask;
use crate::objectives::Objective;
use crate::scalar::GcpFloat;
use scirs2_core::ndarray_ext::Array2;
use scirs2_core::random::rngs::StdRng;
use std::collections::VecDeque;
use std::time::Instant;
use tengcp_core::DenseND;

const ARMIJO_C: f64 = 1e-4;

/// L-BFGS-B settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LbfgsbConfig {
    /// Stored curvature pairs
    pub memory: usize,
    pub max_iters: usize,
    /// Stop when the projected-gradient infinity norm is at most this
    pub pgtol: f64,
    /// Stop when the relative decrease is at most `factr · f64::EPSILON`
    pub factr: f64,
    /// Backtracking steps before the line search gives up
    pub max_line_search: usize,
}

impl Default for LbfgsbConfig {
    fn default() -> Self {
        Self {
            memory: 5,
            max_iters: 1000,
            pgtol: 1e-4,
            factr: 1e7,
            max_line_search: 20,
        }
    }
}

impl LbfgsbConfig {
    pub fn memory(mut self, m: usize) -> Self {
        self.memory = m;
        self
    }

    pub fn max_iters(mut self, n: usize) -> Self {
        self.max_iters = n;
        self
    }

    pub fn pgtol(mut self, tol: f64) -> Self {
        self.pgtol = tol;
        self
    }

    pub fn factr(mut self, factr: f64) -> Self {
        self.factr = factr;
        self
    }

    pub fn max_line_search(mut self, n: usize) -> Self {
        self.max_line_search = n;
        self
    }
}

/// Deterministic bound-constrained quasi-Newton solver
#[derive(Debug, Clone)]
pub struct Lbfgsb {
    config: LbfgsbConfig,
}

impl Lbfgsb {
    pub fn new(config: LbfgsbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LbfgsbConfig {
        &self.config
    }
}

impl Default for Lbfgsb {
    fn default() -> Self {
        Self::new(LbfgsbConfig::default())
    }
}

/// Flattened view of the factor matrices.
struct Layout {
    shapes: Vec<(usize, usize)>,
}

impl Layout {
    fn of<T>(factors: &[Array2<T>]) -> Self {
        Self {
            shapes: factors.iter().map(|f| f.dim()).collect(),
        }
    }

    fn flatten<T: GcpFloat>(&self, factors: &[Array2<T>]) -> Vec<T> {
        factors.iter().flat_map(|f| f.iter().copied()).collect()
    }

    fn unflatten<T: GcpFloat>(&self, x: &[T]) -> GcpResult<Vec<Array2<T>>> {
        let mut offset = 0;
        self.shapes
            .iter()
            .map(|&(r, c)| {
                let block = x[offset..offset + r * c].to_vec();
                offset += r * c;
                Array2::from_shape_vec((r, c), block)
                    .map_err(|e| GcpError::Numerical(format!("factor reshape failed: {}", e)))
            })
            .collect()
    }
}

struct Evaluator<'a, T> {
    layout: Layout,
    objective: &'a Objective<T>,
    data: &'a DenseND<T>,
    mask: Option<&'a Mask<T>>,
    evals: usize,
}

impl<T: GcpFloat> Evaluator<'_, T> {
    fn fg(&mut self, x: &[T]) -> GcpResult<(T, Vec<T>)> {
        let factors = self.layout.unflatten(x)?;
        let (f, g) = full_fg(&factors, self.objective, self.data, self.mask)?;
        self.evals += 1;
        Ok((f, self.layout.flatten(&g)))
    }
}

fn dot<T: GcpFloat>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

/// Infinity norm of `P(x − g) − x` for the bound `x ≥ lb`.
fn projected_gradient_norm<T: GcpFloat>(x: &[T], g: &[T], lb: T) -> T {
    x.iter().zip(g).fold(T::zero(), |acc, (&xi, &gi)| {
        let moved = xi - gi;
        let step = if moved < lb { lb - xi } else { -gi };
        acc.max(step.abs())
    })
}

/// Two-loop recursion restricted to the free entries: returns `−H g`.
fn two_loop<T: GcpFloat>(
    g: &[T],
    free: &[bool],
    history: &VecDeque<(Vec<T>, Vec<T>, T)>,
) -> Vec<T> {
    let mut q: Vec<T> = g
        .iter()
        .zip(free)
        .map(|(&gi, &f)| if f { gi } else { T::zero() })
        .collect();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let a = *rho * dot(s, &q);
        for (qi, &yi) in q.iter_mut().zip(y) {
            *qi -= a * yi;
        }
        alphas.push(a);
    }
    if let Some((s, y, _)) = history.back() {
        let yy = dot(y, y);
        if yy > T::zero() {
            let gamma = dot(s, y) / yy;
            q.iter_mut().for_each(|qi| *qi *= gamma);
        }
    }
    for ((s, y, rho), a) in history.iter().zip(alphas.into_iter().rev()) {
        let b = *rho * dot(y, &q);
        for (qi, &si) in q.iter_mut().zip(s) {
            *qi += (a - b) * si;
        }
    }
    q.iter()
        .zip(free)
        .map(|(&qi, &f)| if f { -qi } else { T::zero() })
        .collect()
}

impl<T: GcpFloat> GcpSolver<T> for Lbfgsb {
    fn name(&self) -> &str {
        "lbfgsb"
    }

    fn requires_sampler(&self) -> bool {
        false
    }

    fn supports_sparse(&self) -> bool {
        false
    }

    fn max_iters(&self) -> usize {
        self.config.max_iters
    }

    fn solve(
        &mut self,
        initial: &KruskalTensor<T>,
        problem: Problem<'_, T>,
        _rng: &mut StdRng,
    ) -> GcpResult<(KruskalTensor<T>, SolveInfo<T>)> {
        let start = Instant::now();
        let cfg = &self.config;
        let data = problem.data.as_dense().ok_or_else(|| {
            GcpError::IncompatibleOptions("lbfgsb does not support sparse data".into())
        })?;
        let mask = match problem.inclusion {
            Inclusion::Mask(mask) => mask,
            Inclusion::Sampler(_) => {
                return Err(GcpError::IncompatibleOptions(
                    "lbfgsb evaluates the full objective and does not take a sampler".into(),
                ))
            }
        };
        let lb = problem.objective.lower_bound();

        let mut factors = initial.factors().to_vec();
        project(&mut factors, lb);
        let mut eval = Evaluator {
            layout: Layout::of(&factors),
            objective: problem.objective,
            data,
            mask,
            evals: 0,
        };
        let mut x = eval.layout.flatten(&factors);
        let (mut f, mut g) = eval.fg(&x)?;
        if !f.is_finite() || g.iter().any(|v| !v.is_finite()) {
            return Err(GcpError::Numerical(
                "objective or gradient is not finite at the initial guess".into(),
            ));
        }

        let mut info = SolveInfo::new("lbfgsb", f);
        let mut pg_norm = projected_gradient_norm(&x, &g, lb);
        info.record(0, f, Some(pg_norm));
        log::info!(
            "L-BFGS-B: {} variables, memory {}, max_iters {}",
            x.len(),
            cfg.memory,
            cfg.max_iters
        );

        let c = T::of(ARMIJO_C);
        let pgtol = T::of(cfg.pgtol);
        let ftol = T::of(cfg.factr * f64::EPSILON);
        let mut history: VecDeque<(Vec<T>, Vec<T>, T)> = VecDeque::with_capacity(cfg.memory);
        let mut termination = Termination::MaxIterations;

        for iter in 1..=cfg.max_iters {
            if pg_norm <= pgtol {
                termination = Termination::Converged(ConvergenceReason::ProjectedGradient);
                break;
            }

            let free: Vec<bool> = x
                .iter()
                .zip(&g)
                .map(|(&xi, &gi)| !(xi <= lb && gi > T::zero()))
                .collect();
            let mut d = two_loop(&g, &free, &history);
            if dot(&d, &g) >= T::zero() {
                d = g
                    .iter()
                    .zip(&free)
                    .map(|(&gi, &fr)| if fr { -gi } else { T::zero() })
                    .collect();
            }

            let mut alpha = if history.is_empty() {
                let dn = dot(&d, &d).sqrt();
                if dn > T::one() {
                    T::one() / dn
                } else {
                    T::one()
                }
            } else {
                T::one()
            };

            let mut accepted = None;
            for _ in 0..cfg.max_line_search.max(1) {
                let x_new: Vec<T> = x
                    .iter()
                    .zip(&d)
                    .map(|(&xi, &di)| {
                        let v = xi + alpha * di;
                        if v < lb {
                            lb
                        } else {
                            v
                        }
                    })
                    .collect();
                let (f_new, g_new) = eval.fg(&x_new)?;
                let decrease = g
                    .iter()
                    .zip(x_new.iter().zip(&x))
                    .map(|(&gi, (&xn, &xo))| gi * (xn - xo))
                    .sum::<T>()
                    .min(T::zero());
                if f_new.is_finite()
                    && g_new.iter().all(|v| v.is_finite())
                    && f_new <= f + c * decrease
                {
                    accepted = Some((x_new, f_new, g_new));
                    break;
                }
                alpha *= T::of(0.5);
            }

            let Some((x_new, f_new, g_new)) = accepted else {
                termination = Termination::Error(format!(
                    "line search failed to reduce the objective in iteration {}",
                    iter
                ));
                break;
            };

            let s: Vec<T> = x_new.iter().zip(&x).map(|(&a, &b)| a - b).collect();
            let y: Vec<T> = g_new.iter().zip(&g).map(|(&a, &b)| a - b).collect();
            let sy = dot(&s, &y);
            if sy > T::zero() {
                if history.len() == cfg.memory {
                    history.pop_front();
                }
                if cfg.memory > 0 {
                    history.push_back((s, y, T::one() / sy));
                }
            }

            let scale = f.abs().max(f_new.abs()).max(T::one());
            let rel = (f - f_new) / scale;
            x = x_new;
            f = f_new;
            g = g_new;
            pg_norm = projected_gradient_norm(&x, &g, lb);
            info.iterations = iter;
            info.record(iter, f, Some(pg_norm));
            if problem.printitn > 0 && iter % problem.printitn == 0 {
                log::info!(
                    "Iter {:5}, f(x) = {:.6e}, ||grad||_inf = {:.6e}",
                    iter,
                    f.to_f64().unwrap_or(f64::NAN),
                    pg_norm.to_f64().unwrap_or(f64::NAN)
                );
            }

            if rel <= ftol {
                termination = Termination::Converged(ConvergenceReason::FunctionChange);
                break;
            }
        }

        if let Termination::Error(msg) = &termination {
            log::warn!("L-BFGS-B stopped early: {}", msg);
        }
        let fitted = eval.layout.unflatten(&x)?;
        if !all_finite(&fitted) {
            return Err(GcpError::Numerical(
                "L-BFGS-B produced non-finite factors".into(),
            ));
        }
        info.termination = termination;
        info.func_evals = eval.evals;
        info.elapsed = start.elapsed();
        Ok((to_model(fitted)?, info))
    }
}

//! Solver diagnostics

use std::fmt;
use std::time::Duration;

/// Why a solver reported convergence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConvergenceReason {
    /// Projected-gradient infinity norm fell below `pgtol`
    ProjectedGradient,
    /// Relative decrease in the objective fell below `factr · ε`
    FunctionChange,
    /// Estimated objective reached `f_est_tol`
    FunctionTolerance,
    /// Too many consecutive failed epochs
    Stalled,
}

impl fmt::Display for ConvergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConvergenceReason::ProjectedGradient => "projected gradient below tolerance",
            ConvergenceReason::FunctionChange => "relative reduction below tolerance",
            ConvergenceReason::FunctionTolerance => "estimated objective below tolerance",
            ConvergenceReason::Stalled => "maximum failed epochs reached",
        })
    }
}

/// How a solve ended
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    MaxIterations,
    Converged(ConvergenceReason),
    /// The solver stopped early; the last accepted iterate is returned
    Error(String),
}

impl Termination {
    pub fn is_converged(&self) -> bool {
        matches!(self, Termination::Converged(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::MaxIterations => write!(f, "max_iters"),
            Termination::Converged(reason) => write!(f, "converged ({})", reason),
            Termination::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Objective trace entry: an iteration for L-BFGS-B, an epoch for the
/// stochastic solvers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationRecord<T> {
    pub iteration: usize,
    pub f: T,
    pub grad_norm: Option<T>,
}

/// Everything a solver reports alongside the fitted model
#[derive(Debug, Clone, PartialEq)]
pub struct SolveInfo<T> {
    pub solver: String,
    pub history: Vec<IterationRecord<T>>,
    pub termination: Termination,
    pub iterations: usize,
    pub func_evals: usize,
    pub failed_epochs: usize,
    pub final_f: T,
    pub elapsed: Duration,
}

impl<T: Copy> SolveInfo<T> {
    pub(crate) fn new(solver: impl Into<String>, f0: T) -> Self {
        Self {
            solver: solver.into(),
            history: Vec::new(),
            termination: Termination::MaxIterations,
            iterations: 0,
            func_evals: 0,
            failed_epochs: 0,
            final_f: f0,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn record(&mut self, iteration: usize, f: T, grad_norm: Option<T>) {
        self.history.push(IterationRecord {
            iteration,
            f,
            grad_norm,
        });
        self.final_f = f;
    }

    /// Objective value at the start of the solve.
    pub fn initial_f(&self) -> Option<T> {
        self.history.first().map(|r| r.f)
    }
}

impl<T: fmt::Display> fmt::Display for SolveInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} after {} iterations ({} evaluations, {} failed epochs), f = {}, {:.3}s",
            self.solver,
            self.termination,
            self.iterations,
            self.func_evals,
            self.failed_epochs,
            self.final_f,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_display() {
        assert_eq!(Termination::MaxIterations.to_string(), "max_iters");
        assert_eq!(
            Termination::Converged(ConvergenceReason::ProjectedGradient).to_string(),
            "converged (projected gradient below tolerance)"
        );
        assert_eq!(
            Termination::Error("line search failed".into()).to_string(),
            "error: line search failed"
        );
    }

    #[test]
    fn test_record_tracks_final() {
        let mut info = SolveInfo::new("sgd", 5.0);
        assert_eq!(info.initial_f(), None);
        info.record(0, 4.0, None);
        info.record(1, 3.0, Some(0.5));
        assert_eq!(info.initial_f(), Some(4.0));
        assert_eq!(info.final_f, 3.0);
        assert_eq!(info.history.len(), 2);
    }
}

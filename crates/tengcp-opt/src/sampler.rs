//! Mini-batch samplers for stochastic GCP
//!
//! A sampler draws tensor coordinates in two blocks: *observed* entries (stored
//! nonzeros) and *zero* entries (unrecorded, assumed zero). Each drawn entry
//! carries a weight equal to the inverse of its selection probability, so the
//! weighted sum over a batch is an unbiased estimate of the sum over the tensor.
//!
//! | Strategy | observed block | zero block |
//! |---|---|---|
//! | [`SamplerType::Uniform`] | every entry drawn uniformly, weight N/s | (entries drawn with value zero) |
//! | [`SamplerType::Stratified`] | nonzeros, weight nnz/s₁ | rejection-sampled zeros, weight (N−nnz)/s₀ |
//! | [`SamplerType::SemiStratified`] | nonzeros, corrected by f(m,0), weight nnz/s₁ | any entry taken as zero, weight N/s₀ |
//!
//! Function-value samples are drawn once per solve; gradient samples are drawn
//! fresh on every step.

use crate::data::TensorData;
use crate::error::{GcpError, GcpResult};
use crate::objectives::Support;
use crate::scalar::GcpFloat;
use scirs2_core::random::{rngs::StdRng, Rng};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tengcp_core::ops::unravel_index;

const DEFAULT_FUNCTION_FLOOR: usize = 100_000;
const DEFAULT_GRADIENT_FLOOR: usize = 1000;

/// Sampling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplerType {
    Uniform,
    Stratified,
    SemiStratified,
}

impl fmt::Display for SamplerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SamplerType::Uniform => "uniform",
            SamplerType::Stratified => "stratified",
            SamplerType::SemiStratified => "semi-stratified",
        })
    }
}

impl FromStr for SamplerType {
    type Err = GcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "uniform" => Ok(SamplerType::Uniform),
            "stratified" => Ok(SamplerType::Stratified),
            "semi-stratified" | "semistratified" => Ok(SamplerType::SemiStratified),
            other => Err(GcpError::InvalidInput(format!(
                "unknown sampler '{}'; expected uniform, stratified or semi-stratified",
                other
            ))),
        }
    }
}

/// Number of entries one draw takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleSizes {
    /// Total count for [`SamplerType::Uniform`]
    Uniform(usize),
    /// Per-block counts for the stratified strategies
    Stratified { observed: usize, zeros: usize },
}

/// Sampler settings; `None` fields take data-dependent defaults
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerConfig {
    pub function_sampler: Option<SamplerType>,
    pub gradient_sampler: Option<SamplerType>,
    pub function_samples: Option<SampleSizes>,
    pub gradient_samples: Option<SampleSizes>,
    /// Candidate oversampling factor for rejection-sampling zeros
    pub over_sample: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            function_sampler: None,
            gradient_sampler: None,
            function_samples: None,
            gradient_samples: None,
            over_sample: 1.1,
        }
    }
}

impl SamplerConfig {
    /// Use `kind` for both function and gradient samples.
    pub fn with_sampler(mut self, kind: SamplerType) -> Self {
        self.function_sampler = Some(kind);
        self.gradient_sampler = Some(kind);
        self
    }

    pub fn function_sampler(mut self, kind: SamplerType) -> Self {
        self.function_sampler = Some(kind);
        self
    }

    pub fn gradient_sampler(mut self, kind: SamplerType) -> Self {
        self.gradient_sampler = Some(kind);
        self
    }

    pub fn function_samples(mut self, sizes: SampleSizes) -> Self {
        self.function_samples = Some(sizes);
        self
    }

    pub fn gradient_samples(mut self, sizes: SampleSizes) -> Self {
        self.gradient_samples = Some(sizes);
        self
    }

    pub fn over_sample(mut self, factor: f64) -> Self {
        self.over_sample = factor;
        self
    }
}

/// One drawn mini-batch
///
/// `subs[..n_observed]` is the observed block and `subs[n_observed..]` the zero
/// block. When `corrected` is set, observed contributions are `f(m, x) − f(m, 0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch<T> {
    pub subs: Vec<Vec<usize>>,
    pub vals: Vec<T>,
    pub weights: Vec<T>,
    pub n_observed: usize,
    pub corrected: bool,
}

impl<T> SampleBatch<T> {
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    pub fn observed(&self) -> &[Vec<usize>] {
        &self.subs[..self.n_observed]
    }

    pub fn zeros(&self) -> &[Vec<usize>] {
        &self.subs[self.n_observed..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    kind: SamplerType,
    observed: usize,
    zeros: usize,
}

/// Draws function and gradient batches from one data tensor
///
/// Holds coordinates into the data, never the data tensor itself.
#[derive(Debug, Clone)]
pub struct GcpSampler<T> {
    shape: Vec<usize>,
    numel: usize,
    obs_subs: Vec<Vec<usize>>,
    obs_vals: Vec<T>,
    obs_linear: HashSet<usize>,
    lookup: HashMap<usize, T>,
    function_plan: Plan,
    gradient_plan: Plan,
    over_sample: f64,
    budget: Option<usize>,
    draws: usize,
}

impl<T: GcpFloat> GcpSampler<T> {
    /// Resolve `config` against `data`.
    ///
    /// `support` is the objective's inclusion policy: with
    /// [`Support::Observed`] only the observed block is ever drawn.
    /// `max_iters` scales the default gradient sample size.
    ///
    /// # Errors
    ///
    /// [`GcpError::Configuration`] when observed entries must be drawn but the
    /// data has none, or when a strategy contradicts the support policy.
    pub fn new(
        data: &TensorData<T>,
        config: &SamplerConfig,
        support: Support,
        max_iters: usize,
    ) -> GcpResult<Self> {
        if config.over_sample.is_nan() || config.over_sample < 1.0 {
            return Err(GcpError::Configuration(format!(
                "over_sample must be at least 1, got {}",
                config.over_sample
            )));
        }
        let shape = data.shape().to_vec();
        let numel = data.numel();
        let (obs_subs, obs_vals) = data.find();
        let nnz = obs_subs.len();
        let lookup = data.value_map();
        let obs_linear = lookup.keys().copied().collect();

        let default_kind = if data.is_sparse() || support == Support::Observed {
            SamplerType::Stratified
        } else {
            SamplerType::Uniform
        };
        let function_kind = config.function_sampler.unwrap_or(default_kind);
        let gradient_kind = config.gradient_sampler.unwrap_or(default_kind);

        let max_iters = max_iters.max(1);
        let function_plan = Self::plan(
            function_kind,
            config.function_samples,
            support,
            numel,
            nnz,
            |n| n.div_ceil(10).max(DEFAULT_FUNCTION_FLOOR),
        )?;
        let gradient_plan = Self::plan(
            gradient_kind,
            config.gradient_samples,
            support,
            numel,
            nnz,
            |n| (3 * n).div_ceil(max_iters).max(DEFAULT_GRADIENT_FLOOR),
        )?;

        Ok(Self {
            shape,
            numel,
            obs_subs,
            obs_vals,
            obs_linear,
            lookup,
            function_plan,
            gradient_plan,
            over_sample: config.over_sample,
            budget: None,
            draws: 0,
        })
    }

    fn plan(
        kind: SamplerType,
        sizes: Option<SampleSizes>,
        support: Support,
        numel: usize,
        nnz: usize,
        default_size: impl Fn(usize) -> usize,
    ) -> GcpResult<Plan> {
        let nzeros = numel - nnz;
        if support == Support::Observed && kind != SamplerType::Stratified {
            return Err(GcpError::Configuration(format!(
                "the objective fits only observed entries; {} sampling would draw unobserved ones",
                kind
            )));
        }
        let plan = match kind {
            SamplerType::Uniform => {
                let total = match sizes {
                    None => default_size(numel).min(numel),
                    Some(SampleSizes::Uniform(n)) => n,
                    Some(other) => {
                        return Err(GcpError::Configuration(format!(
                            "uniform sampling takes a single sample count, got {:?}",
                            other
                        )))
                    }
                };
                Plan {
                    kind,
                    observed: total,
                    zeros: 0,
                }
            }
            SamplerType::Stratified | SamplerType::SemiStratified => {
                if nnz == 0 {
                    return Err(GcpError::Configuration(format!(
                        "{} sampling needs at least one nonzero entry to draw observed samples",
                        kind
                    )));
                }
                let zero_pool = if kind == SamplerType::Stratified {
                    nzeros
                } else {
                    numel
                };
                let (observed, zeros) = match sizes {
                    None => (
                        default_size(nnz).min(nnz),
                        default_size(zero_pool).min(zero_pool),
                    ),
                    Some(SampleSizes::Stratified { observed, zeros }) => (observed, zeros),
                    Some(other) => {
                        return Err(GcpError::Configuration(format!(
                            "{} sampling takes observed and zero counts, got {:?}",
                            kind, other
                        )))
                    }
                };
                let zeros = match support {
                    Support::Observed => 0,
                    Support::All if kind == SamplerType::Stratified && nzeros == 0 => 0,
                    Support::All => zeros,
                };
                if observed == 0 {
                    return Err(GcpError::Configuration(
                        "the observed block must draw at least one sample".into(),
                    ));
                }
                Plan {
                    kind,
                    observed,
                    zeros,
                }
            }
        };
        if plan.observed + plan.zeros == 0 {
            return Err(GcpError::Configuration(
                "sampler must draw at least one entry".into(),
            ));
        }
        Ok(plan)
    }

    /// Draw the fixed batch used for objective estimates.
    pub fn function_sample(&self, rng: &mut StdRng) -> SampleBatch<T> {
        self.sample(self.function_plan, rng)
    }

    /// Draw the gradient batch for one step of `epoch`.
    ///
    /// # Errors
    ///
    /// [`GcpError::Configuration`] once the draw budget set by
    /// [`GcpSampler::reset_budget`] is spent.
    pub fn draw(&mut self, epoch: usize, rng: &mut StdRng) -> GcpResult<SampleBatch<T>> {
        if let Some(budget) = self.budget {
            if self.draws >= budget {
                return Err(GcpError::Configuration(format!(
                    "sample budget of {} draws exhausted in epoch {}",
                    budget, epoch
                )));
            }
        }
        self.draws += 1;
        Ok(self.sample(self.gradient_plan, rng))
    }

    /// Restart the draw sequence with room for `max_draws` gradient batches.
    pub fn reset_budget(&mut self, max_draws: usize) {
        self.budget = Some(max_draws);
        self.draws = 0;
    }

    /// Gradient batches drawn since the last reset.
    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn gradient_sampler(&self) -> SamplerType {
        self.gradient_plan.kind
    }

    pub fn function_sampler(&self) -> SamplerType {
        self.function_plan.kind
    }

    fn sample(&self, plan: Plan, rng: &mut StdRng) -> SampleBatch<T> {
        match plan.kind {
            SamplerType::Uniform => self.sample_uniform(plan.observed, rng),
            SamplerType::Stratified | SamplerType::SemiStratified => {
                self.sample_stratified(plan, rng)
            }
        }
    }

    fn sample_uniform(&self, count: usize, rng: &mut StdRng) -> SampleBatch<T> {
        let weight = T::of_usize(self.numel) / T::of_usize(count);
        let mut observed = Vec::new();
        let mut zeros = Vec::new();
        for _ in 0..count {
            let lin = rng.random_range(0..self.numel);
            match self.lookup.get(&lin) {
                Some(&v) => observed.push((unravel_index(lin, &self.shape), v)),
                None => zeros.push(unravel_index(lin, &self.shape)),
            }
        }
        let n_observed = observed.len();
        let (mut subs, mut vals): (Vec<_>, Vec<_>) = observed.into_iter().unzip();
        vals.extend(std::iter::repeat(T::zero()).take(zeros.len()));
        subs.extend(zeros);
        SampleBatch {
            weights: vec![weight; subs.len()],
            subs,
            vals,
            n_observed,
            corrected: false,
        }
    }

    fn sample_stratified(&self, plan: Plan, rng: &mut StdRng) -> SampleBatch<T> {
        let nnz = self.obs_subs.len();
        let mut subs = Vec::with_capacity(plan.observed + plan.zeros);
        let mut vals = Vec::with_capacity(plan.observed + plan.zeros);
        let mut weights = Vec::with_capacity(plan.observed + plan.zeros);

        let w_obs = T::of_usize(nnz) / T::of_usize(plan.observed);
        for _ in 0..plan.observed {
            let p = rng.random_range(0..nnz);
            subs.push(self.obs_subs[p].clone());
            vals.push(self.obs_vals[p]);
            weights.push(w_obs);
        }

        if plan.zeros > 0 {
            let (zero_lin, pool) = match plan.kind {
                SamplerType::SemiStratified => (
                    (0..plan.zeros)
                        .map(|_| rng.random_range(0..self.numel))
                        .collect::<Vec<_>>(),
                    self.numel,
                ),
                _ => (self.rejection_zeros(plan.zeros, rng), self.numel - nnz),
            };
            let w_zero = T::of_usize(pool) / T::of_usize(plan.zeros);
            for lin in zero_lin {
                subs.push(unravel_index(lin, &self.shape));
                vals.push(T::zero());
                weights.push(w_zero);
            }
        }

        SampleBatch {
            subs,
            vals,
            weights,
            n_observed: plan.observed,
            corrected: plan.kind == SamplerType::SemiStratified,
        }
    }

    /// Linear indices of `count` unrecorded entries, drawn with replacement.
    fn rejection_zeros(&self, count: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut out = Vec::with_capacity(count);
        let batch = ((count as f64) * self.over_sample).ceil() as usize;
        while out.len() < count {
            for _ in 0..batch {
                let lin = rng.random_range(0..self.numel);
                if !self.obs_linear.contains(&lin) {
                    out.push(lin);
                    if out.len() == count {
                        break;
                    }
                }
            }
        }
        out
    }

    /// One-line summary for logs.
    pub fn describe(&self) -> String {
        let fmt_plan = |p: &Plan| match p.kind {
            SamplerType::Uniform => format!("{} ({} samples)", p.kind, p.observed),
            _ => format!("{} ({} observed, {} zero)", p.kind, p.observed, p.zeros),
        };
        format!(
            "function: {}; gradient: {}",
            fmt_plan(&self.function_plan),
            fmt_plan(&self.gradient_plan)
        )
    }
}

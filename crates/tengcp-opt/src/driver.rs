//! `gcp_opt`: the generalized CP fitting entry point
//!
//! A call runs through fixed stages: validate inputs, build the objective,
//! resolve entry inclusion (mask or sampler), build the initial model, run the
//! solver, package the result. Every failure is reported before the solver
//! starts except numerical breakdowns inside it; caller-owned values are never
//! modified.

use crate::data::TensorData;
use crate::error::{GcpError, GcpResult};
use crate::info::SolveInfo;
use crate::ktensor::KruskalTensor;
use crate::mask::Mask;
use crate::objectives::{setup, Objective, Objectives, Support};
use crate::sampler::{GcpSampler, SamplerConfig};
use crate::scalar::GcpFloat;
use crate::solvers::{GcpSolver, Inclusion, Problem};
use scirs2_core::ndarray_ext::Array2;
use scirs2_core::random::{rngs::StdRng, thread_rng, SeedableRng};
use std::borrow::Cow;
use std::str::FromStr;

/// Starting point for the fit
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Init<T> {
    /// Uniform random factors scaled to the data norm
    #[default]
    Random,
    /// An existing model; its weights are folded into the first factor
    Model(KruskalTensor<T>),
    /// Bare factor matrices, taken with unit weights
    Factors(Vec<Array2<T>>),
}

impl<T> FromStr for Init<T> {
    type Err = GcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("random") {
            Ok(Init::Random)
        } else {
            Err(GcpError::InvalidInput(format!(
                "unsupported init '{}'; expected \"random\", a Kruskal model or a list of factor matrices",
                s
            )))
        }
    }
}

impl<T> From<KruskalTensor<T>> for Init<T> {
    fn from(model: KruskalTensor<T>) -> Self {
        Init::Model(model)
    }
}

impl<T> From<Vec<Array2<T>>> for Init<T> {
    fn from(factors: Vec<Array2<T>>) -> Self {
        Init::Factors(factors)
    }
}

/// A named objective (with its extra parameter, if any) or a custom one
#[derive(Debug, Clone)]
pub enum ObjectiveSpec<T> {
    Named(Objectives, Option<f64>),
    Custom(Objective<T>),
}

impl<T> From<Objectives> for ObjectiveSpec<T> {
    fn from(o: Objectives) -> Self {
        ObjectiveSpec::Named(o, None)
    }
}

impl<T> From<(Objectives, f64)> for ObjectiveSpec<T> {
    fn from((o, p): (Objectives, f64)) -> Self {
        ObjectiveSpec::Named(o, Some(p))
    }
}

impl<T> From<Objective<T>> for ObjectiveSpec<T> {
    fn from(o: Objective<T>) -> Self {
        ObjectiveSpec::Custom(o)
    }
}

/// Optional inputs to [`gcp_opt`]
#[derive(Debug, Clone)]
pub struct GcpOptions<T> {
    pub init: Init<T>,
    /// Entry weights for mask-based solvers
    pub mask: Option<Mask<T>>,
    /// Sampler settings for sampler-based solvers
    pub sampler: Option<SamplerConfig>,
    /// Progress line every this many iterations; 0 is silent
    pub printitn: usize,
}

impl<T> Default for GcpOptions<T> {
    fn default() -> Self {
        Self {
            init: Init::Random,
            mask: None,
            sampler: None,
            printitn: 1,
        }
    }
}

impl<T> GcpOptions<T> {
    pub fn init(mut self, init: impl Into<Init<T>>) -> Self {
        self.init = init.into();
        self
    }

    pub fn mask(mut self, mask: Mask<T>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn sampler(mut self, config: SamplerConfig) -> Self {
        self.sampler = Some(config);
        self
    }

    pub fn printitn(mut self, n: usize) -> Self {
        self.printitn = n;
        self
    }
}

/// Result of a fit
#[derive(Debug, Clone)]
pub struct GcpFit<T> {
    /// Fitted model, unit weights
    pub model: KruskalTensor<T>,
    /// The model the solver started from, unit weights
    pub initial: KruskalTensor<T>,
    pub info: SolveInfo<T>,
}

impl<T> GcpFit<T> {
    /// `(fitted, initial, info)`.
    pub fn into_parts(self) -> (KruskalTensor<T>, KruskalTensor<T>, SolveInfo<T>) {
        (self.model, self.initial, self.info)
    }
}

/// Fit a rank-`rank` CP model to `data` under a generalized loss.
///
/// `rng` drives random initialization and sampling; a freshly seeded generator
/// reproduces a run exactly.
///
/// # Errors
///
/// - [`GcpError::InvalidInput`]: invalid data, zero rank, an init of the wrong
///   rank, a missing objective parameter
/// - [`GcpError::IncompatibleOptions`]: a mask with a sampler-based solver,
///   sampler settings with a mask-based solver, sparse data with a dense-only
///   solver or objective, or a mask with sparse data
/// - [`GcpError::ShapeMismatch`]: a mask or init whose shape differs from the data
/// - [`GcpError::Domain`]: data values the objective does not admit
/// - [`GcpError::Configuration`] / [`GcpError::Numerical`]: raised by the sampler or solver
///
/// # Examples
///
/// ```
/// use scirs2_core::random::{rngs::StdRng, SeedableRng};
/// use tengcp_core::DenseND;
/// use tengcp_opt::{gcp_opt, GcpOptions, Lbfgsb, LbfgsbConfig, Objectives, TensorData};
///
/// let data: TensorData<f64> =
///     DenseND::from_vec(vec![1.0, 0.0, 2.0, 3.0, 0.0, 1.0], &[2, 3]).unwrap().into();
/// let mut solver = Lbfgsb::new(LbfgsbConfig::default().max_iters(20));
/// let fit = gcp_opt(
///     &data,
///     2,
///     Objectives::Poisson,
///     &mut solver,
///     GcpOptions::default().printitn(0),
///     &mut StdRng::seed_from_u64(7),
/// )
/// .unwrap();
/// assert!(fit.initial.weights().iter().all(|&w| w == 1.0));
/// assert_eq!(fit.model.shape().as_slice(), &[2, 3]);
/// ```
pub fn gcp_opt<T: GcpFloat>(
    data: &TensorData<T>,
    rank: usize,
    objective: impl Into<ObjectiveSpec<T>>,
    optimizer: &mut dyn GcpSolver<T>,
    options: GcpOptions<T>,
    rng: &mut StdRng,
) -> GcpResult<GcpFit<T>> {
    data.validate()?;
    if rank == 0 {
        return Err(GcpError::InvalidInput(
            "rank must be a positive integer, got 0".into(),
        ));
    }

    let objective = match objective.into() {
        ObjectiveSpec::Named(o, param) => setup(o, data, param)?,
        ObjectiveSpec::Custom(o) => {
            o.check_storage(data)?;
            o
        }
    };

    let solver_name = optimizer.name().to_string();
    if data.is_sparse() && !optimizer.supports_sparse() {
        return Err(GcpError::IncompatibleOptions(format!(
            "optimizer '{}' does not support sparse data",
            solver_name
        )));
    }

    let GcpOptions {
        init,
        mask,
        sampler: sampler_config,
        printitn,
    } = options;
    let mask = resolve_mask(data, mask, &objective, optimizer, &solver_name)?;
    if sampler_config.is_some() && !optimizer.requires_sampler() {
        return Err(GcpError::IncompatibleOptions(format!(
            "sampler settings were given but optimizer '{}' evaluates the full objective",
            solver_name
        )));
    }

    let working: Cow<'_, TensorData<T>> = match (&mask, data) {
        (Some(m), TensorData::Dense(dense)) => Cow::Owned(TensorData::Dense(m.apply(dense)?)),
        _ => Cow::Borrowed(data),
    };
    let work: &TensorData<T> = &working;

    let initial = initial_model(init, work, rank, rng)?;

    log::info!(
        "GCP-OPT: {} tensor, rank {}, objective '{}', optimizer '{}', {}",
        work.describe(),
        rank,
        objective.name(),
        solver_name,
        match (&mask, optimizer.requires_sampler()) {
            (_, true) => "sampled entries".to_string(),
            (Some(m), false) => format!("{} masked entries", m.count()),
            (None, false) => "all entries".to_string(),
        }
    );

    let (model, info) = if optimizer.requires_sampler() {
        let config = sampler_config.unwrap_or_default();
        let mut sampler = GcpSampler::new(work, &config, objective.support(), optimizer.max_iters())?;
        log::debug!("GCP-OPT sampler: {}", sampler.describe());
        let problem = Problem {
            objective: &objective,
            data: work,
            inclusion: Inclusion::Sampler(&mut sampler),
            printitn,
        };
        optimizer.solve(&initial, problem, rng)?
    } else {
        let problem = Problem {
            objective: &objective,
            data: work,
            inclusion: Inclusion::Mask(mask.as_ref()),
            printitn,
        };
        optimizer.solve(&initial, problem, rng)?
    };

    log::info!("GCP-OPT finished: {}", info);
    Ok(GcpFit {
        model,
        initial,
        info,
    })
}

/// [`gcp_opt`] with a generator seeded from `seed`, or from the thread
/// generator when `seed` is `None`.
pub fn gcp_opt_seeded<T: GcpFloat>(
    data: &TensorData<T>,
    rank: usize,
    objective: impl Into<ObjectiveSpec<T>>,
    optimizer: &mut dyn GcpSolver<T>,
    options: GcpOptions<T>,
    seed: Option<u64>,
) -> GcpResult<GcpFit<T>> {
    let seed = seed.unwrap_or_else(|| thread_rng().random::<u64>());
    let mut rng = StdRng::seed_from_u64(seed);
    gcp_opt(data, rank, objective, optimizer, options, &mut rng)
}

fn resolve_mask<T: GcpFloat>(
    data: &TensorData<T>,
    mask: Option<Mask<T>>,
    objective: &Objective<T>,
    optimizer: &dyn GcpSolver<T>,
    solver_name: &str,
) -> GcpResult<Option<Mask<T>>> {
    match mask {
        Some(_) if optimizer.requires_sampler() => Err(GcpError::IncompatibleOptions(format!(
            "a mask cannot be combined with optimizer '{}'; its sampler decides which entries are fit",
            solver_name
        ))),
        Some(_) if data.is_sparse() => Err(GcpError::IncompatibleOptions(
            "a mask cannot be combined with sparse data".into(),
        )),
        Some(m) => {
            m.validate(data)?;
            Ok(Some(m))
        }
        None if optimizer.requires_sampler() => Ok(None),
        None => Ok(match objective.support() {
            Support::Observed => Some(Mask::observed(data)),
            Support::All => None,
        }),
    }
}

fn check_init_shape<T: GcpFloat>(
    model: &KruskalTensor<T>,
    data: &TensorData<T>,
    rank: usize,
) -> GcpResult<()> {
    if model.shape().as_slice() != data.shape() {
        return Err(GcpError::shape_mismatch(
            data.shape(),
            &model.shape(),
            "initial model",
        ));
    }
    if model.rank() != rank {
        return Err(GcpError::InvalidInput(format!(
            "initial model has rank {} but rank {} was requested",
            model.rank(),
            rank
        )));
    }
    Ok(())
}

/// Build the unit-weight starting model.
fn initial_model<T: GcpFloat>(
    init: Init<T>,
    data: &TensorData<T>,
    rank: usize,
    rng: &mut StdRng,
) -> GcpResult<KruskalTensor<T>> {
    let mut model = match init {
        Init::Random => {
            let mut model = KruskalTensor::random(data.shape(), rank, rng);
            let (mnorm, dnorm) = (model.norm(), data.norm());
            if mnorm > T::zero() && dnorm > T::zero() && (dnorm / mnorm).is_finite() {
                model.scale(dnorm / mnorm);
            }
            model
        }
        Init::Model(model) => model,
        Init::Factors(factors) => KruskalTensor::from_factors(factors)?,
    };
    check_init_shape(&model, data, rank)?;
    model.absorb_weights(0)?;
    Ok(model)
}

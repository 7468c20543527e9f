//! Objective registry: elementwise losses, their derivatives and their constraints
//!
//! Every supported statistical model is a variant of the closed enum
//! [`Objectives`]. [`setup`] turns a variant into an [`Objective`]: the loss and
//! derivative callables, the lower bound imposed on model factors, and the
//! default inclusion policy, after checking the data against the model's domain.
//!
//! Callables take `(model_value, data_value)`.
//!
//! | Objective | lower bound | data domain |
//! |---|---|---|
//! | `gaussian` | −∞ | real |
//! | `bernoulli_odds` | 0 | {0, 1} |
//! | `bernoulli_logit` | −∞ | {0, 1} |
//! | `poisson` | 0 | natural |
//! | `poisson_log` | −∞ | natural |
//! | `rayleigh` | 0 | non-negative |
//! | `gamma` | 0 | non-negative |
//! | `huber` (threshold) | −∞ | real |
//! | `negative_binomial` (trials) | 0 | natural |
//! | `beta` (b) | 0 | non-negative |
//! | `zt_poisson` | 0 | natural |

use crate::data::TensorData;
use crate::error::{GcpError, GcpResult};
use crate::scalar::GcpFloat;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Offset keeping logarithms and reciprocals finite at a zero model value.
pub const EPS: f64 = 1e-10;

/// Elementwise callable `(model_value, data_value) -> scalar`.
pub type ElementFn<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// Supported statistical models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Objectives {
    Gaussian,
    BernoulliOdds,
    BernoulliLogit,
    Poisson,
    PoissonLog,
    Rayleigh,
    Gamma,
    Huber,
    NegativeBinomial,
    Beta,
    ZeroTruncatedPoisson,
}

/// Values an objective admits as data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Real,
    Binary,
    Natural,
    NonNegative,
}

impl Domain {
    pub fn admits<T: GcpFloat>(&self, x: T) -> bool {
        match self {
            Domain::Real => x.is_finite(),
            Domain::Binary => x == T::zero() || x == T::one(),
            Domain::Natural => x >= T::zero() && x == x.floor(),
            Domain::NonNegative => x >= T::zero(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Domain::Real => "finite",
            Domain::Binary => "0 or 1",
            Domain::Natural => "non-negative integers",
            Domain::NonNegative => "non-negative",
        }
    }
}

/// Which entries a fit includes when the caller gives no mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Support {
    /// Every entry, zeros included
    All,
    /// Only the nonzero (observed) entries
    Observed,
}

impl Objectives {
    pub const ALL: [Objectives; 11] = [
        Objectives::Gaussian,
        Objectives::BernoulliOdds,
        Objectives::BernoulliLogit,
        Objectives::Poisson,
        Objectives::PoissonLog,
        Objectives::Rayleigh,
        Objectives::Gamma,
        Objectives::Huber,
        Objectives::NegativeBinomial,
        Objectives::Beta,
        Objectives::ZeroTruncatedPoisson,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Objectives::Gaussian => "gaussian",
            Objectives::BernoulliOdds => "bernoulli_odds",
            Objectives::BernoulliLogit => "bernoulli_logit",
            Objectives::Poisson => "poisson",
            Objectives::PoissonLog => "poisson_log",
            Objectives::Rayleigh => "rayleigh",
            Objectives::Gamma => "gamma",
            Objectives::Huber => "huber",
            Objectives::NegativeBinomial => "negative_binomial",
            Objectives::Beta => "beta",
            Objectives::ZeroTruncatedPoisson => "zt_poisson",
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Objectives::Gaussian | Objectives::Huber => Domain::Real,
            Objectives::BernoulliOdds | Objectives::BernoulliLogit => Domain::Binary,
            Objectives::Poisson
            | Objectives::PoissonLog
            | Objectives::NegativeBinomial
            | Objectives::ZeroTruncatedPoisson => Domain::Natural,
            Objectives::Rayleigh | Objectives::Gamma | Objectives::Beta => Domain::NonNegative,
        }
    }

    /// Lower bound on factor entries: 0 for models whose mean must stay
    /// non-negative, −∞ for link-function and real-valued models.
    pub fn lower_bound(&self) -> f64 {
        match self {
            Objectives::Gaussian
            | Objectives::BernoulliLogit
            | Objectives::PoissonLog
            | Objectives::Huber => f64::NEG_INFINITY,
            _ => 0.0,
        }
    }

    /// Name of the extra parameter the model needs, if any.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            Objectives::Huber => Some("threshold"),
            Objectives::NegativeBinomial => Some("number of trials"),
            Objectives::Beta => Some("b"),
            _ => None,
        }
    }

    pub fn support(&self) -> Support {
        match self {
            Objectives::ZeroTruncatedPoisson => Support::Observed,
            _ => Support::All,
        }
    }

    fn handles<T: GcpFloat>(&self, param: Option<T>) -> GcpResult<(ElementFn<T>, ElementFn<T>)> {
        let param = match (self.parameter(), param) {
            (Some(what), None) => {
                return Err(GcpError::InvalidInput(format!(
                    "objective '{}' requires an additional parameter ({})",
                    self, what
                )))
            }
            (_, p) => p.unwrap_or_else(T::zero),
        };
        let handles = match self {
            Objectives::Gaussian => pair(gaussian_loss::<T>, gaussian_grad::<T>),
            Objectives::BernoulliOdds => pair(bernoulli_odds_loss::<T>, bernoulli_odds_grad::<T>),
            Objectives::BernoulliLogit => {
                pair(bernoulli_logit_loss::<T>, bernoulli_logit_grad::<T>)
            }
            Objectives::Poisson => pair(poisson_loss::<T>, poisson_grad::<T>),
            Objectives::PoissonLog => pair(poisson_log_loss::<T>, poisson_log_grad::<T>),
            Objectives::Rayleigh => pair(rayleigh_loss::<T>, rayleigh_grad::<T>),
            Objectives::Gamma => pair(gamma_loss::<T>, gamma_grad::<T>),
            Objectives::Huber => {
                if !(param > T::zero()) {
                    return Err(GcpError::InvalidInput(format!(
                        "huber threshold must be positive, got {}",
                        param
                    )));
                }
                pair(
                    move |m, x| huber_loss(m, x, param),
                    move |m, x| huber_grad(m, x, param),
                )
            }
            Objectives::NegativeBinomial => {
                if !(param > T::zero()) {
                    return Err(GcpError::InvalidInput(format!(
                        "negative_binomial number of trials must be positive, got {}",
                        param
                    )));
                }
                pair(
                    move |m, x| negative_binomial_loss(m, x, param),
                    move |m, x| negative_binomial_grad(m, x, param),
                )
            }
            Objectives::Beta => {
                if !param.is_finite() || param == T::zero() || param == T::one() {
                    return Err(GcpError::InvalidInput(format!(
                        "beta parameter b must be finite and not 0 or 1, got {}",
                        param
                    )));
                }
                pair(
                    move |m, x| beta_loss(m, x, param),
                    move |m, x| beta_grad(m, x, param),
                )
            }
            Objectives::ZeroTruncatedPoisson => pair(ztp_loss::<T>, ztp_grad::<T>),
        };
        Ok(handles)
    }
}

impl fmt::Display for Objectives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objectives {
    type Err = GcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Objectives::ALL
            .iter()
            .copied()
            .find(|o| o.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Objectives::ALL.iter().map(|o| o.name()).collect();
                GcpError::InvalidInput(format!(
                    "unknown objective '{}'; expected one of {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Loss, derivative and constraints consumed read-only by a solver
#[derive(Clone)]
pub struct Objective<T> {
    name: String,
    loss: ElementFn<T>,
    grad: ElementFn<T>,
    lower_bound: T,
    supports_sparse: bool,
    support: Support,
}

impl<T: fmt::Debug> fmt::Debug for Objective<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("name", &self.name)
            .field("lower_bound", &self.lower_bound)
            .field("supports_sparse", &self.supports_sparse)
            .field("support", &self.support)
            .finish()
    }
}

impl<T: GcpFloat> Objective<T> {
    /// A caller-supplied loss/derivative pair.
    ///
    /// The result supports sparse data and includes every entry by default.
    ///
    /// # Examples
    ///
    /// ```
    /// use tengcp_opt::Objective;
    ///
    /// let abs_dev = Objective::custom(
    ///     |m: f64, x: f64| (m - x).abs(),
    ///     |m: f64, x: f64| (m - x).signum(),
    ///     f64::NEG_INFINITY,
    /// )
    /// .unwrap();
    /// assert_eq!(abs_dev.loss(1.0, 3.0), 2.0);
    /// assert!(Objective::custom(|m: f64, _| m, |_, _| 1.0, f64::NAN).is_err());
    /// ```
    pub fn custom<L, G>(loss: L, grad: G, lower_bound: T) -> GcpResult<Self>
    where
        L: Fn(T, T) -> T + Send + Sync + 'static,
        G: Fn(T, T) -> T + Send + Sync + 'static,
    {
        if lower_bound.is_nan() {
            return Err(GcpError::InvalidInput(
                "custom objective lower bound must not be NaN".into(),
            ));
        }
        Ok(Self {
            name: "custom".into(),
            loss: Arc::new(loss),
            grad: Arc::new(grad),
            lower_bound,
            supports_sparse: true,
            support: Support::All,
        })
    }

    /// Mark the objective as unusable with sparse data.
    pub fn dense_only(mut self) -> Self {
        self.supports_sparse = false;
        self
    }

    pub fn with_support(mut self, support: Support) -> Self {
        self.support = support;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn loss(&self, model: T, data: T) -> T {
        (self.loss)(model, data)
    }

    #[inline]
    pub fn grad(&self, model: T, data: T) -> T {
        (self.grad)(model, data)
    }

    pub fn lower_bound(&self) -> T {
        self.lower_bound
    }

    pub fn supports_sparse(&self) -> bool {
        self.supports_sparse
    }

    pub fn support(&self) -> Support {
        self.support
    }

    /// Reject sparse data when the objective is dense-only.
    pub fn check_storage(&self, data: &TensorData<T>) -> GcpResult<()> {
        if data.is_sparse() && !self.supports_sparse {
            return Err(GcpError::IncompatibleOptions(format!(
                "objective '{}' does not support sparse data",
                self.name
            )));
        }
        Ok(())
    }
}

/// Build the objective for `objective` and check `data` against it.
///
/// # Errors
///
/// - [`GcpError::InvalidInput`] when a required parameter is missing or invalid
/// - [`GcpError::IncompatibleOptions`] when the storage form is unsupported
/// - [`GcpError::Domain`] when a data value is outside the model's domain
///
/// # Examples
///
/// ```
/// use tengcp_core::DenseND;
/// use tengcp_opt::{setup, GcpError, Objectives, TensorData};
///
/// let counts: TensorData<f64> = DenseND::from_vec(vec![0.0, 2.0, 1.0, 5.0], &[2, 2]).unwrap().into();
/// let obj = setup(Objectives::Poisson, &counts, None).unwrap();
/// assert_eq!(obj.lower_bound(), 0.0);
///
/// let binary = setup(Objectives::BernoulliOdds, &counts, None);
/// assert!(matches!(binary, Err(GcpError::Domain(_))));
/// ```
pub fn setup<T: GcpFloat>(
    objective: Objectives,
    data: &TensorData<T>,
    additional_parameter: Option<f64>,
) -> GcpResult<Objective<T>> {
    let (loss, grad) = objective.handles(additional_parameter.map(T::of))?;
    let built = Objective {
        name: objective.name().to_string(),
        loss,
        grad,
        lower_bound: T::of(objective.lower_bound()),
        supports_sparse: true,
        support: objective.support(),
    };
    built.check_storage(data)?;

    let domain = objective.domain();
    if let Some(bad) = data.domain_values().find(|&x| !domain.admits(x)) {
        return Err(GcpError::Domain(format!(
            "objective '{}' requires data values that are {}; found {}",
            objective,
            domain.describe(),
            bad
        )));
    }
    Ok(built)
}

/// [`setup`] with the objective given by name.
///
/// # Examples
///
/// ```
/// use tengcp_core::DenseND;
/// use tengcp_opt::{setup_by_name, GcpError, TensorData};
///
/// let counts: TensorData<f64> = DenseND::from_vec(vec![0.0, 2.0, 1.0, 4.0], &[2, 2]).unwrap().into();
///
/// let poisson = setup_by_name("Poisson", &counts, None).unwrap();
/// assert_eq!(poisson.name(), "poisson");
/// assert_eq!(poisson.lower_bound(), 0.0);
///
/// let huber = setup_by_name("huber", &counts, Some(0.5)).unwrap();
/// assert_eq!(huber.name(), "huber");
///
/// let err = setup_by_name("laplace", &counts, None).unwrap_err();
/// assert!(matches!(err, GcpError::InvalidInput(ref msg) if msg.contains("laplace")));
/// ```
pub fn setup_by_name<T: GcpFloat>(
    name: &str,
    data: &TensorData<T>,
    additional_parameter: Option<f64>,
) -> GcpResult<Objective<T>> {
    setup(name.parse()?, data, additional_parameter)
}

fn pair<T, L, G>(loss: L, grad: G) -> (ElementFn<T>, ElementFn<T>)
where
    L: Fn(T, T) -> T + Send + Sync + 'static,
    G: Fn(T, T) -> T + Send + Sync + 'static,
{
    (Arc::new(loss), Arc::new(grad))
}

fn eps<T: GcpFloat>() -> T {
    T::of(EPS)
}

fn gaussian_loss<T: GcpFloat>(m: T, x: T) -> T {
    (m - x) * (m - x)
}

fn gaussian_grad<T: GcpFloat>(m: T, x: T) -> T {
    T::of(2.0) * (m - x)
}

fn bernoulli_odds_loss<T: GcpFloat>(m: T, x: T) -> T {
    (m + T::one()).ln() - x * (m + eps()).ln()
}

fn bernoulli_odds_grad<T: GcpFloat>(m: T, x: T) -> T {
    T::one() / (m + T::one()) - x / (m + eps())
}

/// ln(1 + eᵐ) without overflow for large m.
fn softplus<T: GcpFloat>(m: T) -> T {
    m.max(T::zero()) + (-m.abs()).exp().ln_1p()
}

fn bernoulli_logit_loss<T: GcpFloat>(m: T, x: T) -> T {
    softplus(m) - x * m
}

fn bernoulli_logit_grad<T: GcpFloat>(m: T, x: T) -> T {
    T::one() / (T::one() + (-m).exp()) - x
}

fn poisson_loss<T: GcpFloat>(m: T, x: T) -> T {
    m - x * (m + eps()).ln()
}

fn poisson_grad<T: GcpFloat>(m: T, x: T) -> T {
    T::one() - x / (m + eps())
}

fn poisson_log_loss<T: GcpFloat>(m: T, x: T) -> T {
    m.exp() - x * m
}

fn poisson_log_grad<T: GcpFloat>(m: T, x: T) -> T {
    m.exp() - x
}

fn rayleigh_loss<T: GcpFloat>(m: T, x: T) -> T {
    let me = m + eps();
    T::of(2.0) * me.ln() + T::FRAC_PI_4() * (x / me).powi(2)
}

fn rayleigh_grad<T: GcpFloat>(m: T, x: T) -> T {
    let me = m + eps();
    T::of(2.0) / me - T::FRAC_PI_2() * x * x / me.powi(3)
}

fn gamma_loss<T: GcpFloat>(m: T, x: T) -> T {
    let me = m + eps();
    x / me + me.ln()
}

fn gamma_grad<T: GcpFloat>(m: T, x: T) -> T {
    let me = m + eps();
    -x / (me * me) + T::one() / me
}

fn huber_loss<T: GcpFloat>(m: T, x: T, delta: T) -> T {
    let r = x - m;
    if r.abs() < delta {
        r * r
    } else {
        T::of(2.0) * delta * r.abs() - delta * delta
    }
}

fn huber_grad<T: GcpFloat>(m: T, x: T, delta: T) -> T {
    let r = x - m;
    if r.abs() < delta {
        -T::of(2.0) * r
    } else {
        -T::of(2.0) * delta * r.signum()
    }
}

fn negative_binomial_loss<T: GcpFloat>(m: T, x: T, trials: T) -> T {
    (trials + x) * m.ln_1p() - x * (m + eps()).ln()
}

fn negative_binomial_grad<T: GcpFloat>(m: T, x: T, trials: T) -> T {
    (trials + x) / (T::one() + m) - x / (m + eps())
}

fn beta_loss<T: GcpFloat>(m: T, x: T, b: T) -> T {
    let me = m + eps();
    me.powf(b) / b - x * me.powf(b - T::one()) / (b - T::one())
}

fn beta_grad<T: GcpFloat>(m: T, x: T, b: T) -> T {
    let me = m + eps();
    me.powf(b - T::one()) - x * me.powf(b - T::of(2.0))
}

/// ln(eᵐ − 1) written as m + ln(1 − e⁻ᵐ) so large model values stay finite.
fn ztp_loss<T: GcpFloat>(m: T, x: T) -> T {
    let me = m + eps();
    me + (-(-me).exp_m1()).ln() - x * me.ln()
}

fn ztp_grad<T: GcpFloat>(m: T, x: T) -> T {
    let me = m + eps();
    T::one() / (-(-me).exp_m1()) - x / me
}

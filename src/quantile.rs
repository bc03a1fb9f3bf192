//! Distribution quantiles by Newton iteration.
//!
//! Solves `F(θ) = q` for any [`Distribution`], using the density as the
//! derivative:
//!
//! ```text
//! θ₀     = mean
//! θₙ₊₁   = θₙ − (F(θₙ) − q) / f(θₙ)
//! ```
//!
//! The search stops once a step moves θ by no more than the tolerance.
//! Termination is always bounded: the loop runs at most
//! [`NewtonConfig::max_iterations`] steps, and a vanishing density aborts
//! immediately instead of dividing by zero.
//!
//! Newton steps from the mean can overshoot the support of a bounded or
//! half-bounded distribution (an Exponential asked for a low quantile,
//! say). The density there is zero and the call reports
//! [`FitError::DerivativeVanished`]. No bracketing fallback is attempted.

use tracing::{debug, trace};

use crate::distributions::Distribution;
use crate::error::{FitError, FitResult};

/// Default step-size tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;
/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
/// Default density floor below which the Newton step is undefined.
pub const DEFAULT_MIN_DERIVATIVE: f64 = 1e-300;

/// Settings for [`quantile_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NewtonConfig {
    /// Converged once `|θₙ₊₁ − θₙ| ≤ tolerance`.
    pub tolerance: f64,
    /// Upper bound on Newton steps.
    pub max_iterations: usize,
    /// `|f(θ)|` below this counts as a vanished derivative.
    pub min_derivative: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            min_derivative: DEFAULT_MIN_DERIVATIVE,
        }
    }
}

impl NewtonConfig {
    /// Default settings with a different tolerance.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    fn validate(&self) -> FitResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(FitError::InvalidParameters(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        if !(self.min_derivative.is_finite() && self.min_derivative >= 0.0) {
            return Err(FitError::InvalidParameters(format!(
                "min_derivative must be finite and non-negative, got {}",
                self.min_derivative
            )));
        }
        Ok(())
    }
}

/// A converged quantile and how many Newton steps it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolution {
    pub value: f64,
    pub iterations: usize,
}

/// The `q`-quantile of `dist`, found by Newton iteration from its mean.
///
/// Uses the default iteration cap and density floor; see
/// [`quantile_with`] to change them.
///
/// # Errors
/// - `InvalidProbability` if `q ∉ (0, 1)`.
/// - `InvalidParameters` if `tolerance` is not finite and positive.
/// - `DerivativeVanished` if the density is zero or non-finite at an iterate.
/// - `NoConvergence` if the cap is reached or an iterate is not finite.
///
/// # Examples
/// ```
/// use u_numfit::distributions::Normal;
/// use u_numfit::quantile::{quantile, DEFAULT_TOLERANCE};
///
/// let z = quantile(&Normal::standard(), 0.975, DEFAULT_TOLERANCE).unwrap();
/// assert!((z - 1.959964).abs() < 1e-4);
/// ```
pub fn quantile<D: Distribution + ?Sized>(dist: &D, q: f64, tolerance: f64) -> FitResult<f64> {
    quantile_with(dist, q, &NewtonConfig::with_tolerance(tolerance)).map(|s| s.value)
}

/// [`quantile`] with explicit [`NewtonConfig`], also reporting the step count.
pub fn quantile_with<D: Distribution + ?Sized>(
    dist: &D,
    q: f64,
    config: &NewtonConfig,
) -> FitResult<NewtonSolution> {
    if !(q > 0.0 && q < 1.0) {
        return Err(FitError::InvalidProbability(q));
    }
    config.validate()?;

    let mut theta = dist.mean();
    if !theta.is_finite() {
        debug!(theta, "non-finite starting point");
        return Err(FitError::NoConvergence {
            iterations: 0,
            last: theta,
        });
    }

    for iteration in 0..config.max_iterations {
        let density = dist.pdf(theta);
        if !density.is_finite() || density.abs() < config.min_derivative {
            debug!(theta, density, iteration, "density vanished");
            return Err(FitError::DerivativeVanished { theta, iteration });
        }

        let next = theta - (dist.cdf(theta) - q) / density;
        trace!(iteration, theta, next, "newton step");

        if !next.is_finite() {
            debug!(theta, iteration, "iterate left the reals");
            return Err(FitError::NoConvergence {
                iterations: iteration + 1,
                last: next,
            });
        }
        if (next - theta).abs() <= config.tolerance {
            debug!(q, value = next, iterations = iteration + 1, "quantile converged");
            return Ok(NewtonSolution {
                value: next,
                iterations: iteration + 1,
            });
        }
        theta = next;
    }

    debug!(q, last = theta, cap = config.max_iterations, "iteration cap reached");
    Err(FitError::NoConvergence {
        iterations: config.max_iterations,
        last: theta,
    })
}

//! Probability distributions.
//!
//! Every family implements [`Distribution`], the capability set that
//! [`crate::quantile`] needs: a mean to start from, a CDF to invert, and a
//! PDF to differentiate with. Parameters are plain `f64` values validated
//! at construction; evaluation never fails and never panics.
//!
//! # Supported Distributions
//!
//! | Distribution | Parameters | Mean |
//! |---|---|---|
//! | [`Normal`] | μ, σ | μ |
//! | [`LogNormal`] | μ, σ | exp(μ+σ²/2) |
//! | [`Uniform`] | min, max | (a+b)/2 |
//! | [`Exponential`] | λ | 1/λ |
//! | [`Gamma`] | k (shape), θ (scale) | kθ |
//! | [`Beta`] | α, β | α/(α+β) |

use crate::error::{FitError, FitResult};
use crate::special;

/// A continuous univariate distribution exposing mean, CDF and PDF.
///
/// Implementations must be pure: the same query point always gives the
/// same value. Outside the support, `pdf` returns `0.0` and `cdf` returns
/// `0.0` or `1.0`.
pub trait Distribution {
    /// Expected value.
    fn mean(&self) -> f64;

    /// Cumulative distribution function F(x) = P(X ≤ x).
    fn cdf(&self, x: f64) -> f64;

    /// Probability density function f(x) = F'(x).
    fn pdf(&self, x: f64) -> f64;
}

impl<D: Distribution + ?Sized> Distribution for &D {
    fn mean(&self) -> f64 {
        (**self).mean()
    }

    fn cdf(&self, x: f64) -> f64 {
        (**self).cdf(x)
    }

    fn pdf(&self, x: f64) -> f64 {
        (**self).pdf(x)
    }
}

impl<D: Distribution + ?Sized> Distribution for Box<D> {
    fn mean(&self) -> f64 {
        (**self).mean()
    }

    fn cdf(&self, x: f64) -> f64 {
        (**self).cdf(x)
    }

    fn pdf(&self, x: f64) -> f64 {
        (**self).pdf(x)
    }
}

fn ensure_finite(name: &str, params: &[f64]) -> FitResult<()> {
    if params.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(FitError::InvalidParameters(format!(
            "{name} parameters must be finite, got {params:?}"
        )))
    }
}

fn ensure_positive(name: &str, label: &str, value: f64) -> FitResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(FitError::InvalidParameters(format!(
            "{name} requires {label} > 0, got {value}"
        )))
    }
}

// ============================================================================
// Normal Distribution
// ============================================================================

/// Normal (Gaussian) distribution N(μ, σ²).
///
/// # Mathematical Definition
/// - PDF: φ((x−μ)/σ) / σ
/// - CDF: Φ((x−μ)/σ)
/// - Mean: μ
///
/// # Examples
/// ```
/// use u_numfit::distributions::{Distribution, Normal};
/// let n = Normal::new(0.0, 1.0).unwrap();
/// assert!((n.cdf(0.0) - 0.5).abs() < 1e-7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mu: f64,
    sigma: f64,
}

impl Normal {
    /// Creates N(μ, σ²).
    ///
    /// # Errors
    /// `InvalidParameters` if `sigma ≤ 0` or either parameter is not finite.
    pub fn new(mu: f64, sigma: f64) -> FitResult<Self> {
        ensure_finite("Normal", &[mu, sigma])?;
        ensure_positive("Normal", "σ", sigma)?;
        Ok(Self { mu, sigma })
    }

    /// The standard normal N(0, 1).
    pub fn standard() -> Self {
        Self { mu: 0.0, sigma: 1.0 }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }
}

impl Distribution for Normal {
    fn mean(&self) -> f64 {
        self.mu
    }

    fn cdf(&self, x: f64) -> f64 {
        special::standard_normal_cdf((x - self.mu) / self.sigma)
    }

    fn pdf(&self, x: f64) -> f64 {
        special::standard_normal_pdf((x - self.mu) / self.sigma) / self.sigma
    }
}

// ============================================================================
// LogNormal Distribution
// ============================================================================

/// Log-normal distribution: ln(X) ~ N(μ, σ²).
///
/// - Mean: exp(μ + σ²/2)
/// - Median: exp(μ)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormal {
    mu: f64,
    sigma: f64,
}

impl LogNormal {
    /// Creates a log-normal whose logarithm has mean `mu` and std dev `sigma`.
    ///
    /// # Errors
    /// `InvalidParameters` if `sigma ≤ 0` or either parameter is not finite.
    pub fn new(mu: f64, sigma: f64) -> FitResult<Self> {
        ensure_finite("LogNormal", &[mu, sigma])?;
        ensure_positive("LogNormal", "σ", sigma)?;
        Ok(Self { mu, sigma })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn median(&self) -> f64 {
        self.mu.exp()
    }
}

impl Distribution for LogNormal {
    fn mean(&self) -> f64 {
        (self.mu + 0.5 * self.sigma * self.sigma).exp()
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        special::standard_normal_cdf((x.ln() - self.mu) / self.sigma)
    }

    fn pdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        let z = (x.ln() - self.mu) / self.sigma;
        special::standard_normal_pdf(z) / (x * self.sigma)
    }
}

// ============================================================================
// Uniform Distribution
// ============================================================================

/// Continuous uniform distribution on `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    min: f64,
    max: f64,
}

impl Uniform {
    /// Creates U(min, max).
    ///
    /// # Errors
    /// `InvalidParameters` if `min >= max` or either bound is not finite.
    pub fn new(min: f64, max: f64) -> FitResult<Self> {
        ensure_finite("Uniform", &[min, max])?;
        if min >= max {
            return Err(FitError::InvalidParameters(format!(
                "Uniform requires min < max, got min={min}, max={max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Distribution for Uniform {
    fn mean(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    fn cdf(&self, x: f64) -> f64 {
        ((x - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    fn pdf(&self, x: f64) -> f64 {
        if (self.min..=self.max).contains(&x) {
            1.0 / (self.max - self.min)
        } else {
            0.0
        }
    }
}

// ============================================================================
// Exponential Distribution
// ============================================================================

/// Exponential distribution with rate λ.
///
/// Closed-form quantile: −ln(1−p)/λ, which makes it a handy reference
/// for the Newton solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    /// # Errors
    /// `InvalidParameters` if `rate ≤ 0` or not finite.
    pub fn new(rate: f64) -> FitResult<Self> {
        ensure_finite("Exponential", &[rate])?;
        ensure_positive("Exponential", "λ", rate)?;
        Ok(Self { rate })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Distribution for Exponential {
    fn mean(&self) -> f64 {
        1.0 / self.rate
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else {
            -(-self.rate * x).exp_m1()
        }
    }

    fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            self.rate * (-self.rate * x).exp()
        }
    }
}

// ============================================================================
// Gamma Distribution
// ============================================================================

/// Gamma distribution with shape k and scale θ.
///
/// # Mathematical Definition
/// - PDF: x^{k−1} e^{−x/θ} / (Γ(k) θ^k) for x > 0
/// - CDF: P(k, x/θ) (regularized lower incomplete gamma)
/// - Mean: kθ
///
/// # Examples
/// ```
/// use u_numfit::distributions::{Distribution, Gamma};
/// let g = Gamma::new(2.0, 3.0).unwrap();
/// assert!((g.mean() - 6.0).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gamma {
    shape: f64,
    scale: f64,
    // ln Γ(k) + k ln θ, cached since every pdf call needs it
    ln_norm: f64,
}

impl Gamma {
    /// # Errors
    /// `InvalidParameters` if `shape ≤ 0`, `scale ≤ 0`, or either is not finite.
    pub fn new(shape: f64, scale: f64) -> FitResult<Self> {
        ensure_finite("Gamma", &[shape, scale])?;
        ensure_positive("Gamma", "shape", shape)?;
        ensure_positive("Gamma", "scale", scale)?;
        Ok(Self {
            shape,
            scale,
            ln_norm: special::ln_gamma(shape) + shape * scale.ln(),
        })
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn variance(&self) -> f64 {
        self.shape * self.scale * self.scale
    }
}

impl Distribution for Gamma {
    fn mean(&self) -> f64 {
        self.shape * self.scale
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        special::regularized_lower_gamma(self.shape, x / self.scale)
    }

    fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            return 0.0;
        }
        if x == 0.0 {
            return match self.shape {
                k if k < 1.0 => f64::INFINITY,
                k if k == 1.0 => 1.0 / self.scale,
                _ => 0.0,
            };
        }
        ((self.shape - 1.0) * x.ln() - x / self.scale - self.ln_norm).exp()
    }
}

// ============================================================================
// Beta Distribution
// ============================================================================

/// Beta distribution on `[0, 1]` with shape parameters α and β.
///
/// - PDF: x^{α−1} (1−x)^{β−1} / B(α, β)
/// - CDF: I_x(α, β)
/// - Mean: α/(α+β)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beta {
    alpha: f64,
    beta: f64,
    ln_b: f64,
}

impl Beta {
    /// # Errors
    /// `InvalidParameters` if either shape is `≤ 0` or not finite.
    pub fn new(alpha: f64, beta: f64) -> FitResult<Self> {
        ensure_finite("Beta", &[alpha, beta])?;
        ensure_positive("Beta", "α", alpha)?;
        ensure_positive("Beta", "β", beta)?;
        Ok(Self {
            alpha,
            beta,
            ln_b: special::ln_beta(alpha, beta),
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn variance(&self) -> f64 {
        let ab = self.alpha + self.beta;
        self.alpha * self.beta / (ab * ab * (ab + 1.0))
    }
}

impl Distribution for Beta {
    fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    fn cdf(&self, x: f64) -> f64 {
        special::regularized_incomplete_beta(x.clamp(0.0, 1.0), self.alpha, self.beta)
    }

    fn pdf(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return 0.0;
        }
        if x == 0.0 || x == 1.0 {
            // Edge densities: infinite, constant or zero depending on the shape.
            let shape = if x == 0.0 { self.alpha } else { self.beta };
            return match shape {
                s if s < 1.0 => f64::INFINITY,
                s if s == 1.0 => (-self.ln_b).exp(),
                _ => 0.0,
            };
        }
        ((self.alpha - 1.0) * x.ln() + (self.beta - 1.0) * (1.0 - x).ln() - self.ln_b).exp()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Central-difference derivative of the CDF.
    fn numeric_pdf<D: Distribution>(d: &D, x: f64) -> f64 {
        let h = 1e-5;
        (d.cdf(x + h) - d.cdf(x - h)) / (2.0 * h)
    }

    // --- Normal ---

    #[test]
    fn test_normal_standard() {
        let n = Normal::standard();
        assert_eq!(n.mean(), 0.0);
        assert!((n.cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((n.pdf(0.0) - 0.398_942_280_401_432_7).abs() < 1e-15);
    }

    #[test]
    fn test_normal_shifted() {
        let n = Normal::new(10.0, 2.0).unwrap();
        assert_eq!(n.mean(), 10.0);
        assert_eq!(n.variance(), 4.0);
        assert!((n.cdf(10.0) - 0.5).abs() < 1e-7);
        assert!((n.pdf(12.0) - n.pdf(8.0)).abs() < 1e-15);
    }

    #[test]
    fn test_normal_invalid() {
        assert!(Normal::new(0.0, 0.0).is_err());
        assert!(Normal::new(0.0, -1.0).is_err());
        assert!(Normal::new(f64::NAN, 1.0).is_err());
    }

    // --- LogNormal ---

    #[test]
    fn test_lognormal_mean_and_median() {
        let ln = LogNormal::new(0.0, 1.0).unwrap();
        assert!((ln.mean() - 0.5_f64.exp()).abs() < 1e-12);
        assert!((ln.cdf(ln.median()) - 0.5).abs() < 1e-7);
        assert_eq!(ln.cdf(-1.0), 0.0);
        assert_eq!(ln.pdf(0.0), 0.0);
    }

    // --- Uniform ---

    #[test]
    fn test_uniform() {
        let u = Uniform::new(2.0, 6.0).unwrap();
        assert_eq!(u.mean(), 4.0);
        assert_eq!(u.cdf(1.0), 0.0);
        assert_eq!(u.cdf(4.0), 0.5);
        assert_eq!(u.cdf(7.0), 1.0);
        assert_eq!(u.pdf(3.0), 0.25);
        assert_eq!(u.pdf(6.5), 0.0);
        assert!(Uniform::new(3.0, 3.0).is_err());
    }

    // --- Exponential ---

    #[test]
    fn test_exponential() {
        let e = Exponential::new(2.0).unwrap();
        assert_eq!(e.mean(), 0.5);
        assert!((e.cdf(1.0) - (1.0 - (-2.0_f64).exp())).abs() < 1e-15);
        assert_eq!(e.pdf(-0.1), 0.0);
        assert_eq!(e.pdf(0.0), 2.0);
        assert!(Exponential::new(0.0).is_err());
    }

    // --- Gamma ---

    #[test]
    fn test_gamma_shape_one_is_exponential() {
        let g = Gamma::new(1.0, 2.0).unwrap();
        let e = Exponential::new(0.5).unwrap();
        for &x in &[0.0, 0.3, 1.0, 4.0, 10.0] {
            assert!((g.cdf(x) - e.cdf(x)).abs() < 1e-10, "cdf at {x}");
            assert!((g.pdf(x) - e.pdf(x)).abs() < 1e-10, "pdf at {x}");
        }
    }

    #[test]
    fn test_gamma_moments() {
        let g = Gamma::new(3.0, 2.0).unwrap();
        assert_eq!(g.mean(), 6.0);
        assert_eq!(g.variance(), 12.0);
        assert_eq!(g.pdf(0.0), 0.0);
        assert_eq!(g.cdf(-1.0), 0.0);
    }

    #[test]
    fn test_gamma_pdf_matches_cdf_slope() {
        let g = Gamma::new(3.0, 2.0).unwrap();
        for &x in &[1.0, 4.0, 6.0, 12.0] {
            let diff = (g.pdf(x) - numeric_pdf(&g, x)).abs();
            assert!(diff < 1e-6, "pdf vs numeric derivative at {x}: {diff}");
        }
    }

    #[test]
    fn test_gamma_invalid() {
        assert!(Gamma::new(0.0, 1.0).is_err());
        assert!(Gamma::new(1.0, -1.0).is_err());
        assert!(Gamma::new(f64::INFINITY, 1.0).is_err());
    }

    // --- Beta ---

    #[test]
    fn test_beta_uniform_case() {
        let b = Beta::new(1.0, 1.0).unwrap();
        assert_eq!(b.mean(), 0.5);
        for &x in &[0.0, 0.25, 0.5, 1.0] {
            assert!((b.pdf(x) - 1.0).abs() < 1e-10, "pdf at {x}");
            assert!((b.cdf(x) - x).abs() < 1e-10, "cdf at {x}");
        }
    }

    #[test]
    fn test_beta_pdf_matches_cdf_slope() {
        let b = Beta::new(2.0, 5.0).unwrap();
        for &x in &[0.1, 0.3, 0.6, 0.9] {
            let diff = (b.pdf(x) - numeric_pdf(&b, x)).abs();
            assert!(diff < 1e-5, "pdf vs numeric derivative at {x}: {diff}");
        }
        assert_eq!(b.pdf(-0.5), 0.0);
        assert_eq!(b.cdf(1.5), 1.0);
    }

    #[test]
    fn test_beta_variance() {
        let b = Beta::new(2.0, 2.0).unwrap();
        // αβ / ((α+β)²(α+β+1)) = 4 / (16·5)
        assert!((b.variance() - 0.05).abs() < 1e-15);
        assert!(Beta::new(-1.0, 2.0).is_err());
    }

    #[test]
    fn test_trait_objects() {
        let boxed: Vec<Box<dyn Distribution>> = vec![
            Box::new(Normal::standard()),
            Box::new(Uniform::new(-1.0, 1.0).unwrap()),
        ];
        for d in &boxed {
            assert!((d.mean()).abs() < 1e-15);
            assert!((d.cdf(0.0) - 0.5).abs() < 1e-7);
        }
    }
}

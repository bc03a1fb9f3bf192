//! Special mathematical functions.
//!
//! Numerical approximations backing the CDF and PDF evaluations in
//! [`crate::distributions`]. Everything here is a pure function of its
//! arguments and returns `NaN` (never panics) outside its domain.

/// 1/√(2π)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Continued-fraction iteration cap shared by the incomplete beta and gamma.
const CF_MAX_ITER: usize = 200;
/// Relative convergence threshold for the series and continued fractions.
const CF_EPS: f64 = 1e-14;
/// Floor used by the modified Lentz method to avoid division by zero.
const CF_TINY: f64 = 1e-30;

/// Standard normal CDF Φ(x) = P(Z ≤ x) for Z ~ N(0,1).
///
/// # Algorithm
/// Φ(x) = ½·Q(½, x²/2) for x < 0 and 1 − ½·Q(½, x²/2) otherwise, where Q
/// is [`regularized_upper_gamma`]. Both branches meet at exactly ½, so Φ
/// is continuous and monotone through the origin, and the lower tail keeps
/// full relative precision.
///
/// # Accuracy
/// Absolute error near machine epsilon.
///
/// # Examples
/// ```
/// use u_numfit::special::standard_normal_cdf;
/// assert_eq!(standard_normal_cdf(0.0), 0.5);
/// assert!((standard_normal_cdf(1.959964) - 0.975).abs() < 1e-6);
/// ```
pub fn standard_normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x.is_infinite() {
        return if x > 0.0 { 1.0 } else { 0.0 };
    }

    let tail = 0.5 * regularized_upper_gamma(0.5, 0.5 * x * x);
    if x < 0.0 {
        tail
    } else {
        1.0 - tail
    }
}

/// Standard normal PDF φ(x) = (1/√(2π)) exp(−x²/2).
///
/// # Examples
/// ```
/// use u_numfit::special::standard_normal_pdf;
/// assert!((standard_normal_pdf(0.0) - 0.3989422804014327).abs() < 1e-15);
/// ```
pub fn standard_normal_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// ln Γ(x) by the Lanczos approximation (g = 7, nine coefficients).
///
/// Arguments below 0.5 go through the reflection formula
/// Γ(x)·Γ(1−x) = π / sin(πx).
///
/// Reference: Lanczos (1964), *SIAM J. Numer. Anal.* 1(1).
///
/// # Accuracy
/// Relative error < 2 × 10⁻¹⁰ for x > 0.
///
/// # Examples
/// ```
/// use u_numfit::special::ln_gamma;
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const LANCZOS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;
    use std::f64::consts::PI;

    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let series = LANCZOS[1..]
        .iter()
        .enumerate()
        .fold(LANCZOS[0], |acc, (i, &c)| acc + c / (z + i as f64 + 1.0));
    let t = z + G + 0.5;
    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + series.ln()
}

/// ln B(a, b) = ln Γ(a) + ln Γ(b) − ln Γ(a+b).
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Regularized incomplete beta function I_x(a, b).
///
/// Clamps to 0 and 1 outside the open unit interval. Inside, evaluates
/// the continued fraction directly or through the symmetry
/// I_x(a,b) = 1 − I_{1−x}(b,a), whichever converges faster.
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.4.
///
/// # Examples
/// ```
/// use u_numfit::special::regularized_incomplete_beta;
/// assert_eq!(regularized_incomplete_beta(0.0, 2.0, 3.0), 0.0);
/// assert!((regularized_incomplete_beta(0.5, 1.0, 1.0) - 0.5).abs() < 1e-10);
/// ```
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x.is_nan() || a <= 0.0 || b <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
    }

    let ln_front = a * x.ln() + b * (1.0 - x).ln() - ln_beta(a, b);
    ln_front.exp() * beta_continued_fraction(x, a, b) / a
}

/// Modified Lentz evaluation of the incomplete-beta continued fraction.
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    let clamp = |v: f64| if v.abs() < CF_TINY { CF_TINY } else { v };

    let mut c = 1.0;
    let mut d = 1.0 / clamp(1.0 - (a + b) * x / (a + 1.0));
    let mut h = d;

    for m in 1..=CF_MAX_ITER {
        let m = m as f64;
        let two_m = 2.0 * m;

        let even = m * (b - m) * x / ((a + two_m - 1.0) * (a + two_m));
        d = 1.0 / clamp(1.0 + even * d);
        c = clamp(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (a + b + m) * x / ((a + two_m) * (a + two_m + 1.0));
        d = 1.0 / clamp(1.0 + odd * d);
        c = clamp(1.0 + odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < CF_EPS {
            break;
        }
    }
    h
}

/// Regularized lower incomplete gamma function P(a, x) = γ(a, x) / Γ(a).
///
/// Uses the power series for `x < a + 1` and the continued fraction for
/// the upper tail otherwise.
///
/// # Examples
/// ```
/// use u_numfit::special::regularized_lower_gamma;
/// // P(1, x) = 1 − e^{−x}
/// let p = regularized_lower_gamma(1.0, 2.0);
/// assert!((p - (1.0 - (-2.0_f64).exp())).abs() < 1e-10);
/// ```
pub fn regularized_lower_gamma(a: f64, x: f64) -> f64 {
    if x.is_nan() || a <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    if x < a + 1.0 {
        lower_gamma_series(a, x)
    } else {
        1.0 - upper_gamma_continued_fraction(a, x)
    }
}

/// Regularized upper incomplete gamma function Q(a, x) = 1 − P(a, x).
///
/// Evaluated directly by continued fraction for `x ≥ a + 1`, so small
/// upper tails do not cancel against 1.
///
/// # Examples
/// ```
/// use u_numfit::special::regularized_upper_gamma;
/// // Q(1, x) = e^{−x}
/// let q = regularized_upper_gamma(1.0, 30.0);
/// assert!((q / (-30.0_f64).exp() - 1.0).abs() < 1e-12);
/// ```
pub fn regularized_upper_gamma(a: f64, x: f64) -> f64 {
    if x.is_nan() || a <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    if x < a + 1.0 {
        1.0 - lower_gamma_series(a, x)
    } else {
        upper_gamma_continued_fraction(a, x)
    }
}

fn lower_gamma_series(a: f64, x: f64) -> f64 {
    let mut denom = a;
    let mut term = 1.0 / a;
    let mut sum = term;
    for _ in 0..CF_MAX_ITER {
        denom += 1.0;
        term *= x / denom;
        sum += term;
        if term.abs() < sum.abs() * CF_EPS {
            break;
        }
    }
    sum * (a * x.ln() - x - ln_gamma(a)).exp()
}

/// Q(a, x) = 1 − P(a, x) by modified Lentz.
fn upper_gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let clamp = |v: f64| if v.abs() < CF_TINY { CF_TINY } else { v };

    let mut b = x + 1.0 - a;
    let mut c = 1.0 / CF_TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=CF_MAX_ITER {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = 1.0 / clamp(an * d + b);
        c = clamp(b + an / c);
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < CF_EPS {
            break;
        }
    }
    h * (a * x.ln() - x - ln_gamma(a)).exp()
}

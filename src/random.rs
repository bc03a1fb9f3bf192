//! Seeded random data for regression experiments.
//!
//! Provides seeded RNG construction, standard-normal sampling, and
//! synthetic responses `y = Xβ + ε` for checking fits against known
//! coefficients.
//!
//! # Reproducibility
//!
//! For reproducible experiments, use [`create_rng`] with a fixed seed.
//! The underlying algorithm (SmallRng) is deterministic for a given seed
//! on the same platform.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::error::{FitError, FitResult};
use crate::formula::DesignMatrix;

/// Creates a fast, seeded random number generator.
///
/// # Examples
/// ```
/// use u_numfit::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!((0.0..1.0).contains(&x));
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// One draw from N(0, 1).
pub fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// `n` independent N(0, 1) draws.
pub fn standard_normal_vec<R: Rng>(n: usize, rng: &mut R) -> Vec<f64> {
    (0..n).map(|_| standard_normal(rng)).collect()
}

/// An `rows × cols` matrix of independent N(0, 1) draws, filled
/// column by column.
pub fn standard_normal_matrix<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> DMatrix<f64> {
    DMatrix::from_vec(rows, cols, standard_normal_vec(rows * cols, rng))
}

/// Synthetic response `y = Xβ + σε` with ε ~ N(0, I).
///
/// With `noise_sd == 0.0` the response is exactly `Xβ`.
///
/// # Errors
/// - `InvalidParameters` if `coefficients.len() != design.ncols()`, or if
///   `noise_sd` is negative or not finite.
///
/// # Examples
/// ```
/// use nalgebra::DMatrix;
/// use u_numfit::formula::DesignMatrix;
/// use u_numfit::random::{create_rng, simulate_response};
///
/// let x = DesignMatrix::from_matrix(DMatrix::from_element(3, 1, 1.0));
/// let mut rng = create_rng(1);
/// let y = simulate_response(&x, &[4.0], 0.0, &mut rng).unwrap();
/// assert_eq!(y.as_slice(), &[4.0, 4.0, 4.0]);
/// ```
pub fn simulate_response<R: Rng>(
    design: &DesignMatrix,
    coefficients: &[f64],
    noise_sd: f64,
    rng: &mut R,
) -> FitResult<DVector<f64>> {
    if coefficients.len() != design.ncols() {
        return Err(FitError::InvalidParameters(format!(
            "{} coefficients for a design with {} columns",
            coefficients.len(),
            design.ncols()
        )));
    }
    if !noise_sd.is_finite() {
        return Err(FitError::InvalidParameters(format!(
            "noise standard deviation must be finite, got {noise_sd}"
        )));
    }
    let noise = Normal::new(0.0, noise_sd).map_err(|e| {
        FitError::InvalidParameters(format!("noise standard deviation {noise_sd}: {e}"))
    })?;

    let beta = DVector::from_column_slice(coefficients);
    let mut y = design.matrix() * beta;
    if noise_sd > 0.0 {
        for v in y.iter_mut() {
            *v += noise.sample(rng);
        }
    }
    Ok(y)
}

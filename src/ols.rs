//! Ordinary least squares.
//!
//! Solves `min ‖y − Xβ‖²` for a full-column-rank design `X` through a thin
//! Householder QR factorization, `X = QR`, followed by back-substitution
//! on `Rβ = Qᵀy`. The normal equations `XᵀX` are never formed, so the
//! sensitivity to conditioning stays at κ(X) rather than κ(X)².
//!
//! # Rank Detection
//!
//! After factorization, `|R_jj|` is the distance of column `j` from the
//! span of the columns before it. Column `j` counts as dependent when
//! `|R_jj| ≤ rank_tolerance · ‖x_j‖`. A zero column is always dependent.
//!
//! Each column is divided by its largest magnitude before factorizing, so
//! the norms stay in `[1, √n]` whatever the scale of the data. The test is
//! invariant under column scaling, and `β` is rescaled after the solve.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{FitError, FitResult};
use crate::formula::DesignMatrix;
use crate::stats;

/// Default relative tolerance for [`SolverConfig::rank_tolerance`].
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-10;

/// Settings for [`solve_with`] and [`fit_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Relative threshold below which a QR diagonal entry marks the design
    /// as rank-deficient.
    pub rank_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

/// Least-squares coefficients for `response` on `design`.
///
/// # Errors
/// - `ShapeMismatch` if `response.len() != design.nrows()`.
/// - `SingularSystem` if the design has no columns, fewer rows than
///   columns, or is rank-deficient.
/// - `NonFinite` if either input holds NaN or ±∞.
///
/// # Examples
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use u_numfit::formula::DesignMatrix;
/// use u_numfit::ols::solve;
///
/// // y = 2 + 3x on x = 0, 1, 2
/// let x = DesignMatrix::from_matrix(DMatrix::from_row_slice(3, 2, &[
///     1.0, 0.0,
///     1.0, 1.0,
///     1.0, 2.0,
/// ]));
/// let y = DVector::from_vec(vec![2.0, 5.0, 8.0]);
/// let beta = solve(&y, &x).unwrap();
/// assert!((beta[0] - 2.0).abs() < 1e-12);
/// assert!((beta[1] - 3.0).abs() < 1e-12);
/// ```
pub fn solve(response: &DVector<f64>, design: &DesignMatrix) -> FitResult<DVector<f64>> {
    solve_with(response, design, &SolverConfig::default())
}

/// [`solve`] with an explicit [`SolverConfig`].
pub fn solve_with(
    response: &DVector<f64>,
    design: &DesignMatrix,
    config: &SolverConfig,
) -> FitResult<DVector<f64>> {
    solve_matrix(response, design.matrix(), config)
}

fn solve_matrix(
    response: &DVector<f64>,
    x: &DMatrix<f64>,
    config: &SolverConfig,
) -> FitResult<DVector<f64>> {
    let (n, k) = x.shape();
    if response.len() != n {
        return Err(FitError::ShapeMismatch {
            expected: n,
            found: response.len(),
        });
    }
    if k == 0 {
        return Err(FitError::SingularSystem("design has no columns".into()));
    }
    if n < k {
        return Err(FitError::SingularSystem(format!(
            "{n} rows cannot determine {k} coefficients"
        )));
    }
    if !response.iter().all(|v| v.is_finite()) {
        return Err(FitError::NonFinite("response"));
    }
    if !x.iter().all(|v| v.is_finite()) {
        return Err(FitError::NonFinite("design"));
    }
    if !(config.rank_tolerance.is_finite() && config.rank_tolerance >= 0.0) {
        return Err(FitError::InvalidParameters(format!(
            "rank tolerance must be finite and non-negative, got {}",
            config.rank_tolerance
        )));
    }

    debug!(rows = n, cols = k, "solving least squares by QR");

    let scales: Vec<f64> = x.column_iter().map(|c| c.amax()).collect();
    if let Some(j) = scales.iter().position(|&s| s == 0.0) {
        debug!(column = j, "design has a zero column");
        return Err(dependent_column(j));
    }

    let mut scaled = x.clone();
    for (mut column, &s) in scaled.column_iter_mut().zip(&scales) {
        column /= s;
    }

    let column_norms: Vec<f64> = scaled.column_iter().map(|c| c.norm()).collect();
    let qr = scaled.qr();
    let r = qr.r();

    for (j, &norm) in column_norms.iter().enumerate() {
        let r_jj = r[(j, j)].abs();
        if r_jj <= config.rank_tolerance * norm {
            debug!(column = j, r_jj, norm, "design is rank-deficient");
            return Err(dependent_column(j));
        }
    }

    let qty = qr.q().transpose() * response;
    let mut beta = r
        .solve_upper_triangular(&qty)
        .ok_or_else(|| FitError::SingularSystem("triangular factor is singular".into()))?;
    for (b, &s) in beta.iter_mut().zip(&scales) {
        *b /= s;
    }
    Ok(beta)
}

fn dependent_column(j: usize) -> FitError {
    FitError::SingularSystem(format!(
        "column {} is linearly dependent on earlier columns",
        j + 1
    ))
}

/// A solved least-squares problem with its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    coefficients: DVector<f64>,
    labels: Vec<String>,
    fitted: DVector<f64>,
    residuals: DVector<f64>,
    rss: f64,
    r_squared: Option<f64>,
}

impl LinearFit {
    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    /// Column labels of the design, aligned with [`Self::coefficients`].
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Coefficient for the column labelled `label`, if any.
    pub fn coefficient(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|j| self.coefficients[j])
    }

    /// X β̂
    pub fn fitted(&self) -> &DVector<f64> {
        &self.fitted
    }

    /// y − X β̂
    pub fn residuals(&self) -> &DVector<f64> {
        &self.residuals
    }

    /// Residual sum of squares.
    pub fn rss(&self) -> f64 {
        self.rss
    }

    /// Coefficient of determination 1 − RSS/TSS.
    ///
    /// `None` when the response has zero total variance.
    pub fn r_squared(&self) -> Option<f64> {
        self.r_squared
    }

    /// Predictions `X_new β̂` for new rows laid out like the design.
    ///
    /// # Errors
    /// `InvalidParameters` if `x_new` has the wrong number of columns.
    pub fn predict(&self, x_new: &DMatrix<f64>) -> FitResult<DVector<f64>> {
        if x_new.ncols() != self.coefficients.len() {
            return Err(FitError::InvalidParameters(format!(
                "expected {} columns, found {}",
                self.coefficients.len(),
                x_new.ncols()
            )));
        }
        Ok(x_new * &self.coefficients)
    }
}

/// Solves and collects fitted values, residuals, RSS and R².
///
/// # Errors
/// Same as [`solve`].
pub fn fit(response: &DVector<f64>, design: &DesignMatrix) -> FitResult<LinearFit> {
    fit_with(response, design, &SolverConfig::default())
}

/// [`fit`] with an explicit [`SolverConfig`].
pub fn fit_with(
    response: &DVector<f64>,
    design: &DesignMatrix,
    config: &SolverConfig,
) -> FitResult<LinearFit> {
    let coefficients = solve_with(response, design, config)?;
    let fitted = design.matrix() * &coefficients;
    let residuals = response - &fitted;
    let rss = stats::kahan_sum_iter(residuals.iter().map(|e| e * e));
    let r_squared = stats::centered_sum_of_squares(response.as_slice())
        .filter(|&tss| tss > 0.0)
        .map(|tss| 1.0 - rss / tss);

    Ok(LinearFit {
        coefficients,
        labels: design.labels().to_vec(),
        fitted,
        residuals,
        rss,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{build, TermRef};
    use crate::random;

    fn design(rows: usize, cols: usize, data: &[f64]) -> DesignMatrix {
        DesignMatrix::from_matrix(DMatrix::from_row_slice(rows, cols, data))
    }

    #[test]
    fn test_intercept_only_constant_response() {
        for &c in &[0.0, 1.0, -3.25, 1e6] {
            let source = DMatrix::<f64>::zeros(7, 1);
            let (y, x) = build(&[c; 7], &[TermRef::Intercept], &source).unwrap();
            let beta = solve(&y, &x).unwrap();
            assert_eq!(beta.len(), 1);
            assert!(
                (beta[0] - c).abs() <= 1e-12 * c.abs().max(1.0),
                "intercept {} != {c}",
                beta[0]
            );
        }
    }

    #[test]
    fn test_exact_line() {
        let x = design(4, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0]);
        let y = DVector::from_vec(vec![3.0, 5.0, 7.0, 9.0]);
        let beta = solve(&y, &x).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-12);
        assert!((beta[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_overdetermined_residuals_orthogonal() {
        let x = design(5, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0]);
        let y = DVector::from_vec(vec![1.0, 3.0, 2.0, 5.0, 4.0]);
        let f = fit(&y, &x).unwrap();
        // Xᵀe = 0 at the least-squares optimum
        let xte = x.matrix().transpose() * f.residuals();
        assert!(xte.norm() < 1e-10, "Xᵀe = {xte}");
        // Slope of the textbook fit: Sxy / Sxx = 8 / 10
        assert!((f.coefficients()[1] - 0.8).abs() < 1e-12);
        assert!((f.coefficients()[0] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_design_is_singular() {
        let source = DMatrix::<f64>::zeros(3, 2);
        let (y, x) = build(&[1.0, 2.0, 3.0], &[], &source).unwrap();
        assert!(matches!(solve(&y, &x), Err(FitError::SingularSystem(_))));
    }

    #[test]
    fn test_underdetermined_is_singular() {
        let x = design(1, 2, &[1.0, 2.0]);
        let y = DVector::from_vec(vec![1.0]);
        assert!(matches!(solve(&y, &x), Err(FitError::SingularSystem(_))));
    }

    #[test]
    fn test_duplicate_column_is_singular() {
        let source = DMatrix::from_row_slice(4, 1, &[1.0, 2.0, 4.0, 8.0]);
        let terms = [TermRef::Intercept, TermRef::Column(1), TermRef::Column(1)];
        let (y, x) = build(&[1.0, 2.0, 3.0, 4.0], &terms, &source).unwrap();
        let err = solve(&y, &x).unwrap_err();
        assert!(matches!(err, FitError::SingularSystem(_)), "{err:?}");
    }

    #[test]
    fn test_scaled_column_is_singular() {
        let x = design(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(matches!(solve(&y, &x), Err(FitError::SingularSystem(_))));
    }

    #[test]
    fn test_zero_column_is_singular() {
        let x = design(3, 2, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(matches!(solve(&y, &x), Err(FitError::SingularSystem(_))));
    }

    #[test]
    fn test_full_rank_at_extreme_scales() {
        let rows = [1.0, 0.0, 2.0, 1.0, 3.0, 5.0];
        for &scale in &[1e160_f64, 1e-170] {
            let data: Vec<f64> = rows.iter().map(|v| v * scale).collect();
            let x = design(3, 2, &data);
            // y = X·[2, −1]
            let y = DVector::from_vec(vec![2.0 * scale, 3.0 * scale, 1.0 * scale]);
            let beta = solve(&y, &x).unwrap_or_else(|e| panic!("scale {scale}: {e}"));
            assert!((beta[0] - 2.0).abs() < 1e-10, "scale {scale}: β = {beta}");
            assert!((beta[1] + 1.0).abs() < 1e-10, "scale {scale}: β = {beta}");
        }
    }

    #[test]
    fn test_mixed_column_scales() {
        // intercept next to a regressor in the 1e200 range
        let x = design(4, 2, &[1.0, 1e200, 1.0, 2e200, 1.0, 3e200, 1.0, 4e200]);
        let y = DVector::from_vec(vec![7.0, 9.0, 11.0, 13.0]);
        let beta = solve(&y, &x).unwrap();
        assert!((beta[0] - 5.0).abs() < 1e-9, "β = {beta}");
        assert!((beta[1] / 2e-200 - 1.0).abs() < 1e-9, "β = {beta}");
    }

    #[test]
    fn test_dependent_columns_at_extreme_scale() {
        let x = design(3, 2, &[1e160, 2e160, 2e160, 4e160, 3e160, 6e160]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(matches!(solve(&y, &x), Err(FitError::SingularSystem(_))));
    }

    #[test]
    fn test_shape_mismatch() {
        let x = design(3, 1, &[1.0, 1.0, 1.0]);
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(
            solve(&y, &x),
            Err(FitError::ShapeMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let x = design(2, 1, &[1.0, f64::NAN]);
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(solve(&y, &x), Err(FitError::NonFinite("design")));

        let x = design(2, 1, &[1.0, 1.0]);
        let y = DVector::from_vec(vec![1.0, f64::INFINITY]);
        assert_eq!(solve(&y, &x), Err(FitError::NonFinite("response")));
    }

    #[test]
    fn test_invalid_rank_tolerance() {
        let x = design(2, 1, &[1.0, 1.0]);
        let y = DVector::from_vec(vec![1.0, 2.0]);
        let config = SolverConfig {
            rank_tolerance: -1.0,
        };
        assert!(matches!(
            solve_with(&y, &x, &config),
            Err(FitError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let mut rng = random::create_rng(7);
        let x = DesignMatrix::from_matrix(random::standard_normal_matrix(30, 4, &mut rng));
        let y = DVector::from_vec(random::standard_normal_vec(30, &mut rng));
        assert_eq!(solve(&y, &x).unwrap(), solve(&y, &x).unwrap());
    }

    #[test]
    fn test_fit_diagnostics() {
        let x = design(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0]);
        let f = fit(&y, &x).unwrap();
        assert!(f.rss() < 1e-20);
        assert!((f.r_squared().unwrap() - 1.0).abs() < 1e-12);
        assert!((f.fitted() - &y).norm() < 1e-12);
        assert_eq!(f.labels(), &["X1", "X2"]);
        assert!((f.coefficient("X2").unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(f.coefficient("X9"), None);

        let new_rows = DMatrix::from_row_slice(2, 2, &[1.0, 10.0, 1.0, -1.0]);
        let pred = f.predict(&new_rows).unwrap();
        assert!((pred[0] - 21.0).abs() < 1e-10);
        assert!((pred[1] + 1.0).abs() < 1e-10);
        assert!(f.predict(&DMatrix::zeros(1, 3)).is_err());
    }

    #[test]
    fn test_r_squared_undefined_for_constant_response() {
        let x = design(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_vec(vec![4.0, 4.0, 4.0]);
        let f = fit(&y, &x).unwrap();
        assert_eq!(f.r_squared(), None);
    }
}

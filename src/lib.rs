//! # u-numfit
//!
//! Formula-driven least squares and Newton quantiles.
//!
//! Three stateless routines, each a pure function of its inputs:
//!
//! - [`formula::build`] turns a response, a list of [`formula::TermRef`]s
//!   (intercept or 1-indexed source column) and a data matrix into a
//!   labelled [`formula::DesignMatrix`].
//! - [`ols::solve`] computes least-squares coefficients through a
//!   Householder QR factorization, refusing empty or rank-deficient designs.
//! - [`quantile::quantile`] inverts any [`distributions::Distribution`]'s
//!   CDF by capped Newton iteration from its mean.
//!
//! ## Modules
//!
//! - [`formula`]: terms, formulas (builder and `y ~ 1 + X1` text form), design matrices
//! - [`ols`]: least-squares solver and fit diagnostics
//! - [`quantile`]: Newton quantile search and its configuration
//! - [`distributions`]: Normal, LogNormal, Uniform, Exponential, Gamma, Beta
//! - [`special`]: normal CDF, ln Γ, incomplete beta and gamma functions
//! - [`stats`]: compensated sums backing the fit diagnostics
//! - [`random`]: seeded synthetic data for experiments
//! - [`error`]: the shared [`FitError`] type
//!
//! ## Example
//!
//! ```
//! use nalgebra::DMatrix;
//! use u_numfit::Formula;
//!
//! // y = 1 + 2·X1 − X2, exactly
//! let source = DMatrix::from_row_slice(5, 2, &[
//!     0.0, 1.0,
//!     1.0, 0.0,
//!     2.0, 3.0,
//!     3.0, 1.0,
//!     4.0, 2.0,
//! ]);
//! let y: Vec<f64> = source
//!     .row_iter()
//!     .map(|r| 1.0 + 2.0 * r[0] - r[1])
//!     .collect();
//!
//! let formula: Formula = "y ~ 1 + X1 + X2".parse().unwrap();
//! let fit = formula.fit(&y, &source).unwrap();
//! assert!((fit.coefficient("(Intercept)").unwrap() - 1.0).abs() < 1e-10);
//! assert!((fit.coefficient("X1").unwrap() - 2.0).abs() < 1e-10);
//! assert!((fit.coefficient("X2").unwrap() + 1.0).abs() < 1e-10);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Bounded termination**: every iterative routine carries an explicit cap
//! - **Typed failures**: errors are [`FitError`] variants, never panics or NaN results
//! - **Property-based testing**: invariants verified via proptest

pub mod distributions;
pub mod error;
pub mod formula;
pub mod ols;
pub mod quantile;
pub mod random;
pub mod special;
pub mod stats;

pub use distributions::Distribution;
pub use error::{FitError, FitResult};
pub use formula::{build, DesignMatrix, Formula, TermRef};
pub use ols::{solve, LinearFit, SolverConfig};
pub use quantile::{quantile, NewtonConfig, NewtonSolution};

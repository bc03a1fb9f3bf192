//! Error type shared by every routine in the crate.

use thiserror::Error;

/// Failure reported by design-matrix construction, least-squares solving,
/// or quantile root-finding.
///
/// No routine recovers from these internally and none returns a partial
/// result alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Row counts of the response and the data source disagree.
    #[error("shape mismatch: expected {expected} rows, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// A term references a column outside `1..=columns`.
    #[error("column {index} out of range for a source with {columns} columns")]
    OutOfRange { index: usize, columns: usize },

    /// The design has no columns, fewer rows than columns, or is rank-deficient.
    #[error("singular system: {0}")]
    SingularSystem(String),

    /// The density evaluated to zero (or non-finite) at the current iterate.
    #[error("derivative vanished at theta={theta} (iteration {iteration})")]
    DerivativeVanished { theta: f64, iteration: usize },

    /// The iteration cap was reached, or the iterate left the finite reals.
    #[error("no convergence after {iterations} iterations (last theta={last})")]
    NoConvergence { iterations: usize, last: f64 },

    /// A target probability outside the open interval (0, 1).
    #[error("probability must lie in (0, 1), got {0}")]
    InvalidProbability(f64),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// NaN or infinite input where finite numbers are required.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("formula parse error: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type FitResult<T> = Result<T, FitError>;

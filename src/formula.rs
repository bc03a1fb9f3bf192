//! Formula-driven design matrices.
//!
//! A formula names a response and lists additive terms, written
//! `y ~ 1 + X1 + X3`. Each term is either the intercept (`1`) or a
//! 1-indexed reference to a column of an external data matrix. [`build`]
//! turns the terms into an `n × k` [`DesignMatrix`], one column per term
//! in term order.
//!
//! Formulas are ordinary values. Build them with [`Formula::new`] and the
//! chainable term methods, or parse them from text with [`str::parse`].
//!
//! # Examples
//! ```
//! use nalgebra::DMatrix;
//! use u_numfit::formula::{build, TermRef};
//!
//! let source = DMatrix::from_row_slice(3, 2, &[
//!     1.0, 10.0,
//!     2.0, 20.0,
//!     3.0, 30.0,
//! ]);
//! let (y, x) = build(&[5.0, 6.0, 7.0], &[TermRef::Intercept, TermRef::Column(2)], &source).unwrap();
//! assert_eq!(y.len(), 3);
//! assert_eq!(x.column(0).unwrap(), &[1.0, 1.0, 1.0]);
//! assert_eq!(x.column(1).unwrap(), &[10.0, 20.0, 30.0]);
//! ```

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};

use crate::error::{FitError, FitResult};
use crate::ols::{self, LinearFit};

/// Label given to the intercept column.
pub const INTERCEPT_LABEL: &str = "(Intercept)";

/// One additive term of a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TermRef {
    /// Constant regressor: a column of `1.0`.
    Intercept,
    /// Column `index` of the source matrix, 1-indexed.
    Column(usize),
}

impl TermRef {
    /// Column label used in [`DesignMatrix::labels`].
    pub fn label(&self) -> String {
        match self {
            TermRef::Intercept => INTERCEPT_LABEL.to_string(),
            TermRef::Column(index) => format!("X{index}"),
        }
    }
}

impl fmt::Display for TermRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermRef::Intercept => f.write_str("1"),
            TermRef::Column(index) => write!(f, "X{index}"),
        }
    }
}

/// An `n × k` regressor matrix with one label per column.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    matrix: DMatrix<f64>,
    labels: Vec<String>,
}

impl DesignMatrix {
    /// Wraps a raw matrix, labelling columns `X1..Xk`.
    pub fn from_matrix(matrix: DMatrix<f64>) -> Self {
        let labels = (1..=matrix.ncols()).map(|j| format!("X{j}")).collect();
        Self { matrix, labels }
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        self.matrix
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Column `j` (0-indexed) as a contiguous slice, or `None` past the
    /// last column.
    pub fn column(&self, j: usize) -> Option<&[f64]> {
        if j >= self.ncols() {
            return None;
        }
        let n = self.nrows();
        // DMatrix storage is column-major
        self.matrix.as_slice().get(j * n..(j + 1) * n)
    }
}

/// Builds the design matrix for `terms` over `source`.
///
/// Returns the response as a vector alongside the design so the pair can
/// go straight to [`crate::ols::solve`].
///
/// # Errors
/// - `ShapeMismatch` if `response.len() != source.nrows()`.
/// - `OutOfRange` if a `Column(index)` has `index == 0` or
///   `index > source.ncols()`.
///
/// An empty `terms` slice is valid and yields an `n × 0` matrix.
pub fn build(
    response: &[f64],
    terms: &[TermRef],
    source: &DMatrix<f64>,
) -> FitResult<(DVector<f64>, DesignMatrix)> {
    let n = source.nrows();
    if response.len() != n {
        return Err(FitError::ShapeMismatch {
            expected: n,
            found: response.len(),
        });
    }

    let columns = source.ncols();
    for term in terms {
        if let TermRef::Column(index) = *term {
            if index == 0 || index > columns {
                return Err(FitError::OutOfRange { index, columns });
            }
        }
    }

    let matrix = DMatrix::from_fn(n, terms.len(), |i, j| match terms[j] {
        TermRef::Intercept => 1.0,
        TermRef::Column(index) => source[(i, index - 1)],
    });
    let labels = terms.iter().map(TermRef::label).collect();

    Ok((
        DVector::from_column_slice(response),
        DesignMatrix { matrix, labels },
    ))
}

/// A named response and its additive terms.
///
/// # Examples
/// ```
/// use u_numfit::formula::{Formula, TermRef};
///
/// let built = Formula::new("y").intercept().column(1).column(2);
/// let parsed: Formula = "y ~ 1 + X1 + X2".parse().unwrap();
/// assert_eq!(built, parsed);
/// assert_eq!(parsed.terms(), &[TermRef::Intercept, TermRef::Column(1), TermRef::Column(2)]);
/// assert_eq!(parsed.to_string(), "y ~ 1 + X1 + X2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Formula {
    response: String,
    terms: Vec<TermRef>,
}

impl Formula {
    /// A formula with no terms yet.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            terms: Vec::new(),
        }
    }

    pub fn with_terms(response: impl Into<String>, terms: Vec<TermRef>) -> Self {
        Self {
            response: response.into(),
            terms,
        }
    }

    /// Appends the intercept term.
    pub fn intercept(mut self) -> Self {
        self.terms.push(TermRef::Intercept);
        self
    }

    /// Appends a reference to source column `index` (1-indexed).
    pub fn column(mut self, index: usize) -> Self {
        self.terms.push(TermRef::Column(index));
        self
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn terms(&self) -> &[TermRef] {
        &self.terms
    }

    /// [`build`] with this formula's terms.
    pub fn build(
        &self,
        response: &[f64],
        source: &DMatrix<f64>,
    ) -> FitResult<(DVector<f64>, DesignMatrix)> {
        build(response, &self.terms, source)
    }

    /// Builds the design matrix and solves the least-squares problem.
    ///
    /// # Errors
    /// Anything [`build`] or [`crate::ols::fit`] reports.
    pub fn fit(&self, response: &[f64], source: &DMatrix<f64>) -> FitResult<LinearFit> {
        let (y, design) = self.build(response, source)?;
        ols::fit(&y, &design)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~", self.response)?;
        for (i, term) in self.terms.iter().enumerate() {
            let sep = if i == 0 { " " } else { " + " };
            write!(f, "{sep}{term}")?;
        }
        Ok(())
    }
}

impl FromStr for Formula {
    type Err = FitError;

    /// Parses `<ident> ~ <term> (+ <term>)*`.
    ///
    /// A term is `1` or `X<k>`/`x<k>` with `k ≥ 1`. Whitespace is ignored
    /// around tokens.
    fn from_str(s: &str) -> FitResult<Self> {
        let (lhs, rhs) = s
            .split_once('~')
            .ok_or_else(|| FitError::Parse(format!("missing '~' in {s:?}")))?;

        let response = lhs.trim();
        if !is_identifier(response) {
            return Err(FitError::Parse(format!(
                "invalid response name {response:?}"
            )));
        }

        let rhs = rhs.trim();
        if rhs.is_empty() {
            return Err(FitError::Parse("formula has no terms".into()));
        }
        let terms = rhs
            .split('+')
            .map(|token| parse_term(token.trim()))
            .collect::<FitResult<Vec<_>>>()?;

        Ok(Self {
            response: response.to_string(),
            terms,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn parse_term(token: &str) -> FitResult<TermRef> {
    match token {
        "" => Err(FitError::Parse("empty term".into())),
        "1" => Ok(TermRef::Intercept),
        "0" | "-1" => Err(FitError::Parse(
            "intercept removal is not supported; omit the 1 term instead".into(),
        )),
        _ => {
            let digits = token
                .strip_prefix('X')
                .or_else(|| token.strip_prefix('x'))
                .ok_or_else(|| FitError::Parse(format!("unknown term {token:?}")))?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FitError::Parse(format!("unknown term {token:?}")));
            }
            match digits.parse::<usize>() {
                Ok(0) => Err(FitError::Parse(format!(
                    "column references are 1-indexed, got {token:?}"
                ))),
                Ok(index) => Ok(TermRef::Column(index)),
                Err(e) => Err(FitError::Parse(format!("bad column index {token:?}: {e}"))),
            }
        }
    }
}

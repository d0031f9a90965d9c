//! Sparse polynomials and rational polynomials.

pub mod codegen;

use std::{error, fmt};

use nalgebra::{DMatrix, DVector};

use crate::search::evaluator::Evaluator;
use crate::search::fit::{self, Fit, FitError};
use crate::search::generator::Candidate;
use crate::search::report::Progress;
use crate::terms::{degree_of, exponents, term_count, IdxTuple};

/// An error from constructing or evaluating a polynomial.
#[derive(Debug)]
pub enum PolyError {
    EmptyTerms,
    UnsortedIdxs,
    CoeffCount { idxs: usize, coeffs: usize },
    DimsMismatch { p: usize, q: usize },
    WrongArity { expected: usize, got: usize },
    AxisLength { dim: usize, len: usize, expected: usize },
}

impl fmt::Display for PolyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PolyError::EmptyTerms => {
                write!(f, "polynomial has no terms")
            }
            PolyError::UnsortedIdxs => {
                write!(f, "term indices must be strictly increasing")
            }
            PolyError::CoeffCount { idxs, coeffs } => {
                write!(f, "{idxs} term indices but {coeffs} coefficients")
            }
            PolyError::DimsMismatch { p, q } => {
                write!(
                    f,
                    "numerator has {p} variables but denominator has {q}"
                )
            }
            PolyError::WrongArity { expected, got } => {
                write!(f, "expected {expected} coordinate axes, got {got}")
            }
            PolyError::AxisLength { dim, len, expected } => {
                write!(
                    f,
                    "axis {dim} has {len} samples, expected {expected}"
                )
            }
        }
    }
}

impl error::Error for PolyError {}

/// Builds the monomial-value table for the given coordinate axes: one row
/// per sample, one column per term index up to `degree`.
pub fn monomial_table(degree: usize, coords: &[&[f64]]) -> DMatrix<f64> {
    let dims = coords.len();
    let rows = coords.first().map_or(0, |axis| axis.len());
    let exps = exponents(dims, degree);

    let mut table = DMatrix::zeros(rows, exps.len());

    for (j, exp) in exps.iter().enumerate() {
        for i in 0..rows {
            let mut value = 1.0;

            for (axis, &e) in coords.iter().zip(exp) {
                value *= axis[i].powi(e as i32);
            }

            table[(i, j)] = value;
        }
    }

    table
}

/// A sparse multivariate polynomial: coefficients attached to a sorted set
/// of term indices.
#[derive(Clone, Debug)]
pub struct Polynomial {
    dims: usize,
    idxs: IdxTuple,
    coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn new(
        dims: usize,
        idxs: impl Into<IdxTuple>,
        coeffs: impl Into<Vec<f64>>,
    ) -> Result<Polynomial, PolyError> {
        let idxs = idxs.into();
        let coeffs = coeffs.into();

        if idxs.is_empty() {
            return Err(PolyError::EmptyTerms);
        }

        if idxs.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PolyError::UnsortedIdxs);
        }

        if coeffs.len() != idxs.len() {
            return Err(PolyError::CoeffCount {
                idxs: idxs.len(),
                coeffs: coeffs.len(),
            });
        }

        Ok(Polynomial { dims, idxs, coeffs })
    }

    /// Skips the term-set checks. The caller guarantees sorted, nonempty,
    /// duplicate-free indices and a matching coefficient count.
    pub(crate) fn new_unchecked(
        dims: usize,
        idxs: IdxTuple,
        coeffs: Vec<f64>,
    ) -> Polynomial {
        Polynomial { dims, idxs, coeffs }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn idxs(&self) -> &[usize] {
        &self.idxs
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Total degree: the degree of the highest term index.
    pub fn degree(&self) -> usize {
        degree_of(self.dims, self.idxs[self.idxs.len() - 1])
    }

    /// Number of nonzero terms.
    pub fn count(&self) -> usize {
        self.idxs.len()
    }

    /// Number of terms a dense polynomial of the same degree would have.
    pub fn count_all(&self) -> usize {
        term_count(self.dims, self.degree())
    }

    /// Evaluates against a precomputed monomial table: a dot product
    /// restricted to this polynomial's term indices.
    pub fn eval_table(&self, table: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(table.nrows(), |s, _| {
            self.idxs
                .iter()
                .zip(&self.coeffs)
                .map(|(&i, &c)| c * table[(s, i)])
                .sum()
        })
    }

    /// Returns an adapter rendering the polynomial as a formula. Rounded
    /// mode keeps five significant digits; exact mode round-trips every
    /// coefficient.
    pub fn display(&self, exact: bool) -> impl fmt::Display + '_ {
        PolyFormat { poly: self, exact }
    }
}

/// Variable name for rendering: x, y, z, falling back to `v{d}` beyond
/// three dimensions.
fn var_name(dims: usize, d: usize) -> String {
    if dims <= 3 {
        ["x", "y", "z"][d].to_string()
    } else {
        format!("v{d}")
    }
}

/// The factor strings of every term up to `degree`, in index order:
/// `["", "x", "y", "x^2", "xy", "y^2", ...]` for two variables.
fn term_names(dims: usize, degree: usize) -> Vec<String> {
    exponents(dims, degree)
        .iter()
        .map(|exp| {
            let mut name = String::new();

            for (d, &e) in exp.iter().enumerate() {
                match e {
                    0 => {}
                    1 => name.push_str(&var_name(dims, d)),
                    _ => {
                        name.push_str(&var_name(dims, d));
                        name.push_str(&format!("^{e} "));
                    }
                }
            }

            name.trim().to_string()
        })
        .collect()
}

/// Rounds to five significant digits, trimming trailing zeros.
fn sig5(x: f64) -> String {
    if x == 0.0 || !x.is_finite() {
        return format!("{x}");
    }

    let mag = x.abs().log10().floor() as i32;
    let decimals = (4 - mag).max(0) as usize;
    let mut s = format!("{x:.decimals$}");

    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }

        if s.ends_with('.') {
            s.pop();
        }
    }

    s
}

struct PolyFormat<'a> {
    poly: &'a Polynomial,
    exact: bool,
}

impl fmt::Display for PolyFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let poly = self.poly;
        let names = term_names(poly.dims, poly.degree());

        let mut dense = vec![0.0; poly.count_all()];

        for (&i, &c) in poly.idxs.iter().zip(&poly.coeffs) {
            dense[i] = c;
        }

        let mut terms: Vec<String> = dense
            .iter()
            .zip(&names)
            .map(|(&c, name)| {
                if c == 0.0 {
                    String::new()
                } else if c == 1.0 {
                    name.clone()
                } else {
                    let c = if self.exact {
                        format!("{c:?}")
                    } else {
                        sig5(c)
                    };

                    format!("{c} {name}").trim().to_string()
                }
            })
            .collect();

        while terms.first().is_some_and(|t| t.is_empty()) {
            terms.remove(0);
        }

        if terms.is_empty() {
            return write!(f, "1");
        }

        write!(f, "{}", terms[0])?;

        for term in &terms[1..] {
            if term.is_empty() {
                continue;
            }

            if let Some(rest) = term.strip_prefix('-') {
                write!(f, " - {rest}")?;
            } else {
                write!(f, " + {term}")?;
            }
        }

        Ok(())
    }
}

/// A ratio of two sparse polynomials over the same variables. The
/// numerator's highest-index coefficient is conventionally fixed to 1 by
/// the fitting engine to remove the redundant overall scale.
#[derive(Clone, Debug)]
pub struct RationalPolynomial {
    p: Polynomial,
    q: Polynomial,
}

impl RationalPolynomial {
    pub fn new(
        p: Polynomial,
        q: Polynomial,
    ) -> Result<RationalPolynomial, PolyError> {
        if p.dims != q.dims {
            return Err(PolyError::DimsMismatch {
                p: p.dims,
                q: q.dims,
            });
        }

        Ok(RationalPolynomial { p, q })
    }

    /// Skips the dimension check. The caller guarantees that both sides
    /// range over the same variables.
    pub(crate) fn new_unchecked(
        p: Polynomial,
        q: Polynomial,
    ) -> RationalPolynomial {
        RationalPolynomial { p, q }
    }

    /// Searches for the cheapest rational polynomial approximating the
    /// sampled values within the evaluator's tolerance. See
    /// [`fit::approximate`].
    pub fn approximate<I, E>(
        truth: &[f64],
        coords: &[&[f64]],
        candidates: I,
        evaluator: &E,
        reporter: Option<&mut dyn Progress>,
    ) -> Result<Fit, FitError>
    where
        I: IntoIterator<Item = Candidate>,
        E: Evaluator + ?Sized,
    {
        fit::approximate(truth, coords, candidates, evaluator, reporter)
    }

    pub fn dims(&self) -> usize {
        self.p.dims
    }

    pub fn p(&self) -> &Polynomial {
        &self.p
    }

    pub fn q(&self) -> &Polynomial {
        &self.q
    }

    pub fn degree(&self) -> usize {
        self.p.degree().max(self.q.degree())
    }

    /// Evaluates `P / Q` elementwise against a precomputed monomial table.
    /// Division by zero propagates as IEEE infinities, not an error.
    pub fn eval_table(&self, table: &DMatrix<f64>) -> DVector<f64> {
        let p = self.p.eval_table(table);
        let q = self.q.eval_table(table);

        p.component_div(&q)
    }

    /// Evaluates at the given coordinate axes, building the monomial table
    /// on the fly.
    pub fn eval_coords(
        &self,
        coords: &[&[f64]],
    ) -> Result<Vec<f64>, PolyError> {
        if coords.len() != self.dims() {
            return Err(PolyError::WrongArity {
                expected: self.dims(),
                got: coords.len(),
            });
        }

        let rows = coords[0].len();

        for (dim, axis) in coords.iter().enumerate() {
            if axis.len() != rows {
                return Err(PolyError::AxisLength {
                    dim,
                    len: axis.len(),
                    expected: rows,
                });
            }
        }

        let table = monomial_table(self.degree(), coords);

        Ok(self.eval_table(&table).as_slice().to_vec())
    }

    /// Per-sample absolute error of the approximation at the given
    /// coordinates: `predicted / truth - 1`.
    pub fn abs_error(
        &self,
        truth: &[f64],
        coords: &[&[f64]],
    ) -> Result<Vec<f64>, PolyError> {
        let values = self.eval_coords(coords)?;

        Ok(crate::search::evaluator::abs_error(truth, &values))
    }

    /// Per-sample error relative to the span of the true values.
    pub fn rel_error(
        &self,
        truth: &[f64],
        coords: &[&[f64]],
    ) -> Result<Vec<f64>, PolyError> {
        let values = self.eval_coords(coords)?;

        Ok(crate::search::evaluator::rel_error(truth, &values))
    }

    /// Returns an adapter rendering the rational polynomial as a formula.
    pub fn display(&self, exact: bool) -> impl fmt::Display + '_ {
        RatFormat { ratpoly: self, exact }
    }
}

struct RatFormat<'a> {
    ratpoly: &'a RationalPolynomial,
    exact: bool,
}

impl fmt::Display for RatFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}) / ({})",
            self.ratpoly.p.display(self.exact),
            self.ratpoly.q.display(self.exact)
        )
    }
}

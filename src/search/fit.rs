//! The search-and-fit engine.
//!
//! Pulls candidate structures from a generator in cost order, solves a
//! damped nonlinear least-squares problem for each one's coefficients, and
//! keeps the best-scoring result. Because the stream is cheapest-first, an
//! early stop on the evaluator's threshold returns the lowest-cost
//! adequate approximation.

use std::{error, fmt};

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn, Matrix, Vector};

use crate::poly::{monomial_table, Polynomial, RationalPolynomial};
use crate::search::evaluator::Evaluator;
use crate::search::generator::Candidate;
use crate::search::report::Progress;
use crate::terms::degree_of;

/// The result of a search: the best structure found and its score.
pub struct Fit {
    pub ratpoly: RationalPolynomial,
    pub error: f64,
}

/// A fatal configuration error, raised before or instead of searching.
#[derive(Debug)]
pub enum FitError {
    NoAxes,
    NoSamples,
    AxisLength { dim: usize, len: usize, expected: usize },
    ZeroCoordinate { dim: usize },
    MixedSignAxis { dim: usize },
    NoCandidates,
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FitError::NoAxes => {
                write!(f, "no coordinate axes supplied")
            }
            FitError::NoSamples => {
                write!(f, "no samples supplied")
            }
            FitError::AxisLength { dim, len, expected } => {
                write!(
                    f,
                    "axis {dim} has {len} samples, expected {expected}"
                )
            }
            FitError::ZeroCoordinate { dim } => {
                write!(f, "axis {dim} contains a zero coordinate")
            }
            FitError::MixedSignAxis { dim } => {
                write!(f, "axis {dim} mixes positive and negative values")
            }
            FitError::NoCandidates => {
                write!(f, "the candidate generator yielded nothing")
            }
        }
    }
}

impl error::Error for FitError {}

fn validate(truth: &[f64], coords: &[&[f64]]) -> Result<(), FitError> {
    if coords.is_empty() {
        return Err(FitError::NoAxes);
    }

    if truth.is_empty() {
        return Err(FitError::NoSamples);
    }

    for (dim, axis) in coords.iter().enumerate() {
        if axis.len() != truth.len() {
            return Err(FitError::AxisLength {
                dim,
                len: axis.len(),
                expected: truth.len(),
            });
        }

        if axis.iter().any(|&x| x == 0.0) {
            return Err(FitError::ZeroCoordinate { dim });
        }

        let positive = axis[0] > 0.0;

        if axis.iter().any(|&x| (x > 0.0) != positive) {
            return Err(FitError::MixedSignAxis { dim });
        }
    }

    Ok(())
}

/// Monomial-value table covering every term index up to a working degree.
/// Grows monotonically; a candidate needing a smaller degree reuses it.
struct OnesTable {
    degree: Option<usize>,
    values: DMatrix<f64>,
}

impl OnesTable {
    fn new() -> OnesTable {
        OnesTable {
            degree: None,
            values: DMatrix::zeros(0, 0),
        }
    }

    fn ensure(
        &mut self,
        degree: usize,
        coords: &[&[f64]],
    ) -> &DMatrix<f64> {
        if self.degree.map_or(true, |d| degree > d) {
            log::debug!("building monomial table up to degree {degree}");

            self.values = monomial_table(degree, coords);
            self.degree = Some(degree);
        }

        &self.values
    }
}

/// Searches the candidate stream for the best-fitting rational polynomial.
///
/// Every coordinate axis must be nonzero and single-signed; violations
/// fail before any candidate is tried. The fit objective is least squares
/// (numerically stabler than minimizing the evaluator's max-error score
/// directly); the evaluator independently decides acceptance.
pub fn approximate<I, E>(
    truth: &[f64],
    coords: &[&[f64]],
    candidates: I,
    evaluator: &E,
    mut reporter: Option<&mut dyn Progress>,
) -> Result<Fit, FitError>
where
    I: IntoIterator<Item = Candidate>,
    E: Evaluator + ?Sized,
{
    validate(truth, coords)?;

    let dims = coords.len();
    let mut table = OnesTable::new();
    let mut best: Option<Fit> = None;

    for (p_idxs, q_idxs) in candidates {
        if let Some(reporter) = reporter.as_deref_mut() {
            reporter.trying(&p_idxs, &q_idxs);
        }

        let max_idx = p_idxs[p_idxs.len() - 1].max(q_idxs[q_idxs.len() - 1]);

        // Very low degrees are bumped up so the table rarely rebuilds.
        let degree = degree_of(dims, max_idx).max(6 / dims);
        let ones = table.ensure(degree, coords);

        let ratpoly = solve(dims, &p_idxs, &q_idxs, ones, truth);
        let values = ratpoly.eval_table(ones);
        let (error, stop) = evaluator.evaluate(truth, values.as_slice());

        if let Some(reporter) = reporter.as_deref_mut() {
            reporter.tried(&ratpoly, error);
        }

        log::debug!("tried {p_idxs:?} / {q_idxs:?}: error {error:e}");

        let better = match &best {
            None => true,
            Some(b) => error < b.error || (b.error.is_nan() && !error.is_nan()),
        };

        if better {
            best = Some(Fit { ratpoly, error });
        }

        if stop {
            log::info!("error {error:e} below threshold, stopping");
            break;
        }
    }

    best.ok_or(FitError::NoCandidates)
}

/// Fits the free coefficients of one candidate structure by damped least
/// squares. Non-convergence is not an error; whatever the solver settles
/// on is returned for scoring.
fn solve(
    dims: usize,
    p_idxs: &[usize],
    q_idxs: &[usize],
    ones: &DMatrix<f64>,
    truth: &[f64],
) -> RationalPolynomial {
    let split = p_idxs.len() - 1;
    let free = split + q_idxs.len();

    // All zero except the leading denominator coefficient, which keeps the
    // first residual evaluation away from 0/0.
    let mut initial = DVector::zeros(free);
    initial[split] = 1.0;

    let mut problem = RatPolyProblem {
        p_idxs,
        q_idxs,
        ones,
        truth,
        params: DVector::zeros(free),
        p_vals: DVector::zeros(truth.len()),
        q_vals: DVector::zeros(truth.len()),
    };

    problem.set_params(&initial);

    let (problem, report) = LevenbergMarquardt::new().minimize(problem);

    log::trace!(
        "solver finished: {:?}, objective {:e}",
        report.termination,
        report.objective_function
    );

    ratpoly_from_params(dims, p_idxs, q_idxs, &problem.params)
}

/// Reassembles a rational polynomial from the solver's parameter vector,
/// reinstating the fixed unit coefficient on the numerator's highest term.
fn ratpoly_from_params(
    dims: usize,
    p_idxs: &[usize],
    q_idxs: &[usize],
    params: &DVector<f64>,
) -> RationalPolynomial {
    let split = p_idxs.len() - 1;

    let mut p_coeffs: Vec<f64> = params.as_slice()[..split].to_vec();
    p_coeffs.push(1.0);

    let q_coeffs = params.as_slice()[split..].to_vec();

    let p = Polynomial::new_unchecked(dims, p_idxs.into(), p_coeffs);
    let q = Polynomial::new_unchecked(dims, q_idxs.into(), q_coeffs);

    RationalPolynomial::new_unchecked(p, q)
}

/// Least-squares problem over the free coefficients of one candidate.
///
/// Residuals are `P(x)/Q(x) - truth`; both the residuals and the analytic
/// Jacobian read monomial values out of the shared table.
struct RatPolyProblem<'a> {
    p_idxs: &'a [usize],
    q_idxs: &'a [usize],
    ones: &'a DMatrix<f64>,
    truth: &'a [f64],
    params: DVector<f64>,
    p_vals: DVector<f64>,
    q_vals: DVector<f64>,
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for RatPolyProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &Vector<f64, Dyn, Self::ParameterStorage>) {
        self.params.copy_from(x);

        let split = self.p_idxs.len() - 1;
        let fixed = self.p_idxs[split];

        for s in 0..self.truth.len() {
            let mut p = self.ones[(s, fixed)];

            for (k, &i) in self.p_idxs[..split].iter().enumerate() {
                p += self.params[k] * self.ones[(s, i)];
            }

            let mut q = 0.0;

            for (k, &i) in self.q_idxs.iter().enumerate() {
                q += self.params[split + k] * self.ones[(s, i)];
            }

            self.p_vals[s] = p;
            self.q_vals[s] = q;
        }
    }

    fn params(&self) -> Vector<f64, Dyn, Self::ParameterStorage> {
        self.params.clone_owned()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        Some(DVector::from_fn(self.truth.len(), |s, _| {
            self.p_vals[s] / self.q_vals[s] - self.truth[s]
        }))
    }

    fn jacobian(&self) -> Option<Matrix<f64, Dyn, Dyn, Self::JacobianStorage>> {
        let split = self.p_idxs.len() - 1;
        let rows = self.truth.len();
        let mut jacobian = DMatrix::zeros(rows, self.params.len());

        for s in 0..rows {
            let p = self.p_vals[s];
            let q = self.q_vals[s];

            for (k, &i) in self.p_idxs[..split].iter().enumerate() {
                jacobian[(s, k)] = self.ones[(s, i)] / q;
            }

            for (k, &i) in self.q_idxs.iter().enumerate() {
                jacobian[(s, split + k)] = -p * self.ones[(s, i)] / (q * q);
            }
        }

        Some(jacobian)
    }
}

//! Search for low-cost rational-polynomial approximations to sampled
//! functions.

pub mod grid;
pub mod opts;
pub mod poly;
pub mod search;
pub mod terms;

pub use poly::{Polynomial, RationalPolynomial};
pub use search::evaluator::{AbsOnly, Balanced, Evaluator, MaxOf, RelOnly};
pub use search::fit::{approximate, Fit, FitError};
pub use search::generator::{just, Candidate, IdxGenerator};
pub use search::report::{ConsolePrinter, Progress};

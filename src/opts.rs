//! Command-line options.

use std::path::PathBuf;

use argh::FromArgs;
use log::LevelFilter;
use strum_macros::{Display, EnumString};

use crate::grid::Anchor;
use crate::search::evaluator::{
    AbsOnly, Balanced, Evaluator, MaxOf, RelOnly,
};

/// A built-in target function to approximate.
#[derive(Clone, Copy, Debug, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Target {
    Exp,
    Ln,
    Sqrt,
    Recip,
    Sinc,
}

impl Target {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Target::Exp => x.exp(),
            Target::Ln => x.ln(),
            Target::Sqrt => x.sqrt(),
            Target::Recip => x.recip(),
            Target::Sinc => {
                if x == 0.0 {
                    1.0
                } else {
                    x.sin() / x
                }
            }
        }
    }
}

/// Choice of error measure.
#[derive(Clone, Copy, Debug, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EvaluatorKind {
    Abs,
    Rel,
    Max,
    Balanced,
}

impl EvaluatorKind {
    pub fn build(
        &self,
        tolerance: Option<f64>,
        weight_abs: f64,
        weight_rel: f64,
    ) -> Box<dyn Evaluator> {
        match self {
            EvaluatorKind::Abs => Box::new(AbsOnly::new(tolerance)),
            EvaluatorKind::Rel => Box::new(RelOnly::new(tolerance)),
            EvaluatorKind::Max => Box::new(MaxOf::new(tolerance)),
            EvaluatorKind::Balanced => {
                Box::new(Balanced::new(tolerance, weight_abs, weight_rel))
            }
        }
    }
}

/// Search for a cheap rational-polynomial approximation.
#[derive(FromArgs)]
pub struct Opts {
    /// target function (exp, ln, sqrt, recip, sinc)
    #[argh(positional)]
    pub target: Target,

    /// lower end of the span
    #[argh(option, default = "1.0")]
    pub lo: f64,

    /// upper end of the span
    #[argh(option, default = "2.0")]
    pub hi: f64,

    /// number of sample points
    #[argh(option, short = 'n', default = "64")]
    pub samples: usize,

    /// concentrate samples toward an anchor (lo, hi, mid, or a number)
    #[argh(option)]
    pub concentrate: Option<Anchor>,

    /// concentration strength in [-1, 1]
    #[argh(option, default = "0.5")]
    pub skew: f64,

    /// error measure (abs, rel, max, balanced)
    #[argh(option, short = 'e', default = "EvaluatorKind::Abs")]
    pub evaluator: EvaluatorKind,

    /// stop once the error falls below this value
    #[argh(option, short = 't')]
    pub tolerance: Option<f64>,

    /// weight of the abs measure under balanced
    #[argh(option, default = "1.0")]
    pub weight_abs: f64,

    /// weight of the rel measure under balanced
    #[argh(option, default = "1.0")]
    pub weight_rel: f64,

    /// candidate pruning strength (0 is exhaustive)
    #[argh(option, default = "0.0")]
    pub blitz: f64,

    /// try at most this many candidates
    #[argh(option)]
    pub limit: Option<usize>,

    /// output file
    #[argh(option, short = 'o')]
    pub output: Option<PathBuf>,

    /// suppress per-candidate progress
    #[argh(switch, short = 'q')]
    pub quiet: bool,

    /// logging level
    #[argh(option, long = "log", default = "LevelFilter::Warn")]
    pub log_level: LevelFilter,
}

impl Opts {
    /// Parse options from `env::args`.
    pub fn parse() -> Opts {
        argh::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_names_round_trip() {
        for name in ["exp", "ln", "sqrt", "recip", "sinc"] {
            let target: Target = name.parse().unwrap();

            assert_eq!(target.to_string(), name);
        }

        assert!("tan".parse::<Target>().is_err());
    }

    #[test]
    fn sinc_is_defined_at_zero() {
        assert_eq!(Target::Sinc.eval(0.0), 1.0);
        assert!((Target::Sinc.eval(1e-8) - 1.0).abs() < 1e-12);
    }
}

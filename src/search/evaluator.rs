//! Error-scoring strategies.
//!
//! Each evaluator reduces a prediction to a scalar error and decides
//! whether the search may stop: the flag is set iff a stop threshold was
//! configured and the error falls below it.

/// Per-sample error relative to the true value: `predicted / truth - 1`.
pub fn abs_error(truth: &[f64], predicted: &[f64]) -> Vec<f64> {
    truth
        .iter()
        .zip(predicted)
        .map(|(&t, &v)| v / t - 1.0)
        .collect()
}

/// Per-sample error relative to the span of the true values.
pub fn rel_error(truth: &[f64], predicted: &[f64]) -> Vec<f64> {
    let max = truth.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = truth.iter().copied().fold(f64::INFINITY, f64::min);
    let span = max - min;

    truth
        .iter()
        .zip(predicted)
        .map(|(&t, &v)| (v - t) / span)
        .collect()
}

/// Largest magnitude, propagating NaN (unlike `f64::max`, which drops it).
fn peak(values: &[f64]) -> f64 {
    let mut out = f64::NEG_INFINITY;

    for &v in values {
        if v.is_nan() {
            return f64::NAN;
        }

        out = out.max(v.abs());
    }

    out
}

fn max_abs_error(truth: &[f64], predicted: &[f64]) -> f64 {
    peak(&abs_error(truth, predicted))
}

fn max_rel_error(truth: &[f64], predicted: &[f64]) -> f64 {
    peak(&rel_error(truth, predicted))
}

/// Decides the stop flag. NaN never satisfies the threshold.
fn gate(threshold: Option<f64>, error: f64) -> (f64, bool) {
    (error, threshold.is_some_and(|t| error < t))
}

/// A scoring strategy with an optional early-stop threshold.
pub trait Evaluator {
    /// Scores a prediction against the true values, returning the error
    /// and whether the search may stop.
    fn evaluate(&self, truth: &[f64], predicted: &[f64]) -> (f64, bool);
}

/// Maximum error relative to the true value at each sample.
pub struct AbsOnly {
    pub threshold: Option<f64>,
}

impl AbsOnly {
    pub fn new(threshold: Option<f64>) -> AbsOnly {
        AbsOnly { threshold }
    }
}

impl Evaluator for AbsOnly {
    fn evaluate(&self, truth: &[f64], predicted: &[f64]) -> (f64, bool) {
        gate(self.threshold, max_abs_error(truth, predicted))
    }
}

/// Maximum error relative to the span of the true values.
pub struct RelOnly {
    pub threshold: Option<f64>,
}

impl RelOnly {
    pub fn new(threshold: Option<f64>) -> RelOnly {
        RelOnly { threshold }
    }
}

impl Evaluator for RelOnly {
    fn evaluate(&self, truth: &[f64], predicted: &[f64]) -> (f64, bool) {
        gate(self.threshold, max_rel_error(truth, predicted))
    }
}

/// The worse of the two error measures.
pub struct MaxOf {
    pub threshold: Option<f64>,
}

impl MaxOf {
    pub fn new(threshold: Option<f64>) -> MaxOf {
        MaxOf { threshold }
    }
}

impl Evaluator for MaxOf {
    fn evaluate(&self, truth: &[f64], predicted: &[f64]) -> (f64, bool) {
        let abs = max_abs_error(truth, predicted);
        let rel = max_rel_error(truth, predicted);
        let error = if abs.is_nan() || rel.is_nan() {
            f64::NAN
        } else {
            abs.max(rel)
        };

        gate(self.threshold, error)
    }
}

/// A weighted mean of the two error measures.
pub struct Balanced {
    pub threshold: Option<f64>,
    pub weight_abs: f64,
    pub weight_rel: f64,
}

impl Balanced {
    pub fn new(
        threshold: Option<f64>,
        weight_abs: f64,
        weight_rel: f64,
    ) -> Balanced {
        Balanced {
            threshold,
            weight_abs,
            weight_rel,
        }
    }
}

impl Evaluator for Balanced {
    fn evaluate(&self, truth: &[f64], predicted: &[f64]) -> (f64, bool) {
        let abs = max_abs_error(truth, predicted);
        let rel = max_rel_error(truth, predicted);
        let error = (self.weight_abs * abs + self.weight_rel * rel)
            / (self.weight_abs + self.weight_rel);

        gate(self.threshold, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn abs_is_relative_to_truth() {
        let (error, stop) =
            AbsOnly::new(None).evaluate(&[1.0, 2.0], &[1.1, 2.0]);

        assert_close(error, 0.1);
        assert!(!stop);
    }

    #[test]
    fn rel_is_relative_to_span() {
        let truth = [1.0, 5.0];
        let (error, _) = RelOnly::new(None).evaluate(&truth, &[1.0, 6.0]);

        assert_close(error, 0.25);
    }

    #[test]
    fn threshold_gates_stop() {
        let truth = [1.0, 2.0];
        let predicted = [1.1, 2.0];

        let (_, stop) = AbsOnly::new(Some(0.2)).evaluate(&truth, &predicted);
        assert!(stop);

        let (_, stop) = AbsOnly::new(Some(0.05)).evaluate(&truth, &predicted);
        assert!(!stop);
    }

    #[test]
    fn nan_never_stops() {
        let (error, stop) =
            MaxOf::new(Some(1.0)).evaluate(&[1.0, 2.0], &[f64::NAN, 2.0]);

        assert!(error.is_nan());
        assert!(!stop);
    }

    #[test]
    fn balanced_weights_rank_candidates() {
        let truth = [1.0, 100.0];

        // Candidate A: poor near the small value, tight on the span.
        let a = [1.1, 100.0];
        // Candidate B: better pointwise ratio, worse across the span.
        let b = [1.0, 95.0];

        let abs = AbsOnly::new(None);
        let (abs_a, _) = abs.evaluate(&truth, &a);
        let (abs_b, _) = abs.evaluate(&truth, &b);

        assert!(abs_b < abs_a);

        let balanced = Balanced::new(None, 1.0, 3.0);
        let (bal_a, _) = balanced.evaluate(&truth, &a);
        let (bal_b, _) = balanced.evaluate(&truth, &b);

        assert!(bal_a < bal_b);
    }

    #[test]
    fn balanced_degenerates_to_each_measure() {
        let truth = [1.0, 2.0, 4.0];
        let predicted = [1.2, 1.9, 4.0];

        let (abs, _) = AbsOnly::new(None).evaluate(&truth, &predicted);
        let (rel, _) = RelOnly::new(None).evaluate(&truth, &predicted);

        let (all_abs, _) =
            Balanced::new(None, 1.0, 0.0).evaluate(&truth, &predicted);
        let (all_rel, _) =
            Balanced::new(None, 0.0, 1.0).evaluate(&truth, &predicted);

        assert_close(abs, all_abs);
        assert_close(rel, all_rel);
    }
}

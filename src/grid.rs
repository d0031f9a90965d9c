//! Sampling grids: evenly spaced points, density warping, and arc-length
//! resampling.

use std::str::FromStr;
use std::{error, fmt};

/// A point of the span toward which samples are concentrated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    Lo,
    Hi,
    Mid,
    Value(f64),
}

impl FromStr for Anchor {
    type Err = ParseAnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lo" => Ok(Anchor::Lo),
            "hi" => Ok(Anchor::Hi),
            "mid" => Ok(Anchor::Mid),
            _ => s.parse().map(Anchor::Value).map_err(|_| ParseAnchorError),
        }
    }
}

pub struct ParseAnchorError;

impl fmt::Display for ParseAnchorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected \"lo\", \"hi\", \"mid\", or a number")
    }
}

/// An error from a grid construction.
#[derive(Debug)]
pub enum GridError {
    DescendingSpan { lo: f64, hi: f64 },
    AnchorOutsideSpan { anchor: f64, lo: f64, hi: f64 },
    SkewOutOfRange(f64),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GridError::DescendingSpan { lo, hi } => {
                write!(f, "span is descending: [{lo}, {hi}]")
            }
            GridError::AnchorOutsideSpan { anchor, lo, hi } => {
                write!(f, "anchor {anchor} outside span [{lo}, {hi}]")
            }
            GridError::SkewOutOfRange(skew) => {
                write!(f, "skew {skew} outside [-1, 1]")
            }
        }
    }
}

impl error::Error for GridError {}

/// Returns `n` evenly spaced points over `[lo, hi]`, endpoints exact.
pub fn linspace(n: usize, lo: f64, hi: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            let mut points: Vec<f64> =
                (0..n).map(|i| lo + i as f64 * step).collect();

            points[0] = lo;
            points[n - 1] = hi;
            points
        }
    }
}

/// Warps a sorted span of points toward `anchor` by a power-law remap with
/// exponent `1 + skew` (for `skew <= 0`) or `1 / (1 - skew)` (for
/// `skew > 0`). Endpoints and monotonicity are preserved exactly.
pub fn concentrate(
    mut points: Vec<f64>,
    anchor: Anchor,
    skew: f64,
) -> Result<Vec<f64>, GridError> {
    let n = points.len();

    if n < 2 {
        return Ok(points);
    }

    let lo = points[0];
    let hi = points[n - 1];

    if lo > hi {
        return Err(GridError::DescendingSpan { lo, hi });
    }

    if !(-1.0..=1.0).contains(&skew) {
        return Err(GridError::SkewOutOfRange(skew));
    }

    let anchor = match anchor {
        Anchor::Lo => lo,
        Anchor::Hi => hi,
        Anchor::Mid => (lo + hi) / 2.0,
        Anchor::Value(v) => v,
    };

    if anchor < lo || anchor > hi {
        return Err(GridError::AnchorOutsideSpan { anchor, lo, hi });
    }

    let span = hi - lo;

    if span == 0.0 {
        return Ok(points);
    }

    let c = (anchor - lo) / span;
    let p = if skew <= 0.0 {
        1.0 + skew
    } else {
        1.0 / (1.0 - skew)
    };

    for x in points.iter_mut() {
        let t = (*x - lo) / span;

        let warped = if c == 0.0 {
            t.powf(p)
        } else if c == 1.0 {
            1.0 - (1.0 - t).powf(p)
        } else if t <= c {
            c - c * ((c - t) / c).powf(p)
        } else {
            c + (1.0 - c) * ((t - c) / (1.0 - c)).powf(p)
        };

        *x = warped * span + lo;
    }

    points[0] = lo;
    points[n - 1] = hi;

    Ok(points)
}

/// `linspace` followed by `concentrate`.
pub fn linspace_with(
    n: usize,
    lo: f64,
    hi: f64,
    anchor: Anchor,
    skew: f64,
) -> Result<Vec<f64>, GridError> {
    concentrate(linspace(n, lo, hi), anchor, skew)
}

/// Returns `n` points over `[xmin, xmax]` equally spaced in the
/// aspect-normalized arc length of `(x, f(x))`.
///
/// The curve is sampled densely at `samples` reference points (2000 is a
/// reasonable default), its gradient taken numerically, the cumulative arc
/// length accumulated trapezoidally, and the result interpolated back to x.
pub fn arcspace<F>(
    n: usize,
    f: F,
    xmin: f64,
    xmax: f64,
    samples: usize,
) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    let x0 = linspace(samples.max(2), xmin, xmax);
    let y0: Vec<f64> = x0.iter().map(|&x| f(x)).collect();

    let ymin = y0.iter().copied().fold(f64::INFINITY, f64::min);
    let ymax = y0.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let yspan = ymax - ymin;

    // Normalize the gradient so that x and y spans weigh equally.
    let scale = if yspan != 0.0 {
        (xmax - xmin) / yspan
    } else {
        1.0
    };

    let m = x0.len();
    let mut integrand = Vec::with_capacity(m);

    for i in 0..m {
        let (a, b) = match i {
            0 => (0, 1),
            _ if i == m - 1 => (m - 2, m - 1),
            _ => (i - 1, i + 1),
        };
        let slope = (y0[b] - y0[a]) / (x0[b] - x0[a]);

        integrand.push((1.0 + (scale * slope).powi(2)).sqrt());
    }

    let mut s0 = vec![0.0; m];

    for i in 1..m {
        s0[i] = s0[i - 1]
            + 0.5 * (integrand[i] + integrand[i - 1]) * (x0[i] - x0[i - 1]);
    }

    linspace(n, s0[0], s0[m - 1])
        .iter()
        .map(|&s| interp(s, &s0, &x0))
        .collect()
}

/// Linear interpolation of `fp` over sorted sample positions `xp`, clamped
/// at the ends.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();

    if x <= xp[0] {
        return fp[0];
    }

    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    let hi = xp.partition_point(|&v| v < x).max(1);
    let lo = hi - 1;
    let width = xp[hi] - xp[lo];

    if width == 0.0 {
        return fp[lo];
    }

    fp[lo] + (fp[hi] - fp[lo]) * (x - xp[lo]) / width
}

/// Expands 1-D axes into matching flat coordinate arrays covering their
/// Cartesian product, last axis fastest.
pub fn meshgrid(axes: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let total: usize = axes.iter().map(Vec::len).product();
    let mut out = Vec::with_capacity(axes.len());

    for (d, axis) in axes.iter().enumerate() {
        let later: usize = axes[d + 1..].iter().map(Vec::len).product();
        let earlier = if axis.is_empty() {
            0
        } else {
            total / (later * axis.len())
        };
        let mut coords = Vec::with_capacity(total);

        for _ in 0..earlier {
            for &v in axis {
                for _ in 0..later {
                    coords.push(v);
                }
            }
        }

        out.push(coords);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn linspace_endpoints_exact() {
        let points = linspace(7, 0.1, 0.3);

        assert_eq!(points.len(), 7);
        assert_eq!(points[0], 0.1);
        assert_eq!(points[6], 0.3);
    }

    #[test]
    fn concentrate_endpoints_exact() {
        let anchors = [Anchor::Lo, Anchor::Hi, Anchor::Mid, Anchor::Value(3.0)];
        let skews = [-1.0, -0.5, 0.0, 0.5, 1.0];

        for anchor in anchors {
            for skew in skews {
                let points =
                    linspace_with(20, 1.0, 10.0, anchor, skew).unwrap();

                assert_eq!(points[0], 1.0, "{anchor:?} {skew}");
                assert_eq!(points[19], 10.0, "{anchor:?} {skew}");

                for pair in points.windows(2) {
                    assert!(pair[0] <= pair[1], "{anchor:?} {skew}");
                }
            }
        }
    }

    #[test]
    fn concentrate_zero_skew_is_identity() {
        let points = linspace(10, 2.0, 5.0);
        let warped =
            concentrate(points.clone(), Anchor::Mid, 0.0).unwrap();

        for (a, b) in points.iter().zip(&warped) {
            assert_close(*a, *b);
        }
    }

    #[test]
    fn concentrate_rejects_bad_config() {
        let points = linspace(5, 0.0, 1.0);

        assert!(matches!(
            concentrate(points.clone(), Anchor::Value(2.0), 0.5),
            Err(GridError::AnchorOutsideSpan { .. })
        ));
        assert!(matches!(
            concentrate(points, Anchor::Lo, 1.5),
            Err(GridError::SkewOutOfRange(_))
        ));
    }

    #[test]
    fn arcspace_linear_is_uniform() {
        let points = arcspace(11, |x| x, 1.0, 2.0, 500);
        let uniform = linspace(11, 1.0, 2.0);

        assert_eq!(points[0], 1.0);
        assert_eq!(points[10], 2.0);

        for (a, b) in points.iter().zip(&uniform) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn arcspace_is_increasing() {
        let points = arcspace(30, |x| x * x, 1.0, 10.0, 2000);

        assert_eq!(points.len(), 30);

        for pair in points.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn meshgrid_expands_cartesian() {
        let grids = meshgrid(&[vec![1.0, 2.0], vec![10.0, 20.0, 30.0]]);

        assert_eq!(grids[0], [1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        assert_eq!(grids[1], [10.0, 20.0, 30.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn anchor_parsing() {
        assert_eq!("lo".parse::<Anchor>().ok(), Some(Anchor::Lo));
        assert_eq!("mid".parse::<Anchor>().ok(), Some(Anchor::Mid));
        assert_eq!("2.5".parse::<Anchor>().ok(), Some(Anchor::Value(2.5)));
        assert!("nope".parse::<Anchor>().is_err());
    }
}

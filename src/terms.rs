//! Term arithmetic: the bijection between flat term indices and monomial
//! degrees for a fixed variable count.
//!
//! Monomials are ordered by ascending total degree; within a degree, the
//! first variable varies fastest and the last slowest. A sparse polynomial
//! names its nonzero terms by their positions in this ordering.

use smallvec::SmallVec;

/// A sorted, duplicate-free set of term indices marking the nonzero
/// coefficients of a sparse polynomial.
pub type IdxTuple = SmallVec<[usize; 8]>;

/// Returns the number of monomials in `dims` variables with total degree at
/// most `degree`, i.e. C(degree + dims, dims).
///
/// # Examples
///
/// ```
/// # use ratfit::terms::term_count;
/// #
/// assert_eq!(term_count(1, 4), 5);
/// assert_eq!(term_count(2, 2), 6);
/// assert_eq!(term_count(3, 1), 4);
/// ```
pub fn term_count(dims: usize, degree: usize) -> usize {
    let mut numer: u128 = 1;
    let mut denom: u128 = 1;

    for k in 1..=dims {
        numer *= (degree + k) as u128;
        denom *= k as u128;
    }

    (numer / denom) as usize
}

/// Returns the total degree of the monomial at index `i`: the smallest `d`
/// with `term_count(dims, d) > i`.
pub fn degree_of(dims: usize, i: usize) -> usize {
    if dims == 1 {
        return i;
    }

    let mut d = 0;

    while term_count(dims, d) <= i {
        d += 1;
    }

    d
}

/// Returns the smallest index whose monomial has total degree `degree`.
///
/// All indices below it have a strictly smaller degree, so this is just the
/// count of monomials with degree at most `degree - 1`.
pub fn first_index_of_degree(dims: usize, degree: usize) -> usize {
    if degree == 0 {
        0
    } else {
        term_count(dims, degree - 1)
    }
}

/// Returns the exponent tuple of every monomial with total degree at most
/// `degree`, in canonical index order.
pub fn exponents(dims: usize, degree: usize) -> Vec<Vec<u32>> {
    let mut out = Vec::with_capacity(term_count(dims, degree));
    let mut exp = vec![0u32; dims];

    for d in 0..=degree {
        fill(&mut exp, dims - 1, d, &mut out);
    }

    out
}

/// Enumerates the exponents of total degree `remaining` over positions
/// `0..=pos`, slowest-varying position first.
fn fill(exp: &mut [u32], pos: usize, remaining: usize, out: &mut Vec<Vec<u32>>) {
    if pos == 0 {
        exp[0] = remaining as u32;
        out.push(exp.to_vec());
        return;
    }

    for e in 0..=remaining {
        exp[pos] = e as u32;
        fill(exp, pos - 1, remaining - e, out);
    }

    exp[pos] = 0;
}

/// Growable memo of `degree_of`, for hot loops that probe indices
/// repeatedly.
pub struct DegreeTable {
    dims: usize,
    degrees: Vec<usize>,
    next_degree: usize,
}

impl DegreeTable {
    pub fn new(dims: usize) -> DegreeTable {
        DegreeTable {
            dims,
            degrees: Vec::new(),
            next_degree: 0,
        }
    }

    pub fn degree_of(&mut self, i: usize) -> usize {
        if self.dims == 1 {
            return i;
        }

        while self.degrees.len() <= i {
            let d = self.next_degree;
            let upto = term_count(self.dims, d);

            self.degrees.resize(upto, d);
            self.next_degree += 1;
        }

        self.degrees[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_degrees() {
        for dims in 1..=3 {
            for degree in 0..=8 {
                let below = if degree == 0 {
                    0
                } else {
                    term_count(dims, degree - 1)
                };
                let at = term_count(dims, degree);

                let found = (0..at)
                    .filter(|&i| degree_of(dims, i) == degree)
                    .count();

                assert_eq!(at - below, found, "dims {dims} degree {degree}");
            }
        }
    }

    #[test]
    fn first_index_inverts_degree() {
        for dims in 1..=3 {
            for degree in 0..=8 {
                let first = first_index_of_degree(dims, degree);

                assert_eq!(degree_of(dims, first), degree);

                if first > 0 {
                    assert_eq!(degree_of(dims, first - 1), degree - 1);
                }
            }
        }
    }

    #[test]
    fn exponent_ordering() {
        assert_eq!(
            exponents(2, 2),
            [[0, 0], [1, 0], [0, 1], [2, 0], [1, 1], [0, 2]]
        );

        assert_eq!(
            exponents(3, 1),
            [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]]
        );
    }

    #[test]
    fn exponent_degrees_match_index_degrees() {
        for dims in 1..=3 {
            for (i, exps) in exponents(dims, 5).iter().enumerate() {
                let total: u32 = exps.iter().sum();

                assert_eq!(degree_of(dims, i), total as usize);
            }
        }
    }

    #[test]
    fn degree_table_agrees() {
        for dims in 1..=3 {
            let mut table = DegreeTable::new(dims);

            for i in 0..100 {
                assert_eq!(table.degree_of(i), degree_of(dims, i));
            }
        }
    }
}

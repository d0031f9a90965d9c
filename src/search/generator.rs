//! Enumeration of candidate term-subsets in increasing cost order.
//!
//! The cost of an index tuple is a heuristic operation count:
//!
//! ```text
//! cost = dims * degree_of(max idx) + 2 * len - 1
//! ```
//!
//! degree-many operations to build the powers, two per active term, minus
//! one so the cheapest tuple `(0,)` costs 1. Cost is fully determined by a
//! tuple's length and greatest index, which is what makes enumeration at a
//! fixed cost tractable.

use std::collections::HashMap;
use std::iter;
use std::rc::Rc;

use itertools::Itertools;

use crate::terms::{first_index_of_degree, DegreeTable, IdxTuple};

/// A numerator/denominator pair of index tuples to fit.
pub type Candidate = (IdxTuple, IdxTuple);

/// Costs below this bound are memoized; the tuple lists are small and
/// revisited constantly while pairing numerators with denominators.
const CACHE_BOUND: usize = 20;

/// Computes the cost of an index tuple.
pub fn tuple_cost(dims: usize, idxs: &[usize]) -> usize {
    let max = idxs[idxs.len() - 1];

    dims * crate::terms::degree_of(dims, max) + 2 * idxs.len() - 1
}

/// Enumerates index tuples for a fixed variable count, cheapest first.
///
/// `blitz` trades completeness for speed: a positive value skips tuples
/// whose greatest index is disproportionate to their length, structures
/// that rarely fit well but dominate the candidate count at high cost.
/// Zero is exhaustive.
pub struct IdxGenerator {
    dims: usize,
    blitz: f64,
    degrees: DegreeTable,
    cache: HashMap<usize, Rc<Vec<IdxTuple>>>,
}

impl IdxGenerator {
    /// # Panics
    ///
    /// Panics if `dims` is zero.
    pub fn new(dims: usize, blitz: f64) -> IdxGenerator {
        assert!(dims >= 1);

        IdxGenerator {
            dims,
            blitz,
            degrees: DegreeTable::new(dims),
            cache: HashMap::new(),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// All index tuples with exactly the given cost, ordered by descending
    /// length and then ascending greatest index.
    pub fn at_cost(&mut self, cost: usize) -> Rc<Vec<IdxTuple>> {
        if cost >= CACHE_BOUND {
            return Rc::new(self.compute_at_cost(cost));
        }

        if let Some(hit) = self.cache.get(&cost) {
            return Rc::clone(hit);
        }

        let computed = Rc::new(self.compute_at_cost(cost));

        self.cache.insert(cost, Rc::clone(&computed));
        computed
    }

    fn compute_at_cost(&mut self, cost: usize) -> Vec<IdxTuple> {
        let dims = self.dims;
        let mut out = Vec::new();

        // The cheapest tuple of a given length is (0, 1, ..., len - 1);
        // find the longest length still affordable.
        let mut longest = 0;

        while dims * self.degrees.degree_of(longest) + 2 * (longest + 1) - 1
            <= cost
        {
            longest += 1;
        }

        for length in (1..=longest).rev() {
            // Solve the cost equation for the degree of the greatest
            // index; not every length admits a solution.
            let rem = cost + 1 - 2 * length;

            if rem % dims != 0 {
                continue;
            }

            let mut last = first_index_of_degree(dims, rem / dims);

            while dims * self.degrees.degree_of(last) + 2 * length - 1
                == cost
            {
                if self.blitz > 0.0
                    && last as f64 / dims as f64
                        > (1.0 + 1.0 / self.blitz) * length as f64
                {
                    break;
                }

                for combo in (0..last).combinations(length - 1) {
                    let mut tuple: IdxTuple = combo.into_iter().collect();

                    tuple.push(last);
                    out.push(tuple);
                }

                last += 1;
            }
        }

        out
    }

    /// All index tuples with a cost in `min_cost..=max_cost`, preserving
    /// per-cost order. Each tuple is returned with its cost.
    pub fn all_idxs(
        &mut self,
        min_cost: usize,
        max_cost: usize,
    ) -> Vec<(IdxTuple, usize)> {
        let mut out = Vec::new();

        for cost in min_cost..=max_cost {
            for tuple in self.at_cost(cost).iter() {
                out.push((tuple.clone(), cost));
            }
        }

        out
    }

    /// The default candidate stream: every (numerator, denominator) pair,
    /// in non-decreasing combined-cost order, starting at `starting_cost`.
    ///
    /// An early stop on this stream therefore returns the cheapest
    /// adequate structure found, not merely the first.
    pub fn infinite(self, starting_cost: usize) -> Infinite {
        Infinite::new(self, starting_cost)
    }
}

/// Single fixed-pair stream, for re-fitting a known structure.
pub fn just(
    p_idxs: impl Into<IdxTuple>,
    q_idxs: impl Into<IdxTuple>,
) -> iter::Once<Candidate> {
    iter::once((p_idxs.into(), q_idxs.into()))
}

/// Iterator over candidate pairs in non-decreasing combined-cost order.
pub struct Infinite {
    gen: IdxGenerator,
    /// Current combined cost level.
    cost: usize,
    /// Numerator sub-cost cursor within the level, exclusive end.
    p_cost: usize,
    p_cost_end: usize,
    p_list: Rc<Vec<IdxTuple>>,
    p_pos: usize,
    q_list: Rc<Vec<IdxTuple>>,
    q_pos: usize,
}

impl Infinite {
    fn new(mut gen: IdxGenerator, starting_cost: usize) -> Infinite {
        let cost = starting_cost.max(2);
        let (p_cost, p_cost_end) = Self::p_cost_range(cost, gen.blitz);

        let (p_list, q_list) = if p_cost < p_cost_end {
            (gen.at_cost(p_cost), gen.at_cost(cost - p_cost))
        } else {
            (Rc::new(Vec::new()), Rc::new(Vec::new()))
        };

        Infinite {
            gen,
            cost,
            p_cost,
            p_cost_end,
            p_list,
            p_pos: 0,
            q_list,
            q_pos: 0,
        }
    }

    /// Splits a combined cost into the numerator sub-cost range. With
    /// pruning enabled the range is biased toward similar numerator and
    /// denominator costs, where accurate approximations are more likely.
    fn p_cost_range(cost: usize, blitz: f64) -> (usize, usize) {
        let mut max_cost = cost - 1;
        let mut min_cost = 1;

        if blitz > 0.0 {
            min_cost = (max_cost as f64 / (2.0 + 1.0 / blitz)) as usize;
            max_cost -= min_cost;
        }

        (min_cost, max_cost + 1)
    }

    fn advance(&mut self) {
        self.p_cost += 1;

        if self.p_cost >= self.p_cost_end {
            self.cost += 1;
            log::trace!("advancing to cost level {}", self.cost);

            let (min, end) = Self::p_cost_range(self.cost, self.gen.blitz);

            self.p_cost = min;
            self.p_cost_end = end;
        }

        if self.p_cost < self.p_cost_end {
            self.p_list = self.gen.at_cost(self.p_cost);
            self.q_list = self.gen.at_cost(self.cost - self.p_cost);
        } else {
            self.p_list = Rc::new(Vec::new());
            self.q_list = Rc::new(Vec::new());
        }

        self.p_pos = 0;
        self.q_pos = 0;
    }
}

impl Iterator for Infinite {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if self.p_pos < self.p_list.len()
                && self.q_pos < self.q_list.len()
            {
                let p = self.p_list[self.p_pos].clone();
                let q = self.q_list[self.q_pos].clone();

                self.q_pos += 1;

                if self.q_pos == self.q_list.len() {
                    self.q_pos = 0;
                    self.p_pos += 1;
                }

                // When neither side has a constant term, the lowest-order
                // variable divides both: (x + x^2) / x == 1 + x. Only
                // checked in one dimension.
                if self.gen.dims == 1 && p[0] != 0 && q[0] != 0 {
                    continue;
                }

                return Some((p, q));
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::degree_of;

    fn tuples(gen: &mut IdxGenerator, cost: usize) -> Vec<Vec<usize>> {
        gen.at_cost(cost).iter().map(|t| t.to_vec()).collect()
    }

    #[test]
    fn at_cost_ordering() {
        let mut gen = IdxGenerator::new(1, 0.0);

        assert_eq!(tuples(&mut gen, 1), [vec![0]]);
        assert_eq!(tuples(&mut gen, 4), [vec![0, 1], vec![3]]);
        assert_eq!(
            tuples(&mut gen, 5),
            [vec![0, 2], vec![1, 2], vec![4]]
        );
    }

    #[test]
    fn cost_equation_holds_exactly() {
        for dims in 1..=3 {
            for blitz in [0.0, 1.0] {
                let mut gen = IdxGenerator::new(dims, blitz);

                for cost in 1..=14 {
                    for tuple in gen.at_cost(cost).iter() {
                        assert_eq!(
                            tuple_cost(dims, tuple),
                            cost,
                            "dims {dims} blitz {blitz} tuple {tuple:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn at_cost_is_sorted_by_length_then_max() {
        let mut gen = IdxGenerator::new(2, 0.0);

        for cost in 1..=12 {
            let list = gen.at_cost(cost);

            for pair in list.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);

                assert!(
                    a.len() > b.len()
                        || (a.len() == b.len()
                            && a[a.len() - 1] <= b[b.len() - 1])
                );
            }
        }
    }

    #[test]
    fn tuples_are_strictly_increasing() {
        let mut gen = IdxGenerator::new(3, 0.0);

        for cost in 1..=12 {
            for tuple in gen.at_cost(cost).iter() {
                for pair in tuple.windows(2) {
                    assert!(pair[0] < pair[1]);
                }
            }
        }
    }

    #[test]
    fn cache_is_transparent() {
        let mut warm = IdxGenerator::new(2, 0.5);
        let mut cold = IdxGenerator::new(2, 0.5);

        // Populate the cache, then compare against fresh runs.
        for cost in 1..=10 {
            warm.at_cost(cost);
        }

        for cost in 1..=10 {
            assert_eq!(tuples(&mut warm, cost), tuples(&mut cold, cost));
        }
    }

    #[test]
    fn blitz_yields_a_subset() {
        let mut full = IdxGenerator::new(1, 0.0);
        let mut pruned = IdxGenerator::new(1, 2.0);

        for cost in 1..=14 {
            let full = tuples(&mut full, cost);

            for tuple in tuples(&mut pruned, cost) {
                assert!(full.contains(&tuple), "cost {cost}: {tuple:?}");
            }
        }
    }

    #[test]
    fn all_idxs_spans_the_range() {
        let mut gen = IdxGenerator::new(1, 0.0);
        let all = gen.all_idxs(1, 6);

        let mut previous = 1;

        for (tuple, cost) in &all {
            assert!(*cost >= previous);
            assert_eq!(tuple_cost(1, tuple), *cost);
            previous = *cost;
        }
    }

    #[test]
    fn infinite_cost_is_non_decreasing() {
        for dims in 1..=2 {
            for blitz in [0.0, 1.0] {
                let gen = IdxGenerator::new(dims, blitz);
                let mut previous = 0;

                for (p, q) in gen.infinite(2).take(300) {
                    let combined =
                        tuple_cost(dims, &p) + tuple_cost(dims, &q);

                    assert!(
                        combined >= previous,
                        "dims {dims} blitz {blitz}: {p:?} / {q:?}"
                    );
                    previous = combined;
                }
            }
        }
    }

    #[test]
    fn infinite_starts_with_the_constant_pair() {
        let gen = IdxGenerator::new(1, 0.0);
        let first: Vec<Candidate> = gen.infinite(2).take(3).collect();

        let expected = [
            (vec![0], vec![0]),
            (vec![0], vec![1]),
            (vec![1], vec![0]),
        ];

        for ((p, q), (ep, eq)) in first.iter().zip(&expected) {
            assert_eq!(p.to_vec(), *ep);
            assert_eq!(q.to_vec(), *eq);
        }
    }

    #[test]
    fn infinite_skips_common_factors_in_one_dim() {
        let gen = IdxGenerator::new(1, 0.0);

        for (p, q) in gen.infinite(2).take(500) {
            assert!(p[0] == 0 || q[0] == 0, "{p:?} / {q:?}");
        }
    }

    #[test]
    fn degrees_match_the_free_function() {
        let mut gen = IdxGenerator::new(2, 0.0);

        for cost in 1..=10 {
            for tuple in gen.at_cost(cost).iter() {
                let max = tuple[tuple.len() - 1];

                assert_eq!(
                    2 * degree_of(2, max) + 2 * tuple.len() - 1,
                    cost
                );
            }
        }
    }

    #[test]
    fn just_yields_once() {
        let mut stream = just([0, 1, 2].as_slice(), [0].as_slice());

        let (p, q) = stream.next().unwrap();

        assert_eq!(p.to_vec(), [0, 1, 2]);
        assert_eq!(q.to_vec(), [0]);
        assert!(stream.next().is_none());
    }
}

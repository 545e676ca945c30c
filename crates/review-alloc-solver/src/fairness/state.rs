// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use review_alloc_core::prelude::Matrix;
use review_alloc_model::{
    common::{PaperIndex, ReviewerIndex},
    prelude::MatchingProblem,
    solution::AssignmentMatrix,
};

/// Mutable working state of the picking sequence. Owns private copies of
/// everything it mutates; the caller-supplied problem stays untouched.
#[derive(Debug, Clone)]
pub(crate) struct AllocationState<'p> {
    problem: &'p MatchingProblem,
    /// Affinity view of the cost matrix (negated costs); forbidden cells
    /// hold zero and are excluded from the ranked lists.
    value: Matrix<f64>,
    /// Reviewers currently held by each paper.
    bundles: Vec<Vec<ReviewerIndex>>,
    /// Papers currently served by each reviewer.
    assigned_to: Vec<Vec<PaperIndex>>,
    remaining_capacity: Vec<usize>,
    load: Vec<usize>,
    /// Lowest attained affinity per paper; infinity while the bundle is
    /// empty.
    threshold: Vec<f64>,
    /// Per-paper candidate reviewers, descending affinity.
    ranked: Vec<Vec<ReviewerIndex>>,
    remaining_demand: Vec<usize>,
}

impl<'p> AllocationState<'p> {
    pub fn new(problem: &'p MatchingProblem) -> Self {
        let num_reviewers = problem.num_reviewers();
        let num_papers = problem.num_papers();
        let constraint = problem.constraint();

        let mut value = Matrix::zeros(num_reviewers, num_papers);
        for r in 0..num_reviewers {
            for p in 0..num_papers {
                let (reviewer, paper) = (ReviewerIndex(r), PaperIndex(p));
                if !constraint.is_forbidden(reviewer, paper) {
                    value.set(r, p, -problem.cost().at(reviewer, paper));
                }
            }
        }

        let mut ranked = Vec::with_capacity(num_papers);
        for p in 0..num_papers {
            let mut candidates: Vec<ReviewerIndex> = (0..num_reviewers)
                .map(ReviewerIndex)
                .filter(|&r| !constraint.is_forbidden(r, PaperIndex(p)))
                .collect();
            candidates.sort_by(|&a, &b| {
                value
                    .at(b.0, p)
                    .partial_cmp(&value.at(a.0, p))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            ranked.push(candidates);
        }

        Self {
            problem,
            value,
            bundles: vec![Vec::new(); num_papers],
            assigned_to: vec![Vec::new(); num_reviewers],
            remaining_capacity: problem.bounds().maximums().to_vec(),
            load: vec![0; num_reviewers],
            threshold: vec![f64::INFINITY; num_papers],
            ranked,
            remaining_demand: problem.bounds().demands().to_vec(),
        }
    }

    #[inline]
    pub fn problem(&self) -> &'p MatchingProblem {
        self.problem
    }

    #[inline]
    pub fn value(&self, r: ReviewerIndex, p: PaperIndex) -> f64 {
        self.value.at(r.0, p.0)
    }

    #[inline]
    pub fn threshold(&self, p: PaperIndex) -> f64 {
        self.threshold[p.0]
    }

    #[inline]
    pub fn load(&self, r: ReviewerIndex) -> usize {
        self.load[r.0]
    }

    #[inline]
    pub fn remaining_capacity(&self, r: ReviewerIndex) -> usize {
        self.remaining_capacity[r.0]
    }

    #[inline]
    pub fn remaining_demand(&self, p: PaperIndex) -> usize {
        self.remaining_demand[p.0]
    }

    #[inline]
    pub fn bundle(&self, p: PaperIndex) -> &[ReviewerIndex] {
        &self.bundles[p.0]
    }

    #[inline]
    pub fn papers_of(&self, r: ReviewerIndex) -> &[PaperIndex] {
        &self.assigned_to[r.0]
    }

    #[inline]
    pub fn ranked(&self, p: PaperIndex) -> &[ReviewerIndex] {
        &self.ranked[p.0]
    }

    #[inline]
    pub fn in_bundle(&self, r: ReviewerIndex, p: PaperIndex) -> bool {
        self.bundles[p.0].contains(&r)
    }

    /// Capacity, conflict and duplicate admissibility; fairness checks are
    /// layered on top by the solver.
    #[inline]
    pub fn is_admissible_basic(&self, r: ReviewerIndex, p: PaperIndex) -> bool {
        self.remaining_capacity[r.0] > 0
            && !self.in_bundle(r, p)
            && !self.problem.constraint().is_forbidden(r, p)
    }

    pub fn assign(&mut self, r: ReviewerIndex, p: PaperIndex) {
        debug_assert!(self.remaining_capacity[r.0] > 0);
        debug_assert!(self.remaining_demand[p.0] > 0);
        debug_assert!(!self.in_bundle(r, p));
        self.bundles[p.0].push(r);
        self.assigned_to[r.0].push(p);
        self.remaining_capacity[r.0] -= 1;
        self.load[r.0] += 1;
        self.remaining_demand[p.0] -= 1;
        let v = self.value(r, p);
        if v < self.threshold[p.0] {
            self.threshold[p.0] = v;
        }
    }

    /// Removes a committed pair without touching the paper's demand
    /// bookkeeping beyond restoring one open slot. Used by trades, which
    /// immediately refill the slot.
    pub fn unassign(&mut self, r: ReviewerIndex, p: PaperIndex) {
        debug_assert!(self.in_bundle(r, p));
        self.bundles[p.0].retain(|&rr| rr != r);
        self.assigned_to[r.0].retain(|&pp| pp != p);
        self.remaining_capacity[r.0] += 1;
        self.load[r.0] -= 1;
        self.remaining_demand[p.0] += 1;
        self.threshold[p.0] = self.bundles[p.0]
            .iter()
            .map(|&rr| self.value.at(rr.0, p.0))
            .fold(f64::INFINITY, f64::min);
    }

    /// Value the evaluating paper places on another paper's current bundle.
    pub fn bundle_value_for(&self, owner: PaperIndex, evaluator: PaperIndex) -> f64 {
        self.bundles[owner.0]
            .iter()
            .map(|&r| self.value.at(r.0, evaluator.0))
            .sum()
    }

    #[inline]
    pub fn own_value(&self, p: PaperIndex) -> f64 {
        self.bundle_value_for(p, p)
    }

    pub fn total_remaining_demand(&self) -> usize {
        self.remaining_demand.iter().sum()
    }

    pub fn unmet_minimum(&self, r: ReviewerIndex) -> usize {
        self.problem
            .bounds()
            .minimum(r)
            .saturating_sub(self.load[r.0])
    }

    pub fn total_unmet_minimums(&self) -> usize {
        (0..self.load.len())
            .map(|r| self.unmet_minimum(ReviewerIndex(r)))
            .sum()
    }

    /// Restriction policy: once every remaining slot is owed to reviewer
    /// minimums, clamp capacities so no other reviewer can absorb them.
    pub fn clamp_to_unmet_minimums(&mut self) {
        for r in 0..self.remaining_capacity.len() {
            self.remaining_capacity[r] = self.unmet_minimum(ReviewerIndex(r));
        }
    }

    /// Affinity of the best basically-admissible candidate, used for
    /// priority tie-breaking. Negative infinity when none remains.
    pub fn best_available_affinity(&self, p: PaperIndex) -> f64 {
        self.ranked[p.0]
            .iter()
            .copied()
            .find(|&r| self.is_admissible_basic(r, p))
            .map(|r| self.value(r, p))
            .unwrap_or(f64::NEG_INFINITY)
    }

    pub fn into_assignment(self) -> AssignmentMatrix {
        let mut assignment =
            AssignmentMatrix::zeros(self.problem.num_reviewers(), self.problem.num_papers());
        for (p, bundle) in self.bundles.iter().enumerate() {
            for &r in bundle {
                assignment.set(r, PaperIndex(p), 1.0);
            }
        }
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_alloc_model::prelude::{
        Bounds, ConstraintMatrix, CostMatrix, MatchingProblemBuilder,
    };

    #[inline]
    fn ri(n: usize) -> ReviewerIndex {
        ReviewerIndex(n)
    }
    #[inline]
    fn pi(n: usize) -> PaperIndex {
        PaperIndex(n)
    }

    use review_alloc_model::prelude::MatchingProblem;

    fn problem() -> MatchingProblem {
        // Affinities (negated costs): r0 = [3, 1], r1 = [2, 4].
        MatchingProblemBuilder::new(
            Bounds::new(vec![0, 0], vec![2, 2], vec![1, 1]),
            CostMatrix::from_rows(vec![vec![-3.0, -1.0], vec![-2.0, -4.0]]),
            ConstraintMatrix::unconstrained(2, 2),
        )
        .build()
        .unwrap()
    }


    #[test]
    fn test_ranked_lists_descending_affinity() {
        let problem = problem();
        let state = AllocationState::new(&problem);
        assert_eq!(state.ranked(pi(0)), &[ri(0), ri(1)]);
        assert_eq!(state.ranked(pi(1)), &[ri(1), ri(0)]);
    }

    #[test]
    fn test_assign_updates_threshold_capacity_and_demand() {
        let problem = problem();
        let mut state = AllocationState::new(&problem);
        assert!(state.threshold(pi(0)).is_infinite());
        state.assign(ri(0), pi(0));
        assert_eq!(state.threshold(pi(0)), 3.0);
        assert_eq!(state.remaining_capacity(ri(0)), 1);
        assert_eq!(state.remaining_demand(pi(0)), 0);
        assert_eq!(state.load(ri(0)), 1);
    }

    #[test]
    fn test_unassign_restores_state() {
        let problem = problem();
        let mut state = AllocationState::new(&problem);
        state.assign(ri(0), pi(0));
        state.unassign(ri(0), pi(0));
        assert!(state.threshold(pi(0)).is_infinite());
        assert_eq!(state.remaining_capacity(ri(0)), 2);
        assert_eq!(state.remaining_demand(pi(0)), 1);
        assert!(state.bundle(pi(0)).is_empty());
    }

    #[test]
    fn test_bundle_value_cross_evaluation() {
        let problem = problem();
        let mut state = AllocationState::new(&problem);
        state.assign(ri(1), pi(1));
        // Paper 0 values paper 1's bundle {r1} at 2.
        assert_eq!(state.bundle_value_for(pi(1), pi(0)), 2.0);
        assert_eq!(state.own_value(pi(1)), 4.0);
    }

    #[test]
    fn test_clamp_to_unmet_minimums() {
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![1, 0], vec![2, 2], vec![1, 1]),
            CostMatrix::from_rows(vec![vec![-3.0, -1.0], vec![-2.0, -4.0]]),
            ConstraintMatrix::unconstrained(2, 2),
        )
        .build()
        .unwrap();
        let mut state = AllocationState::new(&problem);
        assert_eq!(state.total_unmet_minimums(), 1);
        state.clamp_to_unmet_minimums();
        assert_eq!(state.remaining_capacity(ri(0)), 1);
        assert_eq!(state.remaining_capacity(ri(1)), 0);
    }
}

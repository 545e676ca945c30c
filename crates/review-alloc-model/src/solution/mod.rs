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

pub mod err;

use crate::{
    common::{PaperIndex, ReviewerIndex},
    problem::{matrices::CostMatrix, prob::MatchingProblem},
    solution::err::{
        AssignmentValidationError, ConflictViolatedError, DemandNotMetError,
        ForcedPairMissingError, LoadOutOfBoundsError,
    },
};
use review_alloc_core::num::EPSILON;
use review_alloc_core::prelude::{Cost, Matrix};

/// Reviewer x paper assignment produced by a solver. Entries are 0/1 for the
/// deterministic solvers and fractional in [0, 1] for the randomized
/// solver's LP phase.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentMatrix(Matrix<f64>);

impl AssignmentMatrix {
    pub fn zeros(num_reviewers: usize, num_papers: usize) -> Self {
        Self(Matrix::zeros(num_reviewers, num_papers))
    }

    pub fn new(inner: Matrix<f64>) -> Self {
        Self(inner)
    }

    #[inline]
    pub fn num_reviewers(&self) -> usize {
        self.0.rows()
    }

    #[inline]
    pub fn num_papers(&self) -> usize {
        self.0.cols()
    }

    #[inline]
    pub fn at(&self, r: ReviewerIndex, p: PaperIndex) -> f64 {
        self.0.at(r.0, p.0)
    }

    #[inline]
    pub fn set(&mut self, r: ReviewerIndex, p: PaperIndex, value: f64) {
        self.0.set(r.0, p.0, value);
    }

    #[inline]
    pub fn is_assigned(&self, r: ReviewerIndex, p: PaperIndex) -> bool {
        self.at(r, p) > 0.5
    }

    #[inline]
    pub fn inner(&self) -> &Matrix<f64> {
        &self.0
    }

    /// Number of reviews carried by one reviewer.
    #[inline]
    pub fn reviewer_load(&self, r: ReviewerIndex) -> f64 {
        self.0.row_sum(r.0)
    }

    /// Number of reviewers realized for one paper.
    #[inline]
    pub fn paper_fill(&self, p: PaperIndex) -> f64 {
        self.0.col_sum(p.0)
    }

    pub fn iter_assigned(&self) -> impl Iterator<Item = (ReviewerIndex, PaperIndex)> + '_ {
        let cols = self.0.cols();
        self.0
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(_, &v)| v > 0.5)
            .map(move |(i, _)| (ReviewerIndex(i / cols), PaperIndex(i % cols)))
    }

    pub fn total_cost(&self, cost: &CostMatrix) -> Cost {
        let mut total = 0.0;
        for r in 0..self.num_reviewers() {
            for p in 0..self.num_papers() {
                total += self.0.at(r, p) * cost.at(ReviewerIndex(r), PaperIndex(p));
            }
        }
        total
    }

    /// Element-wise sum, used to merge the two phases of the min-then-max
    /// flow variant.
    pub fn merge(&self, other: &Self) -> Self {
        Self(self.0.add(&other.0))
    }

    /// Checks the solved-matrix invariants: every paper demand met exactly,
    /// every reviewer load inside its window, no forbidden cell realized.
    /// Returns the first violation found.
    pub fn validate(&self, problem: &MatchingProblem) -> Result<(), AssignmentValidationError> {
        let bounds = problem.bounds();
        for p in 0..self.num_papers() {
            let paper = PaperIndex(p);
            let filled = self.paper_fill(paper);
            let demand = bounds.demand(paper);
            if (filled - demand as f64).abs() > EPSILON {
                return Err(DemandNotMetError::new(paper, demand, filled).into());
            }
        }
        for r in 0..self.num_reviewers() {
            let reviewer = ReviewerIndex(r);
            let load = self.reviewer_load(reviewer);
            let lo = bounds.minimum(reviewer) as f64;
            let hi = bounds.maximum(reviewer) as f64;
            if load < lo - EPSILON || load > hi + EPSILON {
                return Err(LoadOutOfBoundsError::new(
                    reviewer,
                    bounds.minimum(reviewer),
                    bounds.maximum(reviewer),
                    load,
                )
                .into());
            }
        }
        for r in 0..self.num_reviewers() {
            for p in 0..self.num_papers() {
                let (reviewer, paper) = (ReviewerIndex(r), PaperIndex(p));
                if problem.constraint().is_forbidden(reviewer, paper)
                    && self.at(reviewer, paper) > EPSILON
                {
                    return Err(ConflictViolatedError::new(reviewer, paper).into());
                }
            }
        }
        Ok(())
    }

    /// Checks that every forced cell is fully realized. Split from
    /// [`AssignmentMatrix::validate`] because the randomized solver honors
    /// forced cells only up to their probability limit.
    pub fn validate_forced(
        &self,
        problem: &MatchingProblem,
    ) -> Result<(), AssignmentValidationError> {
        for (reviewer, paper) in problem.constraint().iter_forced() {
            if !self.is_assigned(reviewer, paper) {
                return Err(ForcedPairMissingError::new(reviewer, paper).into());
            }
        }
        Ok(())
    }
}

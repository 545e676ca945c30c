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

use crate::common::{PaperIndex, ReviewerIndex};
use review_alloc_core::prelude::{Cost, Matrix};

/// Hard per-cell rule overriding the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Constraint {
    /// Hard conflict; the pair must never be realized.
    Forbidden,
    #[default]
    Unconstrained,
    /// Lock; the pair must be included wherever feasible.
    Forced,
}

impl Constraint {
    #[inline]
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            -1 => Some(Constraint::Forbidden),
            0 => Some(Constraint::Unconstrained),
            1 => Some(Constraint::Forced),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i8(self) -> i8 {
        match self {
            Constraint::Forbidden => -1,
            Constraint::Unconstrained => 0,
            Constraint::Forced => 1,
        }
    }
}

/// Reviewer x paper cost cells; lower is better. Built as a monotonically
/// decreasing transform of the aggregate affinity score, so minimizing total
/// cost maximizes total affinity.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix(Matrix<Cost>);

impl CostMatrix {
    pub fn new(inner: Matrix<Cost>) -> Self {
        Self(inner)
    }

    pub fn from_rows(rows: Vec<Vec<Cost>>) -> Self {
        Self(Matrix::from_rows(rows))
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
    pub fn at(&self, r: ReviewerIndex, p: PaperIndex) -> Cost {
        self.0.at(r.0, p.0)
    }

    #[inline]
    pub fn inner(&self) -> &Matrix<Cost> {
        &self.0
    }

    /// Smallest cell cost observed in the matrix, or zero for an empty
    /// matrix.
    pub fn min_cell(&self) -> Cost {
        let min = self
            .0
            .as_slice()
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            min
        } else {
            0.0
        }
    }
}

/// Reviewer x paper constraint cells. Same shape as the cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintMatrix(Matrix<Constraint>);

impl ConstraintMatrix {
    pub fn new(inner: Matrix<Constraint>) -> Self {
        Self(inner)
    }

    pub fn unconstrained(num_reviewers: usize, num_papers: usize) -> Self {
        Self(Matrix::filled(
            num_reviewers,
            num_papers,
            Constraint::Unconstrained,
        ))
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
    pub fn at(&self, r: ReviewerIndex, p: PaperIndex) -> Constraint {
        self.0.at(r.0, p.0)
    }

    #[inline]
    pub fn set(&mut self, r: ReviewerIndex, p: PaperIndex, c: Constraint) {
        self.0.set(r.0, p.0, c);
    }

    #[inline]
    pub fn is_forbidden(&self, r: ReviewerIndex, p: PaperIndex) -> bool {
        self.at(r, p) == Constraint::Forbidden
    }

    #[inline]
    pub fn is_forced(&self, r: ReviewerIndex, p: PaperIndex) -> bool {
        self.at(r, p) == Constraint::Forced
    }

    #[inline]
    pub fn inner(&self) -> &Matrix<Constraint> {
        &self.0
    }

    pub fn iter_forced(&self) -> impl Iterator<Item = (ReviewerIndex, PaperIndex)> + '_ {
        let cols = self.0.cols();
        self.0
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == Constraint::Forced)
            .map(move |(i, _)| (ReviewerIndex(i / cols), PaperIndex(i % cols)))
    }
}

/// Upper bound on the marginal probability that a pair is realized.
/// Consumed only by the randomized solver; defaults to one everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityLimitMatrix(Matrix<f64>);

impl ProbabilityLimitMatrix {
    pub fn new(inner: Matrix<f64>) -> Self {
        Self(inner)
    }

    pub fn uniform(num_reviewers: usize, num_papers: usize, limit: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&limit));
        Self(Matrix::filled(num_reviewers, num_papers, limit))
    }

    pub fn ones(num_reviewers: usize, num_papers: usize) -> Self {
        Self::uniform(num_reviewers, num_papers, 1.0)
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
}

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

use crate::problem::{
    bounds::Bounds,
    err::{MatrixShapeError, ProblemBuildError},
    matrices::{ConstraintMatrix, CostMatrix, ProbabilityLimitMatrix},
};

/// One validated matching instance. Solvers borrow it immutably and never
/// mutate the matrices in place; derived working state lives in solver-local
/// buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingProblem {
    bounds: Bounds,
    cost: CostMatrix,
    constraint: ConstraintMatrix,
    probability_limit: Option<ProbabilityLimitMatrix>,
}

impl MatchingProblem {
    #[inline]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    #[inline]
    pub fn cost(&self) -> &CostMatrix {
        &self.cost
    }

    #[inline]
    pub fn constraint(&self) -> &ConstraintMatrix {
        &self.constraint
    }

    #[inline]
    pub fn probability_limit(&self) -> Option<&ProbabilityLimitMatrix> {
        self.probability_limit.as_ref()
    }

    #[inline]
    pub fn num_reviewers(&self) -> usize {
        self.bounds.num_reviewers()
    }

    #[inline]
    pub fn num_papers(&self) -> usize {
        self.bounds.num_papers()
    }
}

#[derive(Debug, Clone)]
pub struct MatchingProblemBuilder {
    bounds: Bounds,
    cost: CostMatrix,
    constraint: ConstraintMatrix,
    probability_limit: Option<ProbabilityLimitMatrix>,
}

impl MatchingProblemBuilder {
    pub fn new(bounds: Bounds, cost: CostMatrix, constraint: ConstraintMatrix) -> Self {
        Self {
            bounds,
            cost,
            constraint,
            probability_limit: None,
        }
    }

    pub fn with_probability_limit(mut self, limit: ProbabilityLimitMatrix) -> Self {
        self.probability_limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<MatchingProblem, ProblemBuildError> {
        self.bounds.validate_arity()?;
        self.bounds.validate_windows()?;
        self.bounds.validate_supply()?;

        let rows = self.bounds.num_reviewers();
        let cols = self.bounds.num_papers();
        check_shape(rows, cols, self.cost.num_reviewers(), self.cost.num_papers())?;
        check_shape(
            rows,
            cols,
            self.constraint.num_reviewers(),
            self.constraint.num_papers(),
        )?;
        if let Some(limit) = &self.probability_limit {
            check_shape(rows, cols, limit.num_reviewers(), limit.num_papers())?;
        }

        Ok(MatchingProblem {
            bounds: self.bounds,
            cost: self.cost,
            constraint: self.constraint,
            probability_limit: self.probability_limit,
        })
    }
}

fn check_shape(
    expected_rows: usize,
    expected_cols: usize,
    actual_rows: usize,
    actual_cols: usize,
) -> Result<(), MatrixShapeError> {
    if expected_rows != actual_rows || expected_cols != actual_cols {
        return Err(MatrixShapeError::new(
            expected_rows,
            expected_cols,
            actual_rows,
            actual_cols,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::err::ProblemBuildError;

    fn cost_2x2() -> CostMatrix {
        CostMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]])
    }

    #[test]
    fn test_build_accepts_consistent_instance() {
        let bounds = Bounds::new(vec![0, 0], vec![2, 2], vec![1, 1]);
        let problem =
            MatchingProblemBuilder::new(bounds, cost_2x2(), ConstraintMatrix::unconstrained(2, 2))
                .build()
                .unwrap();
        assert_eq!(problem.num_reviewers(), 2);
        assert_eq!(problem.num_papers(), 2);
        assert!(problem.probability_limit().is_none());
    }

    #[test]
    fn test_build_rejects_supply_mismatch() {
        let bounds = Bounds::new(vec![0, 0], vec![1, 1], vec![2, 2]);
        let err =
            MatchingProblemBuilder::new(bounds, cost_2x2(), ConstraintMatrix::unconstrained(2, 2))
                .build()
                .unwrap_err();
        assert!(matches!(err, ProblemBuildError::SupplyDemandMismatch(_)));
    }

    #[test]
    fn test_build_rejects_shape_mismatch() {
        let bounds = Bounds::new(vec![0, 0, 0], vec![2, 2, 2], vec![1, 1]);
        let err =
            MatchingProblemBuilder::new(bounds, cost_2x2(), ConstraintMatrix::unconstrained(3, 2))
                .build()
                .unwrap_err();
        assert!(matches!(err, ProblemBuildError::MatrixShape(_)));
    }

    #[test]
    fn test_build_validates_probability_limit_shape() {
        let bounds = Bounds::new(vec![0, 0], vec![2, 2], vec![1, 1]);
        let err = MatchingProblemBuilder::new(
            bounds,
            cost_2x2(),
            ConstraintMatrix::unconstrained(2, 2),
        )
        .with_probability_limit(ProbabilityLimitMatrix::ones(3, 2))
        .build()
        .unwrap_err();
        assert!(matches!(err, ProblemBuildError::MatrixShape(_)));
    }
}

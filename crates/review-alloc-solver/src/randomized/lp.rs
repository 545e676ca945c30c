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

use crate::err::{InfeasibleConstraintsError, IntegralityViolationError, SolveError};
use good_lp::{
    default_solver, variable, variables, Expression, Solution as LpSolution, SolverModel, Variable,
};
use review_alloc_model::{
    common::{PaperIndex, ReviewerIndex},
    prelude::MatchingProblem,
    solution::AssignmentMatrix,
};

/// Scaling factor applied when checking that a basic-feasible solution is
/// exactly representable; one unit of probability becomes 10^7 ticks.
pub(crate) const LP_PRECISION: f64 = 1e7;

/// Allowed deviation of a scaled LP value from the nearest integer, in
/// ticks.
const INTEGRALITY_TOLERANCE: f64 = 1e-2;

/// Solves the probability-capped relaxation: variables `x[r,p]` range over
/// `[0, limit]` (pinned to the limit for forced cells, absent for forbidden
/// ones), every paper's column sums to its demand, every reviewer's row
/// stays inside its load window, and total cost is minimized. Values are
/// snapped onto the tick grid before being returned; a value off the grid
/// is reported as an integrality violation.
pub(crate) fn solve_fractional(problem: &MatchingProblem) -> Result<AssignmentMatrix, SolveError> {
    let num_reviewers = problem.num_reviewers();
    let num_papers = problem.num_papers();
    let bounds = problem.bounds();
    let constraint = problem.constraint();

    let mut vars = variables!();
    let mut grid: Vec<Vec<Option<Variable>>> = vec![vec![None; num_papers]; num_reviewers];
    for r in 0..num_reviewers {
        for p in 0..num_papers {
            let (reviewer, paper) = (ReviewerIndex(r), PaperIndex(p));
            if constraint.is_forbidden(reviewer, paper) {
                continue;
            }
            let limit = problem
                .probability_limit()
                .map(|m| m.at(reviewer, paper))
                .unwrap_or(1.0);
            let low = if constraint.is_forced(reviewer, paper) {
                limit
            } else {
                0.0
            };
            grid[r][p] = Some(vars.add(variable().min(low).max(limit)));
        }
    }

    let objective = grid
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(p, var)| var.map(|v| (r, p, v)))
        })
        .fold(Expression::from(0.0), |acc, (r, p, var)| {
            acc + problem.cost().at(ReviewerIndex(r), PaperIndex(p)) * var
        });

    let mut model = vars.minimise(objective).using(default_solver);
    for p in 0..num_papers {
        let sum = (0..num_reviewers)
            .filter_map(|r| grid[r][p])
            .fold(Expression::from(0.0), |acc, var| acc + var);
        model.add_constraint(sum.eq(bounds.demand(PaperIndex(p)) as f64));
    }
    for r in 0..num_reviewers {
        let reviewer = ReviewerIndex(r);
        let sum = (0..num_papers)
            .filter_map(|p| grid[r][p])
            .fold(Expression::from(0.0), |acc, var| acc + var);
        model.add_constraint(sum.clone().geq(bounds.minimum(reviewer) as f64));
        model.add_constraint(sum.leq(bounds.maximum(reviewer) as f64));
    }

    let solution = model.solve().map_err(|err| {
        SolveError::from(InfeasibleConstraintsError::new(format!(
            "probability-capped relaxation: {}",
            err
        )))
    })?;

    let mut fractional = AssignmentMatrix::zeros(num_reviewers, num_papers);
    for r in 0..num_reviewers {
        for p in 0..num_papers {
            let Some(var) = grid[r][p] else {
                continue;
            };
            let scaled = solution.value(var) * LP_PRECISION;
            let rounded = scaled.round();
            if (scaled - rounded).abs() > INTEGRALITY_TOLERANCE {
                return Err(
                    IntegralityViolationError::new(ReviewerIndex(r), PaperIndex(p), scaled).into(),
                );
            }
            fractional.set(ReviewerIndex(r), PaperIndex(p), rounded / LP_PRECISION);
        }
    }
    Ok(fractional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_alloc_model::prelude::{
        Bounds, Constraint, ConstraintMatrix, CostMatrix, MatchingProblemBuilder,
        ProbabilityLimitMatrix,
    };

    #[inline]
    fn ri(n: usize) -> ReviewerIndex {
        ReviewerIndex(n)
    }
    #[inline]
    fn pi(n: usize) -> PaperIndex {
        PaperIndex(n)
    }

    #[test]
    fn test_probability_caps_spread_mass() {
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0; 4], vec![1; 4], vec![2, 2]),
            CostMatrix::from_rows(vec![
                vec![-1.0, -0.1],
                vec![-1.0, -1.0],
                vec![-0.3, -0.6],
                vec![-0.5, -0.8],
            ]),
            ConstraintMatrix::unconstrained(4, 2),
        )
        .with_probability_limit(ProbabilityLimitMatrix::uniform(4, 2, 0.75))
        .build()
        .unwrap();

        let fractional = solve_fractional(&problem).unwrap();
        let expected = [
            [0.75, 0.25],
            [0.75, 0.25],
            [0.25, 0.75],
            [0.25, 0.75],
        ];
        for (r, row) in expected.iter().enumerate() {
            for (p, &want) in row.iter().enumerate() {
                assert!(
                    (fractional.at(ri(r), pi(p)) - want).abs() < 1e-6,
                    "cell ({}, {}) = {}, want {}",
                    r,
                    p,
                    fractional.at(ri(r), pi(p)),
                    want
                );
            }
        }
    }

    #[test]
    fn test_forced_cell_pinned_to_limit() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 1);
        constraint.set(ri(0), pi(0), Constraint::Forced);
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0, 0], vec![1, 1], vec![1]),
            CostMatrix::from_rows(vec![vec![-1.0], vec![-2.0]]),
            constraint,
        )
        .with_probability_limit(ProbabilityLimitMatrix::uniform(2, 1, 0.6))
        .build()
        .unwrap();

        let fractional = solve_fractional(&problem).unwrap();
        assert!((fractional.at(ri(0), pi(0)) - 0.6).abs() < 1e-6);
        assert!((fractional.at(ri(0), pi(0)) + fractional.at(ri(1), pi(0)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_caps_below_demand_are_infeasible() {
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0], vec![1], vec![1]),
            CostMatrix::from_rows(vec![vec![-1.0]]),
            ConstraintMatrix::unconstrained(1, 1),
        )
        .with_probability_limit(ProbabilityLimitMatrix::uniform(1, 1, 0.5))
        .build()
        .unwrap();

        let result = solve_fractional(&problem);
        assert!(matches!(
            result,
            Err(SolveError::InfeasibleConstraints(_))
        ));
    }

    #[test]
    fn test_unit_limits_recover_integral_optimum() {
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0, 0], vec![1, 1], vec![1, 1]),
            CostMatrix::from_rows(vec![vec![0.0, 5.0], vec![5.0, 0.0]]),
            ConstraintMatrix::unconstrained(2, 2),
        )
        .build()
        .unwrap();

        let fractional = solve_fractional(&problem).unwrap();
        assert!((fractional.at(ri(0), pi(0)) - 1.0).abs() < 1e-6);
        assert!((fractional.at(ri(1), pi(1)) - 1.0).abs() < 1e-6);
    }
}

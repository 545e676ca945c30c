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

use crate::{
    deadline::Deadline,
    err::{DeadlineExceededError, SolveError},
    randomized::{bvn, lp},
    solver::{AssignmentSolver, Solution},
};
use rand::{Rng, RngCore};
use review_alloc_model::{
    common::{PaperIndex, ReviewerIndex},
    prelude::MatchingProblem,
    solution::AssignmentMatrix,
};

const ONE_TOLERANCE: f64 = 1e-9;

/// Two-stage randomized strategy: a probability-capped LP relaxation
/// followed by a matching-decomposition draw whose inclusion probabilities
/// reproduce the fractional optimum, so expected realized cost equals the
/// relaxation's objective value.
#[derive(Debug, Clone, Default)]
pub struct RandomizedSolver {
    deadline: Option<Deadline>,
}

impl RandomizedSolver {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fractional phase only; exposed so callers can reuse one relaxation
    /// across many draws.
    pub fn solve_fractional(
        &self,
        problem: &MatchingProblem,
    ) -> Result<AssignmentMatrix, SolveError> {
        problem.bounds().validate_supply()?;
        lp::solve_fractional(problem)
    }

    /// One draw from an already-computed fractional solution.
    pub fn sample(
        &self,
        problem: &MatchingProblem,
        fractional: &AssignmentMatrix,
        rng: &mut dyn RngCore,
    ) -> Result<AssignmentMatrix, SolveError> {
        bvn::sample_integral(problem, fractional, rng)
    }

    pub fn solve_with(
        &self,
        problem: &MatchingProblem,
        rng: &mut dyn RngCore,
    ) -> Result<Solution, SolveError> {
        let fractional = self.solve_fractional(problem)?;
        if let Some(deadline) = self.deadline {
            if deadline.expired() {
                return Err(DeadlineExceededError::new("randomized sampling").into());
            }
        }
        tracing::debug!(
            objective = fractional.total_cost(problem.cost()),
            "sampling integral assignment from relaxation"
        );
        let assignment = self.sample(problem, &fractional, rng)?;
        Ok(Solution::new(assignment, true))
    }

    /// Per-paper alternate reviewers. Every unrealized pair is exposed
    /// independently with probability `(limit - x) / (1 - x)` (zero for
    /// pairs at probability one), which keeps the combined chance of being
    /// assigned or exposed within the pair's probability limit. Exposed
    /// candidates are ranked by cost and cut to `top_n` per paper.
    pub fn sample_alternates(
        &self,
        problem: &MatchingProblem,
        fractional: &AssignmentMatrix,
        realized: &AssignmentMatrix,
        top_n: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Vec<ReviewerIndex>> {
        let mut alternates = Vec::with_capacity(problem.num_papers());
        for p in 0..problem.num_papers() {
            let paper = PaperIndex(p);
            let mut exposed: Vec<(f64, ReviewerIndex)> = Vec::new();
            for r in 0..problem.num_reviewers() {
                let reviewer = ReviewerIndex(r);
                if realized.is_assigned(reviewer, paper)
                    || problem.constraint().is_forbidden(reviewer, paper)
                {
                    continue;
                }
                let x = fractional.at(reviewer, paper);
                let limit = problem
                    .probability_limit()
                    .map(|m| m.at(reviewer, paper))
                    .unwrap_or(1.0);
                let exposure = if x >= 1.0 - ONE_TOLERANCE {
                    0.0
                } else {
                    ((limit - x) / (1.0 - x)).clamp(0.0, 1.0)
                };
                if exposure > 0.0 && rng.random::<f64>() < exposure {
                    exposed.push((problem.cost().at(reviewer, paper), reviewer));
                }
            }
            exposed.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.1 .0.cmp(&b.1 .0))
            });
            exposed.truncate(top_n);
            alternates.push(exposed.into_iter().map(|(_, reviewer)| reviewer).collect());
        }
        alternates
    }
}

impl AssignmentSolver for RandomizedSolver {
    fn name(&self) -> &str {
        "randomized"
    }

    fn solve(
        &self,
        problem: &MatchingProblem,
        rng: &mut dyn RngCore,
    ) -> Result<Solution, SolveError> {
        self.solve_with(problem, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use review_alloc_model::prelude::{
        Bounds, ConstraintMatrix, CostMatrix, MatchingProblemBuilder,
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

    fn capped_problem() -> MatchingProblem {
        MatchingProblemBuilder::new(
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
        .unwrap()
    }

    #[test]
    fn test_end_to_end_draw_is_feasible() {
        let problem = capped_problem();
        let solver = RandomizedSolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let solution = AssignmentSolver::solve(&solver, &problem, &mut rng).unwrap();
        assert!(solution.solved);
        solution.assignment.validate(&problem).unwrap();
    }

    #[test]
    fn test_alternates_exclude_realized_and_forbidden() {
        let problem = capped_problem();
        let solver = RandomizedSolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let fractional = solver.solve_fractional(&problem).unwrap();
        let realized = solver.sample(&problem, &fractional, &mut rng).unwrap();

        let alternates = solver.sample_alternates(&problem, &fractional, &realized, 2, &mut rng);
        assert_eq!(alternates.len(), 2);
        for (p, list) in alternates.iter().enumerate() {
            assert!(list.len() <= 2);
            for &reviewer in list {
                assert!(!realized.is_assigned(reviewer, pi(p)));
            }
        }
    }

    #[test]
    fn test_alternate_exposure_zero_for_saturated_pairs() {
        // x at the limit leaves no alternate headroom for that pair.
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0, 0], vec![1, 1], vec![1]),
            CostMatrix::from_rows(vec![vec![-2.0], vec![-1.0]]),
            ConstraintMatrix::unconstrained(2, 1),
        )
        .build()
        .unwrap();
        let solver = RandomizedSolver::new();
        let fractional = solver.solve_fractional(&problem).unwrap();
        assert!((fractional.at(ri(0), pi(0)) - 1.0).abs() < 1e-6);

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let realized = solver.sample(&problem, &fractional, &mut rng).unwrap();
        for _ in 0..20 {
            let alternates =
                solver.sample_alternates(&problem, &fractional, &realized, 5, &mut rng);
            // r1 has x = 0 and limit 1, so it may be exposed; r0 is
            // realized and never reappears.
            assert!(!alternates[0].contains(&ri(0)));
        }
    }
}

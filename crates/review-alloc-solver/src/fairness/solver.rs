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
    err::{
        DeadlineExceededError, InfeasibleConstraintsError, SolveError, TradingSearchExhaustedError,
    },
    fairness::{state::AllocationState, trading},
    solver::{AssignmentSolver, Solution},
};
use rand::RngCore;
use review_alloc_core::prelude::EPSILON;
use review_alloc_model::{
    common::{PaperIndex, ReviewerIndex},
    prelude::MatchingProblem,
};

/// Default hop bound of the trading-path fallback.
pub const DEFAULT_TRADE_DEPTH: usize = 7;

/// Whether candidate reviewers are screened by the WEF1 validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FairnessMode {
    /// Reject candidates whose assignment would introduce weighted envy
    /// beyond one item.
    #[default]
    Safe,
    /// Skip the envy check; the allocation carries no fairness guarantee.
    Unsafe,
}

/// What to do when the current paper has no admissible reviewer left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FallbackPolicy {
    /// Search for a bounded trading path that frees one slot.
    #[default]
    Trade,
    /// Fail immediately; the caller decides whether to retry unsafe.
    None,
}

/// Picking-sequence solver producing allocations that are weighted
/// envy-free up to one item. Papers pick in ascending fill-ratio order,
/// each taking its highest-affinity admissible reviewer; safe mode screens
/// every pick so no other paper starts envying the grown bundle.
///
/// The guarantee is stated per paper pair (i, j) with demands w_i, w_j:
/// `value_i(A_i)/w_i >= (value_i(A_j) - max item)/w_j` up to tolerance.
#[derive(Debug, Clone)]
pub struct FairnessSolver {
    mode: FairnessMode,
    fallback: FallbackPolicy,
    trade_depth: usize,
    tolerance: f64,
    deadline: Option<Deadline>,
}

impl Default for FairnessSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FairnessSolver {
    pub fn new() -> Self {
        Self {
            mode: FairnessMode::Safe,
            fallback: FallbackPolicy::Trade,
            trade_depth: DEFAULT_TRADE_DEPTH,
            tolerance: EPSILON,
            deadline: None,
        }
    }

    pub fn with_mode(mut self, mode: FairnessMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_trade_depth(mut self, depth: usize) -> Self {
        self.trade_depth = depth;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[inline]
    pub fn mode(&self) -> FairnessMode {
        self.mode
    }

    /// Runs the picking sequence to completion. Unlike the flow solver
    /// there is no best-effort outcome: a stuck sequence is an error.
    pub fn solve(&self, problem: &MatchingProblem) -> Result<Solution, SolveError> {
        problem.bounds().validate_supply()?;

        let mut state = AllocationState::new(problem);
        self.preassign_forced(problem, &mut state)?;

        let mut restricted = false;
        while state.total_remaining_demand() > 0 {
            if let Some(deadline) = self.deadline {
                if deadline.expired() {
                    return Err(DeadlineExceededError::new("fairness picking round").into());
                }
            }
            if !restricted && state.total_remaining_demand() == state.total_unmet_minimums() {
                tracing::debug!("restricting capacities to unmet reviewer minimums");
                state.clamp_to_unmet_minimums();
                restricted = true;
            }
            let Some(paper) = self.pick_paper(&state) else {
                break;
            };
            match self.pick_reviewer(&state, paper) {
                Some(reviewer) => state.assign(reviewer, paper),
                None => self.resolve_stuck(&mut state, paper)?,
            }
        }

        Ok(Solution::new(state.into_assignment(), true))
    }

    fn preassign_forced(
        &self,
        problem: &MatchingProblem,
        state: &mut AllocationState<'_>,
    ) -> Result<(), SolveError> {
        for (reviewer, paper) in problem.constraint().iter_forced() {
            if state.remaining_capacity(reviewer) == 0 || state.remaining_demand(paper) == 0 {
                return Err(InfeasibleConstraintsError::new(format!(
                    "forced pair ({}, {}) cannot be honored",
                    reviewer, paper
                ))
                .into());
            }
            state.assign(reviewer, paper);
        }
        Ok(())
    }

    /// Lowest fill-ratio paper with open demand, compared exactly by
    /// cross-multiplication. Ties go to the paper whose best available
    /// candidate offers the highest affinity, then to the lower index.
    fn pick_paper(&self, state: &AllocationState<'_>) -> Option<PaperIndex> {
        let bounds = state.problem().bounds();
        let mut best: Option<PaperIndex> = None;
        for p in 0..state.problem().num_papers() {
            let paper = PaperIndex(p);
            if state.remaining_demand(paper) == 0 {
                continue;
            }
            best = match best {
                None => Some(paper),
                Some(leader) => {
                    let fill_paper = bounds.demand(paper) - state.remaining_demand(paper);
                    let fill_leader = bounds.demand(leader) - state.remaining_demand(leader);
                    let lhs = fill_paper * bounds.demand(leader);
                    let rhs = fill_leader * bounds.demand(paper);
                    if lhs < rhs
                        || (lhs == rhs
                            && state.best_available_affinity(paper)
                                > state.best_available_affinity(leader))
                    {
                        Some(paper)
                    } else {
                        Some(leader)
                    }
                }
            };
        }
        best
    }

    fn pick_reviewer(
        &self,
        state: &AllocationState<'_>,
        paper: PaperIndex,
    ) -> Option<ReviewerIndex> {
        state.ranked(paper).iter().copied().find(|&reviewer| {
            state.is_admissible_basic(reviewer, paper)
                && (self.mode == FairnessMode::Unsafe
                    || self.preserves_wef1(state, reviewer, paper))
        })
    }

    /// WEF1 screen for adding `reviewer` to `paper`: any other paper whose
    /// attained-threshold lies below its value for the candidate is a
    /// potential envier; its per-unit value for the grown bundle, less the
    /// single best item, must not exceed its per-unit value for its own
    /// bundle.
    fn preserves_wef1(
        &self,
        state: &AllocationState<'_>,
        reviewer: ReviewerIndex,
        paper: PaperIndex,
    ) -> bool {
        let problem = state.problem();
        let bounds = problem.bounds();
        let owner_weight = bounds.demand(paper) as f64;

        for p in 0..problem.num_papers() {
            let other = PaperIndex(p);
            if other == paper || problem.constraint().is_forbidden(reviewer, other) {
                continue;
            }
            let candidate_value = state.value(reviewer, other);
            if state.threshold(other) >= candidate_value {
                continue;
            }

            let mut total = candidate_value;
            let mut best_item = candidate_value;
            for &held in state.bundle(paper) {
                let v = state.value(held, other);
                total += v;
                if v > best_item {
                    best_item = v;
                }
            }
            let projected = (total - best_item) / owner_weight;
            let own = state.own_value(other) / bounds.demand(other) as f64;
            if projected > own + self.tolerance {
                return false;
            }
        }
        true
    }

    /// The current paper has no admissible reviewer. A trading path, when
    /// allowed and found, reassigns committed reviewers along a chain and
    /// fills the paper from the freed slot; the trade itself is not
    /// re-screened for envy.
    fn resolve_stuck(
        &self,
        state: &mut AllocationState<'_>,
        paper: PaperIndex,
    ) -> Result<(), SolveError> {
        if self.fallback == FallbackPolicy::Trade {
            if let Some(path) = trading::find_trade(state, paper, self.trade_depth) {
                tracing::debug!(paper = paper.0, hops = path.len(), "applying trading path");
                for step in path {
                    if let Some(from) = step.from {
                        state.unassign(step.reviewer, from);
                    }
                    state.assign(step.reviewer, step.to);
                }
                return Ok(());
            }
        }
        match self.mode {
            FairnessMode::Safe => {
                Err(TradingSearchExhaustedError::new(paper, self.trade_depth).into())
            }
            FairnessMode::Unsafe => Err(InfeasibleConstraintsError::new(format!(
                "{} has no admissible reviewer",
                paper
            ))
            .into()),
        }
    }
}

impl AssignmentSolver for FairnessSolver {
    fn name(&self) -> &str {
        "fairness"
    }

    fn solve(
        &self,
        problem: &MatchingProblem,
        _rng: &mut dyn RngCore,
    ) -> Result<Solution, SolveError> {
        FairnessSolver::solve(self, problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_alloc_model::prelude::{
        Bounds, Constraint, ConstraintMatrix, CostMatrix, MatchingProblemBuilder,
    };

    #[inline]
    fn ri(n: usize) -> ReviewerIndex {
        ReviewerIndex(n)
    }
    #[inline]
    fn pi(n: usize) -> PaperIndex {
        PaperIndex(n)
    }

    fn build(
        minimums: Vec<usize>,
        maximums: Vec<usize>,
        demands: Vec<usize>,
        cost: Vec<Vec<f64>>,
        constraint: ConstraintMatrix,
    ) -> MatchingProblem {
        MatchingProblemBuilder::new(
            Bounds::new(minimums, maximums, demands),
            CostMatrix::from_rows(cost),
            constraint,
        )
        .build()
        .unwrap()
    }

    /// Checks the WEF1 inequality over all ordered paper pairs of a final
    /// allocation.
    fn assert_wef1(problem: &MatchingProblem, solution: &Solution) {
        let n_papers = problem.num_papers();
        let n_reviewers = problem.num_reviewers();
        let value = |r: usize, p: usize| {
            if problem.constraint().is_forbidden(ri(r), pi(p)) {
                0.0
            } else {
                -problem.cost().at(ri(r), pi(p))
            }
        };
        for i in 0..n_papers {
            for j in 0..n_papers {
                if i == j {
                    continue;
                }
                let own: f64 = (0..n_reviewers)
                    .filter(|&r| solution.assignment.is_assigned(ri(r), pi(i)))
                    .map(|r| value(r, i))
                    .sum();
                let others: Vec<f64> = (0..n_reviewers)
                    .filter(|&r| solution.assignment.is_assigned(ri(r), pi(j)))
                    .map(|r| value(r, i))
                    .collect();
                let total: f64 = others.iter().sum();
                let best = others.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if !best.is_finite() {
                    continue;
                }
                let w_i = problem.bounds().demand(pi(i)) as f64;
                let w_j = problem.bounds().demand(pi(j)) as f64;
                assert!(
                    own / w_i >= (total - best) / w_j - 1e-9,
                    "paper {} envies paper {} beyond one item",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_unit_demands_take_distinct_favorites() {
        let problem = build(
            vec![0, 0],
            vec![1, 1],
            vec![1, 1],
            vec![vec![-5.0, -1.0], vec![-1.0, -4.0]],
            ConstraintMatrix::unconstrained(2, 2),
        );
        let solution = FairnessSolver::new().solve(&problem).unwrap();
        assert!(solution.solved);
        assert!(solution.assignment.is_assigned(ri(0), pi(0)));
        assert!(solution.assignment.is_assigned(ri(1), pi(1)));
        solution.assignment.validate(&problem).unwrap();
        assert_wef1(&problem, &solution);
    }

    #[test]
    fn test_forced_pair_preassigned() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 2);
        constraint.set(ri(1), pi(0), Constraint::Forced);
        let problem = build(
            vec![0, 0],
            vec![2, 2],
            vec![1, 1],
            vec![vec![-5.0, -4.0], vec![-1.0, -2.0]],
            constraint,
        );
        let solution = FairnessSolver::new().solve(&problem).unwrap();
        assert!(solution.assignment.is_assigned(ri(1), pi(0)));
        solution.assignment.validate_forced(&problem).unwrap();
    }

    #[test]
    fn test_forbidden_cells_never_assigned() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 2);
        constraint.set(ri(0), pi(1), Constraint::Forbidden);
        let problem = build(
            vec![0, 0],
            vec![2, 2],
            vec![1, 1],
            vec![vec![-5.0, -9.0], vec![-1.0, -2.0]],
            constraint,
        );
        let solution = FairnessSolver::new().solve(&problem).unwrap();
        assert!(!solution.assignment.is_assigned(ri(0), pi(1)));
        solution.assignment.validate(&problem).unwrap();
    }

    #[test]
    fn test_restriction_reserves_capacity_for_minimums() {
        // r0 dominates on affinity; without the restriction it would absorb
        // both demand units and leave r1 below its minimum.
        let problem = build(
            vec![0, 1],
            vec![2, 1],
            vec![1, 1],
            vec![vec![-9.0, -8.0], vec![-1.0, -1.0]],
            ConstraintMatrix::unconstrained(2, 2),
        );
        let solution = FairnessSolver::new().solve(&problem).unwrap();
        solution.assignment.validate(&problem).unwrap();
        assert_eq!(solution.assignment.reviewer_load(ri(1)), 1.0);
    }

    #[test]
    fn test_trading_fallback_frees_slot() {
        // p0 picks first (higher best affinity) and takes r0; p1 conflicts
        // with r1, so only a trade can serve it.
        let mut constraint = ConstraintMatrix::unconstrained(2, 2);
        constraint.set(ri(1), pi(1), Constraint::Forbidden);
        let problem = build(
            vec![0, 0],
            vec![1, 1],
            vec![1, 1],
            vec![vec![-5.0, -4.0], vec![-3.0, 0.0]],
            constraint,
        );
        let solution = FairnessSolver::new().solve(&problem).unwrap();
        assert!(solution.assignment.is_assigned(ri(0), pi(1)));
        assert!(solution.assignment.is_assigned(ri(1), pi(0)));
        solution.assignment.validate(&problem).unwrap();
    }

    #[test]
    fn test_fallback_none_surfaces_trading_error() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 2);
        constraint.set(ri(1), pi(1), Constraint::Forbidden);
        let problem = build(
            vec![0, 0],
            vec![1, 1],
            vec![1, 1],
            vec![vec![-5.0, -4.0], vec![-3.0, 0.0]],
            constraint,
        );
        let result = FairnessSolver::new()
            .with_fallback(FallbackPolicy::None)
            .solve(&problem);
        assert!(matches!(
            result,
            Err(SolveError::TradingSearchExhausted(_))
        ));
    }

    #[test]
    fn test_wef1_holds_on_weighted_demands() {
        let problem = build(
            vec![0, 0, 0, 0],
            vec![1, 1, 1, 1],
            vec![2, 2],
            vec![
                vec![-4.0, -1.0],
                vec![-3.0, -2.0],
                vec![-2.0, -3.0],
                vec![-1.0, -4.0],
            ],
            ConstraintMatrix::unconstrained(4, 2),
        );
        let solution = FairnessSolver::new().solve(&problem).unwrap();
        assert!(solution.solved);
        solution.assignment.validate(&problem).unwrap();
        assert_wef1(&problem, &solution);
    }

    #[test]
    fn test_unsafe_mode_still_meets_invariants() {
        let problem = build(
            vec![0, 0, 0],
            vec![2, 2, 2],
            vec![2, 2],
            vec![
                vec![-4.0, -4.0],
                vec![-3.0, -1.0],
                vec![-2.0, -2.0],
            ],
            ConstraintMatrix::unconstrained(3, 2),
        );
        let solution = FairnessSolver::new()
            .with_mode(FairnessMode::Unsafe)
            .solve(&problem)
            .unwrap();
        solution.assignment.validate(&problem).unwrap();
    }

    #[test]
    fn test_all_forbidden_is_infeasible() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 1);
        constraint.set(ri(0), pi(0), Constraint::Forbidden);
        constraint.set(ri(1), pi(0), Constraint::Forbidden);
        let problem = build(
            vec![0, 0],
            vec![1, 1],
            vec![1],
            vec![vec![1.0], vec![1.0]],
            constraint,
        );
        let result = FairnessSolver::new().solve(&problem);
        assert!(matches!(
            result,
            Err(SolveError::TradingSearchExhausted(_))
        ));
    }
}

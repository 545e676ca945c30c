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
    flow::network::{ArcId, FlowNetwork},
    solver::{require_solved, AssignmentSolver, Solution},
};
use rand::RngCore;
use review_alloc_core::prelude::{Cost, Matrix};
use review_alloc_model::{
    common::{PaperIndex, ReviewerIndex},
    prelude::{Constraint, CostMatrix, MatchingProblem},
    solution::AssignmentMatrix,
};

/// Bipartite min-cost-flow assignment solver.
///
/// The single-phase variant optimizes cost under the reviewer maximums; the
/// two-phase variant first routes flow through reviewer minimums so that
/// every reviewer with usable score data reaches its minimum load before
/// surplus capacity is spent on further cost improvement.
#[derive(Debug, Clone, Default)]
pub struct FlowSolver {
    two_phase: bool,
    deadline: Option<Deadline>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PhaseOutcome {
    cost: Cost,
    saturated: bool,
}

impl FlowSolver {
    pub fn new() -> Self {
        Self {
            two_phase: false,
            deadline: None,
        }
    }

    pub fn two_phase() -> Self {
        Self {
            two_phase: true,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Best-effort solve. `solved` is false when the optimum flow fails to
    /// meet every paper demand; the trait entry point upgrades that to an
    /// error.
    pub fn solve(&self, problem: &MatchingProblem) -> Result<Solution, SolveError> {
        problem.bounds().validate_supply()?;
        if self.two_phase {
            self.solve_two_phase(problem)
        } else {
            let constraint = problem.constraint().inner().clone();
            let capacities: Vec<i64> = problem
                .bounds()
                .maximums()
                .iter()
                .map(|&c| c as i64)
                .collect();
            let demands: Vec<i64> = problem
                .bounds()
                .demands()
                .iter()
                .map(|&d| d as i64)
                .collect();
            let (assignment, outcome) =
                run_phase(problem.cost(), &constraint, &capacities, &demands);
            tracing::debug!(
                cost = outcome.cost,
                saturated = outcome.saturated,
                "flow solve finished"
            );
            Ok(Solution::new(assignment, outcome.saturated))
        }
    }

    fn solve_two_phase(&self, problem: &MatchingProblem) -> Result<Solution, SolveError> {
        let bounds = problem.bounds();
        let constraint = problem.constraint().inner().clone();
        let demands: Vec<i64> = bounds.demands().iter().map(|&d| d as i64).collect();

        // Phase 1: reviewer capacities pinned to the minimums, best-effort.
        let minimum_caps: Vec<i64> = bounds.minimums().iter().map(|&c| c as i64).collect();
        let (flow_a, outcome_a) = run_phase(problem.cost(), &constraint, &minimum_caps, &demands);
        tracing::debug!(cost = outcome_a.cost, "two-phase flow: phase 1 finished");

        if let Some(deadline) = &self.deadline {
            if deadline.expired() {
                return Err(DeadlineExceededError::new("flow phase 2").into());
            }
        }

        // Phase 2 works on the residual instance: leftover reviewer
        // capacity, unmet demand, and with every cell already used by
        // phase 1 taken out of play.
        let mut residual_constraint = constraint;
        let mut residual_caps = Vec::with_capacity(bounds.num_reviewers());
        for r in 0..bounds.num_reviewers() {
            let reviewer = ReviewerIndex(r);
            let load = flow_a.reviewer_load(reviewer).round() as i64;
            residual_caps.push(bounds.maximum(reviewer) as i64 - load);
        }
        let mut residual_demands = Vec::with_capacity(bounds.num_papers());
        for p in 0..bounds.num_papers() {
            let paper = PaperIndex(p);
            let fill = flow_a.paper_fill(paper).round() as i64;
            residual_demands.push(bounds.demand(paper) as i64 - fill);
        }
        for (reviewer, paper) in flow_a.iter_assigned() {
            residual_constraint.set(reviewer.0, paper.0, Constraint::Forbidden);
        }

        let (flow_b, outcome_b) = run_phase(
            problem.cost(),
            &residual_constraint,
            &residual_caps,
            &residual_demands,
        );
        tracing::debug!(
            cost = outcome_b.cost,
            saturated = outcome_b.saturated,
            "two-phase flow: phase 2 finished"
        );

        let merged = flow_a.merge(&flow_b);
        Ok(Solution::new(merged, outcome_b.saturated))
    }
}

impl AssignmentSolver for FlowSolver {
    fn name(&self) -> &str {
        if self.two_phase {
            "two-phase-flow"
        } else {
            "flow"
        }
    }

    fn solve(
        &self,
        problem: &MatchingProblem,
        _rng: &mut dyn RngCore,
    ) -> Result<Solution, SolveError> {
        let solution = FlowSolver::solve(self, problem)?;
        require_solved(solution, self.name())
    }
}

/// Builds and solves one assignment network: source, one node per reviewer
/// (supply arc capacity per `capacities`), one unit arc per admissible cell,
/// one node per paper (demand arc into the sink). Forced cells get a cost
/// below every observed cell cost so they are always preferred.
fn run_phase(
    cost: &CostMatrix,
    constraint: &Matrix<Constraint>,
    capacities: &[i64],
    demands: &[i64],
) -> (AssignmentMatrix, PhaseOutcome) {
    let num_reviewers = cost.num_reviewers();
    let num_papers = cost.num_papers();
    let forced_cost = cost.min_cell() - 1.0;

    let mut network = FlowNetwork::new();
    let source = network.add_node();
    let sink = network.add_node();
    let reviewer_nodes: Vec<_> = (0..num_reviewers).map(|_| network.add_node()).collect();
    let paper_nodes: Vec<_> = (0..num_papers).map(|_| network.add_node()).collect();

    for (r, &capacity) in capacities.iter().enumerate() {
        if capacity > 0 {
            network.add_arc(source, reviewer_nodes[r], capacity, 0.0);
        }
    }

    let mut cell_arcs: Vec<(ReviewerIndex, PaperIndex, ArcId)> = Vec::new();
    for r in 0..num_reviewers {
        for p in 0..num_papers {
            match constraint.at(r, p) {
                Constraint::Forbidden => {}
                Constraint::Unconstrained => {
                    let arc = network.add_arc(
                        reviewer_nodes[r],
                        paper_nodes[p],
                        1,
                        cost.at(ReviewerIndex(r), PaperIndex(p)),
                    );
                    cell_arcs.push((ReviewerIndex(r), PaperIndex(p), arc));
                }
                Constraint::Forced => {
                    let arc = network.add_arc(reviewer_nodes[r], paper_nodes[p], 1, forced_cost);
                    cell_arcs.push((ReviewerIndex(r), PaperIndex(p), arc));
                }
            }
        }
    }

    let mut demand_arcs = Vec::with_capacity(num_papers);
    for (p, &demand) in demands.iter().enumerate() {
        if demand > 0 {
            demand_arcs.push((p, demand, network.add_arc(paper_nodes[p], sink, demand, 0.0)));
        }
    }

    network.solve(source, sink);

    let mut assignment = AssignmentMatrix::zeros(num_reviewers, num_papers);
    let mut realized_cost = 0.0;
    for (reviewer, paper, arc) in cell_arcs {
        if network.flow(arc) > 0 {
            assignment.set(reviewer, paper, 1.0);
            realized_cost += cost.at(reviewer, paper);
        }
    }
    let saturated = demand_arcs
        .iter()
        .all(|&(_, demand, arc)| network.flow(arc) == demand);

    (
        assignment,
        PhaseOutcome {
            cost: realized_cost,
            saturated,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_alloc_model::prelude::{
        Bounds, ConstraintMatrix, MatchingProblem, MatchingProblemBuilder,
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

    #[test]
    fn test_four_reviewers_three_papers_optimum() {
        let problem = build(
            vec![1, 1, 1, 1],
            vec![2, 2, 2, 2],
            vec![1, 1, 2],
            vec![
                vec![0.0, 1.0, 1.0],
                vec![1.0, 0.0, 1.0],
                vec![1.0, 1.0, 0.0],
                vec![2.0, 2.0, 1.0],
            ],
            ConstraintMatrix::unconstrained(4, 3),
        );
        let solution = FlowSolver::new().solve(&problem).unwrap();
        assert!(solution.solved);
        let a = &solution.assignment;
        assert!(a.is_assigned(ri(0), pi(0)));
        assert!(a.is_assigned(ri(1), pi(1)));
        assert!(a.is_assigned(ri(2), pi(2)));
        assert!(a.is_assigned(ri(3), pi(2)));
        assert_eq!(a.total_cost(problem.cost()), 1.0);
    }

    #[test]
    fn test_forbidden_cells_carry_no_flow() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 2);
        constraint.set(ri(0), pi(0), Constraint::Forbidden);
        let problem = build(
            vec![0, 0],
            vec![2, 2],
            vec![1, 1],
            vec![vec![0.0, 5.0], vec![1.0, 1.0]],
            constraint,
        );
        let solution = FlowSolver::new().solve(&problem).unwrap();
        assert!(solution.solved);
        assert_eq!(solution.assignment.at(ri(0), pi(0)), 0.0);
        assert!(solution.assignment.validate(&problem).is_ok());
    }

    #[test]
    fn test_forced_cell_preferred_over_cheaper_alternative() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 1);
        constraint.set(ri(1), pi(0), Constraint::Forced);
        let problem = build(
            vec![0, 0],
            vec![1, 1],
            vec![1],
            vec![vec![0.0], vec![10.0]],
            constraint,
        );
        let solution = FlowSolver::new().solve(&problem).unwrap();
        assert!(solution.solved);
        assert!(solution.assignment.is_assigned(ri(1), pi(0)));
        assert!(!solution.assignment.is_assigned(ri(0), pi(0)));
    }

    #[test]
    fn test_all_forbidden_is_not_solved() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 1);
        constraint.set(ri(0), pi(0), Constraint::Forbidden);
        constraint.set(ri(1), pi(0), Constraint::Forbidden);
        let problem = build(
            vec![0, 0],
            vec![1, 1],
            vec![1],
            vec![vec![0.0], vec![1.0]],
            constraint,
        );
        let solution = FlowSolver::new().solve(&problem).unwrap();
        assert!(!solution.solved);

        let mut rng = rand::rng();
        let err = AssignmentSolver::solve(&FlowSolver::new(), &problem, &mut rng).unwrap_err();
        assert!(matches!(err, SolveError::InfeasibleConstraints(_)));
    }

    #[test]
    fn test_two_phase_meets_minimums_before_optimizing() {
        // Reviewer 1 is expensive everywhere; a pure cost optimum would
        // leave it empty, but its minimum load forces one assignment.
        let problem = build(
            vec![0, 1],
            vec![2, 2],
            vec![1, 1],
            vec![vec![0.0, 0.0], vec![9.0, 8.0]],
            ConstraintMatrix::unconstrained(2, 2),
        );
        let solution = FlowSolver::two_phase().solve(&problem).unwrap();
        assert!(solution.solved);
        assert!(solution.assignment.reviewer_load(ri(1)) >= 1.0);
        assert!(solution.assignment.validate(&problem).is_ok());
    }

    #[test]
    fn test_two_phase_matches_single_phase_totals() {
        let problem = build(
            vec![1, 1, 1, 1],
            vec![2, 2, 2, 2],
            vec![1, 1, 2],
            vec![
                vec![0.0, 1.0, 1.0],
                vec![1.0, 0.0, 1.0],
                vec![1.0, 1.0, 0.0],
                vec![2.0, 2.0, 1.0],
            ],
            ConstraintMatrix::unconstrained(4, 3),
        );
        let solution = FlowSolver::two_phase().solve(&problem).unwrap();
        assert!(solution.solved);
        assert!(solution.assignment.validate(&problem).is_ok());
        // Each paper demand is one unit short of the reviewer minimums, so
        // both variants land on the same optimum here.
        assert_eq!(solution.assignment.total_cost(problem.cost()), 1.0);
    }
}

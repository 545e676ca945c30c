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
    err::{InfeasibleConstraintsError, SolveError},
    fairness::FairnessSolver,
    flow::FlowSolver,
    randomized::RandomizedSolver,
};
use rand::RngCore;
use review_alloc_model::{prelude::MatchingProblem, solution::AssignmentMatrix};

/// Result of one solve. `solved` is true iff every paper demand is met
/// exactly; a false flag means the matrix must not be treated as valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub assignment: AssignmentMatrix,
    pub solved: bool,
}

impl Solution {
    pub fn new(assignment: AssignmentMatrix, solved: bool) -> Self {
        Self { assignment, solved }
    }
}

/// Common contract of the interchangeable solver strategies. Deterministic
/// strategies ignore the rng.
pub trait AssignmentSolver {
    fn name(&self) -> &str;

    fn solve(
        &self,
        problem: &MatchingProblem,
        rng: &mut dyn RngCore,
    ) -> Result<Solution, SolveError>;
}

impl std::fmt::Debug for dyn AssignmentSolver + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AssignmentSolver {{ name: {} }}", self.name())
    }
}

/// Closed set of solver strategies selectable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    Flow,
    TwoPhaseFlow,
    Fairness,
    Randomized,
}

impl SolverKind {
    pub fn build(self) -> Box<dyn AssignmentSolver> {
        match self {
            SolverKind::Flow => Box::new(FlowSolver::new()),
            SolverKind::TwoPhaseFlow => Box::new(FlowSolver::two_phase()),
            SolverKind::Fairness => Box::new(FairnessSolver::new()),
            SolverKind::Randomized => Box::new(RandomizedSolver::new()),
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SolverKind::Flow => "flow",
            SolverKind::TwoPhaseFlow => "two-phase-flow",
            SolverKind::Fairness => "fairness",
            SolverKind::Randomized => "randomized",
        };
        write!(f, "{}", name)
    }
}

/// Converts a best-effort outcome into the trait-level contract: a result
/// that failed to saturate demand is an infeasibility, never a partial
/// solution.
pub(crate) fn require_solved(solution: Solution, strategy: &str) -> Result<Solution, SolveError> {
    if solution.solved {
        Ok(solution)
    } else {
        Err(InfeasibleConstraintsError::new(format!(
            "{} failed to saturate all paper demands",
            strategy
        ))
        .into())
    }
}

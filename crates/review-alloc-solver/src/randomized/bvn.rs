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
    flow::FlowNetwork,
};
use rand::{Rng, RngCore};
use review_alloc_core::prelude::Matrix;
use review_alloc_model::{
    common::{PaperIndex, ReviewerIndex},
    prelude::MatchingProblem,
    solution::AssignmentMatrix,
};

const SNAP_TOLERANCE: f64 = 1e-9;

/// Draws one integral assignment whose inclusion probabilities match the
/// fractional matrix exactly (Birkhoff-von-Neumann style). Each round
/// extracts an integral matching inside the fractional support, computes
/// the largest coefficient that keeps the residual feasible, and either
/// returns the matching with that probability or continues on the rescaled
/// residual. Every round clears at least one fractional cell or row sum,
/// so the loop is linear in the support size.
pub(crate) fn sample_integral(
    problem: &MatchingProblem,
    fractional: &AssignmentMatrix,
    rng: &mut dyn RngCore,
) -> Result<AssignmentMatrix, SolveError> {
    let num_reviewers = problem.num_reviewers();
    let num_papers = problem.num_papers();
    let mut x = fractional.inner().clone();

    let support = x.as_slice().iter().filter(|&&v| v > SNAP_TOLERANCE).count();
    let round_limit = 2 * (support + num_reviewers + 1);

    for _ in 0..round_limit {
        if let Some(integral) = as_integral(&x) {
            return Ok(integral);
        }

        let matching = extract_matching(problem, &x)?;
        let coefficient = step_coefficient(&x, &matching);
        debug_assert!(coefficient > 0.0 && coefficient <= 1.0);

        if coefficient >= 1.0 - SNAP_TOLERANCE || rng.random::<f64>() < coefficient {
            return Ok(to_assignment(&matching));
        }

        // Residual keeps the decomposition invariant:
        // x = coefficient * matching + (1 - coefficient) * residual.
        for r in 0..num_reviewers {
            for p in 0..num_papers {
                let m = if matching.at(r, p) { 1.0 } else { 0.0 };
                let mut v = (x.at(r, p) - coefficient * m) / (1.0 - coefficient);
                if v < SNAP_TOLERANCE {
                    v = 0.0;
                } else if v > 1.0 - SNAP_TOLERANCE {
                    v = 1.0;
                }
                x.set(r, p, v);
            }
        }
    }

    Err(InfeasibleConstraintsError::new("matching decomposition did not converge").into())
}

/// Returns the matrix as a 0/1 assignment when every cell is already
/// integral.
fn as_integral(x: &Matrix<f64>) -> Option<AssignmentMatrix> {
    if x.as_slice()
        .iter()
        .any(|&v| v > SNAP_TOLERANCE && v < 1.0 - SNAP_TOLERANCE)
    {
        return None;
    }
    let mut assignment = AssignmentMatrix::zeros(x.rows(), x.cols());
    for r in 0..x.rows() {
        for p in 0..x.cols() {
            if x.at(r, p) > 0.5 {
                assignment.set(ReviewerIndex(r), PaperIndex(p), 1.0);
            }
        }
    }
    Some(assignment)
}

fn to_assignment(matching: &Matrix<bool>) -> AssignmentMatrix {
    let mut assignment = AssignmentMatrix::zeros(matching.rows(), matching.cols());
    for r in 0..matching.rows() {
        for p in 0..matching.cols() {
            if matching.at(r, p) {
                assignment.set(ReviewerIndex(r), PaperIndex(p), 1.0);
            }
        }
    }
    assignment
}

/// Finds an integral 0/1 matrix inside the fractional support with exact
/// column sums (paper demands) and row sums within one unit of the
/// fractional row sums. Mandatory units (cells at one, integral parts of
/// row sums) carry negative cost so the min-cost flow saturates them first;
/// the flow polytope contains the fractional point, so a flow missing any
/// of them means the input was not a feasible fractional assignment.
fn extract_matching(
    problem: &MatchingProblem,
    x: &Matrix<f64>,
) -> Result<Matrix<bool>, SolveError> {
    let num_reviewers = x.rows();
    let num_papers = x.cols();
    let bounds = problem.bounds();

    let mut network = FlowNetwork::new();
    let source = network.add_node();
    let sink = network.add_node();
    let reviewer_nodes: Vec<_> = (0..num_reviewers).map(|_| network.add_node()).collect();
    let paper_nodes: Vec<_> = (0..num_papers).map(|_| network.add_node()).collect();

    let mut lower_arcs = Vec::new();
    for r in 0..num_reviewers {
        let row_sum: f64 = (0..num_papers).map(|p| x.at(r, p)).sum();
        let snapped = row_sum.round();
        let (low, high) = if (row_sum - snapped).abs() <= 1e-6 {
            (snapped as i64, snapped as i64)
        } else {
            (row_sum.floor() as i64, row_sum.ceil() as i64)
        };
        if low > 0 {
            lower_arcs.push((network.add_arc(source, reviewer_nodes[r], low, -1.0), low));
        }
        if high > low {
            network.add_arc(source, reviewer_nodes[r], high - low, 0.0);
        }
    }

    let mut cell_arcs = Vec::new();
    for r in 0..num_reviewers {
        for p in 0..num_papers {
            let v = x.at(r, p);
            if v <= SNAP_TOLERANCE {
                continue;
            }
            let cost = if v >= 1.0 - SNAP_TOLERANCE { -1.0 } else { 0.0 };
            let arc = network.add_arc(reviewer_nodes[r], paper_nodes[p], 1, cost);
            cell_arcs.push((arc, r, p, cost < 0.0));
        }
    }

    let mut demand_arcs = Vec::new();
    for p in 0..num_papers {
        let demand = bounds.demand(PaperIndex(p)) as i64;
        if demand > 0 {
            demand_arcs.push((network.add_arc(paper_nodes[p], sink, demand, 0.0), demand));
        }
    }

    network.solve(source, sink);

    for &(arc, demand) in &demand_arcs {
        if network.flow(arc) != demand {
            return Err(
                InfeasibleConstraintsError::new("fractional matrix has no integral matching")
                    .into(),
            );
        }
    }
    for &(arc, low) in &lower_arcs {
        if network.flow(arc) != low {
            return Err(
                InfeasibleConstraintsError::new("fractional matrix has no integral matching")
                    .into(),
            );
        }
    }

    let mut matching = Matrix::filled(num_reviewers, num_papers, false);
    for &(arc, r, p, mandatory) in &cell_arcs {
        let used = network.flow(arc) > 0;
        if mandatory && !used {
            return Err(
                InfeasibleConstraintsError::new("fractional matrix has no integral matching")
                    .into(),
            );
        }
        if used {
            matching.set(r, p, true);
        }
    }
    Ok(matching)
}

/// Largest coefficient that keeps the rescaled residual a feasible
/// fractional assignment: bounded by each matched cell's mass, each
/// unmatched cell's headroom, and the fractional part of every row sum the
/// matching rounds up or down.
fn step_coefficient(x: &Matrix<f64>, matching: &Matrix<bool>) -> f64 {
    let mut coefficient = 1.0_f64;
    for r in 0..x.rows() {
        let mut row_sum = 0.0;
        let mut matched = 0_i64;
        for p in 0..x.cols() {
            let v = x.at(r, p);
            row_sum += v;
            if matching.at(r, p) {
                matched += 1;
                if v < 1.0 {
                    coefficient = coefficient.min(v);
                }
            } else if v > 0.0 {
                coefficient = coefficient.min(1.0 - v);
            }
        }
        let fraction = row_sum - row_sum.floor();
        if fraction > SNAP_TOLERANCE && fraction < 1.0 - SNAP_TOLERANCE {
            if (matched as f64) > row_sum {
                coefficient = coefficient.min(fraction);
            } else if (matched as f64) < row_sum {
                coefficient = coefficient.min(1.0 - fraction);
            }
        }
    }
    coefficient
}

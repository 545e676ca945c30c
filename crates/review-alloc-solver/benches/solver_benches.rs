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

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use review_alloc_model::prelude::{
    Bounds, ConstraintMatrix, CostMatrix, MatchingProblem, MatchingProblemBuilder,
};
use review_alloc_solver::prelude::{FairnessSolver, FlowSolver};
use std::hint::black_box;

/// Dense instance with pseudo-random affinities; every reviewer can carry
/// up to three papers.
fn build_problem(num_reviewers: usize, num_papers: usize, demand: usize) -> MatchingProblem {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let rows = (0..num_reviewers)
        .map(|_| {
            (0..num_papers)
                .map(|_| -rng.random_range(0.0..10.0))
                .collect()
        })
        .collect();
    MatchingProblemBuilder::new(
        Bounds::new(
            vec![0; num_reviewers],
            vec![3; num_reviewers],
            vec![demand; num_papers],
        ),
        CostMatrix::from_rows(rows),
        ConstraintMatrix::unconstrained(num_reviewers, num_papers),
    )
    .build()
    .expect("problem ok")
}

fn bench_flow_solver(c: &mut Criterion) {
    let problem = build_problem(60, 40, 3);
    let solver = FlowSolver::new();

    c.bench_function("FlowSolver solve (60x40, demand 3)", |b| {
        b.iter(|| {
            let solution = solver.solve(black_box(&problem)).expect("solve ok");
            black_box(solution)
        })
    });
}

fn bench_two_phase_flow_solver(c: &mut Criterion) {
    let mut problem = build_problem(60, 40, 3);
    // Rebuild with nonzero minimums so phase 1 has work to do.
    problem = MatchingProblemBuilder::new(
        Bounds::new(vec![1; 60], vec![3; 60], vec![3; 40]),
        problem.cost().clone(),
        problem.constraint().clone(),
    )
    .build()
    .expect("problem ok");
    let solver = FlowSolver::two_phase();

    c.bench_function("FlowSolver two-phase solve (60x40, demand 3)", |b| {
        b.iter(|| {
            let solution = solver.solve(black_box(&problem)).expect("solve ok");
            black_box(solution)
        })
    });
}

fn bench_fairness_solver(c: &mut Criterion) {
    let problem = build_problem(60, 40, 3);
    let solver = FairnessSolver::new();

    c.bench_function("FairnessSolver solve (60x40, demand 3)", |b| {
        b.iter(|| {
            let solution = solver.solve(black_box(&problem)).expect("solve ok");
            black_box(solution)
        })
    });
}

criterion_group!(
    benches,
    bench_flow_solver,
    bench_two_phase_flow_solver,
    bench_fairness_solver
);
criterion_main!(benches);

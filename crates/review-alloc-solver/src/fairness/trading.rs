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

use crate::fairness::state::AllocationState;
use review_alloc_model::common::{PaperIndex, ReviewerIndex};

/// One hop of a trading path: `reviewer` moves to `to`, leaving `from` when
/// it is currently committed there. The terminal hop of a valid path has
/// `from = None` (a reviewer with spare capacity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TradeStep {
    pub reviewer: ReviewerIndex,
    pub from: Option<PaperIndex>,
    pub to: PaperIndex,
}

/// Depth-first search for a reassignment chain that frees exactly one
/// reviewer slot for `paper`. Each hop greedily tries its own candidates in
/// descending affinity; a hop either ends the chain at a reviewer with
/// spare capacity or steals a committed reviewer and recurses into the
/// paper it was stolen from. Revisits of a (reviewer, paper) pair are
/// pruned along the current path only.
pub(crate) fn find_trade(
    state: &AllocationState<'_>,
    paper: PaperIndex,
    depth_bound: usize,
) -> Option<Vec<TradeStep>> {
    let mut path = Vec::new();
    let mut visited = Vec::new();
    if search(state, paper, 0, depth_bound, &mut path, &mut visited) {
        Some(path)
    } else {
        None
    }
}

fn search(
    state: &AllocationState<'_>,
    paper: PaperIndex,
    depth: usize,
    depth_bound: usize,
    path: &mut Vec<TradeStep>,
    visited: &mut Vec<(ReviewerIndex, PaperIndex)>,
) -> bool {
    for &reviewer in state.ranked(paper) {
        if state.in_bundle(reviewer, paper) || visited.contains(&(reviewer, paper)) {
            continue;
        }
        if state.remaining_capacity(reviewer) > 0 {
            path.push(TradeStep {
                reviewer,
                from: None,
                to: paper,
            });
            return true;
        }
        if depth >= depth_bound {
            continue;
        }
        for &held in state.papers_of(reviewer) {
            visited.push((reviewer, paper));
            path.push(TradeStep {
                reviewer,
                from: Some(held),
                to: paper,
            });
            if search(state, held, depth + 1, depth_bound, path, visited) {
                return true;
            }
            path.pop();
            visited.pop();
        }
    }
    false
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

    #[test]
    fn test_direct_hop_to_spare_capacity() {
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0, 0], vec![1, 1], vec![1, 1]),
            CostMatrix::from_rows(vec![vec![-5.0, -4.0], vec![-3.0, -2.0]]),
            ConstraintMatrix::unconstrained(2, 2),
        )
        .build()
        .unwrap();
        let state = AllocationState::new(&problem);
        let path = find_trade(&state, pi(0), 7).unwrap();
        assert_eq!(
            path,
            vec![TradeStep {
                reviewer: ri(0),
                from: None,
                to: pi(0),
            }]
        );
    }

    #[test]
    fn test_two_hop_chain_through_committed_reviewer() {
        // r1 conflicts with p1; after r0 is committed to p0, the only way
        // to serve p1 is to steal r0 and backfill p0 with r1.
        let mut constraint = ConstraintMatrix::unconstrained(2, 2);
        constraint.set(ri(1), pi(1), Constraint::Forbidden);
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0, 0], vec![1, 1], vec![1, 1]),
            CostMatrix::from_rows(vec![vec![-5.0, -4.0], vec![-3.0, 0.0]]),
            constraint,
        )
        .build()
        .unwrap();
        let mut state = AllocationState::new(&problem);
        state.assign(ri(0), pi(0));

        let path = find_trade(&state, pi(1), 7).unwrap();
        assert_eq!(
            path,
            vec![
                TradeStep {
                    reviewer: ri(0),
                    from: Some(pi(0)),
                    to: pi(1),
                },
                TradeStep {
                    reviewer: ri(1),
                    from: None,
                    to: pi(0),
                },
            ]
        );
    }

    #[test]
    fn test_depth_bound_cuts_off_search() {
        let mut constraint = ConstraintMatrix::unconstrained(2, 2);
        constraint.set(ri(1), pi(1), Constraint::Forbidden);
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0, 0], vec![1, 1], vec![1, 1]),
            CostMatrix::from_rows(vec![vec![-5.0, -4.0], vec![-3.0, 0.0]]),
            constraint,
        )
        .build()
        .unwrap();
        let mut state = AllocationState::new(&problem);
        state.assign(ri(0), pi(0));

        assert!(find_trade(&state, pi(1), 0).is_none());
    }

    #[test]
    fn test_no_path_when_all_capacity_spoken_for() {
        let problem = MatchingProblemBuilder::new(
            Bounds::new(vec![0], vec![1], vec![1]),
            CostMatrix::from_rows(vec![vec![-1.0]]),
            ConstraintMatrix::unconstrained(1, 1),
        )
        .build()
        .unwrap();
        let mut state = AllocationState::new(&problem);
        state.assign(ri(0), pi(0));
        // The only reviewer is already in the paper's bundle.
        assert!(find_trade(&state, pi(0), 7).is_none());
    }
}

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

pub mod err;

use crate::{
    common::{PaperId, PaperIndex, ReviewerId, ReviewerIndex},
    problem::matrices::{Constraint, ConstraintMatrix, CostMatrix},
    solution::AssignmentMatrix,
};
use err::EncodingError;
use review_alloc_core::prelude::{Matrix, Score};
use std::collections::{BTreeMap, HashMap};

/// Cost cells keep two decimal digits of the underlying aggregate score.
pub const DEFAULT_PRECISION: f64 = 0.01;

/// Raw per-criterion score as delivered by the external provider. Providers
/// hand scores through untyped, so text that happens to spell a number is
/// accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum RawScore {
    Number(f64),
    Text(String),
}

impl RawScore {
    fn coerce(&self) -> Option<f64> {
        match self {
            RawScore::Number(v) if v.is_finite() => Some(*v),
            RawScore::Number(_) => None,
            RawScore::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    fn raw_repr(&self) -> String {
        match self {
            RawScore::Number(v) => v.to_string(),
            RawScore::Text(s) => s.clone(),
        }
    }
}

/// One (paper, reviewer) cell of external scoring data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreEntry {
    pub scores: BTreeMap<String, RawScore>,
    pub conflict: bool,
}

/// Boundary to the external score store. The id lists passed to
/// [`Encoder::encode`] define the matrix dimensions and ordering; the
/// provider is queried once per cell.
pub trait ScoreProvider {
    fn entry(&self, paper: &PaperId, reviewer: &ReviewerId) -> ScoreEntry;
}

/// Named criterion contributing to the aggregate score. `default` stands in
/// when the provider has no value for the criterion on a given pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub name: String,
    pub weight: f64,
    pub default: f64,
}

impl Criterion {
    pub fn new(name: impl Into<String>, weight: f64, default: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            default,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub criteria: Vec<Criterion>,
    pub precision: f64,
}

impl EncoderConfig {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self {
            criteria,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }
}

/// Reviewer assigned to a paper together with the aggregate score the
/// assignment was costed with.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReviewer {
    pub reviewer: ReviewerId,
    pub aggregate_score: Score,
}

/// Turns raw pairwise scoring data into the dense cost and constraint
/// matrices, and decodes a solved assignment back into per-paper reviewer
/// lists. Pure with respect to its inputs; the aggregate scores are kept
/// alongside the cost matrix so `decode` never re-derives them from costs.
#[derive(Debug, Clone)]
pub struct Encoder {
    reviewers: Vec<ReviewerId>,
    papers: Vec<PaperId>,
    reviewer_index: HashMap<ReviewerId, ReviewerIndex>,
    paper_index: HashMap<PaperId, PaperIndex>,
    scores: Matrix<Score>,
    cost: CostMatrix,
    constraint: ConstraintMatrix,
}

impl Encoder {
    pub fn encode<P: ScoreProvider>(
        provider: &P,
        reviewers: Vec<ReviewerId>,
        papers: Vec<PaperId>,
        config: &EncoderConfig,
    ) -> Result<Self, EncodingError> {
        let num_reviewers = reviewers.len();
        let num_papers = papers.len();

        let mut scores = Matrix::zeros(num_reviewers, num_papers);
        let mut cost = Matrix::zeros(num_reviewers, num_papers);
        let mut constraint = ConstraintMatrix::unconstrained(num_reviewers, num_papers);

        for (r, reviewer) in reviewers.iter().enumerate() {
            for (p, paper) in papers.iter().enumerate() {
                let entry = provider.entry(paper, reviewer);
                let aggregate = aggregate_score(&entry, config, paper, reviewer)?;
                scores.set(r, p, aggregate);
                cost.set(r, p, -aggregate / config.precision);
                if entry.conflict {
                    constraint.set(ReviewerIndex(r), PaperIndex(p), Constraint::Forbidden);
                }
            }
        }

        let reviewer_index = reviewers
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, id)| (id, ReviewerIndex(i)))
            .collect();
        let paper_index = papers
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, id)| (id, PaperIndex(i)))
            .collect();

        Ok(Self {
            reviewers,
            papers,
            reviewer_index,
            paper_index,
            scores,
            cost: CostMatrix::new(cost),
            constraint,
        })
    }

    #[inline]
    pub fn cost_matrix(&self) -> &CostMatrix {
        &self.cost
    }

    #[inline]
    pub fn constraint_matrix(&self) -> &ConstraintMatrix {
        &self.constraint
    }

    #[inline]
    pub fn num_reviewers(&self) -> usize {
        self.reviewers.len()
    }

    #[inline]
    pub fn num_papers(&self) -> usize {
        self.papers.len()
    }

    #[inline]
    pub fn aggregate_score(&self, r: ReviewerIndex, p: PaperIndex) -> Score {
        self.scores.at(r.0, p.0)
    }

    #[inline]
    pub fn reviewer_index(&self, id: &ReviewerId) -> Option<ReviewerIndex> {
        self.reviewer_index.get(id).copied()
    }

    #[inline]
    pub fn paper_index(&self, id: &PaperId) -> Option<PaperIndex> {
        self.paper_index.get(id).copied()
    }

    /// Overlays an externally supplied lock: the cell is overwritten to
    /// Forced regardless of its previous value. Returns false when either
    /// id is unknown to this encoder.
    pub fn force(&mut self, reviewer: &ReviewerId, paper: &PaperId) -> bool {
        match (self.reviewer_index(reviewer), self.paper_index(paper)) {
            (Some(r), Some(p)) => {
                self.constraint.set(r, p, Constraint::Forced);
                true
            }
            _ => false,
        }
    }

    /// Groups assigned cells by paper and returns them sorted by descending
    /// aggregate score, ties broken by reviewer id.
    pub fn decode(&self, assignment: &AssignmentMatrix) -> BTreeMap<PaperId, Vec<ScoredReviewer>> {
        debug_assert_eq!(assignment.num_reviewers(), self.num_reviewers());
        debug_assert_eq!(assignment.num_papers(), self.num_papers());

        let mut out: BTreeMap<PaperId, Vec<ScoredReviewer>> = BTreeMap::new();
        for (p, paper) in self.papers.iter().enumerate() {
            let mut assigned: Vec<ScoredReviewer> = (0..self.reviewers.len())
                .filter(|&r| assignment.is_assigned(ReviewerIndex(r), PaperIndex(p)))
                .map(|r| ScoredReviewer {
                    reviewer: self.reviewers[r].clone(),
                    aggregate_score: self.scores.at(r, p),
                })
                .collect();
            assigned.sort_by(|a, b| {
                b.aggregate_score
                    .partial_cmp(&a.aggregate_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.reviewer.cmp(&b.reviewer))
            });
            out.insert(paper.clone(), assigned);
        }
        out
    }
}

fn aggregate_score(
    entry: &ScoreEntry,
    config: &EncoderConfig,
    paper: &PaperId,
    reviewer: &ReviewerId,
) -> Result<Score, EncodingError> {
    let mut aggregate = 0.0;
    for criterion in &config.criteria {
        let value = match entry.scores.get(&criterion.name) {
            Some(raw) => raw.coerce().ok_or_else(|| {
                EncodingError::new(
                    paper.clone(),
                    reviewer.clone(),
                    criterion.name.clone(),
                    raw.raw_repr(),
                )
            })?,
            None => criterion.default,
        };
        aggregate += criterion.weight * value;
    }
    Ok(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline]
    fn rid(s: &str) -> ReviewerId {
        ReviewerId::new(s.to_string())
    }
    #[inline]
    fn pid(s: &str) -> PaperId {
        PaperId::new(s.to_string())
    }

    struct TableProvider {
        entries: HashMap<(String, String), ScoreEntry>,
    }

    impl TableProvider {
        fn new() -> Self {
            Self {
                entries: HashMap::new(),
            }
        }

        fn put(&mut self, paper: &str, reviewer: &str, entry: ScoreEntry) {
            self.entries
                .insert((paper.to_string(), reviewer.to_string()), entry);
        }
    }

    impl ScoreProvider for TableProvider {
        fn entry(&self, paper: &PaperId, reviewer: &ReviewerId) -> ScoreEntry {
            self.entries
                .get(&(paper.value().clone(), reviewer.value().clone()))
                .cloned()
                .unwrap_or_default()
        }
    }

    fn affinity(v: f64) -> ScoreEntry {
        let mut scores = BTreeMap::new();
        scores.insert("affinity".to_string(), RawScore::Number(v));
        ScoreEntry {
            scores,
            conflict: false,
        }
    }

    fn config() -> EncoderConfig {
        EncoderConfig::new(vec![Criterion::new("affinity", 1.0, 0.0)])
    }

    #[test]
    fn test_encode_builds_cost_from_aggregate_score() {
        let mut provider = TableProvider::new();
        provider.put("p0", "r0", affinity(0.8));
        let encoder =
            Encoder::encode(&provider, vec![rid("r0")], vec![pid("p0")], &config()).unwrap();
        // cost = -0.8 / 0.01
        assert!((encoder.cost_matrix().at(ReviewerIndex(0), PaperIndex(0)) + 80.0).abs() < 1e-12);
        assert_eq!(encoder.aggregate_score(ReviewerIndex(0), PaperIndex(0)), 0.8);
    }

    #[test]
    fn test_encode_coerces_text_and_applies_defaults_and_weights() {
        let mut provider = TableProvider::new();
        let mut scores = BTreeMap::new();
        scores.insert("affinity".to_string(), RawScore::Text(" 0.5 ".to_string()));
        provider.put(
            "p0",
            "r0",
            ScoreEntry {
                scores,
                conflict: false,
            },
        );
        let config = EncoderConfig::new(vec![
            Criterion::new("affinity", 2.0, 0.0),
            Criterion::new("bid", 1.0, 0.25),
        ]);
        let encoder =
            Encoder::encode(&provider, vec![rid("r0")], vec![pid("p0")], &config).unwrap();
        // 2.0 * 0.5 + 1.0 * 0.25
        assert!(
            (encoder.aggregate_score(ReviewerIndex(0), PaperIndex(0)) - 1.25).abs() < 1e-12
        );
    }

    #[test]
    fn test_encode_rejects_non_numeric_score() {
        let mut provider = TableProvider::new();
        let mut scores = BTreeMap::new();
        scores.insert(
            "affinity".to_string(),
            RawScore::Text("not-a-number".to_string()),
        );
        provider.put(
            "p0",
            "r0",
            ScoreEntry {
                scores,
                conflict: false,
            },
        );
        let err = Encoder::encode(&provider, vec![rid("r0")], vec![pid("p0")], &config())
            .unwrap_err();
        assert_eq!(err.criterion(), "affinity");
        assert_eq!(err.raw(), "not-a-number");
    }

    #[test]
    fn test_conflict_marks_cell_forbidden_and_force_overlays() {
        let mut provider = TableProvider::new();
        let mut entry = affinity(0.3);
        entry.conflict = true;
        provider.put("p0", "r0", entry);
        let mut encoder =
            Encoder::encode(&provider, vec![rid("r0")], vec![pid("p0")], &config()).unwrap();
        assert!(encoder
            .constraint_matrix()
            .is_forbidden(ReviewerIndex(0), PaperIndex(0)));
        assert!(encoder.force(&rid("r0"), &pid("p0")));
        assert!(encoder
            .constraint_matrix()
            .is_forced(ReviewerIndex(0), PaperIndex(0)));
        assert!(!encoder.force(&rid("unknown"), &pid("p0")));
    }

    #[test]
    fn test_decode_round_trip_sorted_by_descending_score() {
        let mut provider = TableProvider::new();
        provider.put("p0", "r0", affinity(0.2));
        provider.put("p0", "r1", affinity(0.9));
        provider.put("p1", "r0", affinity(0.7));
        provider.put("p1", "r1", affinity(0.1));
        let encoder = Encoder::encode(
            &provider,
            vec![rid("r0"), rid("r1")],
            vec![pid("p0"), pid("p1")],
            &config(),
        )
        .unwrap();

        let mut assignment = AssignmentMatrix::zeros(2, 2);
        assignment.set(ReviewerIndex(0), PaperIndex(0), 1.0);
        assignment.set(ReviewerIndex(1), PaperIndex(0), 1.0);
        assignment.set(ReviewerIndex(0), PaperIndex(1), 1.0);

        let decoded = encoder.decode(&assignment);
        let p0 = &decoded[&pid("p0")];
        assert_eq!(p0.len(), 2);
        assert_eq!(p0[0].reviewer, rid("r1"));
        assert_eq!(p0[0].aggregate_score, 0.9);
        assert_eq!(p0[1].reviewer, rid("r0"));
        let p1 = &decoded[&pid("p1")];
        assert_eq!(p1.len(), 1);
        assert_eq!(p1[0].aggregate_score, 0.7);
    }
}

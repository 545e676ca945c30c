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

use review_alloc_model::common::{PaperIndex, ReviewerIndex};
use review_alloc_model::problem::err::SupplyDemandMismatchError;

/// Supply and demand are in range but no saturating solution exists,
/// typically because forbidden cells starve some paper of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InfeasibleConstraintsError {
    detail: String,
}

impl InfeasibleConstraintsError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl std::fmt::Display for InfeasibleConstraintsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no feasible saturating assignment: {}", self.detail)
    }
}

impl std::error::Error for InfeasibleConstraintsError {}

/// The fairness solver's bounded trading-path search ran out of candidates
/// or depth. Recoverable: the caller may retry in unsafe mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TradingSearchExhaustedError {
    paper: PaperIndex,
    depth_bound: usize,
}

impl TradingSearchExhaustedError {
    pub fn new(paper: PaperIndex, depth_bound: usize) -> Self {
        Self { paper, depth_bound }
    }

    pub fn paper(&self) -> PaperIndex {
        self.paper
    }

    pub fn depth_bound(&self) -> usize {
        self.depth_bound
    }
}

impl std::fmt::Display for TradingSearchExhaustedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no WEF1 allocation found: trading search for {} exhausted within depth {}",
            self.paper, self.depth_bound
        )
    }
}

impl std::error::Error for TradingSearchExhaustedError {}

/// The randomized LP returned a basic-feasible solution that is not exactly
/// representable at the configured precision. Defensive assertion; should
/// not occur with a correct formulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegralityViolationError {
    reviewer: ReviewerIndex,
    paper: PaperIndex,
    scaled: f64,
}

impl IntegralityViolationError {
    pub fn new(reviewer: ReviewerIndex, paper: PaperIndex, scaled: f64) -> Self {
        Self {
            reviewer,
            paper,
            scaled,
        }
    }

    pub fn reviewer(&self) -> ReviewerIndex {
        self.reviewer
    }

    pub fn paper(&self) -> PaperIndex {
        self.paper
    }

    pub fn scaled(&self) -> f64 {
        self.scaled
    }
}

impl std::fmt::Display for IntegralityViolationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scaled LP value {} at ({}, {}) is not integral",
            self.scaled, self.reviewer, self.paper
        )
    }
}

impl std::error::Error for IntegralityViolationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeadlineExceededError {
    phase: &'static str,
}

impl DeadlineExceededError {
    pub fn new(phase: &'static str) -> Self {
        Self { phase }
    }

    pub fn phase(&self) -> &'static str {
        self.phase
    }
}

impl std::fmt::Display for DeadlineExceededError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline exceeded before {}", self.phase)
    }
}

impl std::error::Error for DeadlineExceededError {}

/// Aggregate error for every solver entry point. Errors are propagated
/// synchronously and never retried internally; a returned error means the
/// output matrix must not be treated as valid.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    SupplyDemandMismatch(SupplyDemandMismatchError),
    InfeasibleConstraints(InfeasibleConstraintsError),
    TradingSearchExhausted(TradingSearchExhaustedError),
    IntegralityViolation(IntegralityViolationError),
    DeadlineExceeded(DeadlineExceededError),
}

impl std::fmt::Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveError::SupplyDemandMismatch(e) => write!(f, "{}", e),
            SolveError::InfeasibleConstraints(e) => write!(f, "{}", e),
            SolveError::TradingSearchExhausted(e) => write!(f, "{}", e),
            SolveError::IntegralityViolation(e) => write!(f, "{}", e),
            SolveError::DeadlineExceeded(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SolveError {}

impl From<SupplyDemandMismatchError> for SolveError {
    fn from(err: SupplyDemandMismatchError) -> Self {
        SolveError::SupplyDemandMismatch(err)
    }
}

impl From<InfeasibleConstraintsError> for SolveError {
    fn from(err: InfeasibleConstraintsError) -> Self {
        SolveError::InfeasibleConstraints(err)
    }
}

impl From<TradingSearchExhaustedError> for SolveError {
    fn from(err: TradingSearchExhaustedError) -> Self {
        SolveError::TradingSearchExhausted(err)
    }
}

impl From<IntegralityViolationError> for SolveError {
    fn from(err: IntegralityViolationError) -> Self {
        SolveError::IntegralityViolation(err)
    }
}

impl From<DeadlineExceededError> for SolveError {
    fn from(err: DeadlineExceededError) -> Self {
        SolveError::DeadlineExceeded(err)
    }
}

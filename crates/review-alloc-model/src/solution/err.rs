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

use crate::common::{PaperIndex, ReviewerIndex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandNotMetError {
    paper: PaperIndex,
    demand: usize,
    filled: f64,
}

impl DemandNotMetError {
    pub fn new(paper: PaperIndex, demand: usize, filled: f64) -> Self {
        Self {
            paper,
            demand,
            filled,
        }
    }

    pub fn paper(&self) -> PaperIndex {
        self.paper
    }

    pub fn demand(&self) -> usize {
        self.demand
    }

    pub fn filled(&self) -> f64 {
        self.filled
    }
}

impl std::fmt::Display for DemandNotMetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requires {} reviewers but the assignment supplies {}",
            self.paper, self.demand, self.filled
        )
    }
}

impl std::error::Error for DemandNotMetError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOutOfBoundsError {
    reviewer: ReviewerIndex,
    minimum: usize,
    maximum: usize,
    load: f64,
}

impl LoadOutOfBoundsError {
    pub fn new(reviewer: ReviewerIndex, minimum: usize, maximum: usize, load: f64) -> Self {
        Self {
            reviewer,
            minimum,
            maximum,
            load,
        }
    }

    pub fn reviewer(&self) -> ReviewerIndex {
        self.reviewer
    }

    pub fn load(&self) -> f64 {
        self.load
    }
}

impl std::fmt::Display for LoadOutOfBoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} carries load {} outside its window [{}, {}]",
            self.reviewer, self.load, self.minimum, self.maximum
        )
    }
}

impl std::error::Error for LoadOutOfBoundsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConflictViolatedError {
    reviewer: ReviewerIndex,
    paper: PaperIndex,
}

impl ConflictViolatedError {
    pub fn new(reviewer: ReviewerIndex, paper: PaperIndex) -> Self {
        Self { reviewer, paper }
    }

    pub fn reviewer(&self) -> ReviewerIndex {
        self.reviewer
    }

    pub fn paper(&self) -> PaperIndex {
        self.paper
    }
}

impl std::fmt::Display for ConflictViolatedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "forbidden pair ({}, {}) is realized by the assignment",
            self.reviewer, self.paper
        )
    }
}

impl std::error::Error for ConflictViolatedError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForcedPairMissingError {
    reviewer: ReviewerIndex,
    paper: PaperIndex,
}

impl ForcedPairMissingError {
    pub fn new(reviewer: ReviewerIndex, paper: PaperIndex) -> Self {
        Self { reviewer, paper }
    }

    pub fn reviewer(&self) -> ReviewerIndex {
        self.reviewer
    }

    pub fn paper(&self) -> PaperIndex {
        self.paper
    }
}

impl std::fmt::Display for ForcedPairMissingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "forced pair ({}, {}) is absent from the assignment",
            self.reviewer, self.paper
        )
    }
}

impl std::error::Error for ForcedPairMissingError {}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentValidationError {
    DemandNotMet(DemandNotMetError),
    LoadOutOfBounds(LoadOutOfBoundsError),
    ConflictViolated(ConflictViolatedError),
    ForcedPairMissing(ForcedPairMissingError),
}

impl std::fmt::Display for AssignmentValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentValidationError::DemandNotMet(e) => write!(f, "{}", e),
            AssignmentValidationError::LoadOutOfBounds(e) => write!(f, "{}", e),
            AssignmentValidationError::ConflictViolated(e) => write!(f, "{}", e),
            AssignmentValidationError::ForcedPairMissing(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AssignmentValidationError {}

impl From<DemandNotMetError> for AssignmentValidationError {
    fn from(err: DemandNotMetError) -> Self {
        AssignmentValidationError::DemandNotMet(err)
    }
}

impl From<LoadOutOfBoundsError> for AssignmentValidationError {
    fn from(err: LoadOutOfBoundsError) -> Self {
        AssignmentValidationError::LoadOutOfBounds(err)
    }
}

impl From<ConflictViolatedError> for AssignmentValidationError {
    fn from(err: ConflictViolatedError) -> Self {
        AssignmentValidationError::ConflictViolated(err)
    }
}

impl From<ForcedPairMissingError> for AssignmentValidationError {
    fn from(err: ForcedPairMissingError) -> Self {
        AssignmentValidationError::ForcedPairMissing(err)
    }
}

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

use crate::common::ReviewerIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundsArityError {
    minimums: usize,
    maximums: usize,
}

impl BoundsArityError {
    pub fn new(minimums: usize, maximums: usize) -> Self {
        Self { minimums, maximums }
    }

    pub fn minimums(&self) -> usize {
        self.minimums
    }

    pub fn maximums(&self) -> usize {
        self.maximums
    }
}

impl std::fmt::Display for BoundsArityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "minimums has {} entries but maximums has {}",
            self.minimums, self.maximums
        )
    }
}

impl std::error::Error for BoundsArityError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinimumExceedsMaximumError {
    reviewer: ReviewerIndex,
    minimum: usize,
    maximum: usize,
}

impl MinimumExceedsMaximumError {
    pub fn new(reviewer: ReviewerIndex, minimum: usize, maximum: usize) -> Self {
        Self {
            reviewer,
            minimum,
            maximum,
        }
    }

    pub fn reviewer(&self) -> ReviewerIndex {
        self.reviewer
    }

    pub fn minimum(&self) -> usize {
        self.minimum
    }

    pub fn maximum(&self) -> usize {
        self.maximum
    }
}

impl std::fmt::Display for MinimumExceedsMaximumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has minimum load {} above its maximum load {}",
            self.reviewer, self.minimum, self.maximum
        )
    }
}

impl std::error::Error for MinimumExceedsMaximumError {}

/// Total demand falls outside the supply window spanned by the reviewer
/// load bounds. Detected before solving and always fatal to that solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SupplyDemandMismatchError {
    total_minimums: usize,
    total_maximums: usize,
    total_demands: usize,
}

impl SupplyDemandMismatchError {
    pub fn new(total_minimums: usize, total_maximums: usize, total_demands: usize) -> Self {
        Self {
            total_minimums,
            total_maximums,
            total_demands,
        }
    }

    pub fn total_minimums(&self) -> usize {
        self.total_minimums
    }

    pub fn total_maximums(&self) -> usize {
        self.total_maximums
    }

    pub fn total_demands(&self) -> usize {
        self.total_demands
    }
}

impl std::fmt::Display for SupplyDemandMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total demand {} lies outside the feasible supply range [{}, {}]",
            self.total_demands, self.total_minimums, self.total_maximums
        )
    }
}

impl std::error::Error for SupplyDemandMismatchError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixShapeError {
    expected_rows: usize,
    expected_cols: usize,
    actual_rows: usize,
    actual_cols: usize,
}

impl MatrixShapeError {
    pub fn new(
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    ) -> Self {
        Self {
            expected_rows,
            expected_cols,
            actual_rows,
            actual_cols,
        }
    }

    pub fn expected(&self) -> (usize, usize) {
        (self.expected_rows, self.expected_cols)
    }

    pub fn actual(&self) -> (usize, usize) {
        (self.actual_rows, self.actual_cols)
    }
}

impl std::fmt::Display for MatrixShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected a {}x{} matrix but got {}x{}",
            self.expected_rows, self.expected_cols, self.actual_rows, self.actual_cols
        )
    }
}

impl std::error::Error for MatrixShapeError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ProblemBuildError {
    BoundsArity(BoundsArityError),
    MinimumExceedsMaximum(MinimumExceedsMaximumError),
    SupplyDemandMismatch(SupplyDemandMismatchError),
    MatrixShape(MatrixShapeError),
}

impl std::fmt::Display for ProblemBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemBuildError::BoundsArity(e) => write!(f, "{}", e),
            ProblemBuildError::MinimumExceedsMaximum(e) => write!(f, "{}", e),
            ProblemBuildError::SupplyDemandMismatch(e) => write!(f, "{}", e),
            ProblemBuildError::MatrixShape(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProblemBuildError {}

impl From<BoundsArityError> for ProblemBuildError {
    fn from(err: BoundsArityError) -> Self {
        ProblemBuildError::BoundsArity(err)
    }
}

impl From<MinimumExceedsMaximumError> for ProblemBuildError {
    fn from(err: MinimumExceedsMaximumError) -> Self {
        ProblemBuildError::MinimumExceedsMaximum(err)
    }
}

impl From<SupplyDemandMismatchError> for ProblemBuildError {
    fn from(err: SupplyDemandMismatchError) -> Self {
        ProblemBuildError::SupplyDemandMismatch(err)
    }
}

impl From<MatrixShapeError> for ProblemBuildError {
    fn from(err: MatrixShapeError) -> Self {
        ProblemBuildError::MatrixShape(err)
    }
}

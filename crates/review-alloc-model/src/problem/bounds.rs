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
    common::ReviewerIndex,
    problem::err::{BoundsArityError, MinimumExceedsMaximumError, SupplyDemandMismatchError},
};

/// Per-reviewer load window and per-paper demand.
///
/// Feasibility precondition: `Σminimums ≤ Σdemands ≤ Σmaximums`, checked by
/// [`Bounds::validate`] before any solver runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bounds {
    minimums: Vec<usize>,
    maximums: Vec<usize>,
    demands: Vec<usize>,
}

impl Bounds {
    pub fn new(minimums: Vec<usize>, maximums: Vec<usize>, demands: Vec<usize>) -> Self {
        Self {
            minimums,
            maximums,
            demands,
        }
    }

    #[inline]
    pub fn num_reviewers(&self) -> usize {
        self.minimums.len()
    }

    #[inline]
    pub fn num_papers(&self) -> usize {
        self.demands.len()
    }

    #[inline]
    pub fn minimums(&self) -> &[usize] {
        &self.minimums
    }

    #[inline]
    pub fn maximums(&self) -> &[usize] {
        &self.maximums
    }

    #[inline]
    pub fn demands(&self) -> &[usize] {
        &self.demands
    }

    #[inline]
    pub fn minimum(&self, r: ReviewerIndex) -> usize {
        self.minimums[r.0]
    }

    #[inline]
    pub fn maximum(&self, r: ReviewerIndex) -> usize {
        self.maximums[r.0]
    }

    #[inline]
    pub fn demand(&self, p: crate::common::PaperIndex) -> usize {
        self.demands[p.0]
    }

    #[inline]
    pub fn total_minimums(&self) -> usize {
        self.minimums.iter().sum()
    }

    #[inline]
    pub fn total_maximums(&self) -> usize {
        self.maximums.iter().sum()
    }

    #[inline]
    pub fn total_demands(&self) -> usize {
        self.demands.iter().sum()
    }

    pub fn validate_arity(&self) -> Result<(), BoundsArityError> {
        if self.minimums.len() != self.maximums.len() {
            return Err(BoundsArityError::new(
                self.minimums.len(),
                self.maximums.len(),
            ));
        }
        Ok(())
    }

    pub fn validate_windows(&self) -> Result<(), MinimumExceedsMaximumError> {
        for (i, (&lo, &hi)) in self.minimums.iter().zip(self.maximums.iter()).enumerate() {
            if lo > hi {
                return Err(MinimumExceedsMaximumError::new(ReviewerIndex(i), lo, hi));
            }
        }
        Ok(())
    }

    pub fn validate_supply(&self) -> Result<(), SupplyDemandMismatchError> {
        let lo = self.total_minimums();
        let hi = self.total_maximums();
        let demand = self.total_demands();
        if demand < lo || demand > hi {
            return Err(SupplyDemandMismatchError::new(lo, hi, demand));
        }
        Ok(())
    }
}

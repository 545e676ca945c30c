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

use crate::common::{PaperId, ReviewerId};

/// A raw per-criterion score could not be coerced to a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodingError {
    paper: PaperId,
    reviewer: ReviewerId,
    criterion: String,
    raw: String,
}

impl EncodingError {
    pub fn new(paper: PaperId, reviewer: ReviewerId, criterion: String, raw: String) -> Self {
        Self {
            paper,
            reviewer,
            criterion,
            raw,
        }
    }

    pub fn paper(&self) -> &PaperId {
        &self.paper
    }

    pub fn reviewer(&self) -> &ReviewerId {
        &self.reviewer
    }

    pub fn criterion(&self) -> &str {
        &self.criterion
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "score '{}' for criterion '{}' on ({}, {}) is not a number",
            self.raw, self.criterion, self.paper, self.reviewer
        )
    }
}

impl std::error::Error for EncodingError {}

// Copyright 2024. The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
//

use std::{cmp::Ordering, fmt::Debug, sync::Arc};

use crate::blocks::{BlockHeader, ChainHeader};

/// Orders two chain tips by strength. `Ordering::Greater` means `a` is the stronger tip.
pub trait ChainStrengthComparer: Debug {
    fn compare(&self, a: &ChainHeader, b: &ChainHeader) -> Ordering;
}

/// Applies `before`, falling back to `after` on a tie
#[derive(Debug)]
pub struct ThenComparer {
    before: Box<dyn ChainStrengthComparer + Send + Sync>,
    after: Box<dyn ChainStrengthComparer + Send + Sync>,
}

impl ThenComparer {
    pub fn new(
        before: Box<dyn ChainStrengthComparer + Send + Sync>,
        after: Box<dyn ChainStrengthComparer + Send + Sync>,
    ) -> Self {
        ThenComparer { before, after }
    }
}

impl ChainStrengthComparer for ThenComparer {
    fn compare(&self, a: &ChainHeader, b: &ChainHeader) -> Ordering {
        match self.before.compare(a, b) {
            Ordering::Equal => self.after.compare(a, b),
            ordering => ordering,
        }
    }
}

/// More total difficulty is stronger
#[derive(Default, Debug)]
pub struct TotalDifficultyComparer {}

impl ChainStrengthComparer for TotalDifficultyComparer {
    fn compare(&self, a: &ChainHeader, b: &ChainHeader) -> Ordering {
        a.total_difficulty().cmp(&b.total_difficulty())
    }
}

/// At equal weight the shorter chain is stronger. This reduces the gain of withholding blocks (selfish mining).
#[derive(Default, Debug)]
pub struct LowerNumberComparer {}

impl ChainStrengthComparer for LowerNumberComparer {
    fn compare(&self, a: &ChainHeader, b: &ChainHeader) -> Ordering {
        b.number().cmp(&a.number())
    }
}

/// Predicate marking tips that should be kept in preference to others, e.g. blocks mined locally
pub type PreserveFn = dyn Fn(&BlockHeader) -> bool + Send + Sync;

/// A preserved tip is stronger than one that is not
pub struct PreferenceComparer {
    preserve: Arc<PreserveFn>,
}

impl PreferenceComparer {
    pub fn new(preserve: Arc<PreserveFn>) -> Self {
        Self { preserve }
    }
}

impl Debug for PreferenceComparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PreferenceComparer")
    }
}

impl ChainStrengthComparer for PreferenceComparer {
    fn compare(&self, a: &ChainHeader, b: &ChainHeader) -> Ordering {
        (self.preserve)(a.header()).cmp(&(self.preserve)(b.header()))
    }
}

/// The lexicographically larger hash is stronger. Deterministic, so that every node resolves the tie the same way.
#[derive(Default, Debug)]
pub struct HashComparer {}

impl ChainStrengthComparer for HashComparer {
    fn compare(&self, a: &ChainHeader, b: &ChainHeader) -> Ordering {
        a.hash().cmp(b.hash())
    }
}

#[derive(Default)]
pub struct ChainStrengthComparerBuilder {
    target: Option<Box<dyn ChainStrengthComparer + Send + Sync>>,
}

impl ChainStrengthComparerBuilder {
    pub fn new() -> ChainStrengthComparerBuilder {
        ChainStrengthComparerBuilder { target: None }
    }

    fn add_comparer_as_then(mut self, inner: Box<dyn ChainStrengthComparer + Send + Sync>) -> Self {
        self.target = match self.target {
            Some(t) => Some(Box::new(ThenComparer::new(t, inner))),
            None => Some(inner),
        };
        self
    }

    pub fn by_total_difficulty(self) -> Self {
        self.add_comparer_as_then(Box::new(TotalDifficultyComparer::default()))
    }

    pub fn by_lower_number(self) -> Self {
        self.add_comparer_as_then(Box::new(LowerNumberComparer::default()))
    }

    pub fn by_preference(self, preserve: Arc<PreserveFn>) -> Self {
        self.add_comparer_as_then(Box::new(PreferenceComparer::new(preserve)))
    }

    pub fn by_hash(self) -> Self {
        self.add_comparer_as_then(Box::new(HashComparer::default()))
    }

    pub fn then(self) -> Self {
        // convenience method for wording
        self
    }

    /// Builds the comparer chain. An empty builder compares by total difficulty alone.
    pub fn build(self) -> Box<dyn ChainStrengthComparer + Send + Sync> {
        self.target
            .unwrap_or_else(|| Box::new(TotalDifficultyComparer::default()))
    }
}

pub fn strongest_chain() -> ChainStrengthComparerBuilder {
    ChainStrengthComparerBuilder::new()
}

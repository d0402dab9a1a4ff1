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

//! The boundary between the chain and the state database: which state roots have been durably committed.

use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

use crate::types::FixedHash;

pub trait StateCommitBoundary: Send + Sync {
    /// Returns true if the full state for `root` is available locally
    fn is_committed(&self, root: &FixedHash) -> bool;
}

/// Keeps the set of committed roots in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStateBoundary {
    committed: Arc<RwLock<HashSet<FixedHash>>>,
}

impl MemoryStateBoundary {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn commit(&self, root: FixedHash) {
        if let Ok(mut committed) = self.committed.write() {
            committed.insert(root);
        }
    }

    /// Forgets a root, as if its trie nodes had been garbage collected
    pub fn dereference(&self, root: &FixedHash) {
        if let Ok(mut committed) = self.committed.write() {
            committed.remove(root);
        }
    }

    pub fn len(&self) -> usize {
        self.committed.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateCommitBoundary for MemoryStateBoundary {
    fn is_committed(&self, root: &FixedHash) -> bool {
        self.committed.read().map(|c| c.contains(root)).unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_tracks_committed_roots() {
        let boundary = MemoryStateBoundary::new();
        let root = FixedHash::digest(b"root");
        assert!(!boundary.is_committed(&root));
        boundary.commit(root);
        assert!(boundary.is_committed(&root));
        assert_eq!(boundary.len(), 1);
        boundary.dereference(&root);
        assert!(!boundary.is_committed(&root));
        assert!(boundary.is_empty());
    }
}

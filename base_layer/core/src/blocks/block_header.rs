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

use std::{
    fmt,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::types::{BlockHash, Difficulty, FixedHash};

/// The header of a block. A header is identified by its [hash](BlockHeader::hash), which commits to every field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Height of this block since the genesis block (height 0)
    pub number: u64,
    /// Hash of the parent block. Zero for the genesis block.
    pub parent_hash: BlockHash,
    /// Root of the state trie after applying this block
    pub state_root: FixedHash,
    /// The work this block contributes to its chain's total difficulty
    pub difficulty: Difficulty,
    pub gas_limit: u64,
    pub gas_used: u64,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    pub extra: Vec<u8>,
}

impl BlockHeader {
    /// Creates an otherwise empty header on top of `parent`
    pub fn from_parent(parent: &BlockHeader) -> Self {
        BlockHeader {
            number: parent.number + 1,
            parent_hash: parent.hash(),
            state_root: FixedHash::zero(),
            difficulty: parent.difficulty,
            gas_limit: parent.gas_limit,
            gas_used: 0,
            timestamp: parent.timestamp + 10,
            extra: Vec::new(),
        }
    }

    pub fn hash(&self) -> BlockHash {
        let mut difficulty = [0u8; 32];
        self.difficulty.to_big_endian(&mut difficulty);
        let hasher = Keccak256::new()
            .chain_update(self.parent_hash.as_slice())
            .chain_update(self.number.to_be_bytes())
            .chain_update(self.state_root.as_slice())
            .chain_update(difficulty)
            .chain_update(self.gas_limit.to_be_bytes())
            .chain_update(self.gas_used.to_be_bytes())
            .chain_update(self.timestamp.to_be_bytes())
            .chain_update((self.extra.len() as u64).to_be_bytes())
            .chain_update(&self.extra);
        FixedHash::finalize(hasher)
    }

    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }
}

impl Display for BlockHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number: {}", self.number)?;
        writeln!(f, "Hash: {}", self.hash())?;
        writeln!(f, "Parent: {}", self.parent_hash)?;
        writeln!(f, "State root: {}", self.state_root)?;
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        write!(f, "Timestamp: {}", self.timestamp)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn genesis() -> BlockHeader {
        BlockHeader {
            number: 0,
            parent_hash: FixedHash::zero(),
            state_root: FixedHash::digest(b"genesis"),
            difficulty: Difficulty::from(1),
            gas_limit: 8_000_000,
            gas_used: 0,
            timestamp: 0,
            extra: vec![],
        }
    }

    #[test]
    fn hash_commits_to_every_field() {
        let header = genesis();
        let hash = header.hash();
        assert_eq!(hash, genesis().hash());

        let mut other = genesis();
        other.extra = vec![1];
        assert_ne!(other.hash(), hash);
        let mut other = genesis();
        other.difficulty = Difficulty::from(2);
        assert_ne!(other.hash(), hash);
        let mut other = genesis();
        other.timestamp = 1;
        assert_ne!(other.hash(), hash);
    }

    #[test]
    fn from_parent_links_the_chain() {
        let parent = genesis();
        let child = BlockHeader::from_parent(&parent);
        assert_eq!(child.number, 1);
        assert_eq!(child.parent_hash, parent.hash());
        assert!(parent.is_genesis());
        assert!(!child.is_genesis());
    }
}

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

use serde::{Deserialize, Serialize};

use crate::{
    blocks::BlockHeader,
    types::{BlockHash, Difficulty},
};

/// A header paired with its hash and the total difficulty of the chain it terminates
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHeader {
    header: BlockHeader,
    hash: BlockHash,
    total_difficulty: Difficulty,
}

impl ChainHeader {
    pub fn new(header: BlockHeader, total_difficulty: Difficulty) -> Self {
        let hash = header.hash();
        Self {
            header,
            hash,
            total_difficulty,
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn total_difficulty(&self) -> Difficulty {
        self.total_difficulty
    }

    pub fn into_header(self) -> BlockHeader {
        self.header
    }
}

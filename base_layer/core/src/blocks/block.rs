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

use crate::{
    blocks::BlockHeader,
    types::{BlockHash, Difficulty, FixedHash},
};

/// An opaque transaction. Execution is handled by the block processor; the chain only stores and counts them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_limit: u64,
    pub payload: Vec<u8>,
}

impl Transaction {
    pub fn hash(&self) -> FixedHash {
        let hasher = Keccak256::new()
            .chain_update(self.nonce.to_be_bytes())
            .chain_update(self.gas_limit.to_be_bytes())
            .chain_update(&self.payload);
        FixedHash::finalize(hasher)
    }
}

/// The outcome of executing a single transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: FixedHash,
    pub success: bool,
    pub cumulative_gas_used: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
    pub uncles: Vec<BlockHeader>,
}

impl BlockBody {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.uncles.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    /// A block with an empty body
    pub fn from_header(header: BlockHeader) -> Self {
        Self {
            header,
            body: BlockBody::default(),
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn parent_hash(&self) -> &BlockHash {
        &self.header.parent_hash
    }

    pub fn difficulty(&self) -> Difficulty {
        self.header.difficulty
    }

    pub fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.body.transactions
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------------- Block -----------------")?;
        writeln!(f, "{}", self.header)?;
        write!(
            f,
            "Transactions: {}, uncles: {}",
            self.body.transactions.len(),
            self.body.uncles.len()
        )
    }
}

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

use thiserror::Error;

use crate::types::BlockHash;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Block #{number} [{hash:?}] is already known")]
    KnownBlock { number: u64, hash: BlockHash },
    #[error("Unknown ancestor [{parent_hash:?}] of block #{number}")]
    UnknownAncestor { number: u64, parent_hash: BlockHash },
    #[error("Block #{number} has a timestamp {timestamp} in the future")]
    FutureBlock { number: u64, timestamp: u64 },
    #[error("Invalid header #{number}: {reason}")]
    InvalidHeader { number: u64, reason: String },
    #[error("Invalid body #{number}: {reason}")]
    InvalidBody { number: u64, reason: String },
    #[error("Block #{number} could not be processed: {reason}")]
    ProcessingFailed { number: u64, reason: String },
    #[error("Header verification stopped before a result for #{number} was delivered")]
    VerificationAborted { number: u64 },
}

impl ValidationError {
    /// Known blocks are skipped rather than treated as a failure
    pub fn is_known_block(&self) -> bool {
        matches!(self, ValidationError::KnownBlock { .. })
    }
}

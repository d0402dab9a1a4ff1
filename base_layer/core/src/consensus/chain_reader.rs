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

use crate::{
    blocks::BlockHeader,
    chain_storage::ChainStorageError,
    consensus::{ChainConfig, ForkChoiceError},
    types::{BlockHash, Difficulty},
};

/// Read access to the chain needed by fork choice
pub trait ChainReader: Send + Sync {
    fn config(&self) -> &ChainConfig;

    /// The total difficulty of the chain ending in the given block, if the block is known
    fn get_td(&self, hash: &BlockHash, number: u64) -> Result<Option<Difficulty>, ChainStorageError>;
}

/// An external finality oracle (checkpoints, milestones) that can veto chain segments regardless of their difficulty.
pub trait ChainValidator: Send + Sync {
    /// Returns false if importing `headers` on top of a chain whose head is `current` would conflict with finality.
    fn is_valid_chain(&self, current: &BlockHeader, headers: &[BlockHeader]) -> Result<bool, ForkChoiceError>;

    /// Records a newly finalised block
    fn process_checkpoint(&self, number: u64, hash: BlockHash);

    /// Every checkpoint recorded so far, oldest first
    fn get_checkpoints(&self) -> Vec<(u64, BlockHash)>;
}

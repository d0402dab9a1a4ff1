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

use tokio::sync::mpsc;

use crate::{
    blocks::{Block, BlockHeader, Receipt},
    validation::ValidationError,
};

/// Yields exactly one verification result per submitted header, in submission order. Dropping the receiver tells the
/// producer to stop.
pub type HeaderVerificationResults = mpsc::Receiver<Result<(), ValidationError>>;

/// Consensus rules: header verification (seal, difficulty, timestamps) and body checks that need no chain state.
pub trait ConsensusEngine: Send + Sync {
    /// Starts verifying `headers`, which are assumed to form a contiguous chain. Implementations are free to verify in
    /// parallel but must deliver the results in order.
    fn verify_headers(&self, headers: &[BlockHeader]) -> HeaderVerificationResults;

    /// Stateless body checks, e.g. transaction and uncle commitments
    fn validate_body(&self, block: &Block) -> Result<(), ValidationError>;
}

/// Body validation as seen by the insertion iterator. The chain wraps the consensus engine's checks with checks
/// against its own contents (known blocks, missing parents).
pub trait BodyValidator {
    fn validate_body(&self, block: &Block) -> Result<(), ValidationError>;
}

/// The result of executing a block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub receipts: Vec<Receipt>,
    pub gas_used: u64,
}

/// Executes blocks on top of their parent's state. Execution itself happens outside the chain database; the chain
/// only persists the resulting receipts.
pub trait BlockProcessor: Send + Sync {
    fn process(&self, block: &Block, parent: &BlockHeader) -> Result<ProcessOutcome, ValidationError>;
}

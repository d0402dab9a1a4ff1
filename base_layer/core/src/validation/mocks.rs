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
    collections::HashMap,
    sync::{Arc, RwLock},
    thread,
};

use chrono::Utc;
use tokio::sync::mpsc;

use crate::{
    blocks::{Block, BlockHeader, Receipt},
    consensus::{ChainValidator, ForkChoiceError},
    types::BlockHash,
    validation::{BlockProcessor, ConsensusEngine, HeaderVerificationResults, ProcessOutcome, ValidationError},
};

/// A consensus engine that accepts everything except the failures it has been told to report. Results are delivered
/// from a separate thread through a small bounded channel.
#[derive(Clone, Default)]
pub struct MockConsensusEngine {
    header_failures: Arc<RwLock<HashMap<u64, ValidationError>>>,
    body_failures: Arc<RwLock<HashMap<u64, ValidationError>>>,
    max_future_drift: Option<u64>,
}

impl MockConsensusEngine {
    pub fn new() -> Self {
        Default::default()
    }

    /// Headers with a timestamp more than `drift` seconds ahead of the wall clock fail with `FutureBlock`
    pub fn with_future_check(mut self, drift: u64) -> Self {
        self.max_future_drift = Some(drift);
        self
    }

    pub fn fail_header_at(&self, number: u64, err: ValidationError) {
        if let Ok(mut failures) = self.header_failures.write() {
            failures.insert(number, err);
        }
    }

    pub fn fail_body_at(&self, number: u64, err: ValidationError) {
        if let Ok(mut failures) = self.body_failures.write() {
            failures.insert(number, err);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.header_failures.write() {
            failures.clear();
        }
        if let Ok(mut failures) = self.body_failures.write() {
            failures.clear();
        }
    }

    fn check_header(&self, header: &BlockHeader) -> Result<(), ValidationError> {
        if let Some(err) = self.header_failures.read().ok().and_then(|f| f.get(&header.number).cloned()) {
            return Err(err);
        }
        if let Some(drift) = self.max_future_drift {
            let now = Utc::now().timestamp().max(0) as u64;
            if header.timestamp > now + drift {
                return Err(ValidationError::FutureBlock {
                    number: header.number,
                    timestamp: header.timestamp,
                });
            }
        }
        Ok(())
    }
}

impl ConsensusEngine for MockConsensusEngine {
    fn verify_headers(&self, headers: &[BlockHeader]) -> HeaderVerificationResults {
        let (tx, rx) = mpsc::channel(4);
        let results = headers.iter().map(|h| self.check_header(h)).collect::<Vec<_>>();
        thread::spawn(move || {
            for result in results {
                if tx.blocking_send(result).is_err() {
                    // Receiver dropped, verification was abandoned
                    break;
                }
            }
        });
        rx
    }

    fn validate_body(&self, block: &Block) -> Result<(), ValidationError> {
        match self.body_failures.read().ok().and_then(|f| f.get(&block.number()).cloned()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Produces one successful receipt per transaction, charging each transaction its full gas limit
#[derive(Clone, Default)]
pub struct MockBlockProcessor;

impl BlockProcessor for MockBlockProcessor {
    fn process(&self, block: &Block, _parent: &BlockHeader) -> Result<ProcessOutcome, ValidationError> {
        let mut gas_used = 0u64;
        let receipts = block
            .transactions()
            .iter()
            .map(|tx| {
                gas_used += tx.gas_limit;
                Receipt {
                    tx_hash: tx.hash(),
                    success: true,
                    cumulative_gas_used: gas_used,
                }
            })
            .collect();
        Ok(ProcessOutcome { receipts, gas_used })
    }
}

type ValidChainFn = dyn Fn(&BlockHeader, &[BlockHeader]) -> Result<bool, ForkChoiceError> + Send + Sync;

/// A chain validator driven by a closure
#[derive(Clone)]
pub struct MockChainValidator {
    is_valid: Arc<ValidChainFn>,
    checkpoints: Arc<RwLock<Vec<(u64, BlockHash)>>>,
}

impl MockChainValidator {
    pub fn new<F>(is_valid: F) -> Self
    where F: Fn(&BlockHeader, &[BlockHeader]) -> Result<bool, ForkChoiceError> + Send + Sync + 'static {
        Self {
            is_valid: Arc::new(is_valid),
            checkpoints: Default::default(),
        }
    }

    /// A validator that gives the same verdict for every chain
    pub fn constant(valid: bool) -> Self {
        Self::new(move |_, _| Ok(valid))
    }
}

impl ChainValidator for MockChainValidator {
    fn is_valid_chain(&self, current: &BlockHeader, headers: &[BlockHeader]) -> Result<bool, ForkChoiceError> {
        (self.is_valid)(current, headers)
    }

    fn process_checkpoint(&self, number: u64, hash: BlockHash) {
        if let Ok(mut checkpoints) = self.checkpoints.write() {
            checkpoints.push((number, hash));
        }
    }

    fn get_checkpoints(&self) -> Vec<(u64, BlockHash)> {
        self.checkpoints.read().map(|c| c.clone()).unwrap_or_default()
    }
}

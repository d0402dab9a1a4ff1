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

use std::sync::RwLock;

use log::*;

use crate::{
    blocks::BlockHeader,
    consensus::{ChainValidator, ForkChoiceError},
    types::BlockHash,
};

const LOG_TARGET: &str = "c::cs::checkpoint_validator";

/// A [ChainValidator] backed by locally recorded checkpoints.
///
/// A segment is rejected when it carries a header at the latest checkpoint height with a different hash, when it would
/// rewind the chain below that checkpoint, or when it reaches further than `max_future_chain_length` blocks ahead of
/// the current head.
#[derive(Debug, Default)]
pub struct CheckpointValidator {
    checkpoints: RwLock<Vec<(u64, BlockHash)>>,
    max_future_chain_length: Option<u64>,
}

impl CheckpointValidator {
    pub fn new(max_future_chain_length: Option<u64>) -> Self {
        Self {
            checkpoints: RwLock::new(Vec::new()),
            max_future_chain_length,
        }
    }

    fn latest(&self) -> Result<Option<(u64, BlockHash)>, ForkChoiceError> {
        let lock = self
            .checkpoints
            .read()
            .map_err(|_| ForkChoiceError::ValidatorError("checkpoint lock poisoned".to_string()))?;
        Ok(lock.last().copied())
    }
}

impl ChainValidator for CheckpointValidator {
    fn is_valid_chain(&self, current: &BlockHeader, headers: &[BlockHeader]) -> Result<bool, ForkChoiceError> {
        let last = match headers.last() {
            Some(h) => h,
            None => return Ok(true),
        };

        if let Some(limit) = self.max_future_chain_length {
            if last.number > current.number.saturating_add(limit) {
                debug!(
                    target: LOG_TARGET,
                    "Rejecting chain ending at #{}, more than {} blocks ahead of #{}", last.number, limit, current.number
                );
                return Ok(false);
            }
        }

        let (number, hash) = match self.latest()? {
            Some(c) => c,
            None => return Ok(true),
        };

        if last.number < number {
            // The whole segment sits below the checkpoint. It may only replace our chain if we haven't passed it.
            return Ok(current.number < number);
        }

        match headers.iter().find(|h| h.number == number) {
            Some(h) if h.hash() != hash => {
                warn!(
                    target: LOG_TARGET,
                    "Rejecting chain conflicting with checkpoint #{} [{}]", number, hash
                );
                Ok(false)
            },
            _ => Ok(true),
        }
    }

    fn process_checkpoint(&self, number: u64, hash: BlockHash) {
        match self.checkpoints.write() {
            Ok(mut lock) => {
                if lock.last().map(|(n, _)| *n < number).unwrap_or(true) {
                    debug!(target: LOG_TARGET, "New checkpoint #{} [{}]", number, hash);
                    lock.push((number, hash));
                }
            },
            Err(_) => error!(target: LOG_TARGET, "Checkpoint lock poisoned, dropping checkpoint #{}", number),
        }
    }

    fn get_checkpoints(&self) -> Vec<(u64, BlockHash)> {
        self.checkpoints.read().map(|lock| lock.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::make_chain_headers;

    #[test]
    fn no_checkpoint_accepts_everything() {
        let headers = make_chain_headers(10);
        let validator = CheckpointValidator::new(None);
        assert!(validator.is_valid_chain(&headers[0], &headers[1..]).unwrap());
        assert!(validator.is_valid_chain(&headers[0], &[]).unwrap());
    }

    #[test]
    fn rejects_conflicting_checkpoint() {
        let headers = make_chain_headers(10);
        let validator = CheckpointValidator::new(None);
        validator.process_checkpoint(5, headers[5].hash());
        assert!(validator.is_valid_chain(&headers[0], &headers[1..]).unwrap());

        let mut forked = headers[5].clone();
        forked.extra = vec![0xff];
        assert!(!validator.is_valid_chain(&headers[4], &[forked]).unwrap());
    }

    #[test]
    fn rejects_rewind_below_checkpoint() {
        let headers = make_chain_headers(10);
        let validator = CheckpointValidator::new(None);
        validator.process_checkpoint(5, headers[5].hash());
        assert!(!validator.is_valid_chain(&headers[9], &headers[1..4]).unwrap());
        assert!(validator.is_valid_chain(&headers[3], &headers[1..4]).unwrap());
    }

    #[test]
    fn rejects_far_future_chains() {
        let headers = make_chain_headers(10);
        let validator = CheckpointValidator::new(Some(3));
        assert!(validator.is_valid_chain(&headers[0], &headers[1..4]).unwrap());
        assert!(!validator.is_valid_chain(&headers[0], &headers[1..5]).unwrap());
    }

    #[test]
    fn checkpoints_only_move_forward() {
        let validator = CheckpointValidator::new(None);
        validator.process_checkpoint(5, BlockHash::digest(b"5"));
        validator.process_checkpoint(3, BlockHash::digest(b"3"));
        validator.process_checkpoint(8, BlockHash::digest(b"8"));
        let numbers = validator.get_checkpoints().into_iter().map(|(n, _)| n).collect::<Vec<_>>();
        assert_eq!(numbers, vec![5, 8]);
    }
}

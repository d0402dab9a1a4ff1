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
    blocks::Block,
    validation::{BodyValidator, HeaderVerificationResults, ValidationError},
};

/// Walks a contiguous batch of blocks alongside the header verification results for them.
///
/// Header results arrive asynchronously; `next` and `peek` block until the result for the requested position is
/// available. Body validation is only run by `next`, and only for blocks whose header passed. Its result is kept
/// per position.
pub struct InsertIterator<'a, V> {
    chain: &'a [Block],
    results: HeaderVerificationResults,
    header_results: Vec<Result<(), ValidationError>>,
    body_results: Vec<Result<(), ValidationError>>,
    index: isize,
    validator: V,
}

impl<'a, V: BodyValidator> InsertIterator<'a, V> {
    pub fn new(chain: &'a [Block], results: HeaderVerificationResults, validator: V) -> Self {
        Self {
            chain,
            results,
            header_results: Vec::with_capacity(chain.len()),
            body_results: Vec::with_capacity(chain.len()),
            index: -1,
            validator,
        }
    }

    /// Advances to the next block and returns it with its validation result, or `None` past the end.
    pub fn next(&mut self) -> Option<(&'a Block, Result<(), ValidationError>)> {
        let pos = (self.index + 1) as usize;
        let block = self.chain.get(pos)?;
        self.index += 1;
        if self.body_results.len() <= pos {
            let result = self.header_result(pos).and_then(|_| self.validator.validate_body(block));
            self.body_results.push(result);
        }
        Some((block, self.body_results[pos].clone()))
    }

    /// Returns the next block with its header result without advancing or validating the body.
    pub fn peek(&mut self) -> Option<(&'a Block, Result<(), ValidationError>)> {
        let pos = (self.index + 1) as usize;
        let block = self.chain.get(pos)?;
        Some((block, self.header_result(pos)))
    }

    pub fn previous(&self) -> Option<&'a Block> {
        self.at(self.index - 1)
    }

    pub fn current(&self) -> Option<&'a Block> {
        self.at(self.index)
    }

    /// The validation result `next` returned for the current block
    pub fn current_result(&self) -> Option<Result<(), ValidationError>> {
        if self.index < 0 {
            return None;
        }
        self.body_results.get(self.index as usize).cloned()
    }

    pub fn first(&self) -> Option<&'a Block> {
        self.chain.first()
    }

    /// The position of the current block, `-1` before the first call to `next`
    pub fn index(&self) -> isize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        (self.chain.len() as isize - self.index - 1).max(0) as usize
    }

    pub fn processed(&self) -> usize {
        (self.index + 1) as usize
    }

    fn at(&self, index: isize) -> Option<&'a Block> {
        if index < 0 {
            return None;
        }
        self.chain.get(index as usize)
    }

    fn header_result(&mut self, pos: usize) -> Result<(), ValidationError> {
        while self.header_results.len() <= pos {
            let n = self.header_results.len();
            let result = self.results.blocking_recv().unwrap_or_else(|| {
                Err(ValidationError::VerificationAborted {
                    number: self.chain[n].number(),
                })
            });
            self.header_results.push(result);
        }
        self.header_results[pos].clone()
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;
    use crate::{
        test_helpers::make_chain,
        validation::{mocks::MockConsensusEngine, ConsensusEngine},
    };

    struct RejectNumber(u64);

    impl BodyValidator for RejectNumber {
        fn validate_body(&self, block: &Block) -> Result<(), ValidationError> {
            if block.number() == self.0 {
                return Err(ValidationError::InvalidBody {
                    number: block.number(),
                    reason: "rejected".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn it_walks_the_batch_in_order() {
        let chain = make_chain(5);
        let engine = MockConsensusEngine::new();
        let headers = chain.iter().map(|b| b.header.clone()).collect::<Vec<_>>();
        let mut it = InsertIterator::new(&chain, engine.verify_headers(&headers), RejectNumber(3));
        assert!(it.current().is_none());
        assert_eq!(it.remaining(), 5);
        assert_eq!(it.first().unwrap().number(), 0);

        let (peeked, result) = it.peek().unwrap();
        assert_eq!(peeked.number(), 0);
        assert!(result.is_ok());
        assert_eq!(it.processed(), 0);

        for n in 0..3 {
            let (block, result) = it.next().unwrap();
            assert_eq!(block.number(), n);
            assert!(result.is_ok());
        }
        assert_eq!(it.previous().unwrap().number(), 1);
        assert_eq!(it.current().unwrap().number(), 2);

        // Peek only reports the header result
        assert!(it.peek().unwrap().1.is_ok());
        let (block, result) = it.next().unwrap();
        assert_eq!(block.number(), 3);
        assert!(matches!(result, Err(ValidationError::InvalidBody { number: 3, .. })));
        assert_eq!(it.processed(), 4);
        assert_eq!(it.remaining(), 1);
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert_eq!(it.processed(), 5);
    }

    struct CountingValidator {
        calls: Cell<usize>,
        reject: u64,
    }

    impl BodyValidator for &CountingValidator {
        fn validate_body(&self, block: &Block) -> Result<(), ValidationError> {
            self.calls.set(self.calls.get() + 1);
            RejectNumber(self.reject).validate_body(block)
        }
    }

    #[test]
    fn body_results_are_kept() {
        let chain = make_chain(3);
        let engine = MockConsensusEngine::new();
        let headers = chain.iter().map(|b| b.header.clone()).collect::<Vec<_>>();
        let validator = CountingValidator {
            calls: Cell::new(0),
            reject: 1,
        };
        let mut it = InsertIterator::new(&chain, engine.verify_headers(&headers), &validator);
        assert!(it.current_result().is_none());
        assert!(it.next().unwrap().1.is_ok());
        assert!(it.peek().unwrap().1.is_ok());
        let (_, result) = it.next().unwrap();
        assert!(matches!(result, Err(ValidationError::InvalidBody { number: 1, .. })));
        assert_eq!(validator.calls.get(), 2);

        assert_eq!(it.current_result(), Some(result));
        assert_eq!(validator.calls.get(), 2);
    }

    #[test]
    fn header_failures_skip_body_validation() {
        let chain = make_chain(3);
        let engine = MockConsensusEngine::new();
        engine.fail_header_at(1, ValidationError::InvalidHeader {
            number: 1,
            reason: "bad seal".to_string(),
        });
        let headers = chain.iter().map(|b| b.header.clone()).collect::<Vec<_>>();
        let mut it = InsertIterator::new(&chain, engine.verify_headers(&headers), RejectNumber(1));
        assert!(it.next().unwrap().1.is_ok());
        let (_, result) = it.next().unwrap();
        assert!(matches!(result, Err(ValidationError::InvalidHeader { number: 1, .. })));
    }

    #[test]
    fn closed_channel_aborts_verification() {
        let chain = make_chain(2);
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        drop(tx);
        let mut it = InsertIterator::new(&chain, rx, RejectNumber(99));
        let (_, result) = it.next().unwrap();
        assert_eq!(result, Err(ValidationError::VerificationAborted { number: 0 }));
    }
}

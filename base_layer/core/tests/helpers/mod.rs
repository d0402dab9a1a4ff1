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

//! Shared scaffolding for the chain storage scenario tests

pub mod sethead;

use chainhead_core::{
    blocks::Block,
    chain_storage::{BlockchainBackend, BlockchainDatabase},
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Checks that the chain has no number-indexed gaps: once a header, block or receipt set is missing, nothing above
/// it may be present.
pub fn verify_no_gaps<B>(db: &BlockchainDatabase<B>, canonical: bool, inserted: &[Block])
where B: BlockchainBackend + 'static {
    let kind = if canonical { "Canonical" } else { "Sidechain" };

    let mut end = None;
    for i in 0..=inserted.len() as u64 {
        let header = db.get_header_by_number(i).unwrap();
        match (header, end) {
            (None, None) => end = Some(i),
            (Some(_), Some(from)) => panic!("{} header gap between #{}-#{}", kind, from, i - 1),
            _ => {},
        }
    }

    let mut end = None;
    for i in 0..=inserted.len() as u64 {
        let block = db.get_block_by_number(i).unwrap();
        match (block, end) {
            (None, None) => end = Some(i),
            (Some(_), Some(from)) => panic!("{} block gap between #{}-#{}", kind, from, i - 1),
            _ => {},
        }
    }

    let mut end = None;
    for (i, block) in inserted.iter().enumerate() {
        let receipts = db.get_receipts_by_hash(&block.hash()).unwrap();
        match (receipts, end) {
            (None, None) => end = Some(i + 1),
            (Some(_), Some(from)) => panic!("{} receipt gap between #{}-#{}", kind, from, i),
            _ => {},
        }
    }
}

/// Checks that every block of `inserted` up to and including number `head` is fully present and everything above it
/// is gone.
pub fn verify_cutoff<B>(db: &BlockchainDatabase<B>, canonical: bool, inserted: &[Block], head: u64)
where B: BlockchainBackend + 'static {
    let kind = if canonical { "Canonical" } else { "Sidechain" };
    for block in inserted {
        let (hash, number) = (block.hash(), block.number());
        let header = db.header_chain().get_header(&hash, number).unwrap();
        let body = db.get_block(&hash, number).unwrap();
        let receipts = db.get_receipts_by_hash(&hash).unwrap();
        if number <= head {
            assert!(header.is_some(), "{} header #{} [{}] missing before cap {}", kind, number, hash, head);
            assert!(body.is_some(), "{} block #{} [{}] missing before cap {}", kind, number, hash, head);
            assert!(receipts.is_some(), "{} receipts #{} [{}] missing before cap {}", kind, number, hash, head);
        } else {
            assert!(header.is_none(), "{} header #{} [{}] present after cap {}", kind, number, hash, head);
            assert!(body.is_none(), "{} block #{} [{}] present after cap {}", kind, number, hash, head);
            assert!(receipts.is_none(), "{} receipts #{} [{}] present after cap {}", kind, number, hash, head);
        }
    }
}

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

//! A scenario runner for head rewinds over a chain with an optional side chain, a freezer, a committed state root
//! and a fast sync pivot.

use chainhead_core::{
    blocks::Block,
    test_helpers::{blockchain::TestBlockchain, make_chain_with_difficulty},
};

use super::{init_logging, verify_cutoff, verify_no_gaps};

const CANONICAL_DIFFICULTY: u64 = 1_000_000;
const SIDE_DIFFICULTY: u64 = 100_000;

/// The setup of a rewind scenario, and what it should leave behind
#[derive(Debug, Clone, Copy)]
pub struct SetHeadCase {
    /// Number of blocks in the canonical chain
    pub canonical_blocks: usize,
    /// Number of blocks in the lighter side chain forked off genesis
    pub side_blocks: usize,
    /// Distance below the head block at which blocks are frozen
    pub freeze_threshold: u64,
    /// Block whose state is committed, zero for none
    pub commit_block: usize,
    pub pivot_block: Option<u64>,
    pub set_head_block: u64,

    pub expected_canonical_blocks: u64,
    pub expected_side_blocks: u64,
    pub expected_frozen: u64,
    pub expected_head_header: u64,
    pub expected_head_fast_block: u64,
    pub expected_head_block: u64,
}

impl SetHeadCase {
    pub fn new(
        canonical_blocks: usize,
        side_blocks: usize,
        freeze_threshold: u64,
        commit_block: usize,
        pivot_block: Option<u64>,
        set_head_block: u64,
    ) -> Self {
        Self {
            canonical_blocks,
            side_blocks,
            freeze_threshold,
            commit_block,
            pivot_block,
            set_head_block,
            expected_canonical_blocks: 0,
            expected_side_blocks: 0,
            expected_frozen: 0,
            expected_head_header: 0,
            expected_head_fast_block: 0,
            expected_head_block: 0,
        }
    }

    /// Expected chain lengths and frozen boundary after the rewind
    pub fn expect(mut self, canonical: u64, side: u64, frozen: u64) -> Self {
        self.expected_canonical_blocks = canonical;
        self.expected_side_blocks = side;
        self.expected_frozen = frozen;
        self
    }

    /// Expected head markers after the rewind
    pub fn heads(mut self, header: u64, fast_block: u64, block: u64) -> Self {
        self.expected_head_header = header;
        self.expected_head_fast_block = fast_block;
        self.expected_head_block = block;
        self
    }

    pub fn run(self) {
        init_logging();
        let chain = TestBlockchain::with_freezer();
        let db = &chain.db;

        let side = make_chain_with_difficulty(&chain.genesis, self.side_blocks, 1, SIDE_DIFFICULTY);
        if !side.is_empty() {
            db.insert_chain(&side).unwrap();
        }
        let canonical = make_chain_with_difficulty(&chain.genesis, self.canonical_blocks, 0, CANONICAL_DIFFICULTY);
        db.insert_chain(&canonical[..self.commit_block]).unwrap();
        if self.commit_block > 0 {
            chain.state.commit(canonical[self.commit_block - 1].header.state_root);
        }
        db.insert_chain(&canonical[self.commit_block..]).unwrap();

        db.freeze(self.freeze_threshold).unwrap();
        if let Some(pivot) = self.pivot_block {
            db.write_last_pivot_number(pivot).unwrap();
        }

        db.set_head(self.set_head_block).unwrap();

        verify_no_gaps(db, true, &canonical);
        verify_no_gaps(db, false, &side);
        verify_cutoff(db, true, &canonical, self.expected_canonical_blocks);
        verify_cutoff(db, false, &side, self.expected_side_blocks);

        let head = db.chain_head().unwrap();
        assert_eq!(head.header.number, self.expected_head_header, "head header, {:?}", self);
        assert_eq!(head.fast_block.number, self.expected_head_fast_block, "head fast block, {:?}", self);
        assert_eq!(head.block.number, self.expected_head_block, "head block, {:?}", self);
        assert_eq!(db.ancients().unwrap(), self.expected_frozen, "frozen, {:?}", self);
        assert!(head.is_ordered());
        assert_markers_match_loaded_state(&chain, &canonical);
    }
}

/// The persisted markers must describe the same head a restarted node would load
fn assert_markers_match_loaded_state(chain: &TestBlockchain, canonical: &[Block]) {
    let before = chain.db.chain_head().unwrap();
    let reopened = chain.reopen();
    let after = reopened.chain_head().unwrap();
    assert_eq!(before.header.hash(), after.header.hash());
    assert_eq!(before.fast_block.hash(), after.fast_block.hash());
    assert_eq!(before.block.hash(), after.block.hash());
    if after.block.number > 0 {
        assert_eq!(after.block, canonical[after.block.number as usize - 1].header);
    }
}

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

//! Common test helper functions that are small and useful enough to be included in the main crate, rather than the
//! integration test folder.

pub mod blockchain;

use crate::{
    blocks::{Block, BlockBody, BlockHeader, Receipt, Transaction},
    chain_storage::{BlockchainBackend, DbTransaction},
    types::{Difficulty, FixedHash},
};

/// The difficulty of every block built by [make_chain_from]
pub const DEFAULT_DIFFICULTY: u64 = 1_000;

pub const TX_GAS: u64 = 21_000;

/// The genesis block used throughout the tests
pub fn genesis_block() -> Block {
    Block::from_header(BlockHeader {
        number: 0,
        parent_hash: FixedHash::zero(),
        state_root: FixedHash::digest(b"genesis"),
        difficulty: Difficulty::zero(),
        gas_limit: 8_000_000,
        gas_used: 0,
        timestamp: 0,
        extra: vec![],
    })
}

/// A stand-alone header at `number`. It does not link to anything.
pub fn make_header(number: u64) -> BlockHeader {
    BlockHeader {
        number,
        parent_hash: FixedHash::digest(&number.to_be_bytes()),
        state_root: FixedHash::zero(),
        difficulty: Difficulty::from(DEFAULT_DIFFICULTY),
        gas_limit: 8_000_000,
        gas_used: 0,
        timestamp: number * 10,
        extra: vec![],
    }
}

/// The genesis block followed by `len - 1` blocks
pub fn make_chain(len: usize) -> Vec<Block> {
    let genesis = genesis_block();
    let mut chain = make_chain_from(&genesis, len.saturating_sub(1), 0);
    chain.insert(0, genesis);
    chain
}

/// The headers of [make_chain]
pub fn make_chain_headers(len: usize) -> Vec<BlockHeader> {
    make_chain(len).into_iter().map(|b| b.header).collect()
}

/// `len` blocks on top of `parent`. Chains built from the same parent with different salts never share a block.
pub fn make_chain_from(parent: &Block, len: usize, salt: u8) -> Vec<Block> {
    make_chain_with_difficulty(parent, len, salt, DEFAULT_DIFFICULTY)
}

/// `len` blocks on top of `parent`, each with one transaction and the given difficulty
pub fn make_chain_with_difficulty(parent: &Block, len: usize, salt: u8, difficulty: u64) -> Vec<Block> {
    let mut chain = Vec::with_capacity(len);
    let mut parent = parent.header.clone();
    for _ in 0..len {
        let block = make_child(&parent, salt, difficulty);
        parent = block.header.clone();
        chain.push(block);
    }
    chain
}

/// A block on top of `parent` carrying a single transaction
pub fn make_child(parent: &BlockHeader, salt: u8, difficulty: u64) -> Block {
    let mut header = BlockHeader::from_parent(parent);
    header.difficulty = Difficulty::from(difficulty);
    header.extra = vec![salt];
    let mut root = parent.state_root.as_slice().to_vec();
    root.extend_from_slice(&header.number.to_be_bytes());
    root.push(salt);
    header.state_root = FixedHash::digest(&root);
    let tx = Transaction {
        nonce: header.number,
        gas_limit: TX_GAS,
        payload: vec![salt],
    };
    header.gas_used = tx.gas_limit;
    Block::new(header, BlockBody {
        transactions: vec![tx],
        uncles: vec![],
    })
}

/// Header-only version of [make_chain_from]
pub fn make_header_chain_from(parent: &BlockHeader, len: usize, salt: u8) -> Vec<BlockHeader> {
    let mut headers = Vec::with_capacity(len);
    let mut parent = parent.clone();
    for _ in 0..len {
        let header = make_child(&parent, salt, DEFAULT_DIFFICULTY).header;
        parent = header.clone();
        headers.push(header);
    }
    headers
}

/// The receipts the mock block processor produces for `block`
pub fn make_receipts(block: &Block) -> Vec<Receipt> {
    let mut gas_used = 0;
    block
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
        .collect()
}

/// Writes a block with its total difficulty and receipts, without touching the canonical index
pub fn write_block<B: BlockchainBackend + ?Sized>(db: &B, block: &Block) {
    let mut txn = DbTransaction::new();
    add_block(db, &mut txn, block);
    db.write(txn).unwrap();
}

/// Writes a block and makes it the canonical head
pub fn write_canonical_block<B: BlockchainBackend + ?Sized>(db: &B, block: &Block) {
    let mut txn = DbTransaction::new();
    add_block(db, &mut txn, block);
    txn.insert_canonical_hash(block.number(), block.hash())
        .set_head_header_hash(block.hash())
        .set_head_fast_block_hash(block.hash())
        .set_head_block_hash(block.hash());
    db.write(txn).unwrap();
}

fn add_block<B: BlockchainBackend + ?Sized>(db: &B, txn: &mut DbTransaction, block: &Block) {
    let parent_td = match block.number() {
        0 => Difficulty::zero(),
        n => db
            .fetch_total_difficulty(block.parent_hash(), n - 1)
            .unwrap()
            .unwrap_or_default(),
    };
    txn.insert_block(block.clone())
        .insert_total_difficulty(block.hash(), block.number(), parent_td + block.difficulty())
        .insert_receipts(block.hash(), block.number(), make_receipts(block));
}

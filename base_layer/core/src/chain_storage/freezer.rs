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

//! The freeze cycle: moving finalised canonical blocks from the live store into the ancient store.

use std::{collections::HashSet, time::Instant};

use chainhead_storage::{AncientTable, AncientWriteOp, FreezerError};
use log::*;

use crate::{
    blocks::{Block, Receipt},
    chain_storage::{BlockchainBackend, ChainStorageError, DbTransaction},
    types::{BlockHash, Difficulty},
};

const LOG_TARGET: &str = "c::cs::freezer";

struct FrozenBlock {
    block: Block,
    receipts: Vec<Receipt>,
    td: Difficulty,
}

/// Freezes every canonical block at least `threshold` blocks below the head block. Returns the new frozen boundary.
///
/// Frozen blocks are deleted from the live store, except for the genesis block and the hash to number index. Side
/// chain blocks at frozen heights are deleted along with every side chain block descending from them, since nothing
/// can ever link to them again.
pub fn freeze<B>(db: &B, threshold: u64) -> Result<u64, ChainStorageError>
where B: BlockchainBackend + ?Sized {
    let ancients = match db.ancients() {
        Some(a) => a,
        None => return Ok(0),
    };
    let frozen = ancients.ancients()?;

    let head_hash = match db.fetch_head_block_hash()? {
        Some(h) => h,
        None => {
            error!(target: LOG_TARGET, "Current full block hash unavailable");
            return Ok(frozen);
        },
    };
    let number = match db.fetch_header_number(&head_hash)? {
        Some(n) => n,
        None => {
            error!(target: LOG_TARGET, "Current full block number unavailable for {}", head_hash);
            return Ok(frozen);
        },
    };
    if number < threshold {
        debug!(
            target: LOG_TARGET,
            "Current full block #{} not old enough to freeze (threshold {})", number, threshold
        );
        return Ok(frozen);
    }
    let limit = number - threshold;
    if limit <= frozen {
        debug!(
            target: LOG_TARGET,
            "Ancient blocks frozen already (head #{}, frozen {})", number, frozen
        );
        return Ok(frozen);
    }

    let start = Instant::now();
    let first = frozen;
    let mut blocks = Vec::with_capacity((limit - first + 1) as usize);
    for n in first..=limit {
        blocks.push(read_canonical(db, n)?);
    }

    ancients.modify_ancients(&mut |op: &mut dyn AncientWriteOp| {
        for frozen_block in &blocks {
            let n = frozen_block.block.number();
            op.append_value(AncientTable::Headers, n, &frozen_block.block.header)?;
            op.append_value(AncientTable::Hashes, n, &frozen_block.block.hash())?;
            op.append_value(AncientTable::Bodies, n, &frozen_block.block.body)?;
            op.append_value(AncientTable::Receipts, n, &frozen_block.receipts)?;
            op.append_value(AncientTable::Diffs, n, &frozen_block.td)?;
        }
        Ok::<(), FreezerError>(())
    })?;

    let mut txn = DbTransaction::new();
    for frozen_block in &blocks {
        let n = frozen_block.block.number();
        if n != 0 {
            txn.delete_block_without_number(frozen_block.block.hash(), n)
                .delete_canonical_hash(n);
        }
    }
    db.write(txn)?;

    let frozen = ancients.ancients()?;
    let mut txn = DbTransaction::new();
    let mut dangling = Vec::new();
    for n in first..frozen {
        if n == 0 {
            continue;
        }
        dangling = db.fetch_all_hashes(n)?;
        for hash in &dangling {
            trace!(target: LOG_TARGET, "Deleting side chain #{} [{}]", n, hash);
            txn.delete_block(*hash, n);
        }
    }
    db.write(txn)?;

    if frozen > 0 {
        let mut txn = DbTransaction::new();
        let mut tip = frozen;
        while !dangling.is_empty() {
            let drop = dangling.drain(..).collect::<HashSet<BlockHash>>();
            for hash in &drop {
                debug!(target: LOG_TARGET, "Dangling parent from freezer #{} [{}]", tip - 1, hash);
            }
            for hash in db.fetch_all_hashes(tip)? {
                let child = match db.fetch_header(&hash, tip)? {
                    Some(c) => c,
                    None => {
                        error!(target: LOG_TARGET, "Missing dangling header #{} [{}]", tip, hash);
                        continue;
                    },
                };
                if drop.contains(&child.parent_hash) {
                    debug!(
                        target: LOG_TARGET,
                        "Deleting dangling block #{} [{}] (parent {})", tip, hash, child.parent_hash
                    );
                    txn.delete_block(hash, tip);
                    dangling.push(hash);
                }
            }
            tip += 1;
        }
        db.write(txn)?;
    }

    debug!(
        target: LOG_TARGET,
        "Deep froze chain segment: blocks {}, number {}, hash {}, elapsed {:.2?}",
        frozen - first,
        frozen.saturating_sub(1),
        blocks.last().map(|b| b.block.hash()).unwrap_or_default(),
        start.elapsed()
    );
    Ok(frozen)
}

fn read_canonical<B>(db: &B, number: u64) -> Result<FrozenBlock, ChainStorageError>
where B: BlockchainBackend + ?Sized {
    let hash = db
        .fetch_canonical_hash(number)?
        .ok_or_else(|| ChainStorageError::CorruptedDatabase(format!("Canonical hash missing for #{}", number)))?;
    let block = db
        .fetch_block(&hash, number)?
        .ok_or_else(|| ChainStorageError::CorruptedDatabase(format!("Block #{} [{}] missing", number, hash)))?;
    let receipts = db.fetch_receipts(&hash, number)?.ok_or_else(|| {
        ChainStorageError::CorruptedDatabase(format!("Receipts for block #{} [{}] missing", number, hash))
    })?;
    let td = db.fetch_total_difficulty(&hash, number)?.ok_or_else(|| {
        ChainStorageError::CorruptedDatabase(format!("Total difficulty for block #{} [{}] missing", number, hash))
    })?;
    Ok(FrozenBlock { block, receipts, td })
}

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

use std::time::Instant;

use log::*;
use rand::{rngs::OsRng, RngCore};

use crate::{
    blocks::{Block, BlockHeader, Receipt},
    chain_storage::{BlockchainBackend, BlockchainDatabase, ChainHead, ChainInsertError, ChainStorageError, WriteStatus},
    types::{BlockHash, Difficulty, FixedHash},
};

const LOG_TARGET: &str = "c::cs::async_db";

fn trace_log<F, R>(name: &str, f: F) -> R
where F: FnOnce() -> R {
    let start = Instant::now();
    let trace_id = OsRng.next_u32();
    trace!(
        target: LOG_TARGET,
        "[{}] Entered blocking thread. trace_id: '{}'",
        name,
        trace_id
    );
    let ret = f();
    trace!(
        target: LOG_TARGET,
        "[{}] Exited blocking thread after {}ms. trace_id: '{}'",
        name,
        start.elapsed().as_millis(),
        trace_id
    );
    ret
}

macro_rules! make_async {
    ($fn:ident() -> $rtype:ty, $name:expr) => {
        pub async fn $fn(&self) -> Result<$rtype, ChainStorageError> {
            let db = self.db.clone();
            tokio::task::spawn_blocking(move || trace_log($name, move || db.$fn()))
                .await
                .map_err(|err| ChainStorageError::BlockingTaskSpawnError(err.to_string()))
                .and_then(|inner_result| inner_result)
        }
    };

    ($fn:ident($($param:ident:$ptype:ty),+) -> $rtype:ty, $name:expr) => {
        pub async fn $fn(&self, $($param: $ptype),+) -> Result<$rtype, ChainStorageError> {
            let db = self.db.clone();
            tokio::task::spawn_blocking(move || trace_log($name, move || db.$fn($($param),+)))
                .await
                .map_err(|err| ChainStorageError::BlockingTaskSpawnError(err.to_string()))
                .and_then(|inner_result| inner_result)
        }
    };
}

/// Runs [BlockchainDatabase] calls on the blocking thread pool so that async services can use the chain without
/// stalling the runtime.
pub struct AsyncBlockchainDb<B> {
    db: BlockchainDatabase<B>,
}

impl<B: BlockchainBackend + 'static> AsyncBlockchainDb<B> {
    make_async!(current_header() -> BlockHeader, "current_header");

    make_async!(current_fast_block() -> Block, "current_fast_block");

    make_async!(current_block() -> Block, "current_block");

    make_async!(chain_head() -> ChainHead, "chain_head");

    make_async!(get_block_by_number(number: u64) -> Option<Block>, "get_block_by_number");

    make_async!(get_header_by_number(number: u64) -> Option<BlockHeader>, "get_header_by_number");

    make_async!(get_canonical_hash(number: u64) -> Option<BlockHash>, "get_canonical_hash");

    make_async!(ancients() -> u64, "ancients");

    make_async!(set_head(number: u64) -> (), "set_head");

    make_async!(set_head_beyond_root(number: u64, root: Option<FixedHash>, repair: bool) -> u64, "set_head_beyond_root");

    make_async!(reset() -> (), "reset");

    make_async!(freeze(threshold: u64) -> u64, "freeze");

    make_async!(write_last_pivot_number(number: u64) -> (), "write_last_pivot_number");

    make_async!(process_future_blocks() -> (), "process_future_blocks");

    pub async fn get_block_by_hash(&self, hash: BlockHash) -> Result<Option<Block>, ChainStorageError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || trace_log("get_block_by_hash", move || db.get_block_by_hash(&hash))).await?
    }

    pub async fn get_receipts_by_hash(&self, hash: BlockHash) -> Result<Option<Vec<Receipt>>, ChainStorageError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || trace_log("get_receipts_by_hash", move || db.get_receipts_by_hash(&hash)))
            .await?
    }

    pub async fn get_td(&self, hash: BlockHash, number: u64) -> Result<Option<Difficulty>, ChainStorageError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || trace_log("get_td", move || db.get_td(&hash, number))).await?
    }

    pub async fn insert_chain(&self, chain: Vec<Block>) -> Result<Vec<WriteStatus>, ChainInsertError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || trace_log("insert_chain", move || db.insert_chain(&chain)))
            .await
            .map_err(|err| ChainInsertError::new(0, err))?
    }

    pub async fn insert_header_chain(&self, headers: Vec<BlockHeader>) -> Result<WriteStatus, ChainInsertError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || trace_log("insert_header_chain", move || db.insert_header_chain(&headers)))
            .await
            .map_err(|err| ChainInsertError::new(0, err))?
    }

    pub async fn insert_receipt_chain(
        &self,
        blocks: Vec<Block>,
        receipts: Vec<Vec<Receipt>>,
        ancient_limit: u64,
    ) -> Result<usize, ChainInsertError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            trace_log("insert_receipt_chain", move || {
                db.insert_receipt_chain(&blocks, receipts, ancient_limit)
            })
        })
        .await
        .map_err(|err| ChainInsertError::new(0, err))?
    }

    pub fn inner(&self) -> &BlockchainDatabase<B> {
        &self.db
    }

    pub fn into_inner(self) -> BlockchainDatabase<B> {
        self.db
    }
}

impl<B> From<BlockchainDatabase<B>> for AsyncBlockchainDb<B> {
    fn from(db: BlockchainDatabase<B>) -> Self {
        Self { db }
    }
}

impl<B> Clone for AsyncBlockchainDb<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

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

use chainhead_storage::AncientStore;
use log::*;

use crate::{
    blocks::{Block, BlockBody, BlockHeader, Receipt},
    chain_storage::{
        db_transaction::{DbKey, DbTransaction, DbValue, MetadataKey, MetadataValue},
        error::ChainStorageError,
    },
    types::{BlockHash, Difficulty},
};

const LOG_TARGET: &str = "c::cs::backend";

macro_rules! fetch {
    ($db:expr, $key:expr, $key_var:ident) => {{
        let key = $key;
        match $db.fetch(&key) {
            Ok(None) => Ok(None),
            Ok(Some(DbValue::$key_var(v))) => Ok(Some(v)),
            Ok(Some(other)) => unexpected_result(key, other),
            Err(e) => log_error(key, e),
        }
    }};

    (meta $db:expr, $meta_key:ident) => {{
        let key = DbKey::Metadata(MetadataKey::$meta_key);
        match $db.fetch(&key) {
            Ok(None) => Ok(None),
            Ok(Some(DbValue::Metadata(MetadataValue::$meta_key(v)))) => Ok(Some(v)),
            Ok(Some(other)) => unexpected_result(key, other),
            Err(e) => log_error(key, e),
        }
    }};
}

/// Identify behaviour for Blockchain database backends. Implementations must support `Send` and `Sync` so that
/// `BlockchainDatabase` can be thread-safe. The backend *must* also execute transactions atomically; i.e., every
/// operation within it must succeed, or they all fail.
///
/// Data is passed to and from the backend via the [DbKey] and [DbValue] enums. Block data below the freezer boundary
/// lives in the ancient store, and backends with a freezer must serve reads of canonical ancient data transparently
/// through `fetch`. Writes in a [DbTransaction] only ever touch the live store.
pub trait BlockchainBackend: Send + Sync {
    /// Commit the transaction given to the backend. If there is an error, the transaction must be rolled back, and
    /// the error condition returned.
    fn write(&self, tx: DbTransaction) -> Result<(), ChainStorageError>;

    /// Fetch a value from the backend corresponding to the given key. If the value is not found, `fetch` must return
    /// `Ok(None)`. It should only error if there is an access or integrity issue with the underlying backend.
    fn fetch(&self, key: &DbKey) -> Result<Option<DbValue>, ChainStorageError>;

    /// Checks to see whether the given key exists in the backend.
    fn contains(&self, key: &DbKey) -> Result<bool, ChainStorageError>;

    /// Returns the hashes of every header stored in the live store at `number`, canonical or not.
    fn fetch_all_hashes(&self, number: u64) -> Result<Vec<BlockHash>, ChainStorageError>;

    /// Returns `(number, hash)` for every header stored in the live store in the inclusive range `[first, last]`.
    fn fetch_hashes_in_range(&self, first: u64, last: u64) -> Result<Vec<(u64, BlockHash)>, ChainStorageError>;

    /// The ancient store backing this database, if it has one
    fn ancients(&self) -> Option<&dyn AncientStore>;

    /// The freezer boundary: every number below it lives in the ancient store. Zero without a freezer.
    fn frozen(&self) -> Result<u64, ChainStorageError> {
        match self.ancients() {
            Some(ancients) => Ok(ancients.ancients()?),
            None => Ok(0),
        }
    }

    /// The first number still held by the ancient store. Anything below it has been pruned.
    fn ancient_tail(&self) -> Result<u64, ChainStorageError> {
        match self.ancients() {
            Some(ancients) => Ok(ancients.tail()?),
            None => Ok(0),
        }
    }

    fn fetch_header(&self, hash: &BlockHash, number: u64) -> Result<Option<BlockHeader>, ChainStorageError> {
        fetch!(self, DbKey::Header(number, *hash), Header).map(|h: Option<Box<BlockHeader>>| h.map(|h| *h))
    }

    fn fetch_header_number(&self, hash: &BlockHash) -> Result<Option<u64>, ChainStorageError> {
        fetch!(self, DbKey::HeaderNumber(*hash), HeaderNumber)
    }

    fn fetch_total_difficulty(&self, hash: &BlockHash, number: u64) -> Result<Option<Difficulty>, ChainStorageError> {
        fetch!(self, DbKey::TotalDifficulty(number, *hash), TotalDifficulty)
    }

    fn fetch_body(&self, hash: &BlockHash, number: u64) -> Result<Option<BlockBody>, ChainStorageError> {
        fetch!(self, DbKey::Body(number, *hash), Body).map(|b: Option<Box<BlockBody>>| b.map(|b| *b))
    }

    fn fetch_receipts(&self, hash: &BlockHash, number: u64) -> Result<Option<Vec<Receipt>>, ChainStorageError> {
        fetch!(self, DbKey::Receipts(number, *hash), Receipts)
    }

    fn fetch_canonical_hash(&self, number: u64) -> Result<Option<BlockHash>, ChainStorageError> {
        fetch!(self, DbKey::CanonicalHash(number), CanonicalHash)
    }

    /// Fetches the header and body of a block. Returns `None` if either is missing.
    fn fetch_block(&self, hash: &BlockHash, number: u64) -> Result<Option<Block>, ChainStorageError> {
        let header = match self.fetch_header(hash, number)? {
            Some(h) => h,
            None => return Ok(None),
        };
        Ok(self.fetch_body(hash, number)?.map(|body| Block::new(header, body)))
    }

    fn fetch_head_header_hash(&self) -> Result<Option<BlockHash>, ChainStorageError> {
        fetch!(meta self, HeadHeaderHash)
    }

    fn fetch_head_fast_block_hash(&self) -> Result<Option<BlockHash>, ChainStorageError> {
        fetch!(meta self, HeadFastBlockHash)
    }

    fn fetch_head_block_hash(&self) -> Result<Option<BlockHash>, ChainStorageError> {
        fetch!(meta self, HeadBlockHash)
    }

    fn fetch_last_pivot_number(&self) -> Result<Option<u64>, ChainStorageError> {
        fetch!(meta self, LastPivotNumber)
    }

    fn has_header(&self, hash: &BlockHash, number: u64) -> Result<bool, ChainStorageError> {
        self.contains(&DbKey::Header(number, *hash))
    }

    fn has_body(&self, hash: &BlockHash, number: u64) -> Result<bool, ChainStorageError> {
        self.contains(&DbKey::Body(number, *hash))
    }

    fn has_receipts(&self, hash: &BlockHash, number: u64) -> Result<bool, ChainStorageError> {
        self.contains(&DbKey::Receipts(number, *hash))
    }
}

fn unexpected_result<T>(req: DbKey, res: DbValue) -> Result<T, ChainStorageError> {
    let msg = format!("Unexpected result for database query {}. Response: {}", req, res);
    error!(target: LOG_TARGET, "{}", msg);
    Err(ChainStorageError::UnexpectedResult(msg))
}

fn log_error<T>(req: DbKey, err: ChainStorageError) -> Result<T, ChainStorageError> {
    error!(target: LOG_TARGET, "Database access error on request: {}: {}", req, err);
    Err(err)
}

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

//! A memory-based blockchain database with an optional in-memory freezer, generally only useful for testing purposes.

use std::sync::Arc;

use chainhead_storage::{AncientStore, AncientTable, BTreeMapDatabase, KeyValStore, MemoryFreezer, WriteBatch};
use serde::de::DeserializeOwned;

use crate::{
    blocks::{BlockBody, BlockHeader, Receipt},
    chain_storage::{
        blockchain_backend::BlockchainBackend,
        db_transaction::{DbKey, DbKeyValuePair, DbTransaction, DbValue, MetadataKey, MetadataValue, WriteOperation},
        error::ChainStorageError,
    },
    types::{BlockHash, Difficulty, FIXED_HASH_SIZE},
};

const HEADER_PREFIX: u8 = b'h';
const HEADER_NUMBER_PREFIX: u8 = b'H';
const TOTAL_DIFFICULTY_PREFIX: u8 = b't';
const BODY_PREFIX: u8 = b'b';
const RECEIPTS_PREFIX: u8 = b'r';
const CANONICAL_HASH_PREFIX: u8 = b'n';

fn number_key(prefix: u8, number: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8 + FIXED_HASH_SIZE);
    key.push(prefix);
    key.extend_from_slice(&number.to_be_bytes());
    key
}

fn number_hash_key(prefix: u8, number: u64, hash: &BlockHash) -> Vec<u8> {
    let mut key = number_key(prefix, number);
    key.extend_from_slice(hash.as_slice());
    key
}

fn hash_key(prefix: u8, hash: &BlockHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + FIXED_HASH_SIZE);
    key.push(prefix);
    key.extend_from_slice(hash.as_slice());
    key
}

fn metadata_key(key: MetadataKey) -> Vec<u8> {
    match key {
        MetadataKey::HeadHeaderHash => b"LastHeader".to_vec(),
        MetadataKey::HeadFastBlockHash => b"LastFast".to_vec(),
        MetadataKey::HeadBlockHash => b"LastBlock".to_vec(),
        MetadataKey::LastPivotNumber => b"LastPivot".to_vec(),
    }
}

fn encode_key(key: &DbKey) -> Vec<u8> {
    match key {
        DbKey::Metadata(k) => metadata_key(*k),
        DbKey::Header(n, h) => number_hash_key(HEADER_PREFIX, *n, h),
        DbKey::HeaderNumber(h) => hash_key(HEADER_NUMBER_PREFIX, h),
        DbKey::TotalDifficulty(n, h) => number_hash_key(TOTAL_DIFFICULTY_PREFIX, *n, h),
        DbKey::Body(n, h) => number_hash_key(BODY_PREFIX, *n, h),
        DbKey::Receipts(n, h) => number_hash_key(RECEIPTS_PREFIX, *n, h),
        DbKey::CanonicalHash(n) => number_key(CANONICAL_HASH_PREFIX, *n),
    }
}

fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, ChainStorageError> {
    bincode::deserialize(raw).map_err(|e| ChainStorageError::CorruptedDatabase(e.to_string()))
}

/// A memory-backed blockchain database. All data is lost when the program terminates. Block data that has been moved
/// into the freezer is read back from it whenever the requested hash is the canonical ancient one.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    db: Arc<BTreeMapDatabase>,
    freezer: Option<Arc<MemoryFreezer>>,
}

impl MemoryDatabase {
    /// A database without an ancient store
    pub fn new() -> Self {
        Self::default()
    }

    /// A database backed by an in-memory freezer
    pub fn with_freezer() -> Self {
        Self {
            db: Arc::new(BTreeMapDatabase::new()),
            freezer: Some(Arc::new(MemoryFreezer::new())),
        }
    }

    /// The number of records in the live store
    pub fn live_entries(&self) -> Result<usize, ChainStorageError> {
        Ok(self.db.len()?)
    }

    fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, ChainStorageError> {
        Ok(self.db.get(key)?)
    }

    fn fetch_ancient<T: DeserializeOwned>(
        &self,
        table: AncientTable,
        number: u64,
        hash: Option<&BlockHash>,
    ) -> Result<Option<T>, ChainStorageError> {
        let freezer = match self.freezer.as_ref() {
            Some(f) => f,
            None => return Ok(None),
        };
        if let Some(hash) = hash {
            match freezer.ancient(AncientTable::Hashes, number)? {
                Some(raw) if decode::<BlockHash>(&raw)? == *hash => {},
                _ => return Ok(None),
            }
        }
        freezer.ancient(table, number)?.map(|raw| decode(&raw)).transpose()
    }

    /// Reads block data from the freezer if `hash` is the canonical ancient block at `number`, otherwise from the live
    /// store.
    fn fetch_block_data<T: DeserializeOwned>(
        &self,
        table: AncientTable,
        key: &DbKey,
        number: u64,
        hash: &BlockHash,
    ) -> Result<Option<T>, ChainStorageError> {
        match self.fetch_ancient(table, number, Some(hash))? {
            Some(v) => Ok(Some(v)),
            None => self.get(&encode_key(key)),
        }
    }
}

impl BlockchainBackend for MemoryDatabase {
    fn write(&self, tx: DbTransaction) -> Result<(), ChainStorageError> {
        let mut batch = WriteBatch::new();
        for op in tx.into_operations() {
            match op {
                WriteOperation::Insert(kvp) => match kvp {
                    DbKeyValuePair::Metadata(k, v) => batch.put(metadata_key(k), &v)?,
                    DbKeyValuePair::Header(header) => {
                        let key = number_hash_key(HEADER_PREFIX, header.number, &header.hash());
                        batch.put(key, &*header)?
                    },
                    DbKeyValuePair::HeaderNumber(h, n) => batch.put(hash_key(HEADER_NUMBER_PREFIX, &h), &n)?,
                    DbKeyValuePair::TotalDifficulty(n, h, td) => {
                        batch.put(number_hash_key(TOTAL_DIFFICULTY_PREFIX, n, &h), &td)?
                    },
                    DbKeyValuePair::Body(n, h, body) => batch.put(number_hash_key(BODY_PREFIX, n, &h), &*body)?,
                    DbKeyValuePair::Receipts(n, h, receipts) => {
                        batch.put(number_hash_key(RECEIPTS_PREFIX, n, &h), &receipts)?
                    },
                    DbKeyValuePair::CanonicalHash(n, h) => batch.put(number_key(CANONICAL_HASH_PREFIX, n), &h)?,
                },
                WriteOperation::Delete(key) => batch.delete(encode_key(&key)),
            }
        }
        self.db.write_batch(batch)?;
        Ok(())
    }

    fn fetch(&self, key: &DbKey) -> Result<Option<DbValue>, ChainStorageError> {
        let value = match key {
            DbKey::Metadata(_) => self.get::<MetadataValue>(&encode_key(key))?.map(DbValue::Metadata),
            DbKey::Header(n, h) => self
                .fetch_block_data::<BlockHeader>(AncientTable::Headers, key, *n, h)?
                .map(|header| DbValue::Header(Box::new(header))),
            DbKey::HeaderNumber(_) => self.get::<u64>(&encode_key(key))?.map(DbValue::HeaderNumber),
            DbKey::TotalDifficulty(n, h) => self
                .fetch_block_data::<Difficulty>(AncientTable::Diffs, key, *n, h)?
                .map(DbValue::TotalDifficulty),
            DbKey::Body(n, h) => self
                .fetch_block_data::<BlockBody>(AncientTable::Bodies, key, *n, h)?
                .map(|body| DbValue::Body(Box::new(body))),
            DbKey::Receipts(n, h) => self
                .fetch_block_data::<Vec<Receipt>>(AncientTable::Receipts, key, *n, h)?
                .map(DbValue::Receipts),
            DbKey::CanonicalHash(n) => match self.fetch_ancient::<BlockHash>(AncientTable::Hashes, *n, None)? {
                Some(hash) => Some(DbValue::CanonicalHash(hash)),
                None => self.get::<BlockHash>(&encode_key(key))?.map(DbValue::CanonicalHash),
            },
        };
        Ok(value)
    }

    fn contains(&self, key: &DbKey) -> Result<bool, ChainStorageError> {
        match key {
            DbKey::Metadata(_) | DbKey::HeaderNumber(_) => Ok(self.db.exists(&encode_key(key))?),
            _ => Ok(self.fetch(key)?.is_some()),
        }
    }

    fn fetch_all_hashes(&self, number: u64) -> Result<Vec<BlockHash>, ChainStorageError> {
        let prefix = number_key(HEADER_PREFIX, number);
        self.db
            .iter_prefix(&prefix)?
            .into_iter()
            .filter(|(k, _)| k.len() == prefix.len() + FIXED_HASH_SIZE)
            .map(|(k, _)| {
                BlockHash::try_from(&k[prefix.len()..]).map_err(|e| ChainStorageError::CorruptedDatabase(e.to_string()))
            })
            .collect()
    }

    fn fetch_hashes_in_range(&self, first: u64, last: u64) -> Result<Vec<(u64, BlockHash)>, ChainStorageError> {
        let mut hashes = Vec::new();
        for number in first..=last {
            hashes.extend(self.fetch_all_hashes(number)?.into_iter().map(|h| (number, h)));
        }
        Ok(hashes)
    }

    fn ancients(&self) -> Option<&dyn AncientStore> {
        self.freezer.as_deref().map(|f| f as &dyn AncientStore)
    }
}

#[cfg(test)]
mod test {
    use chainhead_storage::AncientWriteOp;

    use super::*;
    use crate::{blocks::Block, test_helpers::make_chain};

    fn write_block(db: &MemoryDatabase, block: &Block) {
        let mut txn = DbTransaction::new();
        txn.insert_block(block.clone())
            .insert_total_difficulty(block.hash(), block.number(), block.difficulty())
            .insert_receipts(block.hash(), block.number(), vec![])
            .insert_canonical_hash(block.number(), block.hash());
        db.write(txn).unwrap();
    }

    #[test]
    fn it_reads_back_live_data() {
        let db = MemoryDatabase::new();
        let chain = make_chain(3);
        for block in &chain {
            write_block(&db, block);
        }
        let block = &chain[1];
        assert_eq!(db.fetch_header(&block.hash(), 1).unwrap().unwrap(), block.header);
        assert_eq!(db.fetch_header_number(&block.hash()).unwrap(), Some(1));
        assert_eq!(db.fetch_canonical_hash(1).unwrap(), Some(block.hash()));
        assert_eq!(db.fetch_block(&block.hash(), 1).unwrap().unwrap(), *block);
        assert_eq!(db.fetch_all_hashes(1).unwrap(), vec![block.hash()]);
        assert!(db.fetch_all_hashes(3).unwrap().is_empty());
        assert!(db.ancients().is_none());
        assert_eq!(db.frozen().unwrap(), 0);

        let mut txn = DbTransaction::new();
        txn.delete_block(block.hash(), 1).delete_canonical_hash(1);
        db.write(txn).unwrap();
        assert!(!db.has_header(&block.hash(), 1).unwrap());
        assert_eq!(db.fetch_header_number(&block.hash()).unwrap(), None);
        assert_eq!(db.fetch_canonical_hash(1).unwrap(), None);
    }

    #[test]
    fn it_keeps_the_total_difficulty_out_of_header_scans() {
        let db = MemoryDatabase::new();
        let chain = make_chain(2);
        write_block(&db, &chain[1]);
        assert_eq!(db.fetch_hashes_in_range(0, 1).unwrap(), vec![(1, chain[1].hash())]);
    }

    #[test]
    fn it_serves_canonical_ancient_data() {
        let db = MemoryDatabase::with_freezer();
        let chain = make_chain(2);
        let genesis = &chain[0];
        let freezer = db.ancients().unwrap();
        freezer
            .modify_ancients(&mut |op: &mut dyn AncientWriteOp| {
                op.append_value(AncientTable::Headers, 0, &genesis.header)?;
                op.append_value(AncientTable::Hashes, 0, &genesis.hash())?;
                op.append_value(AncientTable::Bodies, 0, &genesis.body)?;
                op.append_value(AncientTable::Receipts, 0, &Vec::<Receipt>::new())?;
                op.append_value(AncientTable::Diffs, 0, &genesis.difficulty())
            })
            .unwrap();
        assert_eq!(db.frozen().unwrap(), 1);
        assert_eq!(db.fetch_canonical_hash(0).unwrap(), Some(genesis.hash()));
        assert_eq!(db.fetch_header(&genesis.hash(), 0).unwrap().unwrap(), genesis.header);
        assert_eq!(db.fetch_receipts(&genesis.hash(), 0).unwrap(), Some(vec![]));
        // A different hash at an ancient number is looked up in the live store
        assert_eq!(db.fetch_header(&chain[1].hash(), 0).unwrap(), None);
        // Nothing was written to the live store
        assert_eq!(db.live_entries().unwrap(), 0);
    }
}

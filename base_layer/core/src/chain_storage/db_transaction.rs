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
    fmt,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::{
    blocks::{Block, BlockBody, BlockHeader, Receipt},
    types::{BlockHash, Difficulty},
};

/// An ordered list of write operations that the backend applies atomically.
#[derive(Debug)]
pub struct DbTransaction {
    operations: Vec<WriteOperation>,
}

impl Display for DbTransaction {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str("Db transaction: \n")?;
        for write_op in &self.operations {
            writeln!(fmt, "{}", write_op)?;
        }
        Ok(())
    }
}

impl Default for DbTransaction {
    fn default() -> Self {
        DbTransaction {
            operations: Vec::with_capacity(64),
        }
    }
}

impl DbTransaction {
    /// Creates a new Database transaction. To commit the transaction call [BlockchainBackend::write] with the
    /// transaction as a parameter.
    ///
    /// [BlockchainBackend::write]: crate::chain_storage::BlockchainBackend::write
    pub fn new() -> Self {
        DbTransaction::default()
    }

    /// A general insert request. There are convenience functions for specific insert queries.
    pub fn insert(&mut self, insert: DbKeyValuePair) -> &mut Self {
        self.operations.push(WriteOperation::Insert(insert));
        self
    }

    /// A general delete request. There are convenience functions for specific delete queries.
    pub fn delete(&mut self, delete: DbKey) -> &mut Self {
        self.operations.push(WriteOperation::Delete(delete));
        self
    }

    /// Stores a header together with its hash-to-number mapping
    pub fn insert_header(&mut self, header: BlockHeader) -> &mut Self {
        let hash = header.hash();
        let number = header.number;
        self.insert(DbKeyValuePair::HeaderNumber(hash, number));
        self.insert(DbKeyValuePair::Header(Box::new(header)))
    }

    pub fn insert_total_difficulty(&mut self, hash: BlockHash, number: u64, td: Difficulty) -> &mut Self {
        self.insert(DbKeyValuePair::TotalDifficulty(number, hash, td))
    }

    pub fn insert_body(&mut self, hash: BlockHash, number: u64, body: BlockBody) -> &mut Self {
        self.insert(DbKeyValuePair::Body(number, hash, Box::new(body)))
    }

    pub fn insert_receipts(&mut self, hash: BlockHash, number: u64, receipts: Vec<Receipt>) -> &mut Self {
        self.insert(DbKeyValuePair::Receipts(number, hash, receipts))
    }

    /// Stores the header and body of a block
    pub fn insert_block(&mut self, block: Block) -> &mut Self {
        let hash = block.hash();
        let number = block.number();
        self.insert_body(hash, number, block.body);
        self.insert_header(block.header)
    }

    pub fn insert_canonical_hash(&mut self, number: u64, hash: BlockHash) -> &mut Self {
        self.insert(DbKeyValuePair::CanonicalHash(number, hash))
    }

    pub fn set_head_header_hash(&mut self, hash: BlockHash) -> &mut Self {
        self.set_metadata(MetadataKey::HeadHeaderHash, MetadataValue::HeadHeaderHash(hash))
    }

    pub fn set_head_fast_block_hash(&mut self, hash: BlockHash) -> &mut Self {
        self.set_metadata(MetadataKey::HeadFastBlockHash, MetadataValue::HeadFastBlockHash(hash))
    }

    pub fn set_head_block_hash(&mut self, hash: BlockHash) -> &mut Self {
        self.set_metadata(MetadataKey::HeadBlockHash, MetadataValue::HeadBlockHash(hash))
    }

    pub fn set_last_pivot_number(&mut self, number: u64) -> &mut Self {
        self.set_metadata(MetadataKey::LastPivotNumber, MetadataValue::LastPivotNumber(number))
    }

    fn set_metadata(&mut self, key: MetadataKey, value: MetadataValue) -> &mut Self {
        self.insert(DbKeyValuePair::Metadata(key, value))
    }

    /// Deletes a header and its hash-to-number mapping
    pub fn delete_header(&mut self, hash: BlockHash, number: u64) -> &mut Self {
        self.delete(DbKey::HeaderNumber(hash));
        self.delete_header_without_number(hash, number)
    }

    /// Deletes a header but keeps its hash-to-number mapping
    pub fn delete_header_without_number(&mut self, hash: BlockHash, number: u64) -> &mut Self {
        self.delete(DbKey::Header(number, hash))
    }

    pub fn delete_total_difficulty(&mut self, hash: BlockHash, number: u64) -> &mut Self {
        self.delete(DbKey::TotalDifficulty(number, hash))
    }

    pub fn delete_body(&mut self, hash: BlockHash, number: u64) -> &mut Self {
        self.delete(DbKey::Body(number, hash))
    }

    pub fn delete_receipts(&mut self, hash: BlockHash, number: u64) -> &mut Self {
        self.delete(DbKey::Receipts(number, hash))
    }

    pub fn delete_canonical_hash(&mut self, number: u64) -> &mut Self {
        self.delete(DbKey::CanonicalHash(number))
    }

    /// Deletes every piece of block data, including the hash-to-number mapping
    pub fn delete_block(&mut self, hash: BlockHash, number: u64) -> &mut Self {
        self.delete(DbKey::HeaderNumber(hash));
        self.delete_block_without_number(hash, number)
    }

    /// Deletes every piece of block data except the hash-to-number mapping
    pub fn delete_block_without_number(&mut self, hash: BlockHash, number: u64) -> &mut Self {
        self.delete_header_without_number(hash, number);
        self.delete_body(hash, number);
        self.delete_receipts(hash, number);
        self.delete_total_difficulty(hash, number)
    }

    pub fn operations(&self) -> &[WriteOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<WriteOperation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug, Display)]
pub enum WriteOperation {
    Insert(DbKeyValuePair),
    Delete(DbKey),
}

/// A list of key-value pairs that are required for each insert operation
#[derive(Debug, Display)]
pub enum DbKeyValuePair {
    Metadata(MetadataKey, MetadataValue),
    Header(Box<BlockHeader>),
    HeaderNumber(BlockHash, u64),
    TotalDifficulty(u64, BlockHash, Difficulty),
    Body(u64, BlockHash, Box<BlockBody>),
    Receipts(u64, BlockHash, Vec<Receipt>),
    CanonicalHash(u64, BlockHash),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MetadataKey {
    HeadHeaderHash,
    HeadFastBlockHash,
    HeadBlockHash,
    LastPivotNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum MetadataValue {
    HeadHeaderHash(BlockHash),
    HeadFastBlockHash(BlockHash),
    HeadBlockHash(BlockHash),
    LastPivotNumber(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbKey {
    Metadata(MetadataKey),
    Header(u64, BlockHash),
    HeaderNumber(BlockHash),
    TotalDifficulty(u64, BlockHash),
    Body(u64, BlockHash),
    Receipts(u64, BlockHash),
    CanonicalHash(u64),
}

#[derive(Debug)]
pub enum DbValue {
    Metadata(MetadataValue),
    Header(Box<BlockHeader>),
    HeaderNumber(u64),
    TotalDifficulty(Difficulty),
    Body(Box<BlockBody>),
    Receipts(Vec<Receipt>),
    CanonicalHash(BlockHash),
}

impl Display for DbValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DbValue::Metadata(MetadataValue::HeadHeaderHash(_)) => f.write_str("Head header hash"),
            DbValue::Metadata(MetadataValue::HeadFastBlockHash(_)) => f.write_str("Head fast block hash"),
            DbValue::Metadata(MetadataValue::HeadBlockHash(_)) => f.write_str("Head block hash"),
            DbValue::Metadata(MetadataValue::LastPivotNumber(_)) => f.write_str("Last pivot number"),
            DbValue::Header(_) => f.write_str("Block header"),
            DbValue::HeaderNumber(_) => f.write_str("Header number"),
            DbValue::TotalDifficulty(_) => f.write_str("Total difficulty"),
            DbValue::Body(_) => f.write_str("Block body"),
            DbValue::Receipts(_) => f.write_str("Receipts"),
            DbValue::CanonicalHash(_) => f.write_str("Canonical hash"),
        }
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DbKey::Metadata(key) => write!(f, "Metadata ({})", key),
            DbKey::Header(n, h) => write!(f, "Block header (#{}, {})", n, h),
            DbKey::HeaderNumber(h) => write!(f, "Header number ({})", h),
            DbKey::TotalDifficulty(n, h) => write!(f, "Total difficulty (#{}, {})", n, h),
            DbKey::Body(n, h) => write!(f, "Block body (#{}, {})", n, h),
            DbKey::Receipts(n, h) => write!(f, "Receipts (#{}, {})", n, h),
            DbKey::CanonicalHash(n) => write!(f, "Canonical hash (#{})", n),
        }
    }
}

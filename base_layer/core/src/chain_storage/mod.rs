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

//! This module is responsible for handling logic responsible for storing the blockchain state.
//!
//! It is structured in such a way that clients (e.g. the sync and block propagation services) never need to know
//! what the actual storage engine is. [BlockchainDatabase] applies the fork choice, insertion and rewind rules on top
//! of any [BlockchainBackend], and [AsyncBlockchainDb] exposes the same API to async callers.

mod async_db;
pub use async_db::AsyncBlockchainDb;

mod block_cache;
pub use block_cache::BlockCache;

mod blockchain_backend;
pub use blockchain_backend::BlockchainBackend;

mod blockchain_database;
pub use blockchain_database::{BlockchainDatabase, Validators};

mod chain_head;
pub use chain_head::ChainHead;

mod config;
pub use config::BlockchainDatabaseConfig;

mod db_transaction;
pub use db_transaction::{DbKey, DbKeyValuePair, DbTransaction, DbValue, MetadataKey, MetadataValue, WriteOperation};

mod error;
pub use error::{ChainInsertError, ChainStorageError, Optional, OrNotFound};

pub mod freezer;

mod header_chain;
pub use header_chain::{DeleteBlockContentFn, HeaderChain, HeaderWriteResult, UpdateHeadFn};

mod insert_iterator;
pub use insert_iterator::InsertIterator;

mod insert_stats;
pub use insert_stats::InsertStats;

mod memory_db;
pub use memory_db::MemoryDatabase;

mod write_status;
pub use write_status::WriteStatus;

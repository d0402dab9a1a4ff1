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

use chainhead_common::ConfigurationError;
use chainhead_storage::{FreezerError, KeyValStoreError};
use thiserror::Error;
use tokio::task;

use crate::{consensus::ForkChoiceError, types::BlockHash, validation::ValidationError};

#[derive(Debug, Error)]
pub enum ChainStorageError {
    #[error("Access to the underlying storage mechanism failed: {0}")]
    AccessError(String),
    #[error(
        "The database may be corrupted or otherwise be in an inconsistent state. Please check logs to try and \
         identify the issue: {0}"
    )]
    CorruptedDatabase(String),
    #[error(
        "An unexpected result type was received for the given database request. This suggests that there is an \
         internal error or bug of sorts: {0}"
    )]
    UnexpectedResult(String),
    #[error("You tried to execute an invalid Database operation: {0}")]
    InvalidOperation(String),
    #[error("Invalid argument `{arg}` in `{func}`: {message}")]
    InvalidArguments {
        func: &'static str,
        arg: &'static str,
        message: String,
    },
    #[error("The requested {entity} was not found via {field}:{value} in the database")]
    ValueNotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    #[error(
        "Non contiguous insert: item {index} is #{number} [{hash:?}], item {prev_index} is #{prev_number} \
         [{prev_hash:?}] (parent [{parent_hash:?}])"
    )]
    NonContiguousInsert {
        index: usize,
        number: u64,
        hash: BlockHash,
        parent_hash: BlockHash,
        prev_index: usize,
        prev_number: u64,
        prev_hash: BlockHash,
    },
    #[error("Containing header #{number} [{hash:?}] unknown")]
    UnknownHeader { number: u64, hash: BlockHash },
    #[error("Future block timestamp {timestamp} exceeds the allowed maximum {max}")]
    FutureBlockLimit { timestamp: u64, max: u64 },
    #[error("Genesis block mismatch: stored [{stored:?}], expected [{expected:?}]")]
    GenesisMismatch { stored: BlockHash, expected: BlockHash },
    #[error("Chain segment ending at #{number} [{hash:?}] was rejected by the chain validator")]
    ChainRejected { number: u64, hash: BlockHash },
    #[error("Cannot rewind to #{target}, history below #{tail} has been pruned")]
    RewindBelowTail { target: u64, tail: u64 },
    #[error("Side blocks can't be accepted as ancient chain data")]
    SideChainReceipts,
    #[error("Validation error: {source}")]
    ValidationError {
        #[from]
        source: ValidationError,
    },
    #[error("Fork choice error: {0}")]
    ForkChoiceError(#[from] ForkChoiceError),
    #[error("Key-value store error: {0}")]
    KeyValStoreError(#[from] KeyValStoreError),
    #[error("Ancient store error: {0}")]
    FreezerError(#[from] FreezerError),
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    #[error("Blocking task spawn error: {0}")]
    BlockingTaskSpawnError(String),
}

impl ChainStorageError {
    pub fn is_value_not_found(&self) -> bool {
        matches!(self, ChainStorageError::ValueNotFound { .. })
    }

    /// Returns the validation error behind this error, if any
    pub fn as_validation_error(&self) -> Option<&ValidationError> {
        match self {
            ChainStorageError::ValidationError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<task::JoinError> for ChainStorageError {
    fn from(err: task::JoinError) -> Self {
        Self::BlockingTaskSpawnError(err.to_string())
    }
}

pub trait Optional<U> {
    fn optional(self) -> Result<Option<U>, ChainStorageError>;
}

impl<U> Optional<U> for Result<U, ChainStorageError> {
    fn optional(self) -> Result<Option<U>, ChainStorageError> {
        match self {
            Ok(item) => Ok(Some(item)),
            Err(err) if err.is_value_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

pub trait OrNotFound<U> {
    fn or_not_found(self, entity: &'static str, field: &'static str, value: String) -> Result<U, ChainStorageError>;
}

impl<U> OrNotFound<U> for Result<Option<U>, ChainStorageError> {
    fn or_not_found(self, entity: &'static str, field: &'static str, value: String) -> Result<U, ChainStorageError> {
        self.and_then(|inner| inner.ok_or(ChainStorageError::ValueNotFound { entity, field, value }))
    }
}

/// A batch insert that stopped part way. Blocks before `index` were handled and remain written.
#[derive(Debug, Error)]
#[error("Chain insert stopped at item {index}: {source}")]
pub struct ChainInsertError {
    pub index: usize,
    #[source]
    pub source: ChainStorageError,
}

impl ChainInsertError {
    pub fn new<E: Into<ChainStorageError>>(index: usize, source: E) -> Self {
        Self {
            index,
            source: source.into(),
        }
    }
}

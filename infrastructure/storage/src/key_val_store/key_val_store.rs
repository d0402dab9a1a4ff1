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

use serde::{de::DeserializeOwned, Serialize};

use crate::key_val_store::error::KeyValStoreError;

/// A single operation queued in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// A set of puts and deletes that is applied atomically by [`KeyValStore::write_batch`]. Operations are applied in
/// the order they were added, so a later delete of a key overrides an earlier put of the same key.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    operations: Vec<BatchOperation>,
    value_size: usize,
}

impl WriteBatch {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn put_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.value_size += value.len();
        self.operations.push(BatchOperation::Put(key, value));
    }

    /// Bincode-encodes `value` and queues it under `key`
    pub fn put<V: Serialize>(&mut self, key: Vec<u8>, value: &V) -> Result<(), KeyValStoreError> {
        let buf = bincode::serialize(value).map_err(|e| KeyValStoreError::SerializationError(e.to_string()))?;
        self.put_raw(key, buf);
        Ok(())
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.operations.push(BatchOperation::Delete(key));
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The total number of value bytes queued for writing
    pub fn value_size(&self) -> usize {
        self.value_size
    }

    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.operations
    }
}

/// General CRUD behaviour of a byte-oriented key-value store.
pub trait KeyValStore: Send + Sync {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KeyValStoreError>;

    fn put_raw(&self, key: &[u8], value: Vec<u8>) -> Result<(), KeyValStoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), KeyValStoreError>;

    fn exists(&self, key: &[u8]) -> Result<bool, KeyValStoreError>;

    /// Returns all records whose key starts with `prefix`, ordered by key
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KeyValStoreError>;

    /// Applies every operation in the batch, or none of them
    fn write_batch(&self, batch: WriteBatch) -> Result<(), KeyValStoreError>;

    /// Get a value from the store. The retrieved value is deserialized from bincode into `V`
    fn get<V: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<V>, KeyValStoreError>
    where Self: Sized {
        match self.get_raw(key)? {
            Some(buf) => bincode::deserialize(&buf)
                .map(Some)
                .map_err(|e| KeyValStoreError::DeserializationError(e.to_string())),
            None => Ok(None),
        }
    }

    /// Serializes `value` with bincode and stores it under `key`
    fn put<V: Serialize>(&self, key: &[u8], value: &V) -> Result<(), KeyValStoreError>
    where Self: Sized {
        let buf = bincode::serialize(value).map_err(|e| KeyValStoreError::SerializationError(e.to_string()))?;
        self.put_raw(key, buf)
    }
}

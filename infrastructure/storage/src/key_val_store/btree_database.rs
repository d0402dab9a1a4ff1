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

use std::{collections::BTreeMap, sync::RwLock};

use crate::key_val_store::{
    error::KeyValStoreError,
    key_val_store::{BatchOperation, KeyValStore, WriteBatch},
};

/// An ordered, thread-safe, in-memory key-value store. Records are kept in key order so that prefix scans return
/// number-prefixed keys in ascending numeric order when numbers are big-endian encoded.
#[derive(Debug, Default)]
pub struct BTreeMapDatabase {
    db: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl BTreeMapDatabase {
    pub fn new() -> Self {
        Self {
            db: RwLock::new(BTreeMap::new()),
        }
    }

    /// The number of records in the store
    pub fn len(&self) -> Result<usize, KeyValStoreError> {
        Ok(self.db.read().map_err(|_| KeyValStoreError::PoisonedAccess)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, KeyValStoreError> {
        Ok(self.len()? == 0)
    }
}

impl KeyValStore for BTreeMapDatabase {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KeyValStoreError> {
        Ok(self
            .db
            .read()
            .map_err(|_| KeyValStoreError::PoisonedAccess)?
            .get(key)
            .cloned())
    }

    fn put_raw(&self, key: &[u8], value: Vec<u8>) -> Result<(), KeyValStoreError> {
        self.db
            .write()
            .map_err(|_| KeyValStoreError::PoisonedAccess)?
            .insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), KeyValStoreError> {
        self.db.write().map_err(|_| KeyValStoreError::PoisonedAccess)?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KeyValStoreError> {
        Ok(self
            .db
            .read()
            .map_err(|_| KeyValStoreError::PoisonedAccess)?
            .contains_key(key))
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KeyValStoreError> {
        let db = self.db.read().map_err(|_| KeyValStoreError::PoisonedAccess)?;
        Ok(db
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), KeyValStoreError> {
        let mut db = self.db.write().map_err(|_| KeyValStoreError::PoisonedAccess)?;
        for op in batch.into_operations() {
            match op {
                BatchOperation::Put(k, v) => {
                    db.insert(k, v);
                },
                BatchOperation::Delete(k) => {
                    db.remove(&k);
                },
            }
        }
        Ok(())
    }
}

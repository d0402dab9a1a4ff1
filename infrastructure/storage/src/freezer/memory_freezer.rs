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
    collections::HashMap,
    sync::{RwLock, RwLockWriteGuard},
};

use log::*;
use strum::IntoEnumIterator;

use crate::freezer::{AncientStore, AncientTable, AncientWriteOp, FreezerError};

const LOG_TARGET: &str = "storage::freezer::memory";

#[derive(Debug, Default)]
struct FreezerTables {
    tail: u64,
    tables: HashMap<AncientTable, Vec<Vec<u8>>>,
}

impl FreezerTables {
    fn items(&self) -> u64 {
        self.tables.values().map(|t| t.len() as u64).min().unwrap_or(0)
    }

    fn frozen(&self) -> u64 {
        self.tail + self.items()
    }
}

/// An in-memory [`AncientStore`]. Items are indexed relative to the tail.
#[derive(Debug)]
pub struct MemoryFreezer {
    inner: RwLock<FreezerTables>,
}

impl Default for MemoryFreezer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFreezer {
    pub fn new() -> Self {
        let tables = AncientTable::iter().map(|t| (t, Vec::new())).collect();
        Self {
            inner: RwLock::new(FreezerTables { tail: 0, tables }),
        }
    }

    fn write_access(&self) -> Result<RwLockWriteGuard<'_, FreezerTables>, FreezerError> {
        self.inner.write().map_err(|_| FreezerError::PoisonedAccess)
    }
}

struct StagedAppends {
    next: HashMap<AncientTable, u64>,
    items: HashMap<AncientTable, Vec<Vec<u8>>>,
    bytes: u64,
}

impl AncientWriteOp for StagedAppends {
    fn append_raw(&mut self, table: AncientTable, number: u64, item: Vec<u8>) -> Result<(), FreezerError> {
        let expected = self.next.get(&table).copied().unwrap_or(0);
        if number != expected {
            return Err(FreezerError::OutOfOrder {
                table,
                expected,
                got: number,
            });
        }
        self.next.insert(table, expected + 1);
        self.bytes += item.len() as u64;
        self.items.entry(table).or_default().push(item);
        Ok(())
    }
}

impl AncientStore for MemoryFreezer {
    fn ancient(&self, table: AncientTable, number: u64) -> Result<Option<Vec<u8>>, FreezerError> {
        let inner = self.inner.read().map_err(|_| FreezerError::PoisonedAccess)?;
        if number < inner.tail || number >= inner.frozen() {
            return Ok(None);
        }
        let index = (number - inner.tail) as usize;
        Ok(inner.tables.get(&table).and_then(|t| t.get(index)).cloned())
    }

    fn ancients(&self) -> Result<u64, FreezerError> {
        let inner = self.inner.read().map_err(|_| FreezerError::PoisonedAccess)?;
        Ok(inner.frozen())
    }

    fn tail(&self) -> Result<u64, FreezerError> {
        let inner = self.inner.read().map_err(|_| FreezerError::PoisonedAccess)?;
        Ok(inner.tail)
    }

    fn truncate_head(&self, items: u64) -> Result<(), FreezerError> {
        let mut inner = self.write_access()?;
        let frozen = inner.frozen();
        if items >= frozen {
            return Ok(());
        }
        let keep = items.saturating_sub(inner.tail) as usize;
        for table in inner.tables.values_mut() {
            table.truncate(keep);
        }
        debug!(target: LOG_TARGET, "Truncated ancient head from {} to {}", frozen, inner.frozen());
        Ok(())
    }

    fn truncate_tail(&self, tail: u64) -> Result<(), FreezerError> {
        let mut inner = self.write_access()?;
        if tail <= inner.tail {
            return Ok(());
        }
        let frozen = inner.frozen();
        if tail > frozen {
            return Err(FreezerError::TailBeyondHead { tail, frozen });
        }
        let dropped = (tail - inner.tail) as usize;
        for table in inner.tables.values_mut() {
            table.drain(..dropped);
        }
        debug!(target: LOG_TARGET, "Truncated ancient tail from {} to {}", inner.tail, tail);
        inner.tail = tail;
        Ok(())
    }

    fn modify_ancients(
        &self,
        f: &mut dyn FnMut(&mut dyn AncientWriteOp) -> Result<(), FreezerError>,
    ) -> Result<u64, FreezerError> {
        let mut inner = self.write_access()?;
        let frozen = inner.frozen();
        let mut staged = StagedAppends {
            next: inner.tables.keys().map(|t| (*t, frozen)).collect(),
            items: HashMap::new(),
            bytes: 0,
        };
        f(&mut staged)?;

        let expected = staged.items.values().map(|v| v.len() as u64).max().unwrap_or(0);
        for table in AncientTable::iter() {
            let items = staged.items.get(&table).map(|v| v.len() as u64).unwrap_or(0);
            if items != expected {
                return Err(FreezerError::Unaligned { table, items, expected });
            }
        }
        for (table, items) in staged.items {
            inner.tables.entry(table).or_default().extend(items);
        }
        trace!(
            target: LOG_TARGET,
            "Appended {} items ({} bytes) per table, frozen is now {}",
            expected,
            staged.bytes,
            inner.frozen()
        );
        Ok(staged.bytes)
    }
}

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

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

use crate::freezer::FreezerError;

/// The tables every ancient store keeps. All tables hold exactly one item per frozen block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AncientTable {
    Headers,
    Hashes,
    Bodies,
    Receipts,
    Diffs,
}

/// Append access handed out by [`AncientStore::modify_ancients`].
pub trait AncientWriteOp {
    /// Appends a raw item for block `number` to `table`. `number` must be exactly the next item of that table.
    fn append_raw(&mut self, table: AncientTable, number: u64, item: Vec<u8>) -> Result<(), FreezerError>;
}

/// An append-only archive of immutable chain data, addressed by absolute block number.
///
/// Items are retained for the numbers `[tail(), ancients())`. Implementations store items relative to the tail, so
/// that dropping the tail never rewrites retained items.
pub trait AncientStore: Send + Sync {
    /// Retrieves the item of `table` stored for block `number`, or `None` if `number` is outside the retained range.
    fn ancient(&self, table: AncientTable, number: u64) -> Result<Option<Vec<u8>>, FreezerError>;

    /// One past the highest frozen block number (the `frozen` boundary).
    fn ancients(&self) -> Result<u64, FreezerError>;

    /// The lowest retained block number.
    fn tail(&self) -> Result<u64, FreezerError>;

    /// Returns true if `number` lies in the retained range
    fn has_ancient(&self, number: u64) -> Result<bool, FreezerError> {
        Ok(number >= self.tail()? && number < self.ancients()?)
    }

    /// Discards all items at or above `items`, so that `ancients()` becomes `items` (or the tail, whichever is
    /// larger).
    fn truncate_head(&self, items: u64) -> Result<(), FreezerError>;

    /// Discards all items below `tail`.
    fn truncate_tail(&self, tail: u64) -> Result<(), FreezerError>;

    /// Runs `f` against a staging area and commits everything it appended in one step. Every table must receive
    /// items in strict sequence and all tables must end up the same length; otherwise nothing is committed.
    /// Returns the number of bytes written.
    fn modify_ancients(
        &self,
        f: &mut dyn FnMut(&mut dyn AncientWriteOp) -> Result<(), FreezerError>,
    ) -> Result<u64, FreezerError>;
}

impl<'a> dyn AncientWriteOp + 'a {
    /// Bincode-encodes `value` and appends it
    pub fn append_value<V: Serialize>(
        &mut self,
        table: AncientTable,
        number: u64,
        value: &V,
    ) -> Result<(), FreezerError> {
        let item = bincode::serialize(value).map_err(|e| FreezerError::WriteAborted(e.to_string()))?;
        self.append_raw(table, number, item)
    }
}

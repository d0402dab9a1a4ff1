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
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Instant,
};

use chrono::Utc;
use log::*;

use crate::{
    blocks::BlockHeader,
    chain_storage::{
        BlockchainBackend,
        ChainHead,
        ChainInsertError,
        ChainStorageError,
        DbTransaction,
        OrNotFound,
        WriteStatus,
    },
    consensus::{ChainConfig, ChainReader, ForkChoice},
    types::{BlockHash, Difficulty},
    validation::{ConsensusEngine, ValidationError},
};

const LOG_TARGET: &str = "c::cs::header_chain";

/// Called for every header removed by [HeaderChain::set_head] with the new head header's parent. May move the block
/// markers and returns the number the block head was moved to, plus whether the rewind must continue down to it.
pub type UpdateHeadFn<'a> =
    dyn FnMut(&mut DbTransaction, &mut ChainHead, &BlockHeader) -> Result<(u64, bool), ChainStorageError> + 'a;

/// Called for every `(hash, number)` removed by [HeaderChain::set_head], to delete the data stored alongside the
/// header.
pub type DeleteBlockContentFn<'a> = dyn FnMut(&mut DbTransaction, &BlockHash, u64) -> Result<(), ChainStorageError> + 'a;

/// The outcome of writing a header batch
#[derive(Debug, Clone)]
pub struct HeaderWriteResult {
    pub status: WriteStatus,
    pub ignored: usize,
    pub imported: usize,
    pub last_hash: BlockHash,
    pub last_header: BlockHeader,
}

/// The header chain: headers, total difficulties and the canonical index, along with the shared [ChainHead].
pub struct HeaderChain<B> {
    db: Arc<B>,
    config: Arc<ChainConfig>,
    engine: Arc<dyn ConsensusEngine>,
    genesis: BlockHeader,
    head: Arc<RwLock<ChainHead>>,
}

impl<B: BlockchainBackend> HeaderChain<B> {
    /// Opens the header chain stored in `db`. The genesis block must already be present.
    pub fn new(db: Arc<B>, config: Arc<ChainConfig>, engine: Arc<dyn ConsensusEngine>) -> Result<Self, ChainStorageError> {
        let genesis_hash = db
            .fetch_canonical_hash(0)
            .or_not_found("BlockHeader", "number", "0".to_string())?;
        let genesis = db
            .fetch_header(&genesis_hash, 0)
            .or_not_found("BlockHeader", "hash", genesis_hash.to_hex())?;

        let mut head = ChainHead::at(genesis.clone());
        if let Some(hash) = db.fetch_head_header_hash()? {
            if let Some(number) = db.fetch_header_number(&hash)? {
                if let Some(header) = db.fetch_header(&hash, number)? {
                    head.header = header;
                }
            }
        }
        Ok(Self {
            db,
            config,
            engine,
            genesis,
            head: Arc::new(RwLock::new(head)),
        })
    }

    pub fn genesis(&self) -> &BlockHeader {
        &self.genesis
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub(crate) fn db(&self) -> &B {
        &self.db
    }

    pub(crate) fn read_head(&self) -> Result<RwLockReadGuard<ChainHead>, ChainStorageError> {
        self.head.read().map_err(|e| {
            error!(
                target: LOG_TARGET,
                "An attempt to get a read lock on the chain head failed. {}", e
            );
            ChainStorageError::AccessError("Read lock on chain head failed".into())
        })
    }

    pub(crate) fn write_head(&self) -> Result<RwLockWriteGuard<ChainHead>, ChainStorageError> {
        self.head.write().map_err(|e| {
            error!(
                target: LOG_TARGET,
                "An attempt to get a write lock on the chain head failed. {}", e
            );
            ChainStorageError::AccessError("Write lock on chain head failed".into())
        })
    }

    /// The highest known header on the canonical chain
    pub fn current_header(&self) -> Result<BlockHeader, ChainStorageError> {
        Ok(self.read_head()?.header.clone())
    }

    pub fn get_header(&self, hash: &BlockHash, number: u64) -> Result<Option<BlockHeader>, ChainStorageError> {
        self.db.fetch_header(hash, number)
    }

    pub fn get_header_by_hash(&self, hash: &BlockHash) -> Result<Option<BlockHeader>, ChainStorageError> {
        match self.db.fetch_header_number(hash)? {
            Some(number) => self.db.fetch_header(hash, number),
            None => Ok(None),
        }
    }

    /// The canonical header at `number`
    pub fn get_header_by_number(&self, number: u64) -> Result<Option<BlockHeader>, ChainStorageError> {
        match self.db.fetch_canonical_hash(number)? {
            Some(hash) => self.db.fetch_header(&hash, number),
            None => Ok(None),
        }
    }

    pub fn get_block_number(&self, hash: &BlockHash) -> Result<Option<u64>, ChainStorageError> {
        self.db.fetch_header_number(hash)
    }

    pub fn get_td(&self, hash: &BlockHash, number: u64) -> Result<Option<Difficulty>, ChainStorageError> {
        self.db.fetch_total_difficulty(hash, number)
    }

    pub fn has_header(&self, hash: &BlockHash, number: u64) -> Result<bool, ChainStorageError> {
        self.db.has_header(hash, number)
    }

    /// Checks that `headers` form a contiguous chain and runs them through the consensus engine. Stops at the first
    /// failure.
    pub fn validate_header_chain(&self, headers: &[BlockHeader]) -> Result<(), ChainInsertError> {
        for (i, pair) in headers.windows(2).enumerate() {
            let (prev, header) = (&pair[0], &pair[1]);
            let prev_hash = prev.hash();
            if header.number != prev.number + 1 || header.parent_hash != prev_hash {
                let hash = header.hash();
                error!(
                    target: LOG_TARGET,
                    "Non contiguous header insert: #{} [{}] after #{} [{}]", header.number, hash, prev.number, prev_hash
                );
                return Err(ChainInsertError::new(i + 1, ChainStorageError::NonContiguousInsert {
                    index: i + 1,
                    number: header.number,
                    hash,
                    parent_hash: header.parent_hash,
                    prev_index: i,
                    prev_number: prev.number,
                    prev_hash,
                }));
            }
        }

        let mut results = self.engine.verify_headers(headers);
        for (i, header) in headers.iter().enumerate() {
            let result = results
                .blocking_recv()
                .unwrap_or(Err(ValidationError::VerificationAborted { number: header.number }));
            if let Err(e) = result {
                return Err(ChainInsertError::new(i, e));
            }
        }
        Ok(())
    }

    /// Writes every header not yet stored, with its total difficulty. The parent of the first header must be known.
    pub fn write_headers(&self, headers: &[BlockHeader]) -> Result<HeaderWriteResult, ChainStorageError> {
        let last = headers
            .last()
            .ok_or_else(|| ChainStorageError::InvalidOperation("Empty header batch".to_string()))?;
        let first = &headers[0];
        let parent_number = first.number.checked_sub(1).ok_or(ValidationError::UnknownAncestor {
            number: first.number,
            parent_hash: first.parent_hash,
        })?;
        let mut td = self
            .get_td(&first.parent_hash, parent_number)?
            .ok_or(ValidationError::UnknownAncestor {
                number: first.number,
                parent_hash: first.parent_hash,
            })?;

        let mut txn = DbTransaction::new();
        let mut imported = 0;
        let mut parent_known = true;
        for header in headers {
            let hash = header.hash();
            td += header.difficulty;
            let already_known = parent_known && self.has_header(&hash, header.number)?;
            if !already_known {
                txn.insert_total_difficulty(hash, header.number, td)
                    .insert_header(header.clone());
                imported += 1;
            }
            parent_known = already_known;
        }
        self.db.write(txn)?;

        Ok(HeaderWriteResult {
            status: WriteStatus::NonStat,
            ignored: headers.len() - imported,
            imported,
            last_hash: last.hash(),
            last_header: last.clone(),
        })
    }

    /// Makes `headers` the canonical tip: rewrites the canonical index back to the common ancestor, drops canonical
    /// entries above the new head and moves the head header marker.
    pub fn reorg(&self, head: &mut ChainHead, headers: &[BlockHeader]) -> Result<(), ChainStorageError> {
        let (first, last) = match (headers.first(), headers.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Ok(()),
        };
        let mut txn = DbTransaction::new();
        if first.parent_hash != head.header.hash() {
            let mut n = last.number + 1;
            while self.db.fetch_canonical_hash(n)?.is_some() {
                txn.delete_canonical_hash(n);
                n += 1;
            }
            let mut header = first.clone();
            let mut hash = header.hash();
            while self.db.fetch_canonical_hash(header.number)? != Some(hash) {
                txn.insert_canonical_hash(header.number, hash);
                if header.number == 0 {
                    break;
                }
                let (parent_hash, parent_number) = (header.parent_hash, header.number - 1);
                header = self.get_header(&parent_hash, parent_number)?.ok_or_else(|| {
                    ChainStorageError::CorruptedDatabase(format!("Missing parent #{} [{}]", parent_number, parent_hash))
                })?;
                hash = parent_hash;
            }
        }
        for header in headers {
            txn.insert_canonical_hash(header.number, header.hash());
        }
        txn.set_head_header_hash(last.hash());
        self.db.write(txn)?;
        head.header = last.clone();
        Ok(())
    }

    /// Writes `headers` and, if fork choice prefers them, makes them canonical
    pub fn write_headers_and_set_head(
        &self,
        head: &mut ChainHead,
        headers: &[BlockHeader],
        forker: &ForkChoice,
    ) -> Result<HeaderWriteResult, ChainStorageError> {
        let mut result = self.write_headers(headers)?;
        if !forker.reorg_needed_for_chain(&head.header, headers)? {
            if result.imported != 0 {
                result.status = WriteStatus::SideStat;
            }
            return Ok(result);
        }
        let last = &result.last_header;
        if self.db.fetch_canonical_hash(last.number)? == Some(result.last_hash) && last.number <= head.header.number {
            // Already canonical
            return Ok(result);
        }
        self.reorg(head, headers)?;
        result.status = WriteStatus::CanonStat;
        Ok(result)
    }

    /// Writes a validated header batch and updates the head. Takes the chain head lock for the whole write.
    pub fn insert_header_chain(
        &self,
        headers: &[BlockHeader],
        start: Instant,
        forker: &ForkChoice,
    ) -> Result<WriteStatus, ChainStorageError> {
        let mut head = self.write_head()?;
        self.insert_header_chain_locked(&mut head, headers, start, forker)
    }

    pub(crate) fn insert_header_chain_locked(
        &self,
        head: &mut ChainHead,
        headers: &[BlockHeader],
        start: Instant,
        forker: &ForkChoice,
    ) -> Result<WriteStatus, ChainStorageError> {
        let result = self.write_headers_and_set_head(head, headers, forker)?;
        let last = &result.last_header;
        let age = Utc::now().timestamp() - last.timestamp as i64;
        debug!(
            target: LOG_TARGET,
            "Imported new block headers: count {}, elapsed {:.2?}, number {}, hash {}, age {}s{}",
            result.imported,
            start.elapsed(),
            last.number,
            result.last_hash,
            age,
            if result.ignored > 0 {
                format!(", ignored {}", result.ignored)
            } else {
                String::new()
            }
        );
        Ok(result.status)
    }

    /// Rewinds the header chain to `target`, deleting every header (on all branches) above it.
    ///
    /// `update_fn` runs before each header is removed and may lower the target; `del_fn` runs for every removed
    /// `(hash, number)` to delete the associated block data. Head markers are written as the rewind progresses, the
    /// deletions are committed in one batch at the end.
    pub fn set_head(
        &self,
        head: &mut ChainHead,
        target: u64,
        mut update_fn: Option<&mut UpdateHeadFn<'_>>,
        mut del_fn: Option<&mut DeleteBlockContentFn<'_>>,
    ) -> Result<(), ChainStorageError> {
        let mut target = target;
        let mut txn = DbTransaction::new();
        let mut origin = true;

        while head.header.number > target {
            let hdr = head.header.clone();
            let num = hdr.number;
            let parent = match self.get_header(&hdr.parent_hash, num - 1)? {
                Some(p) => p,
                None => self.genesis.clone(),
            };
            let parent_hash = parent.hash();

            // Markers move first so that they never point above the data left in the database
            let mut marker_txn = DbTransaction::new();
            if let Some(update) = update_fn.as_mut() {
                let (new_head, force) = update(&mut marker_txn, head, &parent)?;
                if force && new_head < target {
                    warn!(target: LOG_TARGET, "Force rewinding till ancient limit, head #{}", new_head);
                    target = new_head;
                }
            }
            marker_txn.set_head_header_hash(parent_hash);
            self.db.write(marker_txn)?;
            head.header = parent;

            let mut nums = Vec::new();
            if origin {
                let mut n = num + 1;
                while !self.db.fetch_all_hashes(n)?.is_empty() {
                    nums.push(n);
                    n += 1;
                }
                nums.reverse();
                origin = false;
            }
            nums.push(num);

            for n in nums {
                let mut hashes = self.db.fetch_all_hashes(n)?;
                if hashes.is_empty() {
                    // Probably frozen already
                    hashes.push(hdr.hash());
                }
                for hash in hashes {
                    if let Some(delete) = del_fn.as_mut() {
                        delete(&mut txn, &hash, n)?;
                    }
                    txn.delete_header(hash, n).delete_total_difficulty(hash, n);
                }
                txn.delete_canonical_hash(n);
            }
        }
        self.db.write(txn)?;
        Ok(())
    }

    /// Rewinds the header chain alone. Block data is left in place.
    pub fn rewind(&self, target: u64) -> Result<(), ChainStorageError> {
        let mut head = self.write_head()?;
        self.set_head(&mut head, target, None, None)
    }
}

impl<B> Clone for HeaderChain<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            config: self.config.clone(),
            engine: self.engine.clone(),
            genesis: self.genesis.clone(),
            head: self.head.clone(),
        }
    }
}

impl<B: BlockchainBackend> ChainReader for HeaderChain<B> {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn get_td(&self, hash: &BlockHash, number: u64) -> Result<Option<Difficulty>, ChainStorageError> {
        self.db.fetch_total_difficulty(hash, number)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        chain_storage::MemoryDatabase,
        test_helpers::{blockchain::create_header_chain, make_header_chain_from},
    };

    #[test]
    fn it_writes_and_reads_headers() {
        let (hc, genesis, _) = create_header_chain(MemoryDatabase::new());
        let headers = make_header_chain_from(&genesis.header, 5, 0);
        hc.validate_header_chain(&headers).unwrap();
        let result = hc.write_headers(&headers).unwrap();
        assert_eq!(result.imported, 5);
        assert_eq!(result.ignored, 0);
        assert_eq!(result.last_hash, headers[4].hash());
        // Total difficulty accumulates from the genesis
        let expected = headers.iter().fold(genesis.header.difficulty, |td, h| td + h.difficulty);
        assert_eq!(hc.get_td(&headers[4].hash(), 5).unwrap(), Some(expected));
        assert_eq!(hc.get_header_by_hash(&headers[2].hash()).unwrap(), Some(headers[2].clone()));
        assert_eq!(hc.get_block_number(&headers[2].hash()).unwrap(), Some(3));
        // Not canonical yet
        assert_eq!(hc.get_header_by_number(3).unwrap(), None);

        let again = hc.write_headers(&headers).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.ignored, 5);
    }

    #[test]
    fn it_rejects_non_contiguous_batches() {
        let (hc, genesis, _) = create_header_chain(MemoryDatabase::new());
        let mut headers = make_header_chain_from(&genesis.header, 4, 0);
        headers.remove(2);
        let err = hc.validate_header_chain(&headers).unwrap_err();
        assert_eq!(err.index, 2);
        assert!(matches!(err.source, ChainStorageError::NonContiguousInsert {
            index: 2,
            number: 4,
            prev_number: 2,
            ..
        }));
    }

    #[test]
    fn it_reports_verification_failures() {
        let (hc, genesis, engine) = create_header_chain(MemoryDatabase::new());
        let headers = make_header_chain_from(&genesis.header, 4, 0);
        engine.fail_header_at(3, ValidationError::InvalidHeader {
            number: 3,
            reason: "bad difficulty".to_string(),
        });
        let err = hc.validate_header_chain(&headers).unwrap_err();
        assert_eq!(err.index, 2);
        assert!(err.source.as_validation_error().is_some());
    }

    #[test]
    fn it_needs_a_known_parent() {
        let (hc, genesis, _) = create_header_chain(MemoryDatabase::new());
        let headers = make_header_chain_from(&genesis.header, 4, 0);
        let err = hc.write_headers(&headers[2..]).unwrap_err();
        assert!(matches!(
            err.as_validation_error(),
            Some(ValidationError::UnknownAncestor { number: 3, .. })
        ));
    }

    #[test]
    fn it_rewinds_headers_on_every_branch() {
        let (hc, genesis, _) = create_header_chain(MemoryDatabase::new());
        let reader = Arc::new(hc.clone());
        let forker = ForkChoice::new(reader, None, None);
        let canonical = make_header_chain_from(&genesis.header, 10, 0);
        let side = make_header_chain_from(&canonical[3], 8, 1);
        assert_eq!(
            hc.insert_header_chain(&canonical, Instant::now(), &forker).unwrap(),
            WriteStatus::CanonStat
        );
        // The side chain is longer but every side header carries the same difficulty, so it ends up heavier
        assert_eq!(
            hc.insert_header_chain(&side, Instant::now(), &forker).unwrap(),
            WriteStatus::CanonStat
        );
        assert_eq!(hc.current_header().unwrap(), side[7]);
        assert_eq!(hc.get_header_by_number(5).unwrap(), Some(side[0].clone()));
        assert_eq!(hc.get_header_by_number(3).unwrap(), Some(canonical[2].clone()));

        hc.rewind(6).unwrap();
        assert_eq!(hc.current_header().unwrap().number, 6);
        assert_eq!(hc.current_header().unwrap(), side[1]);
        for header in canonical.iter().chain(side.iter()) {
            assert_eq!(hc.has_header(&header.hash(), header.number).unwrap(), header.number <= 6);
        }
        assert_eq!(hc.get_header_by_number(7).unwrap(), None);
        assert_eq!(hc.db().fetch_head_header_hash().unwrap(), Some(side[1].hash()));
    }
}

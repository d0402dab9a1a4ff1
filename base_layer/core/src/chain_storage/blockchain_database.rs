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
    collections::HashSet,
    fmt,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Instant,
};

use chainhead_storage::{AncientTable, AncientWriteOp, FreezerError};
use chrono::Utc;
use log::*;

use crate::{
    blocks::{Block, BlockHeader, Receipt},
    chain_storage::{
        freezer,
        BlockCache,
        BlockchainBackend,
        BlockchainDatabaseConfig,
        ChainHead,
        ChainInsertError,
        ChainStorageError,
        DbKey,
        DbTransaction,
        DeleteBlockContentFn,
        HeaderChain,
        InsertIterator,
        InsertStats,
        OrNotFound,
        UpdateHeadFn,
        WriteStatus,
    },
    consensus::{ChainConfig, ChainValidator, CheckpointValidator, ForkChoice, PreserveFn},
    state::StateCommitBoundary,
    types::{BlockHash, Difficulty, FixedHash},
    validation::{BlockProcessor, BodyValidator, ConsensusEngine, ValidationError},
};

const LOG_TARGET: &str = "c::cs::database";

/// Reorgs deeper than this are logged as warnings
const LARGE_REORG_DEPTH: usize = 63;

/// The external collaborators the blockchain database relies on for validation and execution
#[derive(Clone)]
pub struct Validators {
    pub engine: Arc<dyn ConsensusEngine>,
    pub processor: Arc<dyn BlockProcessor>,
    pub state: Arc<dyn StateCommitBoundary>,
    pub chain_validator: Option<Arc<dyn ChainValidator>>,
    pub preserve: Option<Arc<PreserveFn>>,
}

impl Validators {
    pub fn new(
        engine: impl ConsensusEngine + 'static,
        processor: impl BlockProcessor + 'static,
        state: impl StateCommitBoundary + 'static,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            processor: Arc::new(processor),
            state: Arc::new(state),
            chain_validator: None,
            preserve: None,
        }
    }

    pub fn with_chain_validator(mut self, validator: impl ChainValidator + 'static) -> Self {
        self.chain_validator = Some(Arc::new(validator));
        self
    }

    /// Sets the predicate that breaks total difficulty ties in favour of local chains
    pub fn with_preserve<F>(mut self, preserve: F) -> Self
    where F: Fn(&BlockHeader) -> bool + Send + Sync + 'static {
        self.preserve = Some(Arc::new(preserve));
        self
    }
}

/// Body checks run by the insert iterator: known blocks, missing parents and the consensus engine's stateless rules
struct ChainBodyValidator<'a, B> {
    db: &'a B,
    engine: &'a dyn ConsensusEngine,
}

impl<B: BlockchainBackend> ChainBodyValidator<'_, B> {
    fn check(&self, block: &Block) -> Result<(), ChainStorageError> {
        let (hash, number) = (block.hash(), block.number());
        if self.db.has_body(&hash, number)? && self.db.has_receipts(&hash, number)? {
            return Err(ValidationError::KnownBlock { number, hash }.into());
        }
        self.engine.validate_body(block)?;
        let parent_known = match number.checked_sub(1) {
            Some(parent_number) => {
                self.db.has_header(block.parent_hash(), parent_number)? &&
                    self.db.has_body(block.parent_hash(), parent_number)?
            },
            None => false,
        };
        if !parent_known {
            return Err(ValidationError::UnknownAncestor {
                number,
                parent_hash: *block.parent_hash(),
            }
            .into());
        }
        Ok(())
    }
}

impl<B: BlockchainBackend> BodyValidator for ChainBodyValidator<'_, B> {
    fn validate_body(&self, block: &Block) -> Result<(), ValidationError> {
        self.check(block).map_err(|err| match err {
            ChainStorageError::ValidationError { source } => source,
            other => ValidationError::ProcessingFailed {
                number: block.number(),
                reason: other.to_string(),
            },
        })
    }
}

/// A generic blockchain storage mechanism. This struct defines the API for storing and retrieving blocks, and
/// applies the fork choice, insertion and rewind rules on top of a [BlockchainBackend].
///
/// All operations that move the chain head (`insert_chain`, `insert_header_chain`, `insert_receipt_chain`,
/// `set_head`) hold the chain head write lock for their whole duration. `BlockchainDatabase` is cheap to clone; clones
/// share the backend, the caches and the chain head.
pub struct BlockchainDatabase<B> {
    db: Arc<B>,
    config: BlockchainDatabaseConfig,
    header_chain: HeaderChain<B>,
    forker: Arc<ForkChoice>,
    validators: Validators,
    genesis: Block,
    block_cache: Arc<RwLock<BlockCache<Block>>>,
    receipts_cache: Arc<RwLock<BlockCache<Vec<Receipt>>>>,
    future_blocks: Arc<RwLock<BlockCache<Block>>>,
}

impl<B> BlockchainDatabase<B>
where B: BlockchainBackend + 'static
{
    /// Opens the chain stored in `db`, writing `genesis` if the database is empty. Recovers from an interrupted
    /// rewind or a missing head state before returning.
    pub fn new(
        db: B,
        genesis: Block,
        chain_config: ChainConfig,
        config: BlockchainDatabaseConfig,
        validators: Validators,
    ) -> Result<Self, ChainStorageError> {
        let db = Arc::new(db);
        match db.fetch_canonical_hash(0)? {
            None => {
                info!(target: LOG_TARGET, "Writing genesis block [{}]", genesis.hash());
                let mut txn = DbTransaction::new();
                add_genesis(&mut txn, &genesis);
                db.write(txn)?;
            },
            Some(stored) if stored != genesis.hash() => {
                return Err(ChainStorageError::GenesisMismatch {
                    stored,
                    expected: genesis.hash(),
                });
            },
            Some(_) => {},
        }

        let header_chain = HeaderChain::new(db.clone(), Arc::new(chain_config), validators.engine.clone())?;
        let chain_validator = match (&validators.chain_validator, config.max_future_chain_length) {
            (Some(validator), _) => Some(validator.clone()),
            (None, Some(limit)) => Some(Arc::new(CheckpointValidator::new(Some(limit))) as Arc<dyn ChainValidator>),
            (None, None) => None,
        };
        let forker = Arc::new(ForkChoice::new(
            Arc::new(header_chain.clone()),
            validators.preserve.clone(),
            chain_validator,
        ));
        let blockchain_db = BlockchainDatabase {
            db,
            header_chain,
            forker,
            validators,
            genesis,
            block_cache: Arc::new(RwLock::new(BlockCache::new(config.block_cache_size))),
            receipts_cache: Arc::new(RwLock::new(BlockCache::new(config.block_cache_size))),
            future_blocks: Arc::new(RwLock::new(BlockCache::new(config.future_block_cache_size))),
            config,
        };
        blockchain_db.recover()?;
        Ok(blockchain_db)
    }

    fn recover(&self) -> Result<(), ChainStorageError> {
        let mut head = self.header_chain.write_head()?;
        self.load_last_state(&mut head)?;

        if !self.validators.state.is_committed(&head.block.state_root) {
            warn!(
                target: LOG_TARGET,
                "Head state missing, repairing: number {}, hash {}",
                head.block.number,
                head.block.hash()
            );
            let number = head.block.number;
            self.rewind_and_reload(&mut head, number, None, true)?;
        }

        // A crash during a rewind can leave ancient data above the head blocks
        let frozen = self.db.frozen()?;
        if frozen > 0 {
            let mut low = None;
            if head.block.hash() != self.genesis.hash() && head.block.number < frozen - 1 {
                low = Some(head.block.number);
            }
            if head.fast_block.number < frozen - 1 {
                low = Some(low.map_or(head.fast_block.number, |n: u64| n.min(head.fast_block.number)));
            }
            if let Some(low) = low {
                error!(
                    target: LOG_TARGET,
                    "Truncating ancient chain: from {}, to {}", head.header.number, low
                );
                self.rewind_and_reload(&mut head, low, None, false)?;
            }
        }
        Ok(())
    }

    fn read_cache<T>(cache: &RwLock<BlockCache<T>>) -> Result<RwLockReadGuard<BlockCache<T>>, ChainStorageError> {
        cache
            .read()
            .map_err(|_| ChainStorageError::AccessError("Read lock on block cache failed".into()))
    }

    fn write_cache<T>(cache: &RwLock<BlockCache<T>>) -> Result<RwLockWriteGuard<BlockCache<T>>, ChainStorageError> {
        cache
            .write()
            .map_err(|_| ChainStorageError::AccessError("Write lock on block cache failed".into()))
    }

    pub fn config(&self) -> &BlockchainDatabaseConfig {
        &self.config
    }

    pub fn header_chain(&self) -> &HeaderChain<B> {
        &self.header_chain
    }

    pub fn fork_choice(&self) -> &ForkChoice {
        &self.forker
    }

    pub fn genesis(&self) -> &Block {
        &self.genesis
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// The highest header, which may not have a body yet
    pub fn current_header(&self) -> Result<BlockHeader, ChainStorageError> {
        Ok(self.header_chain.read_head()?.header.clone())
    }

    /// The highest block with body and receipts
    pub fn current_fast_block(&self) -> Result<Block, ChainStorageError> {
        let header = self.header_chain.read_head()?.fast_block.clone();
        self.block_for_header(header)
    }

    /// The highest block with committed state
    pub fn current_block(&self) -> Result<Block, ChainStorageError> {
        let header = self.header_chain.read_head()?.block.clone();
        self.block_for_header(header)
    }

    /// A snapshot of the three head markers
    pub fn chain_head(&self) -> Result<ChainHead, ChainStorageError> {
        Ok(self.header_chain.read_head()?.clone())
    }

    fn block_for_header(&self, header: BlockHeader) -> Result<Block, ChainStorageError> {
        let hash = header.hash();
        self.get_block(&hash, header.number)
            .or_not_found("Block", "hash", hash.to_hex())
    }

    pub fn get_block(&self, hash: &BlockHash, number: u64) -> Result<Option<Block>, ChainStorageError> {
        if let Some(block) = Self::read_cache(&self.block_cache)?.get(hash) {
            return Ok(Some(block.clone()));
        }
        let block = self.db.fetch_block(hash, number)?;
        if let Some(ref block) = block {
            Self::write_cache(&self.block_cache)?.push(*hash, block.clone());
        }
        Ok(block)
    }

    pub fn get_block_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>, ChainStorageError> {
        match self.db.fetch_header_number(hash)? {
            Some(number) => self.get_block(hash, number),
            None => Ok(None),
        }
    }

    /// The canonical block at `number`
    pub fn get_block_by_number(&self, number: u64) -> Result<Option<Block>, ChainStorageError> {
        match self.db.fetch_canonical_hash(number)? {
            Some(hash) => self.get_block(&hash, number),
            None => Ok(None),
        }
    }

    pub fn get_header_by_number(&self, number: u64) -> Result<Option<BlockHeader>, ChainStorageError> {
        self.header_chain.get_header_by_number(number)
    }

    pub fn get_header_by_hash(&self, hash: &BlockHash) -> Result<Option<BlockHeader>, ChainStorageError> {
        self.header_chain.get_header_by_hash(hash)
    }

    pub fn get_receipts_by_hash(&self, hash: &BlockHash) -> Result<Option<Vec<Receipt>>, ChainStorageError> {
        if let Some(receipts) = Self::read_cache(&self.receipts_cache)?.get(hash) {
            return Ok(Some(receipts.clone()));
        }
        let number = match self.db.fetch_header_number(hash)? {
            Some(n) => n,
            None => return Ok(None),
        };
        let receipts = self.db.fetch_receipts(hash, number)?;
        if let Some(ref receipts) = receipts {
            Self::write_cache(&self.receipts_cache)?.push(*hash, receipts.clone());
        }
        Ok(receipts)
    }

    pub fn get_td(&self, hash: &BlockHash, number: u64) -> Result<Option<Difficulty>, ChainStorageError> {
        self.header_chain.get_td(hash, number)
    }

    pub fn get_canonical_hash(&self, number: u64) -> Result<Option<BlockHash>, ChainStorageError> {
        self.db.fetch_canonical_hash(number)
    }

    pub fn has_block(&self, hash: &BlockHash, number: u64) -> Result<bool, ChainStorageError> {
        if Self::read_cache(&self.block_cache)?.has(hash) {
            return Ok(true);
        }
        self.db.has_body(hash, number)
    }

    pub fn has_header(&self, hash: &BlockHash, number: u64) -> Result<bool, ChainStorageError> {
        self.header_chain.has_header(hash, number)
    }

    /// The number of blocks held in the ancient store
    pub fn ancients(&self) -> Result<u64, ChainStorageError> {
        self.db.frozen()
    }

    /// The oldest block number still available, non-zero once ancient history has been pruned
    pub fn ancient_tail(&self) -> Result<u64, ChainStorageError> {
        self.db.ancient_tail()
    }

    pub fn last_pivot_number(&self) -> Result<Option<u64>, ChainStorageError> {
        self.db.fetch_last_pivot_number()
    }

    /// Records the pivot block of an in-progress fast sync
    pub fn write_last_pivot_number(&self, number: u64) -> Result<(), ChainStorageError> {
        let mut txn = DbTransaction::new();
        txn.set_last_pivot_number(number);
        self.db.write(txn)
    }

    /// Runs a freeze cycle with the given immutability threshold. Returns the new frozen boundary.
    pub fn freeze(&self, threshold: u64) -> Result<u64, ChainStorageError> {
        let _head = self.header_chain.read_head()?;
        let frozen = freezer::freeze(&*self.db, threshold)?;
        self.purge_caches()?;
        Ok(frozen)
    }

    /// Runs a freeze cycle with the configured threshold
    pub fn freeze_with_config(&self) -> Result<u64, ChainStorageError> {
        self.freeze(self.config.freeze_threshold)
    }

    // ------------------------------------------------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------------------------------------------------

    /// Imports a contiguous chain of blocks. Returns the write status of every block handled; blocks that were
    /// queued for later or skipped as known report [WriteStatus::NonStat].
    ///
    /// Processing stops at the first block that fails validation or execution. Blocks before it stay written and
    /// the error carries their count.
    pub fn insert_chain(&self, chain: &[Block]) -> Result<Vec<WriteStatus>, ChainInsertError> {
        if chain.is_empty() {
            return Ok(Vec::new());
        }
        check_contiguous(chain)?;
        let mut head = self.header_chain.write_head().map_err(|e| ChainInsertError::new(0, e))?;
        self.insert_chain_locked(&mut head, chain)
    }

    fn insert_chain_locked(&self, head: &mut ChainHead, chain: &[Block]) -> Result<Vec<WriteStatus>, ChainInsertError> {
        let headers = chain.iter().map(|b| b.header.clone()).collect::<Vec<_>>();
        if !self
            .forker
            .validate_reorg(&head.block, &headers)
            .map_err(|e| ChainInsertError::new(0, e))?
        {
            let last = &headers[headers.len() - 1];
            return Err(ChainInsertError::new(0, ChainStorageError::ChainRejected {
                number: last.number,
                hash: last.hash(),
            }));
        }

        let mut stats = InsertStats::new(self.config.stats_report_interval);
        let mut statuses = Vec::with_capacity(chain.len());
        let validator = ChainBodyValidator {
            db: &*self.db,
            engine: &*self.validators.engine,
        };
        let mut it = InsertIterator::new(chain, self.validators.engine.verify_headers(&headers), validator);
        let mut next = it.next();

        // Skip the known blocks that fork choice would not switch to anyway
        while let Some((block, Err(ValidationError::KnownBlock { .. }))) = next {
            let reorg = self
                .forker
                .reorg_needed(&head.block, &block.header)
                .map_err(|e| ChainInsertError::new(it.index() as usize, e))?;
            if reorg && (block.number() > head.block.number || self.is_not_canonical(block)?) {
                break;
            }
            debug!(
                target: LOG_TARGET,
                "Ignoring already known block #{} [{}]",
                block.number(),
                block.hash()
            );
            stats.ignored += 1;
            statuses.push(WriteStatus::NonStat);
            next = it.next();
        }
        // The remaining known blocks beat the current head, which happens after a rollback left blocks behind
        while let Some((block, Err(ValidationError::KnownBlock { .. }))) = next {
            debug!(
                target: LOG_TARGET,
                "Writing previously known block #{} [{}]",
                block.number(),
                block.hash()
            );
            self.write_known_block(head, block)
                .map_err(|e| ChainInsertError::new(it.index() as usize, e))?;
            statuses.push(WriteStatus::CanonStat);
            next = it.next();
        }

        match next {
            Some((block, Err(ref err)))
                if matches!(err, ValidationError::FutureBlock { .. }) ||
                    (matches!(err, ValidationError::UnknownAncestor { .. }) &&
                        self.is_future_block_queued(chain[0].parent_hash())?) =>
            {
                // The first block of the segment is from the future, or builds on one. Queue the lot.
                let mut queued = Some((block, Err(err.clone())));
                while let Some((block, result)) = queued {
                    let index = it.index() as usize;
                    let queueable = matches!(
                        result,
                        Err(ValidationError::UnknownAncestor { .. }) | Err(ValidationError::FutureBlock { .. })
                    );
                    if index != 0 && !queueable {
                        stats.ignored += it.remaining() + 1;
                        return match result {
                            Ok(()) => Ok(statuses),
                            Err(err) => Err(ChainInsertError::new(index, err)),
                        };
                    }
                    self.add_future_block(block)
                        .map_err(|e| ChainInsertError::new(index, e))?;
                    statuses.push(WriteStatus::NonStat);
                    stats.queued += 1;
                    queued = it.next();
                }
                return Ok(statuses);
            },
            Some((block, Err(err))) => {
                self.remove_future_block(&block.hash())
                    .map_err(|e| ChainInsertError::new(it.index() as usize, e))?;
                stats.ignored += chain.len();
                log_bad_block(block, &err);
                return Err(ChainInsertError::new(it.index() as usize, err));
            },
            _ => {},
        }

        while let Some((block, result)) = next {
            match result {
                Ok(()) => {},
                Err(ValidationError::KnownBlock { .. }) => {
                    debug!(
                        target: LOG_TARGET,
                        "Inserted known block #{} [{}]",
                        block.number(),
                        block.hash()
                    );
                    stats.ignored += 1;
                    statuses.push(WriteStatus::NonStat);
                    next = it.next();
                    continue;
                },
                Err(ValidationError::FutureBlock { .. }) => {
                    // Queue this block and every following block building on it
                    let index = it.index() as usize;
                    self.add_future_block(block)
                        .map_err(|e| ChainInsertError::new(index, e))?;
                    statuses.push(WriteStatus::NonStat);
                    stats.queued += 1;
                    next = it.next();
                    while let Some((block, Err(ValidationError::UnknownAncestor { .. }))) = next {
                        let index = it.index() as usize;
                        self.add_future_block(block)
                            .map_err(|e| ChainInsertError::new(index, e))?;
                        statuses.push(WriteStatus::NonStat);
                        stats.queued += 1;
                        next = it.next();
                    }
                    if let Some((block, Err(err))) = next {
                        stats.ignored += it.remaining() + 1;
                        log_bad_block(block, &err);
                        return Err(ChainInsertError::new(it.index() as usize, err));
                    }
                    stats.ignored += it.remaining();
                    break;
                },
                Err(err) => {
                    stats.ignored += it.remaining() + 1;
                    log_bad_block(block, &err);
                    return Err(ChainInsertError::new(it.index() as usize, err));
                },
            }

            let index = it.index() as usize;
            let start = Instant::now();
            let parent = match it.previous() {
                Some(p) => p.header.clone(),
                None => self
                    .header_chain
                    .get_header(block.parent_hash(), block.number() - 1)
                    .and_then(|p| {
                        p.ok_or(
                            ValidationError::UnknownAncestor {
                                number: block.number(),
                                parent_hash: *block.parent_hash(),
                            }
                            .into(),
                        )
                    })
                    .map_err(|e| ChainInsertError::new(index, e))?,
            };
            let outcome = match self.validators.processor.process(block, &parent) {
                Ok(o) => o,
                Err(err) => {
                    log_bad_block(block, &err);
                    return Err(ChainInsertError::new(index, err));
                },
            };
            if outcome.gas_used != block.header.gas_used {
                let err = ValidationError::ProcessingFailed {
                    number: block.number(),
                    reason: format!(
                        "gas used mismatch: header {}, processed {}",
                        block.header.gas_used, outcome.gas_used
                    ),
                };
                log_bad_block(block, &err);
                return Err(ChainInsertError::new(index, err));
            }

            let status = self
                .write_block_and_set_head(head, block, outcome.receipts)
                .map_err(|e| ChainInsertError::new(index, e))?;
            match status {
                WriteStatus::CanonStat => debug!(
                    target: LOG_TARGET,
                    "Inserted new block #{} [{}]: txs {}, gas {}, elapsed {:.2?}",
                    block.number(),
                    block.hash(),
                    block.transactions().len(),
                    outcome.gas_used,
                    start.elapsed()
                ),
                WriteStatus::SideStat => debug!(
                    target: LOG_TARGET,
                    "Inserted forked block #{} [{}]: diff {}, txs {}, gas {}, elapsed {:.2?}",
                    block.number(),
                    block.hash(),
                    block.difficulty(),
                    block.transactions().len(),
                    outcome.gas_used,
                    start.elapsed()
                ),
                WriteStatus::NonStat => trace!(
                    target: LOG_TARGET,
                    "Inserted block with unknown status #{} [{}]",
                    block.number(),
                    block.hash()
                ),
            }
            statuses.push(status);
            stats.processed += 1;
            stats.used_gas += outcome.gas_used;
            stats.report(chain, index, status.is_canonical());
            next = it.next();
        }
        Ok(statuses)
    }

    fn is_not_canonical(&self, block: &Block) -> Result<bool, ChainInsertError> {
        let canonical = self
            .db
            .fetch_canonical_hash(block.number())
            .map_err(|e| ChainInsertError::new(0, e))?;
        Ok(canonical != Some(block.hash()))
    }

    /// Writes the block, its receipts and total difficulty, then moves the head to it if fork choice prefers it
    fn write_block_and_set_head(
        &self,
        head: &mut ChainHead,
        block: &Block,
        receipts: Vec<Receipt>,
    ) -> Result<WriteStatus, ChainStorageError> {
        let (hash, number) = (block.hash(), block.number());
        let parent_td = self
            .get_td(block.parent_hash(), number - 1)?
            .ok_or(ValidationError::UnknownAncestor {
                number,
                parent_hash: *block.parent_hash(),
            })?;
        let mut txn = DbTransaction::new();
        txn.insert_total_difficulty(hash, number, parent_td + block.difficulty())
            .insert_block(block.clone())
            .insert_receipts(hash, number, receipts);
        self.db.write(txn)?;

        let current = head.block.clone();
        let status = if self.forker.reorg_needed(&current, &block.header)? {
            if *block.parent_hash() != current.hash() {
                self.reorg(head, &current, &block.header)?;
            }
            self.write_head_block(head, &block.header)?;
            WriteStatus::CanonStat
        } else {
            WriteStatus::SideStat
        };
        self.remove_future_block(&hash)?;
        Ok(status)
    }

    /// Makes a block that is already fully stored the new head
    fn write_known_block(&self, head: &mut ChainHead, block: &Block) -> Result<(), ChainStorageError> {
        let current = head.block.clone();
        if *block.parent_hash() != current.hash() {
            self.reorg(head, &current, &block.header)?;
        }
        self.write_head_block(head, &block.header)
    }

    /// Makes `header` the canonical head block. The header marker follows unless `header` was already canonical, in
    /// which case the header chain is ahead of it. The fast block marker never stays below the head block.
    fn write_head_block(&self, head: &mut ChainHead, header: &BlockHeader) -> Result<(), ChainStorageError> {
        let hash = header.hash();
        let update_heads = self.db.fetch_canonical_hash(header.number)? != Some(hash);
        let update_fast = update_heads || head.fast_block.number < header.number;
        let mut txn = DbTransaction::new();
        txn.insert_canonical_hash(header.number, hash).set_head_block_hash(hash);
        if update_heads {
            txn.set_head_header_hash(hash);
        }
        if update_fast {
            txn.set_head_fast_block_hash(hash);
        }
        self.db.write(txn)?;
        if update_heads {
            head.header = header.clone();
        }
        if update_fast {
            head.fast_block = header.clone();
        }
        head.block = header.clone();
        Ok(())
    }

    /// Rewrites the canonical index from the common ancestor of `old` and `new` up to, but excluding, `new`. Canonical
    /// entries above `new` are removed.
    fn reorg(&self, head: &mut ChainHead, old: &BlockHeader, new: &BlockHeader) -> Result<(), ChainStorageError> {
        let mut old_chain = Vec::new();
        let mut new_chain = Vec::new();
        let mut old_header = old.clone();
        let mut new_header = self.parent_of(new)?;

        while old_header.number > new_header.number {
            old_chain.push(old_header.hash());
            old_header = self.parent_of(&old_header)?;
        }
        while new_header.number > old_header.number {
            new_chain.push(new_header.clone());
            new_header = self.parent_of(&new_header)?;
        }
        while old_header.hash() != new_header.hash() {
            old_chain.push(old_header.hash());
            new_chain.push(new_header.clone());
            old_header = self.parent_of(&old_header)?;
            new_header = self.parent_of(&new_header)?;
        }
        let common = old_header;

        if !old_chain.is_empty() {
            let drop = old_chain.len();
            let add = new_chain.len() + 1;
            if drop > LARGE_REORG_DEPTH {
                warn!(
                    target: LOG_TARGET,
                    "Large chain split detected: number {}, hash {}, drop {}, add {}",
                    common.number,
                    common.hash(),
                    drop,
                    add
                );
            } else {
                info!(
                    target: LOG_TARGET,
                    "Chain split detected: number {}, hash {}, drop {}, add {}",
                    common.number,
                    common.hash(),
                    drop,
                    add
                );
            }
        }

        for header in new_chain.iter().rev() {
            self.write_head_block(head, header)?;
        }
        let mut txn = DbTransaction::new();
        let mut n = new.number + 1;
        while self.db.fetch_canonical_hash(n)?.is_some() {
            txn.delete_canonical_hash(n);
            n += 1;
        }
        self.db.write(txn)
    }

    fn parent_of(&self, header: &BlockHeader) -> Result<BlockHeader, ChainStorageError> {
        let number = header.number.checked_sub(1).ok_or_else(|| {
            ChainStorageError::InvalidOperation("The genesis block has no parent".to_string())
        })?;
        self.header_chain
            .get_header(&header.parent_hash, number)?
            .ok_or_else(|| ChainStorageError::UnknownHeader {
                number,
                hash: header.parent_hash,
            })
    }

    /// Imports a validated header segment, moving the head header if fork choice prefers it
    pub fn insert_header_chain(&self, headers: &[BlockHeader]) -> Result<WriteStatus, ChainInsertError> {
        if headers.is_empty() {
            return Ok(WriteStatus::NonStat);
        }
        let start = Instant::now();
        self.header_chain.validate_header_chain(headers)?;
        let mut head = self.header_chain.write_head().map_err(|e| ChainInsertError::new(0, e))?;
        self.header_chain
            .insert_header_chain_locked(&mut head, headers, start, &self.forker)
            .map_err(|e| ChainInsertError::new(0, e))
    }

    /// Queues a block whose timestamp lies in the future. Blocks too far ahead are rejected.
    pub fn add_future_block(&self, block: &Block) -> Result<(), ChainStorageError> {
        let max = Utc::now().timestamp().max(0) as u64 + self.config.max_future_block_time.as_secs();
        if block.timestamp() > max {
            return Err(ChainStorageError::FutureBlockLimit {
                timestamp: block.timestamp(),
                max,
            });
        }
        Self::write_cache(&self.future_blocks)?.push(block.hash(), block.clone());
        Ok(())
    }

    fn remove_future_block(&self, hash: &BlockHash) -> Result<(), ChainStorageError> {
        Self::write_cache(&self.future_blocks)?.delete(hash);
        Ok(())
    }

    fn is_future_block_queued(&self, hash: &BlockHash) -> Result<bool, ChainInsertError> {
        Self::read_cache(&self.future_blocks)
            .map(|cache| cache.has(hash))
            .map_err(|e| ChainInsertError::new(0, e))
    }

    /// The number of blocks waiting in the future queue
    pub fn future_block_count(&self) -> Result<usize, ChainStorageError> {
        Ok(Self::read_cache(&self.future_blocks)?.len())
    }

    /// Retries the queued future blocks in number order, one at a time. Blocks that are still in the future are
    /// queued again.
    pub fn process_future_blocks(&self) -> Result<(), ChainStorageError> {
        let mut blocks = Self::read_cache(&self.future_blocks)?
            .values()
            .cloned()
            .collect::<Vec<_>>();
        if blocks.is_empty() {
            return Ok(());
        }
        blocks.sort_by_key(|b| b.number());
        for block in &blocks {
            if let Err(err) = self.insert_chain(std::slice::from_ref(block)) {
                debug!(
                    target: LOG_TARGET,
                    "Future block #{} [{}] not imported: {}",
                    block.number(),
                    block.hash(),
                    err
                );
            }
        }
        Ok(())
    }

    /// Imports bodies and receipts for blocks whose headers are already known. Blocks at or below `ancient_limit` go
    /// straight into the ancient store. Returns the number of blocks written.
    pub fn insert_receipt_chain(
        &self,
        blocks: &[Block],
        receipts: Vec<Vec<Receipt>>,
        ancient_limit: u64,
    ) -> Result<usize, ChainInsertError> {
        if blocks.len() != receipts.len() {
            return Err(ChainInsertError::new(0, ChainStorageError::InvalidArguments {
                func: "insert_receipt_chain",
                arg: "receipts",
                message: format!("{} blocks but {} receipt lists", blocks.len(), receipts.len()),
            }));
        }
        if blocks.is_empty() {
            return Ok(0);
        }
        check_contiguous(blocks)?;
        let mut head = self.header_chain.write_head().map_err(|e| ChainInsertError::new(0, e))?;

        let split = blocks.iter().take_while(|b| b.number() <= ancient_limit).count();
        let mut receipts = receipts;
        let live_receipts = receipts.split_off(split);
        let (ancient_blocks, live_blocks) = blocks.split_at(split);
        let start = Instant::now();
        let mut processed = 0;
        let mut ignored = 0;

        if !ancient_blocks.is_empty() {
            processed += self
                .write_ancient(&mut head, ancient_blocks, receipts)
                .map_err(|e| ChainInsertError::new(0, e))?;
        }
        if !live_blocks.is_empty() {
            let (written, skipped) = self
                .write_live(&mut head, live_blocks, live_receipts)
                .map_err(|e| ChainInsertError::new(split + e.index, e.source))?;
            processed += written;
            ignored += skipped;
        }

        let last = &blocks[blocks.len() - 1];
        debug!(
            target: LOG_TARGET,
            "Imported new block receipts: count {}, elapsed {:.2?}, number {}, hash {}{}",
            processed,
            start.elapsed(),
            last.number(),
            last.hash(),
            if ignored > 0 {
                format!(", ignored {}", ignored)
            } else {
                String::new()
            }
        );
        Ok(processed)
    }

    /// Advances the head fast block to `header` if it is still part of the header chain and fork choice prefers it
    fn update_fast_head(&self, head: &mut ChainHead, header: &BlockHeader) -> Result<bool, ChainStorageError> {
        if head.header.number < header.number {
            // A rewind happened meanwhile
            return Ok(false);
        }
        match self.forker.reorg_needed(&head.fast_block, header) {
            Ok(true) => {},
            Ok(false) => return Ok(false),
            Err(err) => {
                warn!(target: LOG_TARGET, "Reorg failed: {}", err);
                return Ok(false);
            },
        }
        let mut txn = DbTransaction::new();
        txn.set_head_fast_block_hash(header.hash());
        self.db.write(txn)?;
        head.fast_block = header.clone();
        Ok(true)
    }

    fn write_ancient(
        &self,
        head: &mut ChainHead,
        blocks: &[Block],
        receipts: Vec<Vec<Receipt>>,
    ) -> Result<usize, ChainStorageError> {
        let ancients = self.db.ancients().ok_or_else(|| {
            ChainStorageError::InvalidOperation("The database has no ancient store".to_string())
        })?;
        let first = &blocks[0];
        let last = &blocks[blocks.len() - 1];

        if first.number() == 1 && ancients.ancients()? == 0 {
            let genesis = &self.genesis;
            ancients.modify_ancients(&mut |op: &mut dyn AncientWriteOp| {
                op.append_value(AncientTable::Headers, 0, &genesis.header)?;
                op.append_value(AncientTable::Hashes, 0, &genesis.hash())?;
                op.append_value(AncientTable::Bodies, 0, &genesis.body)?;
                op.append_value(AncientTable::Receipts, 0, &Vec::<Receipt>::new())?;
                op.append_value(AncientTable::Diffs, 0, &genesis.difficulty())
            })?;
            info!(target: LOG_TARGET, "Wrote genesis to ancients");
        }
        if !self.has_header(&last.hash(), last.number())? {
            return Err(ChainStorageError::UnknownHeader {
                number: last.number(),
                hash: last.hash(),
            });
        }

        let mut tds = Vec::with_capacity(blocks.len());
        for block in blocks {
            let td = self
                .get_td(&block.hash(), block.number())?
                .ok_or_else(|| ChainStorageError::UnknownHeader {
                    number: block.number(),
                    hash: block.hash(),
                })?;
            tds.push(td);
        }
        ancients.modify_ancients(&mut |op: &mut dyn AncientWriteOp| {
            for ((block, receipts), td) in blocks.iter().zip(receipts.iter()).zip(tds.iter()) {
                let n = block.number();
                op.append_value(AncientTable::Headers, n, &block.header)?;
                op.append_value(AncientTable::Hashes, n, &block.hash())?;
                op.append_value(AncientTable::Bodies, n, &block.body)?;
                op.append_value(AncientTable::Receipts, n, receipts)?;
                op.append_value(AncientTable::Diffs, n, td)?;
            }
            Ok::<(), FreezerError>(())
        })?;

        let previous_fast_block = head.fast_block.number;
        if !self.update_fast_head(head, &last.header)? {
            // The header chain reorganised meanwhile and the blocks are not canonical
            ancients.truncate_head(previous_fast_block + 1)?;
            return Err(ChainStorageError::SideChainReceipts);
        }

        let mut txn = DbTransaction::new();
        let mut canonical = HashSet::with_capacity(blocks.len());
        for block in blocks {
            canonical.insert(block.hash());
            if block.number() == 0 {
                continue;
            }
            txn.delete_canonical_hash(block.number())
                .delete_block_without_number(block.hash(), block.number());
        }
        for (number, hash) in self.db.fetch_hashes_in_range(first.number(), last.number())? {
            if !canonical.contains(&hash) {
                txn.delete_header(hash, number);
            }
        }
        self.db.write(txn)?;
        Ok(blocks.len())
    }

    fn write_live(
        &self,
        head: &mut ChainHead,
        blocks: &[Block],
        receipts: Vec<Vec<Receipt>>,
    ) -> Result<(usize, usize), ChainInsertError> {
        let mut txn = DbTransaction::new();
        let mut skip_presence_check = false;
        let mut processed = 0;
        let mut ignored = 0;
        for (i, (block, receipts)) in blocks.iter().zip(receipts).enumerate() {
            let (hash, number) = (block.hash(), block.number());
            if !self.has_header(&hash, number).map_err(|e| ChainInsertError::new(i, e))? {
                return Err(ChainInsertError::new(i, ChainStorageError::UnknownHeader { number, hash }));
            }
            if !skip_presence_check {
                if self.has_block(&hash, number).map_err(|e| ChainInsertError::new(i, e))? {
                    ignored += 1;
                    continue;
                }
                // Later blocks can't be present either
                skip_presence_check = true;
            }
            txn.insert_body(hash, number, block.body.clone())
                .insert_receipts(hash, number, receipts);
            processed += 1;
        }
        self.db.write(txn).map_err(|e| ChainInsertError::new(0, e))?;
        self.update_fast_head(head, &blocks[blocks.len() - 1].header)
            .map_err(|e| ChainInsertError::new(blocks.len(), e))?;
        Ok((processed, ignored))
    }

    // ------------------------------------------------------------------------------------------------------------
    // Rewind
    // ------------------------------------------------------------------------------------------------------------

    /// Rewinds the chain to `number`, further if the state of the new head block is missing
    pub fn set_head(&self, number: u64) -> Result<(), ChainStorageError> {
        self.set_head_beyond_root(number, None, false).map(|_| ())
    }

    /// Rewinds the chain to `number`. The head block keeps rewinding until a block with committed state is found
    /// and, if `root` is given, until the block with that state root has been passed. Returns the number of the
    /// block carrying `root`, zero if it was not found.
    ///
    /// With `repair` set, only the block markers are fixed up; the header chain is left alone unless the ancient
    /// store needs to be rewound.
    ///
    /// Rewinding below the tail of a pruned ancient store fails with [`ChainStorageError::RewindBelowTail`].
    pub fn set_head_beyond_root(
        &self,
        number: u64,
        root: Option<FixedHash>,
        repair: bool,
    ) -> Result<u64, ChainStorageError> {
        let mut head = self.header_chain.write_head()?;
        self.rewind_and_reload(&mut head, number, root, repair)
    }

    /// Rewinds the chain to the genesis block
    pub fn reset(&self) -> Result<(), ChainStorageError> {
        let mut head = self.header_chain.write_head()?;
        self.reset_locked(&mut head)?;
        self.purge_caches()
    }

    fn rewind_and_reload(
        &self,
        head: &mut ChainHead,
        number: u64,
        root: Option<FixedHash>,
        repair: bool,
    ) -> Result<u64, ChainStorageError> {
        let root_number = self.rewind(head, number, root, repair)?;
        self.purge_caches()?;
        self.load_last_state(head)?;
        Ok(root_number)
    }

    fn rewind(
        &self,
        head: &mut ChainHead,
        target: u64,
        root: Option<FixedHash>,
        repair: bool,
    ) -> Result<u64, ChainStorageError> {
        let tail = self.db.ancient_tail()?;
        if target < tail {
            return Err(ChainStorageError::RewindBelowTail { target, tail });
        }
        let pivot = self.db.fetch_last_pivot_number()?;
        let frozen = self.db.frozen()?;
        let mut root_number = 0;

        let mut update_head = |txn: &mut DbTransaction,
                               head: &mut ChainHead,
                               header: &BlockHeader|
         -> Result<(u64, bool), ChainStorageError> {
            if header.number <= head.block.number {
                let new_head = match self.db.fetch_block(&header.hash(), header.number)? {
                    Some(block) => self.find_stateful_block(block, root, pivot, &mut root_number)?,
                    None => {
                        error!(
                            target: LOG_TARGET,
                            "Gap in the chain, rewinding to genesis: number {}, hash {}",
                            header.number,
                            header.hash()
                        );
                        self.genesis.clone()
                    },
                };
                if new_head.number() < tail {
                    return Err(ChainStorageError::RewindBelowTail {
                        target: new_head.number(),
                        tail,
                    });
                }
                txn.set_head_block_hash(new_head.hash());
                head.block = new_head.header;
            }
            if header.number < head.fast_block.number {
                let new_fast = match self.db.fetch_block(&header.hash(), header.number)? {
                    Some(block) => block.header,
                    None => self.genesis.header.clone(),
                };
                txn.set_head_fast_block_hash(new_fast.hash());
                head.fast_block = new_fast;
            }
            let number = head.block.number;
            // Wipe everything above a stateful head that fell behind the freezer, unless fast sync is still running
            let wipe = number + 1 < frozen && pivot.map_or(true, |pivot| number >= pivot);
            Ok((number, wipe))
        };

        let mut delete_content = |txn: &mut DbTransaction,
                                  hash: &BlockHash,
                                  number: u64|
         -> Result<(), ChainStorageError> {
            let frozen = self.db.frozen()?;
            if number < frozen {
                if let Some(ancients) = self.db.ancients() {
                    ancients.truncate_head(number)?;
                }
                txn.delete(DbKey::HeaderNumber(*hash));
            } else {
                txn.delete_body(*hash, number).delete_receipts(*hash, number);
            }
            Ok(())
        };

        if repair {
            let mut txn = DbTransaction::new();
            let current = head.block.clone();
            let (target, force) = update_head(&mut txn, head, &current)?;
            self.db.write(txn)?;
            if force {
                self.header_chain.set_head(
                    head,
                    target,
                    Some(&mut update_head as &mut UpdateHeadFn<'_>),
                    Some(&mut delete_content as &mut DeleteBlockContentFn<'_>),
                )?;
            }
        } else {
            warn!(target: LOG_TARGET, "Rewinding blockchain: target {}", target);
            self.header_chain.set_head(
                head,
                target,
                Some(&mut update_head as &mut UpdateHeadFn<'_>),
                Some(&mut delete_content as &mut DeleteBlockContentFn<'_>),
            )?;
        }
        Ok(root_number)
    }

    /// Walks back from `block` to the first block with committed state. Once the walk passes the fast sync pivot,
    /// the genesis block is used instead since fast sync can restart from there.
    fn find_stateful_block(
        &self,
        block: Block,
        root: Option<FixedHash>,
        pivot: Option<u64>,
        root_number: &mut u64,
    ) -> Result<Block, ChainStorageError> {
        let mut block = block;
        let mut beyond_root = root.is_none();
        loop {
            if !beyond_root && Some(block.header.state_root) == root {
                beyond_root = true;
                *root_number = block.number();
            }
            if !self.validators.state.is_committed(&block.header.state_root) {
                trace!(
                    target: LOG_TARGET,
                    "Block state missing, rewinding further: number {}, hash {}",
                    block.number(),
                    block.hash()
                );
                if pivot.map_or(true, |pivot| block.number() > pivot) {
                    match self.db.fetch_block(block.parent_hash(), block.number().saturating_sub(1))? {
                        Some(parent) if block.number() > 0 => {
                            block = parent;
                            continue;
                        },
                        _ => {
                            error!(
                                target: LOG_TARGET,
                                "Missing block in the middle, aiming genesis: number {}, hash {}",
                                block.number().saturating_sub(1),
                                block.parent_hash()
                            );
                            block = self.genesis.clone();
                        },
                    }
                } else {
                    trace!(
                        target: LOG_TARGET,
                        "Rewind passed pivot, aiming genesis: number {}, hash {}, pivot {:?}",
                        block.number(),
                        block.hash(),
                        pivot
                    );
                    block = self.genesis.clone();
                }
            }
            if beyond_root || block.number() == 0 {
                debug!(
                    target: LOG_TARGET,
                    "Rewound to block with state: number {}, hash {}",
                    block.number(),
                    block.hash()
                );
                return Ok(block);
            }
            debug!(
                target: LOG_TARGET,
                "Skipping block with threshold state: number {}, hash {}, root {}",
                block.number(),
                block.hash(),
                block.header.state_root
            );
            block = self
                .db
                .fetch_block(block.parent_hash(), block.number() - 1)?
                .unwrap_or_else(|| self.genesis.clone());
        }
    }

    fn reset_locked(&self, head: &mut ChainHead) -> Result<(), ChainStorageError> {
        self.rewind(head, 0, None, false)?;
        let mut txn = DbTransaction::new();
        add_genesis(&mut txn, &self.genesis);
        self.db.write(txn)?;
        *head = ChainHead::at(self.genesis.header.clone());
        Ok(())
    }

    /// Reloads the head markers from the database. Resets the chain if the head block is gone.
    fn load_last_state(&self, head: &mut ChainHead) -> Result<(), ChainStorageError> {
        let head_hash = match self.db.fetch_head_block_hash()? {
            Some(h) => h,
            None => {
                warn!(target: LOG_TARGET, "Empty database, resetting chain");
                return self.reset_locked(head);
            },
        };
        let current_block = match self.get_block_by_hash(&head_hash)? {
            Some(b) => b,
            None => {
                warn!(target: LOG_TARGET, "Head block missing, resetting chain: hash {}", head_hash);
                return self.reset_locked(head);
            },
        };

        let mut current_header = current_block.header.clone();
        if let Some(hash) = self.db.fetch_head_header_hash()? {
            if let Some(header) = self.get_header_by_hash(&hash)? {
                current_header = header;
            }
        }
        let mut current_fast = current_block.header.clone();
        if let Some(hash) = self.db.fetch_head_fast_block_hash()? {
            if let Some(block) = self.get_block_by_hash(&hash)? {
                current_fast = block.header;
            }
        }
        *head = ChainHead::new(current_header, current_fast, current_block.header);

        info!(
            target: LOG_TARGET,
            "Loaded most recent local header: number {}, hash {}", head.header.number, head.header.hash()
        );
        info!(
            target: LOG_TARGET,
            "Loaded most recent local full block: number {}, hash {}", head.block.number, head.block.hash()
        );
        info!(
            target: LOG_TARGET,
            "Loaded most recent local fast block: number {}, hash {}",
            head.fast_block.number,
            head.fast_block.hash()
        );
        if let Some(pivot) = self.db.fetch_last_pivot_number()? {
            info!(target: LOG_TARGET, "Loaded last fast-sync pivot marker: number {}", pivot);
        }
        Ok(())
    }

    fn purge_caches(&self) -> Result<(), ChainStorageError> {
        Self::write_cache(&self.block_cache)?.clear();
        Self::write_cache(&self.receipts_cache)?.clear();
        Self::write_cache(&self.future_blocks)?.clear();
        Ok(())
    }
}

fn add_genesis(txn: &mut DbTransaction, genesis: &Block) {
    let hash = genesis.hash();
    txn.insert_total_difficulty(hash, 0, genesis.difficulty())
        .insert_block(genesis.clone())
        .insert_receipts(hash, 0, Vec::new())
        .insert_canonical_hash(0, hash)
        .set_head_header_hash(hash)
        .set_head_fast_block_hash(hash)
        .set_head_block_hash(hash);
}

fn check_contiguous(chain: &[Block]) -> Result<(), ChainInsertError> {
    for (i, pair) in chain.windows(2).enumerate() {
        let (prev, block) = (&pair[0], &pair[1]);
        if block.number() != prev.number() + 1 || *block.parent_hash() != prev.hash() {
            error!(
                target: LOG_TARGET,
                "Non contiguous block insert: #{} [{}] after #{} [{}]",
                block.number(),
                block.hash(),
                prev.number(),
                prev.hash()
            );
            return Err(ChainInsertError::new(i + 1, ChainStorageError::NonContiguousInsert {
                index: i + 1,
                number: block.number(),
                hash: block.hash(),
                parent_hash: *block.parent_hash(),
                prev_index: i,
                prev_number: prev.number(),
                prev_hash: prev.hash(),
            }));
        }
    }
    Ok(())
}

fn log_bad_block(block: &Block, err: &ValidationError) {
    error!(
        target: LOG_TARGET,
        "########## BAD BLOCK #########\nNumber: {}\nHash: {}\nError: {}\n##############################",
        block.number(),
        block.hash(),
        err
    );
}

impl<B> Clone for BlockchainDatabase<B> {
    fn clone(&self) -> Self {
        BlockchainDatabase {
            db: self.db.clone(),
            config: self.config.clone(),
            header_chain: self.header_chain.clone(),
            forker: self.forker.clone(),
            validators: self.validators.clone(),
            genesis: self.genesis.clone(),
            block_cache: self.block_cache.clone(),
            receipts_cache: self.receipts_cache.clone(),
            future_blocks: self.future_blocks.clone(),
        }
    }
}

impl<B> fmt::Debug for BlockchainDatabase<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockchainDatabase")
            .field("config", &self.config)
            .field("genesis", &self.genesis.hash())
            .finish()
    }
}

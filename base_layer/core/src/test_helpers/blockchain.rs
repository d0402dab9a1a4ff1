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

//! Factories for blockchain databases backed by memory, with mock consensus, execution and state.

use std::sync::Arc;

use crate::{
    blocks::Block,
    chain_storage::{BlockchainBackend, BlockchainDatabase, BlockchainDatabaseConfig, HeaderChain, MemoryDatabase, Validators},
    consensus::ChainConfig,
    state::MemoryStateBoundary,
    test_helpers::{genesis_block, write_canonical_block},
    validation::mocks::{MockBlockProcessor, MockChainValidator, MockConsensusEngine},
};

/// Writes the genesis block into `db` and opens a header chain over it
pub fn create_header_chain<B: BlockchainBackend>(db: B) -> (HeaderChain<B>, Block, MockConsensusEngine) {
    let genesis = genesis_block();
    write_canonical_block(&db, &genesis);
    let engine = MockConsensusEngine::new();
    let header_chain = HeaderChain::new(
        Arc::new(db),
        Arc::new(ChainConfig::default()),
        Arc::new(engine.clone()),
    )
    .unwrap();
    (header_chain, genesis, engine)
}

/// A blockchain database together with handles on its mocks
pub struct TestBlockchain {
    pub db: BlockchainDatabase<MemoryDatabase>,
    pub backend: MemoryDatabase,
    pub engine: MockConsensusEngine,
    pub state: MemoryStateBoundary,
    pub genesis: Block,
    pub config: BlockchainDatabaseConfig,
}

impl TestBlockchain {
    /// A blockchain without an ancient store
    pub fn new() -> Self {
        Self::build(MemoryDatabase::new(), Default::default(), MockConsensusEngine::new(), None)
    }

    /// A blockchain with an in-memory freezer
    pub fn with_freezer() -> Self {
        Self::build(MemoryDatabase::with_freezer(), Default::default(), MockConsensusEngine::new(), None)
    }

    pub fn with_config(config: BlockchainDatabaseConfig) -> Self {
        Self::build(MemoryDatabase::with_freezer(), config, MockConsensusEngine::new(), None)
    }

    pub fn with_consensus_engine(engine: MockConsensusEngine) -> Self {
        Self::build(MemoryDatabase::new(), Default::default(), engine, None)
    }

    pub fn with_chain_validator(validator: MockChainValidator) -> Self {
        Self::build(MemoryDatabase::new(), Default::default(), MockConsensusEngine::new(), Some(validator))
    }

    fn build(
        backend: MemoryDatabase,
        config: BlockchainDatabaseConfig,
        engine: MockConsensusEngine,
        chain_validator: Option<MockChainValidator>,
    ) -> Self {
        let genesis = genesis_block();
        let state = MemoryStateBoundary::new();
        state.commit(genesis.header.state_root);
        let mut validators = Validators::new(engine.clone(), MockBlockProcessor, state.clone());
        if let Some(validator) = chain_validator {
            validators = validators.with_chain_validator(validator);
        }
        let db = BlockchainDatabase::new(
            backend.clone(),
            genesis.clone(),
            ChainConfig::default(),
            config.clone(),
            validators,
        )
        .unwrap();
        Self {
            db,
            backend,
            engine,
            state,
            genesis,
            config,
        }
    }

    /// Opens a fresh blockchain database over the same backend and state, as a node restart would
    pub fn reopen(&self) -> BlockchainDatabase<MemoryDatabase> {
        let validators = Validators::new(self.engine.clone(), MockBlockProcessor, self.state.clone());
        BlockchainDatabase::new(
            self.backend.clone(),
            self.genesis.clone(),
            ChainConfig::default(),
            self.config.clone(),
            validators,
        )
        .unwrap()
    }
}

impl Default for TestBlockchain {
    fn default() -> Self {
        Self::new()
    }
}

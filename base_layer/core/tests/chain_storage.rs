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

#[allow(dead_code)]
mod helpers;

use std::{thread, time::Duration};

use chainhead_core::{
    blocks::{Block, BlockHeader, Receipt},
    chain_storage::{
        BlockchainBackend,
        BlockchainDatabase,
        BlockchainDatabaseConfig,
        ChainStorageError,
        Validators,
        WriteStatus,
    },
    consensus::ChainConfig,
    test_helpers::{
        blockchain::TestBlockchain,
        genesis_block,
        make_chain_from,
        make_chain_with_difficulty,
        make_child,
        make_receipts,
        DEFAULT_DIFFICULTY,
    },
    types::Difficulty,
    validation::{
        mocks::{MockBlockProcessor, MockChainValidator, MockConsensusEngine},
        ValidationError,
    },
};
use chrono::Utc;
use helpers::{init_logging, verify_cutoff, verify_no_gaps};

fn headers_of(blocks: &[Block]) -> Vec<BlockHeader> {
    blocks.iter().map(|b| b.header.clone()).collect()
}

fn now() -> u64 {
    Utc::now().timestamp() as u64
}

/// A block on top of `parent` with its timestamp moved to `timestamp`
fn block_at(parent: &BlockHeader, timestamp: u64) -> Block {
    let mut block = make_child(parent, 0, DEFAULT_DIFFICULTY);
    block.header.timestamp = timestamp;
    block
}

mod insert_chain {
    use super::*;

    #[test]
    fn it_extends_the_canonical_chain() {
        init_logging();
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 10, 0);
        let statuses = chain.db.insert_chain(&blocks).unwrap();
        assert_eq!(statuses, vec![WriteStatus::CanonStat; 10]);

        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header, blocks[9].header);
        assert_eq!(head.fast_block, blocks[9].header);
        assert_eq!(head.block, blocks[9].header);
        assert_eq!(chain.db.current_block().unwrap(), blocks[9]);
        assert_eq!(
            chain.db.get_td(&blocks[9].hash(), 10).unwrap(),
            Some(Difficulty::from(10 * DEFAULT_DIFFICULTY))
        );
        assert_eq!(
            chain.db.get_receipts_by_hash(&blocks[4].hash()).unwrap(),
            Some(make_receipts(&blocks[4]))
        );
        verify_no_gaps(&chain.db, true, &blocks);
        verify_cutoff(&chain.db, true, &blocks, 10);
    }

    #[test]
    fn it_accepts_an_empty_batch() {
        let chain = TestBlockchain::new();
        assert!(chain.db.insert_chain(&[]).unwrap().is_empty());
        assert_eq!(chain.db.current_block().unwrap(), chain.genesis);
    }

    #[test]
    fn it_ignores_known_blocks() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 5, 0);
        chain.db.insert_chain(&blocks).unwrap();
        let statuses = chain.db.insert_chain(&blocks).unwrap();
        assert_eq!(statuses, vec![WriteStatus::NonStat; 5]);
        assert_eq!(chain.db.current_block().unwrap(), blocks[4]);
    }

    #[test]
    fn it_continues_after_known_blocks() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 8, 0);
        chain.db.insert_chain(&blocks[..4]).unwrap();
        let statuses = chain.db.insert_chain(&blocks).unwrap();
        assert_eq!(&statuses[..4], &[WriteStatus::NonStat; 4]);
        assert_eq!(&statuses[4..], &[WriteStatus::CanonStat; 4]);
        assert_eq!(chain.db.current_block().unwrap(), blocks[7]);
    }

    #[test]
    fn it_keeps_lighter_forks_on_the_side() {
        let chain = TestBlockchain::new();
        let canonical = make_chain_from(&chain.genesis, 6, 0);
        chain.db.insert_chain(&canonical).unwrap();
        let side = make_chain_from(&canonical[1], 3, 1);
        let statuses = chain.db.insert_chain(&side).unwrap();
        assert_eq!(statuses, vec![WriteStatus::SideStat; 3]);
        assert_eq!(chain.db.current_block().unwrap(), canonical[5]);
        assert_eq!(chain.db.get_canonical_hash(3).unwrap(), Some(canonical[2].hash()));
        assert!(chain.db.has_block(&side[2].hash(), 5).unwrap());
    }

    #[test]
    fn it_reorgs_to_a_heavier_fork() {
        init_logging();
        let chain = TestBlockchain::new();
        let canonical = make_chain_from(&chain.genesis, 6, 0);
        chain.db.insert_chain(&canonical).unwrap();

        // Two blocks of the fork outweigh the four canonical blocks they replace
        let fork = make_chain_with_difficulty(&canonical[1], 2, 1, 3 * DEFAULT_DIFFICULTY);
        let statuses = chain.db.insert_chain(&fork).unwrap();
        assert_eq!(statuses, vec![WriteStatus::SideStat, WriteStatus::CanonStat]);

        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.block, fork[1].header);
        assert_eq!(head.header, fork[1].header);
        assert_eq!(chain.db.get_canonical_hash(3).unwrap(), Some(fork[0].hash()));
        assert_eq!(chain.db.get_canonical_hash(4).unwrap(), Some(fork[1].hash()));
        assert_eq!(chain.db.get_canonical_hash(5).unwrap(), None);
        assert!(chain.db.get_block_by_number(6).unwrap().is_none());
        // The old branch is kept as a side chain
        assert!(chain.db.has_block(&canonical[5].hash(), 6).unwrap());
    }

    #[test]
    fn it_reorgs_back_to_known_blocks() {
        let chain = TestBlockchain::new();
        let canonical = make_chain_from(&chain.genesis, 4, 0);
        chain.db.insert_chain(&canonical).unwrap();
        chain.state.commit(canonical[0].header.state_root);
        let fork = make_chain_with_difficulty(&canonical[0], 4, 1, 2 * DEFAULT_DIFFICULTY);
        chain.db.insert_chain(&fork).unwrap();
        assert_eq!(chain.db.current_block().unwrap(), fork[3]);

        chain.db.set_head(1).unwrap();
        assert_eq!(chain.db.current_block().unwrap(), canonical[0]);
        // Rewinding removes every branch above the new head, so the old blocks are imported again
        let statuses = chain.db.insert_chain(&canonical[1..]).unwrap();
        assert_eq!(statuses, vec![WriteStatus::CanonStat; 3]);
        assert_eq!(chain.db.current_block().unwrap(), canonical[3]);
    }

    #[test]
    fn it_stops_at_the_first_invalid_block() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 6, 0);
        chain.engine.fail_body_at(4, ValidationError::InvalidBody {
            number: 4,
            reason: "bad uncle hash".to_string(),
        });
        let err = chain.db.insert_chain(&blocks).unwrap_err();
        assert_eq!(err.index, 3);
        assert!(matches!(
            err.source.as_validation_error(),
            Some(ValidationError::InvalidBody { number: 4, .. })
        ));
        assert_eq!(chain.db.current_block().unwrap(), blocks[2]);
        assert!(!chain.db.has_block(&blocks[3].hash(), 4).unwrap());

        chain.engine.clear_failures();
        let statuses = chain.db.insert_chain(&blocks[3..]).unwrap();
        assert_eq!(statuses.len(), 3);
        assert_eq!(chain.db.current_block().unwrap(), blocks[5]);
    }

    #[test]
    fn it_reports_invalid_headers() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 3, 0);
        chain.engine.fail_header_at(1, ValidationError::InvalidHeader {
            number: 1,
            reason: "invalid seal".to_string(),
        });
        let err = chain.db.insert_chain(&blocks).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(chain.db.current_block().unwrap(), chain.genesis);
    }

    #[test]
    fn it_rejects_gas_mismatches() {
        let chain = TestBlockchain::new();
        let mut blocks = make_chain_from(&chain.genesis, 2, 0);
        blocks[1].header.gas_used += 1;
        let err = chain.db.insert_chain(&blocks).unwrap_err();
        assert_eq!(err.index, 1);
        assert!(matches!(
            err.source.as_validation_error(),
            Some(ValidationError::ProcessingFailed { number: 2, .. })
        ));
        assert_eq!(chain.db.current_block().unwrap(), blocks[0]);
    }

    #[test]
    fn it_rejects_non_contiguous_batches() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 5, 0);
        let batch = vec![blocks[0].clone(), blocks[1].clone(), blocks[3].clone()];
        let err = chain.db.insert_chain(&batch).unwrap_err();
        assert_eq!(err.index, 2);
        match err.source {
            ChainStorageError::NonContiguousInsert {
                index,
                number,
                prev_number,
                ..
            } => {
                assert_eq!(index, 2);
                assert_eq!(number, 4);
                assert_eq!(prev_number, 2);
            },
            other => panic!("unexpected error {}", other),
        }
        assert_eq!(chain.db.current_block().unwrap(), chain.genesis);
    }

    #[test]
    fn it_needs_a_known_ancestor() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 5, 0);
        let err = chain.db.insert_chain(&blocks[2..]).unwrap_err();
        assert_eq!(err.index, 0);
        assert!(matches!(
            err.source.as_validation_error(),
            Some(ValidationError::UnknownAncestor { number: 3, .. })
        ));
    }

    #[test]
    fn it_honours_the_chain_validator() {
        let chain = TestBlockchain::with_chain_validator(MockChainValidator::new(|_, headers| Ok(headers.len() < 4)));
        let blocks = make_chain_from(&chain.genesis, 6, 0);
        let err = chain.db.insert_chain(&blocks).unwrap_err();
        assert_eq!(err.index, 0);
        assert!(matches!(err.source, ChainStorageError::ChainRejected { number: 6, .. }));

        chain.db.insert_chain(&blocks[..3]).unwrap();
        assert_eq!(chain.db.current_block().unwrap(), blocks[2]);
    }
}

mod future_blocks {
    use super::*;

    #[test]
    fn it_queues_and_later_imports_future_blocks() {
        init_logging();
        let chain = TestBlockchain::with_consensus_engine(MockConsensusEngine::new().with_future_check(0));
        let first = block_at(&chain.genesis.header, now() + 1);
        let second = block_at(&first.header, now() + 2);
        let statuses = chain.db.insert_chain(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(statuses, vec![WriteStatus::NonStat; 2]);
        assert_eq!(chain.db.future_block_count().unwrap(), 2);
        assert_eq!(chain.db.current_block().unwrap(), chain.genesis);

        thread::sleep(Duration::from_secs(3));
        chain.db.process_future_blocks().unwrap();
        assert_eq!(chain.db.current_block().unwrap(), second);
        assert_eq!(chain.db.future_block_count().unwrap(), 0);
    }

    #[test]
    fn it_rejects_blocks_too_far_ahead() {
        let chain = TestBlockchain::with_consensus_engine(MockConsensusEngine::new().with_future_check(0));
        let max = chain.config.max_future_block_time.as_secs();
        let block = block_at(&chain.genesis.header, now() + max + 3600);
        let err = chain.db.insert_chain(&[block]).unwrap_err();
        assert_eq!(err.index, 0);
        assert!(matches!(err.source, ChainStorageError::FutureBlockLimit { .. }));
        assert_eq!(chain.db.future_block_count().unwrap(), 0);
    }

    #[test]
    fn it_queues_children_of_queued_blocks() {
        let chain = TestBlockchain::with_consensus_engine(MockConsensusEngine::new().with_future_check(0));
        let first = block_at(&chain.genesis.header, now() + 5);
        chain.db.insert_chain(&[first.clone()]).unwrap();

        // The child itself is not from the future, but its parent is still queued
        let mut child = make_child(&first.header, 0, DEFAULT_DIFFICULTY);
        child.header.timestamp = 0;
        let statuses = chain.db.insert_chain(&[child]).unwrap();
        assert_eq!(statuses, vec![WriteStatus::NonStat]);
        assert_eq!(chain.db.future_block_count().unwrap(), 2);
    }

    #[test]
    fn rewinds_drop_the_queue() {
        let chain = TestBlockchain::with_consensus_engine(MockConsensusEngine::new().with_future_check(0));
        let blocks = make_chain_from(&chain.genesis, 3, 0);
        chain.db.insert_chain(&blocks).unwrap();
        chain
            .db
            .insert_chain(&[block_at(&blocks[2].header, now() + 5)])
            .unwrap();
        assert_eq!(chain.db.future_block_count().unwrap(), 1);
        chain.db.set_head(2).unwrap();
        assert_eq!(chain.db.future_block_count().unwrap(), 0);
    }
}

mod header_chain {
    use super::*;

    #[test]
    fn headers_run_ahead_of_blocks() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 10, 0);
        let status = chain.db.insert_header_chain(&headers_of(&blocks)).unwrap();
        assert_eq!(status, WriteStatus::CanonStat);

        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header, blocks[9].header);
        assert_eq!(head.fast_block, chain.genesis.header);
        assert_eq!(head.block, chain.genesis.header);
        assert_eq!(chain.db.get_header_by_number(7).unwrap(), Some(blocks[6].header.clone()));
        assert!(chain.db.get_block_by_number(7).unwrap().is_none());

        // Full blocks catch up without pulling the header marker back
        chain.db.insert_chain(&blocks[..5]).unwrap();
        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header, blocks[9].header);
        assert_eq!(head.fast_block, blocks[4].header);
        assert_eq!(head.block, blocks[4].header);
        assert!(head.is_ordered());

        // The fast block marker is persisted along with the head block
        chain.state.commit(blocks[4].header.state_root);
        assert_eq!(chain.reopen().chain_head().unwrap(), head);
    }

    #[test]
    fn heavier_fork_replaces_a_validated_chain() {
        // Only the initial import from genesis is constrained
        let validator = MockChainValidator::new(|current, headers| Ok(current.number != 0 || headers.len() == 64));
        let chain = TestBlockchain::with_chain_validator(validator);
        let chain_a = make_chain_from(&chain.genesis, 64, 0);
        let status = chain.db.insert_header_chain(&headers_of(&chain_a)).unwrap();
        assert_eq!(status, WriteStatus::CanonStat);

        let chain_b = make_chain_with_difficulty(&chain_a[43], 20, 1, 2 * DEFAULT_DIFFICULTY);
        let status = chain.db.insert_header_chain(&headers_of(&chain_b)).unwrap();
        assert_eq!(status, WriteStatus::CanonStat);
        assert_eq!(chain.db.current_header().unwrap(), chain_b[19].header);
        assert_eq!(chain.db.get_canonical_hash(44).unwrap(), Some(chain_a[43].hash()));
        assert_eq!(chain.db.get_canonical_hash(45).unwrap(), Some(chain_b[0].hash()));
        assert_eq!(
            chain.db.get_td(&chain_b[19].hash(), 64).unwrap(),
            Some(Difficulty::from(84 * DEFAULT_DIFFICULTY))
        );

        // A shorter past chain off the old branch is weighed against the new canonical chain
        let chain_c = make_chain_from(&chain_a[53], 10, 2);
        let status = chain.db.insert_header_chain(&headers_of(&chain_c)).unwrap();
        assert_eq!(status, WriteStatus::SideStat);
        assert_eq!(
            chain.db.get_td(&chain_c[9].hash(), 64).unwrap(),
            Some(Difficulty::from(64 * DEFAULT_DIFFICULTY))
        );
        assert_eq!(chain.db.current_header().unwrap(), chain_b[19].header);
        assert_eq!(chain.db.get_canonical_hash(55).unwrap(), Some(chain_b[10].hash()));
    }

    /// A chain validator that only admits an initial 64 block segment, or a 10 block segment replacing blocks 55-64
    fn length_gated_validator() -> MockChainValidator {
        MockChainValidator::new(|current, headers| {
            Ok(match current.number {
                0 => headers.len() == 64,
                64 => headers.first().map(|h| h.number) == Some(55) && headers.len() == 10,
                _ => false,
            })
        })
    }

    #[test]
    fn past_chain_insert_respects_the_validator() {
        let chain = TestBlockchain::with_chain_validator(length_gated_validator());
        let chain_a = make_chain_from(&chain.genesis, 64, 0);
        let status = chain.db.insert_header_chain(&headers_of(&chain_a)).unwrap();
        assert_eq!(status, WriteStatus::CanonStat);
        assert_eq!(chain.db.current_header().unwrap(), chain_a[63].header);

        // Heavier, but rejected by the validator
        let chain_b = make_chain_with_difficulty(&chain_a[43], 20, 1, 2 * DEFAULT_DIFFICULTY);
        let status = chain.db.insert_header_chain(&headers_of(&chain_b)).unwrap();
        assert_eq!(status, WriteStatus::SideStat);
        assert_eq!(chain.db.current_header().unwrap(), chain_a[63].header);

        let chain_c = make_chain_with_difficulty(&chain_a[53], 10, 2, 2 * DEFAULT_DIFFICULTY);
        let status = chain.db.insert_header_chain(&headers_of(&chain_c)).unwrap();
        assert_eq!(status, WriteStatus::CanonStat);
        assert_eq!(chain.db.current_header().unwrap(), chain_c[9].header);
        assert_eq!(chain.db.get_canonical_hash(55).unwrap(), Some(chain_c[0].hash()));
        assert_eq!(chain.db.get_canonical_hash(54).unwrap(), Some(chain_a[53].hash()));
    }
}

mod receipt_chain {
    use super::*;

    fn receipts_of(blocks: &[Block]) -> Vec<Vec<Receipt>> {
        blocks.iter().map(make_receipts).collect()
    }

    #[test]
    fn it_imports_ancient_and_live_segments() {
        init_logging();
        let chain = TestBlockchain::with_freezer();
        let blocks = make_chain_from(&chain.genesis, 10, 0);
        chain.db.insert_header_chain(&headers_of(&blocks)).unwrap();

        let written = chain.db.insert_receipt_chain(&blocks, receipts_of(&blocks), 4).unwrap();
        assert_eq!(written, 10);
        // Genesis plus blocks 1-4
        assert_eq!(chain.db.ancients().unwrap(), 5);

        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header, blocks[9].header);
        assert_eq!(head.fast_block, blocks[9].header);
        assert_eq!(head.block, chain.genesis.header);
        for block in &blocks {
            assert_eq!(chain.db.get_block_by_number(block.number()).unwrap().as_ref(), Some(block));
            assert_eq!(
                chain.db.get_receipts_by_hash(&block.hash()).unwrap(),
                Some(make_receipts(block))
            );
        }
    }

    #[test]
    fn concurrent_rewind_leaves_markers_consistent() {
        let chain = TestBlockchain::with_freezer();
        let blocks = make_chain_from(&chain.genesis, 40, 0);
        chain.db.insert_header_chain(&headers_of(&blocks)).unwrap();

        let db = chain.db.clone();
        let importer = {
            let blocks = blocks.clone();
            thread::spawn(move || db.insert_receipt_chain(&blocks, receipts_of(&blocks), 20))
        };
        chain.db.set_head(30).unwrap();
        // Either order is fine, the import only fails if the rewind went first
        let _ = importer.join().unwrap();

        let head = chain.db.chain_head().unwrap();
        assert!(head.is_ordered());
        assert!(head.header.number <= 30);
        let fast = chain.db.get_block_by_number(head.fast_block.number).unwrap().unwrap();
        assert_eq!(fast.header, head.fast_block);
        assert!(chain.db.ancients().unwrap() <= head.fast_block.number + 1);
    }

    #[test]
    fn it_skips_bodies_it_already_has() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 6, 0);
        chain.db.insert_header_chain(&headers_of(&blocks)).unwrap();
        let written = chain.db.insert_receipt_chain(&blocks[..3], receipts_of(&blocks[..3]), 0).unwrap();
        assert_eq!(written, 3);
        let written = chain.db.insert_receipt_chain(&blocks, receipts_of(&blocks), 0).unwrap();
        assert_eq!(written, 3);
        assert_eq!(chain.db.current_fast_block().unwrap(), blocks[5]);
    }

    #[test]
    fn it_needs_the_headers() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 4, 0);
        chain.db.insert_header_chain(&headers_of(&blocks[..2])).unwrap();
        let err = chain
            .db
            .insert_receipt_chain(&blocks, receipts_of(&blocks), 0)
            .unwrap_err();
        assert_eq!(err.index, 2);
        assert!(matches!(err.source, ChainStorageError::UnknownHeader { number: 3, .. }));
    }

    #[test]
    fn it_checks_the_receipt_count() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 2, 0);
        let err = chain.db.insert_receipt_chain(&blocks, vec![], 0).unwrap_err();
        assert!(matches!(err.source, ChainStorageError::InvalidArguments { .. }));
    }
}

mod rewind {
    use super::*;

    #[test]
    fn set_head_beyond_root_passes_the_root() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 10, 0);
        chain.db.insert_chain(&blocks).unwrap();
        chain.state.commit(blocks[2].header.state_root);
        chain.state.commit(blocks[7].header.state_root);

        let root_number = chain
            .db
            .set_head_beyond_root(9, Some(blocks[5].header.state_root), false)
            .unwrap();
        assert_eq!(root_number, 6);
        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header, blocks[8].header);
        assert_eq!(head.fast_block, blocks[8].header);
        assert_eq!(head.block, blocks[2].header);
        verify_cutoff(&chain.db, true, &blocks, 9);
    }

    #[test]
    fn set_head_stops_at_committed_state() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 10, 0);
        chain.db.insert_chain(&blocks).unwrap();
        chain.state.commit(blocks[7].header.state_root);

        chain.db.set_head(9).unwrap();
        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header.number, 9);
        assert_eq!(head.block.number, 8);
        verify_no_gaps(&chain.db, true, &blocks);
    }

    #[test]
    fn reset_returns_to_genesis() {
        let chain = TestBlockchain::with_freezer();
        let blocks = make_chain_from(&chain.genesis, 30, 0);
        chain.db.insert_chain(&blocks).unwrap();
        chain.db.freeze(16).unwrap();
        assert!(chain.db.ancients().unwrap() > 0);

        chain.db.reset().unwrap();
        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header, chain.genesis.header);
        assert_eq!(head.fast_block, chain.genesis.header);
        assert_eq!(head.block, chain.genesis.header);
        assert_eq!(chain.db.get_block_by_number(0).unwrap(), Some(chain.genesis.clone()));
        verify_cutoff(&chain.db, true, &blocks, 0);

        // The chain can be rebuilt from scratch
        let statuses = chain.db.insert_chain(&blocks[..5]).unwrap();
        assert_eq!(statuses, vec![WriteStatus::CanonStat; 5]);
    }

    #[test]
    fn set_head_stays_above_pruned_history() {
        let chain = TestBlockchain::with_freezer();
        let blocks = make_chain_from(&chain.genesis, 24, 0);
        chain.db.insert_chain(&blocks).unwrap();
        assert_eq!(chain.db.freeze(16).unwrap(), 9);
        chain.backend.ancients().unwrap().truncate_tail(4).unwrap();
        assert_eq!(chain.db.ancient_tail().unwrap(), 4);
        let before = chain.db.chain_head().unwrap();

        // Below the tail nothing is touched
        let err = chain.db.set_head(2).unwrap_err();
        assert!(matches!(err, ChainStorageError::RewindBelowTail { target: 2, tail: 4 }));
        // Missing state would push the head block to genesis
        let err = chain.db.set_head(6).unwrap_err();
        assert!(matches!(err, ChainStorageError::RewindBelowTail { target: 0, tail: 4 }));
        assert_eq!(chain.db.chain_head().unwrap(), before);
        assert_eq!(chain.db.ancients().unwrap(), 9);
        assert_eq!(chain.db.ancient_tail().unwrap(), 4);
        for block in &blocks[3..] {
            assert_eq!(chain.db.get_block_by_number(block.number()).unwrap().as_ref(), Some(block));
        }

        // With state at #6 the rewind truncates the ancients down to it
        chain.state.commit(blocks[5].header.state_root);
        chain.db.set_head(6).unwrap();
        let head = chain.db.chain_head().unwrap();
        assert_eq!(head.header, blocks[5].header);
        assert_eq!(head.fast_block, blocks[5].header);
        assert_eq!(head.block, blocks[5].header);
        assert_eq!(chain.db.ancients().unwrap(), 7);
        assert_eq!(chain.db.ancient_tail().unwrap(), 4);
        for block in &blocks[3..6] {
            assert_eq!(chain.db.get_block_by_number(block.number()).unwrap().as_ref(), Some(block));
        }
        assert!(chain.db.get_block_by_number(7).unwrap().is_none());
    }
}

mod recovery {
    use super::*;

    #[test]
    fn it_writes_genesis_into_an_empty_database() {
        let chain = TestBlockchain::new();
        assert_eq!(chain.db.get_canonical_hash(0).unwrap(), Some(chain.genesis.hash()));
        assert_eq!(chain.db.current_header().unwrap(), chain.genesis.header);
        assert_eq!(chain.db.get_td(&chain.genesis.hash(), 0).unwrap(), Some(Difficulty::zero()));
    }

    #[test]
    fn it_rejects_a_different_genesis() {
        let chain = TestBlockchain::new();
        let mut other = genesis_block();
        other.header.extra = b"other".to_vec();
        let validators = Validators::new(MockConsensusEngine::new(), MockBlockProcessor, chain.state.clone());
        let err = BlockchainDatabase::new(
            chain.backend.clone(),
            other,
            ChainConfig::default(),
            BlockchainDatabaseConfig::default(),
            validators,
        )
        .unwrap_err();
        assert!(matches!(err, ChainStorageError::GenesisMismatch { .. }));
    }

    #[test]
    fn it_reloads_the_head_markers() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 10, 0);
        chain.db.insert_chain(&blocks).unwrap();
        chain.state.commit(blocks[9].header.state_root);

        let reopened = chain.reopen();
        assert_eq!(reopened.chain_head().unwrap(), chain.db.chain_head().unwrap());
    }

    #[test]
    fn it_repairs_a_missing_head_state() {
        init_logging();
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 10, 0);
        chain.db.insert_chain(&blocks).unwrap();
        chain.state.commit(blocks[4].header.state_root);

        let reopened = chain.reopen();
        let head = reopened.chain_head().unwrap();
        assert_eq!(head.block, blocks[4].header);
        // The repair leaves the header chain and fast block alone
        assert_eq!(head.header, blocks[9].header);
        assert_eq!(head.fast_block, blocks[9].header);
        verify_cutoff(&reopened, true, &blocks, 10);
    }

    #[test]
    fn it_falls_back_to_genesis_without_any_state() {
        let chain = TestBlockchain::new();
        let blocks = make_chain_from(&chain.genesis, 5, 0);
        chain.db.insert_chain(&blocks).unwrap();

        let reopened = chain.reopen();
        assert_eq!(reopened.current_block().unwrap(), chain.genesis);
        assert_eq!(reopened.current_header().unwrap(), blocks[4].header);
    }
}

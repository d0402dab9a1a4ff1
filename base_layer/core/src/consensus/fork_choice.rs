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

use std::{cmp::Ordering, fmt, sync::Arc};

use log::*;

use crate::{
    blocks::{BlockHeader, ChainHeader},
    chain_storage::ChainStorageError,
    consensus::{
        chain_strength_comparer::{strongest_chain, ChainStrengthComparer},
        ChainReader,
        ChainValidator,
        ForkChoiceError,
    },
};

pub use crate::consensus::chain_strength_comparer::PreserveFn;

const LOG_TARGET: &str = "c::cs::fork_choice";

/// Decides whether an incoming chain tip should replace the current canonical head.
///
/// The rule, applied in order:
/// 1. An external chain validator, when present, may veto the segment.
/// 2. Once the terminal total difficulty has been reached the incoming tip always wins.
/// 3. More total difficulty wins.
/// 4. At equal total difficulty the lower block number wins.
/// 5. The optional `preserve` predicate breaks the remaining tie in favour of preserved tips.
/// 6. Finally the larger hash wins.
pub struct ForkChoice {
    reader: Arc<dyn ChainReader>,
    comparer: Box<dyn ChainStrengthComparer + Send + Sync>,
    validator: Option<Arc<dyn ChainValidator>>,
}

impl ForkChoice {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        preserve: Option<Arc<PreserveFn>>,
        validator: Option<Arc<dyn ChainValidator>>,
    ) -> Self {
        let mut builder = strongest_chain().by_total_difficulty().then().by_lower_number();
        if let Some(preserve) = preserve {
            builder = builder.then().by_preference(preserve);
        }
        Self {
            reader,
            comparer: builder.then().by_hash().build(),
            validator,
        }
    }

    pub fn validator(&self) -> Option<&Arc<dyn ChainValidator>> {
        self.validator.as_ref()
    }

    /// Returns true if `header` should become the new head in place of `current`
    pub fn reorg_needed(&self, current: &BlockHeader, header: &BlockHeader) -> Result<bool, ChainStorageError> {
        self.reorg_needed_for_chain(current, std::slice::from_ref(header))
    }

    /// As [reorg_needed](Self::reorg_needed), with the validator seeing the whole incoming segment. The last header
    /// of `chain` is the candidate tip.
    pub fn reorg_needed_for_chain(
        &self,
        current: &BlockHeader,
        chain: &[BlockHeader],
    ) -> Result<bool, ChainStorageError> {
        let header = match chain.last() {
            Some(h) => h,
            None => return Ok(false),
        };
        if !self.validate_reorg(current, chain)? {
            debug!(
                target: LOG_TARGET,
                "Chain validator rejected segment ending at #{} on top of #{}", header.number, current.number
            );
            return Ok(false);
        }
        self.is_stronger(current, header)
    }

    /// Asks the external validator, if any, whether `chain` may be imported on top of `current`
    pub fn validate_reorg(&self, current: &BlockHeader, chain: &[BlockHeader]) -> Result<bool, ChainStorageError> {
        match self.validator {
            Some(ref validator) => Ok(validator.is_valid_chain(current, chain)?),
            None => Ok(true),
        }
    }

    fn is_stronger(&self, current: &BlockHeader, header: &BlockHeader) -> Result<bool, ChainStorageError> {
        let local_td = self.total_difficulty(current)?;
        let extern_td = self.total_difficulty(header)?;

        if let Some(ttd) = self.reader.config().terminal_total_difficulty {
            if ttd <= extern_td {
                return Ok(true);
            }
        }

        let local = ChainHeader::new(current.clone(), local_td);
        let external = ChainHeader::new(header.clone(), extern_td);
        Ok(self.comparer.compare(&external, &local) == Ordering::Greater)
    }

    fn total_difficulty(&self, header: &BlockHeader) -> Result<crate::types::Difficulty, ChainStorageError> {
        let hash = header.hash();
        self.reader.get_td(&hash, header.number)?.ok_or_else(|| {
            ForkChoiceError::MissingTotalDifficulty {
                number: header.number,
                hash,
            }
            .into()
        })
    }
}

impl fmt::Debug for ForkChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkChoice")
            .field("comparer", &self.comparer)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::{collections::HashMap, sync::RwLock};

    use quickcheck::quickcheck;

    use super::*;
    use crate::{
        consensus::ChainConfig,
        test_helpers::make_header,
        types::{BlockHash, Difficulty},
        validation::mocks::MockChainValidator,
    };

    #[derive(Default)]
    struct StaticReader {
        config: ChainConfig,
        tds: RwLock<HashMap<BlockHash, Difficulty>>,
    }

    impl StaticReader {
        fn set(&self, header: &BlockHeader, td: u64) {
            self.tds.write().unwrap().insert(header.hash(), Difficulty::from(td));
        }
    }

    impl ChainReader for StaticReader {
        fn config(&self) -> &ChainConfig {
            &self.config
        }

        fn get_td(&self, hash: &BlockHash, _number: u64) -> Result<Option<Difficulty>, ChainStorageError> {
            Ok(self.tds.read().unwrap().get(hash).copied())
        }
    }

    fn header(number: u64, salt: u8) -> BlockHeader {
        let mut h = make_header(number);
        h.extra = vec![salt];
        h
    }

    fn setup(config: ChainConfig) -> Arc<StaticReader> {
        Arc::new(StaticReader {
            config,
            ..Default::default()
        })
    }

    #[test]
    fn heavier_chain_wins() {
        let reader = setup(ChainConfig::default());
        let (current, incoming) = (header(10, 0), header(8, 0));
        reader.set(&current, 100);
        reader.set(&incoming, 101);
        let forker = ForkChoice::new(reader, None, None);
        assert!(forker.reorg_needed(&current, &incoming).unwrap());
        assert!(!forker.reorg_needed(&incoming, &current).unwrap());
    }

    #[test]
    fn equal_weight_prefers_lower_number() {
        let reader = setup(ChainConfig::default());
        let (current, incoming) = (header(10, 0), header(9, 0));
        reader.set(&current, 100);
        reader.set(&incoming, 100);
        let forker = ForkChoice::new(reader, None, None);
        assert!(forker.reorg_needed(&current, &incoming).unwrap());
        assert!(!forker.reorg_needed(&incoming, &current).unwrap());
    }

    #[test]
    fn preserve_beats_hash() {
        let reader = setup(ChainConfig::default());
        let (a, b) = (header(10, 1), header(10, 2));
        reader.set(&a, 100);
        reader.set(&b, 100);
        let forker = ForkChoice::new(reader.clone(), None, None);
        let by_hash = a.hash() > b.hash();
        assert_eq!(forker.reorg_needed(&b, &a).unwrap(), by_hash);
        assert_eq!(forker.reorg_needed(&a, &b).unwrap(), !by_hash);

        let preserve: Arc<PreserveFn> = Arc::new(|h: &BlockHeader| h.extra == vec![1]);
        let forker = ForkChoice::new(reader, Some(preserve), None);
        assert!(forker.reorg_needed(&b, &a).unwrap());
        assert!(!forker.reorg_needed(&a, &b).unwrap());
    }

    #[test]
    fn identical_tip_is_not_a_reorg() {
        let reader = setup(ChainConfig::default());
        let current = header(3, 0);
        reader.set(&current, 30);
        let forker = ForkChoice::new(reader, None, None);
        assert!(!forker.reorg_needed(&current, &current).unwrap());
    }

    #[test]
    fn terminal_total_difficulty_short_circuits() {
        let reader = setup(ChainConfig::new(1).with_terminal_total_difficulty(Difficulty::from(50)));
        let (current, incoming) = (header(10, 0), header(4, 0));
        reader.set(&current, 100);
        reader.set(&incoming, 50);
        let forker = ForkChoice::new(reader, None, None);
        assert!(forker.reorg_needed(&current, &incoming).unwrap());
    }

    #[test]
    fn missing_td_is_an_error() {
        let reader = setup(ChainConfig::default());
        let (current, incoming) = (header(10, 0), header(11, 0));
        reader.set(&current, 100);
        let forker = ForkChoice::new(reader, None, None);
        let err = forker.reorg_needed(&current, &incoming).unwrap_err();
        assert!(matches!(
            err,
            ChainStorageError::ForkChoiceError(ForkChoiceError::MissingTotalDifficulty { number: 11, .. })
        ));
    }

    #[test]
    fn validator_can_veto() {
        let reader = setup(ChainConfig::default());
        let (current, incoming) = (header(10, 0), header(11, 0));
        reader.set(&current, 100);
        reader.set(&incoming, 200);
        let forker = ForkChoice::new(reader.clone(), None, Some(Arc::new(MockChainValidator::constant(false))));
        assert!(!forker.reorg_needed(&current, &incoming).unwrap());
        let forker = ForkChoice::new(reader, None, Some(Arc::new(MockChainValidator::constant(true))));
        assert!(forker.reorg_needed(&current, &incoming).unwrap());
    }

    quickcheck! {
        fn distinct_tips_reorg_exactly_one_way(td_a: u32, td_b: u32, n_a: u8, n_b: u8, salt: u8) -> bool {
            let reader = setup(ChainConfig::default());
            let a = header(u64::from(n_a), salt);
            let b = header(u64::from(n_b), salt.wrapping_add(1));
            reader.set(&a, u64::from(td_a));
            reader.set(&b, u64::from(td_b));
            let forker = ForkChoice::new(reader, None, None);
            forker.reorg_needed(&a, &b).unwrap() != forker.reorg_needed(&b, &a).unwrap()
        }
    }
}

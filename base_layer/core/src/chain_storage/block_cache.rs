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

use std::collections::{HashMap, VecDeque};

use crate::types::BlockHash;

/// A fixed capacity cache keyed by block hash. When full, the oldest inserted entry is evicted. Lookups do not
/// refresh an entry.
#[derive(Debug, Clone)]
pub struct BlockCache<V> {
    capacity: usize,
    entries: HashMap<BlockHash, V>,
    order: VecDeque<BlockHash>,
}

impl<V> BlockCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Inserts `value` under `hash`. Replacing an existing entry keeps its position in the eviction order.
    pub fn push(&mut self, hash: BlockHash, value: V) {
        if let Some(existing) = self.entries.get_mut(&hash) {
            *existing = value;
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                },
                None => break,
            }
        }
        self.order.push_back(hash);
        self.entries.insert(hash, value);
    }

    pub fn get(&self, hash: &BlockHash) -> Option<&V> {
        self.entries.get(hash)
    }

    pub fn has(&self, hash: &BlockHash) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn delete(&mut self, hash: &BlockHash) -> Option<V> {
        let value = self.entries.remove(hash)?;
        self.order.retain(|h| h != hash);
        Some(value)
    }

    /// Iterates over the entries in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.order.iter().filter_map(move |h| self.entries.get(h))
    }

    /// Removes and returns every entry in insertion order
    pub fn drain(&mut self) -> Vec<V> {
        let mut values = Vec::with_capacity(self.entries.len());
        for hash in self.order.drain(..) {
            if let Some(v) = self.entries.remove(&hash) {
                values.push(v);
            }
        }
        values
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::make_chain;

    #[test]
    fn it_evicts_the_oldest_insert() {
        let chain = make_chain(3);
        let mut cache = BlockCache::new(2);
        for block in &chain {
            cache.push(block.hash(), block.clone());
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&chain[0].hash()).is_none());
        assert!(cache.has(&chain[1].hash()));
        assert!(cache.has(&chain[2].hash()));

        cache.delete(&chain[1].hash());
        assert!(!cache.has(&chain[1].hash()));
        assert!(cache.has(&chain[2].hash()));
    }

    #[test]
    fn reads_do_not_refresh_entries() {
        let mut cache = BlockCache::new(2);
        let (a, b, c) = (BlockHash::digest(b"a"), BlockHash::digest(b"b"), BlockHash::digest(b"c"));
        cache.push(a, 1);
        cache.push(b, 2);
        assert_eq!(cache.get(&a), Some(&1));
        cache.push(c, 3);
        assert!(!cache.has(&a));
        cache.push(b, 20);
        assert_eq!(cache.values().copied().collect::<Vec<_>>(), vec![20, 3]);
        assert_eq!(cache.drain(), vec![20, 3]);
        assert!(cache.is_empty());
    }
}

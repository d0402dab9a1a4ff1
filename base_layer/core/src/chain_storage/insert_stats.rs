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

use std::time::{Duration, Instant};

use chrono::Utc;
use log::*;
use num_format::{Locale, ToFormattedString};

use crate::blocks::Block;

const LOG_TARGET: &str = "c::cs::insert_stats";

/// Heads older than this are flagged in the import report
const STALE_HEAD_AGE: i64 = 60;

/// Running totals for one `insert_chain` call, reported periodically
#[derive(Debug)]
pub struct InsertStats {
    pub queued: usize,
    pub processed: usize,
    pub ignored: usize,
    pub used_gas: u64,
    last_index: usize,
    start_time: Instant,
    report_interval: Duration,
}

impl InsertStats {
    pub fn new(report_interval: Duration) -> Self {
        Self {
            queued: 0,
            processed: 0,
            ignored: 0,
            used_gas: 0,
            last_index: 0,
            start_time: Instant::now(),
            report_interval,
        }
    }

    /// Logs a summary if `index` is the last block of `chain` or if the report interval has elapsed, then starts a
    /// new window. `set_head` selects between the canonical and the side chain wording.
    pub fn report(&mut self, chain: &[Block], index: usize, set_head: bool) {
        let elapsed = self.start_time.elapsed();
        if index + 1 != chain.len() && elapsed < self.report_interval {
            return;
        }
        let segment = match chain.get(self.last_index..=index) {
            Some(s) if !s.is_empty() => s,
            _ => return,
        };
        let end = &segment[segment.len() - 1];
        let txs = segment.iter().map(|b| b.transactions().len()).sum::<usize>();
        let mgas = self.used_gas as f64 / 1_000_000.0;
        let mgasps = mgas / elapsed.as_secs_f64().max(f64::EPSILON);
        let age = Utc::now().timestamp() - end.timestamp() as i64;
        let age_note = if age > STALE_HEAD_AGE {
            format!(", age {}s", age.to_formatted_string(&Locale::en))
        } else {
            String::new()
        };
        let message = if set_head {
            "Imported new chain segment"
        } else {
            "Imported new potential chain segment"
        };
        info!(
            target: LOG_TARGET,
            "{}: blocks {}, txs {}, mgas {:.3}, elapsed {:.2?}, mgasps {:.3}, number {}, hash {}{}{}{}",
            message,
            self.processed.to_formatted_string(&Locale::en),
            txs.to_formatted_string(&Locale::en),
            mgas,
            elapsed,
            mgasps,
            end.number().to_formatted_string(&Locale::en),
            end.hash(),
            age_note,
            if self.queued > 0 {
                format!(", queued {}", self.queued)
            } else {
                String::new()
            },
            if self.ignored > 0 {
                format!(", ignored {}", self.ignored)
            } else {
                String::new()
            },
        );
        self.reset(index + 1);
    }

    fn reset(&mut self, last_index: usize) {
        self.queued = 0;
        self.processed = 0;
        self.ignored = 0;
        self.used_gas = 0;
        self.last_index = last_index;
        self.start_time = Instant::now();
    }

    pub fn last_index(&self) -> usize {
        self.last_index
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::make_chain;

    #[test]
    fn it_reports_at_the_end_of_a_batch() {
        let chain = make_chain(4);
        let mut stats = InsertStats::new(Duration::from_secs(3600));
        stats.processed = 2;
        stats.report(&chain, 1, true);
        // Mid batch and within the interval: nothing reported
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.last_index(), 0);

        stats.processed = 4;
        stats.used_gas = 21_000;
        stats.report(&chain, 3, true);
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.used_gas, 0);
        assert_eq!(stats.last_index(), 4);
    }

    #[test]
    fn it_reports_once_the_interval_elapses() {
        let chain = make_chain(4);
        let mut stats = InsertStats::new(Duration::from_secs(0));
        stats.processed = 1;
        stats.ignored = 1;
        stats.report(&chain, 1, false);
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.ignored, 0);
        assert_eq!(stats.last_index(), 2);
    }
}

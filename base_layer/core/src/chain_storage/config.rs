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

use std::time::Duration;

use chainhead_common::{serializers::seconds, DefaultConfigLoader, NetworkConfigPath};
use config::Config;
use serde::{Deserialize, Serialize};

use crate::chain_storage::ChainStorageError;

/// Settings of the `[chain_storage]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainDatabaseConfig {
    /// Number of recently read blocks (and their receipts) kept in memory
    pub block_cache_size: usize,
    /// Maximum number of blocks held back because their timestamp lies in the future
    pub future_block_cache_size: usize,
    /// Blocks further in the future than this are rejected instead of queued
    #[serde(with = "seconds")]
    pub max_future_block_time: Duration,
    /// Chain segments reaching further than this many blocks past the head are rejected. Unlimited if not set.
    pub max_future_chain_length: Option<u64>,
    /// How often progress is logged during long imports
    #[serde(with = "seconds")]
    pub stats_report_interval: Duration,
    /// Blocks this far below the head block are moved into the ancient store by the freezer
    pub freeze_threshold: u64,
    /// Set by the configuration loader
    pub network: Option<String>,
}

impl Default for BlockchainDatabaseConfig {
    fn default() -> Self {
        Self {
            block_cache_size: 256,
            future_block_cache_size: 256,
            max_future_block_time: Duration::from_secs(30),
            max_future_chain_length: None,
            stats_report_interval: Duration::from_secs(8),
            freeze_threshold: 90_000,
            network: None,
        }
    }
}

impl NetworkConfigPath for BlockchainDatabaseConfig {
    fn main_key_prefix() -> &'static str {
        "chain_storage"
    }
}

impl BlockchainDatabaseConfig {
    /// Loads the `[chain_storage]` section, falling back to defaults for missing values
    pub fn load(config: &Config) -> Result<Self, ChainStorageError> {
        let config = <Self as DefaultConfigLoader>::load_from(config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use chainhead_common::load_configuration;

    use super::*;

    #[test]
    fn it_loads_overrides_and_defaults() {
        let mut config = Config::new();
        config.set("chain_storage.block_cache_size", 16).unwrap();
        config.set("chain_storage.max_future_block_time", 60).unwrap();
        config.set("chain_storage.network", "testnet").unwrap();
        config.set("chain_storage.testnet.freeze_threshold", 16).unwrap();

        let loaded = BlockchainDatabaseConfig::load(&config).unwrap();
        // Network values take precedence, the rest of the section still applies
        assert_eq!(loaded.block_cache_size, 16);
        assert_eq!(loaded.freeze_threshold, 16);
        assert_eq!(loaded.stats_report_interval, Duration::from_secs(8));

        let mut config = Config::new();
        config.set("chain_storage.block_cache_size", 16).unwrap();
        config.set("chain_storage.max_future_block_time", 60).unwrap();
        let loaded = BlockchainDatabaseConfig::load(&config).unwrap();
        assert_eq!(loaded.block_cache_size, 16);
        assert_eq!(loaded.max_future_block_time, Duration::from_secs(60));
        assert_eq!(loaded.freeze_threshold, 90_000);
    }

    #[test]
    fn it_reads_toml() {
        let toml = r#"
            [chain_storage]
            future_block_cache_size = 8
            max_future_chain_length = 64
        "#;
        let mut config = Config::new();
        config
            .merge(config::File::from_str(toml, config::FileFormat::Toml))
            .unwrap();
        let loaded = BlockchainDatabaseConfig::load(&config).unwrap();
        assert_eq!(loaded.future_block_cache_size, 8);
        assert_eq!(loaded.max_future_chain_length, Some(64));
    }

    #[test]
    fn it_loads_a_written_config_file() {
        let expected = BlockchainDatabaseConfig {
            block_cache_size: 32,
            max_future_block_time: Duration::from_secs(12),
            max_future_chain_length: Some(128),
            freeze_threshold: 64,
            ..Default::default()
        };
        let mut root = toml::value::Table::new();
        root.insert("chain_storage".to_string(), toml::Value::try_from(&expected).unwrap());

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml::to_string(&root).unwrap().as_bytes()).unwrap();
        let config = load_configuration(file.path()).unwrap();
        assert_eq!(BlockchainDatabaseConfig::load(&config).unwrap(), expected);
    }
}

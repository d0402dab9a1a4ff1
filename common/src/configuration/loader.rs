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

//! # Section based configuration loading
//!
//! Every configurable component owns one top level section of the configuration file. A section can carry a
//! `network` key which selects a subsection whose values take precedence over the section's own values:
//!
//! ```toml
//! [chain_storage]
//! network = "testnet"
//! block_cache_size = 256
//!
//! [chain_storage.testnet]
//! block_cache_size = 64
//! ```
//!
//! Loading `chain_storage` from the file above yields `block_cache_size = 64`.
//!
//! ```
//! # use config::Config;
//! # use serde::{Deserialize, Serialize};
//! use chainhead_common::{DefaultConfigLoader, NetworkConfigPath};
//!
//! #[derive(Serialize, Deserialize)]
//! struct CacheConfig {
//!     capacity: u64,
//!     label: String,
//! }
//! impl Default for CacheConfig {
//!     fn default() -> Self {
//!         Self {
//!             capacity: 16,
//!             label: "cache".into(),
//!         }
//!     }
//! }
//! impl NetworkConfigPath for CacheConfig {
//!     fn main_key_prefix() -> &'static str {
//!         "cache"
//!     }
//! }
//!
//! let mut config = Config::new();
//! config.set("cache.network", "testnet").unwrap();
//! config.set("cache.capacity", 32).unwrap();
//! config.set("cache.testnet.capacity", 8).unwrap();
//! let cache = <CacheConfig as DefaultConfigLoader>::load_from(&config).unwrap();
//! assert_eq!(cache.capacity, 8);
//! assert_eq!(cache.label, "cache");
//! ```

use config::{Config, Value};
use thiserror::Error;

use super::network::Network;

/// Locates a struct's values inside a [`Config`].
pub trait ConfigPath {
    /// The top level section holding this struct's values
    fn main_key_prefix() -> &'static str;

    /// The path of a subsection whose values override the main section, or `None` when no override applies.
    fn overload_key_prefix(config: &Config) -> Result<Option<String>, ConfigurationError>;

    /// Produces a config in which the main section holds the overridden values
    fn merge_subconfig(config: &Config) -> Result<Config, ConfigurationError> {
        match Self::overload_key_prefix(config)? {
            Some(key) => {
                let overload: Value = config.get(key.as_str()).unwrap_or_default();
                let base: Value = config.get(Self::main_key_prefix()).unwrap_or_default();
                let mut base_config = Config::new();
                base_config.set(Self::main_key_prefix(), base)?;
                let mut merged = Config::new();
                // Merging a nested table only works at the top level, so the base is merged in and the overload is set
                // on top of it
                merged.merge(base_config)?;
                merged.set(Self::main_key_prefix(), overload)?;
                Ok(merged)
            },
            None => Ok(config.clone()),
        }
    }
}

/// A [`ConfigPath`] whose override subsection is chosen by the section's `network` key.
pub trait NetworkConfigPath {
    fn main_key_prefix() -> &'static str;

    fn network_config_key() -> String {
        format!("{}.network", <Self as NetworkConfigPath>::main_key_prefix())
    }
}

impl<C: NetworkConfigPath> ConfigPath for C {
    fn main_key_prefix() -> &'static str {
        <Self as NetworkConfigPath>::main_key_prefix()
    }

    fn overload_key_prefix(config: &Config) -> Result<Option<String>, ConfigurationError> {
        let network_key = Self::network_config_key();
        match config.get_str(network_key.as_str()).ok() {
            Some(s) => {
                let network: Network = s.parse()?;
                Ok(Some(format!("{}.{}", Self::main_key_prefix(), network)))
            },
            None => Ok(None),
        }
    }
}

/// Loads a struct from its section. Missing values must be covered by `#[serde(default)]` attributes or
/// `Config::set_default`.
pub trait ConfigLoader: ConfigPath + for<'de> serde::de::Deserialize<'de> {
    fn load_from(config: &Config) -> Result<Self, ConfigurationError> {
        let merged = Self::merge_subconfig(config)?;
        Ok(merged.get(Self::main_key_prefix())?)
    }
}
impl<C> ConfigLoader for C where C: ConfigPath + for<'de> serde::de::Deserialize<'de> {}

/// Loads a struct from its section, taking missing values from the struct's [`Default`] implementation.
pub trait DefaultConfigLoader:
    ConfigPath + Default + serde::ser::Serialize + for<'de> serde::de::Deserialize<'de>
{
    fn load_from(config: &Config) -> Result<Self, ConfigurationError> {
        let default = <Self as Default>::default();
        let buf = serde_json::to_string(&default)?;
        let value: Value = serde_json::from_str(buf.as_str())?;
        let mut merged = Self::merge_subconfig(config)?;
        merged.set_default(Self::main_key_prefix(), value)?;
        Ok(merged.get(Self::main_key_prefix())?)
    }
}
impl<C> DefaultConfigLoader for C where C: ConfigPath + Default + serde::ser::Serialize + for<'de> serde::de::Deserialize<'de>
{}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid value for `{field}`: {message}")]
pub struct ConfigurationError {
    field: String,
    value: Option<String>,
    message: String,
}

impl ConfigurationError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, value: Option<String>, msg: M) -> Self {
        ConfigurationError {
            field: field.into(),
            value,
            message: msg.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        use config::ConfigError;
        match err {
            ConfigError::FileParse { uri: Some(uri), cause } => Self::new(uri, None, cause.to_string()),
            ConfigError::Type { ref key, .. } => {
                Self::new(key.clone().unwrap_or_default(), None, err.to_string())
            },
            ConfigError::NotFound(key) => Self::new(key, None, "required key not found"),
            x => Self::new("", None, x.to_string()),
        }
    }
}

impl From<serde_json::error::Error> for ConfigurationError {
    fn from(err: serde_json::error::Error) -> Self {
        Self::new("", None, err.to_string())
    }
}

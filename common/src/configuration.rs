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

use std::path::Path;

use config::{Config, Environment, File};
use log::*;

pub mod loader;
pub mod network;
pub mod serializers;

use loader::ConfigurationError;

const LOG_TARGET: &str = "common::configuration";

/// Environment variables with this prefix override file values, e.g. `CHAINHEAD__CHAIN_STORAGE__BLOCK_CACHE_SIZE`
pub const ENV_PREFIX: &str = "CHAINHEAD";

/// Reads the TOML file at `path` (if it exists) and layers environment overrides on top of it.
pub fn load_configuration(path: &Path) -> Result<Config, ConfigurationError> {
    let mut cfg = Config::new();
    if path.exists() {
        debug!(target: LOG_TARGET, "Loading configuration file from {}", path.display());
        cfg.merge(File::from(path))?;
    } else {
        info!(
            target: LOG_TARGET,
            "Configuration file {} not found, using defaults",
            path.display()
        );
    }
    cfg.merge(Environment::with_prefix(ENV_PREFIX).separator("__"))?;
    Ok(cfg)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn it_loads_values_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[chain_storage]\nblock_cache_size = 12")?;
        let cfg = load_configuration(file.path())?;
        assert_eq!(cfg.get::<u64>("chain_storage.block_cache_size")?, 12);
        Ok(())
    }

    #[test]
    fn it_tolerates_a_missing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = load_configuration(&dir.path().join("absent.toml"))?;
        assert!(cfg.get::<u64>("chain_storage.block_cache_size").is_err());
        Ok(())
    }
}

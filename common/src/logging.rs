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
    env,
    path::{Path, PathBuf},
};

use crate::{dir_utils, DEFAULT_LOG_CONFIG};

/// The environment variable naming a log4rs configuration file
pub const LOG_CONFIGURATION_ENV: &str = "CHAINHEAD_LOG_CONFIGURATION";

const SAMPLE_LOG_CONFIG: &str = include_str!("../config/log4rs_sample.yml");

/// Determine the path to a log configuration file using the following precedence rules:
/// 1. Use the provided path (usually pulled from a CLI argument)
/// 2. Use the value in the `CHAINHEAD_LOG_CONFIGURATION` envar
/// 3. The default path, `~/.chainhead/log4rs.yml`
pub fn get_log_configuration_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path
        .or_else(|| {
            env::var_os(LOG_CONFIGURATION_ENV)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| dir_utils::default_path(DEFAULT_LOG_CONFIG))
}

/// Set up application-level logging using the log4rs configuration file at `config_file`. Returns false if the
/// file could not be loaded, in which case nothing is logged.
pub fn initialize_logging(config_file: &Path) -> bool {
    println!("Initializing logging according to {}", config_file.display());
    if let Err(e) = log4rs::init_file(config_file, Default::default()) {
        println!("We couldn't load a logging configuration file. {}", e);
        return false;
    }
    true
}

/// Writes the bundled sample log configuration to `path`, creating parent directories as needed.
pub fn install_default_logfile_config(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, SAMPLE_LOG_CONFIG)
}

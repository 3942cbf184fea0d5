// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validate::{check_block_size, MIN_BLOCK_SIZE};

/// Configuration for opening a MiniNVMe controller
///
/// ```toml
/// path = "/dev/mininvme0"
/// block_size = 4096
/// exclusive = true
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Device node of the controller
    pub path: PathBuf,

    /// Logical block size of the namespaces addressed by sector transfers
    #[serde(default = "Config::default_block_size")]
    pub block_size: u32,

    /// Refuse to share the controller with other openers
    #[serde(default)]
    pub exclusive: bool,
}

impl Config {
    fn default_block_size() -> u32 {
        MIN_BLOCK_SIZE
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_size: Self::default_block_size(),
            exclusive: false,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        check_block_size(config.block_size)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::Read { path: path.to_path_buf(), source }
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::validate::PairingError;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::from_toml_str(r#"path = "/dev/mininvme0""#)
            .expect("minimal config parses");
        assert_eq!(config, Config::new("/dev/mininvme0"));
        assert_eq!(config.block_size, 512);
        assert!(!config.exclusive);
    }

    #[test]
    fn full() {
        let config = Config::from_toml_str(
            r#"
            path = "/dev/mininvme1"
            block_size = 4096
            exclusive = true
            "#,
        )
        .expect("config parses");
        assert_eq!(config.path, PathBuf::from("/dev/mininvme1"));
        assert_eq!(config.block_size, 4096);
        assert!(config.exclusive);
    }

    #[test]
    fn bad_block_size() {
        let err = Config::from_toml_str(
            r#"
            path = "/dev/mininvme0"
            block_size = 1000
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BlockSize(PairingError::InvalidBlockSize(1000))
        ));
    }

    #[test]
    fn path_required() {
        let err = Config::from_toml_str("block_size = 512").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = Config::from_toml_str(
            r#"
            path = "/dev/mininvme0"
            queue_depth = 8
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "path = \"/dev/mininvme0\"").unwrap();
        writeln!(file, "block_size = 2048").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.block_size, 2048);

        let missing = file.path().with_extension("missing");
        let err = Config::from_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// One serial endpoint: device path and line speed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortConfig {
    pub port: String,
    pub baudrate: u32,
}

/// Bridge configuration file contents.
///
/// `Source` faces the host, `Destination` faces the modem. Read once at
/// startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BridgeFileConfig {
    pub source: PortConfig,
    pub destination: PortConfig,
    /// Send log output to stdout instead of stderr.
    #[serde(default = "default_std_out")]
    pub std_out: bool,
}

fn default_std_out() -> bool {
    true
}

/// Errors reading or parsing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load the configuration from a JSON file.
pub fn load(path: &Path) -> Result<BridgeFileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

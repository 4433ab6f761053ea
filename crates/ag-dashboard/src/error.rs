// error.rs - Error types for the dashboard state layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The config file exists but could not be read.
    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has wrongly typed values.
    #[error("invalid config at {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value parsed but makes no sense (zero page size, ...).
    #[error("invalid config value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error(transparent)]
    Client(#[from] ag_client::ClientError),
}

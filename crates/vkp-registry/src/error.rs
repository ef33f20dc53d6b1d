//! Registry loading errors.

use std::path::PathBuf;

/// Errors raised while loading a registry snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid version number '{0}', expected <major>.<minor>")]
    InvalidVersion(String),
}

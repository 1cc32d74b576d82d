//! Error types for loading and saving manifests.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing a manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file extension is neither `.yaml`/`.yml` nor `.json`.
    #[error("unsupported manifest format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Convenience alias for results with [`ManifestError`].
pub type Result<T> = std::result::Result<T, ManifestError>;

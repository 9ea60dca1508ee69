//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Input file could not be opened
    #[error("failed to open {stream} input {path}: {source}")]
    Open {
        stream: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file could not be read
    #[error("failed to read {stream} input {path} at line {line}: {source}")]
    Read {
        stream: &'static str,
        path: PathBuf,
        line: u64,
        #[source]
        source: std::io::Error,
    },

    /// Replay was started without any input
    #[error("no input configured: a positions or telemetry path is required")]
    NoInput,
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;

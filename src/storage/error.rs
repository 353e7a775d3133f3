//! Storage error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised by an upload body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by per-request store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Name is not a single safe path segment.
    #[error("Invalid file name '{0}'")]
    InvalidName(String),

    /// No file with this name exists in the upload directory.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The store has been purged for shutdown and accepts no new files.
    #[error("Upload directory is closed for shutdown")]
    Sealed,

    /// The upload directory could not be read.
    #[error("Failed to list {}: {source}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read, write or delete on a single file failed.
    #[error("Failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload body stream failed before the file was complete.
    #[error("Upload stream for '{name}' failed: {source}")]
    Stream {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Fatal startup errors. The service must not serve traffic after one.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Failed to create upload directory {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload path {} exists but is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Failed to access upload directory {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

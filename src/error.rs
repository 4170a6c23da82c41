//! Error types for bucketload
//!
//! Covers startup, per-file, and per-part failure modes of an upload run.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for all upload operations
#[derive(Debug, Error)]
pub enum UploadError {
    /// Required configuration variable is missing or unusable
    #[error("missing or invalid configuration: {var}")]
    Config { var: String },

    /// Source directory could not be listed
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file could not be opened or read
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object store operation failed
    #[error("store operation failed for {key}: {message}")]
    Storage { key: String, message: String },

    /// Multipart session was aborted instead of committed
    #[error("multipart upload aborted for {key}: {reason}")]
    MultipartAborted { key: String, reason: String },

    /// Completed part set had a gap or wrong count at commit time
    #[error("incomplete part set for {key}: expected {expected} parts, got {got}")]
    IncompletePartSet {
        key: String,
        expected: u32,
        got: usize,
    },
}

impl UploadError {
    /// Returns true if this error aborts the whole run before any upload.
    ///
    /// Everything else is isolated to a single file or part and only
    /// affects that file's outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UploadError::Config { .. } | UploadError::Scan { .. })
    }
}

/// Result type alias for upload operations
pub type Result<T> = std::result::Result<T, UploadError>;

//! Bucketload - concurrent bulk uploader for S3-compatible object stores
//!
//! This crate uploads the regular files of one local directory to an
//! object store, choosing per file between:
//! - a single-shot `put_object` for small files
//! - a chunked multipart upload for large files
//!
//! All file and part uploads run concurrently under one process-wide
//! concurrency budget.

pub mod budget;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod scanner;
pub mod session;
pub mod splitter;
pub mod stats;
pub mod storage;

pub use budget::ConcurrencyBudget;
pub use dispatcher::UploadDispatcher;
pub use error::{Result, UploadError};

/// Fixed size of one multipart part (5 MiB)
pub const PART_SIZE: usize = 5 * 1024 * 1024;

/// Files at or above this size take the multipart path
pub const CHUNK_THRESHOLD: u64 = PART_SIZE as u64;

/// Default bound on simultaneous network operations
pub const DEFAULT_CONCURRENCY: usize = 100;

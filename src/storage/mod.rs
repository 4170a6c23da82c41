//! Object store capability interface
//!
//! The upload engine consumes the store through this trait; credentials,
//! transport, and retry policy all live behind it.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub mod s3;

pub use s3::S3Store;

/// One successfully uploaded part, as referenced at commit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// 1-based part number
    pub part_number: u32,
    /// Opaque content tag returned by the store for this part
    pub tag: String,
}

/// Explicit transport tuning passed into the store client factory
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Deadline for a single store request
    pub request_timeout: Duration,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Capability contract for an S3-style object store.
///
/// The engine performs no retries of its own; any retry or backoff
/// behavior belongs to the implementation behind this trait.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open a multipart session, returning its opaque session id
    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> Result<String>;

    /// Upload one part, returning its content tag
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        session_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> Result<String>;

    /// Commit a multipart session from parts in ascending part-number order
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        session_id: &str,
        parts: &[CompletedPart],
    ) -> Result<()>;

    /// Abort a multipart session, releasing server-side resources
    async fn abort_multipart_upload(&self, bucket: &str, key: &str, session_id: &str)
        -> Result<()>;

    /// Upload a whole object in one request
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()>;
}

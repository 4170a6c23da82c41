//! S3 implementation of the object store capability
//!
//! Thin mapping onto aws-sdk-s3. Static credentials, explicit transport
//! tuning, and the SDK's default retry policy; the engine above adds none
//! of its own.

use async_trait::async_trait;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as SdkCompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::{CompletedPart, HttpConfig, ObjectStore};
use crate::error::{Result, UploadError};

/// Connection settings for the S3 client
#[derive(Debug, Clone)]
pub struct S3Config {
    /// AWS region
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO etc.)
    pub endpoint: Option<String>,
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Transport tuning
    pub http: HttpConfig,
}

/// Object store backed by aws-sdk-s3
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Build a client from explicit credentials and transport settings
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "bucketload-static",
        );
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.http.request_timeout)
            .connect_timeout(config.http.connect_timeout)
            .build();

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .timeout_config(timeouts);
        if let Some(endpoint) = config.endpoint {
            // Path-style addressing for non-AWS endpoints
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    fn storage_err(key: &str, err: impl std::fmt::Display) -> UploadError {
        UploadError::Storage {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn create_multipart_upload(&self, bucket: &str, key: &str) -> Result<String> {
        let out = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::storage_err(key, e))?;

        let session_id = out
            .upload_id()
            .ok_or_else(|| Self::storage_err(key, "store returned no upload id"))?
            .to_string();
        debug!(key, session_id = %session_id, "opened multipart session");
        Ok(session_id)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        session_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> Result<String> {
        let out = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(session_id)
            .part_number(part_number as i32)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| Self::storage_err(key, e))?;

        let tag = out
            .e_tag()
            .ok_or_else(|| Self::storage_err(key, "store returned no etag for part"))?
            .to_string();
        Ok(tag)
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        session_id: &str,
        parts: &[CompletedPart],
    ) -> Result<()> {
        let sdk_parts: Vec<SdkCompletedPart> = parts
            .iter()
            .map(|p| {
                SdkCompletedPart::builder()
                    .part_number(p.part_number as i32)
                    .e_tag(p.tag.clone())
                    .build()
            })
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(session_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(sdk_parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Self::storage_err(key, e))?;
        debug!(key, session_id, "committed multipart session");
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        session_id: &str,
    ) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(session_id)
            .send()
            .await
            .map_err(|e| Self::storage_err(key, e))?;
        debug!(key, session_id, "aborted multipart session");
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| Self::storage_err(key, e))?;
        Ok(())
    }
}

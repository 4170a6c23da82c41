//! Uploader configuration
//!
//! Environment-driven settings, with an optional `.env` file loaded by the
//! binary before this module reads anything. Missing credentials or target
//! settings are fatal at startup.

use std::env;
use std::path::PathBuf;

use crate::error::{Result, UploadError};
use crate::storage::s3::S3Config;
use crate::storage::HttpConfig;
use crate::DEFAULT_CONCURRENCY;

/// Settings for one upload run
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Static access key id
    pub access_key_id: String,
    /// Static secret access key
    pub secret_access_key: String,
    /// Destination bucket
    pub bucket: String,
    /// Destination key prefix; uploaded objects land under `prefix/basename`
    pub key_prefix: String,
    /// Source directory to scan
    pub directory: PathBuf,
    /// Bound on simultaneous network operations
    pub concurrency: usize,
    /// AWS region
    pub region: String,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
    /// Transport tuning passed to the store client factory
    pub http: HttpConfig,
}

impl UploaderConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            access_key_id: required("ACCESS_KEY_ID")?,
            secret_access_key: required("SECRET_ACCESS_KEY")?,
            bucket: required("BUCKET_NAME")?,
            key_prefix: env::var("BUCKET_KEY").unwrap_or_default(),
            directory: PathBuf::from(required("directory_path")?),
            concurrency: parse_concurrency(env::var("UPLOAD_CONCURRENCY").ok())?,
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            endpoint: env::var("S3_ENDPOINT").ok(),
            http: HttpConfig::default(),
        })
    }

    /// Store client settings derived from this configuration
    pub fn s3_config(&self) -> S3Config {
        S3Config {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            http: self.http.clone(),
        }
    }
}

fn required(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(UploadError::Config { var: var.into() }),
    }
}

fn parse_concurrency(raw: Option<String>) -> Result<usize> {
    match raw {
        None => Ok(DEFAULT_CONCURRENCY),
        Some(s) => match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(UploadError::Config {
                var: "UPLOAD_CONCURRENCY".into(),
            }),
        },
    }
}

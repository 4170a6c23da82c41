//! Upload dispatcher
//!
//! Classifies each discovered file by size, routes it to the simple or the
//! chunked path, and fans all files out concurrently. The run waits for
//! every file to finish; individual failures are logged and counted, never
//! fatal to the batch. Each file gets exactly one attempt.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::budget::ConcurrencyBudget;
use crate::error::{Result, UploadError};
use crate::scanner;
use crate::session::MultipartSession;
use crate::stats::{RunReport, RunStats};
use crate::storage::ObjectStore;
use crate::CHUNK_THRESHOLD;

/// One file's upload assignment
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Absolute source path
    pub source: PathBuf,
    /// Destination object key
    pub key: String,
    /// File size at dispatch time
    pub size: u64,
}

/// Schedules every file of a directory for concurrent upload
pub struct UploadDispatcher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key_prefix: String,
    budget: ConcurrencyBudget,
    stats: Arc<RunStats>,
}

impl UploadDispatcher {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: String,
        key_prefix: String,
        budget: ConcurrencyBudget,
    ) -> Self {
        Self {
            store,
            bucket,
            key_prefix,
            budget,
            stats: Arc::new(RunStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<RunStats> {
        self.stats.clone()
    }

    /// Upload every regular file in `directory` and wait for all of them.
    ///
    /// Fails only if the directory itself cannot be scanned; per-file
    /// outcomes are reflected in the returned report.
    pub async fn run(&self, directory: &Path) -> Result<RunReport> {
        let started = Instant::now();
        let files = scanner::scan_dir(directory).await?;
        info!(
            dir = %directory.display(),
            files = files.len(),
            budget = self.budget.limit(),
            "starting upload run"
        );

        let mut workers = JoinSet::new();
        for path in files {
            let key = destination_key(&self.key_prefix, &path);
            let store = self.store.clone();
            let bucket = self.bucket.clone();
            let budget = self.budget.clone();
            let stats = self.stats.clone();
            workers.spawn(async move {
                upload_one(store, budget, stats, bucket, key, path).await;
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                // A panicked worker already left its file unaccounted.
                error!(error = %e, "upload worker panicked");
                self.stats.record_file_failed();
            }
        }

        let report = self.stats.report(started);
        info!(
            uploaded = report.files_uploaded,
            failed = report.files_failed,
            bytes = report.bytes_uploaded,
            parts = report.parts_uploaded,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "upload run finished"
        );
        Ok(report)
    }
}

/// Process one file end to end; failures stay inside this task.
async fn upload_one(
    store: Arc<dyn ObjectStore>,
    budget: ConcurrencyBudget,
    stats: Arc<RunStats>,
    bucket: String,
    key: String,
    path: PathBuf,
) {
    let task = match tokio::fs::metadata(&path).await {
        Ok(meta) => UploadTask {
            key,
            size: meta.len(),
            source: path,
        },
        Err(source) => {
            let e = UploadError::FileRead { path, source };
            error!(error = %e, "skipping file");
            stats.record_file_failed();
            return;
        }
    };

    let result = if task.size >= CHUNK_THRESHOLD {
        upload_chunked(store, &budget, &bucket, &task, &stats).await
    } else {
        upload_simple(store, &budget, &bucket, &task).await
    };

    match result {
        Ok(bytes) => {
            stats.record_file_uploaded(bytes);
            info!(key = %task.key, bytes, "uploaded");
        }
        Err(e) => {
            error!(key = %task.key, error = %e, "upload failed");
            stats.record_file_failed();
        }
    }
}

/// Single-shot path for files under the chunking threshold
async fn upload_simple(
    store: Arc<dyn ObjectStore>,
    budget: &ConcurrencyBudget,
    bucket: &str,
    task: &UploadTask,
) -> Result<u64> {
    // Hold the unit across the read as well, so the number of files
    // buffered in memory at once never exceeds the budget.
    let _permit = budget.acquire().await;
    let data = tokio::fs::read(&task.source)
        .await
        .map_err(|source| UploadError::FileRead {
            path: task.source.clone(),
            source,
        })?;
    let bytes = data.len() as u64;

    store.put_object(bucket, &task.key, Bytes::from(data)).await?;
    Ok(bytes)
}

/// Chunked path: one multipart session per file
async fn upload_chunked(
    store: Arc<dyn ObjectStore>,
    budget: &ConcurrencyBudget,
    bucket: &str,
    task: &UploadTask,
    stats: &RunStats,
) -> Result<u64> {
    let mut session = MultipartSession::open(store, budget, bucket, &task.key).await?;
    let report = session.upload_file(budget, &task.source).await?;
    stats.record_parts(report.parts as u64);
    Ok(report.bytes)
}

/// Destination key for a source path: `prefix/basename`
fn destination_key(prefix: &str, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

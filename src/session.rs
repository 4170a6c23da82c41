//! Multipart upload session
//!
//! Tracks one file's in-flight multipart upload: opens the session, fans
//! parts out to concurrent upload tasks, collects their results through a
//! single-coordinator channel, and commits the ordered part list or aborts.
//! A session always terminates Committed or Aborted; leaving submitted
//! parts behind with neither is a defect.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::budget::ConcurrencyBudget;
use crate::error::{Result, UploadError};
use crate::splitter::PartSplitter;
use crate::storage::{CompletedPart, ObjectStore};

/// Lifecycle state of a multipart session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session opened, parts still being submitted
    Open,
    /// Splitting finished, waiting on in-flight parts
    AllPartsSubmitted,
    /// Session committed with a complete ordered part list
    Committed,
    /// Session aborted, server-side resources released
    Aborted,
}

/// Outcome of a committed session
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Number of parts committed
    pub parts: u32,
    /// Total bytes uploaded
    pub bytes: u64,
}

/// One file's multipart upload, owned exclusively by the task processing
/// that file.
pub struct MultipartSession {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
    session_id: String,
    state: SessionState,
}

impl MultipartSession {
    /// Open a session with the store before any splitting begins
    pub async fn open(
        store: Arc<dyn ObjectStore>,
        budget: &ConcurrencyBudget,
        bucket: &str,
        key: &str,
    ) -> Result<Self> {
        let session_id = {
            let _permit = budget.acquire().await;
            store.create_multipart_upload(bucket, key).await?
        };
        Ok(Self {
            store,
            bucket: bucket.to_string(),
            key: key.to_string(),
            session_id,
            state: SessionState::Open,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Split `path` into parts, upload them concurrently, and commit.
    ///
    /// Every submitted part is waited on before the session proceeds, no
    /// matter how the uploads went. Any read error, part failure, gap in
    /// the part set, or commit failure aborts the session.
    pub async fn upload_file(
        &mut self,
        budget: &ConcurrencyBudget,
        path: &Path,
    ) -> Result<SessionReport> {
        let mut splitter = match PartSplitter::open(path).await {
            Ok(s) => s,
            Err(e) => return self.abort_with(budget, format!("open failed: {e}")).await,
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<(u32, Result<String>)>();
        let mut submitted: u32 = 0;
        let mut bytes: u64 = 0;
        let mut read_error: Option<UploadError> = None;

        loop {
            match splitter.next_part().await {
                Ok(Some(part)) => {
                    // One budget unit per part, held across the network
                    // call and released when the attempt finishes.
                    let permit = budget.acquire().await;
                    submitted += 1;
                    bytes += part.data.len() as u64;

                    let store = self.store.clone();
                    let bucket = self.bucket.clone();
                    let key = self.key.clone();
                    let session_id = self.session_id.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let result = store
                            .upload_part(&bucket, &key, &session_id, part.part_number, part.data)
                            .await;
                        drop(permit);
                        let _ = tx.send((part.part_number, result));
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            }
        }
        drop(tx);
        self.state = SessionState::AllPartsSubmitted;

        // Barrier: the channel closes only once every part task has
        // reported, so draining it waits out all in-flight uploads.
        let mut completed: Vec<CompletedPart> = Vec::with_capacity(submitted as usize);
        let mut part_failure: Option<(u32, UploadError)> = None;
        while let Some((part_number, result)) = rx.recv().await {
            match result {
                Ok(tag) => completed.push(CompletedPart { part_number, tag }),
                Err(e) => {
                    warn!(key = %self.key, part_number, error = %e, "part upload failed");
                    if part_failure.is_none() {
                        part_failure = Some((part_number, e));
                    }
                }
            }
        }

        if let Some(e) = read_error {
            return self.abort_with(budget, format!("read failed: {e}")).await;
        }
        if let Some((part_number, e)) = part_failure {
            return self
                .abort_with(budget, format!("part {part_number} failed: {e}"))
                .await;
        }
        if submitted == 0 {
            return self.abort_with(budget, "no parts produced".to_string()).await;
        }

        let ordered = match ordered_parts(completed, submitted, &self.key) {
            Ok(parts) => parts,
            Err(e) => {
                self.abort(budget).await;
                return Err(e);
            }
        };

        let commit = {
            let _permit = budget.acquire().await;
            self.store
                .complete_multipart_upload(&self.bucket, &self.key, &self.session_id, &ordered)
                .await
        };
        if let Err(e) = commit {
            return self.abort_with(budget, format!("commit failed: {e}")).await;
        }

        self.state = SessionState::Committed;
        debug!(key = %self.key, parts = submitted, bytes, "multipart upload committed");
        Ok(SessionReport {
            parts: submitted,
            bytes,
        })
    }

    /// Abort the session and surface `reason` as the file's failure
    async fn abort_with<T>(&mut self, budget: &ConcurrencyBudget, reason: String) -> Result<T> {
        self.abort(budget).await;
        Err(UploadError::MultipartAborted {
            key: self.key.clone(),
            reason,
        })
    }

    async fn abort(&mut self, budget: &ConcurrencyBudget) {
        let _permit = budget.acquire().await;
        if let Err(e) = self
            .store
            .abort_multipart_upload(&self.bucket, &self.key, &self.session_id)
            .await
        {
            // The server may expire the session on its own; the engine has
            // done what it can.
            error!(key = %self.key, session_id = %self.session_id, error = %e, "abort failed");
        }
        self.state = SessionState::Aborted;
    }
}

/// Sort completed parts and verify the set is exactly `{1..=submitted}`.
fn ordered_parts(
    mut completed: Vec<CompletedPart>,
    submitted: u32,
    key: &str,
) -> Result<Vec<CompletedPart>> {
    completed.sort_by_key(|p| p.part_number);

    let complete = completed.len() == submitted as usize
        && completed
            .iter()
            .enumerate()
            .all(|(idx, part)| part.part_number == idx as u32 + 1);
    if !complete {
        return Err(UploadError::IncompletePartSet {
            key: key.to_string(),
            expected: submitted,
            got: completed.len(),
        });
    }
    Ok(completed)
}

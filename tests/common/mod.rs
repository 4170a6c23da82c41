//! In-memory recording object store for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use bucketload::error::{Result, UploadError};
use bucketload::storage::{CompletedPart, ObjectStore};

/// Server-side view of one multipart session
#[derive(Debug, Clone, Default)]
pub struct SessionRecord {
    pub key: String,
    pub parts: HashMap<u32, Bytes>,
    pub completed: Option<Vec<CompletedPart>>,
    pub aborted: bool,
}

#[derive(Default)]
struct StoreState {
    puts: Vec<(String, Bytes)>,
    sessions: HashMap<String, SessionRecord>,
    next_session: u64,
}

/// Mock store that records every call and tracks in-flight operations
#[derive(Default)]
pub struct RecordingStore {
    state: Mutex<StoreState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_parts: Vec<u32>,
    fail_commit: bool,
    op_delay: Duration,
    stagger_parts: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every upload of these part numbers
    pub fn with_part_failures(mut self, parts: &[u32]) -> Self {
        self.fail_parts = parts.to_vec();
        self
    }

    /// Fail every `complete_multipart_upload` call
    pub fn with_commit_failure(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Sleep inside every operation, to force real overlap
    pub fn with_op_delay(mut self, delay: Duration) -> Self {
        self.op_delay = delay;
        self
    }

    /// Delay low-numbered parts longer so completions arrive out of order
    pub fn with_staggered_parts(mut self) -> Self {
        self.stagger_parts = true;
        self
    }

    pub fn puts(&self) -> Vec<(String, Bytes)> {
        self.state.lock().puts.clone()
    }

    pub fn session_for_key(&self, key: &str) -> Option<SessionRecord> {
        self.state
            .lock()
            .sessions
            .values()
            .find(|s| s.key == key)
            .cloned()
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Highest number of operations ever in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Final object content, from either upload path
    pub fn object(&self, key: &str) -> Option<Bytes> {
        let state = self.state.lock();
        if let Some((_, data)) = state.puts.iter().find(|(k, _)| k == key) {
            return Some(data.clone());
        }
        let session = state.sessions.values().find(|s| s.key == key)?;
        let completed = session.completed.as_ref()?;
        let mut assembled = Vec::new();
        for part in completed {
            assembled.extend_from_slice(session.parts.get(&part.part_number)?);
        }
        Some(Bytes::from(assembled))
    }

    fn enter(&self) -> OpGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        OpGuard { store: self }
    }

    fn storage_err(key: &str, message: &str) -> UploadError {
        UploadError::Storage {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

struct OpGuard<'a> {
    store: &'a RecordingStore,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn create_multipart_upload(&self, _bucket: &str, key: &str) -> Result<String> {
        let _guard = self.enter();
        tokio::time::sleep(self.op_delay).await;
        let mut state = self.state.lock();
        state.next_session += 1;
        let session_id = format!("session-{}", state.next_session);
        state.sessions.insert(
            session_id.clone(),
            SessionRecord {
                key: key.to_string(),
                ..Default::default()
            },
        );
        Ok(session_id)
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        key: &str,
        session_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> Result<String> {
        let _guard = self.enter();
        let delay = if self.stagger_parts {
            // Part 1 finishes last
            self.op_delay + Duration::from_millis(60 / part_number as u64)
        } else {
            self.op_delay
        };
        tokio::time::sleep(delay).await;

        if self.fail_parts.contains(&part_number) {
            return Err(Self::storage_err(key, "injected part failure"));
        }

        let mut state = self.state.lock();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Self::storage_err(key, "unknown session"))?;
        if session.aborted || session.completed.is_some() {
            return Err(Self::storage_err(key, "session no longer open"));
        }
        session.parts.insert(part_number, data);
        Ok(format!("etag-{session_id}-{part_number}"))
    }

    async fn complete_multipart_upload(
        &self,
        _bucket: &str,
        key: &str,
        session_id: &str,
        parts: &[CompletedPart],
    ) -> Result<()> {
        let _guard = self.enter();
        tokio::time::sleep(self.op_delay).await;
        if self.fail_commit {
            return Err(Self::storage_err(key, "injected commit failure"));
        }
        let mut state = self.state.lock();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Self::storage_err(key, "unknown session"))?;
        if session.aborted {
            return Err(Self::storage_err(key, "session already aborted"));
        }
        // Mirror the server-side contract: parts must arrive ascending.
        if parts.is_empty() || parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            return Err(Self::storage_err(key, "parts not strictly ascending"));
        }
        for part in parts {
            if !session.parts.contains_key(&part.part_number) {
                return Err(Self::storage_err(key, "commit references unknown part"));
            }
        }
        session.completed = Some(parts.to_vec());
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        _bucket: &str,
        key: &str,
        session_id: &str,
    ) -> Result<()> {
        let _guard = self.enter();
        tokio::time::sleep(self.op_delay).await;
        let mut state = self.state.lock();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Self::storage_err(key, "unknown session"))?;
        session.aborted = true;
        Ok(())
    }

    async fn put_object(&self, _bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let _guard = self.enter();
        tokio::time::sleep(self.op_delay).await;
        self.state.lock().puts.push((key.to_string(), data));
        Ok(())
    }
}

/// `len` bytes of deterministic, non-repeating-ish content
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub const MIB: usize = 1024 * 1024;

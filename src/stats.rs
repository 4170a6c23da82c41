//! Run statistics
//!
//! Atomic counters shared by all upload tasks, snapshotted into a summary
//! at the end of the run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters updated by upload tasks as they finish
#[derive(Debug, Default)]
pub struct RunStats {
    files_uploaded: AtomicU64,
    files_failed: AtomicU64,
    bytes_uploaded: AtomicU64,
    parts_uploaded: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file_uploaded(&self, bytes: u64) {
        self.files_uploaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parts(&self, count: u64) {
        self.parts_uploaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn files_uploaded(&self) -> u64 {
        self.files_uploaded.load(Ordering::Relaxed)
    }

    pub fn files_failed(&self) -> u64 {
        self.files_failed.load(Ordering::Relaxed)
    }

    /// Snapshot the counters into a report
    pub fn report(&self, started: Instant) -> RunReport {
        RunReport {
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            parts_uploaded: self.parts_uploaded.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
        }
    }
}

/// End-of-run summary
#[derive(Debug, Clone)]
pub struct RunReport {
    pub files_uploaded: u64,
    pub files_failed: u64,
    pub bytes_uploaded: u64,
    pub parts_uploaded: u64,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let stats = RunStats::new();
        stats.record_file_uploaded(100);
        stats.record_file_uploaded(50);
        stats.record_file_failed();
        stats.record_parts(3);

        let report = stats.report(Instant::now());
        assert_eq!(report.files_uploaded, 2);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.bytes_uploaded, 150);
        assert_eq!(report.parts_uploaded, 3);
    }
}

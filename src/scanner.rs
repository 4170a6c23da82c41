//! Directory scanner
//!
//! Lists the immediate regular files of one directory. No recursion;
//! subdirectories and special files are skipped silently.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, UploadError};

/// List the regular files directly under `dir`, unordered.
///
/// Fails only if the directory itself cannot be read; unreadable or
/// non-regular entries are skipped.
pub async fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|source| UploadError::Scan {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|source| UploadError::Scan {
        path: dir.to_path_buf(),
        source,
    })? {
        match entry.file_type().await {
            Ok(ft) if ft.is_file() => files.push(entry.path()),
            Ok(_) => {}
            Err(e) => debug!(path = %entry.path().display(), error = %e, "skipping unreadable entry"),
        }
    }

    debug!(dir = %dir.display(), count = files.len(), "scanned directory");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.bin"), b"a").await.unwrap();
        tokio::fs::write(dir.path().join("b.bin"), b"b").await.unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
        tokio::fs::write(dir.path().join("sub").join("nested.bin"), b"c")
            .await
            .unwrap();

        let mut files = scan_dir(dir.path()).await.unwrap();
        files.sort();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
    }

    #[tokio::test]
    async fn test_scan_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = scan_dir(&missing).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let files = scan_dir(dir.path()).await.unwrap();
        assert!(files.is_empty());
    }
}

//! Part splitter
//!
//! Reads a source file sequentially in fixed 5 MiB blocks and hands each
//! block out with a 1-based, contiguous part number. Parts upload out of
//! order later; the numbering assigned here is what restores order at
//! commit time.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::{Result, UploadError};
use crate::PART_SIZE;

/// One fixed-size slice of a source file
#[derive(Debug)]
pub struct Part {
    /// 1-based sequence number, contiguous per file
    pub part_number: u32,
    /// Block payload; only the final part may be shorter than [`PART_SIZE`]
    pub data: Bytes,
}

/// Sequential reader producing numbered parts
#[derive(Debug)]
pub struct PartSplitter {
    file: File,
    path: PathBuf,
    next_number: u32,
}

impl PartSplitter {
    /// Open a source file for splitting
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).await.map_err(|source| UploadError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            next_number: 1,
        })
    }

    /// Read the next part, or `None` once the file is exhausted.
    ///
    /// A read error other than end-of-stream fails the whole file; the
    /// caller must not commit any parts already produced.
    pub async fn next_part(&mut self) -> Result<Option<Part>> {
        let mut buf = vec![0u8; PART_SIZE];
        let mut filled = 0;

        while filled < PART_SIZE {
            let n = self
                .file
                .read(&mut buf[filled..])
                .await
                .map_err(|source| UploadError::FileRead {
                    path: self.path.clone(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        let part_number = self.next_number;
        self.next_number += 1;
        Ok(Some(Part {
            part_number,
            data: Bytes::from(buf),
        }))
    }

    /// Parts produced so far
    pub fn parts_read(&self) -> u32 {
        self.next_number - 1
    }
}

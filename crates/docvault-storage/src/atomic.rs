//! Temp-file-and-rename writer.
//!
//! Content is written to `<path>.tmp.<nonce>`, synced, and renamed over
//! the destination, so the final name only ever holds a complete file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;

use crate::hash::content_hash;

/// Marker separating a destination name from its temp nonce.
const TEMP_MARKER: &str = ".tmp.";

/// Outcome of a completed atomic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Bytes written.
    pub size: u64,
    /// Hex SHA-256 of the written content.
    pub hash: String,
}

/// Writes files without exposing partial content under their final name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicWriter;

impl AtomicWriter {
    /// Create a writer.
    pub fn new() -> Self {
        Self
    }

    /// Atomically replace `path` with `content`.
    ///
    /// On failure the temp file is removed (best effort) and `path` keeps
    /// its previous content, or stays absent.
    pub async fn write(&self, path: &Path, content: &[u8]) -> AppResult<WriteOutcome> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let temp_path = temp_path_for(path);
        if let Err(e) = write_synced(&temp_path, content).await {
            discard(&temp_path).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write temp file: {}", temp_path.display()),
                e,
            ));
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            discard(&temp_path).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move temp file into place: {}", path.display()),
                e,
            ));
        }

        let outcome = WriteOutcome {
            size: content.len() as u64,
            hash: content_hash(content),
        };
        debug!(path = %path.display(), bytes = outcome.size, "Wrote file atomically");
        Ok(outcome)
    }

    /// Remove temp files left in `dir` by writers that never reached the
    /// rename. Returns the number of files removed.
    pub async fn sweep_orphans(&self, dir: &Path) -> AppResult<usize> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list directory: {}", dir.display()),
                    e,
                ));
            }
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let name = entry.file_name();
            if !is_temp_name(&name.to_string_lossy()) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove orphan temp file"
                ),
            }
        }

        if removed > 0 {
            debug!(dir = %dir.display(), removed, "Swept orphan temp files");
        }
        Ok(removed)
    }
}

/// Whether a file name was produced by [`temp_path_for`].
pub fn is_temp_name(name: &str) -> bool {
    name.rsplit_once(TEMP_MARKER).is_some_and(|(stem, nonce)| {
        !stem.is_empty() && nonce.len() == 32 && nonce.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!("{TEMP_MARKER}{}", Uuid::new_v4().simple()));
    PathBuf::from(name)
}

async fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}

async fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
        }
    }
}

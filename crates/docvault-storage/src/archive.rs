//! Version archive.
//!
//! Before a document is overwritten or deleted its current content is
//! copied to `{id}_v{version}_{millis}.bak` with a `.meta` sidecar holding
//! the pre-change record. Snapshot failures never abort the caller.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use docvault_core::config::RetentionConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::document::{DocumentRecord, VersionSnapshot};

use crate::atomic::AtomicWriter;

const BACKUP_EXT: &str = "bak";
const META_EXT: &str = "meta";

/// Decides which snapshots of a document may be discarded.
///
/// Consulted after every new snapshot with the document's full history,
/// oldest first.
pub trait RetentionPolicy: Send + Sync + Debug + 'static {
    /// Snapshots to delete.
    fn expired<'a>(&self, history: &'a [VersionSnapshot]) -> Vec<&'a VersionSnapshot>;
}

/// Never discard anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl RetentionPolicy for KeepAll {
    fn expired<'a>(&self, _history: &'a [VersionSnapshot]) -> Vec<&'a VersionSnapshot> {
        Vec::new()
    }
}

/// Keep only the newest `n` snapshots of each document.
#[derive(Debug, Clone, Copy)]
pub struct KeepLatest(pub usize);

impl RetentionPolicy for KeepLatest {
    fn expired<'a>(&self, history: &'a [VersionSnapshot]) -> Vec<&'a VersionSnapshot> {
        let excess = history.len().saturating_sub(self.0);
        history.iter().take(excess).collect()
    }
}

/// Build the policy described by configuration.
pub fn retention_from_config(config: &RetentionConfig) -> Arc<dyn RetentionPolicy> {
    match config.keep_latest {
        Some(n) => Arc::new(KeepLatest(n)),
        None => Arc::new(KeepAll),
    }
}

/// Append-only store of pre-change document snapshots.
#[derive(Debug, Clone)]
pub struct VersionArchive {
    /// Directory holding `.bak` and `.meta` files.
    dir: PathBuf,
    /// Writer for both files of a snapshot.
    writer: AtomicWriter,
    /// Pruning hook.
    retention: Arc<dyn RetentionPolicy>,
}

impl VersionArchive {
    /// Create an archive rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, retention: Arc<dyn RetentionPolicy>) -> Self {
        Self {
            dir: dir.into(),
            writer: AtomicWriter::new(),
            retention,
        }
    }

    /// The archive directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archive the on-disk content of `record` as it is right now.
    ///
    /// Returns `None` when the snapshot could not be written; the failure
    /// is logged and the caller proceeds.
    pub async fn snapshot(
        &self,
        record: &DocumentRecord,
        change_notes: Option<&str>,
    ) -> Option<VersionSnapshot> {
        match self.try_snapshot(record, change_notes).await {
            Ok(snapshot) => {
                info!(
                    id = %record.id,
                    version = record.version,
                    backup = %snapshot.backup_path.display(),
                    "Version snapshot written"
                );
                self.apply_retention(&record.id).await;
                Some(snapshot)
            }
            Err(e) => {
                warn!(
                    id = %record.id,
                    version = record.version,
                    error = %e,
                    "Version snapshot failed, continuing without backup"
                );
                None
            }
        }
    }

    async fn try_snapshot(
        &self,
        record: &DocumentRecord,
        change_notes: Option<&str>,
    ) -> AppResult<VersionSnapshot> {
        self.try_snapshot_at(record, change_notes, Utc::now()).await
    }

    async fn try_snapshot_at(
        &self,
        record: &DocumentRecord,
        change_notes: Option<&str>,
        backup_at: DateTime<Utc>,
    ) -> AppResult<VersionSnapshot> {
        let content = fs::read(&record.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read content for snapshot: {}", record.path.display()),
                e,
            )
        })?;

        let stem = format!(
            "{}_v{}_{}",
            record.id,
            record.version,
            backup_at.timestamp_millis()
        );
        let backup_path = self.dir.join(format!("{stem}.{BACKUP_EXT}"));
        let meta_path = self.dir.join(format!("{stem}.{META_EXT}"));

        self.writer.write(&backup_path, &content).await?;

        let snapshot = VersionSnapshot {
            record: record.clone(),
            backup_path,
            backup_at,
            change_notes: change_notes.map(String::from),
        };
        let meta = serde_json::to_vec_pretty(&snapshot)?;
        if let Err(e) = self.writer.write(&meta_path, &meta).await {
            if let Err(cleanup) = fs::remove_file(&snapshot.backup_path).await {
                warn!(
                    backup = %snapshot.backup_path.display(),
                    error = %cleanup,
                    "Failed to remove backup left without its sidecar"
                );
            }
            return Err(e);
        }

        Ok(snapshot)
    }

    /// Every readable snapshot of `id`, ordered by version then time.
    pub async fn history(&self, id: &str) -> AppResult<Vec<VersionSnapshot>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list archive: {}", self.dir.display()),
                    e,
                ));
            }
        };

        let prefix = format!("{id}_v");
        let mut history = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read archive entry", e)
        })? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(&prefix) || path.extension().is_none_or(|ext| ext != META_EXT) {
                continue;
            }

            match read_meta(&path).await {
                Ok(snapshot) if snapshot.record.id == id => history.push(snapshot),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot"),
            }
        }

        history.sort_by(|a, b| {
            a.version()
                .cmp(&b.version())
                .then(a.backup_at.cmp(&b.backup_at))
        });
        Ok(history)
    }

    /// Read the archived content of a snapshot.
    pub async fn load_content(&self, snapshot: &VersionSnapshot) -> AppResult<Vec<u8>> {
        fs::read(&snapshot.backup_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!(
                    "Backup missing: {}",
                    snapshot.backup_path.display()
                ))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read backup: {}", snapshot.backup_path.display()),
                    e,
                )
            }
        })
    }

    async fn apply_retention(&self, id: &str) {
        let history = match self.history(id).await {
            Ok(history) => history,
            Err(e) => {
                warn!(id, error = %e, "Retention skipped, history unreadable");
                return;
            }
        };

        for snapshot in self.retention.expired(&history) {
            let meta_path = snapshot.backup_path.with_extension(META_EXT);
            for path in [&snapshot.backup_path, &meta_path] {
                if let Err(e) = fs::remove_file(path).await {
                    warn!(path = %path.display(), error = %e, "Failed to prune snapshot file");
                }
            }
            debug!(id, version = snapshot.version(), "Pruned snapshot");
        }
    }
}

async fn read_meta(path: &Path) -> AppResult<VersionSnapshot> {
    let raw = fs::read(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}

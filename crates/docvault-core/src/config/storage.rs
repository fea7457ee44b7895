//! Document storage configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// On-disk layout and concurrency settings for the document store.
///
/// Immutable once the store is constructed; every component reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all runtime data.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Sub-directory (under `base_dir`) holding live document content.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,
    /// Sub-directory holding the durable metadata index.
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: String,
    /// Sub-directory holding version snapshots.
    #[serde(default = "default_versions_dir")]
    pub versions_dir: String,
    /// Whether per-path locking is enforced.
    #[serde(default = "default_true")]
    pub locking_enabled: bool,
    /// Upper bound on facade operations in flight at once. `0` disables
    /// admission control.
    #[serde(default = "default_max_concurrent_ops")]
    pub max_concurrent_ops: usize,
    /// Snapshot retention settings.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Version snapshot retention.
///
/// Snapshots are append-only unless a limit is configured explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Keep only the newest N snapshots per document. `None` keeps all.
    #[serde(default)]
    pub keep_latest: Option<usize>,
}

impl StorageConfig {
    /// Build a configuration rooted at `base_dir` with default sub-directories.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Absolute directory for live documents.
    pub fn documents_path(&self) -> PathBuf {
        self.base_dir.join(&self.documents_dir)
    }

    /// Absolute directory for the metadata index.
    pub fn metadata_path(&self) -> PathBuf {
        self.base_dir.join(&self.metadata_dir)
    }

    /// Absolute directory for version snapshots.
    pub fn versions_path(&self) -> PathBuf {
        self.base_dir.join(&self.versions_dir)
    }

    /// Absolute path of the durable index file.
    pub fn index_file(&self) -> PathBuf {
        self.metadata_path().join("index.json")
    }

    /// Reject layouts that would make components share a directory.
    pub fn validate(&self) -> Result<(), AppError> {
        let dirs = [
            ("documents_dir", &self.documents_dir),
            ("metadata_dir", &self.metadata_dir),
            ("versions_dir", &self.versions_dir),
        ];

        for (field, value) in dirs {
            if value.trim().is_empty() {
                return Err(AppError::configuration(format!(
                    "storage.{field} must not be empty"
                )));
            }
            if Path::new(value.as_str()).is_absolute() {
                return Err(AppError::configuration(format!(
                    "storage.{field} must be relative to base_dir"
                )));
            }
        }

        if self.documents_dir == self.metadata_dir
            || self.documents_dir == self.versions_dir
            || self.metadata_dir == self.versions_dir
        {
            return Err(AppError::configuration(
                "storage sub-directories must be distinct",
            ));
        }

        if self.retention.keep_latest == Some(0) {
            return Err(AppError::configuration(
                "storage.retention.keep_latest must be at least 1",
            ));
        }

        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            documents_dir: default_documents_dir(),
            metadata_dir: default_metadata_dir(),
            versions_dir: default_versions_dir(),
            locking_enabled: true,
            max_concurrent_ops: default_max_concurrent_ops(),
            retention: RetentionConfig::default(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_documents_dir() -> String {
    "documents".to_string()
}

fn default_metadata_dir() -> String {
    "metadata".to_string()
}

fn default_versions_dir() -> String {
    "versions".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_ops() -> usize {
    10
}

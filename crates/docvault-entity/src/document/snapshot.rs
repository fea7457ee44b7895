//! Version snapshot entity.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DocumentRecord;

/// A document's state as it was immediately before a destructive change.
///
/// Written as the `.meta` sidecar of a `.bak` content copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    /// The record as of the pre-change state.
    #[serde(flatten)]
    pub record: DocumentRecord,
    /// Where the archived content lives.
    pub backup_path: PathBuf,
    /// When the snapshot was taken.
    pub backup_at: DateTime<Utc>,
    /// Notes describing the change that superseded this version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_notes: Option<String>,
}

impl VersionSnapshot {
    /// The archived document version.
    pub fn version(&self) -> u32 {
        self.record.version
    }
}

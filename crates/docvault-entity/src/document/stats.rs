//! Aggregate statistics over the live document set.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DocumentRecord;

/// Totals reported by the `stats` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Number of live documents.
    pub total_documents: usize,
    /// Sum of document sizes in bytes.
    pub total_size: u64,
    /// Document count per category.
    pub counts_by_category: BTreeMap<String, usize>,
    /// Most recent `modifiedAt` across all documents.
    pub last_modified: Option<DateTime<Utc>>,
}

impl StorageStats {
    /// Fold a set of records into totals.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DocumentRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total_documents += 1;
            stats.total_size += record.size;
            *stats
                .counts_by_category
                .entry(record.category.clone())
                .or_insert(0) += 1;
            stats.last_modified = stats.last_modified.max(Some(record.modified_at));
        }
        stats
    }
}

//! Document record model.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned when the caller does not supply one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Metadata for one live document.
///
/// `id` never changes after the first store. `version` starts at 1 and
/// grows by exactly one per successful update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Stable document identifier.
    pub id: String,
    /// Display name supplied at store time.
    pub name: String,
    /// Location of the live content on disk.
    pub path: PathBuf,
    /// Content size in bytes.
    pub size: u64,
    /// When the document was first stored.
    pub created_at: DateTime<Utc>,
    /// When the content last changed.
    pub modified_at: DateTime<Utc>,
    /// Hex SHA-256 digest of the current content.
    pub content_hash: String,
    /// Monotonic revision counter, starting at 1.
    pub version: u32,
    /// Tags for categorization and search.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category label.
    pub category: String,
    /// Author attribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl DocumentRecord {
    /// Record the result of rewriting the content.
    ///
    /// Bumps `version` by one and refreshes size, hash, and `modified_at`.
    pub fn revise(&mut self, size: u64, content_hash: String, now: DateTime<Utc>) {
        self.size = size;
        self.content_hash = content_hash;
        self.modified_at = now;
        self.version += 1;
    }

    /// Case-insensitive substring match against the name and every tag.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }

    /// Whether the record carries at least one of `tags`.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|wanted| self.tags.contains(wanted))
    }
}

//! Filtering, sorting, and pagination over cached document records.
//!
//! The query engine never touches disk.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::{Page, PageRequest, SortDirection};
use docvault_entity::document::DocumentRecord;

/// Field to order results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Document name, byte-wise.
    Name,
    /// First store time.
    CreatedAt,
    /// Last content change.
    #[default]
    ModifiedAt,
    /// Content size.
    Size,
}

/// Inclusive bounds on `modifiedAt`. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest accepted timestamp.
    pub start: Option<DateTime<Utc>>,
    /// Latest accepted timestamp.
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Whether `at` falls inside the range.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
    }
}

/// Parameters of a `list` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    /// Case-insensitive substring over name and tags. Blank matches all.
    #[serde(default)]
    pub query: Option<String>,
    /// Exact category match.
    #[serde(default)]
    pub category: Option<String>,
    /// Matches records carrying any of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Range filter on `modifiedAt`.
    #[serde(default)]
    pub date_range: Option<DateRange>,
    /// Sort field.
    #[serde(default)]
    pub sort_by: SortKey,
    /// Sort direction.
    #[serde(default)]
    pub sort_order: SortDirection,
    /// Offset/limit window.
    #[serde(flatten)]
    pub page: PageRequest,
}

impl ListOptions {
    /// Options with a text query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Options with a category filter.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Options with an any-of tag filter.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Options with a `modifiedAt` range.
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Options with an ordering.
    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_by = key;
        self.sort_order = direction;
        self
    }

    /// Options with an offset/limit window.
    pub fn paged(mut self, offset: usize, limit: usize) -> Self {
        self.page = PageRequest::new(offset, limit);
        self
    }

    fn accepts(&self, record: &DocumentRecord, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            if !record.matches_text(needle) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &record.category != category {
                return false;
            }
        }
        if !self.tags.is_empty() && !record.has_any_tag(&self.tags) {
            return false;
        }
        if let Some(range) = &self.date_range {
            if !range.contains(record.modified_at) {
                return false;
            }
        }
        true
    }
}

/// Filter, sort, and paginate `records` according to `options`.
pub fn run(records: Vec<DocumentRecord>, options: &ListOptions) -> Page<DocumentRecord> {
    let needle = options
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<DocumentRecord> = records
        .into_iter()
        .filter(|record| options.accepts(record, needle.as_deref()))
        .collect();

    matched.sort_by(|a, b| {
        options
            .sort_order
            .apply(compare(a, b, options.sort_by))
            .then_with(|| a.id.cmp(&b.id))
    });

    options.page.paginate(matched)
}

fn compare(a: &DocumentRecord, b: &DocumentRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::CreatedAt => a
            .created_at
            .timestamp_millis()
            .cmp(&b.created_at.timestamp_millis()),
        SortKey::ModifiedAt => a
            .modified_at
            .timestamp_millis()
            .cmp(&b.modified_at.timestamp_millis()),
        SortKey::Size => a.size.cmp(&b.size),
    }
}

//! Offset/limit pagination for list operations.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 25;
/// Maximum page size.
pub const MAX_PAGE_SIZE: usize = 100;

/// Offset/limit window over a filtered, sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of matching items to skip.
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl PageRequest {
    /// Create a new page request, clamping the limit into `1..=MAX_PAGE_SIZE`.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The limit actually applied; deserialized requests bypass [`Self::new`].
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Slice one page out of `items` and report whether more remain.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let limit = self.effective_limit();
        let records = items.into_iter().skip(self.offset).take(limit).collect();
        Page {
            records,
            total,
            has_more: self.offset.saturating_add(limit) < total,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items on this page.
    pub records: Vec<T>,
    /// Number of items matching before pagination.
    pub total: usize,
    /// Whether items exist beyond this page.
    pub has_more: bool,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

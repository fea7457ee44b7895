//! List and search CLI command.

use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};

use crate::output::OutputFormat;
use docvault_core::error::AppError;
use docvault_core::types::SortDirection;
use docvault_core::types::pagination::DEFAULT_PAGE_SIZE;
use docvault_storage::{DateRange, DocumentStore, ListOptions, SortKey};

/// Sort field selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortField {
    /// Document name
    Name,
    /// Creation time
    Created,
    /// Last modification time
    Modified,
    /// Content size
    Size,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Name => SortKey::Name,
            SortField::Created => SortKey::CreatedAt,
            SortField::Modified => SortKey::ModifiedAt,
            SortField::Size => SortKey::Size,
        }
    }
}

/// Sort order selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// Arguments for the list command
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Case-insensitive text matched against names and tags
    #[arg(short, long)]
    pub query: Option<String>,

    /// Only documents in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Only documents carrying any of these tags (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Earliest modification time (RFC 3339)
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Latest modification time (RFC 3339)
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,

    /// Sort field
    #[arg(short, long, value_enum, default_value = "modified")]
    pub sort: SortField,

    /// Sort order
    #[arg(long, value_enum, default_value = "desc")]
    pub order: SortOrder,

    /// Number of results to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of results
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub limit: usize,
}

impl ListArgs {
    fn to_options(&self) -> ListOptions {
        let direction = match self.order {
            SortOrder::Asc => SortDirection::Asc,
            SortOrder::Desc => SortDirection::Desc,
        };

        let mut options = ListOptions::default()
            .with_tags(self.tags.iter().cloned())
            .sorted_by(self.sort.into(), direction)
            .paged(self.offset, self.limit);
        options.query = self.query.clone();
        options.category = self.category.clone();
        if self.since.is_some() || self.until.is_some() {
            options = options.with_date_range(DateRange {
                start: self.since,
                end: self.until,
            });
        }
        options
    }
}

/// Execute the list command
pub async fn execute(
    args: &ListArgs,
    store: &DocumentStore,
    format: OutputFormat,
) -> Result<(), AppError> {
    let page = store.list(&args.to_options()).await;

    super::print_records(&page.records, format);
    if format == OutputFormat::Table && !page.records.is_empty() {
        println!(
            "Showing {}-{} of {}{}",
            args.offset + 1,
            args.offset + page.records.len(),
            page.total,
            if page.has_more { " (more available)" } else { "" }
        );
    }

    Ok(())
}

//! Version history CLI command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use docvault_core::error::AppError;
use docvault_entity::document::VersionSnapshot;
use docvault_storage::DocumentStore;

/// Arguments for the history command
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Document ID
    pub id: String,
}

/// Snapshot display row
#[derive(Debug, Serialize, Tabled)]
struct SnapshotRow {
    /// Archived version
    version: u32,
    /// Size at that version
    size: String,
    /// When it was archived
    archived: String,
    /// Change notes
    notes: String,
}

impl From<&VersionSnapshot> for SnapshotRow {
    fn from(snapshot: &VersionSnapshot) -> Self {
        Self {
            version: snapshot.version(),
            size: output::format_bytes(snapshot.record.size),
            archived: snapshot.backup_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            notes: snapshot.change_notes.clone().unwrap_or_default(),
        }
    }
}

/// Execute the history command
pub async fn execute(
    args: &HistoryArgs,
    store: &DocumentStore,
    format: OutputFormat,
) -> Result<(), AppError> {
    let history = store.history(&args.id).await?;

    if history.is_empty() && format == OutputFormat::Table {
        output::print_warning(&format!("No archived versions for '{}'", args.id));
        return Ok(());
    }

    let rows: Vec<SnapshotRow> = history.iter().map(SnapshotRow::from).collect();
    output::print_list(&history, rows, format);

    Ok(())
}

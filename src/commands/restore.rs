//! Restore CLI command.

use clap::Args;

use crate::output::{self, OutputFormat};
use docvault_core::error::AppError;
use docvault_storage::DocumentStore;

/// Arguments for the restore command
#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Document ID
    pub id: String,

    /// Archived version to restore
    pub version: u32,

    /// Note recorded with the archived version
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Execute the restore command
pub async fn execute(
    args: &RestoreArgs,
    store: &DocumentStore,
    format: OutputFormat,
) -> Result<(), AppError> {
    let record = store
        .restore(&args.id, args.version, args.notes.as_deref())
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&record),
        OutputFormat::Table => output::print_success(&format!(
            "Version {} of '{}' restored as version {}",
            args.version, record.id, record.version
        )),
    }

    Ok(())
}

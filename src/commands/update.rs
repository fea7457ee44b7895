//! Update CLI command.

use std::path::PathBuf;

use clap::Args;

use crate::output::{self, OutputFormat};
use docvault_core::error::{AppError, ErrorKind};
use docvault_storage::DocumentStore;

/// Arguments for the update command
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Document ID
    pub id: String,

    /// File holding the new content
    pub file: PathBuf,

    /// Note recorded with the archived version
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Execute the update command
pub async fn execute(
    args: &UpdateArgs,
    store: &DocumentStore,
    format: OutputFormat,
) -> Result<(), AppError> {
    let content = tokio::fs::read(&args.file).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::NotFound,
            format!("Failed to read '{}'", args.file.display()),
            e,
        )
    })?;

    let record = store
        .update(&args.id, &content, args.notes.as_deref())
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&record),
        OutputFormat::Table => output::print_success(&format!(
            "Document '{}' updated to version {} ({})",
            record.id,
            record.version,
            output::format_bytes(record.size)
        )),
    }

    Ok(())
}

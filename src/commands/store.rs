//! Store CLI command.

use std::path::PathBuf;

use clap::Args;

use crate::output::{self, OutputFormat};
use docvault_core::error::{AppError, ErrorKind};
use docvault_entity::document::StoreRequest;
use docvault_storage::DocumentStore;

/// Arguments for the store command
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Path to the file to store
    pub file: PathBuf,

    /// Override document name (defaults to the file name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Explicit document ID (defaults to the content hash)
    #[arg(long)]
    pub id: Option<String>,

    /// Tag to attach (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Category label
    #[arg(long)]
    pub category: Option<String>,

    /// Author attribution
    #[arg(short, long)]
    pub author: Option<String>,
}

/// Execute the store command
pub async fn execute(
    args: &StoreArgs,
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

    let name = args.name.clone().unwrap_or_else(|| {
        args.file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string()
    });

    let mut request = StoreRequest::new();
    request.id = args.id.clone();
    request.tags = args.tags.clone();
    request.category = args.category.clone();
    request.author = args.author.clone();

    let record = store.store(&name, &content, request).await?;

    match format {
        OutputFormat::Json => output::print_json(&record),
        OutputFormat::Table => output::print_success(&format!(
            "Document '{}' stored (id: {}, size: {})",
            record.name,
            record.id,
            output::format_bytes(record.size)
        )),
    }

    Ok(())
}

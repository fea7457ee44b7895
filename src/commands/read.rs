//! Read CLI command.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::output::{self, OutputFormat};
use docvault_core::error::{AppError, ErrorKind};
use docvault_storage::DocumentStore;

/// Arguments for the read command
#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Document ID, or a file path with `--path`
    pub target: String,

    /// Treat the target as a file path instead of an ID
    #[arg(long)]
    pub path: bool,

    /// Write content to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print only the metadata
    #[arg(short, long)]
    pub metadata: bool,
}

/// Execute the read command
pub async fn execute(
    args: &ReadArgs,
    store: &DocumentStore,
    format: OutputFormat,
) -> Result<(), AppError> {
    let document = if args.path {
        store.read(&PathBuf::from(&args.target)).await?
    } else {
        store.read_document(&args.target).await?
    };

    if args.metadata {
        super::print_record(&document.metadata, format);
        return Ok(());
    }

    match &args.output {
        Some(out_path) => {
            tokio::fs::write(out_path, &document.content)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to write '{}'", out_path.display()),
                        e,
                    )
                })?;
            output::print_success(&format!(
                "Version {} of '{}' written to '{}'",
                document.metadata.version,
                document.metadata.name,
                out_path.display()
            ));
        }
        None => {
            std::io::stdout()
                .write_all(&document.content)
                .map_err(|e| AppError::internal(format!("Failed to write stdout: {}", e)))?;
        }
    }

    Ok(())
}

//! Delete CLI command.

use clap::Args;

use crate::output;
use docvault_core::error::AppError;
use docvault_storage::DocumentStore;

/// Arguments for the delete command
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Document ID
    pub id: String,

    /// Skip confirmation
    #[arg(long)]
    pub force: bool,
}

/// Execute the delete command
pub async fn execute(args: &DeleteArgs, store: &DocumentStore) -> Result<(), AppError> {
    let record = store.get(&args.id).await?;

    if !args.force {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete '{}' (version {})? Its history stays in the archive.",
                record.name, record.version
            ))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(&args.id).await?;
    output::print_success(&format!("Document '{}' deleted", args.id));

    Ok(())
}

//! Storage statistics CLI command.

use crate::output::{self, OutputFormat};
use docvault_core::error::AppError;
use docvault_storage::DocumentStore;

/// Execute the stats command
pub async fn execute(store: &DocumentStore, format: OutputFormat) -> Result<(), AppError> {
    let stats = store.stats().await;

    match format {
        OutputFormat::Json => output::print_json(&stats),
        OutputFormat::Table => {
            println!("Storage Statistics");
            println!("──────────────────");
            output::print_kv("Base directory", &store.config().base_dir.display().to_string());
            output::print_kv("Documents", &stats.total_documents.to_string());
            output::print_kv("Total size", &output::format_bytes(stats.total_size));
            output::print_kv(
                "Last modified",
                &stats
                    .last_modified
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            );
            if !stats.counts_by_category.is_empty() {
                println!();
                println!("By category");
                for (category, count) in &stats.counts_by_category {
                    output::print_kv(category, &count.to_string());
                }
            }
        }
    }

    Ok(())
}

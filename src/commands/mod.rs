//! CLI command definitions and dispatch.

pub mod config;
pub mod delete;
pub mod history;
pub mod list;
pub mod read;
pub mod restore;
pub mod stats;
pub mod store;
pub mod update;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_entity::document::DocumentRecord;
use docvault_storage::DocumentStore;

/// DocVault: concurrent document store with version history
#[derive(Debug, Parser)]
#[command(name = "docvault", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Override the storage base directory
    #[arg(short, long)]
    pub base_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store a file as a new document
    Store(store::StoreArgs),
    /// Read a document's content and metadata
    Read(read::ReadArgs),
    /// List and search documents
    List(list::ListArgs),
    /// Replace a document's content
    Update(update::UpdateArgs),
    /// Delete a document
    Delete(delete::DeleteArgs),
    /// Show storage statistics
    Stats,
    /// Show archived versions of a document
    History(history::HistoryArgs),
    /// Restore an archived version
    Restore(restore::RestoreArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, app_config: AppConfig) -> Result<(), AppError> {
        if let Commands::Config(args) = &self.command {
            return config::execute(args, &self.config, &app_config, self.format);
        }

        let vault = open_store(&app_config).await?;
        match &self.command {
            Commands::Store(args) => store::execute(args, &vault, self.format).await,
            Commands::Read(args) => read::execute(args, &vault, self.format).await,
            Commands::List(args) => list::execute(args, &vault, self.format).await,
            Commands::Update(args) => update::execute(args, &vault, self.format).await,
            Commands::Delete(args) => delete::execute(args, &vault).await,
            Commands::Stats => stats::execute(&vault, self.format).await,
            Commands::History(args) => history::execute(args, &vault, self.format).await,
            Commands::Restore(args) => restore::execute(args, &vault, self.format).await,
            Commands::Config(_) => Ok(()),
        }
    }
}

/// Helper: open and initialize the document store
pub async fn open_store(config: &AppConfig) -> Result<DocumentStore, AppError> {
    let store = DocumentStore::new(config.storage.clone())?;
    store.initialize().await?;
    Ok(store)
}

/// Document display row
#[derive(Debug, Serialize, Tabled)]
pub struct DocumentRow {
    /// Document ID
    id: String,
    /// Name
    name: String,
    /// Version
    version: u32,
    /// Size
    size: String,
    /// Category
    category: String,
    /// Tags
    tags: String,
    /// Last modified
    modified: String,
}

impl From<&DocumentRecord> for DocumentRow {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            version: record.version,
            size: output::format_bytes(record.size),
            category: record.category.clone(),
            tags: record.tags.join(", "),
            modified: record.modified_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Helper: print records as rows or JSON
pub fn print_records(records: &[DocumentRecord], format: OutputFormat) {
    let rows: Vec<DocumentRow> = records.iter().map(DocumentRow::from).collect();
    output::print_list(records, rows, format);
}

/// Helper: print a single record
pub fn print_record(record: &DocumentRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(record),
        OutputFormat::Table => {
            output::print_kv("ID", &record.id);
            output::print_kv("Name", &record.name);
            output::print_kv("Path", &record.path.display().to_string());
            output::print_kv("Version", &record.version.to_string());
            output::print_kv("Size", &output::format_bytes(record.size));
            output::print_kv("Category", &record.category);
            output::print_kv("Tags", &record.tags.join(", "));
            output::print_kv("Author", record.author.as_deref().unwrap_or("-"));
            output::print_kv("Content hash", &record.content_hash);
            output::print_kv("Created", &record.created_at.to_rfc3339());
            output::print_kv("Modified", &record.modified_at.to_rfc3339());
        }
    }
}

//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config_path: &str,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => match format {
            OutputFormat::Json => output::print_json(config),
            OutputFormat::Table => {
                let storage = &config.storage;
                output::print_kv("Base directory", &storage.base_dir.display().to_string());
                output::print_kv("Documents", &storage.documents_path().display().to_string());
                output::print_kv("Metadata", &storage.metadata_path().display().to_string());
                output::print_kv("Versions", &storage.versions_path().display().to_string());
                output::print_kv("Locking", &storage.locking_enabled.to_string());
                output::print_kv(
                    "Max concurrent ops",
                    &match storage.max_concurrent_ops {
                        0 => "unlimited".to_string(),
                        n => n.to_string(),
                    },
                );
                output::print_kv(
                    "Retention",
                    &match storage.retention.keep_latest {
                        Some(n) => format!("keep latest {}", n),
                        None => "keep all".to_string(),
                    },
                );
                output::print_kv("Log level", &config.logging.level);
                output::print_kv("Log format", &config.logging.format);
            }
        },
        ConfigCommand::Validate => {
            // Loading already validated; this reports where it came from.
            output::print_success(&format!("Configuration '{}' is valid", config_path));
            output::print_kv(
                "Index file",
                &config.storage.index_file().display().to_string(),
            );
        }
    }

    Ok(())
}

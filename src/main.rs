//! DocVault command-line interface.
//!
//! Loads configuration, initializes logging, and dispatches one subcommand
//! against the document store rooted at the configured base directory.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod output;

use commands::Cli;
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = cli.execute(config).await {
        tracing::debug!(kind = %e.kind, "Command failed");
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Load configuration from file and environment, then apply CLI overrides.
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(&cli.config)?;

    if let Some(base_dir) = &cli.base_dir {
        config.storage.base_dir = base_dir.clone();
    }

    Ok(config)
}

/// Initialize tracing. Logs go to stderr so stdout stays parseable.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

//! Application configuration schemas.
//!
//! Configuration is deserialized from an optional TOML file via the
//! `config` crate, with `DOCVAULT__`-prefixed environment variables
//! layered on top. Every field has a serde default so an empty source
//! yields a usable configuration.

pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::storage::{RetentionConfig, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional. Environment variables use the `DOCVAULT`
    /// prefix with `__` as the section separator, e.g.
    /// `DOCVAULT__STORAGE__BASE_DIR=/srv/docs`.
    pub fn load(config_path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DOCVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.storage.validate()?;
        tracing::debug!(
            config_path,
            base_dir = %app.storage.base_dir.display(),
            "Configuration loaded"
        );
        Ok(app)
    }
}

//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `WELLNESS_ONBOARDING` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use wellness_onboarding::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Remote API at {}", config.api.base_url);
//! ```

mod api;
mod engine;
mod error;
mod logging;
mod storage;

pub use api::ApiConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "WELLNESS_ONBOARDING";

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Remote onboarding service
    #[serde(default)]
    pub api: ApiConfig,

    /// Local (resumability) storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Engine navigation policy
    #[serde(default)]
    pub engine: EngineConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Require HTTPS for the remote API
    #[serde(default)]
    pub production: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `WELLNESS_ONBOARDING` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `WELLNESS_ONBOARDING__API__BASE_URL=...` -> `api.base_url = ...`
    /// - `WELLNESS_ONBOARDING__ENGINE__TRUST_PREVIOUS_STEPS=false`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        if self.production && !self.api.uses_https() {
            return Err(ValidationError::ApiUrlMustBeHttps);
        }
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

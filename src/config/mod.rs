//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `ACCORD`
//! prefix and nested sections use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use accord::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod capabilities;
mod engine;
mod error;
mod remote;
mod review;

pub use capabilities::CapabilitySettings;
pub use engine::EngineSettings;
pub use error::{ConfigError, ValidationError};
pub use remote::RemoteSettings;
pub use review::ReviewSettings;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has working defaults, so an empty environment yields a
/// valid configuration for in-process deployments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Engine limits (round cap, consensus tolerance)
    #[serde(default)]
    pub engine: EngineSettings,

    /// External capability timeouts and retry budget
    #[serde(default)]
    pub capabilities: CapabilitySettings,

    /// Review gate criterion
    #[serde(default)]
    pub review: ReviewSettings,

    /// Optional remote capability endpoint
    #[serde(default)]
    pub remote: RemoteSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `ACCORD` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ACCORD__ENGINE__MAX_ROUNDS=3` -> `engine.max_rounds = 3`
    /// - `ACCORD__CAPABILITIES__MAX_RETRIES=5` -> `capabilities.max_retries = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ACCORD")
                    .separator("__"),
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
        self.engine.validate()?;
        self.capabilities.validate()?;
        self.remote.validate()?;
        Ok(())
    }
}

//! Configuration management for the workbench kernel.
//!
//! Settings come from built-in defaults overlaid with `WORKBENCH__*`
//! environment variables, e.g. `WORKBENCH__WORKSPACE__SESSION_TTL_SECS=600`.
//!
//! # Example
//!
//! ```
//! use workbench_kernel::infrastructure::config::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! assert!(settings.workspace.session_ttl_secs > 0);
//! ```

pub mod telemetry;
pub mod workspace;

pub use telemetry::TelemetrySettings;
pub use workspace::WorkspaceSettings;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Prefix of every environment variable read by [`Settings::new`].
pub const ENV_PREFIX: &str = "WORKBENCH";

/// Top-level configuration for the workbench kernel.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Workspace session settings.
    #[serde(default)]
    pub workspace: WorkspaceSettings,
    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Creates a new settings instance from environment variables and defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Builds settings from defaults overlaid with `environment`.
    ///
    /// The key separator is forced to `__` so nested keys keep their
    /// single underscores.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Start with default values
            .set_default(
                "workspace.session_ttl_secs",
                workspace::default_session_ttl(),
            )?
            .set_default(
                "workspace.max_file_chars",
                u64::try_from(workspace::default_max_file_chars()).unwrap_or(u64::MAX),
            )?
            .set_default("telemetry.service_name", telemetry::default_service_name())?
            .set_default("telemetry.log_level", telemetry::default_log_level())?
            .set_default("telemetry.json", false)?
            // Merge in Environment variables
            .add_source(environment.separator("__").try_parsing(true))
            .build()?;

        s.try_deserialize()
    }
}

//! # Configuration Settings
//!
//! Defines the configuration structure for the keystore persistence layer.

use crate::errors::{KeystoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "KEYSTORE";

/// Separator between nested keys in environment variables
pub const ENV_SEPARATOR: &str = "__";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Location of the identity configuration document
    #[validate(nested)]
    pub registry: RegistryConfig,

    /// Schema initialization behavior
    pub schema: SchemaConfig,

    /// Data sources bound in the name service
    #[validate(nested)]
    pub data_sources: Vec<DataSourceConfig>,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file and `KEYSTORE__*`
    /// environment variables, in that order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config: AppConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(KeystoreError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    fn validate_custom(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for data_source in &self.data_sources {
            data_source.validate_custom()?;
            if !seen.insert(data_source.name.as_str()) {
                return Err(KeystoreError::validation_field(
                    format!("Data source '{}' is defined more than once", data_source.name),
                    "data_sources",
                ));
            }
        }

        Ok(())
    }
}

/// Where the identity configuration document lives
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegistryConfig {
    /// Server configuration directory; the document is read from `<config_dir>/identity/`
    pub config_dir: PathBuf,

    /// File name of the identity configuration document
    #[validate(length(min = 1, message = "Identity file name cannot be empty"))]
    pub identity_file: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("./repository/conf"),
            identity_file: crate::config::identity::IDENTITY_CONFIG.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Full path of the identity configuration document
    pub fn identity_config_path(&self) -> PathBuf {
        self.config_dir.join("identity").join(&self.identity_file)
    }
}

/// Schema initialization is opt-in and reported through
/// [`SchemaStatus`](crate::context::SchemaStatus).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SchemaConfig {
    /// Create the public certificate table on startup
    pub initialize: bool,
}

/// A data source definition bound under a logical name
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DataSourceConfig {
    /// Logical name used by the name-service lookup (e.g. `jdbc/SHARED_DB`)
    #[validate(length(min = 1, message = "Data source name cannot be empty"))]
    pub name: String,

    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(
        min = 1,
        max = 100,
        message = "Max connections must be between 1 and 100"
    ))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(
        min = 0,
        max = 50,
        message = "Min connections must be between 0 and 50"
    ))]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            name: "jdbc/SHARED_DB".to_string(),
            url: "sqlite://./repository/database/SHARED_DB.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
        }
    }
}

impl DataSourceConfig {
    /// Create a data source definition with default pool settings
    pub fn new<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a SQLite configuration
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// Check if this is a PostgreSQL configuration
    pub fn is_postgresql(&self) -> bool {
        self.url.starts_with("postgresql://") || self.url.starts_with("postgres://")
    }

    pub(crate) fn validate_custom(&self) -> Result<()> {
        if self.min_connections > self.max_connections {
            return Err(KeystoreError::validation_field(
                format!(
                    "min_connections cannot be greater than max_connections for '{}'",
                    self.name
                ),
                "min_connections",
            ));
        }

        if !self.is_sqlite() && !self.is_postgresql() {
            return Err(KeystoreError::validation_field(
                format!(
                    "Database URL for '{}' must start with 'sqlite:' or 'postgresql://'",
                    self.name
                ),
                "url",
            ));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or an `EnvFilter` directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

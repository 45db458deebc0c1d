//! # Structured Logging
//!
//! Subscriber setup and startup configuration logging built on the tracing ecosystem.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{KeystoreError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Installing twice
/// returns a configuration error.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            KeystoreError::config_with_source(
                format!("Invalid log level '{}'", config.log_level),
                Box::new(e),
            )
        })?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_level(true).with_target(false)).try_init()
    };

    result.map_err(|e| KeystoreError::config_with_source("Failed to install tracing subscriber", Box::new(e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        identity_config = %config.registry.identity_config_path().display(),
        data_sources = config.data_sources.len(),
        schema_initialize = config.schema.initialize,
        json_logging = config.observability.json_logging,
        "Keystore persistence configuration"
    );
}

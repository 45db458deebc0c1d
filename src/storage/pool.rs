//! # Database Connection Pool Management
//!
//! Builds the connection pools bound in the name service. Pools use the
//! `sqlx::Any` driver so a data source can be backed by PostgreSQL or SQLite.

use crate::config::DataSourceConfig;
use crate::errors::{KeystoreError, Result};
use sqlx::any::AnyPoolOptions;
use sqlx::{Any, Pool};

/// Type alias for the database connection pool
pub type DbPool = Pool<Any>;

/// Create a database connection pool for a data source definition
pub async fn create_pool(config: &DataSourceConfig) -> Result<DbPool> {
    validate_config(config)?;

    sqlx::any::install_default_drivers();

    let pool_options = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true);

    let pool_options = if let Some(idle_timeout) = config.idle_timeout() {
        pool_options.idle_timeout(idle_timeout)
    } else {
        pool_options
    };

    let url = if config.is_sqlite() { sqlite_create_if_missing(&config.url) } else { config.url.clone() };

    let pool = pool_options.connect(&url).await.map_err(|e| {
        tracing::error!(
            error = %e,
            name = %config.name,
            url = %sanitize_url(&config.url),
            "Failed to create database pool"
        );
        KeystoreError::lookup_with_source(
            &config.name,
            format!("Failed to connect to database: {}", sanitize_url(&config.url)),
            Box::new(e),
        )
    })?;

    tracing::info!(
        name = %config.name,
        database_type = if config.is_sqlite() { "sqlite" } else { "postgresql" },
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_ms = config.connect_timeout().as_millis(),
        idle_timeout_ms = config.idle_timeout().map(|d| d.as_millis()),
        "Database connection pool created"
    );

    Ok(pool)
}

/// Validate a data source definition
fn validate_config(config: &DataSourceConfig) -> Result<()> {
    if config.max_connections == 0 {
        return Err(KeystoreError::validation("max_connections must be greater than 0"));
    }

    if config.url.is_empty() {
        return Err(KeystoreError::validation("database URL cannot be empty"));
    }

    config.validate_custom()
}

/// File-backed SQLite databases are created on first connect.
fn sqlite_create_if_missing(url: &str) -> String {
    if url.contains(":memory:") || url.contains("mode=") {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&mode=rwc", url)
    } else {
        format!("{}?mode=rwc", url)
    }
}

/// Sanitize database URL for logging (remove credentials)
pub(crate) fn sanitize_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if parsed.password().is_some() || !parsed.username().is_empty() {
            format!(
                "{}://***:***@{}{}",
                parsed.scheme(),
                parsed.host_str().unwrap_or("unknown"),
                parsed.path()
            )
        } else {
            url.to_string()
        }
    } else {
        url.to_string()
    }
}

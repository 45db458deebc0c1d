//! Startup sequence for the keystore persistence layer
//!
//! [`KeystoreContext`] is built once when the host process starts and is handed to
//! whatever needs certificate storage. It resolves the registry data source up
//! front, so configuration and lookup problems surface at startup, and creates the
//! schema only when the configuration asks for it.

use crate::config::AppConfig;
use crate::errors::Result;
use crate::observability::log_config_info;
use crate::storage::naming::{DataSourceRegistry, NameService};
use crate::storage::provider::ConnectionProvider;
use crate::storage::repositories::SqlxPubCertRepository;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of the schema initialization step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The public certificate table was created or already existed
    Initialized,
    /// `schema.initialize` was not set; the schema was not checked
    Skipped,
}

impl fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStatus::Initialized => write!(f, "initialized"),
            SchemaStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Shared persistence context injected into certificate consumers
#[derive(Debug, Clone)]
pub struct KeystoreContext {
    provider: Arc<ConnectionProvider>,
    schema_status: SchemaStatus,
}

impl KeystoreContext {
    /// Start with a name service built from the configured data sources.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let naming = DataSourceRegistry::from_configs(&config.data_sources);
        Self::start(config, Arc::new(naming)).await
    }

    /// Validate the configuration, resolve the registry data source and
    /// initialize the schema if enabled.
    pub async fn start(config: &AppConfig, naming: Arc<dyn NameService>) -> Result<Self> {
        config.validate()?;
        log_config_info(config);

        let provider = Arc::new(ConnectionProvider::new(config.registry.clone(), naming));
        provider.resolve().await?;

        let schema_status = if config.schema.initialize {
            provider.initialize_database().await?;
            SchemaStatus::Initialized
        } else {
            debug!("Schema initialization skipped since schema.initialize is not set");
            SchemaStatus::Skipped
        };

        info!(schema = %schema_status, "Keystore persistence context started");
        Ok(Self { provider, schema_status })
    }

    pub fn provider(&self) -> &Arc<ConnectionProvider> {
        &self.provider
    }

    pub fn schema_status(&self) -> SchemaStatus {
        self.schema_status
    }

    /// Repository sharing this context's connection provider
    pub fn pub_cert_repository(&self) -> SqlxPubCertRepository {
        SqlxPubCertRepository::new(Arc::clone(&self.provider))
    }
}

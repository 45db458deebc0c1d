//! # Data Source Name Service
//!
//! The connection provider never holds credentials itself: it looks up a
//! logical name (for example `jdbc/SHARED_DB`) in a [`NameService`] and receives
//! a [`DataSourceHandle`] back.

use crate::config::DataSourceConfig;
use crate::errors::{KeystoreError, Result};
use crate::storage::pool::{create_pool, DbPool};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument};

/// Handle to a resolved connection pool and the name it was bound under
#[derive(Clone)]
pub struct DataSourceHandle {
    name: String,
    pool: DbPool,
}

impl DataSourceHandle {
    pub fn new<N: Into<String>>(name: N, pool: DbPool) -> Self {
        Self { name: name.into(), pool }
    }

    /// Logical name the handle was resolved from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl fmt::Debug for DataSourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceHandle")
            .field("name", &self.name)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

/// Resolves logical data source names to connection pools
#[async_trait]
pub trait NameService: Send + Sync {
    /// Look up the data source bound under `name`.
    async fn lookup(&self, name: &str) -> Result<DataSourceHandle>;
}

enum Binding {
    Config(DataSourceConfig),
    Pool(DbPool),
}

/// Name service backed by the configured data sources.
///
/// Names bound to a definition get a fresh pool per lookup; the connection
/// provider caches the first successful lookup for its lifetime.
#[derive(Default)]
pub struct DataSourceRegistry {
    bindings: HashMap<String, Binding>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from data source definitions, keyed by their names
    pub fn from_configs<'a, I>(configs: I) -> Self
    where
        I: IntoIterator<Item = &'a DataSourceConfig>,
    {
        let mut registry = Self::new();
        for config in configs {
            registry.bind_config(config.clone());
        }
        registry
    }

    /// Bind a data source definition under its own name
    pub fn bind_config(&mut self, config: DataSourceConfig) -> &mut Self {
        self.bindings.insert(config.name.clone(), Binding::Config(config));
        self
    }

    /// Bind an existing pool under `name`
    pub fn bind_pool<N: Into<String>>(&mut self, name: N, pool: DbPool) -> &mut Self {
        self.bindings.insert(name.into(), Binding::Pool(pool));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

#[async_trait]
impl NameService for DataSourceRegistry {
    #[instrument(skip(self), name = "data_source_lookup")]
    async fn lookup(&self, name: &str) -> Result<DataSourceHandle> {
        match self.bindings.get(name) {
            Some(Binding::Pool(pool)) => {
                debug!(name = %name, "Resolved data source from bound pool");
                Ok(DataSourceHandle::new(name, pool.clone()))
            }
            Some(Binding::Config(config)) => {
                let pool = match create_pool(config).await {
                    Ok(pool) => pool,
                    Err(e @ KeystoreError::Lookup { .. }) => return Err(e),
                    Err(e) => {
                        return Err(KeystoreError::lookup_with_source(
                            name,
                            "Invalid data source definition",
                            Box::new(e),
                        ))
                    }
                };
                Ok(DataSourceHandle::new(name, pool))
            }
            None => Err(KeystoreError::lookup(name, "name is not bound in the name service")),
        }
    }
}

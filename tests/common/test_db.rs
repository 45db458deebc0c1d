//! Test registry utilities for integration tests.
//!
//! Each [`TestRegistry`] lives in its own temporary directory, laid out the way
//! a server configuration directory is: `<conf>/identity/identity.xml` names the
//! data source and a SQLite file backs it.

#![allow(clippy::duplicate_mod)]

use keystore_persistence::config::{AppConfig, DataSourceConfig, RegistryConfig, SchemaConfig};
use keystore_persistence::storage::{ConnectionProvider, DataSourceRegistry, NameService};
use keystore_persistence::{KeystoreContext, SqlxPubCertRepository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Data source name used by the test identity documents
pub const SHARED_DB: &str = "jdbc/SHARED_DB";

/// Identity document naming `data_source` for the registry persistence manager
pub fn identity_xml(data_source: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Server xmlns="http://wso2.org/projects/carbon/carbon.xml">
    <RegistryDataPersistenceManager>
        <DataSource>
            <Name>{data_source}</Name>
        </DataSource>
    </RegistryDataPersistenceManager>
</Server>
"#
    )
}

/// A registry configuration directory that is deleted on drop.
pub struct TestRegistry {
    dir: TempDir,
}

impl TestRegistry {
    /// Create the layout with an identity document naming [`SHARED_DB`].
    pub fn new() -> Self {
        let registry = Self::without_identity();
        registry.write_identity(&identity_xml(SHARED_DB));
        registry
    }

    /// Create the layout without an identity document.
    pub fn without_identity() -> Self {
        let dir = tempfile::tempdir().expect("create test registry directory");
        std::fs::create_dir_all(dir.path().join("conf").join("identity"))
            .expect("create identity directory");
        Self { dir }
    }

    pub fn write_identity(&self, xml: &str) {
        std::fs::write(self.identity_path(), xml).expect("write identity document");
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("conf")
    }

    pub fn identity_path(&self) -> PathBuf {
        self.config_dir().join("identity").join("identity.xml")
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.path().join("SHARED_DB.db")
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig { config_dir: self.config_dir(), ..Default::default() }
    }

    /// SQLite data source bound under [`SHARED_DB`]
    pub fn data_source(&self) -> DataSourceConfig {
        DataSourceConfig {
            max_connections: 4,
            ..DataSourceConfig::new(SHARED_DB, sqlite_url(&self.database_path()))
        }
    }

    pub fn app_config(&self, initialize_schema: bool) -> AppConfig {
        AppConfig {
            registry: self.registry_config(),
            schema: SchemaConfig { initialize: initialize_schema },
            data_sources: vec![self.data_source()],
            ..Default::default()
        }
    }

    /// Provider over the configured data sources, not yet resolved
    pub fn provider(&self) -> Arc<ConnectionProvider> {
        self.provider_with(Arc::new(DataSourceRegistry::from_configs(&[self.data_source()])))
    }

    pub fn provider_with(&self, naming: Arc<dyn NameService>) -> Arc<ConnectionProvider> {
        Arc::new(ConnectionProvider::new(self.registry_config(), naming))
    }

    /// Started context with the schema initialized
    pub async fn context(&self) -> KeystoreContext {
        KeystoreContext::from_config(&self.app_config(true))
            .await
            .expect("start keystore context")
    }

    pub async fn repository(&self) -> SqlxPubCertRepository {
        self.context().await.pub_cert_repository()
    }
}

pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

//! # Registry Connection Provider
//!
//! Single point of access to the shared registry data source. The data source is
//! configured indirectly: the identity configuration document names it, and the
//! [`NameService`] turns that name into a pool. Resolution happens once, on first
//! use, and the handle is kept for the lifetime of the provider.

use crate::config::{read_data_source_name, RegistryConfig};
use crate::errors::{KeystoreError, Result};
use crate::storage::connection::{is_active_transaction_error, IsolationLevel, TransactionalConnection};
use crate::storage::naming::{DataSourceHandle, NameService};
use crate::storage::schema;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

const DB_CONN_RETRIEVAL_ERROR_MSG: &str =
    "Error when getting a database connection object from the shared data source";

/// Hands out connections to the registry data source.
pub struct ConnectionProvider {
    registry: RegistryConfig,
    naming: Arc<dyn NameService>,
    data_source: OnceCell<DataSourceHandle>,
}

impl ConnectionProvider {
    pub fn new(registry: RegistryConfig, naming: Arc<dyn NameService>) -> Self {
        Self { registry, naming, data_source: OnceCell::new() }
    }

    /// Resolve the data source, reading the identity configuration on first call.
    ///
    /// Concurrent first callers wait for a single resolution. A failed resolution
    /// leaves the handle unset; nothing retries it in the background.
    pub async fn resolve(&self) -> Result<&DataSourceHandle> {
        self.data_source
            .get_or_try_init(|| async {
                let path = self.registry.identity_config_path();
                let name = read_data_source_name(&path).inspect_err(|e| {
                    error!(error = %e, path = %path.display(), "Registry data source configuration is unavailable");
                })?;

                let handle = self.naming.lookup(&name).await.inspect_err(|e| {
                    error!(error = %e, data_source = %name, "Error when looking up the registry data source");
                })?;

                info!(data_source = %handle.name(), "Registry data source resolved");
                Ok::<_, KeystoreError>(handle)
            })
            .await
    }

    /// The resolved data source, if resolution already succeeded.
    pub fn data_source(&self) -> Option<&DataSourceHandle> {
        self.data_source.get()
    }

    /// Get a connection from the registry data source.
    ///
    /// With `apply_transaction` the connection is placed in manual-commit mode
    /// with the READ COMMITTED isolation level.
    pub async fn acquire_connection(&self, apply_transaction: bool) -> Result<TransactionalConnection> {
        let handle = self.resolve().await?;

        let conn = handle
            .pool()
            .acquire()
            .await
            .map_err(|e| KeystoreError::connection_retrieval(DB_CONN_RETRIEVAL_ERROR_MSG, e))?;
        let mut conn = TransactionalConnection::new(conn);

        if apply_transaction {
            if let Err(e) = conn.begin().await {
                conn.close().await;
                return Err(KeystoreError::connection_retrieval(
                    "Failed to disable auto-commit on the connection",
                    e,
                ));
            }

            if let Err(e) = Self::apply_isolation(&mut conn, IsolationLevel::ReadCommitted).await {
                conn.close().await;
                return Err(e);
            }
        }

        Ok(conn)
    }

    async fn apply_isolation(conn: &mut TransactionalConnection, level: IsolationLevel) -> Result<()> {
        let Err(e) = conn.set_isolation_level(level).await else {
            return Ok(());
        };

        if !is_active_transaction_error(conn.backend_name(), &e) {
            return Err(KeystoreError::transaction(
                format!("Failed to set transaction isolation level to {}", level),
                e,
            ));
        }

        // The connection carried a transaction that was never committed.
        warn!(
            backend = %conn.backend_name(),
            isolation = %level,
            error = %e,
            "Active SQL transaction on connection; committing before setting isolation level"
        );

        conn.commit()
            .await
            .map_err(|e| KeystoreError::transaction("Failed to commit the active transaction", e))?;
        conn.begin()
            .await
            .map_err(|e| KeystoreError::transaction("Failed to restart the transaction", e))?;
        conn.set_isolation_level(level).await.map_err(|e| {
            KeystoreError::transaction(
                format!("Failed to set transaction isolation level to {} after recovery", level),
                e,
            )
        })
    }

    /// Best-effort commit; failures are logged, not returned.
    pub async fn commit_transaction(&self, conn: Option<&mut TransactionalConnection>) {
        if let Some(conn) = conn {
            if let Err(e) = conn.commit().await {
                error!(error = %e, "An error occurred while committing the transaction");
            }
        }
    }

    /// Best-effort rollback; failures are logged, not returned.
    pub async fn rollback_transaction(&self, conn: Option<&mut TransactionalConnection>) {
        if let Some(conn) = conn {
            if let Err(e) = conn.rollback().await {
                error!(error = %e, "An error occurred while rolling back the transaction");
            }
        }
    }

    /// Create the public certificate table if it does not exist yet.
    pub async fn initialize_database(&self) -> Result<()> {
        let mut conn = self.acquire_connection(false).await?;
        let result = schema::create_schema(&mut conn).await;
        conn.close().await;

        result.map_err(|e| KeystoreError::schema("Failed to create the public certificate table", e))
    }
}

impl fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("identity_config", &self.registry.identity_config_path())
            .field("data_source", &self.data_source.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::naming::DataSourceRegistry;
    use std::path::PathBuf;
    use tracing_test::traced_test;

    fn missing_registry() -> RegistryConfig {
        RegistryConfig {
            config_dir: PathBuf::from("/nonexistent/keystore/conf"),
            identity_file: "identity.xml".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_without_document_fails_with_config_error() {
        let provider = ConnectionProvider::new(missing_registry(), Arc::new(DataSourceRegistry::new()));

        let err = provider.resolve().await.unwrap_err();
        assert!(matches!(err, KeystoreError::Config { .. }));
        assert!(provider.data_source().is_none());
    }

    #[tokio::test]
    async fn test_acquire_without_document_propagates_config_error() {
        let provider = ConnectionProvider::new(missing_registry(), Arc::new(DataSourceRegistry::new()));

        let err = provider.acquire_connection(true).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_helpers_ignore_absent_connection() {
        let provider = ConnectionProvider::new(missing_registry(), Arc::new(DataSourceRegistry::new()));

        provider.commit_transaction(None).await;
        provider.rollback_transaction(None).await;
    }

    async fn sqlite_provider(dir: &tempfile::TempDir) -> ConnectionProvider {
        let identity_dir = dir.path().join("identity");
        std::fs::create_dir_all(&identity_dir).unwrap();
        std::fs::write(
            identity_dir.join("identity.xml"),
            "<Server><RegistryDataPersistenceManager><DataSource><Name>jdbc/SHARED_DB</Name>\
             </DataSource></RegistryDataPersistenceManager></Server>",
        )
        .unwrap();

        let url = format!("sqlite://{}", dir.path().join("shared.db").display());
        let pool = crate::storage::pool::create_pool(&crate::config::DataSourceConfig::new("jdbc/SHARED_DB", url))
            .await
            .unwrap();
        let mut naming = DataSourceRegistry::new();
        naming.bind_pool("jdbc/SHARED_DB", pool);

        let registry = RegistryConfig { config_dir: dir.path().to_path_buf(), ..Default::default() };
        ConnectionProvider::new(registry, Arc::new(naming))
    }

    #[tokio::test]
    #[traced_test]
    async fn test_helpers_log_failures_instead_of_returning() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir).await;

        // End the transaction behind the connection's back so the helpers fail
        let mut conn = provider.acquire_connection(true).await.unwrap();
        sqlx::raw_sql("ROLLBACK").execute(conn.executor().unwrap()).await.unwrap();

        provider.commit_transaction(Some(&mut conn)).await;
        assert!(logs_contain("An error occurred while committing the transaction"));

        provider.rollback_transaction(Some(&mut conn)).await;
        assert!(logs_contain("An error occurred while rolling back the transaction"));
    }

    #[tokio::test]
    async fn test_isolation_failure_is_transaction_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir).await;
        let pool = provider.resolve().await.unwrap().pool().clone();

        // SQLite rejects the statement with a code other than 25001
        let mut conn = TransactionalConnection::with_backend_name(pool.acquire().await.unwrap(), "PostgreSQL");
        conn.begin().await.unwrap();

        let err = ConnectionProvider::apply_isolation(&mut conn, IsolationLevel::ReadCommitted)
            .await
            .unwrap_err();
        assert!(matches!(err, KeystoreError::Transaction { .. }));
        assert!(err.to_string().contains("READ COMMITTED"));
        assert!(conn.in_transaction());

        conn.close().await;
        let mut conn = provider.acquire_connection(true).await.unwrap();
        assert!(conn.in_transaction());
        conn.commit().await.unwrap();
        conn.close().await;
    }

    #[tokio::test]
    async fn test_initialize_database_creates_table() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir).await;

        provider.initialize_database().await.unwrap();

        let pool = provider.data_source().unwrap().pool();
        sqlx::query("SELECT COUNT(*) FROM PUB_CERT").execute(pool).await.unwrap();
    }
}

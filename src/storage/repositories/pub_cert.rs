//! Public certificate repository.
//!
//! Stores certificate blobs under generated identifiers. Records are immutable:
//! there is no update or delete. Each operation borrows its own connection from
//! the [`ConnectionProvider`] and releases it before returning.

use crate::domain::PubCertId;
use crate::errors::{KeystoreError, Result};
use crate::storage::connection::TransactionalConnection;
use crate::storage::provider::ConnectionProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::{debug, instrument};

const ADD_PUB_CERT: &str =
    "INSERT INTO PUB_CERT (ID, FILE_NAME_APPENDER, CONTENT) VALUES ($1, $2, $3)";

const GET_PUB_CERT: &str = r#"
SELECT ID AS id, FILE_NAME_APPENDER AS file_name_appender, CONTENT AS content
FROM PUB_CERT
WHERE ID = $1
LIMIT 1
"#;

// ============================================================================
// Data Types
// ============================================================================

/// Public certificate as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubCertRecord {
    pub id: PubCertId,

    /// Label appended to the exported certificate file name
    pub file_name_appender: String,

    /// Raw certificate bytes
    pub content: Vec<u8>,
}

/// Request to store a new public certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPubCert {
    pub file_name_appender: String,
    pub content: Vec<u8>,
}

impl NewPubCert {
    pub fn new<S: Into<String>>(file_name_appender: S, content: impl Into<Vec<u8>>) -> Self {
        Self { file_name_appender: file_name_appender.into(), content: content.into() }
    }
}

// ============================================================================
// Database Row Type
// ============================================================================

#[derive(Debug, Clone, FromRow)]
struct PubCertRow {
    id: String,
    file_name_appender: String,
    content: Vec<u8>,
}

impl From<PubCertRow> for PubCertRecord {
    fn from(row: PubCertRow) -> Self {
        Self {
            id: PubCertId::from_string(row.id),
            file_name_appender: row.file_name_appender,
            content: row.content,
        }
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait PubCertRepository: Send + Sync {
    /// Store a certificate and return its generated ID.
    async fn add_pub_cert(&self, request: NewPubCert) -> Result<PubCertId>;

    /// Fetch a certificate by ID. Unknown IDs yield `None`.
    async fn get_pub_cert(&self, id: &str) -> Result<Option<PubCertRecord>>;
}

// ============================================================================
// SQLx Implementation
// ============================================================================

#[derive(Debug, Clone)]
pub struct SqlxPubCertRepository {
    provider: Arc<ConnectionProvider>,
}

impl SqlxPubCertRepository {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }

    async fn insert(
        conn: &mut TransactionalConnection,
        id: &PubCertId,
        request: &NewPubCert,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(ADD_PUB_CERT)
            .bind(id.as_str())
            .bind(&request.file_name_appender)
            .bind(&request.content)
            .execute(conn.executor()?)
            .await?;
        Ok(())
    }

    async fn select(
        conn: &mut TransactionalConnection,
        id: &str,
    ) -> std::result::Result<Option<PubCertRow>, sqlx::Error> {
        sqlx::query_as::<_, PubCertRow>(GET_PUB_CERT)
            .bind(id)
            .fetch_optional(conn.executor()?)
            .await
    }
}

#[async_trait]
impl PubCertRepository for SqlxPubCertRepository {
    #[instrument(skip(self, request), fields(file_name_appender = %request.file_name_appender, content_len = request.content.len()), name = "db_add_pub_cert")]
    async fn add_pub_cert(&self, request: NewPubCert) -> Result<PubCertId> {
        let id = PubCertId::new();
        let mut conn = self.provider.acquire_connection(true).await?;

        let outcome = match Self::insert(&mut conn, &id, &request).await {
            Ok(()) => conn.commit().await.map_err(KeystoreError::add_failed),
            Err(e) => {
                self.provider.rollback_transaction(Some(&mut conn)).await;
                Err(KeystoreError::add_failed(e))
            }
        };
        conn.close().await;

        outcome?;
        debug!(id = %id, "Public certificate stored");
        Ok(id)
    }

    #[instrument(skip(self), fields(id = %id), name = "db_get_pub_cert")]
    async fn get_pub_cert(&self, id: &str) -> Result<Option<PubCertRecord>> {
        let mut conn = self.provider.acquire_connection(false).await?;
        let row = Self::select(&mut conn, id).await;
        conn.close().await;

        Ok(row.map_err(KeystoreError::retrieve_failed)?.map(PubCertRecord::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pub_cert_from_slice() {
        let request = NewPubCert::new("cert1", &[0x30u8, 0x82][..]);
        assert_eq!(request.file_name_appender, "cert1");
        assert_eq!(request.content, vec![0x30, 0x82]);
    }

    #[test]
    fn test_row_into_record() {
        let row = PubCertRow {
            id: "3f2a6f1e-16a4-4cf4-9a34-6f0c7b1d2e55".to_string(),
            file_name_appender: "cert1".to_string(),
            content: vec![0x30, 0x82, 0x01],
        };

        let record = PubCertRecord::from(row);
        assert_eq!(record.id.as_str(), "3f2a6f1e-16a4-4cf4-9a34-6f0c7b1d2e55");
        assert_eq!(record.content, vec![0x30, 0x82, 0x01]);
    }

    #[test]
    fn test_queries_use_positional_placeholders() {
        assert!(ADD_PUB_CERT.contains("$3"));
        assert!(GET_PUB_CERT.contains("LIMIT 1"));
    }
}

//! SQL DDL for the public certificate table.
//!
//! Statements are idempotent (`CREATE TABLE IF NOT EXISTS`) and chosen by the
//! backend identity of the connection they run on.

use crate::storage::connection::{TransactionalConnection, POSTGRESQL_DATABASE};
use sqlx::Executor;
use tracing::info;

/// Table holding public certificate blobs
pub const PUB_CERT_TABLE: &str = "PUB_CERT";

pub const POSTGRES_PUB_CERT_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS PUB_CERT (
    ID VARCHAR(255) NOT NULL,
    FILE_NAME_APPENDER VARCHAR(255) NOT NULL,
    CONTENT BYTEA NOT NULL,
    PRIMARY KEY (ID)
)
"#;

pub const SQLITE_PUB_CERT_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS PUB_CERT (
    ID VARCHAR(255) NOT NULL,
    FILE_NAME_APPENDER VARCHAR(255) NOT NULL,
    CONTENT BLOB NOT NULL,
    PRIMARY KEY (ID)
)
"#;

/// DDL for the given backend identity
pub fn pub_cert_ddl(backend_name: &str) -> &'static str {
    if backend_name.contains(POSTGRESQL_DATABASE) {
        POSTGRES_PUB_CERT_DDL
    } else {
        SQLITE_PUB_CERT_DDL
    }
}

/// Create the public certificate table on the given connection.
pub async fn create_schema(conn: &mut TransactionalConnection) -> Result<(), sqlx::Error> {
    let ddl = pub_cert_ddl(conn.backend_name());
    conn.executor()?.execute(ddl).await?;
    info!(table = PUB_CERT_TABLE, backend = %conn.backend_name(), "Public certificate schema ensured");
    Ok(())
}

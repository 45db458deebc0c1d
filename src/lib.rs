//! # Keystore Persistence
//!
//! Persistence layer for the keystore component of an identity server. It hands
//! out transactional connections to the shared registry database and stores
//! public certificates in that database.
//!
//! ## Architecture
//!
//! ```text
//! identity.xml ──▶ ConnectionProvider ──▶ NameService ──▶ Pool<Any>
//!                          │
//!                          ▼
//!                 SqlxPubCertRepository ──▶ PUB_CERT table
//! ```
//!
//! - **Connection Provider**: resolves the registry data source once, from the
//!   name in the identity configuration, and opens manual-commit connections
//! - **Certificate Store**: immutable certificate records keyed by generated IDs
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use keystore_persistence::{AppConfig, KeystoreContext, NewPubCert, PubCertRepository, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let context = KeystoreContext::from_config(&config).await?;
//!     let certs = context.pub_cert_repository();
//!
//!     let id = certs.add_pub_cert(NewPubCert::new("cert1", vec![0x30u8, 0x82])).await?;
//!     let stored = certs.get_pub_cert(id.as_str()).await?;
//!     assert!(stored.is_some());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use context::{KeystoreContext, SchemaStatus};
pub use domain::PubCertId;
pub use errors::{KeystoreError, Result};
pub use observability::init_logging;
pub use storage::{
    ConnectionProvider, NameService, NewPubCert, PubCertRecord, PubCertRepository,
    SqlxPubCertRepository, TransactionalConnection,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

//! # Storage and Persistence
//!
//! Connection management for the shared registry data source and the
//! repositories built on top of it.

pub mod connection;
pub mod naming;
pub mod pool;
pub mod provider;
pub mod repositories;
pub mod schema;

pub use connection::{IsolationLevel, TransactionalConnection};
pub use naming::{DataSourceHandle, DataSourceRegistry, NameService};
pub use pool::{create_pool, DbPool};
pub use provider::ConnectionProvider;
pub use repositories::{NewPubCert, PubCertRecord, PubCertRepository, SqlxPubCertRepository};

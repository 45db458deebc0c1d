//! Repository modules for data access
//!
//! Each repository handles the persistence operations for a specific resource type.

pub mod pub_cert;

pub use pub_cert::{NewPubCert, PubCertRecord, PubCertRepository, SqlxPubCertRepository};

//! Domain types shared by the storage layer.

pub mod id;

pub use id::PubCertId;

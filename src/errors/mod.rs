//! # Error Handling
//!
//! Closed set of error kinds for the keystore persistence layer. Callers match on
//! [`KeystoreError`] variants to tell infrastructure failures apart from missing data.

mod types;

pub use types::{BoxError, KeystoreError, PersistenceOperation, Result};

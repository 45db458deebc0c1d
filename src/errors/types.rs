//! # Error Types
//!
//! Error types for the keystore persistence layer using `thiserror`.

use std::fmt;

/// Custom result type for keystore persistence operations
pub type Result<T> = std::result::Result<T, KeystoreError>;

/// Boxed cause attached to configuration and lookup failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the keystore persistence layer
#[derive(thiserror::Error, Debug)]
pub enum KeystoreError {
    /// Identity configuration document or a required section is missing
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Name-service resolution of the data source failed
    #[error("Error when looking up the registry data source '{name}': {message}")]
    Lookup {
        name: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A connection could not be obtained from a resolved data source
    #[error("Error while getting the DB connection: {context}")]
    ConnectionRetrieval {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Transaction properties could not be applied to a connection
    #[error("Transaction error: {context}")]
    Transaction {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Public certificate persistence failure
    #[error("{operation}")]
    Persistence {
        operation: PersistenceOperation,
        #[source]
        source: sqlx::Error,
    },

    /// Schema initialization failure
    #[error("Schema initialization error: {context}")]
    Schema {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Configuration validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },
}

/// Public certificate operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOperation {
    Add,
    Retrieve,
}

impl fmt::Display for PersistenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceOperation::Add => write!(f, "Error while adding public certificate"),
            PersistenceOperation::Retrieve => {
                write!(f, "Error while retrieving public certificate")
            }
        }
    }
}

impl KeystoreError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(message: S, source: BoxError) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a lookup error for an unbound or unusable name
    pub fn lookup<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::Lookup {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a lookup error with source
    pub fn lookup_with_source<N: Into<String>, S: Into<String>>(
        name: N,
        message: S,
        source: BoxError,
    ) -> Self {
        Self::Lookup {
            name: name.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a connection retrieval error
    pub fn connection_retrieval<S: Into<String>>(context: S, source: sqlx::Error) -> Self {
        Self::ConnectionRetrieval {
            context: context.into(),
            source,
        }
    }

    /// Create a transaction error
    pub fn transaction<S: Into<String>>(context: S, source: sqlx::Error) -> Self {
        Self::Transaction {
            context: context.into(),
            source,
        }
    }

    /// Create an "add failed" persistence error
    pub fn add_failed(source: sqlx::Error) -> Self {
        Self::Persistence {
            operation: PersistenceOperation::Add,
            source,
        }
    }

    /// Create a "retrieve failed" persistence error
    pub fn retrieve_failed(source: sqlx::Error) -> Self {
        Self::Persistence {
            operation: PersistenceOperation::Retrieve,
            source,
        }
    }

    /// Create a schema initialization error
    pub fn schema<S: Into<String>>(context: S, source: sqlx::Error) -> Self {
        Self::Schema {
            context: context.into(),
            source,
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Infrastructure failures that abort provider initialization
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KeystoreError::Config { .. }
                | KeystoreError::Lookup { .. }
                | KeystoreError::Validation { .. }
        )
    }

    /// Check if the caller may retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, KeystoreError::ConnectionRetrieval { .. })
    }
}

impl From<config::ConfigError> for KeystoreError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for KeystoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

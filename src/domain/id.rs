//! Domain ID Types with NewType Pattern
//!
//! Type-safe wrapper for public certificate identifiers. IDs are generated as
//! hyphenated UUID v4 strings and stored as plain text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier of a stored public certificate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PubCertId(String);

impl PubCertId {
    /// Create a new ID from a UUID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create an ID from an existing string (for database retrieval)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to inner string value
    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse and validate a UUID string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s)?;
        Ok(Self(s.to_string()))
    }
}

impl Default for PubCertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PubCertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PubCertId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PubCertId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<PubCertId> for String {
    fn from(id: PubCertId) -> Self {
        id.0
    }
}

//! # Observability Infrastructure
//!
//! Structured logging for the keystore persistence layer.

pub mod logging;

pub use logging::{init_logging, log_config_info};

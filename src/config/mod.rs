//! # Configuration Management
//!
//! Application settings (loaded with the `config` crate and validated with
//! `validator`) and the identity configuration document that names the shared
//! registry data source.

pub mod identity;
pub mod settings;

pub use identity::{read_data_source_name, DEFAULT_NAMESPACE, IDENTITY_CONFIG};
pub use settings::{
    AppConfig, DataSourceConfig, ObservabilityConfig, RegistryConfig, SchemaConfig,
};

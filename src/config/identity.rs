//! # Identity Configuration Document
//!
//! Reads the registry data source name out of the identity configuration
//! document (`identity.xml`). Only the
//! `RegistryDataPersistenceManager/DataSource/Name` path is interpreted; the
//! rest of the document is ignored.

use crate::errors::{KeystoreError, Result};
use roxmltree::{Document, Node};
use std::path::Path;
use tracing::debug;

/// Default file name of the identity configuration document
pub const IDENTITY_CONFIG: &str = "identity.xml";

/// Namespace of the identity configuration elements
pub const DEFAULT_NAMESPACE: &str = "http://wso2.org/projects/carbon/carbon.xml";

pub const PERSISTENCE_MANAGER: &str = "RegistryDataPersistenceManager";
pub const DATA_SOURCE: &str = "DataSource";
pub const NAME: &str = "Name";

/// Read the identity configuration document and return the configured data source name.
pub fn read_data_source_name(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(KeystoreError::config(format!(
            "Registry Data Persistence Manager configuration is not available: {} does not exist. \
             Terminating the initialization. This may affect certain functionality.",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|e| {
        KeystoreError::config_with_source(
            format!("Error while reading identity configuration file {}", path.display()),
            Box::new(e),
        )
    })?;

    let name = parse_data_source_name(&text)?;
    debug!(path = %path.display(), data_source = %name, "Read registry data source name");
    Ok(name)
}

/// Extract the data source name from identity configuration XML text.
pub fn parse_data_source_name(xml: &str) -> Result<String> {
    let document = Document::parse(xml).map_err(|e| {
        KeystoreError::config_with_source("Error while parsing identity configuration file", Box::new(e))
    })?;

    let manager = first_child_named(document.root_element(), PERSISTENCE_MANAGER).ok_or_else(|| {
        KeystoreError::config(
            "Registry Data Persistence Manager configuration is not available in identity.xml file. \
             Terminating the initialization. This may affect certain functionality.",
        )
    })?;

    let data_source = first_child_named(manager, DATA_SOURCE).ok_or_else(|| {
        KeystoreError::config(
            "DataSource Element is not available for Registry Data Persistence Manager in \
             identity.xml file. Terminating the Registry Data Persistence Manager initialization. \
             This might affect certain features.",
        )
    })?;

    let name = first_child_named(data_source, NAME)
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            KeystoreError::config(
                "DataSource Name is not configured for Registry Data Persistence Manager in \
                 identity.xml file.",
            )
        })?;

    Ok(name.to_string())
}

/// Elements match on local name in the default namespace or in no namespace.
fn first_child_named<'a, 'input>(node: Node<'a, 'input>, local_name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| {
        child.is_element()
            && child.tag_name().name() == local_name
            && child.tag_name().namespace().map_or(true, |ns| ns == DEFAULT_NAMESPACE)
    })
}

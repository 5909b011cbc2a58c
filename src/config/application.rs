//! Per-application configuration

use serde::{Deserialize, Serialize};

/// Configuration block for one application
///
/// Embedded in an origin rule; the orchestrator hands it to every
/// module when the application is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Plain application name (the part after `#` in the canonical name)
    pub name: String,
}

impl ApplicationConfig {
    /// Create an application config with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

//! Virtual host descriptors

use serde::{Deserialize, Serialize};

use super::origin::OriginConfig;

/// A domain name pattern selecting a virtual host
///
/// Patterns are glob-style: `*` matches any run of characters and `?`
/// at most one (e.g. "*.example.com").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// The pattern itself
    pub name: String,
}

impl DomainConfig {
    /// Create a domain pattern
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Desired configuration of one virtual host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Unique virtual host name (e.g. "default")
    pub name: String,

    /// Domain patterns, matched in declaration order
    #[serde(default)]
    pub domains: Vec<DomainConfig>,

    /// Origin pull rules, matched in declaration order
    #[serde(default)]
    pub origins: Vec<OriginConfig>,
}

impl HostConfig {
    /// Create an empty host descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domains: Vec::new(),
            origins: Vec::new(),
        }
    }

    /// Add a domain pattern
    pub fn domain(mut self, name: impl Into<String>) -> Self {
        self.domains.push(DomainConfig::new(name));
        self
    }

    /// Add an origin rule
    pub fn origin(mut self, origin: OriginConfig) -> Self {
        self.origins.push(origin);
        self
    }
}

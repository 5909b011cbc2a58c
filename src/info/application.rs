//! Application descriptors

use crate::config::ApplicationConfig;

/// Process-wide application identifier
pub type ApplicationId = u32;

/// First application ID handed out by the orchestrator
///
/// IDs below this value are reserved for engine-internal applications.
pub const MIN_APPLICATION_ID: ApplicationId = 100;

/// Separator between the virtual host and application parts of a
/// canonical application name (`vhost#app`)
///
/// The `#`-separated form is the externally visible identity of an
/// application and appears in log lines and inter-module messages.
pub const APP_NAME_DELIMITER: char = '#';

/// Identity and configuration of a created application
///
/// Handed to every module during create/delete fan-out and carried by
/// streams back-referencing their owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    /// Process-wide unique ID, monotonically increasing
    pub id: ApplicationId,

    /// Name of the owning virtual host
    pub vhost_name: String,

    /// Plain application name (e.g. "live")
    pub name: String,

    /// Canonical `vhost#app` name
    pub full_name: String,

    /// The configuration this application was created from
    pub config: ApplicationConfig,
}

impl ApplicationInfo {
    /// Create a new application descriptor
    pub fn new(id: ApplicationId, vhost_name: impl Into<String>, config: ApplicationConfig) -> Self {
        let vhost_name = vhost_name.into();
        let full_name = format!("{}{}{}", vhost_name, APP_NAME_DELIMITER, config.name);

        Self {
            id,
            name: config.name.clone(),
            full_name,
            vhost_name,
            config,
        }
    }
}

impl std::fmt::Display for ApplicationInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.full_name, self.id)
    }
}

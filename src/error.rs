//! Crate-wide error types
//!
//! Error values surfaced by the orchestrator's public operations.

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for orchestrator operations
#[derive(Debug, Clone)]
pub enum Error {
    /// No registered provider handles the URL scheme
    SchemeUnsupported(String),
    /// The domain does not select a virtual host, or a `vhost#app` name is malformed
    NameUnresolved(String),
    /// The virtual host is not known to the orchestrator
    VirtualHostNotFound(String),
    /// The application does not exist in its virtual host
    ApplicationNotFound(String),
    /// The URL could not be parsed
    InvalidUrl(String),
    /// No origin rule matched the requested location
    LocationNotMatched(String),
    /// Every candidate URL was rejected by its provider
    PullFailed(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SchemeUnsupported(scheme) => {
                write!(f, "No provider for scheme: {}", scheme)
            }
            Error::NameUnresolved(name) => write!(f, "Could not resolve name: {}", name),
            Error::VirtualHostNotFound(name) => write!(f, "Virtual host not found: {}", name),
            Error::ApplicationNotFound(name) => write!(f, "Application not found: {}", name),
            Error::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            Error::LocationNotMatched(path) => {
                write!(f, "No origin rule matched location: {}", path)
            }
            Error::PullFailed(name) => write!(f, "All pull candidates rejected for: {}", name),
        }
    }
}

impl std::error::Error for Error {}

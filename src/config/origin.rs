//! Origin pull rules

use serde::{Deserialize, Serialize};

use super::application::ApplicationConfig;

/// Upstream pass block: the scheme and ordered URL list shared by one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassConfig {
    /// URL scheme the upstream list speaks (e.g. "rtmp", "ovt")
    pub scheme: String,

    /// Ordered upstream URLs, tried first to last
    ///
    /// Stored exactly as configured. A URL without a scheme gets the
    /// pass scheme prepended at dispatch time, never here.
    pub urls: Vec<String>,
}

/// A single origin rule binding a location prefix to upstream URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginConfig {
    /// URL-path prefix this rule answers for (e.g. "/live")
    pub location: String,

    /// Upstream scheme and URL list
    pub pass: PassConfig,

    /// Application created for this rule
    pub application: ApplicationConfig,
}

impl OriginConfig {
    /// Create an origin rule
    ///
    /// The embedded application name defaults to the first path segment
    /// of `location`; override it with [`OriginConfig::application`].
    pub fn new<S, I>(location: impl Into<String>, scheme: impl Into<String>, urls: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let location = location.into();
        let app_name = first_segment(&location).to_string();

        Self {
            location,
            pass: PassConfig {
                scheme: scheme.into(),
                urls: urls.into_iter().map(Into::into).collect(),
            },
            application: ApplicationConfig::new(app_name),
        }
    }

    /// Override the embedded application config
    pub fn application(mut self, application: ApplicationConfig) -> Self {
        self.application = application;
        self
    }
}

/// First path segment of a location (e.g. "/live/backup" -> "live")
fn first_segment(location: &str) -> &str {
    location
        .trim_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
}

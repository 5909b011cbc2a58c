//! Origin pull rules (live state)

use std::collections::HashMap;

use crate::config::OriginConfig;
use crate::info::ApplicationId;

use super::state::ItemState;
use super::stream::Stream;

/// A live origin rule: a location prefix bound to upstream URLs
pub struct Origin {
    /// Application created for this rule; 0 until the first successful
    /// apply
    pub app_id: ApplicationId,

    /// Upstream scheme
    pub scheme: String,

    /// URL-path prefix (e.g. "/live")
    pub location: String,

    /// Upstream URLs exactly as configured; a missing scheme is
    /// prepended at dispatch time only
    pub url_list: Vec<String>,

    /// The configuration this rule came from
    pub config: OriginConfig,

    /// Streams pulled because of this origin rule
    pub stream_map: HashMap<u32, Stream>,

    /// Reconciliation state
    pub state: ItemState,
}

impl Origin {
    /// Create a live origin from its configuration
    pub fn new(config: &OriginConfig) -> Self {
        Self {
            app_id: 0,
            scheme: config.pass.scheme.clone(),
            location: config.location.clone(),
            url_list: config.pass.urls.clone(),
            config: config.clone(),
            stream_map: HashMap::new(),
            state: ItemState::New,
        }
    }

    /// Whether the incoming rule differs in scheme or URL list
    ///
    /// Order matters: a reordered URL list is a change.
    pub fn differs_from(&self, config: &OriginConfig) -> bool {
        self.scheme != config.pass.scheme || self.url_list != config.pass.urls
    }

    /// Replace this rule's upstream values with the incoming ones,
    /// keeping the assigned application so apply can release it first
    pub fn adopt(&mut self, config: &OriginConfig) {
        self.scheme = config.pass.scheme.clone();
        self.url_list = config.pass.urls.clone();
        self.config = config.clone();
    }

    /// Whether this rule's location is a path-segment prefix of `path`
    pub fn matches_path(&self, path: &str) -> bool {
        let location = normalized(&self.location);
        if location == "/" {
            return path.starts_with('/');
        }

        match path.strip_prefix(location) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }
}

impl std::fmt::Debug for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Origin")
            .field("location", &self.location)
            .field("scheme", &self.scheme)
            .field("app_id", &self.app_id)
            .field("state", &self.state)
            .field("streams", &self.stream_map.len())
            .finish_non_exhaustive()
    }
}

/// Strip a trailing slash so "/live/" and "/live" match the same paths
fn normalized(location: &str) -> &str {
    match location.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(location: &str) -> Origin {
        Origin::new(&OriginConfig::new(location, "rtmp", ["rtmp://src/app"]))
    }

    #[test]
    fn test_segment_prefix_matching() {
        let rule = origin("/live");

        assert!(rule.matches_path("/live"));
        assert!(rule.matches_path("/live/stream1"));
        assert!(!rule.matches_path("/livestream"));
        assert!(!rule.matches_path("/vod/stream1"));
    }

    #[test]
    fn test_trailing_slash_location() {
        let rule = origin("/live/");

        assert!(rule.matches_path("/live/stream1"));
        assert!(!rule.matches_path("/livestream"));
    }

    #[test]
    fn test_root_location_matches_everything() {
        let rule = origin("/");

        assert!(rule.matches_path("/live/stream1"));
        assert!(rule.matches_path("/vod"));
    }

    #[test]
    fn test_differs_from() {
        let rule = origin("/live");

        assert!(!rule.differs_from(&OriginConfig::new("/live", "rtmp", ["rtmp://src/app"])));
        assert!(rule.differs_from(&OriginConfig::new("/live", "ovt", ["rtmp://src/app"])));
        assert!(rule.differs_from(&OriginConfig::new("/live", "rtmp", ["rtmp://src/other"])));
        assert!(rule.differs_from(&OriginConfig::new(
            "/live",
            "rtmp",
            ["rtmp://src/app", "rtmp://src/backup"]
        )));
    }
}

//! Name resolution
//!
//! Resolves client-facing names (domains, canonical `vhost#app`
//! application names, and origin locations) against the virtual-host
//! tree.

use crate::error::{Error, Result};
use crate::info::{ApplicationInfo, APP_NAME_DELIMITER};

use super::Orchestrator;

/// Build the canonical `vhost#app` application name
pub fn resolve_application_name(vhost_name: &str, app_name: &str) -> String {
    format!("{}{}{}", vhost_name, APP_NAME_DELIMITER, app_name)
}

/// Split a canonical `vhost#app` name at its first `#`
pub fn parse_vhost_app_name(vhost_app_name: &str) -> Result<(String, String)> {
    match vhost_app_name.split_once(APP_NAME_DELIMITER) {
        Some((vhost, app)) => Ok((vhost.to_string(), app.to_string())),
        None => Err(Error::NameUnresolved(vhost_app_name.to_string())),
    }
}

/// One pull candidate produced by origin-rule matching
pub(super) struct LocationMatch {
    /// Fully qualified URL with the stream name appended
    pub(super) url: String,

    /// Location of the origin rule that contributed the URL
    pub(super) location: String,
}

impl Orchestrator {
    /// Name of the first virtual host whose domain patterns match
    ///
    /// Hosts are scanned in configuration order, patterns in
    /// declaration order.
    pub async fn vhost_name_from_domain(&self, domain: &str) -> Option<String> {
        let vhosts = self.vhosts.read().await;

        vhosts
            .iter()
            .find(|host| host.domain_list.iter().any(|d| d.matches(domain)))
            .map(|host| host.name.clone())
    }

    /// Canonical application name for a domain/app pair
    pub async fn resolve_application_name_from_domain(
        &self,
        domain: &str,
        app_name: &str,
    ) -> Result<String> {
        let vhost_name = self
            .vhost_name_from_domain(domain)
            .await
            .ok_or_else(|| Error::NameUnresolved(domain.to_string()))?;

        Ok(resolve_application_name(&vhost_name, app_name))
    }

    /// Look up a created application by its canonical name
    pub async fn get_application(&self, vhost_app_name: &str) -> Result<ApplicationInfo> {
        let (vhost_name, app_name) = parse_vhost_app_name(vhost_app_name)?;
        let vhosts = self.vhosts.read().await;

        vhosts
            .iter()
            .find(|h| h.name == vhost_name)
            .ok_or_else(|| Error::VirtualHostNotFound(vhost_name.clone()))?
            .app_by_name(&app_name)
            .map(|app| app.info.clone())
            .ok_or_else(|| Error::ApplicationNotFound(vhost_app_name.to_string()))
    }

    /// Effective pull URLs for a stream, derived from origin rules
    ///
    /// See [`Orchestrator::request_pull_stream`] for the matching rules.
    pub async fn url_list_for_location(
        &self,
        vhost_app_name: &str,
        stream_name: &str,
    ) -> Result<Vec<String>> {
        let (_, matches) = self.location_matches(vhost_app_name, stream_name).await?;
        if matches.is_empty() {
            return Err(Error::LocationNotMatched(format!(
                "{}/{}",
                vhost_app_name, stream_name
            )));
        }

        Ok(matches.into_iter().map(|m| m.url).collect())
    }

    /// Resolve a `vhost#app` + stream name into ordered pull candidates
    ///
    /// The requested path is `/<app>/<stream>`. An origin matches when
    /// its location is a path-segment prefix of that path; the longest
    /// location wins and declaration order breaks ties. Every matching
    /// origin contributes its URL list in order, best match first.
    pub(super) async fn location_matches(
        &self,
        vhost_app_name: &str,
        stream_name: &str,
    ) -> Result<(ApplicationInfo, Vec<LocationMatch>)> {
        let (vhost_name, app_name) = parse_vhost_app_name(vhost_app_name)?;
        let vhosts = self.vhosts.read().await;

        let host = vhosts
            .iter()
            .find(|h| h.name == vhost_name)
            .ok_or_else(|| Error::VirtualHostNotFound(vhost_name.clone()))?;
        let app_info = host
            .app_by_name(&app_name)
            .map(|app| app.info.clone())
            .ok_or_else(|| Error::ApplicationNotFound(vhost_app_name.to_string()))?;

        let path = format!("/{}/{}", app_name, stream_name);

        let mut matched: Vec<_> = host
            .origin_list
            .iter()
            .filter(|origin| origin.matches_path(&path))
            .collect();
        // Stable sort keeps declaration order for equal lengths
        matched.sort_by_key(|origin| {
            std::cmp::Reverse(origin.location.trim_end_matches('/').len())
        });

        let mut candidates = Vec::new();
        for origin in matched {
            for url in &origin.url_list {
                candidates.push(LocationMatch {
                    url: qualify_url(url, &origin.scheme, stream_name),
                    location: origin.location.clone(),
                });
            }
        }

        Ok((app_info, candidates))
    }
}

/// Prepend the origin scheme when the configured URL has none, and
/// append the stream name
fn qualify_url(url: &str, scheme: &str, stream_name: &str) -> String {
    let base = if url.contains("://") {
        url.to_string()
    } else {
        format!("{}://{}", scheme, url)
    };

    format!("{}/{}", base.trim_end_matches('/'), stream_name)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{HostConfig, OriginConfig};

    async fn configured() -> Arc<Orchestrator> {
        let orchestrator = Arc::new(Orchestrator::new());
        let snapshot = vec![HostConfig::new("h1")
            .domain("*.example.com")
            .origin(OriginConfig::new("/live", "rtmp", ["rtmp://src/app"]))];
        assert!(orchestrator.apply_origin_map(&snapshot).await);
        orchestrator
    }

    #[test]
    fn test_canonical_name_roundtrip() {
        for (vhost, app) in [("h1", "live"), ("default", "app/with/slash"), ("v", "a")] {
            let canonical = resolve_application_name(vhost, app);
            let (v, a) = parse_vhost_app_name(&canonical).unwrap();
            assert_eq!((v.as_str(), a.as_str()), (vhost, app));
        }
    }

    #[test]
    fn test_parse_rejects_missing_delimiter() {
        assert!(matches!(
            parse_vhost_app_name("no-delimiter"),
            Err(Error::NameUnresolved(_))
        ));
    }

    #[test]
    fn test_parse_splits_on_first_delimiter() {
        let (vhost, app) = parse_vhost_app_name("h1#app#extra").unwrap();
        assert_eq!(vhost, "h1");
        assert_eq!(app, "app#extra");
    }

    #[tokio::test]
    async fn test_vhost_from_domain() {
        let orchestrator = configured().await;

        assert_eq!(
            orchestrator.vhost_name_from_domain("a.example.com").await,
            Some("h1".to_string())
        );
        assert_eq!(orchestrator.vhost_name_from_domain("other.org").await, None);
    }

    #[tokio::test]
    async fn test_resolve_from_domain() {
        let orchestrator = configured().await;

        assert_eq!(
            orchestrator
                .resolve_application_name_from_domain("a.example.com", "live")
                .await
                .unwrap(),
            "h1#live"
        );
        assert!(orchestrator
            .resolve_application_name_from_domain("other.org", "live")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_first_matching_host_wins() {
        let orchestrator = Arc::new(Orchestrator::new());
        let snapshot = vec![
            HostConfig::new("h1").domain("*.example.com"),
            HostConfig::new("h2").domain("a.example.com"),
        ];
        assert!(orchestrator.apply_origin_map(&snapshot).await);

        // h1's wildcard is scanned first
        assert_eq!(
            orchestrator.vhost_name_from_domain("a.example.com").await,
            Some("h1".to_string())
        );
    }

    #[tokio::test]
    async fn test_url_list_for_location() {
        let orchestrator = configured().await;

        let urls = orchestrator
            .url_list_for_location("h1#live", "stream1")
            .await
            .unwrap();
        assert_eq!(urls, vec!["rtmp://src/app/stream1".to_string()]);

        assert!(matches!(
            orchestrator.url_list_for_location("h1#vod", "stream1").await,
            Err(Error::ApplicationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_no_rule_answers_for_path() {
        let orchestrator = Arc::new(Orchestrator::new());
        // The application is named "tv" but the rule answers for /live
        let snapshot = vec![HostConfig::new("h1").origin(
            OriginConfig::new("/live", "rtmp", ["rtmp://src/app"])
                .application(crate::config::ApplicationConfig::new("tv")),
        )];
        assert!(orchestrator.apply_origin_map(&snapshot).await);

        assert!(matches!(
            orchestrator.url_list_for_location("h1#tv", "stream1").await,
            Err(Error::LocationNotMatched(_))
        ));
    }

    #[tokio::test]
    async fn test_scheme_prepended_for_bare_urls() {
        let orchestrator = Arc::new(Orchestrator::new());
        let snapshot = vec![HostConfig::new("h1")
            .origin(OriginConfig::new("/live", "ovt", ["origin:9000/app"]))];
        assert!(orchestrator.apply_origin_map(&snapshot).await);

        let urls = orchestrator
            .url_list_for_location("h1#live", "stream1")
            .await
            .unwrap();
        assert_eq!(urls, vec!["ovt://origin:9000/app/stream1".to_string()]);
    }

    #[tokio::test]
    async fn test_longest_location_wins() {
        let orchestrator = Arc::new(Orchestrator::new());
        let snapshot = vec![HostConfig::new("h1")
            .origin(OriginConfig::new("/live", "rtmp", ["rtmp://general/app"]))
            .origin(
                OriginConfig::new("/live/premium", "rtmp", ["rtmp://premium/app"])
                    .application(crate::config::ApplicationConfig::new("live")),
            )];
        assert!(orchestrator.apply_origin_map(&snapshot).await);

        let urls = orchestrator
            .url_list_for_location("h1#live", "premium/stream1")
            .await
            .unwrap();
        // Both rules match; the more specific one is tried first
        assert_eq!(
            urls,
            vec![
                "rtmp://premium/app/premium/stream1".to_string(),
                "rtmp://general/app/premium/stream1".to_string(),
            ]
        );
    }
}

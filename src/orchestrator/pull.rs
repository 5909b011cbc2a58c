//! Pull-stream dispatch
//!
//! Resolves a pull request into candidate URLs, picks the provider for
//! each URL's scheme, and issues the pull. Two entry points share the
//! pipeline: an explicit-URL form for ad-hoc pulls and a location form
//! that derives URLs from matching origin rules.

use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};
use crate::info::ApplicationInfo;
use crate::module::Module;
use crate::stats::StatCounters;

use super::resolve::parse_vhost_app_name;
use super::{Orchestrator, OwnerRule, PendingPull};

impl Orchestrator {
    /// Pull a stream from an explicit URL
    ///
    /// The stream is attributed to the first domain pattern of the
    /// virtual host that matches the URL's host, if any.
    pub async fn request_pull_stream_with_url(
        &self,
        vhost_app_name: &str,
        stream_name: &str,
        url: &str,
        offset: i64,
    ) -> Result<()> {
        StatCounters::bump(&self.counters.pulls_requested);

        let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        let (vhost_name, app_name) = parse_vhost_app_name(vhost_app_name)?;

        let (app_info, owner) = {
            let vhosts = self.vhosts.read().await;
            let host = vhosts
                .iter()
                .find(|h| h.name == vhost_name)
                .ok_or_else(|| Error::VirtualHostNotFound(vhost_name.clone()))?;
            let app_info = host
                .app_by_name(&app_name)
                .map(|app| app.info.clone())
                .ok_or_else(|| Error::ApplicationNotFound(vhost_app_name.to_string()))?;

            let owner = parsed.host_str().and_then(|url_host| {
                host.domain_list
                    .iter()
                    .find(|d| d.matches(url_host))
                    .map(|d| OwnerRule::Domain {
                        name: d.name.clone(),
                    })
            });

            (app_info, owner)
        };

        let module = self
            .provider_for_scheme(parsed.scheme())
            .await
            .ok_or_else(|| Error::SchemeUnsupported(parsed.scheme().to_string()))?;
        let Some(provider) = module.as_provider() else {
            return Err(Error::SchemeUnsupported(parsed.scheme().to_string()));
        };

        if provider
            .pull_stream(&app_info, stream_name, &parsed, offset)
            .await
        {
            if let Some(owner) = owner {
                self.record_pending(&app_info, stream_name, owner, Arc::clone(&module))
                    .await;
            }
            StatCounters::bump(&self.counters.pulls_succeeded);
            tracing::info!(app = %app_info, stream = %stream_name, url = %parsed, "Pull accepted");
            return Ok(());
        }

        Err(Error::PullFailed(format!(
            "{}/{}",
            vhost_app_name, stream_name
        )))
    }

    /// Pull a stream using the URLs derived from matching origin rules
    ///
    /// Candidates are tried in order; the first provider that accepts
    /// wins and its origin rule becomes the stream's owner.
    pub async fn request_pull_stream(
        &self,
        vhost_app_name: &str,
        stream_name: &str,
        offset: i64,
    ) -> Result<()> {
        StatCounters::bump(&self.counters.pulls_requested);

        let (app_info, candidates) = self.location_matches(vhost_app_name, stream_name).await?;
        if candidates.is_empty() {
            return Err(Error::LocationNotMatched(format!(
                "{}/{}",
                vhost_app_name, stream_name
            )));
        }

        let mut missing_scheme: Option<String> = None;
        let mut provider_seen = false;

        for candidate in &candidates {
            let parsed = match Url::parse(&candidate.url) {
                Ok(parsed) => parsed,
                Err(_) => {
                    tracing::warn!(url = %candidate.url, "Skipping unparsable origin URL");
                    continue;
                }
            };

            let Some(module) = self.provider_for_scheme(parsed.scheme()).await else {
                tracing::warn!(scheme = %parsed.scheme(), "No provider for scheme");
                missing_scheme.get_or_insert_with(|| parsed.scheme().to_string());
                continue;
            };
            provider_seen = true;

            let Some(provider) = module.as_provider() else {
                continue;
            };
            if provider
                .pull_stream(&app_info, stream_name, &parsed, offset)
                .await
            {
                self.record_pending(
                    &app_info,
                    stream_name,
                    OwnerRule::Origin {
                        location: candidate.location.clone(),
                    },
                    Arc::clone(&module),
                )
                .await;
                StatCounters::bump(&self.counters.pulls_succeeded);
                tracing::info!(
                    app = %app_info,
                    stream = %stream_name,
                    url = %parsed,
                    "Pull accepted"
                );
                return Ok(());
            }

            tracing::warn!(url = %parsed, "Provider rejected pull; trying next candidate");
        }

        match missing_scheme {
            Some(scheme) if !provider_seen => Err(Error::SchemeUnsupported(scheme)),
            _ => Err(Error::PullFailed(format!(
                "{}/{}",
                vhost_app_name, stream_name
            ))),
        }
    }

    /// Remember which rule caused a successful pull so the stream can
    /// be attributed when the media router reports it
    async fn record_pending(
        &self,
        app_info: &ApplicationInfo,
        stream_name: &str,
        owner: OwnerRule,
        provider: Arc<dyn Module>,
    ) {
        let pending = PendingPull {
            vhost_name: app_info.vhost_name.clone(),
            owner,
            full_name: format!("{}/{}", app_info.full_name, stream_name),
            provider,
        };

        self.pending_pulls
            .lock()
            .await
            .insert((app_info.id, stream_name.to_string()), pending);
    }
}

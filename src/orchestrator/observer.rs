//! Stream observation
//!
//! The media router reports stream birth and death through a
//! per-application observer registered at create time. The
//! orchestrator attributes each new stream to the origin or domain
//! rule whose pull produced it; media frames are observed and ignored.

use std::sync::Weak;

use async_trait::async_trait;

use crate::info::{ApplicationInfo, StreamInfo};
use crate::module::StreamObserver;
use crate::stats::StatCounters;
use crate::vhost::Stream;

use super::{Orchestrator, OwnerRule};

/// Observer registered with the media router for one application
///
/// Holds a non-owning handle to the coordinator so an application
/// outliving its orchestrator (during shutdown) degrades to rejected
/// callbacks instead of a cycle.
pub(super) struct AppObserver {
    pub(super) orchestrator: Weak<Orchestrator>,
    pub(super) app_info: ApplicationInfo,
}

#[async_trait]
impl StreamObserver for AppObserver {
    async fn on_create_stream(&self, stream: &StreamInfo) -> bool {
        match self.orchestrator.upgrade() {
            Some(orchestrator) => orchestrator.on_create_stream(&self.app_info, stream).await,
            None => false,
        }
    }

    async fn on_delete_stream(&self, stream: &StreamInfo) -> bool {
        match self.orchestrator.upgrade() {
            Some(orchestrator) => orchestrator.on_delete_stream(&self.app_info, stream).await,
            None => false,
        }
    }

    // Frame callbacks use the defaults: packets are ignored.
}

impl Orchestrator {
    /// A provider actually produced a stream; attribute it to the rule
    /// that pulled it
    pub(super) async fn on_create_stream(
        &self,
        app_info: &ApplicationInfo,
        stream: &StreamInfo,
    ) -> bool {
        let pending = self
            .pending_pulls
            .lock()
            .await
            .remove(&(app_info.id, stream.name.clone()));

        let Some(pending) = pending else {
            // Push-ingested or router-internal stream; nothing to attribute
            tracing::debug!(app = %app_info, stream = %stream, "Stream created outside a pull rule");
            return true;
        };

        let mut vhosts = self.vhosts.write().await;
        let Some(host) = vhosts.iter_mut().find(|h| h.name == pending.vhost_name) else {
            tracing::warn!(vhost = %pending.vhost_name, stream = %stream, "Owning host vanished before stream attribution");
            return false;
        };

        let record = Stream {
            id: stream.id,
            full_name: pending.full_name,
            app_id: app_info.id,
            provider: pending.provider,
        };

        let stream_map = match &pending.owner {
            OwnerRule::Origin { location } => host
                .origin_list
                .iter_mut()
                .find(|o| o.location == *location)
                .map(|o| &mut o.stream_map),
            OwnerRule::Domain { name } => host
                .domain_list
                .iter_mut()
                .find(|d| d.name == *name)
                .map(|d| &mut d.stream_map),
        };

        match stream_map {
            Some(map) => {
                tracing::info!(app = %app_info, stream = %stream, name = %record.full_name, "Stream attributed");
                map.insert(stream.id, record);
                StatCounters::bump(&self.counters.streams_created);
                true
            }
            None => {
                tracing::warn!(app = %app_info, stream = %stream, "Owning rule vanished before stream attribution");
                false
            }
        }
    }

    /// A stream went away; drop it from whichever rule owns it
    pub(super) async fn on_delete_stream(
        &self,
        app_info: &ApplicationInfo,
        stream: &StreamInfo,
    ) -> bool {
        self.pending_pulls
            .lock()
            .await
            .remove(&(app_info.id, stream.name.clone()));

        let mut vhosts = self.vhosts.write().await;
        if let Some(host) = vhosts.iter_mut().find(|h| h.name == app_info.vhost_name) {
            if host.remove_stream(stream.id) {
                StatCounters::bump(&self.counters.streams_deleted);
                tracing::info!(app = %app_info, stream = %stream, "Stream removed");
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{HostConfig, OriginConfig};
    use crate::module::testing::{Journal, RecordingProvider, RecordingRouter};
    use crate::module::{Module, ProviderKind};

    /// Orchestrator with one host, one origin, a router, and a provider;
    /// returns the router for firing observer callbacks
    async fn pulled_setup() -> (Arc<Orchestrator>, Arc<RecordingRouter>, u32) {
        crate::module::testing::init_tracing();

        let orchestrator = Arc::new(Orchestrator::new());
        let j = Journal::default();
        let router = Arc::new(RecordingRouter::new("router", &j));
        let provider: Arc<dyn Module> =
            Arc::new(RecordingProvider::new("rtmp", ProviderKind::Rtmp, &j));
        let router_module: Arc<dyn Module> = router.clone();
        orchestrator.register_module(router_module).await;
        orchestrator.register_module(provider).await;

        let snapshot = vec![HostConfig::new("h1")
            .domain("*.example.com")
            .origin(OriginConfig::new("/live", "rtmp", ["rtmp://src/app"]))];
        assert!(orchestrator.apply_origin_map(&snapshot).await);

        orchestrator
            .request_pull_stream("h1#live", "stream1", 0)
            .await
            .unwrap();

        let app_id = orchestrator.get_application("h1#live").await.unwrap().id;
        (orchestrator, router, app_id)
    }

    #[tokio::test]
    async fn test_stream_attributed_to_origin() {
        let (orchestrator, router, app_id) = pulled_setup().await;

        let stream = StreamInfo::new(7, "stream1");
        assert!(router.fire_create_stream(app_id, &stream).await);

        let vhosts = orchestrator.vhosts.read().await;
        let host = &vhosts[0];
        let origin = &host.origin_list[0];
        assert_eq!(origin.stream_map.len(), 1);
        assert_eq!(origin.stream_map[&7].full_name, "h1#live/stream1");
        assert_eq!(origin.stream_map[&7].app_id, app_id);

        // Owned by the origin rule, not by any domain
        assert!(host.domain_list.iter().all(|d| d.stream_map.is_empty()));
    }

    #[tokio::test]
    async fn test_stream_removed_on_delete() {
        let (orchestrator, router, app_id) = pulled_setup().await;

        let stream = StreamInfo::new(7, "stream1");
        assert!(router.fire_create_stream(app_id, &stream).await);
        assert!(router.fire_delete_stream(app_id, &stream).await);

        let vhosts = orchestrator.vhosts.read().await;
        assert!(vhosts[0].origin_list[0].stream_map.is_empty());

        let stats = orchestrator.stats();
        assert_eq!(stats.streams_created, 1);
        assert_eq!(stats.streams_deleted, 1);
    }

    #[tokio::test]
    async fn test_unattributed_stream_is_accepted() {
        let (orchestrator, router, app_id) = pulled_setup().await;

        // A push-ingested stream the orchestrator never pulled
        let stream = StreamInfo::new(9, "pushed");
        assert!(router.fire_create_stream(app_id, &stream).await);

        let vhosts = orchestrator.vhosts.read().await;
        assert!(vhosts[0].origin_list[0].stream_map.is_empty());
        assert!(vhosts[0].domain_list[0].stream_map.is_empty());
    }

    #[tokio::test]
    async fn test_deleting_application_destroys_streams() {
        let (orchestrator, router, app_id) = pulled_setup().await;

        let stream = StreamInfo::new(7, "stream1");
        assert!(router.fire_create_stream(app_id, &stream).await);

        let app = orchestrator.get_application("h1#live").await.unwrap();
        orchestrator.delete_application(&app).await;

        let vhosts = orchestrator.vhosts.read().await;
        assert!(vhosts[0].origin_list[0].stream_map.is_empty());
        assert!(vhosts[0].app_map.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_url_stream_attributed_to_domain() {
        let (orchestrator, router, app_id) = pulled_setup().await;

        // Pull from a URL whose host matches *.example.com
        orchestrator
            .request_pull_stream_with_url("h1#live", "adhoc", "rtmp://cdn.example.com/app/adhoc", 0)
            .await
            .unwrap();

        let stream = StreamInfo::new(11, "adhoc");
        assert!(router.fire_create_stream(app_id, &stream).await);

        let vhosts = orchestrator.vhosts.read().await;
        let host = &vhosts[0];
        assert!(host.origin_list[0].stream_map.is_empty());
        assert_eq!(host.domain_list[0].stream_map.len(), 1);
        assert_eq!(
            host.domain_list[0].stream_map[&11].full_name,
            "h1#live/adhoc"
        );
    }
}

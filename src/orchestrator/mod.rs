//! The process-wide coordinator
//!
//! The orchestrator owns the virtual-host configuration tree, routes
//! stream requests to provider/publisher modules, reconciles incoming
//! configuration snapshots against running state, and resolves
//! client-facing names into concrete pull URLs.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<Orchestrator>
//!            ┌──────────────────────────────────────┐
//!            │ vhosts:  RwLock<Vec<VirtualHost>>    │
//!            │ modules: RwLock<ModuleRegistry>      │
//!            │ ops:     Mutex (serializes mutation) │
//!            └────────────────┬─────────────────────┘
//!                             │
//!        ┌────────────────────┼─────────────────────┐
//!        │                    │                     │
//!        ▼                    ▼                     ▼
//!   [snapshot]          [pull request]        [media router]
//!   apply_origin_map    request_pull_stream   on_create_stream
//!        │                    │                     │
//!        └──► create/delete ──┴──► provider pull    └──► stream_map
//!             fan-out to modules
//! ```
//!
//! # Locking
//!
//! Two `RwLock`s guard the virtual-host tree and the module registry;
//! lock order is vhosts then modules, and neither is ever held across a
//! module callback. Instead, every fan-out snapshots the module list
//! first and performs the calls lock-free, so callbacks may re-enter
//! the read paths (name resolution, lookups) without deadlocking. The
//! `ops` mutex serializes the mutating operations so a reconcile is
//! atomic with respect to other reconciles and direct create/delete
//! calls. Configuration changes are rare; pull and resolution traffic
//! only takes short read locks.

mod apps;
mod observer;
mod pull;
mod reconcile;
mod resolve;

use std::collections::HashMap;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::info::{ApplicationId, MIN_APPLICATION_ID};
use crate::module::{Module, ModuleKind, ModuleRegistry};
use crate::stats::{OrchestratorStats, StatCounters};
use crate::vhost::VirtualHost;

pub use apps::OperationResult;
pub use resolve::{parse_vhost_app_name, resolve_application_name};

/// The rule that caused a pull, for later stream attribution
enum OwnerRule {
    /// A location-based pull matched this origin
    Origin { location: String },
    /// An explicit-URL pull whose host matched this domain pattern
    Domain { name: String },
}

/// A successful pull waiting for the media router to report the stream
struct PendingPull {
    vhost_name: String,
    owner: OwnerRule,
    full_name: String,
    provider: Arc<dyn Module>,
}

/// Process-wide coordinator for providers, the media router,
/// transcoders, and publishers
///
/// Construct one per engine instance and share it via `Arc`; tests
/// instantiate independent coordinators.
pub struct Orchestrator {
    /// Virtual hosts in configuration order
    vhosts: RwLock<Vec<VirtualHost>>,

    /// Live modules
    modules: RwLock<ModuleRegistry>,

    /// Serializes reconciliation and application create/delete
    ops: Mutex<()>,

    /// Next application ID to hand out
    next_app_id: AtomicU32,

    /// Pulls awaiting stream attribution, keyed by (app id, stream name)
    pending_pulls: Mutex<HashMap<(ApplicationId, String), PendingPull>>,

    /// Activity counters
    counters: StatCounters,
}

impl Orchestrator {
    /// Create an orchestrator with no hosts and no modules
    pub fn new() -> Self {
        Self {
            vhosts: RwLock::new(Vec::new()),
            modules: RwLock::new(ModuleRegistry::new()),
            ops: Mutex::new(()),
            next_app_id: AtomicU32::new(MIN_APPLICATION_ID),
            pending_pulls: Mutex::new(HashMap::new()),
            counters: StatCounters::default(),
        }
    }

    /// Register a module
    ///
    /// Returns false if the same instance is already registered or the
    /// module does not declare a kind.
    pub async fn register_module(&self, module: Arc<dyn Module>) -> bool {
        self.modules.write().await.register(module)
    }

    /// Unregister a module
    ///
    /// Returns false if the module was never registered. Must not be
    /// called from within a create/delete fan-out.
    pub async fn unregister_module(&self, module: &Arc<dyn Module>) -> bool {
        self.modules.write().await.unregister(module)
    }

    /// First registered provider handling `scheme` (case-insensitive)
    pub async fn provider_for_scheme(&self, scheme: &str) -> Option<Arc<dyn Module>> {
        let modules = self.modules.read().await;

        modules
            .modules_of_kind(ModuleKind::Provider)
            .iter()
            .find(|m| {
                m.as_provider()
                    .is_some_and(|p| p.provider_kind().handles_scheme(scheme))
            })
            .cloned()
    }

    /// Provider handling the scheme of `url`
    pub async fn provider_for_url(&self, url: &Url) -> Option<Arc<dyn Module>> {
        self.provider_for_scheme(url.scheme()).await
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> OrchestratorStats {
        self.counters.snapshot()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::testing::{Journal, RecordingProvider, RecordingRouter};
    use crate::module::ProviderKind;

    #[tokio::test]
    async fn test_register_and_lookup_provider() {
        let orchestrator = Orchestrator::new();
        let j = Journal::default();

        let rtmp: Arc<dyn Module> =
            Arc::new(RecordingProvider::new("rtmp", ProviderKind::Rtmp, &j));
        let rtsp: Arc<dyn Module> =
            Arc::new(RecordingProvider::new("rtsp", ProviderKind::RtspPull, &j));
        let router: Arc<dyn Module> = Arc::new(RecordingRouter::new("router", &j));

        assert!(orchestrator.register_module(Arc::clone(&rtmp)).await);
        assert!(orchestrator.register_module(Arc::clone(&rtsp)).await);
        assert!(orchestrator.register_module(router).await);

        let found = orchestrator.provider_for_scheme("RTSP").await.unwrap();
        assert_eq!(
            found.as_provider().unwrap().provider_kind(),
            ProviderKind::RtspPull
        );

        assert!(orchestrator.provider_for_scheme("webrtc").await.is_none());

        let url = Url::parse("rtmp://src/app/stream").unwrap();
        let by_url = orchestrator.provider_for_url(&url).await.unwrap();
        assert_eq!(
            by_url.as_provider().unwrap().provider_kind(),
            ProviderKind::Rtmp
        );
    }

    #[tokio::test]
    async fn test_double_register_rejected() {
        let orchestrator = Orchestrator::new();
        let j = Journal::default();

        let rtmp: Arc<dyn Module> =
            Arc::new(RecordingProvider::new("rtmp", ProviderKind::Rtmp, &j));

        assert!(orchestrator.register_module(Arc::clone(&rtmp)).await);
        assert!(!orchestrator.register_module(Arc::clone(&rtmp)).await);
        assert!(orchestrator.unregister_module(&rtmp).await);
        assert!(!orchestrator.unregister_module(&rtmp).await);
    }
}

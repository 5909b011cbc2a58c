//! Recording mock modules shared by unit tests
//!
//! Every mock appends to a shared journal so tests can assert global
//! fan-out ordering across modules.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use crate::info::{ApplicationInfo, StreamInfo};

use super::kind::{ModuleKind, ProviderKind};
use super::traits::{MediaRouterModule, Module, ProviderModule, StreamObserver};

/// Shared, ordered event log
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

/// Route tracing output through the test harness; safe to call repeatedly
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Drain the journal into a plain vector
pub(crate) fn drain(journal: &Journal) -> Vec<String> {
    std::mem::take(&mut *journal.lock().unwrap())
}

/// A plain module of any kind that records its callbacks
pub(crate) struct RecordingModule {
    label: String,
    kind: ModuleKind,
    journal: Journal,
    fail_create: bool,
}

impl RecordingModule {
    pub(crate) fn new(label: impl Into<String>, kind: ModuleKind, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            kind,
            journal: Arc::clone(journal),
            fail_create: false,
        }
    }

    /// A module whose `on_create_application` always rejects
    pub(crate) fn failing_create(
        label: impl Into<String>,
        kind: ModuleKind,
        journal: &Journal,
    ) -> Self {
        Self {
            fail_create: true,
            ..Self::new(label, kind, journal)
        }
    }

    fn record(&self, event: &str, app: &ApplicationInfo) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", self.label, event, app.full_name));
    }
}

#[async_trait]
impl Module for RecordingModule {
    fn kind(&self) -> ModuleKind {
        self.kind
    }

    async fn on_create_application(&self, app: &ApplicationInfo) -> bool {
        self.record("create", app);
        !self.fail_create
    }

    async fn on_delete_application(&self, app: &ApplicationInfo) -> bool {
        self.record("delete", app);
        true
    }
}

/// One recorded pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PullRecord {
    pub(crate) app_full_name: String,
    pub(crate) stream_name: String,
    pub(crate) url: String,
    pub(crate) offset: i64,
}

/// A provider that records pulls and accepts or rejects them wholesale
pub(crate) struct RecordingProvider {
    label: String,
    provider_kind: ProviderKind,
    journal: Journal,
    accept_pull: bool,
    pulls: Mutex<Vec<PullRecord>>,
}

impl RecordingProvider {
    pub(crate) fn new(label: impl Into<String>, kind: ProviderKind, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            provider_kind: kind,
            journal: Arc::clone(journal),
            accept_pull: true,
            pulls: Mutex::new(Vec::new()),
        }
    }

    /// A provider that rejects every pull
    pub(crate) fn rejecting(
        label: impl Into<String>,
        kind: ProviderKind,
        journal: &Journal,
    ) -> Self {
        Self {
            accept_pull: false,
            ..Self::new(label, kind, journal)
        }
    }

    pub(crate) fn pulls(&self) -> Vec<PullRecord> {
        self.pulls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Module for RecordingProvider {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Provider
    }

    async fn on_create_application(&self, app: &ApplicationInfo) -> bool {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:create:{}", self.label, app.full_name));
        true
    }

    async fn on_delete_application(&self, app: &ApplicationInfo) -> bool {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:delete:{}", self.label, app.full_name));
        true
    }

    fn as_provider(&self) -> Option<&dyn ProviderModule> {
        Some(self)
    }
}

#[async_trait]
impl ProviderModule for RecordingProvider {
    fn provider_kind(&self) -> ProviderKind {
        self.provider_kind
    }

    async fn pull_stream(
        &self,
        app: &ApplicationInfo,
        stream_name: &str,
        url: &Url,
        offset: i64,
    ) -> bool {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:pull:{}", self.label, url));
        self.pulls.lock().unwrap().push(PullRecord {
            app_full_name: app.full_name.clone(),
            stream_name: stream_name.to_string(),
            url: url.to_string(),
            offset,
        });
        self.accept_pull
    }
}

/// A media router that records callbacks and lets tests fire stream
/// birth/death at registered observers
pub(crate) struct RecordingRouter {
    label: String,
    journal: Journal,
    observers: Mutex<Vec<(ApplicationInfo, Arc<dyn StreamObserver>)>>,
}

impl RecordingRouter {
    pub(crate) fn new(label: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            journal: Arc::clone(journal),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    fn observer_for(&self, app_id: u32) -> Option<Arc<dyn StreamObserver>> {
        self.observers
            .lock()
            .unwrap()
            .iter()
            .find(|(app, _)| app.id == app_id)
            .map(|(_, observer)| Arc::clone(observer))
    }

    /// Deliver `on_create_stream` to the observer registered for `app_id`
    pub(crate) async fn fire_create_stream(&self, app_id: u32, stream: &StreamInfo) -> bool {
        match self.observer_for(app_id) {
            Some(observer) => observer.on_create_stream(stream).await,
            None => false,
        }
    }

    /// Deliver `on_delete_stream` to the observer registered for `app_id`
    pub(crate) async fn fire_delete_stream(&self, app_id: u32, stream: &StreamInfo) -> bool {
        match self.observer_for(app_id) {
            Some(observer) => observer.on_delete_stream(stream).await,
            None => false,
        }
    }
}

#[async_trait]
impl Module for RecordingRouter {
    fn kind(&self) -> ModuleKind {
        ModuleKind::MediaRouter
    }

    async fn on_create_application(&self, app: &ApplicationInfo) -> bool {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:create:{}", self.label, app.full_name));
        true
    }

    async fn on_delete_application(&self, app: &ApplicationInfo) -> bool {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:delete:{}", self.label, app.full_name));
        // Registration dies with the application
        self.observers
            .lock()
            .unwrap()
            .retain(|(registered, _)| registered.id != app.id);
        true
    }

    fn as_media_router(&self) -> Option<&dyn MediaRouterModule> {
        Some(self)
    }
}

#[async_trait]
impl MediaRouterModule for RecordingRouter {
    async fn register_observer(
        &self,
        app: &ApplicationInfo,
        observer: Arc<dyn StreamObserver>,
    ) -> bool {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:observe:{}", self.label, app.full_name));
        self.observers
            .lock()
            .unwrap()
            .push((app.clone(), observer));
        true
    }
}

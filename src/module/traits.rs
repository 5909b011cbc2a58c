//! Module interfaces
//!
//! The traits every pluggable module implements so the orchestrator can
//! drive its lifecycle. Capability interfaces (provider pull, media
//! router observation) are reached through cross-cast accessors on the
//! base trait rather than downcasting, so the registry can hold plain
//! `Arc<dyn Module>` handles.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::info::{ApplicationInfo, MediaPacket, StreamInfo};

use super::kind::{ModuleKind, ProviderKind};

/// Base interface implemented by every orchestrated module
///
/// Create/delete callbacks may block on network I/O inside the module;
/// the orchestrator never holds its own locks across them.
#[async_trait]
pub trait Module: Send + Sync {
    /// Which kind of module this is
    fn kind(&self) -> ModuleKind;

    /// Notify the module that an application was created
    ///
    /// Returning false aborts the creation; the orchestrator rolls the
    /// application back out of every module that already accepted it.
    async fn on_create_application(&self, app: &ApplicationInfo) -> bool;

    /// Notify the module that an application is being deleted
    ///
    /// Failures are logged and the deletion continues; the application
    /// is never revived.
    async fn on_delete_application(&self, app: &ApplicationInfo) -> bool;

    /// Cross-cast to the provider capability, if this module is one
    fn as_provider(&self) -> Option<&dyn ProviderModule> {
        None
    }

    /// Cross-cast to the media router capability, if this module is one
    fn as_media_router(&self) -> Option<&dyn MediaRouterModule> {
        None
    }
}

/// Ingress capability: modules that can pull a stream from an upstream URL
#[async_trait]
pub trait ProviderModule: Module {
    /// Which scheme family this provider answers for
    fn provider_kind(&self) -> ProviderKind;

    /// Pull `stream_name` for `app` from `url`
    ///
    /// `offset` is a provider-defined seek position (0 = live edge).
    /// Returns false when the upstream rejects the pull; the dispatcher
    /// then tries the next candidate URL.
    async fn pull_stream(
        &self,
        app: &ApplicationInfo,
        stream_name: &str,
        url: &Url,
        offset: i64,
    ) -> bool;
}

/// Media router capability: accepts per-application stream observers
#[async_trait]
pub trait MediaRouterModule: Module {
    /// Register an observer for streams of `app`
    ///
    /// The router must deliver `on_create_stream`/`on_delete_stream`
    /// for every stream born or destroyed under the application.
    async fn register_observer(
        &self,
        app: &ApplicationInfo,
        observer: Arc<dyn StreamObserver>,
    ) -> bool;
}

/// Callbacks delivered by the media router for an observed application
///
/// Frame callbacks default to accept-and-ignore; the orchestrator is a
/// control-plane component and never touches media payloads.
#[async_trait]
pub trait StreamObserver: Send + Sync {
    /// A provider actually produced a stream
    async fn on_create_stream(&self, stream: &StreamInfo) -> bool;

    /// A stream went away
    async fn on_delete_stream(&self, stream: &StreamInfo) -> bool;

    /// Video frame observed; ignored
    fn on_video_frame(&self, _stream: &StreamInfo, _packet: &MediaPacket) -> bool {
        true
    }

    /// Audio frame observed; ignored
    fn on_audio_frame(&self, _stream: &StreamInfo, _packet: &MediaPacket) -> bool {
        true
    }

    /// Other frame observed; ignored
    fn on_frame(&self, _stream: &StreamInfo, _packet: &MediaPacket) -> bool {
        true
    }
}

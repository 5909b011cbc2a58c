//! Live application records

use std::sync::Arc;

use crate::info::ApplicationInfo;
use crate::module::StreamObserver;

/// An application that exists in every registered module
///
/// Keeps the observer registered with the media router alive for as
/// long as the application does.
pub struct Application {
    /// Identity and configuration
    pub info: ApplicationInfo,

    /// The stream observer registered on this application's behalf
    pub observer: Arc<dyn StreamObserver>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

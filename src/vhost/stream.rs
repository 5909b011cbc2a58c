//! Live stream records

use std::sync::Arc;

use crate::info::ApplicationId;
use crate::module::Module;

/// A live stream attributed to the origin or domain rule that pulled it
///
/// Holds an owning handle to the provider that produced the stream and
/// a back-reference to the owning application by ID, so a stale record
/// can be detected after the application is gone.
pub struct Stream {
    /// Router-assigned stream ID
    pub id: u32,

    /// Engine-wide name: `vhost#app/stream`
    pub full_name: String,

    /// Owning application
    pub app_id: ApplicationId,

    /// The provider module that produced this stream
    pub provider: Arc<dyn Module>,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.id)
            .field("full_name", &self.full_name)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

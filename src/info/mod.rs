//! Runtime identity types
//!
//! Value types that flow between the orchestrator and its modules:
//! application descriptors, stream descriptors, and the (ignored)
//! media packets observed at the control plane.

pub mod application;
pub mod stream;

pub use application::{ApplicationId, ApplicationInfo, APP_NAME_DELIMITER, MIN_APPLICATION_ID};
pub use stream::{MediaPacket, StreamInfo};

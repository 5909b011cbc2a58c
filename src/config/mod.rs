//! Configuration snapshot model
//!
//! The desired-state tree handed to the orchestrator by the
//! configuration loader: a list of host descriptors, each carrying
//! domain name patterns and origin pull rules. The loader itself is
//! external; this module only defines the shape it produces.
//!
//! All types are plain data with serde derives and builder-style
//! constructors so tests and embedders can assemble snapshots inline.

pub mod application;
pub mod host;
pub mod origin;

pub use application::ApplicationConfig;
pub use host::{DomainConfig, HostConfig};
pub use origin::{OriginConfig, PassConfig};

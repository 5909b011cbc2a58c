//! Virtual host live state and reconciliation items
//!
//! The tree the orchestrator reconciles configuration snapshots
//! against: `VirtualHost -> { Domain[], Origin[], Application[] }`,
//! with each item carrying its own [`ItemState`].

pub mod application;
pub mod domain;
pub mod host;
pub mod origin;
pub mod state;
pub mod stream;

pub use application::Application;
pub use domain::Domain;
pub use host::VirtualHost;
pub use origin::Origin;
pub use state::ItemState;
pub use stream::Stream;

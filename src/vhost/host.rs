//! Virtual host live state

use std::collections::HashMap;

use crate::config::HostConfig;
use crate::info::ApplicationId;

use super::application::Application;
use super::domain::Domain;
use super::origin::Origin;
use super::state::ItemState;

/// Live state of one virtual host: its domains, origins, and applications
pub struct VirtualHost {
    /// Unique virtual host name
    pub name: String,

    /// Domain rules in configuration order
    pub domain_list: Vec<Domain>,

    /// Origin rules in configuration order
    pub origin_list: Vec<Origin>,

    /// Applications created under this host
    pub app_map: HashMap<ApplicationId, Application>,

    /// Reconciliation state
    pub state: ItemState,
}

impl VirtualHost {
    /// Build a fresh virtual host from a snapshot entry; the host and
    /// every child start in `New`
    pub fn new(config: &HostConfig) -> Self {
        Self {
            name: config.name.clone(),
            domain_list: config.domains.iter().map(|d| Domain::new(&d.name)).collect(),
            origin_list: config.origins.iter().map(Origin::new).collect(),
            app_map: HashMap::new(),
            state: ItemState::New,
        }
    }

    /// Set the host and every child to `state`
    pub fn mark_all_as(&mut self, state: ItemState) {
        self.state = state;

        for domain in &mut self.domain_list {
            domain.state = state;
        }
        for origin in &mut self.origin_list {
            origin.state = state;
        }
    }

    /// Set the host and every child to `state`, but only while each
    /// item still carries `expected`; returns false on the first
    /// mismatch
    pub fn mark_all_as_checked(&mut self, expected: ItemState, state: ItemState) -> bool {
        if self.state != expected {
            return false;
        }
        self.state = state;

        for domain in &mut self.domain_list {
            if domain.state != expected {
                return false;
            }
            domain.state = state;
        }
        for origin in &mut self.origin_list {
            if origin.state != expected {
                return false;
            }
            origin.state = state;
        }

        true
    }

    /// Find an application by its plain name
    pub fn app_by_name(&self, name: &str) -> Option<&Application> {
        self.app_map.values().find(|app| app.info.name == name)
    }

    /// Aggregate state over the host's children
    ///
    /// Any child in `New`, `Changed`, or `Delete` makes the host
    /// `Changed`; otherwise it is `NotChanged`.
    pub fn aggregate_state(&self) -> ItemState {
        let changed = self
            .domain_list
            .iter()
            .map(|d| d.state)
            .chain(self.origin_list.iter().map(|o| o.state))
            .any(|state| state.changes_parent());

        if changed {
            ItemState::Changed
        } else {
            ItemState::NotChanged
        }
    }

    /// Drop a stream from whichever rule owns it
    pub fn remove_stream(&mut self, stream_id: u32) -> bool {
        for origin in &mut self.origin_list {
            if origin.stream_map.remove(&stream_id).is_some() {
                return true;
            }
        }
        for domain in &mut self.domain_list {
            if domain.stream_map.remove(&stream_id).is_some() {
                return true;
            }
        }
        false
    }

    /// Drop every stream owned by `app_id` from every rule
    pub fn remove_streams_of_app(&mut self, app_id: ApplicationId) {
        for origin in &mut self.origin_list {
            origin.stream_map.retain(|_, stream| stream.app_id != app_id);
        }
        for domain in &mut self.domain_list {
            domain.stream_map.retain(|_, stream| stream.app_id != app_id);
        }
    }
}

impl std::fmt::Debug for VirtualHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualHost")
            .field("name", &self.name)
            .field("domains", &self.domain_list.len())
            .field("origins", &self.origin_list.len())
            .field("apps", &self.app_map.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OriginConfig;

    fn host() -> VirtualHost {
        VirtualHost::new(
            &HostConfig::new("h1")
                .domain("*.example.com")
                .origin(OriginConfig::new("/live", "rtmp", ["rtmp://src/app"])),
        )
    }

    #[test]
    fn test_new_host_starts_new() {
        let host = host();

        assert_eq!(host.state, ItemState::New);
        assert!(host.domain_list.iter().all(|d| d.state == ItemState::New));
        assert!(host.origin_list.iter().all(|o| o.state == ItemState::New));
    }

    #[test]
    fn test_mark_all_as() {
        let mut host = host();

        host.mark_all_as(ItemState::NeedToCheck);
        assert_eq!(host.state, ItemState::NeedToCheck);
        assert!(host
            .domain_list
            .iter()
            .all(|d| d.state == ItemState::NeedToCheck));
        assert!(host
            .origin_list
            .iter()
            .all(|o| o.state == ItemState::NeedToCheck));
    }

    #[test]
    fn test_mark_all_as_checked_mismatch() {
        let mut host = host();
        host.mark_all_as(ItemState::Applied);
        host.origin_list[0].state = ItemState::Changed;

        assert!(!host.mark_all_as_checked(ItemState::Applied, ItemState::NeedToCheck));
    }

    #[test]
    fn test_aggregate_state() {
        let mut host = host();
        host.mark_all_as(ItemState::NotChanged);
        assert_eq!(host.aggregate_state(), ItemState::NotChanged);

        host.origin_list[0].state = ItemState::Changed;
        assert_eq!(host.aggregate_state(), ItemState::Changed);
    }
}

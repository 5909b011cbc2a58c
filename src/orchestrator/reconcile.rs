//! Configuration reconciliation
//!
//! Brings the live virtual-host tree into agreement with a desired
//! snapshot. Three phases under one pass: mark every live item
//! `NeedToCheck`, diff the snapshot against the tree, then apply the
//! resulting creations and deletions through the module fan-out.
//! Deletions are observed by modules strictly before creations so a
//! renamed rule never collides with its old self.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{ApplicationConfig, HostConfig};
use crate::info::ApplicationInfo;
use crate::vhost::{Domain, ItemState, Origin, VirtualHost};

use super::apps::OperationResult;
use super::Orchestrator;

/// One application creation owed to an origin rule
struct CreateJob {
    vhost_name: String,
    location: String,
    config: ApplicationConfig,
}

/// Everything the apply phase has to do, extracted under the tree lock
struct ReconcileWork {
    deletes: Vec<ApplicationInfo>,
    creates: Vec<CreateJob>,
}

impl Orchestrator {
    /// Apply a configuration snapshot
    ///
    /// Reconciliation of one host is independent of the others: a
    /// failure is logged, reflected in the return value, and the
    /// remaining hosts are still processed. Re-applying an identical
    /// snapshot performs no module callbacks.
    pub async fn apply_origin_map(self: &Arc<Self>, host_list: &[HostConfig]) -> bool {
        let _ops = self.ops.lock().await;

        tracing::info!(hosts = host_list.len(), "Applying origin map");

        let work = {
            let mut vhosts = self.vhosts.write().await;

            // Mark phase
            for host in vhosts.iter_mut() {
                if !host.mark_all_as_checked(ItemState::Applied, ItemState::NeedToCheck) {
                    // A previous apply did not finish cleanly; check
                    // the whole tree anyway.
                    host.mark_all_as(ItemState::NeedToCheck);
                }
            }

            // Diff phase
            for config in host_list {
                match vhosts.iter_mut().find(|h| h.name == config.name) {
                    None => {
                        tracing::info!(vhost = %config.name, "New virtual host");
                        vhosts.push(VirtualHost::new(config));
                    }
                    Some(host) => {
                        process_domain_list(host, config);
                        process_origin_list(host, config);
                        host.state = host.aggregate_state();
                    }
                }
            }

            // Hosts absent from the snapshot go away entirely
            for host in vhosts.iter_mut() {
                if host.state == ItemState::NeedToCheck {
                    tracing::info!(vhost = %host.name, "Virtual host removed from configuration");
                    host.mark_all_as(ItemState::Delete);
                }
            }

            collect_work(&vhosts)
        };

        // Apply phase, without the tree lock: module callbacks may
        // block and may re-enter the resolution paths.
        let mut success = true;

        for app_info in &work.deletes {
            match self.delete_application_internal(app_info).await {
                OperationResult::Succeeded => {}
                result => {
                    tracing::error!(app = %app_info, result = ?result, "Delete failed during reconcile");
                    success = false;
                }
            }
        }

        for job in &work.creates {
            match self
                .create_application_internal(&job.vhost_name, &job.config)
                .await
            {
                OperationResult::Succeeded | OperationResult::Exists => {
                    self.bind_origin_app(&job.vhost_name, &job.location, &job.config.name)
                        .await;
                }
                result => {
                    tracing::error!(
                        vhost = %job.vhost_name,
                        app = %job.config.name,
                        result = ?result,
                        "Create failed during reconcile"
                    );
                    success = false;
                }
            }
        }

        // Trim deleted items and settle the survivors
        {
            let mut vhosts = self.vhosts.write().await;
            vhosts.retain(|host| host.state != ItemState::Delete);
            for host in vhosts.iter_mut() {
                host.domain_list.retain(|d| d.state != ItemState::Delete);
                host.origin_list.retain(|o| o.state != ItemState::Delete);
                host.mark_all_as(ItemState::Applied);
            }
        }

        tracing::info!(success, "Origin map applied");
        success
    }

    /// Record which application an origin rule resolved to
    async fn bind_origin_app(&self, vhost_name: &str, location: &str, app_name: &str) {
        let mut vhosts = self.vhosts.write().await;
        let Some(host) = vhosts.iter_mut().find(|h| h.name == vhost_name) else {
            return;
        };
        let app_id = host.app_by_name(app_name).map(|a| a.info.id).unwrap_or(0);
        if let Some(origin) = host.origin_list.iter_mut().find(|o| o.location == location) {
            origin.app_id = app_id;
        }
    }
}

/// Diff the snapshot's domain patterns against the live list, by name
fn process_domain_list(host: &mut VirtualHost, config: &HostConfig) {
    for domain_config in &config.domains {
        match host
            .domain_list
            .iter_mut()
            .find(|d| d.name == domain_config.name)
        {
            // Domains have no mutable fields beyond the pattern itself
            Some(domain) => domain.state = ItemState::NotChanged,
            None => host.domain_list.push(Domain::new(&domain_config.name)),
        }
    }

    for domain in &mut host.domain_list {
        if domain.state == ItemState::NeedToCheck {
            domain.state = ItemState::Delete;
        }
    }
}

/// Diff the snapshot's origin rules against the live list, by location
fn process_origin_list(host: &mut VirtualHost, config: &HostConfig) {
    for origin_config in &config.origins {
        match host
            .origin_list
            .iter_mut()
            .find(|o| o.location == origin_config.location)
        {
            Some(origin) => {
                if origin.differs_from(origin_config) {
                    // Keep the old app_id so apply can release the
                    // outgoing application before recreating it.
                    origin.adopt(origin_config);
                    origin.state = ItemState::Changed;
                } else {
                    origin.state = ItemState::NotChanged;
                }
            }
            None => host.origin_list.push(Origin::new(origin_config)),
        }
    }

    for origin in &mut host.origin_list {
        if origin.state == ItemState::NeedToCheck {
            origin.state = ItemState::Delete;
        }
    }
}

/// Walk the diffed tree and extract the apply-phase work
fn collect_work(vhosts: &[VirtualHost]) -> ReconcileWork {
    let mut deletes: Vec<ApplicationInfo> = Vec::new();
    let mut creates = Vec::new();

    for host in vhosts {
        if host.state == ItemState::Delete {
            let mut apps: Vec<&ApplicationInfo> =
                host.app_map.values().map(|app| &app.info).collect();
            apps.sort_by_key(|info| info.id);
            deletes.extend(apps.into_iter().cloned());
            continue;
        }

        for origin in &host.origin_list {
            if matches!(origin.state, ItemState::Delete | ItemState::Changed) && origin.app_id != 0
            {
                if let Some(app) = host.app_map.get(&origin.app_id) {
                    deletes.push(app.info.clone());
                }
            }
            if matches!(origin.state, ItemState::New | ItemState::Changed) {
                creates.push(CreateJob {
                    vhost_name: host.name.clone(),
                    location: origin.location.clone(),
                    config: origin.config.application.clone(),
                });
            }
        }
    }

    // Two origins may share one application; release it once
    let mut seen = HashSet::new();
    deletes.retain(|info| seen.insert(info.id));

    ReconcileWork { deletes, creates }
}

//! Application lifecycle coordination
//!
//! Creates and deletes applications across every registered module.
//! Creation is transactional: if any module rejects the application,
//! every module that already accepted it is rolled back and nothing is
//! retained. Deletion is best-effort: failures are logged, the
//! deletion continues, and the application is never revived.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::config::ApplicationConfig;
use crate::info::ApplicationInfo;
use crate::module::{Module, StreamObserver};
use crate::stats::StatCounters;
use crate::vhost::Application;

use super::observer::AppObserver;
use super::Orchestrator;

/// Outcome of an application create or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// The operation could not complete; creates are fully rolled back
    Failed,
    /// The operation completed in every module
    Succeeded,
    /// Create: an application with this name already exists
    Exists,
    /// Delete: no such application
    NotExists,
}

impl Orchestrator {
    /// Create an application and notify every module
    ///
    /// Automatically deletes the partial application from every module
    /// when creation fails in any of them.
    pub async fn create_application(
        self: &Arc<Self>,
        vhost_name: &str,
        config: &ApplicationConfig,
    ) -> OperationResult {
        let _ops = self.ops.lock().await;
        self.create_application_internal(vhost_name, config).await
    }

    /// Delete an application and notify every module
    ///
    /// If a module fails during deletion, the application is not
    /// recreated; the failure is reported in the result.
    pub async fn delete_application(&self, app_info: &ApplicationInfo) -> OperationResult {
        let _ops = self.ops.lock().await;

        let exists = {
            let vhosts = self.vhosts.read().await;
            vhosts
                .iter()
                .find(|h| h.name == app_info.vhost_name)
                .is_some_and(|h| h.app_map.contains_key(&app_info.id))
        };
        if !exists {
            return OperationResult::NotExists;
        }

        self.delete_application_internal(app_info).await
    }

    pub(super) async fn create_application_internal(
        self: &Arc<Self>,
        vhost_name: &str,
        config: &ApplicationConfig,
    ) -> OperationResult {
        {
            let vhosts = self.vhosts.read().await;
            let Some(host) = vhosts.iter().find(|h| h.name == vhost_name) else {
                tracing::error!(
                    vhost = %vhost_name,
                    app = %config.name,
                    "Cannot create application: unknown virtual host"
                );
                return OperationResult::Failed;
            };
            if host.app_by_name(&config.name).is_some() {
                return OperationResult::Exists;
            }
        }

        let id = self.next_app_id.fetch_add(1, Ordering::Relaxed);
        let app_info = ApplicationInfo::new(id, vhost_name, config.clone());

        let modules = self.modules.read().await.create_order();

        tracing::info!(app = %app_info, modules = modules.len(), "Creating application");

        let mut created: Vec<Arc<dyn Module>> = Vec::with_capacity(modules.len());
        for module in &modules {
            if module.on_create_application(&app_info).await {
                created.push(Arc::clone(module));
            } else {
                tracing::error!(
                    app = %app_info,
                    kind = %module.kind(),
                    "Module rejected application; rolling back"
                );
                self.rollback_create(&created, &app_info).await;
                return OperationResult::Failed;
            }
        }

        // Observer registration happens last: a stream birth must
        // always observe a fully-created application.
        let observer: Arc<dyn StreamObserver> = Arc::new(AppObserver {
            orchestrator: Arc::downgrade(self),
            app_info: app_info.clone(),
        });
        for module in &modules {
            if let Some(router) = module.as_media_router() {
                if !router
                    .register_observer(&app_info, Arc::clone(&observer))
                    .await
                {
                    tracing::warn!(app = %app_info, "Media router rejected observer registration");
                }
            }
        }

        let inserted = {
            let mut vhosts = self.vhosts.write().await;
            match vhosts.iter_mut().find(|h| h.name == vhost_name) {
                Some(host) => {
                    host.app_map.insert(
                        id,
                        Application {
                            info: app_info.clone(),
                            observer,
                        },
                    );
                    true
                }
                None => false,
            }
        };
        if !inserted {
            tracing::error!(app = %app_info, "Virtual host disappeared during create; rolling back");
            self.rollback_create(&created, &app_info).await;
            return OperationResult::Failed;
        }

        StatCounters::bump(&self.counters.apps_created);
        tracing::info!(app = %app_info, "Application created");
        OperationResult::Succeeded
    }

    /// Undo a partial create: delete from every module that accepted,
    /// in reverse order
    async fn rollback_create(&self, created: &[Arc<dyn Module>], app_info: &ApplicationInfo) {
        for module in created.iter().rev() {
            if !module.on_delete_application(app_info).await {
                tracing::error!(
                    app = %app_info,
                    kind = %module.kind(),
                    "Rollback delete failed"
                );
            }
        }
        StatCounters::bump(&self.counters.create_rollbacks);
    }

    pub(super) async fn delete_application_internal(
        &self,
        app_info: &ApplicationInfo,
    ) -> OperationResult {
        let modules = self.modules.read().await.delete_order();

        tracing::info!(app = %app_info, modules = modules.len(), "Deleting application");

        let mut failed = false;
        for module in &modules {
            if !module.on_delete_application(app_info).await {
                tracing::error!(
                    app = %app_info,
                    kind = %module.kind(),
                    "Module failed to delete application; continuing"
                );
                failed = true;
            }
        }

        {
            let mut vhosts = self.vhosts.write().await;
            if let Some(host) = vhosts.iter_mut().find(|h| h.name == app_info.vhost_name) {
                host.app_map.remove(&app_info.id);
                host.remove_streams_of_app(app_info.id);
                for origin in &mut host.origin_list {
                    if origin.app_id == app_info.id {
                        origin.app_id = 0;
                    }
                }
            }
        }
        self.pending_pulls
            .lock()
            .await
            .retain(|key, _| key.0 != app_info.id);

        StatCounters::bump(&self.counters.apps_deleted);

        if failed {
            OperationResult::Failed
        } else {
            tracing::info!(app = %app_info, "Application deleted");
            OperationResult::Succeeded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::info::MIN_APPLICATION_ID;
    use crate::module::testing::{drain, Journal, RecordingModule, RecordingRouter};
    use crate::module::ModuleKind;

    async fn orchestrator_with_host(name: &str) -> Arc<Orchestrator> {
        crate::module::testing::init_tracing();

        let orchestrator = Arc::new(Orchestrator::new());
        assert!(
            orchestrator
                .apply_origin_map(&[HostConfig::new(name)])
                .await
        );
        orchestrator
    }

    #[tokio::test]
    async fn test_create_then_exists() {
        let orchestrator = orchestrator_with_host("h1").await;
        let j = Journal::default();
        let publisher: Arc<dyn Module> =
            Arc::new(RecordingModule::new("pub", ModuleKind::Publisher, &j));
        orchestrator.register_module(publisher).await;

        let config = ApplicationConfig::new("live");
        assert_eq!(
            orchestrator.create_application("h1", &config).await,
            OperationResult::Succeeded
        );
        assert_eq!(
            orchestrator.create_application("h1", &config).await,
            OperationResult::Exists
        );

        // Only the first create reached the module
        assert_eq!(drain(&j), vec!["pub:create:h1#live"]);
    }

    #[tokio::test]
    async fn test_delete_then_not_exists() {
        let orchestrator = orchestrator_with_host("h1").await;

        orchestrator
            .create_application("h1", &ApplicationConfig::new("live"))
            .await;
        let app = orchestrator.get_application("h1#live").await.unwrap();

        assert_eq!(
            orchestrator.delete_application(&app).await,
            OperationResult::Succeeded
        );
        assert_eq!(
            orchestrator.delete_application(&app).await,
            OperationResult::NotExists
        );
        assert!(orchestrator.get_application("h1#live").await.is_err());
    }

    #[tokio::test]
    async fn test_create_in_unknown_vhost_fails() {
        let orchestrator = Arc::new(Orchestrator::new());

        assert_eq!(
            orchestrator
                .create_application("nope", &ApplicationConfig::new("live"))
                .await,
            OperationResult::Failed
        );
    }

    #[tokio::test]
    async fn test_app_ids_strictly_increase() {
        let orchestrator = orchestrator_with_host("h1").await;

        let mut last = MIN_APPLICATION_ID - 1;
        for name in ["a", "b", "c"] {
            orchestrator
                .create_application("h1", &ApplicationConfig::new(name))
                .await;
            let id = orchestrator
                .get_application(&format!("h1#{}", name))
                .await
                .unwrap()
                .id;
            assert!(id > last);
            last = id;
        }

        // IDs are never reused, even after a delete
        let b = orchestrator.get_application("h1#b").await.unwrap();
        orchestrator.delete_application(&b).await;
        orchestrator
            .create_application("h1", &ApplicationConfig::new("d"))
            .await;
        let id = orchestrator.get_application("h1#d").await.unwrap().id;
        assert!(id > last);
    }

    #[tokio::test]
    async fn test_observer_registered_with_router() {
        let orchestrator = orchestrator_with_host("h1").await;
        let j = Journal::default();
        let router = Arc::new(RecordingRouter::new("router", &j));
        let module: Arc<dyn Module> = router.clone();
        orchestrator.register_module(module).await;

        orchestrator
            .create_application("h1", &ApplicationConfig::new("live"))
            .await;
        assert_eq!(router.observer_count(), 1);

        // Create reaches the router before the observer registration
        assert_eq!(
            drain(&j),
            vec!["router:create:h1#live", "router:observe:h1#live"]
        );
    }
}

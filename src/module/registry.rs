//! Module registry
//!
//! Tracks live modules grouped by kind. Single source of truth for who
//! to notify during application fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use super::kind::ModuleKind;
use super::traits::Module;

/// Reference identity for trait-object module handles
pub(crate) fn same_module(a: &Arc<dyn Module>, b: &Arc<dyn Module>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Registry of live modules
///
/// Keeps a flat insertion-ordered list for deterministic iteration and
/// a per-kind grouping for fan-out. A module appears at most once.
#[derive(Default)]
pub struct ModuleRegistry {
    /// All modules in registration order
    list: Vec<Arc<dyn Module>>,

    /// Per-kind grouping, registration order preserved within each kind
    by_kind: HashMap<ModuleKind, Vec<Arc<dyn Module>>>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module
    ///
    /// Returns false if the same instance is already registered (under
    /// any kind) or the module does not declare a kind.
    pub fn register(&mut self, module: Arc<dyn Module>) -> bool {
        let kind = module.kind();

        if kind == ModuleKind::Unknown {
            tracing::warn!(kind = %kind, "Rejecting module without a declared kind");
            return false;
        }

        if self.contains(&module) {
            tracing::warn!(kind = %kind, "Module already registered");
            return false;
        }

        self.list.push(Arc::clone(&module));
        self.by_kind.entry(kind).or_default().push(module);

        tracing::info!(kind = %kind, total = self.list.len(), "Module registered");
        true
    }

    /// Unregister a module
    ///
    /// Returns false if the module was never registered.
    pub fn unregister(&mut self, module: &Arc<dyn Module>) -> bool {
        let Some(pos) = self.list.iter().position(|m| same_module(m, module)) else {
            return false;
        };

        let removed = self.list.remove(pos);
        let kind = removed.kind();

        if let Some(group) = self.by_kind.get_mut(&kind) {
            group.retain(|m| !same_module(m, module));
        }

        tracing::info!(kind = %kind, total = self.list.len(), "Module unregistered");
        true
    }

    /// Whether this exact instance is registered
    pub fn contains(&self, module: &Arc<dyn Module>) -> bool {
        self.list.iter().any(|m| same_module(m, module))
    }

    /// Modules of one kind, in registration order
    pub fn modules_of_kind(&self, kind: ModuleKind) -> &[Arc<dyn Module>] {
        match self.by_kind.get(&kind) {
            Some(group) => group.as_slice(),
            None => &[],
        }
    }

    /// Fan-out order for application creation
    ///
    /// MediaRouter first, then providers, transcoders, publishers;
    /// registration order within each kind. Downstream modules may
    /// subscribe to the router during their own create, so the router
    /// must exist before anything else sees the application.
    pub fn create_order(&self) -> Vec<Arc<dyn Module>> {
        const ORDER: [ModuleKind; 4] = [
            ModuleKind::MediaRouter,
            ModuleKind::Provider,
            ModuleKind::Transcoder,
            ModuleKind::Publisher,
        ];

        ORDER
            .iter()
            .flat_map(|kind| self.modules_of_kind(*kind))
            .cloned()
            .collect()
    }

    /// Fan-out order for application deletion: the exact reverse of
    /// [`ModuleRegistry::create_order`]
    pub fn delete_order(&self) -> Vec<Arc<dyn Module>> {
        let mut order = self.create_order();
        order.reverse();
        order
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

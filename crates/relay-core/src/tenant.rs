//! Tenant configuration registry.
//!
//! Maps tenant identifiers to configuration bundles. Resolution is total:
//! unknown identifiers yield the generic default bundle, so downstream
//! components always have a usable configuration. The registry is built
//! once at startup and never mutated.

use std::collections::HashMap;

use relay_types::tenant::TenantConfig;

/// Read-only registry of tenant configuration bundles.
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    tenants: HashMap<String, TenantConfig>,
}

impl TenantRegistry {
    /// Build a registry from pre-loaded bundles keyed by tenant id.
    pub fn new(tenants: HashMap<String, TenantConfig>) -> Self {
        Self { tenants }
    }

    /// Resolve a tenant id to its bundle.
    ///
    /// Total function: unknown ids yield [`TenantConfig::generic`].
    pub fn resolve(&self, tenant_id: &str) -> TenantConfig {
        match self.tenants.get(tenant_id) {
            Some(config) => config.clone(),
            None => {
                tracing::debug!(tenant = %tenant_id, "Unknown tenant, using generic bundle");
                TenantConfig::generic()
            }
        }
    }

    /// Registered (id, display name) pairs, sorted by id.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .tenants
            .iter()
            .map(|(id, config)| (id.clone(), config.display_name.clone()))
            .collect();
        entries.sort();
        entries
    }
}

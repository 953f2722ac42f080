use std::{collections::HashMap, sync::Arc};

use anyhow::{bail, Result};
use shared::{
    directory,
    domain::{FlagKey, FlagValue, FlagValueMap, OrgId},
};
use tokio::sync::RwLock;
use tracing::debug;

mod seed;

pub use seed::{random_org_id, random_value_for, SeedOptions, DEFAULT_ORG_COUNT};

/// Process-local flag store keyed by organization.
///
/// Reads observe the most recent completed write for an organization.
/// Nothing is atomic across organizations.
#[derive(Clone, Default)]
pub struct FlagStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    // Listing order is insertion order.
    org_order: Vec<OrgId>,
    flags: HashMap<OrgId, FlagValueMap>,
}

/// Outcome of a single flag write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredFlag {
    pub created_org: bool,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(options: &SeedOptions) -> Self {
        let orgs = seed::generate_orgs(options);
        let mut inner = StoreInner::default();
        for (org_id, flags) in orgs {
            inner.org_order.push(org_id.clone());
            inner.flags.insert(org_id, flags);
        }
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub async fn insert_org(&self, org_id: OrgId, flags: FlagValueMap) -> Result<()> {
        let mut guard = self.inner.write().await;
        if guard.flags.contains_key(&org_id) {
            bail!("organization {org_id} already exists");
        }
        guard.org_order.push(org_id.clone());
        guard.flags.insert(org_id, flags);
        Ok(())
    }

    pub async fn org_count(&self) -> usize {
        self.inner.read().await.org_order.len()
    }

    /// Returns the ids in `[offset, offset + limit)` together with the total
    /// number of organizations.
    pub async fn list_org_ids(&self, offset: usize, limit: usize) -> (Vec<OrgId>, usize) {
        let guard = self.inner.read().await;
        let total = guard.org_order.len();
        let ids = guard
            .org_order
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (ids, total)
    }

    pub async fn load_flags(&self, org_id: &OrgId) -> Option<FlagValueMap> {
        self.inner.read().await.flags.get(org_id).cloned()
    }

    /// Writes one flag. An unknown organization is created first, populated
    /// with directory defaults.
    ///
    /// Type checking against the directory is the caller's job.
    pub async fn store_flag(&self, org_id: &OrgId, key: FlagKey, value: FlagValue) -> StoredFlag {
        let mut guard = self.inner.write().await;
        let created_org = !guard.flags.contains_key(org_id);
        if created_org {
            guard.org_order.push(org_id.clone());
            guard.flags.insert(org_id.clone(), default_flags());
            debug!(%org_id, "created organization with default flags");
        }
        if let Some(flags) = guard.flags.get_mut(org_id) {
            flags.insert(key.as_str().to_string(), value);
        }
        StoredFlag { created_org }
    }
}

pub fn default_flags() -> FlagValueMap {
    directory::definitions()
        .iter()
        .map(|def| (def.key.as_str().to_string(), def.default_value.clone()))
        .collect()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

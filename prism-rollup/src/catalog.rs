//! Published rollup job catalog
//!
//! Planning runs against an immutable [`CatalogSnapshot`]. Job updates build
//! a new snapshot and swap it in, so a plan never sees a half-applied update.

use crate::caps::RollupJobCaps;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable set of rollup job capabilities, keyed by job id
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    jobs: BTreeMap<String, Arc<RollupJobCaps>>,
}

impl CatalogSnapshot {
    /// Build a snapshot; a later job with the same id replaces an earlier one
    pub fn new(jobs: impl IntoIterator<Item = RollupJobCaps>) -> Self {
        let jobs = jobs
            .into_iter()
            .map(|caps| (caps.job_id().to_string(), Arc::new(caps)))
            .collect();
        Self { jobs }
    }

    pub fn get(&self, job_id: &str) -> Option<&Arc<RollupJobCaps>> {
        self.jobs.get(job_id)
    }

    /// Jobs in job id order
    pub fn jobs(&self) -> impl Iterator<Item = &RollupJobCaps> {
        self.jobs.values().map(|caps| caps.as_ref())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Copy-on-write holder for the current catalog snapshot
#[derive(Debug, Default)]
pub struct RollupCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl RollupCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().clone()
    }

    /// Add or replace a job, returning the replaced capabilities
    pub fn put_job(&self, caps: RollupJobCaps) -> Option<Arc<RollupJobCaps>> {
        let job_id = caps.job_id().to_string();
        let mut current = self.current.write();
        let mut next = CatalogSnapshot::clone(&current);
        let replaced = next.jobs.insert(job_id.clone(), Arc::new(caps));
        *current = Arc::new(next);

        tracing::info!(
            "Rollup job '{}' {} in catalog ({} jobs)",
            job_id,
            if replaced.is_some() { "replaced" } else { "added" },
            current.len()
        );
        replaced
    }

    /// Remove a job, returning its capabilities if it was present
    pub fn remove_job(&self, job_id: &str) -> Option<Arc<RollupJobCaps>> {
        let mut current = self.current.write();
        if !current.jobs.contains_key(job_id) {
            return None;
        }
        let mut next = CatalogSnapshot::clone(&current);
        let removed = next.jobs.remove(job_id);
        *current = Arc::new(next);

        tracing::info!("Rollup job '{}' removed from catalog", job_id);
        removed
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}

//! TTL-expiring name→identifier cache partitions

use super::partition::ResourcePartition;
use atende_core::{OrganizationId, ResourceKind, Timestamp};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Lowercased display name → entity identifier.
pub type NameMap = HashMap<String, Uuid>;

/// Configuration for the resource-name cache.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Age past which an entry is ignored on read.
    pub entry_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl CacheSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }
}

/// Hit/miss counters plus the number of retained partitions.
///
/// `entries` counts stale partitions too (expiry is logical), so it is the
/// number to watch for unbounded growth across tenants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    map: Arc<NameMap>,
    cached_at: Timestamp,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
}

/// Per-tenant, per-resource-kind name→ID cache.
///
/// Entries are replaced wholesale (`Arc<NameMap>` swap), never mutated in
/// place, so a concurrent reader observes either the previous complete map
/// or the new one. Absence of a hit never fails the caller; it means
/// "recompute from the source of truth".
///
/// Owned explicitly and injected into the dispatcher; there is no global
/// instance.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<HashMap<ResourcePartition, CacheEntry>>,
    counters: RwLock<Counters>,
    settings: CacheSettings,
}

impl ResourceCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            counters: RwLock::new(Counters::default()),
            settings,
        }
    }

    /// Cache with the default one-hour TTL.
    pub fn with_defaults() -> Self {
        Self::new(CacheSettings::default())
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Get the mapping for a partition, or `None` if absent or expired.
    ///
    /// Expired entries are not evicted here; they are simply ignored and
    /// overwritten by the next [`set`](Self::set).
    pub fn get(&self, partition: &ResourcePartition) -> Option<Arc<NameMap>> {
        let found = {
            // Entries are whole-value replacements, so recovering a
            // poisoned lock cannot expose a half-built map.
            let entries = self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            entries.get(partition).and_then(|entry| {
                let age = Utc::now()
                    .signed_duration_since(entry.cached_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                if age < self.settings.entry_ttl {
                    Some(Arc::clone(&entry.map))
                } else {
                    None
                }
            })
        };

        let mut counters = self
            .counters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match found {
            Some(map) => {
                counters.hits += 1;
                Some(map)
            }
            None => {
                counters.misses += 1;
                None
            }
        }
    }

    /// Store a mapping, replacing any previous entry for the partition.
    /// Returns the shared handle now held by the cache.
    pub fn set(&self, partition: ResourcePartition, map: NameMap) -> Arc<NameMap> {
        let map = Arc::new(map);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            partition,
            CacheEntry {
                map: Arc::clone(&map),
                cached_at: Utc::now(),
            },
        );
        map
    }

    /// Remove exactly one partition. Returns whether it existed.
    pub fn invalidate(&self, partition: &ResourcePartition) -> bool {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.remove(partition).is_some()
    }

    /// Remove every partition of a kind for an organization (for services
    /// and providers this drops the whole per-schedule bucket). Returns
    /// the number of partitions removed.
    pub fn invalidate_kind(&self, organization_id: OrganizationId, kind: ResourceKind) -> u64 {
        self.retain_counting(|p| !(p.organization_id() == organization_id && p.kind() == kind))
    }

    /// Remove every partition for an organization.
    pub fn invalidate_organization(&self, organization_id: OrganizationId) -> u64 {
        self.retain_counting(|p| p.organization_id() != organization_id)
    }

    /// Clear every tenant. This is the administrative sweep hook for
    /// bounding memory in a long-running service.
    pub fn invalidate_all(&self) -> u64 {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let removed = entries.len() as u64;
        entries.clear();
        removed
    }

    /// Current counters and retained-partition count.
    pub fn stats(&self) -> CacheStats {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let counters = self
            .counters
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            entries,
        }
    }

    fn retain_counting<F>(&self, keep: F) -> u64
    where
        F: Fn(&ResourcePartition) -> bool,
    {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|partition, _| keep(partition));
        (before - entries.len()) as u64
    }

    /// Shift an entry's timestamp into the past (TTL tests only).
    #[cfg(test)]
    fn backdate(&self, partition: &ResourcePartition, age: Duration) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(partition) {
            entry.cached_at = Utc::now()
                - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero());
        }
    }
}

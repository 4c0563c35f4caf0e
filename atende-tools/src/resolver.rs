//! Free-text name resolution
//!
//! Builds case-insensitive name→identifier maps from directory resources
//! and keeps them warm in the [`ResourceCache`]. Resolution tolerates
//! fuzzy input only to the extent of trimming and case folding; anything
//! else is the caller's problem to surface.

use atende_core::{
    AtendeResult, Flow, OrganizationId, ScheduleId, ScheduleProvider, ScheduleService, Team,
};
use atende_storage::{DirectoryStore, NameMap, ResourceCache, ResourcePartition};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// NAME MAP BUILDING
// ============================================================================

/// Build a lowercase name→ID map from a resource list.
///
/// `project` extracts the display name and identifier for one item;
/// returning `None` skips the item (missing profile name, etc.) without
/// failing the build. Duplicate names are last-write-wins.
///
/// Pure: never touches the cache.
pub fn build_name_map<T, F>(items: &[T], project: F) -> NameMap
where
    F: Fn(&T) -> Option<(&str, Uuid)>,
{
    let mut map = NameMap::new();
    for item in items {
        if let Some((name, id)) = project(item) {
            let key = name.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            map.insert(key, id);
        }
    }
    map
}

/// Projection for services: title → service ID.
pub fn service_entry(service: &ScheduleService) -> Option<(&str, Uuid)> {
    Some((service.title.as_str(), service.id.as_uuid()))
}

/// Projection for providers: profile display name → provider ID.
/// Providers whose profile carries no name are skipped.
pub fn provider_entry(provider: &ScheduleProvider) -> Option<(&str, Uuid)> {
    provider
        .display_name
        .as_deref()
        .map(|name| (name, provider.id.as_uuid()))
}

/// Projection for teams: name → team ID.
pub fn team_entry(team: &Team) -> Option<(&str, Uuid)> {
    Some((team.name.as_str(), team.id.as_uuid()))
}

/// Projection for flows: name → flow ID.
pub fn flow_entry(flow: &Flow) -> Option<(&str, Uuid)> {
    Some((flow.name.as_str(), flow.id.as_uuid()))
}

/// Look up a free-text name in a map (trimmed, case-insensitive).
pub fn resolve(map: &NameMap, name: &str) -> Option<Uuid> {
    map.get(&name.trim().to_lowercase()).copied()
}

// ============================================================================
// CACHED RESOLVER
// ============================================================================

/// Read-through resolver over the directory store.
///
/// On a cache miss the active resources are fetched, the map is built and
/// stored (even when empty, so absent resources don't refetch on every
/// call), and the shared handle is returned. Helpers return `None` when
/// the organization has no such resources at all; call sites decide
/// whether absence is fatal.
pub struct CachedResolver<D> {
    directory: Arc<D>,
    cache: Arc<ResourceCache>,
}

impl<D: DirectoryStore> CachedResolver<D> {
    pub fn new(directory: Arc<D>, cache: Arc<ResourceCache>) -> Self {
        Self { directory, cache }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Active services of a schedule.
    pub async fn service_map(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Option<Arc<NameMap>>> {
        let partition = ResourcePartition::services(organization_id, schedule_id);
        if let Some(map) = self.cache.get(&partition) {
            return Ok(non_empty(map));
        }
        let services = self.directory.service_list_active(schedule_id).await?;
        let map = self.cache.set(partition, build_name_map(&services, service_entry));
        Ok(non_empty(map))
    }

    /// Active providers of a schedule.
    pub async fn provider_map(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Option<Arc<NameMap>>> {
        let partition = ResourcePartition::providers(organization_id, schedule_id);
        if let Some(map) = self.cache.get(&partition) {
            return Ok(non_empty(map));
        }
        let providers = self.directory.provider_list_active(schedule_id).await?;
        let map = self
            .cache
            .set(partition, build_name_map(&providers, provider_entry));
        Ok(non_empty(map))
    }

    /// All teams of an organization.
    pub async fn team_map(
        &self,
        organization_id: OrganizationId,
    ) -> AtendeResult<Option<Arc<NameMap>>> {
        let partition = ResourcePartition::teams(organization_id);
        if let Some(map) = self.cache.get(&partition) {
            return Ok(non_empty(map));
        }
        let teams = self.directory.team_list(organization_id).await?;
        let map = self.cache.set(partition, build_name_map(&teams, team_entry));
        Ok(non_empty(map))
    }

    /// Active flows of an organization.
    pub async fn flow_map(
        &self,
        organization_id: OrganizationId,
    ) -> AtendeResult<Option<Arc<NameMap>>> {
        let partition = ResourcePartition::flows(organization_id);
        if let Some(map) = self.cache.get(&partition) {
            return Ok(non_empty(map));
        }
        let flows = self.directory.flow_list_active(organization_id).await?;
        let map = self.cache.set(partition, build_name_map(&flows, flow_entry));
        Ok(non_empty(map))
    }
}

fn non_empty(map: Arc<NameMap>) -> Option<Arc<NameMap>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

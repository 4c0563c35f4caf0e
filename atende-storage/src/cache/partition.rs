//! Partition keys for the resource-name cache

use atende_core::{OrganizationId, ResourceKind, ScheduleId};

/// A cache partition key: organization, resource kind, and (for services
/// and providers) the schedule the resources belong to.
///
/// # Design
///
/// The fields are private and the only constructors are the four
/// kind-specific ones below. A services/providers key without a schedule,
/// or any key without an organization, cannot be constructed - the
/// partitioning rules hold at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourcePartition {
    organization_id: OrganizationId,
    kind: ResourceKind,
    schedule_id: Option<ScheduleId>,
}

impl ResourcePartition {
    /// Active services of one schedule.
    pub fn services(organization_id: OrganizationId, schedule_id: ScheduleId) -> Self {
        Self {
            organization_id,
            kind: ResourceKind::Services,
            schedule_id: Some(schedule_id),
        }
    }

    /// Active providers of one schedule.
    pub fn providers(organization_id: OrganizationId, schedule_id: ScheduleId) -> Self {
        Self {
            organization_id,
            kind: ResourceKind::Providers,
            schedule_id: Some(schedule_id),
        }
    }

    /// All teams of an organization.
    pub fn teams(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            kind: ResourceKind::Teams,
            schedule_id: None,
        }
    }

    /// Active flows of an organization.
    pub fn flows(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            kind: ResourceKind::Flows,
            schedule_id: None,
        }
    }

    /// The organization this partition is scoped to.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// The resource kind this partition holds.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The schedule sub-key, present only for services and providers.
    pub fn schedule_id(&self) -> Option<ScheduleId> {
        self.schedule_id
    }
}

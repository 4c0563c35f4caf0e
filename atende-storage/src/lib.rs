//! Atende Storage - Storage Traits and In-Memory Implementation
//!
//! Defines the storage abstraction the tool engine runs against. The
//! directory side is read-only resource lookup (schedules, services,
//! providers, teams, flows); the calendar side owns appointment rows.
//! A relational implementation lives with the surrounding service; the
//! in-memory [`MockStore`] here backs tests.

pub mod cache;

pub use cache::{CacheSettings, CacheStats, NameMap, ResourceCache, ResourcePartition};

use async_trait::async_trait;
use atende_core::{
    Appointment, AppointmentId, AppointmentStatus, AtendeError, AtendeResult, AvailabilityWindow,
    CustomerId, EntityKind, Flow, OrganizationId, ProviderId, Schedule, ScheduleId,
    ScheduleProvider, ScheduleService, ServiceId, StorageError, Team, Timestamp,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ============================================================================
// CANCELLATION STAMP
// ============================================================================

/// Metadata recorded on an appointment row when it is canceled.
/// Cancellation never deletes the row.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationStamp {
    pub canceled_at: Timestamp,
    /// Origin of the cancellation, e.g. `"ai_tool"`.
    pub source: String,
}

impl CancellationStamp {
    pub fn now(source: impl Into<String>) -> Self {
        Self {
            canceled_at: chrono::Utc::now(),
            source: source.into(),
        }
    }
}

// ============================================================================
// DIRECTORY TRAIT
// ============================================================================

/// Read-only resource lookup, scoped by organization.
///
/// Every method is an I/O-bound remote call from the engine's point of
/// view; results are never cached here (the name cache sits above).
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Get a schedule belonging to the organization, any status.
    async fn schedule_get(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Option<Schedule>>;

    /// Get a schedule only if it is active for the organization.
    async fn schedule_get_active(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Option<Schedule>> {
        Ok(self
            .schedule_get(organization_id, schedule_id)
            .await?
            .filter(|s| s.status.is_active()))
    }

    /// Get a service by ID, any status.
    async fn service_get(&self, service_id: ServiceId) -> AtendeResult<Option<ScheduleService>>;

    /// List active services for a schedule.
    async fn service_list_active(
        &self,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Vec<ScheduleService>>;

    /// List active providers for a schedule, display names already
    /// projected from the profile join.
    async fn provider_list_active(
        &self,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Vec<ScheduleProvider>>;

    /// List a provider's availability windows for a weekday (0 = Sunday).
    async fn availability_list(
        &self,
        provider_id: ProviderId,
        day_of_week: u8,
    ) -> AtendeResult<Vec<AvailabilityWindow>>;

    /// List all teams for an organization.
    async fn team_list(&self, organization_id: OrganizationId) -> AtendeResult<Vec<Team>>;

    /// List active flows for an organization.
    async fn flow_list_active(&self, organization_id: OrganizationId) -> AtendeResult<Vec<Flow>>;
}

// ============================================================================
// CALENDAR TRAIT
// ============================================================================

/// Appointment persistence.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Insert a new appointment.
    ///
    /// Implementations must reject an insert whose `[start_time, end_time)`
    /// interval overlaps an existing non-canceled appointment for the same
    /// provider, schedule, and date with [`StorageError::SlotConflict`].
    /// The advisory availability re-check in the manager is not atomic with
    /// this insert, so the conflict check here is what actually holds the
    /// no-double-booking invariant.
    async fn appointment_insert(&self, appointment: &Appointment) -> AtendeResult<()>;

    /// Get an appointment by ID.
    async fn appointment_get(&self, id: AppointmentId) -> AtendeResult<Option<Appointment>>;

    /// List non-canceled appointments for a schedule on a date.
    async fn appointment_list_for_day(
        &self,
        schedule_id: ScheduleId,
        date: NaiveDate,
    ) -> AtendeResult<Vec<Appointment>>;

    /// List a customer's open (scheduled or confirmed) appointments,
    /// optionally restricted to one schedule, ordered by date then start
    /// time ascending.
    async fn appointment_list_open(
        &self,
        customer_id: CustomerId,
        schedule_id: Option<ScheduleId>,
    ) -> AtendeResult<Vec<Appointment>>;

    /// Cancel an appointment: status becomes `Canceled` and the stamp is
    /// merged into its metadata. Canceling an already-canceled row is an
    /// error; `Canceled` is terminal.
    async fn appointment_cancel(
        &self,
        id: AppointmentId,
        stamp: &CancellationStamp,
    ) -> AtendeResult<Appointment>;
}

// ============================================================================
// MOCK STORE
// ============================================================================

/// In-memory store implementing both traits, for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct MockStore {
    schedules: Arc<RwLock<HashMap<ScheduleId, Schedule>>>,
    services: Arc<RwLock<HashMap<ServiceId, ScheduleService>>>,
    providers: Arc<RwLock<HashMap<ProviderId, ScheduleProvider>>>,
    windows: Arc<RwLock<Vec<AvailabilityWindow>>>,
    teams: Arc<RwLock<HashMap<atende_core::TeamId, Team>>>,
    flows: Arc<RwLock<HashMap<atende_core::FlowId, Flow>>>,
    appointments: Arc<RwLock<HashMap<AppointmentId, Appointment>>>,
}

fn read_guard<T>(lock: &RwLock<T>) -> AtendeResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| AtendeError::Storage(StorageError::LockPoisoned))
}

fn write_guard<T>(lock: &RwLock<T>) -> AtendeResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| AtendeError::Storage(StorageError::LockPoisoned))
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        if let Ok(mut g) = self.schedules.write() {
            g.clear();
        }
        if let Ok(mut g) = self.services.write() {
            g.clear();
        }
        if let Ok(mut g) = self.providers.write() {
            g.clear();
        }
        if let Ok(mut g) = self.windows.write() {
            g.clear();
        }
        if let Ok(mut g) = self.teams.write() {
            g.clear();
        }
        if let Ok(mut g) = self.flows.write() {
            g.clear();
        }
        if let Ok(mut g) = self.appointments.write() {
            g.clear();
        }
    }

    pub fn schedule_insert(&self, schedule: Schedule) {
        if let Ok(mut g) = self.schedules.write() {
            g.insert(schedule.id, schedule);
        }
    }

    pub fn service_insert(&self, service: ScheduleService) {
        if let Ok(mut g) = self.services.write() {
            g.insert(service.id, service);
        }
    }

    pub fn provider_insert(&self, provider: ScheduleProvider) {
        if let Ok(mut g) = self.providers.write() {
            g.insert(provider.id, provider);
        }
    }

    pub fn window_insert(&self, window: AvailabilityWindow) {
        if let Ok(mut g) = self.windows.write() {
            g.push(window);
        }
    }

    pub fn team_insert(&self, team: Team) {
        if let Ok(mut g) = self.teams.write() {
            g.insert(team.id, team);
        }
    }

    pub fn flow_insert(&self, flow: Flow) {
        if let Ok(mut g) = self.flows.write() {
            g.insert(flow.id, flow);
        }
    }

    /// Remove a service (simulates a configuration change).
    pub fn service_remove(&self, id: ServiceId) {
        if let Ok(mut g) = self.services.write() {
            g.remove(&id);
        }
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments.read().map(|g| g.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DirectoryStore for MockStore {
    async fn schedule_get(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Option<Schedule>> {
        let schedules = read_guard(&self.schedules)?;
        Ok(schedules
            .get(&schedule_id)
            .filter(|s| s.organization_id == organization_id)
            .cloned())
    }

    async fn service_get(&self, service_id: ServiceId) -> AtendeResult<Option<ScheduleService>> {
        let services = read_guard(&self.services)?;
        Ok(services.get(&service_id).cloned())
    }

    async fn service_list_active(
        &self,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Vec<ScheduleService>> {
        let services = read_guard(&self.services)?;
        Ok(services
            .values()
            .filter(|s| s.schedule_id == schedule_id && s.status.is_active())
            .cloned()
            .collect())
    }

    async fn provider_list_active(
        &self,
        schedule_id: ScheduleId,
    ) -> AtendeResult<Vec<ScheduleProvider>> {
        let providers = read_guard(&self.providers)?;
        let mut out: Vec<ScheduleProvider> = providers
            .values()
            .filter(|p| p.schedule_id == schedule_id && p.status.is_active())
            .cloned()
            .collect();
        // Deterministic assignment order for "first active provider".
        out.sort_by_key(|p| p.id);
        Ok(out)
    }

    async fn availability_list(
        &self,
        provider_id: ProviderId,
        day_of_week: u8,
    ) -> AtendeResult<Vec<AvailabilityWindow>> {
        let windows = read_guard(&self.windows)?;
        Ok(windows
            .iter()
            .filter(|w| w.provider_id == provider_id && w.day_of_week == day_of_week)
            .cloned()
            .collect())
    }

    async fn team_list(&self, organization_id: OrganizationId) -> AtendeResult<Vec<Team>> {
        let teams = read_guard(&self.teams)?;
        Ok(teams
            .values()
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn flow_list_active(&self, organization_id: OrganizationId) -> AtendeResult<Vec<Flow>> {
        let flows = read_guard(&self.flows)?;
        Ok(flows
            .values()
            .filter(|f| f.organization_id == organization_id && f.status.is_active())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CalendarStore for MockStore {
    async fn appointment_insert(&self, appointment: &Appointment) -> AtendeResult<()> {
        // Check-and-insert under the write lock: the overlap check and the
        // insert are a single critical section.
        let mut appointments = write_guard(&self.appointments)?;
        let conflict = appointments.values().any(|existing| {
            existing.provider_id == appointment.provider_id
                && existing.schedule_id == appointment.schedule_id
                && existing.date == appointment.date
                && existing.status.is_open()
                && existing.start_time < appointment.end_time
                && existing.end_time > appointment.start_time
        });
        if conflict {
            return Err(AtendeError::Storage(StorageError::SlotConflict {
                provider_id: appointment.provider_id.as_uuid(),
                date: appointment.date,
                start_time: appointment.start_time,
            }));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn appointment_get(&self, id: AppointmentId) -> AtendeResult<Option<Appointment>> {
        let appointments = read_guard(&self.appointments)?;
        Ok(appointments.get(&id).cloned())
    }

    async fn appointment_list_for_day(
        &self,
        schedule_id: ScheduleId,
        date: NaiveDate,
    ) -> AtendeResult<Vec<Appointment>> {
        let appointments = read_guard(&self.appointments)?;
        Ok(appointments
            .values()
            .filter(|a| {
                a.schedule_id == schedule_id && a.date == date && a.status != AppointmentStatus::Canceled
            })
            .cloned()
            .collect())
    }

    async fn appointment_list_open(
        &self,
        customer_id: CustomerId,
        schedule_id: Option<ScheduleId>,
    ) -> AtendeResult<Vec<Appointment>> {
        let appointments = read_guard(&self.appointments)?;
        let mut out: Vec<Appointment> = appointments
            .values()
            .filter(|a| {
                a.customer_id == customer_id
                    && a.status.is_open()
                    && schedule_id.map_or(true, |s| a.schedule_id == s)
            })
            .cloned()
            .collect();
        out.sort_by_key(|a| (a.date, a.start_time));
        Ok(out)
    }

    async fn appointment_cancel(
        &self,
        id: AppointmentId,
        stamp: &CancellationStamp,
    ) -> AtendeResult<Appointment> {
        let mut appointments = write_guard(&self.appointments)?;
        let appointment =
            appointments
                .get_mut(&id)
                .ok_or(AtendeError::Storage(StorageError::NotFound {
                    kind: EntityKind::Appointment,
                    id: id.as_uuid(),
                }))?;
        if appointment.status == AppointmentStatus::Canceled {
            return Err(AtendeError::Storage(StorageError::AlreadyCanceled {
                id: id.as_uuid(),
            }));
        }
        appointment.status = AppointmentStatus::Canceled;
        appointment.updated_at = stamp.canceled_at;
        let mut metadata = appointment
            .metadata
            .take()
            .unwrap_or_else(|| serde_json::json!({}));
        if let Some(map) = metadata.as_object_mut() {
            map.insert(
                "canceled_at".to_string(),
                serde_json::json!(stamp.canceled_at.to_rfc3339()),
            );
            map.insert("canceled_by".to_string(), serde_json::json!(stamp.source));
        }
        appointment.metadata = Some(metadata);
        Ok(appointment.clone())
    }
}

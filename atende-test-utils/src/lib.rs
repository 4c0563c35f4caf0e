//! Atende Test Utilities
//!
//! Shared fixtures and proptest generators for the Atende workspace:
//! seed helpers that populate a [`MockStore`] with realistic directory
//! data, plus strategies for the identity and naming edge cases the
//! engine has to tolerate.

pub use atende_storage::MockStore;

pub use atende_core::{
    Appointment, AppointmentStatus, AvailabilityWindow, ChatId, CustomerId, Flow, FlowId,
    OrganizationId, ProfileId, ProviderId, ResourceStatus, Schedule, ScheduleId, ScheduleProvider,
    ScheduleService, ServiceId, Session, Team, TeamId,
};

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

// ============================================================================
// FIXTURES
// ============================================================================

/// Insert an active schedule under a fresh organization.
pub fn seed_schedule(store: &MockStore) -> Schedule {
    let schedule = Schedule {
        id: ScheduleId::now_v7(),
        organization_id: OrganizationId::now_v7(),
        title: "Salão Central".to_string(),
        timezone: "America/Sao_Paulo".to_string(),
        status: ResourceStatus::Active,
    };
    store.schedule_insert(schedule.clone());
    schedule
}

/// Insert an active service with an `HH:MM` duration, e.g. `"00:30"`.
pub fn seed_service(
    store: &MockStore,
    schedule_id: ScheduleId,
    title: &str,
    duration: &str,
) -> ScheduleService {
    let service = ScheduleService {
        id: ServiceId::now_v7(),
        schedule_id,
        title: title.to_string(),
        duration: duration.to_string(),
        by_arrival_time: false,
        capacity: 1,
        status: ResourceStatus::Active,
    };
    store.service_insert(service.clone());
    service
}

/// Insert an active provider with the given display name.
pub fn seed_provider(
    store: &MockStore,
    schedule_id: ScheduleId,
    display_name: &str,
) -> ScheduleProvider {
    let provider = ScheduleProvider {
        id: ProviderId::now_v7(),
        profile_id: ProfileId::now_v7(),
        schedule_id,
        display_name: Some(display_name.to_string()),
        status: ResourceStatus::Active,
    };
    store.provider_insert(provider.clone());
    provider
}

/// Insert a weekly working-hours window (0 = Sunday .. 6 = Saturday).
pub fn seed_window(
    store: &MockStore,
    provider_id: ProviderId,
    day_of_week: u8,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> AvailabilityWindow {
    let window = AvailabilityWindow {
        provider_id,
        day_of_week,
        start_time,
        end_time,
    };
    store.window_insert(window.clone());
    window
}

/// Insert a team for the organization.
pub fn seed_team(store: &MockStore, organization_id: OrganizationId, name: &str) -> Team {
    let team = Team {
        id: TeamId::now_v7(),
        organization_id,
        name: name.to_string(),
    };
    store.team_insert(team.clone());
    team
}

/// Insert an active flow for the organization.
pub fn seed_flow(store: &MockStore, organization_id: OrganizationId, name: &str) -> Flow {
    let flow = Flow {
        id: FlowId::now_v7(),
        organization_id,
        name: name.to_string(),
        status: ResourceStatus::Active,
    };
    store.flow_insert(flow.clone());
    flow
}

/// A session with fresh customer and chat IDs for the organization.
pub fn sample_session(organization_id: OrganizationId) -> Session {
    Session {
        organization_id,
        customer_id: CustomerId::now_v7(),
        chat_id: ChatId::now_v7(),
    }
}

/// First Monday on or after the given date. Availability fixtures pin
/// windows to a weekday; tests use this to get a matching date.
pub fn monday_on_or_after(date: NaiveDate) -> NaiveDate {
    let mut day = date;
    while day.weekday() != Weekday::Mon {
        day = match day.succ_opt() {
            Some(next) => next,
            None => return date,
        };
    }
    day
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Strategies for the identity and naming types.

    use atende_core::{slugify, OrganizationId, ProviderId, ScheduleId, ServiceId};
    use proptest::prelude::*;
    use uuid::Uuid;

    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_organization_id() -> impl Strategy<Value = OrganizationId> {
        arb_uuid().prop_map(OrganizationId::new)
    }

    pub fn arb_schedule_id() -> impl Strategy<Value = ScheduleId> {
        arb_uuid().prop_map(ScheduleId::new)
    }

    pub fn arb_service_id() -> impl Strategy<Value = ServiceId> {
        arb_uuid().prop_map(ServiceId::new)
    }

    pub fn arb_provider_id() -> impl Strategy<Value = ProviderId> {
        arb_uuid().prop_map(ProviderId::new)
    }

    /// Resource names as operators actually type them: mixed case,
    /// accents, stray punctuation and whitespace.
    pub fn arb_resource_name() -> impl Strategy<Value = String> {
        "[A-Za-zÀ-ÿ0-9 '!&-]{1,40}"
    }

    /// A name paired with its slug, for catalog/dispatch agreement tests.
    pub fn arb_named_slug() -> impl Strategy<Value = (String, String)> {
        arb_resource_name().prop_map(|name| {
            let slug = slugify(&name);
            (name, slug)
        })
    }

    /// Times on the half-hour grid within working hours.
    pub fn arb_slot_time() -> impl Strategy<Value = chrono::NaiveTime> {
        (7u32..20, prop_oneof![Just(0u32), Just(30u32)]).prop_filter_map(
            "valid wall-clock time",
            |(hour, minute)| chrono::NaiveTime::from_hms_opt(hour, minute, 0),
        )
    }
}

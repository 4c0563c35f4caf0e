//! Core entity structures

use crate::{
    AppointmentId, AppointmentStatus, ChatId, CustomerId, FlowId, OrganizationId, ProfileId,
    ProviderId, ResourceStatus, ScheduleId, ServiceId, TeamId, Timestamp,
};
use crate::{slugify, AtendeResult};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Schedule - a calendar/resource unit configured for bookings.
/// Read-only to this core; supplied by configuration storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub organization_id: OrganizationId,
    pub title: String,
    /// IANA timezone name, e.g. "America/Sao_Paulo".
    pub timezone: String,
    pub status: ResourceStatus,
}

/// A bookable offering with a fixed duration, belonging to a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleService {
    pub id: ServiceId,
    pub schedule_id: ScheduleId,
    pub title: String,
    /// Duration stored as `HH:MM` (hours:minutes).
    pub duration: String,
    /// Arrival-time services admit customers in order of arrival rather
    /// than at a fixed start time.
    pub by_arrival_time: bool,
    pub capacity: i32,
    pub status: ResourceStatus,
}

impl ScheduleService {
    /// Parse the stored `HH:MM` duration.
    pub fn parsed_duration(&self) -> AtendeResult<chrono::Duration> {
        crate::timefmt::parse_duration_hm(&self.duration)
    }
}

/// A staff member available to fulfill appointments on a schedule.
///
/// The display name is projected from the joined profile record when the
/// provider is fetched; a provider whose profile carries no name resolves
/// to `None` and is skipped during name-map builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleProvider {
    pub id: ProviderId,
    pub profile_id: ProfileId,
    pub schedule_id: ScheduleId,
    pub display_name: Option<String>,
    pub status: ResourceStatus,
}

/// Weekly working-hours window for a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub provider_id: ProviderId,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilityWindow {
    /// Whether this window applies to the given date.
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        u32::from(self.day_of_week) == date.weekday().num_days_from_sunday()
    }
}

/// Appointment - a booked slot on a schedule.
/// Created on booking; canceled rows are kept, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub schedule_id: ScheduleId,
    pub customer_id: CustomerId,
    pub provider_id: ProviderId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub chat_id: Option<ChatId>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A human team chats can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub organization_id: OrganizationId,
    pub name: String,
}

/// An automation flow the AI can trigger by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub status: ResourceStatus,
}

/// Conversation session the messaging layer hands to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub organization_id: OrganizationId,
    pub customer_id: CustomerId,
    pub chat_id: ChatId,
}

/// Type-specific configuration for a system action.
///
/// A closed sum over the four supported action kinds; dispatch matches it
/// exhaustively instead of branching on a type string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    /// Booking tool bound to one schedule. The schedule may be left
    /// unconfigured, in which case no tool is generated for the action.
    Schedule { schedule_id: Option<ScheduleId> },
    UpdateCustomer,
    UpdateChat,
    StartFlow,
}

/// System action - a configured capability of an organization.
/// Immutable input to this core; owned by configuration management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemAction {
    pub id: crate::ActionId,
    pub organization_id: OrganizationId,
    /// Display name; the generated tool's name is this, slugified.
    pub name: String,
    pub description: String,
    pub config: ActionConfig,
}

impl SystemAction {
    /// Slug the tool catalog publishes and the dispatcher matches against.
    pub fn tool_name(&self) -> String {
        slugify(&self.name)
    }
}

/// Tool definition handed to the AI model's function-calling interface.
/// Derived and ephemeral; regenerated on every catalog build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON-Schema-like parameter object.
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn test_window_matches_weekday() {
        let window = AvailabilityWindow {
            provider_id: ProviderId::now_v7(),
            day_of_week: 1, // Monday
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        };
        let mut date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        while chrono::Datelike::weekday(&date) != Weekday::Mon {
            date = date.succ_opt().unwrap();
        }
        assert!(window.matches_date(date));
        assert!(!window.matches_date(date.succ_opt().unwrap()));
    }

    #[test]
    fn test_service_duration_parses() {
        let service = ScheduleService {
            id: ServiceId::now_v7(),
            schedule_id: ScheduleId::now_v7(),
            title: "Corte".to_string(),
            duration: "00:30".to_string(),
            by_arrival_time: false,
            capacity: 1,
            status: ResourceStatus::Active,
        };
        assert_eq!(service.parsed_duration().unwrap().num_minutes(), 30);
    }

    #[test]
    fn test_action_tool_name_is_slug() {
        let action = SystemAction {
            id: crate::ActionId::now_v7(),
            organization_id: OrganizationId::now_v7(),
            name: "Agendar Consulta!".to_string(),
            description: "Books a consultation".to_string(),
            config: ActionConfig::Schedule { schedule_id: None },
        };
        assert_eq!(action.tool_name(), "agendar_consulta");
    }

    #[test]
    fn test_action_config_serde_tag() {
        let config = ActionConfig::Schedule {
            schedule_id: Some(ScheduleId::now_v7()),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "schedule");
        let back: ActionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}

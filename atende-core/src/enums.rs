//! Enum types for Atende entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Resource families the name-resolution cache partitions by.
///
/// Services and providers are additionally partitioned per schedule; teams
/// and flows are partitioned by organization alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Services,
    Providers,
    Teams,
    Flows,
}

/// Entity discriminator used in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Schedule,
    Service,
    Provider,
    Appointment,
    Team,
    Flow,
    Action,
}

/// Activation status shared by schedules, services, providers, and flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Active,
    Inactive,
}

impl ResourceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Lifecycle of an appointment.
///
/// `Scheduled -> Confirmed` happens outside this core; `Canceled` is
/// terminal and rows are never physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Canceled,
}

impl AppointmentStatus {
    /// Whether the appointment still occupies its slot.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "canceled" => Ok(Self::Canceled),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

/// Chat states the update_chat tool can move a conversation to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    InProgress,
    Waiting,
    Closed,
    Transferred,
}

impl ChatStatus {
    /// Every variant, in the order the tool schema advertises them.
    pub const ALL: [ChatStatus; 4] = [
        Self::InProgress,
        Self::Waiting,
        Self::Closed,
        Self::Transferred,
    ];

    /// The wire name the AI model sees in the tool schema.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Waiting => "waiting",
            Self::Closed => "closed",
            Self::Transferred => "transferred",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Scheduling operations a schedule tool call can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScheduleOperation {
    CheckAvailability,
    CreateAppointment,
    CheckAppointment,
    DeleteAppointment,
}

impl ScheduleOperation {
    /// Every variant, in the order the tool schema advertises them.
    pub const ALL: [ScheduleOperation; 4] = [
        Self::CheckAvailability,
        Self::CreateAppointment,
        Self::CheckAppointment,
        Self::DeleteAppointment,
    ];

    /// The camelCase wire name the AI model sees in the tool schema.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::CheckAvailability => "checkAvailability",
            Self::CreateAppointment => "createAppointment",
            Self::CheckAppointment => "checkAppointment",
            Self::DeleteAppointment => "deleteAppointment",
        }
    }
}

impl fmt::Display for ScheduleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ScheduleOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkAvailability" => Ok(Self::CheckAvailability),
            "createAppointment" => Ok(Self::CreateAppointment),
            "checkAppointment" => Ok(Self::CheckAppointment),
            "deleteAppointment" => Ok(Self::DeleteAppointment),
            other => Err(format!("unknown schedule operation: {other}")),
        }
    }
}

//! Error types for Atende operations

use crate::{EntityKind, ScheduleId};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {kind:?} with id {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Insert failed for {kind:?}: {reason}")]
    InsertFailed { kind: EntityKind, reason: String },

    #[error("Update failed for {kind:?} with id {id}: {reason}")]
    UpdateFailed {
        kind: EntityKind,
        id: Uuid,
        reason: String,
    },

    #[error("Slot {date} {start_time} already booked for provider {provider_id}")]
    SlotConflict {
        provider_id: Uuid,
        date: chrono::NaiveDate,
        start_time: chrono::NaiveTime,
    },

    #[error("Appointment {id} is already canceled")]
    AlreadyCanceled { id: Uuid },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Name-resolution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No configured action matches tool \"{name}\"")]
    UnknownTool { name: String },

    #[error("Service not found: \"{name}\"")]
    UnknownService { name: String },

    #[error("Team not found: \"{name}\"")]
    UnknownTeam { name: String },

    #[error("Flow not found: \"{name}\"")]
    UnknownFlow { name: String },
}

/// Validation errors on tool-call arguments.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Required fields missing: {}", fields.join(", "))]
    RequiredFieldsMissing { fields: Vec<String> },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors surfaced when a tool is invoked against a
/// misconfigured action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Action \"{action}\" has no schedule configured")]
    MissingSchedule { action: String },

    #[error("Schedule {schedule_id} is inactive or does not belong to this organization")]
    ScheduleUnavailable { schedule_id: ScheduleId },

    #[error("No active flows are configured for this organization")]
    NoActiveFlows,

    #[error("Schedule {schedule_id} has no active providers")]
    NoActiveProviders { schedule_id: ScheduleId },
}

/// Master error type for all Atende operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AtendeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Atende operations.
pub type AtendeResult<T> = Result<T, AtendeError>;

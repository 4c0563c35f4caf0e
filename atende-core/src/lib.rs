//! Atende Core - Entity Types
//!
//! Pure data structures with no behavior beyond small helpers. All other
//! crates depend on this. This crate contains no storage or dispatch logic.

pub mod entities;
pub mod enums;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod slug;
pub mod timefmt;

pub use entities::{
    ActionConfig, Appointment, AvailabilityWindow, Flow, Schedule, ScheduleProvider,
    ScheduleService, Session, SystemAction, Team, ToolDefinition,
};
pub use enums::{
    AppointmentStatus, ChatStatus, EntityKind, ResourceKind, ResourceStatus, ScheduleOperation,
};
pub use envelope::{ReplyStatus, ToolReply};
pub use error::{
    AtendeError, AtendeResult, ConfigError, ResolutionError, StorageError, ValidationError,
};
pub use identity::{
    ActionId, AppointmentId, ChatId, CustomerId, FlowId, OrganizationId, ProfileId, ProviderId,
    ScheduleId, ServiceId, TeamId, Timestamp,
};
pub use slug::slugify;
pub use timefmt::{format_hm, parse_duration_hm, parse_hm};

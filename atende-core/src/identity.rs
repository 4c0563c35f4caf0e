//! Identity types for Atende entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a new UUIDv7 identifier (timestamp-sortable).
            pub fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Tenant boundary. Every cached mapping, schedule, and appointment is
    /// scoped by this identifier; it is supplied by the caller and never
    /// created here.
    OrganizationId
);
entity_id!(
    /// A calendar/resource unit an organization configures for bookings.
    ScheduleId
);
entity_id!(
    /// A bookable offering with a fixed duration, belonging to a schedule.
    ServiceId
);
entity_id!(
    /// A staff member available to fulfill appointments on a schedule.
    ProviderId
);
entity_id!(
    /// Profile record a provider is joined to for its display name.
    ProfileId
);
entity_id!(AppointmentId);
entity_id!(CustomerId);
entity_id!(ChatId);
entity_id!(TeamId);
entity_id!(FlowId);
entity_id!(
    /// A configured system action (the source of a generated tool).
    ActionId
);

//! Appointment scheduling engine
//!
//! Slot computation ([`availability`]) and the booking/lookup/cancellation
//! operations ([`appointments`]) that run against the calendar store.

pub mod appointments;
pub mod availability;

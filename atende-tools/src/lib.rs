//! Atende Tools - AI tool catalog, dispatch, and scheduling
//!
//! The engine behind the AI agent's system tools: generates tool
//! definitions from an organization's configured actions, resolves
//! free-text resource names through the cached resolver, and executes
//! scheduling operations against the calendar store.

pub mod catalog;
pub mod dispatch;
pub mod resolver;
pub mod scheduling;

pub use catalog::generate_catalog;
pub use dispatch::{
    ActionExecutors, ChatUpdate, CustomerUpdate, FlowStart, ToolDispatcher,
};
pub use resolver::{
    build_name_map, flow_entry, provider_entry, resolve, service_entry, team_entry, CachedResolver,
};
pub use scheduling::appointments::{AppointmentManager, ScheduleCommand};
pub use scheduling::availability::{compute_slots, SLOT_STEP_MINUTES};

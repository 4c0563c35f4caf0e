//! Tool call dispatch
//!
//! Entry point for a tool call coming back from the model: match it to
//! a configured action, resolve names to IDs, and route to the
//! appointment manager or the caller-supplied action executors. Every
//! failure is flattened into an error reply so the conversation layer
//! always has something to relay.

use crate::resolver::{resolve, CachedResolver};
use crate::scheduling::appointments::{AppointmentManager, ScheduleCommand};
use atende_core::{
    ActionConfig, AppointmentId, AtendeResult, ChatStatus, ConfigError, FlowId, ResolutionError,
    ScheduleOperation, Session, SystemAction, TeamId, ToolReply, ValidationError,
};
use atende_core::parse_hm;
use atende_storage::{CalendarStore, DirectoryStore, ResourceCache};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Raw arguments of a schedule tool call, before name resolution.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleArgs {
    pub operation: Option<ScheduleOperation>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_name: Option<String>,
    pub provider_name: Option<String>,
    pub notes: Option<String>,
    pub appointment_id: Option<AppointmentId>,
}

/// Customer profile fields to update, all optional.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub funnel_stage: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatArgs {
    title: Option<String>,
    status: Option<ChatStatus>,
    team_name: Option<String>,
}

/// Conversation update with the team already resolved to an ID.
#[derive(Debug, Clone)]
pub struct ChatUpdate {
    pub title: Option<String>,
    pub status: Option<ChatStatus>,
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Default, Deserialize)]
struct FlowArgs {
    flow_name: Option<String>,
    variables: Option<Value>,
}

/// Flow trigger with the flow already resolved to an ID.
#[derive(Debug, Clone)]
pub struct FlowStart {
    pub flow_id: FlowId,
    pub variables: Option<Value>,
}

/// Side effects the dispatcher delegates to the surrounding platform.
///
/// Scheduling is handled in-engine; customer, chat, and flow mutations
/// belong to the messaging layer, which implements this trait.
#[async_trait]
pub trait ActionExecutors: Send + Sync {
    async fn update_customer(
        &self,
        action: &SystemAction,
        update: CustomerUpdate,
        session: &Session,
    ) -> AtendeResult<ToolReply>;

    async fn update_chat(
        &self,
        action: &SystemAction,
        update: ChatUpdate,
        session: &Session,
    ) -> AtendeResult<ToolReply>;

    async fn start_flow(
        &self,
        action: &SystemAction,
        start: FlowStart,
        session: &Session,
    ) -> AtendeResult<ToolReply>;
}

/// Routes tool calls to their action handlers.
pub struct ToolDispatcher<D, C, X>
where
    D: DirectoryStore,
    C: CalendarStore,
{
    directory: Arc<D>,
    resolver: CachedResolver<D>,
    manager: AppointmentManager<D, C>,
    executors: Arc<X>,
}

impl<D, C, X> ToolDispatcher<D, C, X>
where
    D: DirectoryStore,
    C: CalendarStore,
    X: ActionExecutors,
{
    pub fn new(
        directory: Arc<D>,
        calendar: Arc<C>,
        cache: Arc<ResourceCache>,
        executors: Arc<X>,
    ) -> Self {
        Self {
            resolver: CachedResolver::new(directory.clone(), cache),
            manager: AppointmentManager::new(directory.clone(), calendar),
            directory,
            executors,
        }
    }

    pub fn resolver(&self) -> &CachedResolver<D> {
        &self.resolver
    }

    /// Handle one tool call. Never returns `Err`: failures become error
    /// replies with the error's message, after logging.
    pub async fn dispatch(
        &self,
        session: &Session,
        actions: &[SystemAction],
        tool_name: &str,
        arguments: Value,
    ) -> ToolReply {
        match self.dispatch_inner(session, actions, tool_name, arguments).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(tool = tool_name, error = %err, "tool call failed");
                ToolReply::error(err.to_string())
            }
        }
    }

    async fn dispatch_inner(
        &self,
        session: &Session,
        actions: &[SystemAction],
        tool_name: &str,
        arguments: Value,
    ) -> AtendeResult<ToolReply> {
        let action = actions
            .iter()
            .find(|a| a.tool_name() == tool_name)
            .ok_or_else(|| ResolutionError::UnknownTool {
                name: tool_name.to_string(),
            })?;

        match &action.config {
            ActionConfig::Schedule { schedule_id } => {
                self.dispatch_schedule(session, action, *schedule_id, arguments)
                    .await
            }
            ActionConfig::UpdateCustomer => {
                let update: CustomerUpdate = parse_args(arguments)?;
                self.executors.update_customer(action, update, session).await
            }
            ActionConfig::UpdateChat => {
                let update = self.resolve_chat_update(session, arguments).await?;
                self.executors.update_chat(action, update, session).await
            }
            ActionConfig::StartFlow => {
                let start = self.resolve_flow_start(session, arguments).await?;
                self.executors.start_flow(action, start, session).await
            }
        }
    }

    async fn dispatch_schedule(
        &self,
        session: &Session,
        action: &SystemAction,
        schedule_id: Option<atende_core::ScheduleId>,
        arguments: Value,
    ) -> AtendeResult<ToolReply> {
        let schedule_id = schedule_id.ok_or_else(|| ConfigError::MissingSchedule {
            action: action.name.clone(),
        })?;
        let schedule = self
            .directory
            .schedule_get_active(session.organization_id, schedule_id)
            .await?
            .ok_or(ConfigError::ScheduleUnavailable { schedule_id })?;

        let args: ScheduleArgs = parse_args(arguments)?;
        let operation = args.operation.ok_or_else(|| {
            ValidationError::RequiredFieldMissing {
                field: "operation".to_string(),
            }
        })?;

        let date = match args.date.as_deref() {
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ValidationError::InvalidValue {
                    field: "date".to_string(),
                    reason: format!("expected YYYY-MM-DD, got {raw:?}"),
                }
            })?),
            None => None,
        };
        let time = match args.time.as_deref() {
            Some(raw) => Some(parse_hm("time", raw)?),
            None => None,
        };

        // A service the customer named but the directory does not know
        // is fatal: booking the wrong service is worse than asking again.
        let service_id = match args.service_name.as_deref() {
            Some(name) => {
                let map = self
                    .resolver
                    .service_map(session.organization_id, schedule_id)
                    .await?;
                let id = map.as_deref().and_then(|m| resolve(m, name)).ok_or_else(|| {
                    ResolutionError::UnknownService {
                        name: name.to_string(),
                    }
                })?;
                Some(atende_core::ServiceId::new(id))
            }
            None => None,
        };

        // An unknown provider preference degrades to auto-assignment.
        let provider_id = match args.provider_name.as_deref() {
            Some(name) => {
                let map = self
                    .resolver
                    .provider_map(session.organization_id, schedule_id)
                    .await?;
                let resolved = map.as_deref().and_then(|m| resolve(m, name));
                if resolved.is_none() {
                    debug!(provider = name, "provider preference not found, auto-assigning");
                }
                resolved.map(atende_core::ProviderId::new)
            }
            None => None,
        };

        let command = ScheduleCommand {
            operation,
            schedule,
            service_id,
            provider_id,
            date,
            time,
            notes: args.notes,
            appointment_id: args.appointment_id,
        };
        self.manager.execute(session, command).await
    }

    async fn resolve_chat_update(
        &self,
        session: &Session,
        arguments: Value,
    ) -> AtendeResult<ChatUpdate> {
        let args: ChatArgs = parse_args(arguments)?;
        let team_id = match args.team_name.as_deref() {
            Some(name) => {
                let map = self.resolver.team_map(session.organization_id).await?;
                match map.as_deref().and_then(|m| resolve(m, name)) {
                    Some(id) => Some(TeamId::new(id)),
                    None if map.is_none() => {
                        // Organization has no teams at all: drop the
                        // transfer rather than fail the whole update.
                        debug!(team = name, "no teams configured, ignoring transfer");
                        None
                    }
                    None => {
                        return Err(ResolutionError::UnknownTeam {
                            name: name.to_string(),
                        }
                        .into())
                    }
                }
            }
            None => None,
        };
        Ok(ChatUpdate {
            title: args.title,
            status: args.status,
            team_id,
        })
    }

    async fn resolve_flow_start(
        &self,
        session: &Session,
        arguments: Value,
    ) -> AtendeResult<FlowStart> {
        let args: FlowArgs = parse_args(arguments)?;
        let name = args.flow_name.as_deref().ok_or_else(|| {
            ValidationError::RequiredFieldMissing {
                field: "flow_name".to_string(),
            }
        })?;
        let map = self
            .resolver
            .flow_map(session.organization_id)
            .await?
            .ok_or(ConfigError::NoActiveFlows)?;
        let flow_id = resolve(&map, name)
            .map(FlowId::new)
            .ok_or_else(|| ResolutionError::UnknownFlow {
                name: name.to_string(),
            })?;
        Ok(FlowStart {
            flow_id,
            variables: args.variables,
        })
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> AtendeResult<T> {
    serde_json::from_value(arguments).map_err(|err| {
        ValidationError::InvalidValue {
            field: "arguments".to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}

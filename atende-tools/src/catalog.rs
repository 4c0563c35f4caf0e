//! Tool catalog generation
//!
//! Turns an organization's configured actions into the tool definitions
//! published to the model's function-calling interface. Generation is
//! best-effort per action: a misconfigured action is logged and skipped
//! so one broken entry never empties the whole catalog.

use atende_core::{
    ActionConfig, AtendeResult, ChatStatus, ConfigError, OrganizationId, ScheduleOperation,
    SystemAction, ToolDefinition,
};
use atende_storage::DirectoryStore;
use serde_json::json;
use tracing::warn;

/// Build the tool catalog for an organization's actions.
///
/// Schedule and start-flow tools bake live resource names into their
/// parameter enums, so the catalog reflects the directory at generation
/// time; regenerate after directory changes.
pub async fn generate_catalog<D>(
    organization_id: OrganizationId,
    actions: &[SystemAction],
    directory: &D,
) -> Vec<ToolDefinition>
where
    D: DirectoryStore + ?Sized,
{
    let mut tools = Vec::with_capacity(actions.len());
    for action in actions {
        let built = match &action.config {
            ActionConfig::Schedule { .. } => schedule_tool(action, directory).await,
            ActionConfig::UpdateCustomer => Ok(Some(update_customer_tool(action))),
            ActionConfig::UpdateChat => Ok(Some(update_chat_tool(action))),
            ActionConfig::StartFlow => start_flow_tool(organization_id, action, directory).await,
        };
        match built {
            Ok(Some(tool)) => tools.push(tool),
            Ok(None) => {}
            Err(err) => {
                warn!(action = %action.name, error = %err, "skipping action during catalog generation");
            }
        }
    }
    tools
}

async fn schedule_tool<D>(
    action: &SystemAction,
    directory: &D,
) -> AtendeResult<Option<ToolDefinition>>
where
    D: DirectoryStore + ?Sized,
{
    let ActionConfig::Schedule { schedule_id } = &action.config else {
        return Ok(None);
    };
    let schedule_id = schedule_id.ok_or_else(|| ConfigError::MissingSchedule {
        action: action.name.clone(),
    })?;
    let schedule = directory
        .schedule_get_active(action.organization_id, schedule_id)
        .await?
        .ok_or(ConfigError::ScheduleUnavailable { schedule_id })?;

    let services = directory.service_list_active(schedule_id).await?;
    let providers = directory.provider_list_active(schedule_id).await?;
    let service_names: Vec<&str> = services.iter().map(|s| s.title.as_str()).collect();
    let provider_names: Vec<&str> = providers
        .iter()
        .filter_map(|p| p.display_name.as_deref())
        .collect();
    let operations: Vec<&str> = ScheduleOperation::ALL.iter().map(|op| op.wire_name()).collect();

    let mut properties = json!({
        "operation": {
            "type": "string",
            "enum": operations,
            "description": "Which scheduling operation to perform"
        },
        "date": {
            "type": "string",
            "format": "date",
            "description": "Date in YYYY-MM-DD format"
        },
        "time": {
            "type": "string",
            "description": "Time in HH:MM format (24h)"
        },
        "notes": {
            "type": "string",
            "description": "Optional notes for the appointment"
        },
        "appointment_id": {
            "type": "string",
            "format": "uuid",
            "description": "Existing appointment ID, for lookup or cancellation"
        }
    });
    // Enum constraints only when the directory has names to offer; an
    // empty enum would make the field unusable.
    if !service_names.is_empty() {
        properties["service_name"] = json!({
            "type": "string",
            "enum": service_names,
            "description": "Service to book"
        });
    }
    if !provider_names.is_empty() {
        properties["provider_name"] = json!({
            "type": "string",
            "enum": provider_names,
            "description": "Preferred provider"
        });
    }

    Ok(Some(ToolDefinition {
        name: action.tool_name(),
        description: format!("{} (schedule: {})", action.description, schedule.title),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": ["operation"]
        }),
    }))
}

fn update_customer_tool(action: &SystemAction) -> ToolDefinition {
    ToolDefinition {
        name: action.tool_name(),
        description: action.description.clone(),
        parameters: json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Customer's full name"
                },
                "email": {
                    "type": "string",
                    "format": "email",
                    "description": "Customer's email address"
                },
                "phone": {
                    "type": "string",
                    "description": "Customer's phone number"
                },
                "funnel_stage": {
                    "type": "string",
                    "description": "Sales funnel stage to move the customer to"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Tags to attach to the customer"
                }
            },
            "required": []
        }),
    }
}

fn update_chat_tool(action: &SystemAction) -> ToolDefinition {
    let statuses: Vec<&str> = ChatStatus::ALL.iter().map(|s| s.wire_name()).collect();
    ToolDefinition {
        name: action.tool_name(),
        description: action.description.clone(),
        parameters: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "New conversation title"
                },
                "status": {
                    "type": "string",
                    "enum": statuses,
                    "description": "Conversation status to set"
                },
                "team_name": {
                    "type": "string",
                    "description": "Team to transfer the conversation to, by name"
                }
            },
            "required": []
        }),
    }
}

async fn start_flow_tool<D>(
    organization_id: OrganizationId,
    action: &SystemAction,
    directory: &D,
) -> AtendeResult<Option<ToolDefinition>>
where
    D: DirectoryStore + ?Sized,
{
    let flows = directory.flow_list_active(organization_id).await?;
    if flows.is_empty() {
        return Err(ConfigError::NoActiveFlows.into());
    }
    let flow_names: Vec<&str> = flows.iter().map(|f| f.name.as_str()).collect();

    Ok(Some(ToolDefinition {
        name: action.tool_name(),
        description: action.description.clone(),
        parameters: json!({
            "type": "object",
            "properties": {
                "flow_name": {
                    "type": "string",
                    "enum": flow_names,
                    "description": "Flow to start"
                },
                "variables": {
                    "type": "object",
                    "description": "Variables passed into the flow"
                }
            },
            "required": ["flow_name"]
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atende_core::{ActionId, ResourceStatus};
    use atende_storage::MockStore;
    use atende_test_utils::{seed_flow, seed_provider, seed_schedule, seed_service};

    fn action(name: &str, organization_id: OrganizationId, config: ActionConfig) -> SystemAction {
        SystemAction {
            id: ActionId::now_v7(),
            organization_id,
            name: name.to_string(),
            description: format!("{} tool", name),
            config,
        }
    }

    #[tokio::test]
    async fn test_schedule_tool_embeds_live_names() {
        let store = MockStore::new();
        let schedule = seed_schedule(&store);
        seed_service(&store, schedule.id, "Corte", "00:30");
        seed_service(&store, schedule.id, "Coloração", "01:00");
        seed_provider(&store, schedule.id, "Ana");

        let actions = vec![action(
            "Agendar Consulta",
            schedule.organization_id,
            ActionConfig::Schedule {
                schedule_id: Some(schedule.id),
            },
        )];
        let tools = generate_catalog(schedule.organization_id, &actions, &store).await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "agendar_consulta");

        let props = &tools[0].parameters["properties"];
        let services = props["service_name"]["enum"].as_array().unwrap();
        assert!(services.iter().any(|v| v == "Corte"));
        assert!(services.iter().any(|v| v == "Coloração"));
        assert_eq!(props["provider_name"]["enum"], json!(["Ana"]));
        assert_eq!(
            props["operation"]["enum"],
            json!(["checkAvailability", "createAppointment", "checkAppointment", "deleteAppointment"])
        );
        assert_eq!(tools[0].parameters["required"], json!(["operation"]));
    }

    #[tokio::test]
    async fn test_schedule_tool_omits_empty_enums() {
        let store = MockStore::new();
        let schedule = seed_schedule(&store);
        let actions = vec![action(
            "Agendar",
            schedule.organization_id,
            ActionConfig::Schedule {
                schedule_id: Some(schedule.id),
            },
        )];
        let tools = generate_catalog(schedule.organization_id, &actions, &store).await;
        let props = &tools[0].parameters["properties"];
        assert!(props.get("service_name").is_none());
        assert!(props.get("provider_name").is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_schedule_action_is_skipped() {
        let store = MockStore::new();
        let organization_id = OrganizationId::now_v7();
        let actions = vec![
            action(
                "Agendar",
                organization_id,
                ActionConfig::Schedule { schedule_id: None },
            ),
            action("Atualizar Cliente", organization_id, ActionConfig::UpdateCustomer),
        ];
        let tools = generate_catalog(organization_id, &actions, &store).await;
        // The broken action is dropped, the healthy one survives.
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "atualizar_cliente");
    }

    #[tokio::test]
    async fn test_inactive_schedule_is_skipped() {
        let store = MockStore::new();
        let mut schedule = seed_schedule(&store);
        schedule.status = ResourceStatus::Inactive;
        store.schedule_insert(schedule.clone());

        let actions = vec![action(
            "Agendar",
            schedule.organization_id,
            ActionConfig::Schedule {
                schedule_id: Some(schedule.id),
            },
        )];
        let tools = generate_catalog(schedule.organization_id, &actions, &store).await;
        assert!(tools.is_empty());
    }

    #[tokio::test]
    async fn test_start_flow_requires_active_flows() {
        let store = MockStore::new();
        let organization_id = OrganizationId::now_v7();
        let actions = vec![action("Iniciar Fluxo", organization_id, ActionConfig::StartFlow)];
        let tools = generate_catalog(organization_id, &actions, &store).await;
        assert!(tools.is_empty());

        seed_flow(&store, organization_id, "Boas-vindas");
        let tools = generate_catalog(organization_id, &actions, &store).await;
        assert_eq!(tools.len(), 1);
        assert_eq!(
            tools[0].parameters["properties"]["flow_name"]["enum"],
            json!(["Boas-vindas"])
        );
        assert_eq!(tools[0].parameters["required"], json!(["flow_name"]));
    }

    #[tokio::test]
    async fn test_update_chat_statuses_use_wire_names() {
        let store = MockStore::new();
        let organization_id = OrganizationId::now_v7();
        let actions = vec![action("Atualizar Chat", organization_id, ActionConfig::UpdateChat)];
        let tools = generate_catalog(organization_id, &actions, &store).await;
        let statuses = tools[0].parameters["properties"]["status"]["enum"].clone();
        assert_eq!(
            statuses,
            json!(["in_progress", "waiting", "closed", "transferred"])
        );
    }
}

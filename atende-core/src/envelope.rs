//! Result envelope returned to the conversational layer
//!
//! Every tool invocation resolves to a [`ToolReply`], success or error.
//! Dispatch never lets an error escape as anything else.

use crate::ScheduleOperation;
use serde::{Deserialize, Serialize};

/// Outcome discriminator for a tool reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// Uniform envelope for every dispatched tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolReply {
    pub status: ReplyStatus,
    pub message: String,
    /// Scheduling operation this reply answers, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<ScheduleOperation>,
    /// Operation-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolReply {
    /// Successful reply with a message only.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Success,
            message: message.into(),
            operation: None,
            data: None,
        }
    }

    /// Successful reply carrying a data payload.
    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: ReplyStatus::Success,
            message: message.into(),
            operation: None,
            data: Some(data),
        }
    }

    /// Error reply with a message only.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: message.into(),
            operation: None,
            data: None,
        }
    }

    /// Error reply carrying a data payload (e.g. alternative slots).
    pub fn error_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: message.into(),
            operation: None,
            data: Some(data),
        }
    }

    /// Tag the reply with the operation that produced it.
    pub fn with_operation(mut self, operation: ScheduleOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }
}

//! Wire envelopes exchanged between the record host and the agent side.
//!
//! The `type` tag is a closed set; anything else fails to decode at the
//! boundary instead of being matched loosely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "mcp-request", rename_all = "camelCase")]
    Request {
        request_id: u64,
        method: String,
        params: Value,
    },
    #[serde(rename = "mcp-response", rename_all = "camelCase")]
    Response {
        request_id: u64,
        result: ToolOutcome,
    },
    #[serde(rename = "mcp-tools-available")]
    ToolsAvailable { tools: Vec<ToolDescriptor> },
    #[serde(rename = "mcp-tools-request")]
    ToolsRequest,
    #[serde(rename = "mcp-context")]
    ContextPush { context: Value },
    #[serde(rename = "mcp-error")]
    Error { message: String },
}

impl Envelope {
    /// True for the variants the agent side emits. Each endpoint drops
    /// inbound envelopes from its own outbound set instead of
    /// re-dispatching them as commands.
    pub fn from_agent_side(&self) -> bool {
        matches!(self, Envelope::Request { .. } | Envelope::ToolsRequest)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Uniform result carried by every response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// Parameter name to human-readable description.
    pub parameters: Value,
}

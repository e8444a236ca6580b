use serde::Serialize;
use serde_json::Value;

/// One executed tool call inside a turn.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStep {
    pub tool: String,
    pub input: Value,
    pub success: bool,
    pub output: Option<Value>,
    pub message: Option<String>,
}

/// Everything a turn produced, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub replies: Vec<String>,
    pub steps: Vec<ToolStep>,
}

//! The two-line tool-call block embedded in model text:
//!
//! ```text
//! TOOL_CALL: addMedication
//! PARAMS: {"name": "Aspirin", "dose": "81mg", "frequency": "once daily"}
//! ```
//!
//! One call per response; when several blocks appear, the last one wins.

use serde_json::Value;

const CALL_PREFIX: &str = "TOOL_CALL:";
const PARAMS_PREFIX: &str = "PARAMS:";

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub params: Value,
}

pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
    let mut name = None;
    let mut raw_params = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(CALL_PREFIX) {
            name = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(PARAMS_PREFIX) {
            raw_params = Some(rest.trim().to_string());
        }
    }

    let name = name.filter(|value| !value.is_empty())?;
    let params = match raw_params {
        Some(raw) => parse_params(&raw),
        None => Value::Null,
    };
    Some(ToolCall { name, params })
}

/// JSON first; anything unparseable is a bare string with literal
/// double quotes removed (covers `PARAMS: "Lisinopril"` and
/// `PARAMS: Lisinopril` alike).
fn parse_params(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.replace('"', "")))
}

/// Human-visible text: every line carrying either keyword removed,
/// surrounding whitespace trimmed.
pub fn strip_tool_syntax(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let line = line.trim();
            !line.starts_with(CALL_PREFIX) && !line.starts_with(PARAMS_PREFIX)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn render_tool_call(name: &str, params: &Value) -> String {
    format!("{CALL_PREFIX} {name}\n{PARAMS_PREFIX} {params}")
}

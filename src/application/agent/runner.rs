use super::errors::AgentError;
use super::models::{ToolStep, TurnOutcome};
use super::{parser, report};
use crate::application::tooling::RecordLink;
use crate::domain::types::{ChatMessage, MessageRole};
use crate::infrastructure::model::{CompletionRequest, ModelProvider};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Hard cap on model→tool→model hops inside one user turn.
const MAX_TOOL_HOPS: usize = 3;
const HOP_LIMIT_FALLBACK: &str =
    "I've reached the limit of automatic tool steps for this request. Tell me how you'd like to continue.";

pub struct ChatAgent {
    provider: Arc<dyn ModelProvider>,
    link: Arc<RecordLink>,
    history: Mutex<Vec<ChatMessage>>,
    turn_gate: Mutex<()>,
}

impl ChatAgent {
    pub fn new(provider: Arc<dyn ModelProvider>, link: Arc<RecordLink>) -> Self {
        Self {
            provider,
            link,
            history: Mutex::new(Vec::new()),
            turn_gate: Mutex::new(()),
        }
    }

    /// Runs one user turn. A turn started while another is in flight
    /// does nothing and reports `Busy`.
    pub async fn send(&self, user_text: impl Into<String>) -> Result<TurnOutcome, AgentError> {
        let _turn = self.turn_gate.try_lock().map_err(|_| AgentError::Busy)?;
        let user_text = user_text.into();
        info!("Turn started");
        self.push(MessageRole::User, &user_text).await;

        let mut replies = Vec::new();
        let mut steps = Vec::new();
        let mut hops = 0usize;

        loop {
            let response = self.complete().await?;
            self.push(MessageRole::Assistant, &response).await;
            let visible = parser::strip_tool_syntax(&response);
            if !visible.is_empty() {
                replies.push(visible);
            }

            let Some(call) = parser::parse_tool_call(&response) else {
                break;
            };
            if hops == MAX_TOOL_HOPS {
                warn!(hops, "Tool hop limit reached; ending turn");
                replies.push(HOP_LIMIT_FALLBACK.to_string());
                self.push(MessageRole::Assistant, HOP_LIMIT_FALLBACK).await;
                break;
            }
            hops += 1;

            info!(tool = %call.name, hop = hops, "Dispatching tool call");
            let outcome = self.link.call(&call.name, call.params.clone()).await?;
            if call.name == "getContext"
                && outcome.success
                && let Some(context) = outcome.data.clone()
            {
                self.link.remember_context(context).await;
            }

            let formatted = report::describe_outcome(&call.name, &outcome);
            steps.push(ToolStep {
                tool: call.name.clone(),
                input: call.params.clone(),
                success: outcome.success,
                output: outcome.data.clone(),
                message: outcome.message.clone(),
            });
            replies.push(formatted.clone());
            self.push(MessageRole::Assistant, &formatted).await;

            // Feed the result back so the model can produce a follow-up
            // utterance, which may itself carry another call.
            let feedback = json!({
                "tool_result": {
                    "tool": call.name,
                    "input": call.params,
                    "success": outcome.success,
                    "output": outcome.data,
                    "message": outcome.message,
                    "error": outcome.error,
                }
            })
            .to_string();
            self.push(MessageRole::User, &feedback).await;
        }

        info!(
            replies = replies.len(),
            steps = steps.len(),
            "Turn finished"
        );
        Ok(TurnOutcome { replies, steps })
    }

    async fn complete(&self) -> Result<String, AgentError> {
        let mut messages = vec![ChatMessage::new(
            MessageRole::System,
            self.compose_system_prompt().await,
        )];
        messages.extend(self.history.lock().await.iter().cloned());
        let response = self.provider.complete(CompletionRequest { messages }).await?;
        Ok(response)
    }

    async fn push(&self, role: MessageRole, content: &str) {
        self.history
            .lock()
            .await
            .push(ChatMessage::new(role, content));
    }

    async fn compose_system_prompt(&self) -> String {
        let catalog = self.link.catalog().await;
        let mut text = String::from(
            "You are a medical assistant embedded in a practice management system.\n\n",
        );
        if !catalog.is_empty() {
            text.push_str("AVAILABLE TOOLS:\n");
            for tool in &catalog {
                text.push_str(&format!("- {}: {}\n", tool.name, tool.description));
            }
            text.push('\n');
        }
        text.push_str(
            "IMPORTANT GUIDELINES:\n\
             - Always check current patient context before making changes\n\
             - Verify medication interactions and allergies before adding medications\n\
             - Be precise with medical terminology\n\
             - Ask for clarification if medication details are incomplete\n\n\
             When you need to use a tool, format your response with:\n\
             TOOL_CALL: {tool name}\n\
             PARAMS: {parameters as JSON}\n\n\
             For example:\n\
             TOOL_CALL: addMedication\n\
             PARAMS: {\"name\": \"Amoxicillin\", \"dose\": \"500mg\", \"frequency\": \"twice daily\", \"indication\": \"Bacterial infection\"}",
        );
        text
    }
}

//! HTTP client for the completion endpoint.

use super::adapter;
use super::extract;
use super::traits::ModelProvider;
use super::types::{CompletionRequest, ModelError};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl ModelProvider for CompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let prompt = adapter::flatten_messages(&request.messages);
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        });

        info!(
            endpoint = self.endpoint.as_str(),
            model = self.model.as_str(),
            messages = request.messages.len(),
            "Sending completion request"
        );

        let mut builder = self.http.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(ModelError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::http(status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ModelError::invalid_response(err.to_string()))?;
        debug!("Completion response received");

        let text = extract::first_text(&body)
            .ok_or_else(|| ModelError::invalid_response("no recognizable text field"))?;
        Ok(adapter::trim_assistant_cue(&text))
    }
}

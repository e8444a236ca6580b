//! Keeps the chat usable when the completion endpoint is down: any
//! provider error drops the request onto the local simulator instead of
//! surfacing to the user.

use super::simulator::SimulationClient;
use super::traits::ModelProvider;
use super::types::{CompletionRequest, ModelError};
use async_trait::async_trait;
use tracing::warn;

pub struct FailoverProvider<P> {
    primary: P,
    fallback: SimulationClient,
}

impl<P: ModelProvider> FailoverProvider<P> {
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            fallback: SimulationClient,
        }
    }
}

#[async_trait]
impl<P: ModelProvider> ModelProvider for FailoverProvider<P> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        match self.primary.complete(request.clone()).await {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!(%err, "Completion endpoint unusable; falling back to local simulation");
                self.fallback.complete(request).await
            }
        }
    }
}

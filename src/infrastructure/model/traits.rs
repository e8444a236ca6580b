use super::types::{CompletionRequest, ModelError};
use async_trait::async_trait;

/// One full completion per call; the provider owns prompt flattening
/// and response extraction.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;
}

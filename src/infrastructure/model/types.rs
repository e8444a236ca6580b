use crate::domain::types::ChatMessage;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network error calling completion endpoint: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },
    #[error("completion endpoint returned HTTP {status}")]
    Http { status: StatusCode },
    #[error("completion endpoint returned an unusable response: {reason}")]
    InvalidResponse { reason: String },
}

impl ModelError {
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network { source }
    }

    pub fn http(status: StatusCode) -> Self {
        Self::Http { status }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ModelError::Network { source } => {
                if source.is_connect() {
                    "I can't reach the language model endpoint right now.".to_string()
                } else if source.is_timeout() {
                    "The language model took too long to answer.".to_string()
                } else {
                    "A network problem interrupted the language model call.".to_string()
                }
            }
            ModelError::Http { status } => {
                format!("The language model endpoint answered with HTTP {status}.")
            }
            ModelError::InvalidResponse { .. } => {
                "The language model answered in a shape I couldn't read.".to_string()
            }
        }
    }
}

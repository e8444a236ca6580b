use crate::application::tooling::LinkError;
use crate::infrastructure::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("a turn is already in flight")]
    Busy,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Busy => {
                "I'm still working on your previous request. One moment.".to_string()
            }
            AgentError::Model(err) => err.user_message(),
            AgentError::Link(err) => err.user_message(),
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("record host channel is closed")]
    Closed,
    #[error("request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },
}

impl LinkError {
    pub fn user_message(&self) -> String {
        match self {
            LinkError::Closed => {
                "The record system is no longer reachable. Restart the session and try again."
                    .to_string()
            }
            LinkError::Timeout { method, .. } => {
                format!("The record system did not answer the {method} request in time.")
            }
        }
    }
}

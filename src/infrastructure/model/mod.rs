mod adapter;
mod extract;
mod failover;
mod http;
mod simulator;
mod traits;
mod types;

pub use failover::FailoverProvider;
pub use http::CompletionClient;
pub use simulator::SimulationClient;
pub use traits::ModelProvider;
pub use types::{CompletionRequest, ModelError};

mod application;
mod cli;
mod config;
mod domain;
mod infrastructure;

use application::agent::ChatAgent;
use application::store::RecordStore;
use application::stdio;
use application::tooling::{RecordHost, RecordLink, ToolRouter, channel_pair};
use clap::Parser;
use cli::{Cli, RunMode};
use config::AppConfig;
use domain::record::PatientRecord;
use infrastructure::model::{CompletionClient, FailoverProvider, ModelProvider, SimulationClient};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    dotenvy::dotenv().ok();
    info!("Starting bedside");

    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, simulate = cli.simulate, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let mut config = AppConfig::load(config_path)?;
    if let Some(endpoint) = cli.endpoint.clone() {
        config.endpoint = endpoint;
    }
    if let Some(model) = cli.model.clone() {
        config.model = model;
    }
    if cli.simulate {
        config.simulate = true;
    }

    let provider: Arc<dyn ModelProvider> = if config.simulate {
        info!("Using local simulation provider");
        Arc::new(SimulationClient)
    } else {
        info!(endpoint = %config.endpoint, model = %config.model, "Using completion endpoint with simulation failover");
        Arc::new(FailoverProvider::new(CompletionClient::new(
            config.endpoint.clone(),
            config.model.clone(),
            config.api_key.clone(),
            config.temperature,
            config.max_tokens,
        )))
    };

    let router = Arc::new(ToolRouter::new(RecordStore::new(PatientRecord::demo())));
    let (agent_port, host_port) = channel_pair();
    let _host = RecordHost::spawn(router, host_port);
    let (link, events) = RecordLink::spawn(
        agent_port,
        Duration::from_millis(config.request_timeout_ms),
    );

    let agent = Arc::new(ChatAgent::new(provider, Arc::clone(&link)));

    match cli.mode {
        RunMode::Chat => {
            info!("Entering interactive chat mode");
            stdio::run(agent, link, events).await?;
        }
        RunMode::Oneshot => {
            let prompt = load_prompt(&cli)?;
            info!("Dispatching single prompt");
            let outcome = agent.send(prompt).await.map_err(|err| err.to_string())?;
            let output = json!({
                "replies": outcome.replies,
                "tool_steps": outcome.steps,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    info!("bedside finished");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return Ok(content.trim().to_string());
    }

    if !cli.prompt.is_empty() {
        return Ok(cli.prompt.join(" ").trim().to_string());
    }

    warn!("Prompt not provided via arguments or file");
    Err("prompt required via arguments or --prompt-file".into())
}

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "bedside",
    version,
    about = "Chart-side chat agent for an in-memory patient record"
)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<String>,
    /// Override the completion endpoint URL.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Override the model name sent to the endpoint.
    #[arg(long)]
    pub model: Option<String>,
    /// Skip the endpoint entirely and use the local simulation.
    #[arg(long)]
    pub simulate: bool,
    #[arg(long, value_enum, default_value_t = RunMode::Chat)]
    pub mode: RunMode,
    /// Read the one-shot prompt from a file instead of the arguments.
    #[arg(long)]
    pub prompt_file: Option<String>,
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// Interactive terminal chat.
    Chat,
    /// Run a single prompt and print the turn as JSON.
    Oneshot,
}

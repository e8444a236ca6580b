//! Terminal chat surface: reads provider utterances line by line and
//! prints the agent's replies, interleaved with bus notices.

use crate::application::agent::ChatAgent;
use crate::application::tooling::{LinkEvent, RecordLink};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

const BANNER: &str =
    "Connected to the patient record. Type a request, '/tools', '/context', or 'exit'.\n> ";

pub async fn run(
    agent: Arc<ChatAgent>,
    link: Arc<RecordLink>,
    mut events: UnboundedReceiver<LinkEvent>,
) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(BANNER.as_bytes()).await?;
    stdout.flush().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                if input.is_empty() {
                    stdout.write_all(b"> ").await?;
                    stdout.flush().await?;
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                    break;
                }
                if input.eq_ignore_ascii_case("/tools") {
                    // Ask the host to recompute; the answer arrives as a
                    // catalog event below.
                    if link.request_catalog().is_err() {
                        stdout.write_all(b"[record] host unreachable\n").await?;
                    }
                    stdout.write_all(b"> ").await?;
                    stdout.flush().await?;
                    continue;
                }
                if input.eq_ignore_ascii_case("/context") {
                    let text = match link.cached_context().await {
                        Some(context) => serde_json::to_string_pretty(&context)
                            .unwrap_or_else(|err| err.to_string()),
                        None => "no context snapshot yet".to_string(),
                    };
                    stdout.write_all(format!("{text}\n> ").as_bytes()).await?;
                    stdout.flush().await?;
                    continue;
                }

                match agent.send(input).await {
                    Ok(outcome) => {
                        for reply in &outcome.replies {
                            stdout.write_all(format!("{reply}\n").as_bytes()).await?;
                        }
                    }
                    Err(err) => {
                        stdout
                            .write_all(format!("{}\n", err.user_message()).as_bytes())
                            .await?;
                    }
                }
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
            }
            event = events.recv() => {
                match event {
                    Some(LinkEvent::CatalogReplaced(names)) => {
                        stdout
                            .write_all(format!("[record] tools available: {}\n", names.join(", ")).as_bytes())
                            .await?;
                        stdout.flush().await?;
                    }
                    Some(LinkEvent::ContextReplaced) => {
                        debug!("Context snapshot refreshed");
                    }
                    None => break,
                }
            }
        }
    }

    stdout.write_all(b"Goodbye.\n").await?;
    stdout.flush().await?;
    Ok(())
}

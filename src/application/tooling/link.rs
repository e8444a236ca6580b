//! Requester endpoint: allocates request ids, parks continuations in the
//! pending table, and matches inbound responses back to callers.

use super::channel::Port;
use super::envelope::{Envelope, ToolDescriptor, ToolOutcome};
use super::error::LinkError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Bus traffic the chat surface may want to surface to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    CatalogReplaced(Vec<String>),
    ContextReplaced,
}

pub struct RecordLink {
    tx: UnboundedSender<Envelope>,
    pending: Mutex<HashMap<u64, oneshot::Sender<ToolOutcome>>>,
    next_id: AtomicU64,
    catalog: Mutex<Vec<ToolDescriptor>>,
    context: Mutex<Option<Value>>,
    request_timeout: Duration,
}

impl RecordLink {
    /// Splits the port: the sender stays on the link, the receiver feeds
    /// a background reader task. Returns the link and the event stream
    /// for the chat surface.
    pub fn spawn(port: Port, request_timeout: Duration) -> (Arc<Self>, UnboundedReceiver<LinkEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let link = Arc::new(Self {
            tx: port.tx,
            pending: Mutex::new(HashMap::new()),
            // Ids start at 1 and are never reused, even after failures.
            next_id: AtomicU64::new(1),
            catalog: Mutex::new(Vec::new()),
            context: Mutex::new(None),
            request_timeout,
        });

        let reader = Arc::clone(&link);
        tokio::spawn(async move {
            reader.reader_loop(port.rx, events_tx).await;
        });

        (link, events_rx)
    }

    /// Sends one request and waits for its correlated response. On
    /// timeout the pending entry is removed here, so a late response
    /// finds nothing and is dropped.
    pub async fn call(&self, method: &str, params: Value) -> Result<ToolOutcome, LinkError> {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(request_id, tx);
        }

        let sent = self.tx.send(Envelope::Request {
            request_id,
            method: method.to_string(),
            params,
        });
        if sent.is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err(LinkError::Closed);
        }
        debug!(request_id, method, "Request transmitted to record host");

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(LinkError::Closed),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                Err(LinkError::Timeout {
                    method: method.to_string(),
                    timeout_ms: self.request_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Asks the host to recompute and push its tool catalog.
    pub fn request_catalog(&self) -> Result<(), LinkError> {
        if self.tx.send(Envelope::ToolsRequest).is_err() {
            return Err(LinkError::Closed);
        }
        Ok(())
    }

    pub async fn catalog(&self) -> Vec<ToolDescriptor> {
        self.catalog.lock().await.clone()
    }

    pub async fn cached_context(&self) -> Option<Value> {
        self.context.lock().await.clone()
    }

    /// Refreshes the context snapshot out of a successful getContext
    /// result, mirroring what a context push does.
    pub async fn remember_context(&self, context: Value) {
        let mut cached = self.context.lock().await;
        *cached = Some(context);
    }

    async fn reader_loop(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<Envelope>,
        events: UnboundedSender<LinkEvent>,
    ) {
        while let Some(envelope) = rx.recv().await {
            if envelope.from_agent_side() {
                debug!("Ignoring envelope from this side's own outbound set");
                continue;
            }
            match envelope {
                Envelope::Response { request_id, result } => {
                    // Remove before resolving: a duplicate delivery finds
                    // no entry and resolves nothing.
                    let waiter = {
                        let mut pending = self.pending.lock().await;
                        pending.remove(&request_id)
                    };
                    match waiter {
                        Some(sender) => {
                            let _ = sender.send(result);
                        }
                        None => {
                            debug!(request_id, "Dropping response with no pending request");
                        }
                    }
                }
                Envelope::ToolsAvailable { tools } => {
                    let names: Vec<String> = tools.iter().map(|tool| tool.name.clone()).collect();
                    info!(count = tools.len(), "Tool catalog replaced");
                    {
                        let mut catalog = self.catalog.lock().await;
                        *catalog = tools;
                    }
                    let _ = events.send(LinkEvent::CatalogReplaced(names));
                }
                Envelope::ContextPush { context } => {
                    debug!("Context snapshot replaced");
                    {
                        let mut cached = self.context.lock().await;
                        *cached = Some(context);
                    }
                    let _ = events.send(LinkEvent::ContextReplaced);
                }
                Envelope::Error { message } => {
                    warn!(message, "Record host reported an error");
                }
                Envelope::Request { .. } | Envelope::ToolsRequest => unreachable!(),
            }
        }
        debug!("Record host channel closed; reader loop ending");
    }

    #[cfg(test)]
    pub(super) async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

//! Host endpoint: owns the record store (through the router) and answers
//! the agent side's envelopes.

use super::channel::Port;
use super::envelope::Envelope;
use super::router::ToolRouter;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct RecordHost;

impl RecordHost {
    /// Serves the port until the counterpart goes away. The initial
    /// context snapshot and tool catalog are pushed before any request
    /// is answered.
    pub fn spawn(router: Arc<ToolRouter>, mut port: Port) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial = router.dispatch("getContext", serde_json::Value::Null);
            if let Some(context) = initial.data {
                port.send(Envelope::ContextPush { context });
            }
            port.send(Envelope::ToolsAvailable {
                tools: router.catalog(),
            });
            info!("Record host serving");

            while let Some(envelope) = port.recv().await {
                if !envelope.from_agent_side() {
                    debug!("Ignoring envelope from this side's own outbound set");
                    continue;
                }
                match envelope {
                    Envelope::Request {
                        request_id,
                        method,
                        params,
                    } => {
                        let result = router.dispatch(&method, params);
                        port.send(Envelope::Response { request_id, result });
                    }
                    Envelope::ToolsRequest => {
                        debug!("Catalog requested");
                        port.send(Envelope::ToolsAvailable {
                            tools: router.catalog(),
                        });
                    }
                    _ => unreachable!(),
                }
            }
            info!("Agent side disconnected; record host stopping");
        })
    }
}

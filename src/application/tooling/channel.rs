//! Addressed duplex channel between the two endpoints. Each side holds a
//! port that transmits only to its counterpart; there is no broadcast.

use super::envelope::Envelope;
use tokio::sync::mpsc;

pub struct Port {
    pub(super) tx: mpsc::UnboundedSender<Envelope>,
    pub(super) rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Port {
    /// Returns false when the counterpart is gone.
    pub fn send(&self, envelope: Envelope) -> bool {
        self.tx.send(envelope).is_ok()
    }

    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

pub fn channel_pair() -> (Port, Port) {
    let (left_tx, right_rx) = mpsc::unbounded_channel();
    let (right_tx, left_rx) = mpsc::unbounded_channel();
    (
        Port {
            tx: left_tx,
            rx: left_rx,
        },
        Port {
            tx: right_tx,
            rx: right_rx,
        },
    )
}

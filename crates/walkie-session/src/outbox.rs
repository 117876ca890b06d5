//! Outbound half of the signaling channel.

use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkie_common::ClientMessage;

/// Queue of client messages waiting to be written to the channel.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a message. Returns `false` if the channel writer is gone.
    pub fn send(&self, msg: ClientMessage) -> bool {
        let name = msg.name();
        match self.tx.send(msg) {
            Ok(()) => {
                debug!(message = name, "queued outbound message");
                true
            }
            Err(_) => {
                warn!(message = name, "signaling channel closed, message dropped");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

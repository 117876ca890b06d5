//! Seam between the coordinator and the peer media transport.
//!
//! A transport negotiates one point-to-point audio session. It is driven
//! synchronously (`signal`, `replace_track`, `close`) and reports back
//! asynchronously through its [`TransportEventSink`], which tags every
//! event with the peer and the connection generation it belongs to.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use walkie_common::{NegotiationSignal, ParticipantId, TransportError};

use crate::event::{EventSender, SessionEvent};
use crate::ice::IceConfig;
use crate::media::TrackHandle;

/// Generation id of one connection. Never reused within a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Parameters for a new transport.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// The initiator produces the offer; the responder waits for one.
    pub initiator: bool,
    /// `None` means direct transport only.
    pub ice: Option<IceConfig>,
    /// Outbound track attached from the start.
    pub track: Option<TrackHandle>,
}

/// Remote audio delivered by an open transport. Opaque to the coordinator.
#[derive(Clone)]
pub struct RemoteStream {
    pub id: String,
    pub handle: Arc<dyn Any + Send + Sync>,
}

impl RemoteStream {
    pub fn new(id: impl Into<String>, handle: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            id: id.into(),
            handle,
        }
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream").field("id", &self.id).finish()
    }
}

#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A handshake payload to deliver to the remote peer.
    Signal(NegotiationSignal),
    /// The remote peer's audio is live.
    Stream(RemoteStream),
    Failed(String),
    Closed,
}

pub trait PeerTransport: Send {
    fn signal(&mut self, signal: NegotiationSignal) -> Result<(), TransportError>;
    fn replace_track(&mut self, old: &TrackHandle, new: &TrackHandle)
        -> Result<(), TransportError>;
    fn close(&mut self);
}

pub trait TransportFactory: Send {
    fn create(
        &mut self,
        options: TransportOptions,
        sink: TransportEventSink,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}

// ---------------------------------------------------------------------------
// Event Sink
// ---------------------------------------------------------------------------

/// Posts transport completions back into the coordinator's queue.
#[derive(Debug, Clone)]
pub struct TransportEventSink {
    peer: ParticipantId,
    connection: ConnectionId,
    tx: EventSender,
}

impl TransportEventSink {
    pub(crate) fn new(peer: ParticipantId, connection: ConnectionId, tx: EventSender) -> Self {
        Self {
            peer,
            connection,
            tx,
        }
    }

    pub fn peer(&self) -> &ParticipantId {
        &self.peer
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Returns `false` once the coordinator has shut down.
    pub fn post(&self, event: TransportEvent) -> bool {
        self.tx
            .send(SessionEvent::Transport {
                peer: self.peer.clone(),
                connection: self.connection,
                event,
            })
            .is_ok()
    }

    pub fn signal(&self, signal: NegotiationSignal) -> bool {
        self.post(TransportEvent::Signal(signal))
    }

    pub fn stream(&self, stream: RemoteStream) -> bool {
        self.post(TransportEvent::Stream(stream))
    }

    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.post(TransportEvent::Failed(reason.into()))
    }

    pub fn closed(&self) -> bool {
        self.post(TransportEvent::Closed)
    }
}

//! Per-peer connection lifecycle.
//!
//! ```text
//! Created ──first signal──▶ Negotiating ──remote stream──▶ Open
//!    │                           │                           │
//!    └───────────── close / transport failure ───────────────┴──▶ Closed
//! ```

use std::fmt;

use tracing::{debug, info, warn};
use walkie_common::{NegotiationSignal, ParticipantId, TransportError};

use crate::media::TrackHandle;
use crate::transport::{ConnectionId, PeerTransport, RemoteStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Created,
    Negotiating,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created on `welcome`; sends the offer as `call`.
    Initiator,
    /// Created on `call`; sends the answer as `answer`.
    Responder,
}

/// What `replace_track` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSwap {
    Swapped,
    /// Held until negotiation begins.
    Deferred,
    /// The connection is closed or already carries the new track.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connection is closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One negotiated media session with a single remote participant.
///
/// Owns the transport and the local track it sends. Closing is final: a
/// closed connection is never reopened, a new one with a fresh
/// [`ConnectionId`] takes its place.
pub struct Connection {
    id: ConnectionId,
    peer: ParticipantId,
    role: Role,
    state: ConnectionState,
    transport: Option<Box<dyn PeerTransport>>,
    track: Option<TrackHandle>,
    pending_track: Option<TrackHandle>,
    remote: Option<RemoteStream>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        peer: ParticipantId,
        role: Role,
        transport: Box<dyn PeerTransport>,
        track: Option<TrackHandle>,
    ) -> Self {
        debug!(peer = %peer, connection = %id, ?role, "connection created");
        Self {
            id,
            peer,
            role,
            state: ConnectionState::Created,
            transport: Some(transport),
            track,
            pending_track: None,
            remote: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> &ParticipantId {
        &self.peer
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Outbound track currently attached to the transport.
    pub fn track(&self) -> Option<&TrackHandle> {
        self.track.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote.as_ref()
    }

    /// The transport produced a handshake payload for the remote peer.
    ///
    /// Returns the signal to forward. The first one moves `Created` to
    /// `Negotiating`.
    pub fn on_local_signal(
        &mut self,
        signal: NegotiationSignal,
    ) -> Result<NegotiationSignal, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        self.begin_negotiation()?;
        Ok(signal)
    }

    /// Feed a handshake payload received from the remote peer.
    pub fn apply_remote_signal(&mut self, signal: NegotiationSignal) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        self.begin_negotiation()?;
        let Some(transport) = self.transport.as_mut() else {
            return Err(ConnectionError::Closed);
        };
        if let Err(e) = transport.signal(signal) {
            warn!(peer = %self.peer, connection = %self.id, error = %e, "negotiation failed");
            self.fail();
            return Err(e.into());
        }
        Ok(())
    }

    /// The remote stream went live. Returns `false` if the connection is closed.
    pub fn on_remote_stream(&mut self, stream: RemoteStream) -> bool {
        if self.is_closed() {
            return false;
        }
        info!(peer = %self.peer, connection = %self.id, stream = %stream.id, "connection open");
        self.state = ConnectionState::Open;
        self.remote = Some(stream);
        true
    }

    /// Hot-swap the outbound track without renegotiating.
    pub fn replace_track(
        &mut self,
        old: &TrackHandle,
        new: &TrackHandle,
    ) -> Result<TrackSwap, ConnectionError> {
        match self.state {
            ConnectionState::Closed => Ok(TrackSwap::Skipped),
            ConnectionState::Created => {
                self.pending_track = Some(new.clone());
                Ok(TrackSwap::Deferred)
            }
            ConnectionState::Negotiating | ConnectionState::Open => {
                if self.track.as_ref().is_some_and(|t| t.id() == new.id()) {
                    return Ok(TrackSwap::Skipped);
                }
                self.swap_track(old, new)?;
                Ok(TrackSwap::Swapped)
            }
        }
    }

    /// Transport failure: close, keeping the registry entry.
    pub fn fail(&mut self) {
        self.close();
    }

    /// Release the transport. Idempotent.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state = ConnectionState::Closed;
        self.pending_track = None;
        self.remote = None;
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        debug!(peer = %self.peer, connection = %self.id, "connection closed");
    }

    fn begin_negotiation(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Created {
            return Ok(());
        }
        self.state = ConnectionState::Negotiating;
        if let Some(pending) = self.pending_track.take() {
            let old = self.track.clone().unwrap_or_else(|| pending.clone());
            self.swap_track(&old, &pending)?;
        }
        Ok(())
    }

    fn swap_track(&mut self, old: &TrackHandle, new: &TrackHandle) -> Result<(), ConnectionError> {
        let attached = self.track.clone().unwrap_or_else(|| old.clone());
        let Some(transport) = self.transport.as_mut() else {
            return Err(ConnectionError::Closed);
        };
        if let Err(e) = transport.replace_track(&attached, new) {
            warn!(peer = %self.peer, connection = %self.id, error = %e, "track swap failed");
            self.fail();
            return Err(e.into());
        }
        self.track = Some(new.clone());
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("track", &self.track.as_ref().map(|t| t.id().to_string()))
            .finish()
    }
}

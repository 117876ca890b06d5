//! Routes inbound signaling messages onto the peer registry and turns
//! transport handshake output into outbound messages.

use tracing::{debug, info, warn};
use walkie_common::{ClientMessage, NegotiationSignal, ParticipantId, ServerMessage};

use crate::connection::{Connection, ConnectionError, Role};
use crate::event::EventSender;
use crate::ice::IceServerUrls;
use crate::outbox::Outbox;
use crate::registry::PeerRegistry;
use crate::session::LocalSession;
use crate::transport::{
    ConnectionId, RemoteStream, TransportEvent, TransportEventSink, TransportFactory,
    TransportOptions,
};

/// Why an inbound message was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Sent by us.
    SelfAddressed,
    /// Addressed to someone else.
    NotAddressedToUs,
    /// `answer` for a peer with no connection.
    NoConnection,
    /// Signal for a connection that already closed.
    ConnectionClosed,
    /// `answer` arriving at a responder.
    UnexpectedAnswer,
    /// `disconnected` for a peer we never knew.
    UnknownPeer,
    /// Mic control, handled by arbitration.
    NotSignaling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Applied,
    Dropped(DropReason),
    Failed { peer: ParticipantId, reason: String },
}

/// What a transport completion amounted to.
#[derive(Debug, Clone)]
pub enum TransportOutcome {
    /// A handshake message went out.
    Sent,
    Opened(RemoteStream),
    Failed(String),
    Closed,
    /// The connection it belongs to was closed or replaced.
    Stale,
}

// ---------------------------------------------------------------------------
// Signaling Router
// ---------------------------------------------------------------------------

/// Applies signaling messages to the registry and creates transports for
/// the connections they call for.
pub struct SignalingRouter {
    factory: Box<dyn TransportFactory>,
    events: EventSender,
    ice_urls: IceServerUrls,
    next_connection: u64,
}

impl SignalingRouter {
    pub fn new(
        factory: Box<dyn TransportFactory>,
        events: EventSender,
        ice_urls: IceServerUrls,
    ) -> Self {
        Self {
            factory,
            events,
            ice_urls,
            next_connection: 1,
        }
    }

    pub fn route(
        &mut self,
        msg: ServerMessage,
        session: &mut LocalSession,
        registry: &mut PeerRegistry,
        outbox: &Outbox,
    ) -> RouteOutcome {
        match msg {
            ServerMessage::Init {
                turn_id,
                turn_pwd,
                my_socket_id,
            } => {
                session.apply_init(turn_id.as_deref(), turn_pwd.as_deref(), my_socket_id);
                RouteOutcome::Applied
            }
            ServerMessage::Joined { id } => {
                if session.is_self(&id) {
                    return RouteOutcome::Dropped(DropReason::SelfAddressed);
                }
                registry.announce(id.clone());
                info!(peer = %id, "peer joined");
                outbox.send(ClientMessage::Welcome {
                    from: session.self_id().cloned(),
                    to: id,
                });
                RouteOutcome::Applied
            }
            ServerMessage::Welcome { from, to } => {
                if let Some(reason) = check_addressing(session, &from, &to) {
                    return RouteOutcome::Dropped(reason);
                }
                match self.open(Role::Initiator, from.clone(), session, registry) {
                    Ok(_) => RouteOutcome::Applied,
                    Err(reason) => RouteOutcome::Failed { peer: from, reason },
                }
            }
            ServerMessage::Call { from, to, signal } => {
                if let Some(reason) = check_addressing(session, &from, &to) {
                    return RouteOutcome::Dropped(reason);
                }
                let live_responder = registry
                    .connection(&from)
                    .is_some_and(|c| c.role() == Role::Responder && !c.is_closed());
                if !live_responder {
                    if let Err(reason) = self.open(Role::Responder, from.clone(), session, registry) {
                        return RouteOutcome::Failed { peer: from, reason };
                    }
                }
                feed(registry, from, signal)
            }
            ServerMessage::Answer { from, to, signal } => {
                if let Some(reason) = check_addressing(session, &from, &to) {
                    return RouteOutcome::Dropped(reason);
                }
                let rejected = match registry.connection(&from) {
                    None => Some(DropReason::NoConnection),
                    Some(c) if c.is_closed() => Some(DropReason::ConnectionClosed),
                    Some(c) if c.role() == Role::Responder => Some(DropReason::UnexpectedAnswer),
                    Some(_) => None,
                };
                match rejected {
                    Some(reason) => RouteOutcome::Dropped(reason),
                    None => feed(registry, from, signal),
                }
            }
            ServerMessage::Disconnected { id } => match registry.remove(&id) {
                Some(_) => {
                    info!(peer = %id, "peer disconnected");
                    RouteOutcome::Applied
                }
                None => RouteOutcome::Dropped(DropReason::UnknownPeer),
            },
            ServerMessage::DisableMic | ServerMessage::EnableMic => {
                RouteOutcome::Dropped(DropReason::NotSignaling)
            }
        }
    }

    /// Handle a completion reported by a transport.
    pub fn route_transport(
        &mut self,
        peer: &ParticipantId,
        connection: ConnectionId,
        event: TransportEvent,
        session: &LocalSession,
        registry: &mut PeerRegistry,
        outbox: &Outbox,
    ) -> TransportOutcome {
        let Some(conn) = registry.connection_mut(peer) else {
            return TransportOutcome::Stale;
        };
        if conn.id() != connection || conn.is_closed() {
            debug!(peer = %peer, connection = %connection, "stale transport event dropped");
            return TransportOutcome::Stale;
        }

        match event {
            TransportEvent::Signal(signal) => match conn.on_local_signal(signal) {
                Ok(signal) => {
                    let from = session.self_id().cloned();
                    let to = peer.clone();
                    let msg = match conn.role() {
                        Role::Initiator => ClientMessage::Call { from, to, signal },
                        Role::Responder => ClientMessage::Answer { from, to, signal },
                    };
                    outbox.send(msg);
                    TransportOutcome::Sent
                }
                Err(ConnectionError::Closed) => TransportOutcome::Stale,
                Err(e) => TransportOutcome::Failed(e.to_string()),
            },
            TransportEvent::Stream(stream) => {
                if conn.on_remote_stream(stream.clone()) {
                    TransportOutcome::Opened(stream)
                } else {
                    TransportOutcome::Stale
                }
            }
            TransportEvent::Failed(reason) => {
                warn!(peer = %peer, connection = %connection, %reason, "transport failed");
                conn.fail();
                TransportOutcome::Failed(reason)
            }
            TransportEvent::Closed => {
                conn.close();
                TransportOutcome::Closed
            }
        }
    }

    /// Create a connection for `peer` and attach it, replacing any other.
    fn open(
        &mut self,
        role: Role,
        peer: ParticipantId,
        session: &LocalSession,
        registry: &mut PeerRegistry,
    ) -> Result<ConnectionId, String> {
        let id = ConnectionId::new(self.next_connection);
        self.next_connection += 1;

        let track = session.media().track().cloned();
        let options = TransportOptions {
            initiator: role == Role::Initiator,
            ice: session.ice_config(&self.ice_urls),
            track: track.clone(),
        };
        let sink = TransportEventSink::new(peer.clone(), id, self.events.clone());
        let transport = self.factory.create(options, sink).map_err(|e| {
            warn!(peer = %peer, error = %e, "failed to create transport");
            e.to_string()
        })?;

        registry.attach(Connection::new(id, peer, role, transport, track));
        Ok(id)
    }
}

fn check_addressing(
    session: &LocalSession,
    from: &ParticipantId,
    to: &ParticipantId,
) -> Option<DropReason> {
    if session.is_self(from) {
        Some(DropReason::SelfAddressed)
    } else if !session.is_addressed_to_us(to) {
        Some(DropReason::NotAddressedToUs)
    } else {
        None
    }
}

fn feed(registry: &mut PeerRegistry, peer: ParticipantId, signal: NegotiationSignal) -> RouteOutcome {
    let Some(conn) = registry.connection_mut(&peer) else {
        return RouteOutcome::Dropped(DropReason::NoConnection);
    };
    match conn.apply_remote_signal(signal) {
        Ok(()) => RouteOutcome::Applied,
        Err(ConnectionError::Closed) => RouteOutcome::Dropped(DropReason::ConnectionClosed),
        Err(e) => RouteOutcome::Failed {
            peer,
            reason: e.to_string(),
        },
    }
}

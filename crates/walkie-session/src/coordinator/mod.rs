//! Session coordinator: owns the local session and the peer registry and
//! applies every [`SessionEvent`] in arrival order.
//!
//! Handlers are synchronous. Anything slow (microphone capture, transport
//! negotiation, channel I/O) runs in its own task and posts its result back
//! into the same queue, so each handler sees a consistent registry.

mod handle;


pub use handle::{start, RunningSession, SessionHandle};

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use walkie_common::{ClientMessage, MediaError, ParticipantId, ServerMessage};

use crate::arbitration::{self, SpeakOutcome};
use crate::config::SessionConfig;
use crate::connection::{Connection, ConnectionState};
use crate::event::{CapturePurpose, EventSender, LocalCommand, RoomEvent, SessionEvent};
use crate::media::{LocalMedia, MediaSource, TrackHandle};
use crate::output::AudioOutput;
use crate::outbox::Outbox;
use crate::registry::PeerRegistry;
use crate::router::{RouteOutcome, SignalingRouter, TransportOutcome};
use crate::session::LocalSession;
use crate::transport::{ConnectionId, TransportEvent, TransportFactory};
use crate::visibility::{Visibility, VisibilityTracker};

/// Owner of one client's room membership.
///
/// Holds the local session, the peer registry and the outbound queue, and
/// reports what happened to the UI as [`RoomEvent`]s. Drive it with
/// [`Coordinator::run`] or feed it events one at a time through
/// [`Coordinator::handle`].
pub struct Coordinator {
    session: LocalSession,
    registry: PeerRegistry,
    router: SignalingRouter,
    outbox: Outbox,
    output: Box<dyn AudioOutput>,
    visibility: VisibilityTracker,
    events: EventSender,
    room_tx: mpsc::UnboundedSender<RoomEvent>,
    joining: bool,
    refreshing: bool,
    refresh_pending: bool,
    closed: bool,
}

impl Coordinator {
    pub fn new(
        config: &SessionConfig,
        media: Arc<dyn MediaSource>,
        factory: Box<dyn TransportFactory>,
        mut output: Box<dyn AudioOutput>,
        outbox: Outbox,
        events: EventSender,
    ) -> (Self, mpsc::UnboundedReceiver<RoomEvent>) {
        let (room_tx, room_rx) = mpsc::unbounded_channel();
        output.set_muted(true);
        let coordinator = Self {
            session: LocalSession::new(LocalMedia::new(media)),
            registry: PeerRegistry::new(),
            router: SignalingRouter::new(factory, events.clone(), config.ice_urls.clone()),
            outbox,
            output,
            visibility: VisibilityTracker::new(),
            events,
            room_tx,
            joining: false,
            refreshing: false,
            refresh_pending: false,
            closed: false,
        };
        (coordinator, room_rx)
    }

    pub fn session(&self) -> &LocalSession {
        &self.session
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Process events until the channel closes or the user leaves.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        info!("session coordinator started");
        while let Some(event) = events.recv().await {
            if self.handle(event).is_break() {
                break;
            }
        }
        self.teardown();
        info!("session coordinator stopped");
    }

    /// Apply one event. `Break` means the session is over.
    pub fn handle(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::Inbound(msg) => self.on_inbound(msg),
            SessionEvent::Transport {
                peer,
                connection,
                event,
            } => self.on_transport(peer, connection, event),
            SessionEvent::MediaAcquired {
                purpose: CapturePurpose::Join,
                result,
            } => self.on_join_capture(result),
            SessionEvent::MediaAcquired {
                purpose: CapturePurpose::Refresh,
                result,
            } => self.on_refresh_capture(result),
            SessionEvent::Visibility(visibility) => self.on_visibility(visibility),
            SessionEvent::Command(command) => return self.on_command(command),
            SessionEvent::ChannelClosed => {
                warn!("signaling channel lost, leaving room");
                self.teardown();
                self.emit(RoomEvent::Disconnected);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    // -----------------------------------------------------------------------
    // Signaling
    // -----------------------------------------------------------------------

    fn on_inbound(&mut self, msg: ServerMessage) {
        if let Some(locked) = arbitration::apply_mic_control(self.session.media_mut(), &msg) {
            self.emit(if locked {
                RoomEvent::MicLocked
            } else {
                RoomEvent::MicUnlocked
            });
            return;
        }

        let name = msg.name();
        let open_before = msg.peer().and_then(|peer| self.open_connection(peer));
        let notice = match &msg {
            ServerMessage::Init { my_socket_id, .. } => Some(RoomEvent::Ready {
                self_id: my_socket_id.clone(),
            }),
            ServerMessage::Joined { id } => Some(RoomEvent::PeerJoined(id.clone())),
            ServerMessage::Disconnected { id } => Some(RoomEvent::PeerLeft(id.clone())),
            _ => None,
        };

        match self
            .router
            .route(msg, &mut self.session, &mut self.registry, &self.outbox)
        {
            RouteOutcome::Applied => {
                if let Some(RoomEvent::PeerLeft(peer)) = &notice {
                    self.output.detach(peer);
                } else if let Some((peer, before)) = open_before {
                    if self.registry.connection(&peer).map(Connection::id) != Some(before) {
                        debug!(peer = %peer, "open connection replaced");
                        self.output.detach(&peer);
                    }
                }
                if let Some(notice) = notice {
                    self.emit(notice);
                }
            }
            RouteOutcome::Dropped(reason) => {
                debug!(message = name, ?reason, "signaling message dropped");
            }
            RouteOutcome::Failed { peer, reason } => self.peer_failed(peer, reason),
        }
    }

    /// The peer's connection, if it is currently carrying audio.
    fn open_connection(&self, peer: &ParticipantId) -> Option<(ParticipantId, ConnectionId)> {
        let conn = self.registry.connection(peer)?;
        (conn.state() == ConnectionState::Open).then(|| (peer.clone(), conn.id()))
    }

    fn on_transport(&mut self, peer: ParticipantId, connection: ConnectionId, event: TransportEvent) {
        let outcome = self.router.route_transport(
            &peer,
            connection,
            event,
            &self.session,
            &mut self.registry,
            &self.outbox,
        );
        match outcome {
            TransportOutcome::Opened(stream) => {
                self.output.attach(&peer, &stream);
                self.emit(RoomEvent::PeerConnected(peer));
            }
            TransportOutcome::Failed(reason) => self.peer_failed(peer, reason),
            TransportOutcome::Closed => self.output.detach(&peer),
            TransportOutcome::Sent | TransportOutcome::Stale => {}
        }
    }

    fn peer_failed(&mut self, peer: ParticipantId, reason: String) {
        warn!(peer = %peer, %reason, "peer connection failed");
        self.output.detach(&peer);
        self.emit(RoomEvent::PeerFailed { peer, reason });
    }

    // -----------------------------------------------------------------------
    // Local commands
    // -----------------------------------------------------------------------

    fn on_command(&mut self, command: LocalCommand) -> ControlFlow<()> {
        match command {
            LocalCommand::Join => {
                if self.session.is_joined() || self.joining {
                    debug!("join ignored, already joined or joining");
                } else {
                    self.joining = true;
                    self.spawn_capture(CapturePurpose::Join);
                }
            }
            LocalCommand::StartSpeaking => {
                if !self.session.is_joined() {
                    debug!("start speaking ignored, not joined");
                    return ControlFlow::Continue(());
                }
                let outcome = arbitration::start_speaking(self.session.media_mut(), &self.outbox);
                if outcome == SpeakOutcome::Started {
                    self.emit(RoomEvent::SpeakingChanged(true));
                }
            }
            LocalCommand::StopSpeaking => {
                let outcome = arbitration::stop_speaking(self.session.media_mut(), &self.outbox);
                if outcome == SpeakOutcome::Stopped {
                    self.emit(RoomEvent::SpeakingChanged(false));
                }
            }
            LocalCommand::Leave => {
                info!("leaving room");
                arbitration::stop_speaking(self.session.media_mut(), &self.outbox);
                self.teardown();
                self.emit(RoomEvent::Disconnected);
                return ControlFlow::Break(());
            }
            LocalCommand::PruneClosed => {
                for peer in self.registry.prune_closed() {
                    self.output.detach(&peer);
                    self.emit(RoomEvent::PeerLeft(peer));
                }
            }
        }
        ControlFlow::Continue(())
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    fn spawn_capture(&self, purpose: CapturePurpose) {
        let source = self.session.media().source();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = source.acquire_audio().await;
            let _ = events.send(SessionEvent::MediaAcquired { purpose, result });
        });
    }

    fn on_join_capture(&mut self, result: Result<TrackHandle, MediaError>) {
        self.joining = false;
        let track = match result {
            Ok(track) => track,
            Err(e) => {
                warn!(error = %e, "cannot join without a microphone");
                self.emit(RoomEvent::JoinFailed(e.to_string()));
                return;
            }
        };
        if self.closed {
            track.stop();
            return;
        }

        self.session.media_mut().install_acquired(track);
        self.session.set_joined(true);
        self.outbox.send(ClientMessage::Join);
        self.output.set_muted(false);

        let participants = self.registry.len() + 1;
        info!(participants, "joined room");
        self.emit(RoomEvent::Joined { participants });
    }

    fn on_visibility(&mut self, visibility: Visibility) {
        if !self.visibility.observe(visibility) {
            return;
        }
        if !self.session.media().has_track() {
            return;
        }
        if self.refreshing {
            debug!("back in foreground during a refresh, queueing another");
            self.refresh_pending = true;
        } else {
            debug!("back in foreground, refreshing capture");
            self.refreshing = true;
            self.spawn_capture(CapturePurpose::Refresh);
        }
    }

    fn on_refresh_capture(&mut self, result: Result<TrackHandle, MediaError>) {
        self.refreshing = false;
        self.install_refresh(result);
        if self.refresh_pending && !self.closed && self.session.media().has_track() {
            self.refresh_pending = false;
            self.refreshing = true;
            self.spawn_capture(CapturePurpose::Refresh);
        }
    }

    fn install_refresh(&mut self, result: Result<TrackHandle, MediaError>) {
        let new = match result {
            Ok(track) => track,
            Err(e) => {
                warn!(error = %e, "capture refresh failed, keeping current track");
                return;
            }
        };
        let Some(swap) = self.session.media_mut().install_refreshed(new) else {
            return;
        };

        let mut failed = Vec::new();
        for conn in self.registry.connections_mut() {
            match conn.replace_track(&swap.old, &swap.new) {
                Ok(outcome) => debug!(peer = %conn.peer(), ?outcome, "track replaced"),
                Err(e) => failed.push((conn.peer().clone(), e.to_string())),
            }
        }
        swap.old.stop();
        for (peer, reason) in failed {
            self.peer_failed(peer, reason);
        }

        if swap.was_transmitting {
            self.outbox.send(ClientMessage::StopSpeaking);
            self.emit(RoomEvent::SpeakingChanged(false));
        }
        self.emit(RoomEvent::CaptureRefreshed);
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Close every connection and clear the local session. Idempotent.
    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for peer in self.registry.ids() {
            self.output.detach(&peer);
        }
        self.registry.clear();
        self.session.clear();
        self.output.set_muted(true);
        self.joining = false;
        self.refreshing = false;
        self.refresh_pending = false;
    }

    /// Fails only once the UI has dropped its receiver.
    fn emit(&self, event: RoomEvent) {
        if self.room_tx.send(event).is_err() {
            debug!("room event receiver closed");
        }
    }
}

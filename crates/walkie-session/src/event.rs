//! Events flowing into and out of the coordinator.

use tokio::sync::mpsc;
use walkie_common::{MediaError, ParticipantId, ServerMessage};

use crate::media::TrackHandle;
use crate::transport::{ConnectionId, TransportEvent};
use crate::visibility::Visibility;

/// Sender half of the coordinator's single input queue.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Why a capture was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePurpose {
    Join,
    Refresh,
}

/// Requests from the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    Join,
    StartSpeaking,
    StopSpeaking,
    Leave,
    /// Drop registry entries whose connection has failed.
    PruneClosed,
}

/// Everything the coordinator reacts to, processed one at a time.
#[derive(Debug)]
pub enum SessionEvent {
    Inbound(ServerMessage),
    Transport {
        peer: ParticipantId,
        connection: ConnectionId,
        event: TransportEvent,
    },
    MediaAcquired {
        purpose: CapturePurpose,
        result: Result<TrackHandle, MediaError>,
    },
    Visibility(Visibility),
    Command(LocalCommand),
    /// The signaling channel is gone.
    ChannelClosed,
}

/// Notifications for the room UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The channel assigned our id.
    Ready { self_id: ParticipantId },
    /// Local capture is live and `join` was sent. `participants` counts us.
    Joined { participants: usize },
    JoinFailed(String),
    PeerJoined(ParticipantId),
    PeerLeft(ParticipantId),
    PeerConnected(ParticipantId),
    PeerFailed { peer: ParticipantId, reason: String },
    /// Another participant is transmitting.
    MicLocked,
    MicUnlocked,
    SpeakingChanged(bool),
    CaptureRefreshed,
    Disconnected,
}

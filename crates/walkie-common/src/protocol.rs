//! Wire protocol spoken between clients and the relay.
//!
//! Every frame is a JSON text message tagged by `"type"`. Negotiation
//! signals are opaque to the relay; it only reads `to` to route them.

use serde::{Deserialize, Serialize};

use crate::id::ParticipantId;

// ---------------------------------------------------------------------------
// Negotiation signals
// ---------------------------------------------------------------------------

/// Handshake payload produced by a media transport during connection setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NegotiationSignal {
    /// Session description offered by the initiator.
    Offer { sdp: String },
    /// Session description answered by the responder.
    Answer { sdp: String },
    /// Connectivity candidate.
    IceCandidate {
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u32>,
    },
}

// ---------------------------------------------------------------------------
// Relay → client
// ---------------------------------------------------------------------------

/// Messages delivered to a client by the signaling channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// First frame on every connection: relay credentials and our own id.
    #[serde(rename_all = "camelCase")]
    Init {
        #[serde(default)]
        turn_id: Option<String>,
        #[serde(default)]
        turn_pwd: Option<String>,
        my_socket_id: ParticipantId,
    },
    /// A new participant joined the room.
    Joined { id: ParticipantId },
    /// An existing participant (`from`) asks us to open a connection to it.
    Welcome {
        from: ParticipantId,
        to: ParticipantId,
    },
    /// Offer from an initiating peer.
    Call {
        from: ParticipantId,
        to: ParticipantId,
        signal: NegotiationSignal,
    },
    /// Answer from a responding peer.
    Answer {
        from: ParticipantId,
        to: ParticipantId,
        signal: NegotiationSignal,
    },
    /// A participant's socket went away.
    Disconnected { id: ParticipantId },
    /// Somebody else started transmitting.
    DisableMic,
    /// The transmitting participant stopped.
    EnableMic,
}

impl ServerMessage {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Joined { .. } => "joined",
            Self::Welcome { .. } => "welcome",
            Self::Call { .. } => "call",
            Self::Answer { .. } => "answer",
            Self::Disconnected { .. } => "disconnected",
            Self::DisableMic => "disableMic",
            Self::EnableMic => "enableMic",
        }
    }

    /// The remote participant this message is about, if any.
    pub fn peer(&self) -> Option<&ParticipantId> {
        match self {
            Self::Joined { id } | Self::Disconnected { id } => Some(id),
            Self::Welcome { from, .. } | Self::Call { from, .. } | Self::Answer { from, .. } => {
                Some(from)
            }
            Self::Init { .. } | Self::DisableMic | Self::EnableMic => None,
        }
    }

    /// Whether this is a mic arbitration message rather than mesh signaling.
    pub fn is_mic_control(&self) -> bool {
        matches!(self, Self::DisableMic | Self::EnableMic)
    }
}

// ---------------------------------------------------------------------------
// Client → relay
// ---------------------------------------------------------------------------

/// Messages a client sends on the signaling channel.
///
/// `from` is advisory: the relay stamps the sender's socket id on every
/// forwarded message, so a client that has not seen `init` yet may omit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Ask to become a room member.
    Join,
    Welcome {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        to: ParticipantId,
    },
    Call {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        to: ParticipantId,
        signal: NegotiationSignal,
    },
    Answer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        to: ParticipantId,
        signal: NegotiationSignal,
    },
    StartSpeaking,
    StopSpeaking,
}

impl ClientMessage {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Welcome { .. } => "welcome",
            Self::Call { .. } => "call",
            Self::Answer { .. } => "answer",
            Self::StartSpeaking => "startSpeaking",
            Self::StopSpeaking => "stopSpeaking",
        }
    }
}

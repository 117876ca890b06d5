//! Push-to-talk peer session coordinator.
//!
//! Keeps a full mesh of point-to-point audio connections between the
//! participants of one room, relays the handshake messages that set them
//! up through a shared signaling channel, and arbitrates who may speak.
//!
//! The media stack is supplied by the caller through three capabilities:
//! [`MediaSource`] for microphone capture, [`TransportFactory`] for peer
//! transports and [`AudioOutput`] for playback.

pub mod arbitration;
pub mod channel;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod event;
pub mod ice;
pub mod media;
pub mod outbox;
pub mod output;
pub mod registry;
pub mod router;
pub mod session;
pub mod transport;
pub mod visibility;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::SessionConfig;
pub use connection::{Connection, ConnectionError, ConnectionState, Role, TrackSwap};
pub use coordinator::{start, Coordinator, RunningSession, SessionHandle};
pub use event::{CapturePurpose, LocalCommand, RoomEvent, SessionEvent};
pub use ice::{build_ice_config, IceConfig, IceServer, IceServerUrls, RelayCredentials};
pub use media::{AudioTrack, CaptureSwap, LocalMedia, MediaSource, TrackHandle};
pub use outbox::Outbox;
pub use output::{AudioOutput, NullOutput};
pub use registry::{PeerEntry, PeerRegistry};
pub use router::{DropReason, RouteOutcome, SignalingRouter, TransportOutcome};
pub use session::LocalSession;
pub use transport::{
    ConnectionId, PeerTransport, RemoteStream, TransportEvent, TransportEventSink,
    TransportFactory, TransportOptions,
};
pub use visibility::{Visibility, VisibilityTracker};

//! Remote audio playback seam.

use tracing::debug;
use walkie_common::ParticipantId;

use crate::transport::RemoteStream;

/// Plays remote participants' audio, keyed by participant id.
pub trait AudioOutput: Send {
    fn attach(&mut self, peer: &ParticipantId, stream: &RemoteStream);
    fn detach(&mut self, peer: &ParticipantId);
    fn set_muted(&mut self, muted: bool);
}

/// Output that plays nothing. For headless clients and bots.
#[derive(Debug, Default)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn attach(&mut self, peer: &ParticipantId, stream: &RemoteStream) {
        debug!(peer = %peer, stream = %stream.id, "remote stream ignored");
    }

    fn detach(&mut self, _peer: &ParticipantId) {}

    fn set_muted(&mut self, _muted: bool) {}
}

//! Best-effort "one speaker at a time" lock.
//!
//! Pressing talk broadcasts `startSpeaking`; the relay tells everyone else
//! `disableMic`. Releasing broadcasts `stopSpeaking`, answered by
//! `enableMic`. Nothing enforces the lock: two participants pressing at
//! the same instant may both transmit.

use tracing::{debug, info};
use walkie_common::{ClientMessage, ServerMessage};

use crate::media::LocalMedia;
use crate::outbox::Outbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Started,
    Stopped,
    /// Another participant holds the mic.
    Blocked,
    /// No capture track is held.
    NoCapture,
    /// Already in the requested state.
    Idle,
}

pub fn start_speaking(media: &mut LocalMedia, outbox: &Outbox) -> SpeakOutcome {
    if !media.has_track() {
        return SpeakOutcome::NoCapture;
    }
    if media.is_globally_muted() {
        debug!("start speaking blocked, mic locked");
        return SpeakOutcome::Blocked;
    }
    if media.is_transmitting() {
        return SpeakOutcome::Idle;
    }
    media.set_transmitting(true);
    outbox.send(ClientMessage::StartSpeaking);
    info!("started speaking");
    SpeakOutcome::Started
}

/// Stop transmitting. Sends `stopSpeaking` only if we were transmitting,
/// so a blocked press never unlocks the other clients.
pub fn stop_speaking(media: &mut LocalMedia, outbox: &Outbox) -> SpeakOutcome {
    if !media.is_transmitting() {
        return SpeakOutcome::Idle;
    }
    media.set_transmitting(false);
    outbox.send(ClientMessage::StopSpeaking);
    info!("stopped speaking");
    SpeakOutcome::Stopped
}

/// Apply `disableMic` / `enableMic`. Returns the new lock state, or `None`
/// for any other message.
pub fn apply_mic_control(media: &mut LocalMedia, msg: &ServerMessage) -> Option<bool> {
    let locked = match msg {
        ServerMessage::DisableMic => true,
        ServerMessage::EnableMic => false,
        _ => return None,
    };
    media.set_globally_muted(locked);
    debug!(locked, "mic lock updated");
    Some(locked)
}

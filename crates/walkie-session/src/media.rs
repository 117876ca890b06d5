//! Local microphone capture: one held track, enabled only while the
//! local user is transmitting.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use walkie_common::MediaError;

/// A live capture track handed out by the platform.
pub trait AudioTrack: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;
    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;
    /// Release the underlying device. A stopped track never produces audio again.
    fn stop(&self);
}

pub type TrackHandle = Arc<dyn AudioTrack>;

/// Platform capture capability.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire_audio(&self) -> Result<TrackHandle, MediaError>;
}

/// Result of replacing the held track with a freshly captured one.
#[derive(Debug, Clone)]
pub struct CaptureSwap {
    pub old: TrackHandle,
    pub new: TrackHandle,
    pub was_transmitting: bool,
}

// ---------------------------------------------------------------------------
// Local Media
// ---------------------------------------------------------------------------

/// The local microphone track and whether it is transmitting.
///
/// Enabling the track is refused while another participant holds the mic.
pub struct LocalMedia {
    source: Arc<dyn MediaSource>,
    track: Option<TrackHandle>,
    transmitting: bool,
    globally_muted: bool,
}

impl LocalMedia {
    pub fn new(source: Arc<dyn MediaSource>) -> Self {
        Self {
            source,
            track: None,
            transmitting: false,
            globally_muted: false,
        }
    }

    /// Capture source, shared with spawned acquisition tasks.
    pub fn source(&self) -> Arc<dyn MediaSource> {
        Arc::clone(&self.source)
    }

    /// Request a capture track and hold it, disabled.
    pub async fn acquire(&mut self) -> Result<TrackHandle, MediaError> {
        let track = self.source.acquire_audio().await?;
        Ok(self.install_acquired(track))
    }

    /// Hold a track obtained by an earlier [`MediaSource::acquire_audio`].
    ///
    /// Any previously held track is stopped.
    pub fn install_acquired(&mut self, track: TrackHandle) -> TrackHandle {
        track.set_enabled(false);
        if let Some(old) = self.track.replace(Arc::clone(&track)) {
            old.set_enabled(false);
            old.stop();
        }
        self.transmitting = false;
        info!(track = track.id(), "microphone captured");
        track
    }

    /// Enable or disable the held track.
    ///
    /// Returns `false` when nothing changed: no track is held, or enabling
    /// was refused because another participant holds the mic.
    pub fn set_transmitting(&mut self, on: bool) -> bool {
        let Some(track) = &self.track else {
            return false;
        };
        if on && self.globally_muted {
            debug!("transmit refused: mic locked by another participant");
            return false;
        }
        track.set_enabled(on);
        self.transmitting = on;
        true
    }

    /// Acquire a fresh track and install it in place of the held one.
    ///
    /// Returns `Ok(None)` if the held track was released while capturing.
    pub async fn refresh_capture(&mut self) -> Result<Option<CaptureSwap>, MediaError> {
        let new = self.source.acquire_audio().await?;
        Ok(self.install_refreshed(new))
    }

    /// Install a refreshed track, disabled, returning what was swapped.
    ///
    /// The caller is expected to hot-swap every live connection from `old`
    /// to `new`. Transmission never resumes on its own after a refresh.
    pub fn install_refreshed(&mut self, new: TrackHandle) -> Option<CaptureSwap> {
        new.set_enabled(false);
        let Some(old) = self.track.take() else {
            new.stop();
            debug!(track = new.id(), "refresh completed after release, discarding");
            return None;
        };
        self.track = Some(Arc::clone(&new));
        old.set_enabled(false);
        let was_transmitting = std::mem::replace(&mut self.transmitting, false);
        info!(old = old.id(), new = new.id(), "microphone refreshed");
        Some(CaptureSwap {
            old,
            new,
            was_transmitting,
        })
    }

    /// Disable and stop the held track.
    pub fn release(&mut self) {
        if let Some(track) = self.track.take() {
            track.set_enabled(false);
            track.stop();
            info!(track = track.id(), "microphone released");
        }
        self.transmitting = false;
        self.globally_muted = false;
    }

    pub fn set_globally_muted(&mut self, muted: bool) {
        self.globally_muted = muted;
    }

    pub fn track(&self) -> Option<&TrackHandle> {
        self.track.as_ref()
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    pub fn is_globally_muted(&self) -> bool {
        self.globally_muted
    }
}

impl fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMedia")
            .field("track", &self.track)
            .field("transmitting", &self.transmitting)
            .field("globally_muted", &self.globally_muted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeSource;

    fn media() -> (LocalMedia, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::default());
        (LocalMedia::new(source.clone()), source)
    }

    #[tokio::test]
    async fn acquired_track_starts_disabled() {
        let (mut media, _) = media();
        let track = media.acquire().await.unwrap();
        assert!(!track.is_enabled());
        assert!(!media.is_transmitting());
        assert_eq!(media.track().unwrap().id(), track.id());
    }

    #[tokio::test]
    async fn acquire_failure_is_surfaced() {
        let (mut media, source) = media();
        source.fail_next("permission denied");
        let err = media.acquire().await.unwrap_err();
        assert_eq!(err, MediaError::Unavailable("permission denied".into()));
        assert!(!media.has_track());
    }

    #[tokio::test]
    async fn transmitting_toggles_track() {
        let (mut media, _) = media();
        let track = media.acquire().await.unwrap();

        assert!(media.set_transmitting(true));
        assert!(track.is_enabled());
        assert!(media.is_transmitting());

        assert!(media.set_transmitting(false));
        assert!(!track.is_enabled());
    }

    #[test]
    fn transmitting_without_track_does_nothing() {
        let (mut media, _) = media();
        assert!(!media.set_transmitting(true));
        assert!(!media.is_transmitting());
    }

    #[tokio::test]
    async fn globally_muted_blocks_enable_but_not_disable() {
        let (mut media, _) = media();
        let track = media.acquire().await.unwrap();
        media.set_transmitting(true);

        media.set_globally_muted(true);
        assert!(media.set_transmitting(false));
        assert!(!media.set_transmitting(true));
        assert!(!track.is_enabled());
    }

    #[tokio::test]
    async fn refresh_installs_new_track_disabled() {
        let (mut media, _) = media();
        let old = media.acquire().await.unwrap();
        media.set_transmitting(true);

        let swap = media.refresh_capture().await.unwrap().unwrap();
        assert_eq!(swap.old.id(), old.id());
        assert!(swap.was_transmitting);
        assert!(!swap.old.is_enabled());
        assert!(!swap.new.is_enabled());
        assert!(!media.is_transmitting());
        assert_eq!(media.track().unwrap().id(), swap.new.id());
    }

    #[tokio::test]
    async fn refresh_after_release_stops_new_track() {
        let (mut media, source) = media();
        media.acquire().await.unwrap();
        media.release();

        let late = source.acquire_audio().await.unwrap();
        assert!(media.install_refreshed(late).is_none());
        assert!(!media.has_track());
        assert!(source.track(1).unwrap().is_stopped());
    }

    #[tokio::test]
    async fn release_stops_track_and_clears_flags() {
        let (mut media, source) = media();
        media.acquire().await.unwrap();
        media.set_transmitting(true);
        media.set_globally_muted(true);

        media.release();
        assert!(!media.has_track());
        assert!(!media.is_transmitting());
        assert!(!media.is_globally_muted());
        let track = source.track(0).unwrap();
        assert!(track.is_stopped());
        assert!(!track.is_enabled());
    }
}

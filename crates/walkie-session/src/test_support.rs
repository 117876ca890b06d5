//! In-memory fakes for the platform capabilities.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use walkie_common::{MediaError, NegotiationSignal, ParticipantId, TransportError};

use crate::media::{AudioTrack, MediaSource, TrackHandle};
use crate::output::AudioOutput;
use crate::transport::{
    PeerTransport, RemoteStream, TransportEventSink, TransportFactory, TransportOptions,
};

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FakeTrack {
    id: String,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl FakeTrack {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl AudioTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Hands out `mic-1`, `mic-2`, ... and remembers every track.
#[derive(Debug, Default)]
pub struct FakeSource {
    tracks: Mutex<Vec<Arc<FakeTrack>>>,
    fail_next: Mutex<Option<String>>,
}

impl FakeSource {
    pub fn fail_next(&self, reason: &str) {
        *self.fail_next.lock().unwrap() = Some(reason.to_string());
    }

    pub fn track(&self, index: usize) -> Option<Arc<FakeTrack>> {
        self.tracks.lock().unwrap().get(index).cloned()
    }

    pub fn acquired(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn acquire_audio(&self) -> Result<TrackHandle, MediaError> {
        if let Some(reason) = self.fail_next.lock().unwrap().take() {
            return Err(MediaError::Unavailable(reason));
        }
        let mut tracks = self.tracks.lock().unwrap();
        let track = FakeTrack::new(&format!("mic-{}", tracks.len() + 1));
        tracks.push(Arc::clone(&track));
        Ok(track)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SpyState {
    received: Vec<NegotiationSignal>,
    swaps: Vec<(String, String)>,
    close_count: usize,
    fail_signals: bool,
}

/// Observes one fake transport from the outside.
#[derive(Debug, Clone, Default)]
pub struct TransportSpy {
    state: Arc<Mutex<SpyState>>,
}

impl TransportSpy {
    pub fn transport(&self) -> Box<dyn PeerTransport> {
        Box::new(FakeTransport {
            state: Arc::clone(&self.state),
        })
    }

    pub fn received(&self) -> Vec<NegotiationSignal> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn swaps(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().swaps.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().close_count
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    pub fn fail_signals(&self) {
        self.state.lock().unwrap().fail_signals = true;
    }
}

struct FakeTransport {
    state: Arc<Mutex<SpyState>>,
}

impl PeerTransport for FakeTransport {
    fn signal(&mut self, signal: NegotiationSignal) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_signals {
            return Err(TransportError::NegotiationFailed("rejected".into()));
        }
        state.received.push(signal);
        Ok(())
    }

    fn replace_track(&mut self, old: &TrackHandle, new: &TrackHandle) -> Result<(), TransportError> {
        self.state
            .lock()
            .unwrap()
            .swaps
            .push((old.id().to_string(), new.id().to_string()));
        Ok(())
    }

    fn close(&mut self) {
        self.state.lock().unwrap().close_count += 1;
    }
}

/// A transport the factory created, with the handles to drive it.
#[derive(Debug, Clone)]
pub struct CreatedTransport {
    pub options: TransportOptions,
    pub sink: TransportEventSink,
    pub spy: TransportSpy,
}

impl CreatedTransport {
    pub fn offer(&self) {
        self.sink.signal(NegotiationSignal::Offer {
            sdp: format!("offer-{}", self.sink.connection().get()),
        });
    }

    pub fn answer(&self) {
        self.sink.signal(NegotiationSignal::Answer {
            sdp: format!("answer-{}", self.sink.connection().get()),
        });
    }

    pub fn open(&self) {
        self.sink.stream(RemoteStream::new(
            format!("stream-{}", self.sink.peer()),
            Arc::new(()),
        ));
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    created: Arc<Mutex<Vec<CreatedTransport>>>,
    refuse: Arc<AtomicBool>,
}

impl FakeFactory {
    pub fn created(&self) -> Vec<CreatedTransport> {
        self.created.lock().unwrap().clone()
    }

    /// Most recent transport created for `peer`.
    pub fn last_for(&self, peer: &str) -> Option<CreatedTransport> {
        let peer = ParticipantId::from(peer);
        self.created
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.sink.peer() == &peer)
            .cloned()
    }

    pub fn refuse_creation(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }
}

impl TransportFactory for FakeFactory {
    fn create(
        &mut self,
        options: TransportOptions,
        sink: TransportEventSink,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::NegotiationFailed("no transport".into()));
        }
        let spy = TransportSpy::default();
        let transport = spy.transport();
        self.created.lock().unwrap().push(CreatedTransport {
            options,
            sink,
            spy,
        });
        Ok(transport)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct OutputLog {
    pub attached: Vec<ParticipantId>,
    pub detached: Vec<ParticipantId>,
    pub muted: bool,
}

#[derive(Debug, Clone)]
pub struct RecordingOutput {
    log: Arc<Mutex<OutputLog>>,
}

impl Default for RecordingOutput {
    fn default() -> Self {
        Self {
            log: Arc::new(Mutex::new(OutputLog {
                attached: Vec::new(),
                detached: Vec::new(),
                muted: false,
            })),
        }
    }
}

impl RecordingOutput {
    pub fn attached(&self) -> Vec<ParticipantId> {
        self.log.lock().unwrap().attached.clone()
    }

    pub fn detached(&self) -> Vec<ParticipantId> {
        self.log.lock().unwrap().detached.clone()
    }

    pub fn is_muted(&self) -> bool {
        self.log.lock().unwrap().muted
    }
}

impl AudioOutput for RecordingOutput {
    fn attach(&mut self, peer: &ParticipantId, _stream: &RemoteStream) {
        self.log.lock().unwrap().attached.push(peer.clone());
    }

    fn detach(&mut self, peer: &ParticipantId) {
        self.log.lock().unwrap().detached.push(peer.clone());
    }

    fn set_muted(&mut self, muted: bool) {
        self.log.lock().unwrap().muted = muted;
    }
}

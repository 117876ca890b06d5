//! Handle for driving a running coordinator from the UI side.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use walkie_common::WalkieError;

use super::Coordinator;
use crate::channel;
use crate::config::SessionConfig;
use crate::event::{EventSender, LocalCommand, RoomEvent, SessionEvent};
use crate::media::MediaSource;
use crate::output::AudioOutput;
use crate::transport::TransportFactory;
use crate::visibility::Visibility;

/// Cloneable sender of local commands. Every method returns `false` once
/// the coordinator has stopped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: EventSender,
}

impl SessionHandle {
    pub fn new(tx: EventSender) -> Self {
        Self { tx }
    }

    pub fn join(&self) -> bool {
        self.command(LocalCommand::Join)
    }

    pub fn start_speaking(&self) -> bool {
        self.command(LocalCommand::StartSpeaking)
    }

    pub fn stop_speaking(&self) -> bool {
        self.command(LocalCommand::StopSpeaking)
    }

    pub fn leave(&self) -> bool {
        self.command(LocalCommand::Leave)
    }

    pub fn prune_closed(&self) -> bool {
        self.command(LocalCommand::PruneClosed)
    }

    pub fn set_visibility(&self, visibility: Visibility) -> bool {
        self.tx.send(SessionEvent::Visibility(visibility)).is_ok()
    }

    fn command(&self, command: LocalCommand) -> bool {
        self.tx.send(SessionEvent::Command(command)).is_ok()
    }
}

/// A coordinator running on its own task.
pub struct RunningSession {
    pub handle: SessionHandle,
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
    pub task: JoinHandle<()>,
}

/// Connect to the signaling channel and spawn a coordinator.
pub async fn start(
    config: &SessionConfig,
    media: Arc<dyn MediaSource>,
    factory: Box<dyn TransportFactory>,
    output: Box<dyn AudioOutput>,
) -> Result<RunningSession, WalkieError> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let outbox = channel::connect(config, events_tx.clone()).await?;

    let (coordinator, events) =
        Coordinator::new(config, media, factory, output, outbox, events_tx.clone());
    let handle = SessionHandle::new(events_tx);
    if config.auto_join {
        info!("auto-joining room");
        handle.join();
    }

    let task = tokio::spawn(coordinator.run(events_rx));
    Ok(RunningSession {
        handle,
        events,
        task,
    })
}

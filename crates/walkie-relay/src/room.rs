//! Room store: every connected socket, which of them joined, and who is
//! currently transmitting.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use walkie_common::ParticipantId;

struct Member {
    tx: mpsc::Sender<String>,
    joined: bool,
}

#[derive(Default)]
struct Room {
    members: HashMap<ParticipantId, Member>,
    speaker: Option<ParticipantId>,
}

/// What is left to announce when a socket goes away.
pub struct Departure {
    pub others: Vec<mpsc::Sender<String>>,
    pub was_speaker: bool,
}

/// Thread-safe room store.
#[derive(Clone, Default)]
pub struct RoomStore {
    room: Arc<RwLock<Room>>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected socket. It is not a room member until it joins.
    pub async fn register(&self, id: ParticipantId, tx: mpsc::Sender<String>) {
        self.room
            .write()
            .await
            .members
            .insert(id, Member { tx, joined: false });
    }

    /// Mark `id` as joined. Returns the senders of the members that joined
    /// before it; they are the ones to tell.
    pub async fn join(&self, id: &ParticipantId) -> Vec<mpsc::Sender<String>> {
        let mut room = self.room.write().await;
        match room.members.get_mut(id) {
            Some(member) => member.joined = true,
            None => return Vec::new(),
        }
        room.members
            .iter()
            .filter(|(other, member)| *other != id && member.joined)
            .map(|(_, member)| member.tx.clone())
            .collect()
    }

    pub async fn sender(&self, id: &ParticipantId) -> Option<mpsc::Sender<String>> {
        self.room.read().await.members.get(id).map(|m| m.tx.clone())
    }

    /// Senders of every socket except `id`.
    pub async fn others(&self, id: &ParticipantId) -> Vec<mpsc::Sender<String>> {
        self.room
            .read()
            .await
            .members
            .iter()
            .filter(|(other, _)| *other != id)
            .map(|(_, member)| member.tx.clone())
            .collect()
    }

    /// Record that `id` started or stopped transmitting.
    pub async fn set_speaking(&self, id: &ParticipantId, speaking: bool) {
        let mut room = self.room.write().await;
        if speaking {
            room.speaker = Some(id.clone());
        } else if room.speaker.as_ref() == Some(id) {
            room.speaker = None;
        }
    }

    #[cfg(test)]
    pub async fn speaker(&self) -> Option<ParticipantId> {
        self.room.read().await.speaker.clone()
    }

    /// Remove a socket.
    pub async fn unregister(&self, id: &ParticipantId) -> Departure {
        let mut room = self.room.write().await;
        room.members.remove(id);
        let was_speaker = room.speaker.as_ref() == Some(id);
        if was_speaker {
            room.speaker = None;
        }
        Departure {
            others: room.members.values().map(|m| m.tx.clone()).collect(),
            was_speaker,
        }
    }

    pub async fn is_joined(&self, id: &ParticipantId) -> bool {
        self.room
            .read()
            .await
            .members
            .get(id)
            .is_some_and(|m| m.joined)
    }

    /// Number of connected sockets.
    pub async fn count(&self) -> usize {
        self.room.read().await.members.len()
    }
}

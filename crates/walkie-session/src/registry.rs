//! Peer registry: at most one entry per remote participant.

use std::collections::HashMap;

use tracing::debug;
use walkie_common::ParticipantId;

use crate::connection::Connection;
use crate::transport::ConnectionId;

/// A known remote participant and its connection, if one was negotiated.
#[derive(Debug)]
pub struct PeerEntry {
    pub id: ParticipantId,
    pub connection: Option<Connection>,
}

impl PeerEntry {
    fn new(id: ParticipantId) -> Self {
        Self {
            id,
            connection: None,
        }
    }
}

/// Every remote participant currently in the room, keyed by id.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<ParticipantId, PeerEntry>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a participant with no connection yet.
    ///
    /// A repeat announcement replaces the entry, closing any connection it
    /// held. Returns `true` if the participant was not known before.
    pub fn announce(&mut self, id: ParticipantId) -> bool {
        let previous = self.peers.insert(id.clone(), PeerEntry::new(id.clone()));
        if previous.is_some() {
            debug!(peer = %id, "peer re-announced, entry replaced");
        }
        previous.is_none()
    }

    /// Attach a connection, replacing (and closing) whatever was there.
    ///
    /// Returns the id of the replaced connection.
    pub fn attach(&mut self, connection: Connection) -> Option<ConnectionId> {
        let id = connection.peer().clone();
        let entry = self
            .peers
            .entry(id.clone())
            .or_insert_with(|| PeerEntry::new(id));
        let mut replaced = entry.connection.replace(connection)?;
        replaced.close();
        debug!(peer = %entry.id, replaced = %replaced.id(), "connection replaced");
        Some(replaced.id())
    }

    /// Remove a participant, closing its connection first.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<PeerEntry> {
        let mut entry = self.peers.remove(id)?;
        if let Some(conn) = entry.connection.as_mut() {
            conn.close();
        }
        Some(entry)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&PeerEntry> {
        self.peers.get(id)
    }

    pub fn connection(&self, id: &ParticipantId) -> Option<&Connection> {
        self.peers.get(id)?.connection.as_ref()
    }

    pub fn connection_mut(&mut self, id: &ParticipantId) -> Option<&mut Connection> {
        self.peers.get_mut(id)?.connection.as_mut()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.peers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Known participant ids, sorted.
    pub fn ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn connections_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.peers
            .values_mut()
            .filter_map(|entry| entry.connection.as_mut())
    }

    /// Remove entries whose connection has closed. Returns their ids.
    pub fn prune_closed(&mut self) -> Vec<ParticipantId> {
        let closed: Vec<ParticipantId> = self
            .peers
            .values()
            .filter(|e| e.connection.as_ref().is_some_and(Connection::is_closed))
            .map(|e| e.id.clone())
            .collect();
        for id in &closed {
            self.peers.remove(id);
        }
        closed
    }

    /// Close every connection and forget every participant.
    pub fn clear(&mut self) {
        for conn in self.connections_mut() {
            conn.close();
        }
        self.peers.clear();
    }
}

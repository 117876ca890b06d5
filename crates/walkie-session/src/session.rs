//! Local session state for one membership of the room.

use tracing::info;
use walkie_common::ParticipantId;

use crate::ice::{build_ice_config, IceConfig, IceServerUrls, RelayCredentials};
use crate::media::LocalMedia;

#[derive(Debug)]
pub struct LocalSession {
    self_id: Option<ParticipantId>,
    credentials: Option<RelayCredentials>,
    joined: bool,
    media: LocalMedia,
}

impl LocalSession {
    pub fn new(media: LocalMedia) -> Self {
        Self {
            self_id: None,
            credentials: None,
            joined: false,
            media,
        }
    }

    /// Store what the channel sent in `init`.
    pub fn apply_init(
        &mut self,
        turn_id: Option<&str>,
        turn_pwd: Option<&str>,
        self_id: ParticipantId,
    ) {
        self.credentials = RelayCredentials::from_init(turn_id, turn_pwd);
        info!(
            self_id = %self_id,
            relay = self.credentials.is_some(),
            "session initialised"
        );
        self.self_id = Some(self_id);
    }

    pub fn self_id(&self) -> Option<&ParticipantId> {
        self.self_id.as_ref()
    }

    pub fn credentials(&self) -> Option<&RelayCredentials> {
        self.credentials.as_ref()
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn set_joined(&mut self, joined: bool) {
        self.joined = joined;
    }

    pub fn media(&self) -> &LocalMedia {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut LocalMedia {
        &mut self.media
    }

    /// Transport configuration for connections created now.
    pub fn ice_config(&self, servers: &IceServerUrls) -> Option<IceConfig> {
        build_ice_config(self.credentials.as_ref(), servers)
    }

    /// Whether `id` is us. Always `false` before `init`.
    pub fn is_self(&self, id: &ParticipantId) -> bool {
        self.self_id.as_ref() == Some(id)
    }

    /// Whether a message sent `to` this id is meant for us. Before `init`
    /// our id is unknown and everything is accepted.
    pub fn is_addressed_to_us(&self, to: &ParticipantId) -> bool {
        match &self.self_id {
            Some(me) => me == to,
            None => true,
        }
    }

    /// Forget everything and release the microphone.
    pub fn clear(&mut self) {
        self.media.release();
        self.self_id = None;
        self.credentials = None;
        self.joined = false;
    }
}

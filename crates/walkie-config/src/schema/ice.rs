//! Traversal server lists handed to every peer transport.

use serde::{Deserialize, Serialize};

/// STUN/TURN server URLs. TURN entries receive the relay credentials
/// issued by the channel; STUN entries never carry credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IceServersConfig {
    pub stun_urls: Vec<String>,
    pub turn_urls: Vec<String>,
}

impl Default for IceServersConfig {
    fn default() -> Self {
        Self {
            stun_urls: vec!["stun:relay.metered.ca:80".into()],
            turn_urls: vec![
                "turn:relay.metered.ca:80".into(),
                "turn:relay.metered.ca:443".into(),
                "turn:relay.metered.ca:443?transport=tcp".into(),
            ],
        }
    }
}

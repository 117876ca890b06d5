use serde::{Deserialize, Serialize};

/// Where the signaling channel lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    /// WebSocket URL of the relay.
    pub url: String,
    /// Connect timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080".into(),
            connect_timeout_secs: 15,
        }
    }
}

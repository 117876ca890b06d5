use serde::{Deserialize, Serialize};

/// Configuration for the reference relay server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Port to listen on.
    pub port: u16,
    /// TURN username handed to every client in `init`. Empty disables TURN.
    pub turn_id: String,
    /// TURN credential handed to every client in `init`.
    pub turn_pwd: String,
    /// Seconds a fresh socket has to finish the WebSocket handshake (valid range: 1-300).
    pub hello_timeout_secs: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            turn_id: String::new(),
            turn_pwd: String::new(),
            hello_timeout_secs: 10,
        }
    }
}

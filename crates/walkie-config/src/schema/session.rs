use serde::{Deserialize, Serialize};

/// Coordinator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Join the room as soon as the channel is up.
    pub auto_join: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_join: false,
        }
    }
}

//! Configuration schema types for Walkie.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod ice;
mod relay;
mod session;
mod signaling;
mod system;

pub use ice::*;
pub use relay::*;
pub use session::*;
pub use signaling::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration shared by the session coordinator and the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct WalkieConfig {
    pub signaling: SignalingConfig,
    pub ice: IceServersConfig,
    pub session: SessionConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

pub mod errors;
pub mod id;
pub mod protocol;

pub use errors::{ConfigError, MediaError, TransportError, WalkieError};
pub use id::{new_id, ParticipantId};
pub use protocol::{ClientMessage, NegotiationSignal, ServerMessage};

pub type Result<T> = std::result::Result<T, WalkieError>;

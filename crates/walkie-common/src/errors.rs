use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures of the platform capture capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    /// No microphone, or the platform denied access. Fatal to joining.
    #[error("media unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by a peer media transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    #[error("transport closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum WalkieError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("signaling error: {0}")]
    Signaling(String),

    #[error("{0}")]
    Other(String),
}

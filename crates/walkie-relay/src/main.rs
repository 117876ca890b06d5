//! walkie-relay: signaling relay for walkie push-to-talk rooms.
//!
//! Accepts WebSocket connections, assigns each one a participant id, and
//! forwards mesh negotiation messages between them. The relay never
//! inspects negotiation payloads and carries no audio.

mod connection;
mod room;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use walkie_config::WalkieConfig;

use crate::connection::{handle_connection, TurnCredentials};
use crate::room::RoomStore;

#[derive(Parser)]
#[command(name = "walkie-relay", about = "Signaling relay for walkie push-to-talk rooms")]
struct Args {
    /// Port to listen on (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file to read instead of the platform default.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TURN username handed to clients.
    #[arg(long)]
    turn_id: Option<String>,

    /// TURN credential handed to clients.
    #[arg(long)]
    turn_pwd: Option<String>,

    /// Log level: trace, debug, info, warn or error.
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut WalkieConfig) {
        if let Some(port) = self.port {
            config.relay.port = port;
        }
        if let Some(id) = &self.turn_id {
            config.relay.turn_id = id.clone();
        }
        if let Some(pwd) = &self.turn_pwd {
            config.relay.turn_pwd = pwd.clone();
        }
    }

    fn log_directive(&self, config: &WalkieConfig) -> String {
        match &self.log_level {
            Some(level) => format!("walkie={level}"),
            None => config.logging.directive(),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => walkie_config::toml_loader::load_from_path(path),
        None => walkie_config::load_config(),
    };
    let (mut config, load_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (WalkieConfig::default(), Some(e)),
    };
    args.apply(&mut config);

    let directive = args.log_directive(&config);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| directive.into()),
        )
        .init();

    if let Some(e) = load_error {
        if args.config.is_some() {
            tracing::error!(error = %e, "Failed to load config");
            std::process::exit(1);
        }
        tracing::warn!(error = %e, "Failed to load config, using defaults");
    }

    let store = RoomStore::new();
    let turn = TurnCredentials::new(&config.relay.turn_id, &config.relay.turn_pwd);
    let handshake_timeout = Duration::from_secs(u64::from(config.relay.hello_timeout_secs));

    let addr = format!("0.0.0.0:{}", config.relay.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!(relay = turn.id.is_some(), "walkie-relay listening on {}", addr);

    // Accept loop.
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let store = store.clone();
                let turn = turn.clone();
                tokio::spawn(async move {
                    match tokio::time::timeout(handshake_timeout, accept_async(stream)).await {
                        Ok(Ok(ws)) => handle_connection(ws, addr, store, turn).await,
                        Ok(Err(e)) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                        Err(_) => {
                            tracing::warn!(peer = %addr, "WS handshake timed out");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "walkie-relay",
            "--port",
            "9000",
            "--turn-id",
            "user",
            "--turn-pwd",
            "secret",
        ]);
        let mut config = WalkieConfig::default();
        args.apply(&mut config);
        assert_eq!(config.relay.port, 9000);
        assert_eq!(config.relay.turn_id, "user");
        assert_eq!(config.relay.turn_pwd, "secret");
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Args::parse_from(["walkie-relay"]);
        let mut config = WalkieConfig::default();
        args.apply(&mut config);
        assert_eq!(config.relay.port, 8080);
        assert_eq!(args.log_directive(&config), "walkie=info");
    }

    #[test]
    fn log_level_flag_wins() {
        let args = Args::parse_from(["walkie-relay", "--log-level", "debug"]);
        assert_eq!(args.log_directive(&WalkieConfig::default()), "walkie=debug");
    }
}

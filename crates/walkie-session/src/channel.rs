//! WebSocket client for the signaling channel.
//!
//! One task writes queued [`ClientMessage`]s; another parses inbound frames
//! into [`SessionEvent::Inbound`] and posts [`SessionEvent::ChannelClosed`]
//! when the socket ends. There is no reconnect: a lost channel ends the
//! session.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tracing::{debug, error, info, warn};
use walkie_common::{ClientMessage, ServerMessage, WalkieError};

use crate::config::SessionConfig;
use crate::event::{EventSender, SessionEvent};
use crate::outbox::Outbox;

/// Connect to the relay and start the reader and writer tasks.
pub async fn connect(config: &SessionConfig, events: EventSender) -> Result<Outbox, WalkieError> {
    info!(url = %config.signaling_url, "connecting to signaling channel");

    let ws_stream = match tokio::time::timeout(
        config.connect_timeout,
        tokio_tungstenite::connect_async(config.signaling_url.as_str()),
    )
    .await
    {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            error!(error = %e, "failed to connect to signaling channel");
            return Err(WalkieError::Signaling(format!("connection failed: {e}")));
        }
        Err(_elapsed) => {
            let secs = config.connect_timeout.as_secs();
            error!("signaling connection timed out after {secs}s");
            return Err(WalkieError::Signaling(format!(
                "connection timed out after {secs}s"
            )));
        }
    };

    let (ws_write, ws_read) = ws_stream.split();
    let (outbox, outbound) = Outbox::channel();
    tokio::spawn(write_loop(ws_write, outbound));
    tokio::spawn(read_loop(ws_read, events));

    info!("signaling channel connected");
    Ok(outbox)
}

/// Parse one text frame from the relay.
pub fn parse_frame(text: &str) -> Result<ServerMessage, WalkieError> {
    Ok(serde_json::from_str(text)?)
}

async fn write_loop<S>(mut sink: S, mut outbound: mpsc::UnboundedReceiver<ClientMessage>)
where
    S: Sink<WsMessage> + Unpin,
{
    while let Some(msg) = outbound.recv().await {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                warn!(message = msg.name(), error = %e, "failed to encode message");
                continue;
            }
        };
        if sink.send(WsMessage::Text(json.into())).await.is_err() {
            debug!("signaling socket closed while writing");
            return;
        }
    }
    let _ = sink.send(WsMessage::Close(None)).await;
}

async fn read_loop<S>(mut stream: S, events: EventSender)
where
    S: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match parse_frame(&text) {
                Ok(msg) => {
                    if events.send(SessionEvent::Inbound(msg)).is_err() {
                        return;
                    }
                }
                Err(e) => debug!(error = %e, text = %text, "unrecognized signaling frame"),
            },
            Ok(WsMessage::Close(_)) => {
                info!("signaling channel closed by relay");
                break;
            }
            Err(e) => {
                warn!(error = %e, "signaling channel error");
                break;
            }
            _ => {}
        }
    }
    let _ = events.send(SessionEvent::ChannelClosed);
}

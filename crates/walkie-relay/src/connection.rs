//! Per-connection handler: assign an id, send `init`, then route messages.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use walkie_common::{ClientMessage, ParticipantId, ServerMessage};

use crate::room::RoomStore;

/// Relay credentials handed to every client in `init`.
#[derive(Debug, Clone, Default)]
pub struct TurnCredentials {
    pub id: Option<String>,
    pub pwd: Option<String>,
}

impl TurnCredentials {
    pub fn new(id: &str, pwd: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            id: non_empty(id),
            pwd: non_empty(pwd),
        }
    }
}

/// Where a client message goes.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    /// Sender becomes a member; joined members hear about it.
    Join,
    /// Forward to one socket.
    Direct {
        to: ParticipantId,
        msg: ServerMessage,
    },
    /// Tell every other socket.
    Broadcast(ServerMessage),
}

/// Decide where a message goes, stamping the authoritative sender id.
pub fn route(sender: &ParticipantId, msg: ClientMessage) -> Route {
    let from = sender.clone();
    match msg {
        ClientMessage::Join => Route::Join,
        ClientMessage::Welcome { to, .. } => Route::Direct {
            to: to.clone(),
            msg: ServerMessage::Welcome { from, to },
        },
        ClientMessage::Call { to, signal, .. } => Route::Direct {
            to: to.clone(),
            msg: ServerMessage::Call { from, to, signal },
        },
        ClientMessage::Answer { to, signal, .. } => Route::Direct {
            to: to.clone(),
            msg: ServerMessage::Answer { from, to, signal },
        },
        ClientMessage::StartSpeaking => Route::Broadcast(ServerMessage::DisableMic),
        ClientMessage::StopSpeaking => Route::Broadcast(ServerMessage::EnableMic),
    }
}

/// Apply one client message to the room.
pub async fn dispatch(store: &RoomStore, sender: &ParticipantId, msg: ClientMessage) {
    let name = msg.name();
    match route(sender, msg) {
        Route::Join => {
            if store.is_joined(sender).await {
                tracing::debug!(id = %sender, "Duplicate join ignored");
                return;
            }
            let members = store.join(sender).await;
            tracing::info!(id = %sender, existing = members.len(), "Client joined room");
            deliver(&members, &ServerMessage::Joined { id: sender.clone() });
        }
        Route::Direct { to, msg } => match store.sender(&to).await {
            Some(tx) => deliver(&[tx], &msg),
            None => tracing::debug!(from = %sender, to = %to, message = name, "Recipient gone"),
        },
        Route::Broadcast(msg) => {
            store
                .set_speaking(sender, matches!(msg, ServerMessage::DisableMic))
                .await;
            let others = store.others(sender).await;
            deliver(&others, &msg);
        }
    }
}

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    addr: SocketAddr,
    store: RoomStore,
    turn: TurnCredentials,
) {
    let (mut sink, mut stream) = ws.split();

    // 1. Register under a fresh id.
    let id = ParticipantId::new();
    let (tx, mut rx) = mpsc::channel::<String>(256);
    store.register(id.clone(), tx).await;
    let clients = store.count().await;
    tracing::info!(peer = %addr, id = %id, clients, "Client connected");

    // 2. Send init.
    let init = ServerMessage::Init {
        turn_id: turn.id,
        turn_pwd: turn.pwd,
        my_socket_id: id.clone(),
    };
    let delivered = match encode(&init) {
        Some(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        None => false,
    };

    // 3. Forwarding loop.
    if delivered {
        loop {
            tokio::select! {
                // Messages routed to this client → its WebSocket
                Some(msg) = rx.recv() => {
                    if sink.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }

                // Messages from this client → the room
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(msg) => dispatch(&store, &id, msg).await,
                                Err(e) => tracing::debug!(id = %id, error = %e, "Unrecognized client message"),
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            tracing::debug!(peer = %addr, error = %e, "WS error");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    // 4. Cleanup.
    tracing::info!(peer = %addr, id = %id, "Client disconnected");
    let departure = store.unregister(&id).await;
    deliver(&departure.others, &ServerMessage::Disconnected { id });
    if departure.was_speaker {
        deliver(&departure.others, &ServerMessage::EnableMic);
    }
}

fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(message = msg.name(), error = %e, "Failed to encode message");
            None
        }
    }
}

/// Queue a message for each target without waiting. A client whose queue is
/// full misses the message.
fn deliver(targets: &[mpsc::Sender<String>], msg: &ServerMessage) {
    let Some(json) = encode(msg) else {
        return;
    };
    for tx in targets {
        match tx.try_send(json.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(message = msg.name(), "Recipient queue full, message dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(message = msg.name(), "Recipient channel closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::connect_async;
    use walkie_common::NegotiationSignal;

    async fn member(store: &RoomStore, id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(16);
        store.register(id.into(), tx).await;
        rx
    }

    fn next(rx: &mut mpsc::Receiver<String>) -> Option<ServerMessage> {
        rx.try_recv()
            .ok()
            .map(|json| serde_json::from_str(&json).unwrap())
    }

    #[test]
    fn route_stamps_sender() {
        let route = route(
            &"real".into(),
            ClientMessage::Call {
                from: Some("forged".into()),
                to: "b".into(),
                signal: NegotiationSignal::Offer { sdp: "v=0".into() },
            },
        );
        assert_eq!(
            route,
            Route::Direct {
                to: "b".into(),
                msg: ServerMessage::Call {
                    from: "real".into(),
                    to: "b".into(),
                    signal: NegotiationSignal::Offer { sdp: "v=0".into() },
                },
            }
        );
    }

    #[test]
    fn speaking_becomes_mic_control() {
        assert_eq!(
            route(&"a".into(), ClientMessage::StartSpeaking),
            Route::Broadcast(ServerMessage::DisableMic)
        );
        assert_eq!(
            route(&"a".into(), ClientMessage::StopSpeaking),
            Route::Broadcast(ServerMessage::EnableMic)
        );
        assert_eq!(route(&"a".into(), ClientMessage::Join), Route::Join);
    }

    #[tokio::test]
    async fn join_announces_to_joined_members_only() {
        let store = RoomStore::new();
        let mut a = member(&store, "a").await;
        let mut idle = member(&store, "idle").await;
        let mut b = member(&store, "b").await;

        dispatch(&store, &"a".into(), ClientMessage::Join).await;
        dispatch(&store, &"b".into(), ClientMessage::Join).await;

        assert_eq!(next(&mut a), Some(ServerMessage::Joined { id: "b".into() }));
        assert_eq!(next(&mut idle), None);
        assert_eq!(next(&mut b), None);

        dispatch(&store, &"b".into(), ClientMessage::Join).await;
        assert_eq!(next(&mut a), None);
    }

    #[tokio::test]
    async fn welcome_is_forwarded_to_addressee() {
        let store = RoomStore::new();
        let mut a = member(&store, "a").await;
        let mut b = member(&store, "b").await;

        dispatch(
            &store,
            &"a".into(),
            ClientMessage::Welcome {
                from: None,
                to: "b".into(),
            },
        )
        .await;

        assert_eq!(
            next(&mut b),
            Some(ServerMessage::Welcome {
                from: "a".into(),
                to: "b".into()
            })
        );
        assert_eq!(next(&mut a), None);
    }

    #[tokio::test]
    async fn message_to_unknown_recipient_is_dropped() {
        let store = RoomStore::new();
        let mut a = member(&store, "a").await;
        dispatch(
            &store,
            &"a".into(),
            ClientMessage::Welcome {
                from: None,
                to: "gone".into(),
            },
        )
        .await;
        assert_eq!(next(&mut a), None);
    }

    #[tokio::test]
    async fn start_speaking_locks_everyone_else() {
        let store = RoomStore::new();
        let mut a = member(&store, "a").await;
        let mut b = member(&store, "b").await;
        let mut c = member(&store, "c").await;

        dispatch(&store, &"a".into(), ClientMessage::StartSpeaking).await;
        assert_eq!(next(&mut a), None);
        assert_eq!(next(&mut b), Some(ServerMessage::DisableMic));
        assert_eq!(next(&mut c), Some(ServerMessage::DisableMic));
        assert_eq!(store.speaker().await, Some("a".into()));

        dispatch(&store, &"a".into(), ClientMessage::StopSpeaking).await;
        assert_eq!(next(&mut b), Some(ServerMessage::EnableMic));
        assert_eq!(store.speaker().await, None);
    }

    #[tokio::test]
    async fn end_to_end_init_and_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = RoomStore::new();
        let server_store = store.clone();
        tokio::spawn(async move {
            loop {
                let (stream, peer) = listener.accept().await.unwrap();
                let store = server_store.clone();
                tokio::spawn(async move {
                    let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                    handle_connection(ws, peer, store, TurnCredentials::new("u", "p")).await;
                });
            }
        });

        let url = format!("ws://{addr}");
        let (mut a, _) = connect_async(url.as_str()).await.unwrap();
        let (mut b, _) = connect_async(url.as_str()).await.unwrap();

        async fn recv(
            ws: &mut tokio_tungstenite::WebSocketStream<
                tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
            >,
        ) -> ServerMessage {
            let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            serde_json::from_str(frame.to_text().unwrap()).unwrap()
        }

        let a_id = match recv(&mut a).await {
            ServerMessage::Init {
                turn_id,
                turn_pwd,
                my_socket_id,
            } => {
                assert_eq!(turn_id.as_deref(), Some("u"));
                assert_eq!(turn_pwd.as_deref(), Some("p"));
                my_socket_id
            }
            other => panic!("expected init, got {other:?}"),
        };
        assert!(matches!(recv(&mut b).await, ServerMessage::Init { .. }));

        a.send(Message::Text(r#"{"type":"join"}"#.into())).await.unwrap();
        a.send(Message::Text(r#"{"type":"startSpeaking"}"#.into()))
            .await
            .unwrap();
        assert_eq!(recv(&mut b).await, ServerMessage::DisableMic);

        a.close(None).await.unwrap();
        assert_eq!(recv(&mut b).await, ServerMessage::Disconnected { id: a_id });
        assert_eq!(recv(&mut b).await, ServerMessage::EnableMic);
    }

    #[test]
    fn connection_task_can_be_spawned() {
        fn assert_send<F, Fut>(_: F)
        where
            F: Fn(
                tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
                SocketAddr,
                RoomStore,
                TurnCredentials,
            ) -> Fut,
            Fut: std::future::Future<Output = ()> + Send,
        {
        }
        assert_send(handle_connection);
    }

    #[tokio::test]
    async fn full_recipient_queue_does_not_block() {
        let store = RoomStore::new();
        let (tx, mut slow) = mpsc::channel(1);
        store.register("slow".into(), tx).await;
        let mut b = member(&store, "b").await;

        tokio::time::timeout(Duration::from_secs(1), async {
            dispatch(&store, &"a".into(), ClientMessage::StartSpeaking).await;
            dispatch(&store, &"a".into(), ClientMessage::StopSpeaking).await;
        })
        .await
        .unwrap();

        assert_eq!(next(&mut slow), Some(ServerMessage::DisableMic));
        assert_eq!(next(&mut slow), None);
        assert_eq!(next(&mut b), Some(ServerMessage::DisableMic));
        assert_eq!(next(&mut b), Some(ServerMessage::EnableMic));
    }

    #[test]
    fn empty_credentials_are_omitted() {
        let creds = TurnCredentials::new("", "");
        assert_eq!(creds.id, None);
        assert_eq!(creds.pwd, None);
    }
}

//! WebSocket endpoint.
//!
//! Frames are JSON `{ "event": ..., "data": ... }`:
//! - server → client: `jarvi-message` (welcome), `jarvi-response` (reply envelope),
//!   `jarvi-broadcast` (another client's command)
//! - client → server: `user-command` with the command text as `data`
//!
//! A bare text frame that is not such an object is taken as the command itself.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use jarvi_core::{Command, Reply, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;

use crate::state::{AppState, CommandBroadcast};

pub(crate) const EVENT_MESSAGE: &str = "jarvi-message";
pub(crate) const EVENT_RESPONSE: &str = "jarvi-response";
pub(crate) const EVENT_BROADCAST: &str = "jarvi-broadcast";
pub(crate) const EVENT_USER_COMMAND: &str = "user-command";

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Frame {
    pub(crate) event: String,
    #[serde(default)]
    pub(crate) data: Value,
}

impl Frame {
    fn new(event: &str, data: impl Serialize) -> Option<Self> {
        match serde_json::to_value(data) {
            Ok(data) => Some(Self {
                event: event.to_string(),
                data,
            }),
            Err(e) => {
                tracing::error!(event, "Failed to encode frame: {}", e);
                None
            }
        }
    }

    fn into_message(self) -> Option<Message> {
        serde_json::to_string(&self).ok().map(Message::Text)
    }
}

/// Pull the command text out of an incoming text frame.
pub(crate) fn command_from_text(text: &str) -> Option<String> {
    match serde_json::from_str::<Frame>(text) {
        Ok(frame) if frame.event == EVENT_USER_COMMAND => frame.data.as_str().map(str::to_string),
        Ok(frame) => {
            tracing::debug!(event = %frame.event, "Ignoring unknown socket event");
            None
        }
        Err(_) => Some(text.to_string()),
    }
}

/// GET /ws
pub(crate) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = SessionId::new(uuid::Uuid::new_v4().to_string());
    tracing::info!(session = %session, "Client connected");

    let (mut sender, mut receiver) = socket.split();
    let mut broadcasts = state.broadcast_tx.subscribe();

    if let Some(msg) = Frame::new(EVENT_MESSAGE, Reply::welcome()).and_then(Frame::into_message) {
        if sender.send(msg).await.is_err() {
            state.bridge().end_session(&session);
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(session = %session, "WebSocket error: {}", e);
                        break;
                    }
                };

                let Some(input) = command_from_text(&text) else {
                    continue;
                };
                let parsed = Command::parse(&input);
                let redacted = parsed.redacted(&input);
                tracing::info!(session = %session, command = %redacted, "Socket command");

                let reply = state.server.dispatch(&session, parsed).await;
                let _ = state.broadcast_tx.send(CommandBroadcast {
                    command: redacted,
                    kind: reply.kind,
                    timestamp: reply.timestamp,
                    origin: session.clone(),
                });

                if let Some(msg) = Frame::new(EVENT_RESPONSE, &reply).and_then(Frame::into_message) {
                    if sender.send(msg).await.is_err() {
                        break;
                    }
                }
            }
            event = broadcasts.recv() => {
                match event {
                    Ok(event) if event.origin == session => {}
                    Ok(event) => {
                        if let Some(msg) = Frame::new(EVENT_BROADCAST, &event).and_then(Frame::into_message) {
                            if sender.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(session = %session, skipped, "Broadcast receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    state.bridge().end_session(&session);
    tracing::info!(session = %session, "Client disconnected");
}

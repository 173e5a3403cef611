//! Shared gateway state.

use std::sync::Arc;

use jarvi_core::{Bridge, CommandServer, SessionId};
use serde::Serialize;
use tokio::sync::broadcast;

/// Fan-out capacity for `jarvi-broadcast` events. Slow sockets skip what they miss.
const BROADCAST_CAPACITY: usize = 256;

/// A command echoed to every other connected client.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommandBroadcast {
    pub(crate) command: String,
    #[serde(rename = "type")]
    pub(crate) kind: jarvi_core::ReplyKind,
    pub(crate) timestamp: chrono::DateTime<chrono::Utc>,
    /// Session that sent the command; receivers skip their own. Never sent to
    /// clients: a session id is enough to act as that session.
    #[serde(skip)]
    pub(crate) origin: SessionId,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) server: CommandServer,
    pub(crate) broadcast_tx: broadcast::Sender<CommandBroadcast>,
}

impl AppState {
    pub(crate) fn new(bridge: Arc<Bridge>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            server: CommandServer::new(bridge),
            broadcast_tx,
        }
    }

    pub(crate) fn bridge(&self) -> &Arc<Bridge> {
        self.server.bridge()
    }
}

//! REST endpoints under `/api`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use jarvi_core::{Command, LogKind, Reply, SessionId};
use serde::Deserialize;
use serde_json::json;

use crate::state::{AppState, CommandBroadcast};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommandRequest {
    #[serde(default)]
    command: Option<String>,
    /// Reuse a session across calls (e.g. AUTH then EXEC). Without it the call is one-shot.
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaudeRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    auth: String,
}

fn error_body(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /api/command
pub(crate) async fn command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> axum::response::Response {
    let Some(input) = req.command.filter(|c| !c.trim().is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "Comando requerido");
    };

    let (session, ephemeral) = match req.session_id.filter(|s| !s.trim().is_empty()) {
        Some(id) => (SessionId::new(id), false),
        None => (SessionId::new(format!("api-{}", uuid::Uuid::new_v4())), true),
    };

    let parsed = Command::parse(&input);
    let redacted = parsed.redacted(&input);
    let reply: Reply = state.server.dispatch(&session, parsed).await;
    tracing::info!(session = %session, command = %redacted, kind = ?reply.kind, "REST command");

    // Receivers drop their own origin; an error here only means nobody is listening.
    let _ = state.broadcast_tx.send(CommandBroadcast {
        command: redacted,
        kind: reply.kind,
        timestamp: reply.timestamp,
        origin: session.clone(),
    });

    if ephemeral {
        state.bridge().end_session(&session);
    }
    Json(reply).into_response()
}

/// POST /api/claude: relay a message for Claude, gated on the bridge secret.
pub(crate) async fn claude(
    State(state): State<AppState>,
    Json(req): Json<ClaudeRequest>,
) -> axum::response::Response {
    if !state.bridge().verify_secret(&req.auth) {
        tracing::warn!("Rejected /api/claude call with bad credentials");
        return error_body(StatusCode::UNAUTHORIZED, "No autorizado");
    }

    state
        .bridge()
        .log(None, LogKind::Claude, format!("API Claude: {}", req.message))
        .await;

    Json(json!({
        "success": true,
        "message": "Mensaje recibido para Claude",
        "instruction": "Copia el siguiente comando en Claude:",
        "command": req.message,
    }))
    .into_response()
}

/// GET /api/health
pub(crate) async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "online",
        "system": "JARVI Enhanced",
        "version": env!("CARGO_PKG_VERSION"),
        "bridge": "active",
        "timestamp": chrono::Utc::now(),
    }))
}

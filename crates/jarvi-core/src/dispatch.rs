//! Command server: turns parsed commands into bridge calls and reply envelopes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::{Bridge, SystemOutcome, AUTH_SUCCESS_MESSAGE};
use crate::command::Command;
use crate::command_log::LogKind;
use crate::session::SessionId;

/// Entries shown by `HISTORY`.
pub const HISTORY_COMMAND_LIMIT: usize = 10;

pub const AUTH_REQUIRED_MESSAGE: &str = "🔒 Necesitas autenticarte primero. Use: AUTH [contraseña]";

pub const WELCOME_MESSAGE: &str = "🚀 Sistema JARVI con Bridge a Claude conectado.

🔐 Para control remoto use: AUTH [contraseña]
📡 Para comandos a Claude use: CLAUDE [comando] o @[mensaje]
💻 Para ejecutar comandos use: EXEC [comando]
❓ Use HELP para más información";

/// Envelope `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Info,
    Success,
    Error,
    Warning,
    Claude,
    System,
}

/// Reply envelope sent back over REST or WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub response: String,
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_message: Option<String>,
}

impl Reply {
    pub fn new(kind: ReplyKind, response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            kind,
            timestamp: Utc::now(),
            authenticated: None,
            requires_auth: None,
            data: None,
            output: None,
            claude_message: None,
        }
    }

    pub fn welcome() -> Self {
        Self::new(ReplyKind::System, WELCOME_MESSAGE)
    }
}

/// Parses free-text commands and dispatches them to the [`Bridge`].
#[derive(Clone)]
pub struct CommandServer {
    bridge: Arc<Bridge>,
}

impl CommandServer {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Parse and run `input` on behalf of `session`.
    pub async fn process_command(&self, session: &SessionId, input: &str) -> Reply {
        let command = Command::parse(input);
        self.dispatch(session, command).await
    }

    pub async fn dispatch(&self, session: &SessionId, command: Command) -> Reply {
        if command.requires_auth() && !self.bridge.is_authenticated(session) {
            let mut reply = Reply::new(ReplyKind::Warning, AUTH_REQUIRED_MESSAGE);
            reply.requires_auth = Some(true);
            return reply;
        }

        match command {
            Command::Canned(canned) => Reply::new(ReplyKind::Info, canned.text()),
            Command::Auth(password) => self.auth(session, &password).await,
            Command::Claude { action, params } => self.claude(session, &action, &params).await,
            Command::Exec(cmd) => self.exec(session, &cmd).await,
            Command::Code { language, source } => {
                match self.bridge.execute_code(session, &source, language).await {
                    Ok(out) => Reply::new(
                        ReplyKind::Success,
                        format!("✅ Código ejecutado:\n{}", out.output),
                    ),
                    Err(e) => Reply::new(ReplyKind::Error, format!("❌ Error: {}", e)),
                }
            }
            Command::History => {
                let history = self.bridge.history(session, HISTORY_COMMAND_LIMIT).await;
                let response = if history.is_empty() {
                    "No hay historial".to_string()
                } else {
                    let lines: Vec<String> = history.iter().map(|h| format!("• {}", h.message)).collect();
                    format!("📜 Últimos comandos:\n{}", lines.join("\n"))
                };
                Reply::new(ReplyKind::Info, response)
            }
            Command::Clear => {
                self.bridge.clear_history(session).await;
                Reply::new(ReplyKind::Success, "🗑️ Historial limpiado")
            }
            Command::Direct(message) => {
                let mut reply = Reply::new(
                    ReplyKind::Claude,
                    format!(
                        "📤 Mensaje enviado a Claude: \"{}\"\n\n🤖 Para que Claude responda, necesitas:\n1. Copiar este mensaje\n2. Pegarlo en el chat de Claude\n3. Claude ejecutará la acción solicitada",
                        message
                    ),
                );
                self.bridge
                    .log(Some(session), LogKind::Claude, format!("Mensaje para Claude: {}", message))
                    .await;
                reply.claude_message = Some(message);
                reply
            }
            Command::Unknown(raw) => Reply::new(
                ReplyKind::Warning,
                format!(
                    "❓ Comando no reconocido: {}\nUse HELP para ver comandos disponibles.\nUse @ seguido de tu mensaje para enviar directamente a Claude.",
                    raw
                ),
            ),
        }
    }

    async fn auth(&self, session: &SessionId, password: &str) -> Reply {
        if password.is_empty() {
            let mut reply = Reply::new(ReplyKind::Error, "❌ Uso: AUTH [contraseña]");
            reply.authenticated = Some(false);
            return reply;
        }
        let result = self.bridge.authenticate(session, password).await;
        let mut reply = match &result {
            Ok(()) => Reply::new(ReplyKind::Success, AUTH_SUCCESS_MESSAGE),
            Err(e) => Reply::new(ReplyKind::Error, e.to_string()),
        };
        reply.authenticated = Some(result.is_ok());
        reply
    }

    async fn claude(&self, session: &SessionId, action: &str, params: &str) -> Reply {
        let action = if action.is_empty() { "STATUS" } else { action };
        match self.bridge.process_claude_command(session, action, params).await {
            Ok(reply) => {
                let mut out = Reply::new(ReplyKind::Success, reply.render());
                out.data = reply.data;
                out
            }
            Err(e) => Reply::new(ReplyKind::Error, e.to_string()),
        }
    }

    async fn exec(&self, session: &SessionId, cmd: &str) -> Reply {
        match self.bridge.execute_system_command(session, cmd).await {
            Ok(SystemOutcome::Executed(out)) => {
                let mut reply = Reply::new(
                    ReplyKind::Success,
                    format!("✅ Comando ejecutado:\n{}", out.output),
                );
                reply.output = Some(out.output);
                reply
            }
            Ok(SystemOutcome::Claude(claude)) => {
                let mut reply = Reply::new(ReplyKind::Success, claude.render());
                reply.data = claude.data;
                reply
            }
            Err(e) => Reply::new(ReplyKind::Error, format!("❌ Error: {}", e)),
        }
    }
}

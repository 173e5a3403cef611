//! Command bridge: authenticated, allow-listed command and code execution.
//!
//! Every call names the session it acts for. Authentication is tracked per
//! session in [`SessionRegistry`], never process-wide.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allowlist::Allowlist;
use crate::auth::SecretDigest;
use crate::claude::{ClaudeCommand, ClaudeReply};
use crate::code_runner::{CodeOutput, CodeRunner, Language};
use crate::command_log::{CommandLog, LogEntry, LogKind};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult, ConfigError};
use crate::executor::{CommandOutput, ProcessRunner};
use crate::session::{SessionId, SessionRegistry};

pub const AUTH_SUCCESS_MESSAGE: &str = "✅ Autenticación exitosa. Bienvenido, Comandante.";

/// Prefix routing a system command to [`Bridge::process_claude_command`].
pub const CLAUDE_PREFIX: &str = "CLAUDE_";

/// Result of [`Bridge::execute_system_command`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SystemOutcome {
    Executed(CommandOutput),
    Claude(ClaudeReply),
}

/// The command bridge.
pub struct Bridge {
    secret: Option<SecretDigest>,
    sessions: SessionRegistry,
    log: CommandLog,
    allowlist: Allowlist,
    commands: ProcessRunner,
    code: CodeRunner,
}

impl Bridge {
    pub fn new(config: &BridgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let secret = config.secret_digest()?;
        if secret.is_none() {
            warn!("No bridge secret configured (JARVI__SECRET / JARVI__SECRET_SHA256); all authentication will fail");
        }
        let allowlist = Allowlist::from_entries(&config.allowed_commands).map_err(|e| ConfigError::Invalid {
            key: "allowed_commands",
            message: e.to_string(),
        })?;

        let commands = ProcessRunner::new(&config.working_dir, config.command_timeout());
        let code = CodeRunner::new(
            ProcessRunner::new(&config.working_dir, config.code_timeout()),
            config.node_binary.clone(),
            config.python_binary.clone(),
        );

        info!(
            working_dir = %config.working_dir.display(),
            log_file = %config.log_path().display(),
            allowed = config.allowed_commands.len(),
            "Command bridge ready"
        );

        Ok(Self {
            secret,
            sessions: SessionRegistry::new(),
            log: CommandLog::with_file(config.history_capacity, config.log_path()),
            allowlist,
            commands,
            code,
        })
    }

    /// Authenticated sessions.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn is_authenticated(&self, session: &SessionId) -> bool {
        self.sessions.is_authenticated(session)
    }

    /// Check a candidate against the secret without touching any session.
    pub fn verify_secret(&self, candidate: &str) -> bool {
        self.secret.as_ref().is_some_and(|d| d.matches(candidate))
    }

    /// Authenticate `session`. A failed attempt revokes that session only.
    pub async fn authenticate(&self, session: &SessionId, password: &str) -> BridgeResult<()> {
        let Some(ref secret) = self.secret else {
            self.sessions.revoke(session);
            self.log
                .record(Some(session), LogKind::Error, "Intento de autenticación sin secreto configurado")
                .await;
            return Err(BridgeError::SecretNotConfigured);
        };

        if secret.matches(password) {
            self.sessions.mark_authenticated(session);
            self.log.record(Some(session), LogKind::Info, "Autenticación exitosa").await;
            Ok(())
        } else {
            self.sessions.revoke(session);
            self.log
                .record(Some(session), LogKind::Error, "Intento de autenticación fallido")
                .await;
            Err(BridgeError::AuthenticationFailed)
        }
    }

    /// Forget a session (disconnect).
    pub fn end_session(&self, session: &SessionId) {
        if let Some(state) = self.sessions.revoke(session) {
            let authenticated_secs = (Utc::now() - state.authenticated_at).num_seconds();
            info!(session = %session, authenticated_secs, "Session ended");
        }
    }

    fn require_auth(&self, session: &SessionId) -> BridgeResult<()> {
        if self.sessions.is_authenticated(session) {
            Ok(())
        } else {
            Err(BridgeError::NotAuthenticated)
        }
    }

    /// Run an allow-listed system command, or route `CLAUDE_*` to the Claude handler.
    pub async fn execute_system_command(&self, session: &SessionId, command: &str) -> BridgeResult<SystemOutcome> {
        self.require_auth(session)?;
        let command = command.trim();

        if let Some(rest) = command.strip_prefix(CLAUDE_PREFIX) {
            let (name, params) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let reply = self
                .process_claude_command(session, &format!("{}{}", CLAUDE_PREFIX, name), params.trim())
                .await?;
            return Ok(SystemOutcome::Claude(reply));
        }

        let parsed = match self.allowlist.check(command) {
            Ok(parsed) => parsed,
            Err(rejection) => {
                self.log
                    .record(
                        Some(session),
                        LogKind::Error,
                        format!("Comando rechazado: {} ({})", command, rejection),
                    )
                    .await;
                return Err(BridgeError::CommandRejected {
                    command: command.to_string(),
                    reason: rejection.to_string(),
                });
            }
        };

        match self.commands.run(&parsed).await {
            Ok(output) => {
                self.log
                    .record(Some(session), LogKind::Command, format!("Ejecutado: {}", command))
                    .await;
                Ok(SystemOutcome::Executed(output))
            }
            Err(e) => {
                self.log
                    .record(
                        Some(session),
                        LogKind::Error,
                        format!("Error ejecutando: {} - {}", command, e),
                    )
                    .await;
                Err(e)
            }
        }
    }

    /// Run `code` with the interpreter for `language`.
    pub async fn execute_code(&self, session: &SessionId, code: &str, language: Language) -> BridgeResult<CodeOutput> {
        self.require_auth(session)?;
        if code.trim().is_empty() {
            return Err(BridgeError::MissingCode);
        }
        match self.code.run(code, language).await {
            Ok(out) => {
                self.log
                    .record(Some(session), LogKind::Command, format!("Código ejecutado ({})", language))
                    .await;
                Ok(out)
            }
            Err(e) => {
                self.log
                    .record(
                        Some(session),
                        LogKind::Error,
                        format!("Error ejecutando código ({}): {}", language, e),
                    )
                    .await;
                Err(e)
            }
        }
    }

    /// Handle a Claude sub-command (`STATUS`, `HELP`, `EXECUTE`, `ANALYZE`, or forwarded).
    pub async fn process_claude_command(
        &self,
        session: &SessionId,
        command: &str,
        params: &str,
    ) -> BridgeResult<ClaudeReply> {
        self.require_auth(session)?;
        let reply = match ClaudeCommand::parse(command) {
            ClaudeCommand::Status => ClaudeReply::status(),
            ClaudeCommand::Help => ClaudeReply::help(),
            ClaudeCommand::Analyze => ClaudeReply::analyze(params),
            ClaudeCommand::Execute => {
                let (language, code) = Language::split_leading(params);
                let out = self.execute_code(session, code, language).await?;
                ClaudeReply::executed(out.output, out.language.as_str())
            }
            ClaudeCommand::Forward(name) => ClaudeReply::forward(&name, command, params),
        };
        Ok(reply)
    }

    /// Record a free-form entry for `session`.
    pub async fn log(&self, session: Option<&SessionId>, kind: LogKind, message: impl Into<String>) {
        self.log.record(session, kind, message).await;
    }

    /// Last `limit` log entries recorded for `session`.
    pub async fn history(&self, session: &SessionId, limit: usize) -> Vec<LogEntry> {
        self.log.recent_for(session, limit).await
    }

    /// Clear `session`'s in-memory history. Returns the number of entries removed.
    pub async fn clear_history(&self, session: &SessionId) -> usize {
        self.log.clear_for(session).await
    }
}

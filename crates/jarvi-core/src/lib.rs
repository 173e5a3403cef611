//! jarvi-core: the JARVI command bridge.
//!
//! Session-scoped authentication, allow-listed command execution (no shell),
//! ad hoc code execution, an append-only command log, and the free-text
//! command server that the gateway exposes over REST and WebSocket.

mod allowlist;
mod auth;
mod bridge;
mod claude;
mod code_runner;
mod command;
mod command_log;
mod config;
mod dispatch;
mod error;
mod executor;
mod session;

pub use allowlist::{tokenize, AllowRule, Allowlist, ParsedCommand, Rejection, TokenizeError};
pub use auth::SecretDigest;
pub use bridge::{Bridge, SystemOutcome, AUTH_SUCCESS_MESSAGE, CLAUDE_PREFIX};
pub use claude::{ClaudeCommand, ClaudeReply, CLAUDE_COMMANDS};
pub use code_runner::{CodeOutput, CodeRunner, Language};
pub use command::{Canned, Command, HELP_TEXT};
pub use command_log::{CommandLog, LogEntry, LogKind};
pub use config::{BridgeConfig, DEFAULT_ALLOWED_COMMANDS};
pub use dispatch::{
    CommandServer, Reply, ReplyKind, AUTH_REQUIRED_MESSAGE, HISTORY_COMMAND_LIMIT, WELCOME_MESSAGE,
};
pub use error::{BridgeError, BridgeResult, ConfigError};
pub use executor::{CommandOutput, ProcessRunner};
pub use session::{SessionId, SessionRegistry, SessionState};

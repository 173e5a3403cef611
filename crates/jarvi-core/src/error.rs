//! Error types for the command bridge.
//!
//! `Display` strings are the user-facing messages: the command server puts
//! them straight into reply envelopes.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while authenticating or executing commands
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("❌ Contraseña incorrecta")]
    AuthenticationFailed,

    #[error("🔒 Autenticación no configurada")]
    SecretNotConfigured,

    #[error("🔒 Requiere autenticación")]
    NotAuthenticated,

    #[error("⚠️ Comando no permitido por seguridad: {command}")]
    CommandRejected { command: String, reason: String },

    #[error("⚠️ Necesitas proporcionar código para ejecutar")]
    MissingCode,

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed with exit code {code}: {stderr}")]
    ExitStatus { code: i32, stderr: String },

    #[error("Command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// True for errors raised before anything ran (auth, allowlist).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BridgeError::AuthenticationFailed
                | BridgeError::SecretNotConfigured
                | BridgeError::NotAuthenticated
                | BridgeError::CommandRejected { .. }
                | BridgeError::MissingCode
        )
    }
}

/// Errors raised while loading or validating [`crate::BridgeConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

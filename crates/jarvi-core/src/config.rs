//! Bridge configuration loaded from file and environment.
//!
//! Nothing security-relevant is compiled in: the secret, working directory and
//! allowlist all come from here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::SecretDigest;
use crate::error::ConfigError;

/// Argv prefixes allowed by default.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "ls",
    "pwd",
    "echo",
    "cat",
    "grep",
    "find",
    "git status",
    "git log",
    "npm list",
    "node --version",
    "npm --version",
];

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("jarvi-bridge.log")
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_code_timeout_secs() -> u64 {
    10
}

fn default_history_capacity() -> usize {
    1000
}

fn default_allowed_commands() -> Vec<String> {
    DEFAULT_ALLOWED_COMMANDS.iter().map(|s| s.to_string()).collect()
}

fn default_node_binary() -> String {
    "node".to_string()
}

fn default_python_binary() -> String {
    "python3".to_string()
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Bridge configuration.
///
/// | Key / Env | Default | Description |
/// |-----------|---------|-------------|
/// | `host` / JARVI__HOST | 127.0.0.1 | Bind address. |
/// | `port` / PORT, JARVI__PORT | 3001 | HTTP port. `PORT` wins. |
/// | `working_dir` / JARVI__WORKING_DIR | . | cwd for commands, temp files and the log file. |
/// | `log_file` / JARVI__LOG_FILE | jarvi-bridge.log | Command log, relative to `working_dir`. |
/// | `secret` / JARVI__SECRET | unset | Plaintext secret. |
/// | `secret_sha256` / JARVI__SECRET_SHA256 | unset | Hex SHA-256 of the secret (preferred). |
/// | `command_timeout_secs` | 30 | System command timeout. |
/// | `code_timeout_secs` | 10 | Code execution timeout. |
/// | `history_capacity` | 1000 | In-memory log entries kept. |
/// | `allowed_commands` / JARVI__ALLOWED_COMMANDS | see [`DEFAULT_ALLOWED_COMMANDS`] | Comma list in env. |
/// | `node_binary`, `python_binary` | node, python3 | Interpreters for code execution. |
/// | `cors_origin` | http://localhost:5173 | Dashboard origin allowed by CORS. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
    #[serde(default, skip_serializing)]
    pub secret_sha256: Option<String>,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_code_timeout_secs")]
    pub code_timeout_secs: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,
    #[serde(default = "default_node_binary")]
    pub node_binary: String,
    #[serde(default = "default_python_binary")]
    pub python_binary: String,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            working_dir: default_working_dir(),
            log_file: default_log_file(),
            secret: None,
            secret_sha256: None,
            command_timeout_secs: default_command_timeout_secs(),
            code_timeout_secs: default_code_timeout_secs(),
            history_capacity: default_history_capacity(),
            allowed_commands: default_allowed_commands(),
            node_binary: default_node_binary(),
            python_binary: default_python_binary(),
            cors_origin: default_cors_origin(),
        }
    }
}

impl BridgeConfig {
    /// Config for a working directory with a plaintext secret. Used by tests and embedders.
    pub fn with_secret<P: AsRef<Path>>(working_dir: P, secret: &str) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            secret: Some(secret.to_string()),
            ..Default::default()
        }
    }

    /// Load config from file and environment.
    /// Precedence: `PORT` > `JARVI__*` env > `JARVI_CONFIG` file (default `config/jarvi.toml`) > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("JARVI_CONFIG").unwrap_or_else(|_| "config/jarvi.toml".to_string());
        let path = Path::new(&config_path);

        let builder = config::Config::builder();
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("JARVI")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("allowed_commands")
                    .try_parsing(true),
            )
            .set_override_option("port", std::env::var("PORT").ok())?
            .build()?;

        let cfg: BridgeConfig = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "command_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.code_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "code_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(entry) = self.allowed_commands.iter().find(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                key: "allowed_commands",
                message: format!("empty entry {:?}", entry),
            });
        }
        self.secret_digest()?;
        Ok(())
    }

    /// Digest of the configured secret. `secret_sha256` takes precedence over `secret`.
    pub fn secret_digest(&self) -> Result<Option<SecretDigest>, ConfigError> {
        if let Some(hex_digest) = self.secret_sha256.as_deref().filter(|s| !s.trim().is_empty()) {
            return SecretDigest::from_hex(hex_digest.trim())
                .map(Some)
                .map_err(|message| ConfigError::Invalid {
                    key: "secret_sha256",
                    message,
                });
        }
        Ok(self
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(SecretDigest::from_secret))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn code_timeout(&self) -> Duration {
        Duration::from_secs(self.code_timeout_secs)
    }

    /// Log file path resolved against the working directory.
    pub fn log_path(&self) -> PathBuf {
        if self.log_file.is_absolute() {
            self.log_file.clone()
        } else {
            self.working_dir.join(&self.log_file)
        }
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

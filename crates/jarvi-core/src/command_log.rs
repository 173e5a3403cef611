//! Append-only audit trail of bridge activity.
//!
//! Entries are kept in memory (capped) and appended to a flat text file, one
//! line per entry: `<timestamp> [<type>] <message>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::session::SessionId;

/// Kind of log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Error,
    Command,
    Claude,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Error => "error",
            LogKind::Command => "command",
            LogKind::Claude => "claude",
        }
    }
}

/// One entry in the command log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
}

impl LogEntry {
    /// Line written to the log file. Line breaks in the message are escaped so
    /// every entry stays on exactly one line.
    pub fn to_line(&self) -> String {
        format!(
            "{} [{}] {}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.kind.as_str(),
            escape_line_breaks(&self.message)
        )
    }
}

fn escape_line_breaks(message: &str) -> String {
    message
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Shared command log. Cheap to clone.
#[derive(Clone)]
pub struct CommandLog {
    entries: Arc<RwLock<Vec<LogEntry>>>,
    capacity: usize,
    file: Option<PathBuf>,
}

impl CommandLog {
    /// In-memory only.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            capacity: capacity.max(1),
            file: None,
        }
    }

    /// In-memory log mirrored to `path`.
    pub fn with_file(capacity: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::new(capacity)
        }
    }

    /// Record an entry. File write failures are logged, never returned.
    pub async fn record(&self, session: Option<&SessionId>, kind: LogKind, message: impl Into<String>) {
        let entry = LogEntry {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            session: session.cloned(),
        };

        match kind {
            LogKind::Error => warn!(kind = kind.as_str(), session = ?entry.session, "{}", entry.message),
            _ => info!(kind = kind.as_str(), session = ?entry.session, "{}", entry.message),
        }

        if let Some(ref path) = self.file {
            if let Err(e) = append_line(path, &entry.to_line()).await {
                error!(path = %path.display(), error = %e, "Failed to write command log");
            }
        }

        let mut entries = self.entries.write().await;
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(0..excess);
        }
    }

    /// Last `limit` entries recorded for `session`, oldest first.
    pub async fn recent_for(&self, session: &SessionId, limit: usize) -> Vec<LogEntry> {
        let entries = self.entries.read().await;
        let mut out: Vec<LogEntry> = entries
            .iter()
            .rev()
            .filter(|e| e.session.as_ref() == Some(session))
            .take(limit)
            .cloned()
            .collect();
        out.reverse();
        out
    }

    /// Remove in-memory entries for `session`. The file is never truncated.
    pub async fn clear_for(&self, session: &SessionId) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.session.as_ref() != Some(session));
        before - entries.len()
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

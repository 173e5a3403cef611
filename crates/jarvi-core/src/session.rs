//! Per-session authentication state.
//!
//! Each caller (WebSocket connection, REST session id) has its own entry, so
//! one caller's failed attempt or disconnect never affects another.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Authentication record for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated_at: DateTime<Utc>,
}

/// Concurrent map of authenticated sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_authenticated(&self, session: &SessionId) {
        self.sessions.insert(
            session.clone(),
            SessionState {
                authenticated_at: Utc::now(),
            },
        );
    }

    /// Drop the session's authentication, returning its record if it had one.
    pub fn revoke(&self, session: &SessionId) -> Option<SessionState> {
        self.sessions.remove(session).map(|(_, state)| state)
    }

    pub fn is_authenticated(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }

    /// Number of authenticated sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

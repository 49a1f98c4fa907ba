//! Server-side session records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication state of a session. `Authenticated` is only produced by a
/// successful password check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticated {
        username: String,
        authenticated_at: DateTime<Utc>,
    },
}

/// A session as held by the session store.
///
/// The id is not serialized; stores key records by a digest of it and the
/// session service puts it back after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(skip)]
    pub id: String,
    pub state: SessionState,
    pub page_hits: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// New anonymous session with no hits yet.
    pub fn anonymous(now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: generate_session_id(),
            state: SessionState::Anonymous,
            page_hits: 0,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// New authenticated session under a fresh id. Hits carry over from the
    /// session the login happened in.
    pub fn authenticated(
        username: impl Into<String>,
        previous: Option<&SessionRecord>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: generate_session_id(),
            state: SessionState::Authenticated {
                username: username.into(),
                authenticated_at: now,
            },
            page_hits: previous.map_or(0, |p| p.page_hits),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Expiry is absolute: a session is dead from `expires_at` on.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Anonymous => None,
        }
    }

    /// Bound username if the session is authenticated and live at `now`.
    pub fn authenticated_user_at(&self, now: DateTime<Utc>) -> Option<&str> {
        if self.is_live_at(now) {
            self.username()
        } else {
            None
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// Count a visit; returns the new total.
    pub fn record_hit(&mut self) -> u64 {
        self.page_hits += 1;
        self.page_hits
    }

    /// Time left before expiry, `None` once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        (self.expires_at - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

/// Generate an opaque session id.
pub fn generate_session_id() -> String {
    Uuid::new_v4().as_simple().to_string()
}

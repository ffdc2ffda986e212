//! Session and exchange types.
//!
//! A session is the durable record tying one transport connection to its
//! rolling conversation state. Sessions are TTL-bound: the expiry timestamp
//! is always last-activity plus a fixed one-hour window, refreshed on every
//! successful update, and expired rows are reclaimed by the sweeper.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::TenantConfig;

/// Most recent exchanges retained per session (sliding window).
pub const MAX_HISTORY_EXCHANGES: usize = 8;

/// Fixed session time-to-live window.
pub const SESSION_TTL_SECS: i64 = 3600;

/// One user-message/assistant-reply pair inside a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
    pub timestamp: DateTime<Utc>,
}

/// Durable record of one conversation's rolling state.
///
/// Keyed by (connection_id, session_id). The tenant configuration is a
/// snapshot captured at connect time; `None` marks a record written without
/// one, which the orchestrator surfaces as a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub connection_id: String,
    pub session_id: Uuid,
    pub tenant_id: String,
    pub tenant_config: Option<TenantConfig>,
    pub history: Vec<Exchange>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the TTL has elapsed at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Append an exchange, evicting the oldest beyond the sliding window.
    pub fn append_exchange(&mut self, exchange: Exchange) {
        self.history.push(exchange);
        if self.history.len() > MAX_HISTORY_EXCHANGES {
            let excess = self.history.len() - MAX_HISTORY_EXCHANGES;
            self.history.drain(..excess);
        }
    }
}

/// Expiry timestamp for activity at the given instant.
pub fn expiry_from(last_activity: DateTime<Utc>) -> DateTime<Utc> {
    last_activity + Duration::seconds(SESSION_TTL_SECS)
}

/// Typed partial update for a session.
///
/// The updatable field set is fixed and enumerated here; the store never
/// builds update expressions from arbitrary keys. Activity and expiry
/// timestamps are refreshed unconditionally on every update and are not
/// part of this struct.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub history: Option<Vec<Exchange>>,
    pub tenant_config: Option<TenantConfig>,
}

impl SessionUpdate {
    /// Update carrying only a new history window.
    pub fn history(history: Vec<Exchange>) -> Self {
        Self {
            history: Some(history),
            ..Self::default()
        }
    }
}

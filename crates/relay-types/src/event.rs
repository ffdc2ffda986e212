//! Transport event and outbound push message types.
//!
//! Every connection event (connect/message/disconnect) is handled as an
//! independent, stateless invocation; these types are the boundary between
//! the transport layer and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One transport lifecycle event, regardless of underlying transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A new connection was accepted. The tenant identifier comes from a
    /// query parameter or header and is sanitized before use.
    Connect {
        connection_id: String,
        tenant_id: Option<String>,
    },
    /// A raw inbound payload on an established connection.
    Message {
        connection_id: String,
        body: String,
    },
    /// The connection closed or was detected as lost.
    Disconnect { connection_id: String },
    /// An event kind the relay does not understand. Logged and rejected,
    /// never fatal.
    Unknown {
        connection_id: String,
        kind: String,
    },
}

/// Coarse outcome of handling one transport event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Accepted / processed.
    Ok,
    /// Malformed input.
    BadRequest,
    /// No active session for the connection.
    NotFound,
    /// Internal failure.
    Internal,
}

impl EventStatus {
    /// HTTP-style status code for transport-layer acknowledgment.
    pub fn code(self) -> u16 {
        match self {
            EventStatus::Ok => 200,
            EventStatus::BadRequest => 400,
            EventStatus::NotFound => 404,
            EventStatus::Internal => 500,
        }
    }
}

/// Outbound message pushed to a client over its connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushMessage {
    /// A successful reply, tagged with the tenant's display name.
    #[serde(rename_all = "camelCase")]
    Response {
        message: String,
        timestamp: DateTime<Utc>,
        company_name: String,
    },
    /// A plain-language error the client can show as-is.
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl PushMessage {
    pub fn response(message: impl Into<String>, company_name: impl Into<String>) -> Self {
        PushMessage::Response {
            message: message.into(),
            timestamp: Utc::now(),
            company_name: company_name.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        PushMessage::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

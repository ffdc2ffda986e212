//! Transport push port.
//!
//! The orchestrator sends replies back over the originating connection
//! through this trait; the API layer implements it over the live
//! WebSocket registry.

use relay_types::error::PushError;
use relay_types::event::PushMessage;

/// Push a message to a specific live connection.
pub trait TransportPush: Send + Sync {
    /// Deliver the message, or fail with [`PushError::Gone`] when the
    /// transport confirms the connection no longer exists.
    fn push(
        &self,
        connection_id: &str,
        message: &PushMessage,
    ) -> impl std::future::Future<Output = Result<(), PushError>> + Send;
}

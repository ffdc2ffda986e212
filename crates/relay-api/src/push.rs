//! Live WebSocket connection registry implementing the core push port.
//!
//! Each accepted connection registers an outbound channel keyed by its
//! connection id. The orchestrator pushes [`PushMessage`]s through
//! [`TransportPush`]; frames are serialized here and forwarded to the
//! connection's writer task. A missing or closed channel reports
//! [`PushError::Gone`], which the orchestrator treats as an implicit
//! disconnect.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use relay_core::push::TransportPush;
use relay_types::error::PushError;
use relay_types::event::PushMessage;

/// Outbound frames buffered per connection before backpressure applies.
const OUTBOUND_BUFFER: usize = 32;

/// Registry of live connections and their outbound channels.
#[derive(Clone, Default)]
pub struct WsPushRegistry {
    senders: Arc<DashMap<String, mpsc::Sender<String>>>,
}

impl WsPushRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving end of its outbound
    /// channel. A re-registration under the same id replaces the old
    /// channel, which drops the previous receiver.
    pub fn register(&self, connection_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.senders.insert(connection_id.to_string(), tx);
        rx
    }

    /// Remove a connection from the registry.
    pub fn deregister(&self, connection_id: &str) {
        self.senders.remove(connection_id);
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl TransportPush for WsPushRegistry {
    async fn push(&self, connection_id: &str, message: &PushMessage) -> Result<(), PushError> {
        let frame = serde_json::to_string(message)
            .map_err(|e| PushError::Transport(format!("serialization failed: {e}")))?;

        let Some(sender) = self
            .senders
            .get(connection_id)
            .map(|entry| entry.value().clone())
        else {
            return Err(PushError::Gone);
        };

        if sender.send(frame).await.is_err() {
            // Receiver dropped: the writer task is gone.
            self.senders.remove(connection_id);
            return Err(PushError::Gone);
        }
        Ok(())
    }
}

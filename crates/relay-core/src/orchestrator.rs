//! Connection orchestrator: the message-routing state machine.
//!
//! Routes transport lifecycle events (connect / disconnect / message) to
//! the validator, session store, tenant registry, and generative responder,
//! then pushes results back out over the transport. Each event is handled
//! as an independent, stateless invocation; all cross-event state lives in
//! the session store. The orchestrator holds only injected, shareable
//! dependencies constructed once at startup.
//!
//! Every failure path maps to one of two outcomes: a plain-language error
//! push the client can show as-is, or a coarse status code for the
//! transport acknowledgment. No internal detail reaches the client.

use chrono::Utc;
use relay_types::error::PushError;
use relay_types::event::{EventStatus, PushMessage, TransportEvent};
use relay_types::session::{Exchange, Session, SessionUpdate};

use crate::llm::Responder;
use crate::push::TransportPush;
use crate::session::SessionStore;
use crate::tenant::TenantRegistry;
use crate::validate;

/// Client-facing error strings. Plain language, stable, no internals.
pub const ERR_INVALID_MESSAGE: &str = "Please provide a valid message.";
pub const ERR_SESSION_NOT_FOUND: &str = "Session not found, please refresh.";
pub const ERR_CONFIGURATION: &str =
    "This chat is not configured correctly. Please try again later.";
pub const ERR_INTERNAL: &str = "I encountered an error, please try again.";

/// Orchestrates the connection lifecycle over injected dependencies.
pub struct Orchestrator<S: SessionStore, P: TransportPush> {
    store: S,
    responder: Responder,
    tenants: TenantRegistry,
    push: P,
    default_tenant: String,
}

impl<S: SessionStore, P: TransportPush> Orchestrator<S, P> {
    pub fn new(
        store: S,
        responder: Responder,
        tenants: TenantRegistry,
        push: P,
        default_tenant: String,
    ) -> Self {
        Self {
            store,
            responder,
            tenants,
            push,
            default_tenant,
        }
    }

    /// Route one transport event to its handler.
    pub async fn handle_event(&self, event: TransportEvent) -> EventStatus {
        match event {
            TransportEvent::Connect {
                connection_id,
                tenant_id,
            } => {
                self.handle_connect(&connection_id, tenant_id.as_deref())
                    .await
            }
            TransportEvent::Message {
                connection_id,
                body,
            } => self.handle_message(&connection_id, &body).await,
            TransportEvent::Disconnect { connection_id } => {
                self.handle_disconnect(&connection_id).await
            }
            TransportEvent::Unknown {
                connection_id,
                kind,
            } => {
                tracing::warn!(connection = %connection_id, %kind, "Rejecting unknown event type");
                EventStatus::BadRequest
            }
        }
    }

    /// Connect: sanitize the tenant id, snapshot its configuration, and
    /// create the session with empty history.
    pub async fn handle_connect(
        &self,
        connection_id: &str,
        tenant_param: Option<&str>,
    ) -> EventStatus {
        let tenant_id = validate::sanitize_tenant_id(tenant_param, &self.default_tenant);
        let config = self.tenants.resolve(&tenant_id);

        match self
            .store
            .create_session(connection_id, &tenant_id, &config)
            .await
        {
            Ok(session) => {
                tracing::info!(
                    connection = %connection_id,
                    tenant = %tenant_id,
                    session = %session.session_id,
                    "Connection established"
                );
                EventStatus::Ok
            }
            Err(err) => {
                tracing::error!(
                    connection = %connection_id,
                    tenant = %tenant_id,
                    error = %err,
                    "Session creation failed on connect"
                );
                EventStatus::Internal
            }
        }
    }

    /// Message: validate, look up the session, generate a reply, persist
    /// the new exchange, push the reply.
    pub async fn handle_message(&self, connection_id: &str, raw: &str) -> EventStatus {
        let text = match validate::parse_message(raw) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(connection = %connection_id, error = %err, "Rejected inbound message");
                return self
                    .fail(connection_id, ERR_INVALID_MESSAGE, EventStatus::BadRequest)
                    .await;
            }
        };

        let Some(mut session) = self.lookup_session(connection_id).await else {
            return self
                .fail(connection_id, ERR_SESSION_NOT_FOUND, EventStatus::NotFound)
                .await;
        };

        // Defensive: should be unreachable, every session is written with
        // a snapshot at connect time.
        let Some(config) = session.tenant_config.clone() else {
            tracing::error!(
                connection = %connection_id,
                session = %session.session_id,
                tenant = %session.tenant_id,
                "Session has no tenant configuration snapshot"
            );
            return self
                .fail(connection_id, ERR_CONFIGURATION, EventStatus::Internal)
                .await;
        };

        let reply = self
            .responder
            .generate(&text, &session.history, &config)
            .await;

        session.append_exchange(Exchange {
            user: text,
            assistant: reply.clone(),
            timestamp: Utc::now(),
        });

        let update = SessionUpdate::history(session.history);
        if let Err(err) = self
            .store
            .update_session(connection_id, &session.session_id, &update)
            .await
        {
            tracing::error!(
                connection = %connection_id,
                session = %session.session_id,
                error = %err,
                "Failed to persist exchange"
            );
            return self
                .fail(connection_id, ERR_INTERNAL, EventStatus::Internal)
                .await;
        }

        match self
            .push_to(
                connection_id,
                PushMessage::response(reply, config.display_name),
            )
            .await
        {
            Ok(()) => EventStatus::Ok,
            Err(status) => status,
        }
    }

    /// Disconnect: remove all session rows. Always reports success so the
    /// transport never retries a disconnect it cannot complete cleanly.
    pub async fn handle_disconnect(&self, connection_id: &str) -> EventStatus {
        match self.store.delete_all_sessions(connection_id).await {
            Ok(removed) => {
                tracing::info!(connection = %connection_id, removed, "Connection closed");
            }
            Err(err) => {
                tracing::warn!(
                    connection = %connection_id,
                    error = %err,
                    "Session cleanup failed on disconnect"
                );
            }
        }
        EventStatus::Ok
    }

    /// Active-session lookup. Store read failures degrade to "no session"
    /// (fail open to a clean error response, not a crash).
    async fn lookup_session(&self, connection_id: &str) -> Option<Session> {
        match self.store.get_active_session(connection_id).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(
                    connection = %connection_id,
                    error = %err,
                    "Session read failed, treating as not found"
                );
                None
            }
        }
    }

    /// Push an error message, then resolve to the status describing the
    /// triggering event (the push outcome does not change it).
    async fn fail(
        &self,
        connection_id: &str,
        message: &str,
        status: EventStatus,
    ) -> EventStatus {
        let _ = self.push_to(connection_id, PushMessage::error(message)).await;
        status
    }

    /// Push a message to the connection.
    ///
    /// A confirmed-gone connection is an implicit disconnect: sessions are
    /// cleaned up and the error is swallowed. Any other push failure is a
    /// processing error.
    async fn push_to(
        &self,
        connection_id: &str,
        message: PushMessage,
    ) -> Result<(), EventStatus> {
        match self.push.push(connection_id, &message).await {
            Ok(()) => Ok(()),
            Err(PushError::Gone) => {
                tracing::info!(
                    connection = %connection_id,
                    "Connection gone during push, cleaning up"
                );
                if let Err(err) = self.store.delete_all_sessions(connection_id).await {
                    tracing::warn!(
                        connection = %connection_id,
                        error = %err,
                        "Cleanup after gone connection failed"
                    );
                }
                Ok(())
            }
            Err(err) => {
                tracing::error!(connection = %connection_id, error = %err, "Push failed");
                Err(EventStatus::Internal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use crate::llm::{BoxLlmProvider, RetryPolicy};
    use relay_types::error::{LlmError, StoreError};
    use relay_types::llm::{CompletionRequest, CompletionResponse};
    use relay_types::session::{MAX_HISTORY_EXCHANGES, expiry_from};
    use relay_types::tenant::TenantConfig;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;

    // --- In-memory store ---

    #[derive(Clone, Default)]
    struct MemoryStore {
        rows: Arc<Mutex<HashMap<String, Vec<Session>>>>,
        fail_writes: Arc<Mutex<bool>>,
        fail_reads: Arc<Mutex<bool>>,
    }

    impl MemoryStore {
        fn sessions_for(&self, connection_id: &str) -> Vec<Session> {
            self.rows
                .lock()
                .unwrap()
                .get(connection_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    impl SessionStore for MemoryStore {
        async fn create_session(
            &self,
            connection_id: &str,
            tenant_id: &str,
            tenant_config: &TenantConfig,
        ) -> Result<Session, StoreError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(StoreError::Connection);
            }
            let now = Utc::now();
            let session = Session {
                connection_id: connection_id.to_string(),
                session_id: Uuid::now_v7(),
                tenant_id: tenant_id.to_string(),
                tenant_config: Some(tenant_config.clone()),
                history: Vec::new(),
                created_at: now,
                last_activity: now,
                expires_at: expiry_from(now),
            };
            // Write-time uniqueness: replace any prior rows.
            self.rows
                .lock()
                .unwrap()
                .insert(connection_id.to_string(), vec![session.clone()]);
            Ok(session)
        }

        async fn get_active_session(
            &self,
            connection_id: &str,
        ) -> Result<Option<Session>, StoreError> {
            if *self.fail_reads.lock().unwrap() {
                return Err(StoreError::Connection);
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(connection_id)
                .and_then(|rows| rows.last().cloned()))
        }

        async fn update_session(
            &self,
            connection_id: &str,
            session_id: &Uuid,
            update: &SessionUpdate,
        ) -> Result<(), StoreError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(StoreError::Connection);
            }
            let mut rows = self.rows.lock().unwrap();
            let session = rows
                .get_mut(connection_id)
                .and_then(|rows| rows.iter_mut().find(|s| s.session_id == *session_id))
                .ok_or(StoreError::NotFound)?;
            if let Some(history) = &update.history {
                session.history = history.clone();
            }
            session.last_activity = Utc::now();
            session.expires_at = expiry_from(session.last_activity);
            Ok(())
        }

        async fn delete_all_sessions(&self, connection_id: &str) -> Result<u64, StoreError> {
            let removed = self
                .rows
                .lock()
                .unwrap()
                .remove(connection_id)
                .map_or(0, |rows| rows.len() as u64);
            Ok(removed)
        }

        async fn sweep_expired(&self) -> Result<u64, StoreError> {
            let now = Utc::now();
            let mut removed = 0;
            let mut rows = self.rows.lock().unwrap();
            for sessions in rows.values_mut() {
                let before = sessions.len();
                sessions.retain(|s| !s.is_expired(now));
                removed += (before - sessions.len()) as u64;
            }
            Ok(removed)
        }
    }

    // --- Push recorder ---

    #[derive(Clone, Default)]
    struct RecordingPush {
        pushed: Arc<Mutex<Vec<(String, PushMessage)>>>,
        gone: Arc<Mutex<bool>>,
    }

    impl RecordingPush {
        fn messages(&self) -> Vec<PushMessage> {
            self.pushed
                .lock()
                .unwrap()
                .iter()
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl TransportPush for RecordingPush {
        async fn push(
            &self,
            connection_id: &str,
            message: &PushMessage,
        ) -> Result<(), PushError> {
            if *self.gone.lock().unwrap() {
                return Err(PushError::Gone);
            }
            self.pushed
                .lock()
                .unwrap()
                .push((connection_id.to_string(), message.clone()));
            Ok(())
        }
    }

    // --- Provider counting calls ---

    struct CountingProvider {
        calls: Arc<AtomicU32>,
    }

    impl LlmProvider for CountingProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            async {
                Ok(CompletionResponse {
                    id: "resp".to_string(),
                    content: "A low-cost fund tracks an index.".to_string(),
                    model: "mock-model".to_string(),
                })
            }
        }
    }

    struct Fixture {
        orchestrator: Orchestrator<MemoryStore, RecordingPush>,
        store: MemoryStore,
        push: RecordingPush,
        llm_calls: Arc<AtomicU32>,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::default();
        let push = RecordingPush::default();
        let llm_calls = Arc::new(AtomicU32::new(0));

        let responder = Responder::new(
            BoxLlmProvider::new(CountingProvider {
                calls: llm_calls.clone(),
            }),
            "mock-model".to_string(),
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        });

        let mut tenants = HashMap::new();
        tenants.insert(
            "vanguard".to_string(),
            TenantConfig {
                display_name: "Vanguard".to_string(),
                source_urls: vec!["https://vanguard.example".to_string()],
                ..TenantConfig::generic()
            },
        );

        let orchestrator = Orchestrator::new(
            store.clone(),
            responder,
            TenantRegistry::new(tenants),
            push.clone(),
            "default".to_string(),
        );

        Fixture {
            orchestrator,
            store,
            push,
            llm_calls,
        }
    }

    fn text_payload(text: &str) -> String {
        serde_json::json!({ "text": text }).to_string()
    }

    #[tokio::test]
    async fn test_connect_sanitizes_tenant_and_snapshots_config() {
        let f = fixture();
        let status = f.orchestrator.handle_connect("conn-1", Some("Vanguard!!")).await;
        assert_eq!(status, EventStatus::Ok);

        let sessions = f.store.sessions_for("conn-1");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].tenant_id, "vanguard");
        assert_eq!(
            sessions[0].tenant_config.as_ref().unwrap().display_name,
            "Vanguard"
        );
        assert!(sessions[0].history.is_empty());
    }

    #[tokio::test]
    async fn test_connect_unknown_tenant_gets_generic_bundle() {
        let f = fixture();
        let status = f.orchestrator.handle_connect("conn-1", Some("nobody")).await;
        assert_eq!(status, EventStatus::Ok);

        let sessions = f.store.sessions_for("conn-1");
        assert_eq!(
            sessions[0].tenant_config.as_ref().unwrap().display_name,
            "Assistant"
        );
    }

    #[tokio::test]
    async fn test_connect_store_failure_is_internal() {
        let f = fixture();
        *f.store.fail_writes.lock().unwrap() = true;
        let status = f.orchestrator.handle_connect("conn-1", None).await;
        assert_eq!(status, EventStatus::Internal);
    }

    #[tokio::test]
    async fn test_message_happy_path() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;

        let status = f
            .orchestrator
            .handle_message("conn-1", &text_payload("What is a low-cost fund?"))
            .await;
        assert_eq!(status, EventStatus::Ok);

        let sessions = f.store.sessions_for("conn-1");
        assert_eq!(sessions[0].history.len(), 1);
        assert_eq!(sessions[0].history[0].user, "What is a low-cost fund?");

        let messages = f.push.messages();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            PushMessage::Response {
                message,
                company_name,
                ..
            } => {
                assert_eq!(message, "A low-cost fund tracks an index.");
                assert_eq!(company_name, "Vanguard");
            }
            other => panic!("expected response push, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_message_refreshes_ttl() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;
        let before = f.store.sessions_for("conn-1")[0].expires_at;

        tokio::time::sleep(Duration::from_millis(5)).await;
        f.orchestrator
            .handle_message("conn-1", &text_payload("hello"))
            .await;

        let after = f.store.sessions_for("conn-1")[0].expires_at;
        assert!(after > before, "expiry must move forward on update");
    }

    #[tokio::test]
    async fn test_message_without_session_is_not_found() {
        let f = fixture();
        let status = f
            .orchestrator
            .handle_message("conn-1", &text_payload("hello"))
            .await;
        assert_eq!(status, EventStatus::NotFound);

        let messages = f.push.messages();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            PushMessage::Error { message, .. } => {
                assert_eq!(message, ERR_SESSION_NOT_FOUND);
            }
            other => panic!("expected error push, got {other:?}"),
        }
        assert_eq!(f.llm_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_read_failure_degrades_to_not_found() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;
        *f.store.fail_reads.lock().unwrap() = true;

        let status = f
            .orchestrator
            .handle_message("conn-1", &text_payload("hello"))
            .await;
        assert_eq!(status, EventStatus::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_message_rejected_before_llm() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;

        let status = f.orchestrator.handle_message("conn-1", "not json").await;
        assert_eq!(status, EventStatus::BadRequest);
        assert_eq!(f.llm_calls.load(Ordering::SeqCst), 0);

        match &f.push.messages()[0] {
            PushMessage::Error { message, .. } => assert_eq!(message, ERR_INVALID_MESSAGE),
            other => panic!("expected error push, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_message_never_reaches_llm() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;

        let long = "x".repeat(10_000);
        let status = f
            .orchestrator
            .handle_message("conn-1", &text_payload(&long))
            .await;
        assert_eq!(status, EventStatus::BadRequest);
        assert_eq!(f.llm_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_history_bounded_over_many_messages() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;

        for n in 0..9 {
            let status = f
                .orchestrator
                .handle_message("conn-1", &text_payload(&format!("message {n}")))
                .await;
            assert_eq!(status, EventStatus::Ok);
        }

        let sessions = f.store.sessions_for("conn-1");
        assert_eq!(sessions[0].history.len(), MAX_HISTORY_EXCHANGES);
        // Oldest evicted.
        assert_eq!(sessions[0].history[0].user, "message 1");
        assert_eq!(sessions[0].history[7].user, "message 8");
    }

    #[tokio::test]
    async fn test_missing_config_snapshot_is_configuration_error() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;
        // Blank out the snapshot to simulate a legacy row.
        f.store
            .rows
            .lock()
            .unwrap()
            .get_mut("conn-1")
            .unwrap()[0]
            .tenant_config = None;

        let status = f
            .orchestrator
            .handle_message("conn-1", &text_payload("hello"))
            .await;
        assert_eq!(status, EventStatus::Internal);
        match &f.push.messages()[0] {
            PushMessage::Error { message, .. } => assert_eq!(message, ERR_CONFIGURATION),
            other => panic!("expected error push, got {other:?}"),
        }
        assert_eq!(f.llm_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_internal_error() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;
        *f.store.fail_writes.lock().unwrap() = true;

        let status = f
            .orchestrator
            .handle_message("conn-1", &text_payload("hello"))
            .await;
        assert_eq!(status, EventStatus::Internal);
        match &f.push.messages()[0] {
            PushMessage::Error { message, .. } => assert_eq!(message, ERR_INTERNAL),
            other => panic!("expected error push, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disconnect_removes_all_sessions() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;

        let status = f.orchestrator.handle_disconnect("conn-1").await;
        assert_eq!(status, EventStatus::Ok);
        assert!(f.store.sessions_for("conn-1").is_empty());
        assert!(
            f.store
                .get_active_session("conn-1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_disconnect_without_session_still_ok() {
        let f = fixture();
        let status = f.orchestrator.handle_disconnect("never-connected").await;
        assert_eq!(status, EventStatus::Ok);
    }

    #[tokio::test]
    async fn test_gone_push_is_implicit_disconnect() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;
        *f.push.gone.lock().unwrap() = true;

        let status = f
            .orchestrator
            .handle_message("conn-1", &text_payload("hello"))
            .await;
        // Swallowed: processing completed, connection cleaned up.
        assert_eq!(status, EventStatus::Ok);
        assert!(f.store.sessions_for("conn-1").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_event_rejected() {
        let f = fixture();
        let status = f
            .orchestrator
            .handle_event(TransportEvent::Unknown {
                connection_id: "conn-1".to_string(),
                kind: "subscribe".to_string(),
            })
            .await;
        assert_eq!(status, EventStatus::BadRequest);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_session() {
        let f = fixture();
        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;
        let first = f.store.sessions_for("conn-1")[0].session_id;

        f.orchestrator.handle_connect("conn-1", Some("vanguard")).await;
        let sessions = f.store.sessions_for("conn-1");
        assert_eq!(sessions.len(), 1, "no orphaned rows after reconnect");
        assert_ne!(sessions[0].session_id, first);
    }
}

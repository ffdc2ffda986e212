//! SessionStore trait definition.
//!
//! CRUD over a durable keyed store for connection-to-session records with
//! TTL-based expiry. Implementations live in relay-infra (e.g.,
//! `SqliteSessionStore`). Uses native async fn in traits (RPITIT, Rust
//! 2024 edition).

use relay_types::error::StoreError;
use relay_types::session::{Session, SessionUpdate};
use relay_types::tenant::TenantConfig;
use uuid::Uuid;

/// Store trait for session persistence.
///
/// Records are keyed by (connection id, session id) with a secondary
/// access path by connection id alone.
pub trait SessionStore: Send + Sync {
    /// Create a session for a connection, seeded with the tenant id, a
    /// configuration snapshot, and empty history.
    ///
    /// Enforces single-session-per-connection at write time: any prior
    /// rows for the connection are removed in the same write, so a rapid
    /// reconnect always starts fresh instead of orphaning rows.
    fn create_session(
        &self,
        connection_id: &str,
        tenant_id: &str,
        tenant_config: &TenantConfig,
    ) -> impl std::future::Future<Output = Result<Session, StoreError>> + Send;

    /// The most recently created session for a connection, or `None`.
    ///
    /// Does not filter by expiry at read time; an expired-but-unswept row
    /// may be returned (bounded staleness, the sweeper reclaims it).
    fn get_active_session(
        &self,
        connection_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Apply a typed partial update, unconditionally refreshing
    /// last-activity and expiry (now + TTL window).
    ///
    /// Fails with [`StoreError::NotFound`] when the row no longer exists.
    fn update_session(
        &self,
        connection_id: &str,
        session_id: &Uuid,
        update: &SessionUpdate,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove every session row for a connection. Zero matching rows is
    /// not an error. Returns the number of rows removed.
    fn delete_all_sessions(
        &self,
        connection_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Delete rows whose expiry is strictly before now. Returns the count.
    fn sweep_expired(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}

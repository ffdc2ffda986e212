//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `relay-core` using sqlx with split
//! read/write pools. The tenant configuration snapshot and the exchange
//! history are stored as JSON text; timestamps are RFC 3339 text.

use chrono::{DateTime, Utc};
use relay_core::session::SessionStore;
use relay_types::error::StoreError;
use relay_types::session::{Exchange, Session, SessionUpdate, expiry_from};
use relay_types::tenant::TenantConfig;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new session store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    connection_id: String,
    session_id: String,
    tenant_id: String,
    tenant_config: Option<String>,
    history: String,
    created_at: String,
    last_activity: String,
    expires_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            connection_id: row.try_get("connection_id")?,
            session_id: row.try_get("session_id")?,
            tenant_id: row.try_get("tenant_id")?,
            tenant_config: row.try_get("tenant_config")?,
            history: row.try_get("history")?,
            created_at: row.try_get("created_at")?,
            last_activity: row.try_get("last_activity")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn into_session(self) -> Result<Session, StoreError> {
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| StoreError::Query(format!("invalid session_id: {e}")))?;
        let tenant_config: Option<TenantConfig> = self
            .tenant_config
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StoreError::Query(format!("invalid tenant_config JSON: {e}")))?;
        let history: Vec<Exchange> = serde_json::from_str(&self.history)
            .map_err(|e| StoreError::Query(format!("invalid history JSON: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;
        let last_activity = parse_datetime(&self.last_activity)?;
        let expires_at = parse_datetime(&self.expires_at)?;

        Ok(Session {
            connection_id: self.connection_id,
            session_id,
            tenant_id: self.tenant_id,
            tenant_config,
            history,
            created_at,
            last_activity,
            expires_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Pool and IO failures are connection errors; everything else is a
/// query error carrying the sqlx message.
fn map_sqlx_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection
        }
        other => StoreError::Query(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn create_session(
        &self,
        connection_id: &str,
        tenant_id: &str,
        tenant_config: &TenantConfig,
    ) -> Result<Session, StoreError> {
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

        let config_json = serde_json::to_string(tenant_config)
            .map_err(|e| StoreError::Query(format!("failed to serialize tenant_config: {e}")))?;

        // Single-session-per-connection at write time. The writer pool has
        // one connection, so the delete and insert serialize against any
        // concurrent reconnect.
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(map_sqlx_err)?;

        sqlx::query("DELETE FROM sessions WHERE connection_id = ?")
            .bind(connection_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        sqlx::query(
            r#"INSERT INTO sessions
               (connection_id, session_id, tenant_id, tenant_config, history,
                created_at, last_activity, expires_at)
               VALUES (?, ?, ?, ?, '[]', ?, ?, ?)"#,
        )
        .bind(connection_id)
        .bind(session.session_id.to_string())
        .bind(tenant_id)
        .bind(&config_json)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.last_activity))
        .bind(format_datetime(&session.expires_at))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit()
            .await
            .map_err(map_sqlx_err)?;

        Ok(session)
    }

    async fn get_active_session(
        &self,
        connection_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM sessions WHERE connection_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(connection_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let session_row =
                    SessionRow::from_row(&row).map_err(map_sqlx_err)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn update_session(
        &self,
        connection_id: &str,
        session_id: &Uuid,
        update: &SessionUpdate,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let history_json = update
            .history
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Query(format!("failed to serialize history: {e}")))?;
        let config_json = update
            .tenant_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Query(format!("failed to serialize tenant_config: {e}")))?;

        // Fixed column list; COALESCE keeps unset fields untouched. The
        // activity and expiry timestamps always refresh.
        let result = sqlx::query(
            r#"UPDATE sessions
               SET history = COALESCE(?, history),
                   tenant_config = COALESCE(?, tenant_config),
                   last_activity = ?,
                   expires_at = ?
               WHERE connection_id = ? AND session_id = ?"#,
        )
        .bind(history_json)
        .bind(config_json)
        .bind(format_datetime(&now))
        .bind(format_datetime(&expiry_from(now)))
        .bind(connection_id)
        .bind(session_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_sessions(&self, connection_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE connection_id = ?")
            .bind(connection_id)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn sweep_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}

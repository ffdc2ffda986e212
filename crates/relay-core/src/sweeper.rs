//! Periodic expiry sweeper.
//!
//! Best-effort reclamation of expired session rows. Correctness does not
//! depend on it: the TTL is refreshed on every update and reads of
//! expired-but-unswept rows are bounded staleness, not violations.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::session::SessionStore;

/// Run the sweep loop until cancelled.
///
/// The first sweep runs immediately, then every `interval`. Failures are
/// logged and the loop keeps going.
pub async fn run_sweeper<S: SessionStore>(
    store: S,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Expiry sweeper stopped");
                break;
            }
            _ = ticker.tick() => {
                sweep_once(&store).await;
            }
        }
    }
}

/// One sweep pass; shared by the loop and the one-shot CLI command.
pub async fn sweep_once<S: SessionStore>(store: &S) {
    match store.sweep_expired().await {
        Ok(0) => tracing::debug!("Expiry sweep found nothing to remove"),
        Ok(removed) => tracing::info!(removed, "Swept expired sessions"),
        Err(err) => tracing::warn!(error = %err, "Expiry sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::error::StoreError;
    use relay_types::session::{Session, SessionUpdate};
    use relay_types::tenant::TenantConfig;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    #[derive(Clone, Default)]
    struct CountingStore {
        sweeps: Arc<AtomicU32>,
    }

    impl SessionStore for CountingStore {
        async fn create_session(
            &self,
            _connection_id: &str,
            _tenant_id: &str,
            _tenant_config: &TenantConfig,
        ) -> Result<Session, StoreError> {
            unreachable!("sweeper never creates sessions")
        }

        async fn get_active_session(
            &self,
            _connection_id: &str,
        ) -> Result<Option<Session>, StoreError> {
            Ok(None)
        }

        async fn update_session(
            &self,
            _connection_id: &str,
            _session_id: &Uuid,
            _update: &SessionUpdate,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_all_sessions(&self, _connection_id: &str) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn sweep_expired(&self) -> Result<u64, StoreError> {
            let _ = self.sweeps.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_ticks_and_stops() {
        let store = CountingStore::default();
        let sweeps = store.sweeps.clone();
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(run_sweeper(
            store,
            Duration::from_secs(3600),
            shutdown.clone(),
        ));

        // First tick fires immediately.
        tokio::task::yield_now().await;
        assert_eq!(sweeps.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3600)).await;
        tokio::task::yield_now().await;
        assert_eq!(sweeps.load(Ordering::SeqCst), 2);

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(sweeps.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sweep_once_tolerates_store_error() {
        #[derive(Clone)]
        struct FailingStore;

        impl SessionStore for FailingStore {
            async fn create_session(
                &self,
                _c: &str,
                _t: &str,
                _cfg: &TenantConfig,
            ) -> Result<Session, StoreError> {
                Err(StoreError::Connection)
            }
            async fn get_active_session(&self, _c: &str) -> Result<Option<Session>, StoreError> {
                Err(StoreError::Connection)
            }
            async fn update_session(
                &self,
                _c: &str,
                _s: &Uuid,
                _u: &SessionUpdate,
            ) -> Result<(), StoreError> {
                Err(StoreError::Connection)
            }
            async fn delete_all_sessions(&self, _c: &str) -> Result<u64, StoreError> {
                Err(StoreError::Connection)
            }
            async fn sweep_expired(&self) -> Result<u64, StoreError> {
                Err(StoreError::Connection)
            }
        }

        // Must not panic.
        sweep_once(&FailingStore).await;
    }
}

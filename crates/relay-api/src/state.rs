//! Application state: configuration, database, and the orchestrator.
//!
//! Every dependency is constructed once here and injected explicitly; no
//! component reaches for globals. The state is cheap to clone (Arcs and
//! handles) and shared across HTTP handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;

use relay_core::llm::{BoxLlmProvider, Responder};
use relay_core::orchestrator::Orchestrator;
use relay_core::tenant::TenantRegistry;
use relay_infra::config::{load_config, load_tenants, resolve_data_dir};
use relay_infra::llm::{AnthropicProvider, OfflineProvider};
use relay_infra::sqlite::{DatabasePool, SqliteSessionStore};
use relay_types::config::RelayConfig;

use crate::push::WsPushRegistry;

/// The concrete orchestrator wiring used by the running server.
pub type RelayOrchestrator = Orchestrator<SqliteSessionStore, WsPushRegistry>;

/// Shared application state for HTTP handlers and background tasks.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RelayOrchestrator>,
    pub push: WsPushRegistry,
    pub tenants: TenantRegistry,
    pub config: RelayConfig,
    pub pool: DatabasePool,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize configuration, database, provider, and orchestrator.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let tenants = TenantRegistry::new(load_tenants(&data_dir).await);

        let database_url = format!("sqlite://{}/relay.db?mode=rwc", data_dir.display());
        let pool = DatabasePool::new(&database_url)
            .await
            .context("failed to open database")?;
        let store = SqliteSessionStore::new(pool.clone());

        let provider = select_provider(&config)?;
        tracing::info!(provider = %provider.name(), model = %config.llm.model, "Provider selected");
        let responder = Responder::new(provider, config.llm.model.clone());

        let push = WsPushRegistry::new();
        let orchestrator = Orchestrator::new(
            store,
            responder,
            tenants.clone(),
            push.clone(),
            config.default_tenant.clone(),
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            push,
            tenants,
            config,
            pool,
            data_dir,
        })
    }

    /// A fresh store handle over the shared pool, for background tasks.
    pub fn session_store(&self) -> SqliteSessionStore {
        SqliteSessionStore::new(self.pool.clone())
    }
}

/// Pick the provider from `RELAY_API_KEY`, then `config.toml`.
///
/// The literal key `offline` (or no key at all) selects the offline
/// provider so the relay stays runnable without credentials.
fn select_provider(config: &RelayConfig) -> anyhow::Result<BoxLlmProvider> {
    let api_key = std::env::var("RELAY_API_KEY")
        .ok()
        .or_else(|| config.llm.api_key.clone());

    match api_key.as_deref() {
        None => {
            tracing::warn!("No API key configured, falling back to the offline provider");
            Ok(BoxLlmProvider::new(OfflineProvider))
        }
        Some("offline") => Ok(BoxLlmProvider::new(OfflineProvider)),
        Some(key) => {
            let mut provider = AnthropicProvider::new(SecretString::from(key.to_string()))
                .context("failed to build Anthropic client")?;
            if let Some(base_url) = &config.llm.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

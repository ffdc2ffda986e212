//! Configuration loaders for the relay.
//!
//! Reads `config.toml` and `tenants.toml` from the data directory
//! (`~/.relay/` in production) and falls back to sensible defaults when a
//! file is missing or malformed. A broken file must never prevent startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use relay_types::config::RelayConfig;
use relay_types::tenant::TenantConfig;

/// Resolve the data directory: `RELAY_DATA_DIR`, then `~/.relay`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELAY_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relay")
}

/// Load relay configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`RelayConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> RelayConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return RelayConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return RelayConfig::default();
        }
    };

    match toml::from_str::<RelayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            RelayConfig::default()
        }
    }
}

/// Load tenant bundles from `{data_dir}/tenants.toml`.
///
/// The file maps tenant id to bundle:
///
/// ```toml
/// [vanguard]
/// display_name = "Vanguard"
/// source_urls = ["https://vanguard.example"]
/// ```
///
/// A missing or broken file yields an empty map; unknown tenants then
/// resolve to the generic bundle at connect time.
pub async fn load_tenants(data_dir: &Path) -> HashMap<String, TenantConfig> {
    let tenants_path = data_dir.join("tenants.toml");

    let content = match tokio::fs::read_to_string(&tenants_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No tenants.toml found at {}, all connections get the generic bundle",
                tenants_path.display()
            );
            return HashMap::new();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using no tenants",
                tenants_path.display()
            );
            return HashMap::new();
        }
    };

    match toml::from_str::<HashMap<String, TenantConfig>>(&content) {
        Ok(tenants) => {
            tracing::info!(count = tenants.len(), "Loaded tenant bundles");
            tenants
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using no tenants",
                tenants_path.display()
            );
            HashMap::new()
        }
    }
}

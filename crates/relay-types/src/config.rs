//! Top-level relay configuration types.
//!
//! `RelayConfig` represents `config.toml` in the data directory. All fields
//! have defaults so a missing or partial file still yields a runnable
//! configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Tenant used when the connect event carries no usable tenant id.
    #[serde(default = "default_tenant")]
    pub default_tenant: String,

    /// Interval between expiry sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub llm: LlmSettings,
}

/// Settings for the external completion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_model")]
    pub model: String,

    /// API key. The value `offline` selects the offline provider; the
    /// `RELAY_API_KEY` environment variable takes precedence over this.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override the API base URL (testing, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_tenant() -> String {
    "default".to_string()
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_tenant: default_tenant(),
            sweep_interval_secs: default_sweep_interval(),
            llm: LlmSettings::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 8787);
        assert_eq!(config.default_tenant, "default");
        assert_eq!(config.sweep_interval_secs, 3600);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_deserialize_empty_toml() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: RelayConfig = toml::from_str(
            r#"
port = 9000
default_tenant = "vanguard"

[llm]
api_key = "offline"
"#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_tenant, "vanguard");
        assert_eq!(config.llm.api_key.as_deref(), Some("offline"));
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
    }
}

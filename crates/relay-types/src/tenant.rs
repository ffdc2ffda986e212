//! Tenant configuration bundles.
//!
//! A tenant is an organization configured to use the relay. Its bundle
//! drives prompt framing, branding, and generation parameters. Bundles are
//! read-mostly and immutable at runtime: changes ship with a new
//! `tenants.toml`, not a database write.

use serde::{Deserialize, Serialize};

/// Per-tenant configuration bundle.
///
/// Captured as a snapshot into each session at connect time; the snapshot
/// is not re-resolved per message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Canonical public URLs; the first is the primary URL used in
    /// fallback replies.
    #[serde(default)]
    pub source_urls: Vec<String>,
    #[serde(default)]
    pub talking_points: Vec<String>,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub supported_topics: Vec<String>,
    #[serde(default = "default_response_style")]
    pub response_style: String,
    /// Maximum response length in tokens. `None` uses the relay default.
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
    /// Sampling temperature. `None` uses the relay default.
    #[serde(default)]
    pub temperature: Option<f64>,
}

fn default_response_style() -> String {
    "clear and helpful".to_string()
}

impl TenantConfig {
    /// The generic bundle used for unknown or unregistered tenants.
    ///
    /// Clearly marked as generic, with conservative generation defaults.
    pub fn generic() -> Self {
        Self {
            display_name: "Assistant".to_string(),
            description: "A general-purpose assistant without organization-specific branding."
                .to_string(),
            source_urls: Vec::new(),
            talking_points: Vec::new(),
            tagline: String::new(),
            industry: String::new(),
            supported_topics: Vec::new(),
            response_style: default_response_style(),
            max_response_tokens: Some(400),
            temperature: Some(0.3),
        }
    }

    /// The tenant's primary public URL, if configured.
    pub fn primary_url(&self) -> Option<&str> {
        self.source_urls.first().map(String::as_str)
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self::generic()
    }
}

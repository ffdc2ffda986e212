//! LlmProvider trait definition.
//!
//! The abstraction over external completion APIs. Uses native async fn in
//! traits (RPITIT, Rust 2024 edition); implementations live in relay-infra
//! (`AnthropicProvider`, `OfflineProvider`).

use relay_types::error::LlmError;
use relay_types::llm::{CompletionRequest, CompletionResponse};

/// Trait for completion API backends.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "offline").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}

//! Offline provider for local development without an API key.
//!
//! Returns a canned placeholder reply so the full connect/message/persist
//! path can be exercised end to end with no network access. Selected by
//! setting the API key to `offline`.

use relay_core::llm::provider::LlmProvider;
use relay_types::error::LlmError;
use relay_types::llm::{CompletionRequest, CompletionResponse};

/// Provider that never leaves the process.
#[derive(Debug, Default)]
pub struct OfflineProvider;

impl LlmProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == relay_types::llm::MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        Ok(CompletionResponse {
            id: "offline".to_string(),
            content: format!(
                "[offline mode] I received your message ({} characters) but no live \
                 completion API is configured.",
                last_user.chars().count()
            ),
            model: request.model.clone(),
        })
    }
}

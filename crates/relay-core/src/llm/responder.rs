//! Generative responder: prompt assembly, bounded retries, deterministic
//! fallback.
//!
//! `Responder::generate` never fails to its caller. It assembles a
//! tenant-framed prompt, calls the provider with bounded linear-backoff
//! retries, and on exhaustion or a terminal error returns a deterministic
//! tenant-branded fallback string so the orchestrator always has a reply
//! to forward.

use std::time::Duration;

use relay_types::llm::{CompletionRequest, Message};
use relay_types::session::Exchange;
use relay_types::tenant::TenantConfig;

use super::box_provider::BoxLlmProvider;

/// Default maximum response length when the tenant bundle leaves it unset.
pub const DEFAULT_MAX_TOKENS: u32 = 600;

/// Default sampling temperature when the tenant bundle leaves it unset.
pub const DEFAULT_TEMPERATURE: f64 = 0.4;

/// Historical exchanges included in the prompt (most recent, oldest first).
pub const PROMPT_HISTORY_EXCHANGES: usize = 3;

/// Retry behavior for provider calls.
///
/// Backoff is linear: `base_delay * attempt_number` before each retry.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Builds tenant-framed prompts and produces replies, absorbing provider
/// failures into a fallback string.
pub struct Responder {
    provider: BoxLlmProvider,
    model: String,
    retry: RetryPolicy,
}

impl Responder {
    pub fn new(provider: BoxLlmProvider, model: String) -> Self {
        Self {
            provider,
            model,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy (tests use millisecond backoff).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Produce a reply for the new user message.
    ///
    /// Never returns an error: on exhausted retries or a terminal failure
    /// the tenant fallback string is returned and the failure class is
    /// logged for diagnosis.
    pub async fn generate(
        &self,
        user_text: &str,
        history: &[Exchange],
        config: &TenantConfig,
    ) -> String {
        let request = self.build_request(user_text, history, config);

        for attempt in 1..=self.retry.max_attempts {
            match self.provider.complete(&request).await {
                Ok(response) => {
                    let content = response.content.trim();
                    if content.is_empty() {
                        tracing::warn!(
                            provider = %self.provider.name(),
                            tenant = %config.display_name,
                            "Empty completion, using fallback"
                        );
                        return fallback_reply(config);
                    }
                    return content.to_string();
                }
                Err(err) => {
                    if !err.is_retryable() || attempt == self.retry.max_attempts {
                        tracing::warn!(
                            provider = %self.provider.name(),
                            tenant = %config.display_name,
                            error = %err,
                            attempt,
                            "Generative call failed, using fallback"
                        );
                        return fallback_reply(config);
                    }
                    tracing::debug!(
                        provider = %self.provider.name(),
                        error = %err,
                        attempt,
                        "Retryable generative failure, backing off"
                    );
                    tokio::time::sleep(self.retry.base_delay * attempt).await;
                }
            }
        }

        fallback_reply(config)
    }

    /// Assemble the structured prompt: tenant framing as the system
    /// instruction, up to the last [`PROMPT_HISTORY_EXCHANGES`] exchanges
    /// oldest first, then the new user turn.
    fn build_request(
        &self,
        user_text: &str,
        history: &[Exchange],
        config: &TenantConfig,
    ) -> CompletionRequest {
        let recent_start = history.len().saturating_sub(PROMPT_HISTORY_EXCHANGES);
        let mut messages = Vec::with_capacity((history.len() - recent_start) * 2 + 1);
        for exchange in &history[recent_start..] {
            messages.push(Message::user(exchange.user.clone()));
            messages.push(Message::assistant(exchange.assistant.clone()));
        }
        messages.push(Message::user(user_text));

        CompletionRequest {
            model: self.model.clone(),
            messages,
            system: Some(build_system_prompt(config)),
            max_tokens: config.max_response_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: Some(config.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
        }
    }
}

/// One framing instruction built from the tenant bundle.
pub fn build_system_prompt(config: &TenantConfig) -> String {
    let mut lines = vec![format!(
        "You are a customer assistant for {}.",
        config.display_name
    )];

    if !config.description.is_empty() {
        lines.push(format!("About the organization: {}", config.description));
    }
    if !config.industry.is_empty() {
        lines.push(format!("Industry: {}", config.industry));
    }
    if !config.tagline.is_empty() {
        lines.push(format!("Brand tagline: {}", config.tagline));
    }
    if !config.source_urls.is_empty() {
        lines.push(format!(
            "Canonical sources: {}",
            config.source_urls.join(", ")
        ));
    }
    if !config.talking_points.is_empty() {
        lines.push(format!(
            "Key points to emphasize: {}",
            config.talking_points.join("; ")
        ));
    }
    if !config.supported_topics.is_empty() {
        lines.push(format!(
            "Stay within these topics: {}",
            config.supported_topics.join(", ")
        ));
    }
    lines.push(format!("Respond in a {} tone.", config.response_style));

    lines.join("\n")
}

/// Deterministic tenant-branded fallback reply.
pub fn fallback_reply(config: &TenantConfig) -> String {
    match config.primary_url() {
        Some(url) => format!(
            "I'm sorry, I ran into a problem answering that. Please try again in a moment, \
             or visit {url} for more information."
        ),
        None => "I'm sorry, I ran into a problem answering that. Please try again in a moment."
            .to_string(),
    }
}

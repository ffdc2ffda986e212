//! LLM provider implementations.

pub mod anthropic;
pub mod offline;

pub use anthropic::AnthropicProvider;
pub use offline::OfflineProvider;

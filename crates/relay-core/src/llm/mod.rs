//! Generative response layer: provider port, type-erasure wrapper, and
//! the retrying responder.

pub mod box_provider;
pub mod provider;
pub mod responder;

pub use box_provider::BoxLlmProvider;
pub use provider::LlmProvider;
pub use responder::{Responder, RetryPolicy};

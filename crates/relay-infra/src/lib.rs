//! Infrastructure implementations for the relay.
//!
//! Concrete adapters behind the ports defined in `relay-core`: the SQLite
//! session store, the Anthropic and offline LLM providers, and the
//! filesystem configuration loader.

pub mod config;
pub mod llm;
pub mod sqlite;

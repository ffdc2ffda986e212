//! Shared domain types for Relay.
//!
//! This crate contains the core domain types used across the relay:
//! sessions, tenant configuration bundles, transport events, LLM request
//! shapes, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod session;
pub mod tenant;

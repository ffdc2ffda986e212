//! Business logic and trait definitions for Relay.
//!
//! This crate defines the "ports" (store, provider, and push traits) that
//! the infrastructure and API layers implement, plus the orchestration core
//! that ties them together. It depends only on `relay-types` -- never on
//! `relay-infra` or any database/IO crate.

pub mod llm;
pub mod orchestrator;
pub mod push;
pub mod session;
pub mod sweeper;
pub mod tenant;
pub mod validate;

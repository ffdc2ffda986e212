//! Session store port.

pub mod store;

pub use store::SessionStore;

//! Request handlers.

pub mod tenant;
pub mod ws;

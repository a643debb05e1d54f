//! Domain layer for the Graph directory plugin.

pub mod client;
pub mod error;
pub mod retry;

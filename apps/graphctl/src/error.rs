//! Application error and its mapping to process exit codes.

use identity_resolver::ResolveError;
use identity_resolver_sdk::DirectoryError;
use thiserror::Error;

use crate::config::ConfigError;

pub const EXIT_RESOLUTION: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_ACTION: u8 = 3;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rejected command-line input.
    #[error("{0}")]
    Validation(String),

    #[error("failed to initialize logging: {0:#}")]
    Logging(anyhow::Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The resolved action itself failed at the directory.
    #[error("{action} failed: {source}")]
    Action {
        action: &'static str,
        source: DirectoryError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Validation(_) | AppError::Logging(_) => EXIT_CONFIG,
            AppError::Resolve(_) | AppError::Io(_) => EXIT_RESOLUTION,
            AppError::Action { .. } => EXIT_ACTION,
        }
    }
}
